/// Connection-layer configuration constants.
///
/// Bind addresses, the wire frame limit and the per-connection outbound queue size.
pub const TCP_BIND_ADDR: &str = "127.0.0.1:7000";

/// Address of the HTTP server carrying the WebSocket endpoint.
pub const WS_BIND_ADDR: &str = "127.0.0.1:8080";

/// Largest serialized envelope body accepted or produced (1 MiB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Largest single WebSocket message accepted. One message may batch several
/// frames, each still bound by [`MAX_MESSAGE_SIZE`].
pub const WS_MAX_FRAME_SIZE: usize = 8 * (MAX_MESSAGE_SIZE + 4);

/// Capacity of each connection's outbound envelope queue.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Mailbox capacity of the connection hub. Readers wait when it is full.
pub const HUB_MAILBOX_CAPACITY: usize = 1024;
