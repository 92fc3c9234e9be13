//! TCP transport: length-prefixed envelopes straight on the socket.
//!
//! Every accepted socket is split in two. The reader decodes envelopes and
//! awaits the hub for each one, so a busy hub slows every reader alike. The
//! writer drains the bounded outbound queue and ends when the hub drops the
//! queue's sender; its exit also stops the reader.

use actix::Addr;
use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::config::server::OUTBOUND_QUEUE_CAPACITY;
use crate::server::hub::messages::{Incoming, Register, Unregister};
use crate::server::hub::{ConnId, Connection, ConnectionHub};
use crate::server::protocol::{CodecError, Envelope, decode, write_envelope};

/// Accept clients until the listener fails.
pub async fn serve(listener: TcpListener, hub: Addr<ConnectionHub>) -> io::Result<()> {
    info!("[Connection] TCP transport listening on {}", listener.local_addr()?);
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                actix::spawn(handle(stream, peer, hub.clone()));
            }
            Err(e) => warn!("[Connection] Accept failed: {}", e),
        }
    }
}

async fn handle(stream: TcpStream, peer: SocketAddr, hub: Addr<ConnectionHub>) {
    let conn = Uuid::new_v4();
    let (mut reader, writer) = stream.into_split();
    let (outbound, queue) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let (closed_tx, closed_rx) = oneshot::channel();

    actix::spawn(write_loop(conn, writer, queue, closed_tx));

    let register = Register {
        connection: Connection::new(conn, peer.to_string(), outbound),
        username: None,
    };
    if hub.send(register).await.is_err() {
        warn!("[Connection] Hub is gone, dropping {}", peer);
        return;
    }
    info!("[Connection] Accepted {} from {}", conn, peer);

    read_loop(conn, &mut reader, &hub, closed_rx).await;
    hub.do_send(Unregister { conn });
}

async fn read_loop(
    conn: ConnId,
    reader: &mut OwnedReadHalf,
    hub: &Addr<ConnectionHub>,
    mut closed: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            decoded = decode(reader) => match decoded {
                Ok(envelope) => {
                    if hub.send(Incoming { conn, envelope }).await.is_err() {
                        break;
                    }
                }
                Err(CodecError::Truncated) => {
                    debug!("[Connection] {} stream ended", conn);
                    break;
                }
                Err(e) => {
                    warn!("[Connection] {} protocol error, closing: {}", conn, e);
                    break;
                }
            },
            _ = &mut closed => {
                debug!("[Connection] {} writer finished, stopping reader", conn);
                break;
            }
        }
    }
}

async fn write_loop(
    conn: ConnId,
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::Receiver<Envelope>,
    closed: oneshot::Sender<()>,
) {
    while let Some(envelope) = queue.recv().await {
        match write_envelope(&mut writer, &envelope).await {
            Ok(()) => {}
            Err(e @ (CodecError::OversizedMessage(_) | CodecError::Malformed(_))) => {
                warn!("[Connection] {} skipped unsendable {}: {}", conn, envelope.kind, e);
            }
            Err(e) => {
                debug!("[Connection] {} write failed: {}", conn, e);
                break;
            }
        }
    }
    let _ = writer.shutdown().await;
    let _ = closed.send(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::shop::Shop;
    use crate::server::hub::HubConfig;
    use crate::server::hub::messages::{GetStatus, HubStatus};
    use crate::server::protocol::commands::{PROMPT_INPUT, RESPONSE_SUCCESS};
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    async fn start() -> (Addr<ConnectionHub>, SocketAddr) {
        let config = HubConfig {
            tick_interval: Duration::from_secs(3600),
            ..HubConfig::default()
        };
        let hub = ConnectionHub::launch(config, Box::new(Shop::new(8))).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepting = hub.clone();
        actix::spawn(async move {
            let _ = serve(listener, accepting).await;
        });
        (hub, addr)
    }

    async fn connections(hub: &Addr<ConnectionHub>, want: usize) {
        for _ in 0..100 {
            if hub.send(GetStatus).await.unwrap().connections == want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("hub never reached {} connections", want);
    }

    #[actix::test]
    async fn test_client_is_welcomed_and_unregistered_on_close() {
        let (hub, addr) = start().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        let welcome = decode(&mut client).await.unwrap();
        assert_eq!(welcome.kind, RESPONSE_SUCCESS);
        assert_eq!(decode(&mut client).await.unwrap().kind, PROMPT_INPUT);
        connections(&hub, 1).await;

        drop(client);
        connections(&hub, 0).await;
        assert_eq!(hub.send(GetStatus).await.unwrap(), HubStatus { connections: 0, rooms: 0 });
    }

    #[actix::test]
    async fn test_oversized_prefix_closes_the_connection() {
        let (hub, addr) = start().await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        decode(&mut client).await.unwrap();
        decode(&mut client).await.unwrap();

        client.write_all(&u32::MAX.to_le_bytes()).await.unwrap();
        connections(&hub, 0).await;
        let mut rest = Vec::new();
        let read = tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut rest)).await;
        assert!(matches!(read, Ok(Ok(0)) | Ok(Err(_))));
    }
}
