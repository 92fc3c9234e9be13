use actix::prelude::*;

use crate::server::hub::ConnId;

/// Append a session to the tail of the queue.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct Enqueue {
    pub conn: ConnId,
}

/// Remove a session from the queue; no-op if it is not queued.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct Dequeue {
    pub conn: ConnId,
}

/// Run one pairing pass now instead of waiting for the interval.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Tick;

/// Two sessions popped from the head of the queue, oldest first.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
#[rtype(result = "()")]
pub struct MatchFound {
    pub first: ConnId,
    pub second: ConnId,
}

/// Snapshot of the queue, head first.
#[derive(Message)]
#[rtype(result = "Vec<ConnId>")]
pub struct GetQueue;
