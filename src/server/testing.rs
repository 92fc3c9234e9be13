//! Collector actor standing in for the hub in actor tests.

use actix::prelude::*;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::server::game_room::messages::RoomFinished;
use crate::server::hub::messages::Deliver;
use crate::server::matchmaking::messages::MatchFound;

#[derive(Debug)]
pub enum Probed {
    Deliver(Deliver),
    MatchFound(MatchFound),
    RoomFinished(RoomFinished),
}

pub struct Probe {
    tx: UnboundedSender<Probed>,
}

impl Probe {
    pub fn start() -> (Addr<Probe>, UnboundedReceiver<Probed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Probe { tx }.start(), rx)
    }

    fn forward(&self, probed: Probed) {
        // The test may have stopped listening.
        let _ = self.tx.send(probed);
    }
}

impl Actor for Probe {
    type Context = Context<Self>;
}

impl Handler<Deliver> for Probe {
    type Result = ();

    fn handle(&mut self, msg: Deliver, _ctx: &mut Self::Context) {
        self.forward(Probed::Deliver(msg));
    }
}

impl Handler<MatchFound> for Probe {
    type Result = ();

    fn handle(&mut self, msg: MatchFound, _ctx: &mut Self::Context) {
        self.forward(Probed::MatchFound(msg));
    }
}

impl Handler<RoomFinished> for Probe {
    type Result = ();

    fn handle(&mut self, msg: RoomFinished, _ctx: &mut Self::Context) {
        self.forward(Probed::RoomFinished(msg));
    }
}

/// Wait for exactly `n` collected messages.
pub async fn take(rx: &mut UnboundedReceiver<Probed>, n: usize) -> Vec<Probed> {
    let mut seen = Vec::with_capacity(n);
    while seen.len() < n {
        let probed = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for the probe")
            .expect("probe stopped");
        seen.push(probed);
    }
    seen
}

/// Let in-flight messages land, then return whatever arrived.
pub async fn settle(rx: &mut UnboundedReceiver<Probed>) -> Vec<Probed> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut seen = Vec::new();
    while let Ok(probed) = rx.try_recv() {
        seen.push(probed);
    }
    seen
}
