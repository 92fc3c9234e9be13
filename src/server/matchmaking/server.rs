/// Matchmaking actor.
///
/// Owns the FIFO queue of waiting sessions. On every tick it pops the two
/// oldest entries and hands them to the hub for room creation, one pair per
/// tick; whoever is still waiting then hears their position. Clients are
/// reached through the hub's [`Deliver`] only.

use actix::prelude::*;
use actix::MessageResult;
use log::{debug, info};
use serde_json::json;
use std::collections::VecDeque;
use std::time::Duration;

use super::messages::{Dequeue, Enqueue, GetQueue, MatchFound, Tick};
use crate::config::matchmaking::PLAYERS_PER_MATCH;
use crate::server::hub::ConnId;
use crate::server::hub::messages::Deliver;
use crate::server::protocol::commands::{prompt, success};

pub struct Matchmaker {
    /// Waiting sessions, oldest first.
    queue: VecDeque<ConnId>,
    outbox: Recipient<Deliver>,
    pairing: Recipient<MatchFound>,
    tick_interval: Duration,
}

impl Matchmaker {
    pub fn new(outbox: Recipient<Deliver>, pairing: Recipient<MatchFound>, tick_interval: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            outbox,
            pairing,
            tick_interval,
        }
    }

    /// Pair the two oldest sessions, then tell whoever is left where they stand.
    fn tick(&mut self) {
        if self.queue.len() >= PLAYERS_PER_MATCH {
            if let (Some(first), Some(second)) = (self.queue.pop_front(), self.queue.pop_front()) {
                info!("[Matchmaking] Paired {} with {}, {} still waiting", first, second, self.queue.len());
                self.pairing.do_send(MatchFound { first, second });
            }
        }
        if self.queue.len() < PLAYERS_PER_MATCH {
            self.broadcast_positions();
        }
    }

    fn broadcast_positions(&self) {
        for (i, conn) in self.queue.iter().enumerate() {
            let position = i + 1;
            self.outbox.do_send(Deliver::new(
                *conn,
                success(
                    format!("Waiting for an opponent, position {} in queue.", position),
                    json!({ "position": position }),
                ),
            ));
        }
    }
}

impl Actor for Matchmaker {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("[Matchmaking] Matchmaker started, tick every {:?}", self.tick_interval);
        let every = self.tick_interval.max(Duration::from_millis(1));
        ctx.run_interval(every, |act, _ctx| act.tick());
    }
}

impl Handler<Enqueue> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: Enqueue, _ctx: &mut Self::Context) -> Self::Result {
        if self.queue.contains(&msg.conn) {
            debug!("[Matchmaking] {} is already queued", msg.conn);
            return;
        }
        self.queue.push_back(msg.conn);
        let position = self.queue.len();
        info!("[Matchmaking] {} joined the queue at position {}", msg.conn, position);

        self.outbox.do_send(Deliver::new(
            msg.conn,
            success("Queued for a match.", json!({ "position": position })),
        ));
        self.outbox.do_send(Deliver::new(msg.conn, prompt()));
    }
}

impl Handler<Dequeue> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: Dequeue, _ctx: &mut Self::Context) -> Self::Result {
        if let Some(index) = self.queue.iter().position(|c| *c == msg.conn) {
            self.queue.remove(index);
            info!("[Matchmaking] {} left the queue, {} waiting", msg.conn, self.queue.len());
        }
    }
}

impl Handler<Tick> for Matchmaker {
    type Result = ();

    fn handle(&mut self, _msg: Tick, _ctx: &mut Self::Context) -> Self::Result {
        self.tick();
    }
}

impl Handler<GetQueue> for Matchmaker {
    type Result = MessageResult<GetQueue>;

    fn handle(&mut self, _msg: GetQueue, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.queue.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::protocol::commands::{PROMPT_INPUT, RESPONSE_SUCCESS};
    use crate::server::testing::{Probe, Probed, settle, take};
    use tokio::sync::mpsc::UnboundedReceiver;
    use uuid::Uuid;

    fn start() -> (Addr<Matchmaker>, UnboundedReceiver<Probed>) {
        let (probe, rx) = Probe::start();
        let matchmaker = Matchmaker::new(
            probe.clone().recipient(),
            probe.recipient(),
            Duration::from_secs(3600),
        )
        .start();
        (matchmaker, rx)
    }

    #[actix::test]
    async fn test_pairs_strictly_fifo_and_reports_positions() {
        let (matchmaker, mut rx) = start();
        let [s1, s2, s3] = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        for conn in [s1, s2, s3] {
            matchmaker.send(Enqueue { conn }).await.unwrap();
        }
        let acks = take(&mut rx, 6).await;
        match &acks[4] {
            Probed::Deliver(d) => {
                assert_eq!(d.conn, s3);
                assert_eq!(d.envelope.kind, RESPONSE_SUCCESS);
                assert_eq!(d.envelope.payload["data"]["position"], 3);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&acks[5], Probed::Deliver(d) if d.envelope.kind == PROMPT_INPUT));

        matchmaker.send(Tick).await.unwrap();
        let after = take(&mut rx, 2).await;
        assert!(matches!(&after[0], Probed::MatchFound(m) if *m == MatchFound { first: s1, second: s2 }));
        match &after[1] {
            Probed::Deliver(d) => {
                assert_eq!(d.conn, s3);
                assert_eq!(d.envelope.payload["data"]["position"], 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(matchmaker.send(GetQueue).await.unwrap(), vec![s3]);

        // A lone waiter hears their position on every tick.
        for _ in 0..3 {
            matchmaker.send(Tick).await.unwrap();
            match settle(&mut rx).await.as_slice() {
                [Probed::Deliver(d)] => {
                    assert_eq!(d.conn, s3);
                    assert_eq!(d.envelope.payload["data"]["position"], 1);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[actix::test]
    async fn test_empty_queue_tick_sends_nothing() {
        let (matchmaker, mut rx) = start();
        matchmaker.send(Tick).await.unwrap();
        assert!(settle(&mut rx).await.is_empty());
    }

    #[actix::test]
    async fn test_one_pair_per_tick() {
        let (matchmaker, mut rx) = start();
        let conns: Vec<ConnId> = (0..4).map(|_| Uuid::new_v4()).collect();
        for conn in &conns {
            matchmaker.send(Enqueue { conn: *conn }).await.unwrap();
        }
        take(&mut rx, 8).await;

        matchmaker.send(Tick).await.unwrap();
        let pairs = settle(&mut rx)
            .await
            .into_iter()
            .filter(|p| matches!(p, Probed::MatchFound(_)))
            .count();
        assert_eq!(pairs, 1);
        assert_eq!(matchmaker.send(GetQueue).await.unwrap(), conns[2..].to_vec());
    }

    #[actix::test]
    async fn test_dequeue_is_idempotent_and_enqueue_deduplicates() {
        let (matchmaker, mut rx) = start();
        let [a, b] = [Uuid::new_v4(), Uuid::new_v4()];
        matchmaker.send(Enqueue { conn: a }).await.unwrap();
        matchmaker.send(Enqueue { conn: a }).await.unwrap();
        matchmaker.send(Enqueue { conn: b }).await.unwrap();
        assert_eq!(settle(&mut rx).await.len(), 4);

        matchmaker.send(Dequeue { conn: a }).await.unwrap();
        matchmaker.send(Dequeue { conn: a }).await.unwrap();
        assert_eq!(matchmaker.send(GetQueue).await.unwrap(), vec![b]);

        matchmaker.send(Tick).await.unwrap();
        match settle(&mut rx).await.as_slice() {
            [Probed::Deliver(d)] => assert_eq!(d.envelope.payload["data"]["position"], 1),
            other => panic!("unexpected {:?}", other),
        }
    }
}
