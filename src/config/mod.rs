/// Main configuration module.
///
/// Re-exports submodules for server, matchmaking and game constants, and
/// builds the runtime [`Settings`] from environment variables.
pub mod game;
pub mod matchmaking;
pub mod server;

use std::time::Duration;

use log::warn;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address of the raw TCP listener.
    pub tcp_addr: String,
    /// Address of the HTTP server hosting the WebSocket endpoint.
    pub ws_addr: String,
    /// How long players have to submit a card each round.
    pub round_duration: Duration,
    /// Period of the matchmaking tick.
    pub tick_interval: Duration,
    /// Fixed seed for the server's random generator, if any.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tcp_addr: server::TCP_BIND_ADDR.to_string(),
            ws_addr: server::WS_BIND_ADDR.to_string(),
            round_duration: Duration::from_secs(game::ROUND_DURATION_SECS),
            tick_interval: Duration::from_millis(matchmaking::TICK_INTERVAL_MILLIS),
            seed: None,
        }
    }
}

impl Settings {
    /// Read settings from `CARD_ARENA_*` environment variables.
    ///
    /// Missing variables keep their default; unparsable ones are logged and ignored.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(addr) = std::env::var("CARD_ARENA_TCP_ADDR") {
            settings.tcp_addr = addr;
        }
        if let Ok(addr) = std::env::var("CARD_ARENA_WS_ADDR") {
            settings.ws_addr = addr;
        }
        if let Some(secs) = parse_var::<u64>("CARD_ARENA_ROUND_SECS") {
            settings.round_duration = Duration::from_secs(secs);
        }
        if let Some(millis) = parse_var::<u64>("CARD_ARENA_TICK_MILLIS") {
            settings.tick_interval = Duration::from_millis(millis);
        }
        settings.seed = parse_var::<u64>("CARD_ARENA_SEED");
        settings
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[Config] Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}
