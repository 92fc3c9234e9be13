//! Application state shared with the HTTP and WebSocket handlers.

use actix::Addr;

use crate::server::hub::ConnectionHub;

pub struct AppState {
    /// Address of the connection hub every transport registers with.
    pub hub: Addr<ConnectionHub>,
}

impl AppState {
    pub fn new(hub: Addr<ConnectionHub>) -> Self {
        AppState { hub }
    }
}
