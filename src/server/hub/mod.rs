//! Connection hub: the single owner of the live connection set.

pub mod connections;
pub mod messages;
pub mod server;

pub use connections::{ConnId, Connection, ConnectionSet};
pub use server::{ConnectionHub, HubConfig};
