//! Transports. Each accepted client becomes one reader and one writer bound
//! to a hub [`Connection`](crate::server::hub::Connection).

pub mod tcp;
pub mod ws;
