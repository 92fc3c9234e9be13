//! HTTP and WebSocket routing configuration.

use actix_web::{web, HttpResponse};

use crate::server::connection::ws::ws_connect;
use crate::server::hub::messages::GetStatus;
use crate::server::state::AppState;

/// Live connection and open room counts.
async fn status(data: web::Data<AppState>) -> HttpResponse {
    match data.hub.send(GetStatus).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(_) => HttpResponse::ServiceUnavailable().finish(),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").to(ws_connect))
        .service(web::resource("/status").route(web::get().to(status)));
}
