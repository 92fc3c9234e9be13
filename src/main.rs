//! Main entry point for the card arena server.
//!
//! Starts the connection hub (which starts the matchmaker), the raw TCP
//! listener, and the HTTP server carrying the WebSocket endpoint.

use actix_web::{web, App, HttpServer};
use log::{error, info};
use tokio::net::TcpListener;

use card_arena::config::Settings;
use card_arena::game::shop::Shop;
use card_arena::server::connection::tcp;
use card_arena::server::hub::{ConnectionHub, HubConfig};
use card_arena::server::router;
use card_arena::server::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Log level comes from RUST_LOG, `info` when unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    info!("[Config] {:?}", settings);

    let shop = match settings.seed {
        Some(seed) => Shop::new(seed),
        None => Shop::default(),
    };
    let hub = ConnectionHub::launch(HubConfig::from(&settings), Box::new(shop)).map_err(std::io::Error::other)?;

    let listener = TcpListener::bind(&settings.tcp_addr).await?;
    let accepting = hub.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = tcp::serve(listener, accepting).await {
            error!("[Connection] TCP transport stopped: {}", e);
        }
    });

    let state = web::Data::new(AppState::new(hub));
    info!("[Connection] WebSocket endpoint on ws://{}/ws", settings.ws_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*")),
            )
            .app_data(state.clone())
            .configure(router::config)
    })
    .bind(&settings.ws_addr)?
    .run()
    .await
}
