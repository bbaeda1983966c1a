use std::{
    io,
    sync::{Arc, Mutex},
};

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use marketbot::{
    config::MarketBotConfig,
    data::market::BinanceMarketData,
    logging::setup_tracing,
    trading::{
        paper_trader::{PaperTrader, TickReport},
        store::JsonFileStore,
    },
};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

struct AppState {
    trader: Arc<PaperTrader<JsonFileStore>>,
    last_tick: Arc<Mutex<Option<TickReport>>>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    match state.trader.stats() {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

async fn get_signal(state: web::Data<AppState>) -> impl Responder {
    let last = match state.last_tick.lock() {
        Ok(last) => last.clone(),
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    match last {
        Some(report) => HttpResponse::Ok().json(report),
        None => HttpResponse::NoContent().finish(),
    }
}

async fn get_trades(state: web::Data<AppState>) -> impl Responder {
    match state.trader.account() {
        Ok(account) => HttpResponse::Ok().json(account.trades),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// Ticks forever on the configured cadence. Errors are logged and the next
/// tick proceeds.
async fn run_scheduler(
    config: MarketBotConfig,
    trader: Arc<PaperTrader<JsonFileStore>>,
    last_tick: Arc<Mutex<Option<TickReport>>>,
) {
    let market = BinanceMarketData::new(&config);
    let mut interval = time::interval(config.tick_period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        period = ?config.tick_period(),
        "Scheduler started"
    );

    loop {
        interval.tick().await;
        match trader.tick_from(&market, config.candles).await {
            Ok(report) => {
                info!(price = report.price, "{}", report.signal);
                if let Some(closed) = &report.closed {
                    info!("Position {}", closed);
                }
                if let Some(opened) = &report.opened {
                    info!("Opened {}", opened);
                }
                info!("{}", report.stats);
                match last_tick.lock() {
                    Ok(mut last) => *last = Some(report),
                    Err(e) => error!("Could not record tick report: {}", e),
                }
            }
            Err(e) => error!("Tick failed: {}", e),
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = MarketBotConfig::read_config::<&str>(None).map_err(io::Error::other)?;
    let _guard = setup_tracing(config.log_dir.as_deref(), "server")
        .map_err(|e| io::Error::other(e.to_string()))?;

    let store = JsonFileStore::new(config.state_path());
    info!(path = %store.path().display(), "Using paper account state file");
    let trader = Arc::new(PaperTrader::new(config.trading(), store).map_err(io::Error::other)?);
    let last_tick = Arc::new(Mutex::new(None));

    actix_web::rt::spawn(run_scheduler(
        config.clone(),
        trader.clone(),
        last_tick.clone(),
    ));

    let app_state = web::Data::new(AppState { trader, last_tick });
    info!(port = config.http_port, "Starting HTTP server");
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .route("/health", web::get().to(health))
            .route("/stats", web::get().to(get_stats))
            .route("/signal", web::get().to(get_signal))
            .route("/trades", web::get().to(get_trades))
    })
    .bind(("0.0.0.0", config.http_port))?
    .run()
    .await
}
