use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use marketbot::{
    config::MarketBotConfig,
    data::market::{BinanceMarketData, MarketData},
    logging::setup_tracing,
    trading::{journal::export_trades, paper_trader::PaperTrader, store::JsonFileStore},
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Paper-trades an EMA/MACD/RSI signal on Binance candles")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "MARKETBOT_CONFIG", default_value = "config.yml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the latest candles and run one evaluation now.
    Tick,
    /// Print the account statistics.
    Stats,
    /// Close the open position at the current market price.
    Close,
    /// Write the closed trades to a CSV file.
    Export { path: PathBuf },
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = MarketBotConfig::read_config(Some(&args.config))?;
    let _guard = setup_tracing(config.log_dir.as_deref(), "cli")?;

    let trader = PaperTrader::new(config.trading(), JsonFileStore::new(config.state_path()))?;

    match args.command {
        Command::Tick => {
            let market = BinanceMarketData::new(&config);
            let report = trader.tick_from(&market, config.candles).await?;
            println!("{} @ {:.2}", config.symbol, report.price);
            println!("{}", report.signal);
            if let Some(closed) = report.closed {
                println!("Position {}", closed);
            }
            if let Some(opened) = report.opened {
                println!("Opened {}", opened);
            }
            println!("{}", report.stats);
        }
        Command::Stats => println!("{}", trader.stats()?),
        Command::Close => {
            let market = BinanceMarketData::new(&config);
            let price = market.price().await?;
            let outcome = trader.force_close(price)?;
            println!("Position {} at {:.2}", outcome, price);
        }
        Command::Export { path } => {
            let account = trader.account()?;
            export_trades(&account.trades, &path)?;
            info!(trades = account.trades.len(), "Journal written");
            println!("Wrote {} trades to {}", account.trades.len(), path.display());
        }
    }
    Ok(())
}
