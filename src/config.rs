use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
    time::Duration,
};

use binance::api::Binance;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_yaml::from_reader;
use tracing::{debug, info, instrument};

use crate::{
    data::timeframe::Timeframe, error::MarketBotError, signal::indicators::MIN_CLOSES,
    trading::TradingConfig,
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct MarketBotConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Candles fetched per tick.
    pub candles: u16,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub initial_balance: f64,
    pub risk_pct: f64,
    pub fee_pct: f64,
    pub leverage: f64,
    /// Where the paper account is kept. Defaults to the platform data directory.
    pub state_file: Option<PathBuf>,
    /// Seconds between ticks. Defaults to the timeframe length.
    pub tick_seconds: Option<u64>,
    pub http_port: u16,
    pub log_dir: Option<String>,
}

const DEFAULT_DATA: &str = r#"# Market and signal input
symbol: "BTCUSDT"
timeframe: "5m"
candles: 250
# Optional, public market data needs no key
# api-key: ""
# api-secret: ""

# Paper account
initial-balance: 100.0
risk-pct: 1.0
fee-pct: 0.0004
leverage: 3.0
# state-file: "paper-account.json"

# Runtime
# tick-seconds: 300
http-port: 8080
log-dir: "logs"
"#;

const STATE_FILE_NAME: &str = "paper-account.json";

impl Default for MarketBotConfig {
    fn default() -> Self {
        let trading = TradingConfig::default();
        Self {
            symbol: "BTCUSDT".to_string(),
            timeframe: Timeframe::FiveMinutes,
            candles: 250,
            api_key: None,
            api_secret: None,
            initial_balance: trading.initial_balance,
            risk_pct: trading.risk_pct,
            fee_pct: trading.fee_pct,
            leverage: trading.leverage,
            state_file: None,
            tick_seconds: None,
            http_port: 8080,
            log_dir: Some("logs".to_string()),
        }
    }
}

impl MarketBotConfig {
    /// Reads the configuration from a YAML file, writing the default file
    /// first if there is none.
    #[instrument(level = "info", skip(filename))]
    pub fn read_config<P: AsRef<Path>>(filename: Option<P>) -> Result<Self, MarketBotError> {
        let path = filename
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(|| Path::new("config.yml").to_path_buf());

        info!(path = %path.display(), "Reading configuration");

        if !path.exists() {
            info!(
                "Config file does not exist. Creating default config at {}",
                path.display()
            );
            let mut file = File::create(&path)?;
            file.write_all(DEFAULT_DATA.as_bytes())?;
            debug!("Default configuration file created");
            return Ok(MarketBotConfig::default());
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let config: Self = from_reader(reader)?;
        config.validate()?;
        info!(
            symbol = %config.symbol,
            timeframe = %config.timeframe,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MarketBotError> {
        let invalid = |msg: String| Err(MarketBotError::ConfigError(msg));
        if self.symbol.trim().is_empty() {
            return invalid("symbol must not be empty".to_string());
        }
        if !(self.initial_balance > 0.0) {
            return invalid(format!(
                "initial-balance must be positive, got {}",
                self.initial_balance
            ));
        }
        if !(self.risk_pct > 0.0) {
            return invalid(format!("risk-pct must be positive, got {}", self.risk_pct));
        }
        if !(self.leverage > 0.0) {
            return invalid(format!("leverage must be positive, got {}", self.leverage));
        }
        if !(self.fee_pct >= 0.0) {
            return invalid(format!("fee-pct must not be negative, got {}", self.fee_pct));
        }
        if (self.candles as usize) < MIN_CLOSES {
            return invalid(format!(
                "candles must be at least {}, got {}",
                MIN_CLOSES, self.candles
            ));
        }
        if self.tick_seconds == Some(0) {
            return invalid("tick-seconds must be positive".to_string());
        }
        Ok(())
    }

    pub fn trading(&self) -> TradingConfig {
        TradingConfig {
            initial_balance: self.initial_balance,
            risk_pct: self.risk_pct,
            fee_pct: self.fee_pct,
            leverage: self.leverage,
        }
    }

    /// The configured state file, else `paper-account.json` in the platform
    /// data directory, else in the working directory.
    pub fn state_path(&self) -> PathBuf {
        if let Some(path) = &self.state_file {
            return path.clone();
        }
        match ProjectDirs::from("", "", "marketbot") {
            Some(dirs) => dirs.data_dir().join(STATE_FILE_NAME),
            None => PathBuf::from(STATE_FILE_NAME),
        }
    }

    pub fn tick_period(&self) -> Duration {
        match self.tick_seconds {
            Some(seconds) => Duration::from_secs(seconds),
            None => self.timeframe.to_duration(),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn get_binance<T: Binance>(&self) -> T {
        debug!("Creating Binance client");
        T::new(self.api_key.clone(), self.api_secret.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binance::market::Market;
    use std::fs;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_config_file_does_not_exist() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();
        drop(temp_file);
        assert!(!path.exists());

        let config = MarketBotConfig::read_config(Some(&path)).unwrap();
        assert_eq!(config, MarketBotConfig::default());
        assert!(path.exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_default_file_matches_default_config() {
        let default_config: MarketBotConfig = serde_yaml::from_str(DEFAULT_DATA).unwrap();
        assert_eq!(default_config, MarketBotConfig::default());
    }

    #[test]
    fn test_read_config_file_exists_valid_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let yaml_content = r#"
symbol: "ETHUSDT"
timeframe: "1h"
candles: 100
initial-balance: 500.0
risk-pct: 2.0
fee-pct: 0.001
leverage: 5.0
state-file: "/tmp/eth.json"
tick-seconds: 60
http-port: 9000
"#;
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = MarketBotConfig::read_config(Some(temp_file.path())).unwrap();
        assert_eq!(config.symbol, "ETHUSDT");
        assert_eq!(config.timeframe, Timeframe::OneHour);
        assert_eq!(config.candles, 100);
        assert_eq!(config.api_key, None);
        assert_eq!(config.log_dir, None);
        assert_eq!(config.state_path(), PathBuf::from("/tmp/eth.json"));
        assert_eq!(config.tick_period(), Duration::from_secs(60));
        assert_eq!(
            config.trading(),
            TradingConfig {
                initial_balance: 500.0,
                risk_pct: 2.0,
                fee_pct: 0.001,
                leverage: 5.0,
            }
        );
    }

    #[test]
    fn test_read_config_with_missing_fields() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let yaml_content = r#"
symbol: "BTCUSDT"
timeframe: "5m"
"#;
        temp_file.write_all(yaml_content.as_bytes()).unwrap();
        let result = MarketBotConfig::read_config(Some(temp_file.path()));
        assert!(matches!(result, Err(MarketBotError::SerdeYamlError(_))));
    }

    #[test]
    fn test_read_config_with_unknown_timeframe() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let yaml_content = DEFAULT_DATA.replace("\"5m\"", "\"7m\"");
        temp_file.write_all(yaml_content.as_bytes()).unwrap();
        let result = MarketBotConfig::read_config(Some(temp_file.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            MarketBotConfig {
                initial_balance: 0.0,
                ..Default::default()
            },
            MarketBotConfig {
                risk_pct: -1.0,
                ..Default::default()
            },
            MarketBotConfig {
                leverage: 0.0,
                ..Default::default()
            },
            MarketBotConfig {
                fee_pct: -0.1,
                ..Default::default()
            },
            MarketBotConfig {
                candles: 20,
                ..Default::default()
            },
            MarketBotConfig {
                symbol: " ".to_string(),
                ..Default::default()
            },
            MarketBotConfig {
                tick_seconds: Some(0),
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(MarketBotError::ConfigError(_))),
                "{:?} should be rejected",
                config
            );
        }
        assert!(MarketBotConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tick_period_defaults_to_timeframe() {
        let config = MarketBotConfig::default();
        assert_eq!(config.tick_period(), Duration::from_secs(300));
    }

    #[test]
    fn test_state_path_fallback_file_name() {
        let config = MarketBotConfig::default();
        assert!(config.state_path().ends_with(STATE_FILE_NAME));
    }

    #[test]
    fn test_get_binance_with_credentials() {
        struct MockBinance {
            api_key: Option<String>,
            api_secret: Option<String>,
        }

        impl Binance for MockBinance {
            fn new(api_key: Option<String>, api_secret: Option<String>) -> Self {
                MockBinance {
                    api_key,
                    api_secret,
                }
            }

            fn new_with_config(
                api_key: Option<String>,
                api_secret: Option<String>,
                _config: &binance::config::Config,
            ) -> Self {
                Self::new(api_key, api_secret)
            }
        }

        let config = MarketBotConfig {
            api_key: Some("test_key".to_string()),
            api_secret: Some("test_secret".to_string()),
            ..Default::default()
        };
        let binance = config.get_binance::<MockBinance>();
        assert_eq!(binance.api_key, Some("test_key".to_string()));
        assert_eq!(binance.api_secret, Some("test_secret".to_string()));
        let _: Market = config.get_binance();
    }
}
