use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ParseTimeframeError;

/// Kline timeframes accepted by the Binance candle endpoints.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    TwoHours,
    FourHours,
    SixHours,
    TwelveHours,
    OneDay,
}

impl Timeframe {
    pub fn to_minutes(&self) -> i64 {
        match self {
            Timeframe::OneMinute => 1,
            Timeframe::ThreeMinutes => 3,
            Timeframe::FiveMinutes => 5,
            Timeframe::FifteenMinutes => 15,
            Timeframe::ThirtyMinutes => 30,
            Timeframe::OneHour => 60,
            Timeframe::TwoHours => 120,
            Timeframe::FourHours => 240,
            Timeframe::SixHours => 360,
            Timeframe::TwelveHours => 720,
            Timeframe::OneDay => 1440,
        }
    }

    /// Wall-clock span of one candle. The scheduler falls back to this as its
    /// cadence when no explicit tick period is configured.
    pub fn to_duration(&self) -> Duration {
        Duration::from_secs(self.to_minutes() as u64 * 60)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::ThreeMinutes => "3m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::ThirtyMinutes => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::TwoHours => "2h",
            Timeframe::FourHours => "4h",
            Timeframe::SixHours => "6h",
            Timeframe::TwelveHours => "12h",
            Timeframe::OneDay => "1d",
        }
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Timeframe::OneMinute),
            "3m" => Ok(Timeframe::ThreeMinutes),
            "5m" => Ok(Timeframe::FiveMinutes),
            "15m" => Ok(Timeframe::FifteenMinutes),
            "30m" => Ok(Timeframe::ThirtyMinutes),
            "1h" => Ok(Timeframe::OneHour),
            "2h" => Ok(Timeframe::TwoHours),
            "4h" => Ok(Timeframe::FourHours),
            "6h" => Ok(Timeframe::SixHours),
            "12h" => Ok(Timeframe::TwelveHours),
            "1d" => Ok(Timeframe::OneDay),
            other => Err(ParseTimeframeError::ParseStringError(other.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Timeframe> for String {
    fn from(timeframe: Timeframe) -> Self {
        timeframe.to_string()
    }
}

impl TryFrom<String> for Timeframe {
    type Error = ParseTimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Timeframe::from_str(&value)
    }
}
