use std::fmt;

use ta::{
    errors::{Result, TaError},
    Next, Period, Reset,
};

/// Relative strength index with Wilder smoothing.
///
/// The first `period` price changes are averaged plainly; after that each
/// average moves by `1 / period` toward the latest gain or loss. Until the
/// first average exists the output is a neutral 50. No average loss reads
/// 100, otherwise no average gain reads 0.
#[derive(Debug, Clone)]
pub struct WilderRsi {
    period: usize,
    prev: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl WilderRsi {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(TaError::InvalidParameter);
        }
        Ok(Self {
            period,
            prev: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        })
    }

    fn value(&self) -> f64 {
        if self.changes < self.period {
            50.0
        } else if self.avg_loss == 0.0 {
            100.0
        } else if self.avg_gain == 0.0 {
            0.0
        } else {
            100.0 - 100.0 / (1.0 + self.avg_gain / self.avg_loss)
        }
    }
}

impl Period for WilderRsi {
    fn period(&self) -> usize {
        self.period
    }
}

impl Next<f64> for WilderRsi {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        let Some(prev) = self.prev.replace(input) else {
            return self.value();
        };

        let change = input - prev;
        let (gain, loss) = (change.max(0.0), (-change).max(0.0));
        let n = self.period as f64;
        self.changes += 1;

        if self.changes <= self.period {
            // Running sum until the seed average is complete.
            self.avg_gain += gain;
            self.avg_loss += loss;
            if self.changes == self.period {
                self.avg_gain /= n;
                self.avg_loss /= n;
            }
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }
        self.value()
    }
}

impl Reset for WilderRsi {
    fn reset(&mut self) {
        self.prev = None;
        self.changes = 0;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
    }
}

impl Default for WilderRsi {
    fn default() -> Self {
        Self {
            period: 14,
            prev: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }
}

impl fmt::Display for WilderRsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSI({})", self.period)
    }
}
