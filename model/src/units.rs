use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const MILLIS_PER_SECOND: f64 = 1000.0;
pub const MILLIS_PER_MINUTE: f64 = 60.0 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: f64 = 60.0 * MILLIS_PER_MINUTE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    pub fn millis(self) -> f64 {
        match self {
            TimeUnit::Milliseconds => 1.0,
            TimeUnit::Seconds => MILLIS_PER_SECOND,
            TimeUnit::Minutes => MILLIS_PER_MINUTE,
            TimeUnit::Hours => MILLIS_PER_HOUR,
        }
    }

    /// Express `value`, measured in this unit, in another unit.
    pub fn convert(self, value: f64, to: TimeUnit) -> f64 {
        if self == to {
            return value;
        }
        value * self.millis() / to.millis()
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> anyhow::Result<Self> {
        match x {
            "ms" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "s" | "seconds" => Ok(TimeUnit::Seconds),
            "min" | "minutes" => Ok(TimeUnit::Minutes),
            "h" | "hours" => Ok(TimeUnit::Hours),
            _ => bail!("Unknown time unit {x}"),
        }
    }
}

/// Maps absolute instants onto progress values, measured in `unit` since `epoch`. Every
/// comparison along a track's timeline happens in these units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub epoch: DateTime<Utc>,
    pub unit: TimeUnit,
}

impl Timeline {
    pub fn new(epoch: DateTime<Utc>, unit: TimeUnit) -> Self {
        Self { epoch, unit }
    }

    pub fn progress_of(&self, instant: DateTime<Utc>) -> f64 {
        let ms = (instant - self.epoch).num_milliseconds() as f64;
        ms / self.unit.millis()
    }

    /// Fails if the instant can't be represented.
    pub fn instant_of(&self, progress: f64) -> Result<DateTime<Utc>> {
        let ms = (progress * self.unit.millis()).round();
        // Also catches NaN
        if !(ms.abs() < i64::MAX as f64) {
            bail!("progress {progress} is out of range");
        }
        self.epoch
            .checked_add_signed(Duration::milliseconds(ms as i64))
            .ok_or_else(|| anyhow!("progress {progress} is out of range"))
    }
}
