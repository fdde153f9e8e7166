//! Lookback period of a bar request (`1d`, `5d`, `1wk`, `1mo`, `1y`, `max`).
//!
//! Periods count calendar time back from the newest bar. `Nd` keeps the
//! newest bar's day plus the `N - 1` days before it.

use chrono::{Days, Months, NaiveDateTime, NaiveTime};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
    Max,
}

impl Period {
    /// Earliest timestamp kept when the newest bar is at `newest`.
    pub fn cutoff(&self, newest: NaiveDateTime) -> Option<NaiveDateTime> {
        let day = newest.date();
        let start = match *self {
            Period::Days(n) => day.checked_sub_days(Days::new(u64::from(n).saturating_sub(1)))?,
            Period::Weeks(n) => {
                day.checked_sub_days(Days::new((u64::from(n) * 7).saturating_sub(1)))?
            }
            Period::Months(n) => day.checked_sub_months(Months::new(n))?.succ_opt()?,
            Period::Years(n) => day
                .checked_sub_months(Months::new(n.saturating_mul(12)))?
                .succ_opt()?,
            Period::Max => return None,
        };
        Some(start.and_time(NaiveTime::MIN))
    }

    /// Index of the first timestamp inside the period. `timestamps` must be
    /// ascending.
    pub fn first_kept(&self, timestamps: &[NaiveDateTime]) -> usize {
        match timestamps.last().and_then(|&newest| self.cutoff(newest)) {
            Some(cutoff) => timestamps.partition_point(|&t| t < cutoff),
            None => 0,
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "max" {
            return Ok(Period::Max);
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("period '{s}' has no unit"))?;
        let (count, unit) = s.split_at(split);
        let n: u32 = count
            .parse()
            .map_err(|_| format!("period '{s}' must start with a count"))?;
        if n == 0 {
            return Err(format!("period '{s}' must be at least 1"));
        }

        match unit {
            "d" => Ok(Period::Days(n)),
            "wk" | "w" => Ok(Period::Weeks(n)),
            "mo" => Ok(Period::Months(n)),
            "y" => Ok(Period::Years(n)),
            _ => Err(format!("period '{s}' has unknown unit '{unit}'")),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Days(n) => write!(f, "{n}d"),
            Period::Weeks(n) => write!(f, "{n}wk"),
            Period::Months(n) => write!(f, "{n}mo"),
            Period::Years(n) => write!(f, "{n}y"),
            Period::Max => write!(f, "max"),
        }
    }
}
