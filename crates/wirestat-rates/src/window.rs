//! Query windows and summary statistics.

use std::str::FromStr;

use serde::Serialize;

use crate::error::QueryError;

/// Window length for a query, counted back from the newest stored sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scale {
    #[default]
    Hour,
    Day,
    Week,
}

impl Scale {
    pub fn secs(self) -> u64 {
        match self {
            Self::Hour => 3_600,
            Self::Day => 86_400,
            Self::Week => 604_800,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl FromStr for Scale {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            other => Err(QueryError::InvalidScale(other.to_string())),
        }
    }
}

/// Summary statistics over the non-negative values of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub current: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

impl Stats {
    /// Aggregate `values`, ignoring negatives. `current` is the last value
    /// that survived the filter. All fields are 0.0 when nothing survives.
    pub fn over<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut current = 0.0;
        let mut sum = 0.0;
        let mut count = 0u32;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for v in values {
            if v < 0.0 {
                continue;
            }
            current = v;
            sum += v;
            count += 1;
            if v > max {
                max = v;
            }
            if v < min {
                min = v;
            }
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            current,
            average: sum / f64::from(count),
            max,
            min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_scales() {
        assert_eq!("hour".parse::<Scale>().unwrap(), Scale::Hour);
        assert_eq!("day".parse::<Scale>().unwrap(), Scale::Day);
        assert_eq!("week".parse::<Scale>().unwrap(), Scale::Week);
        assert_eq!(Scale::Hour.secs(), 3_600);
        assert_eq!(Scale::Day.secs(), 86_400);
        assert_eq!(Scale::Week.secs(), 604_800);
    }

    #[test]
    fn rejects_anything_else() {
        for bad in ["month", "HOUR", "", "1h"] {
            match bad.parse::<Scale>() {
                Err(QueryError::InvalidScale(v)) => assert_eq!(v, bad),
                other => panic!("expected InvalidScale for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn default_scale_is_hour() {
        assert_eq!(Scale::default(), Scale::Hour);
    }

    #[test]
    fn stats_over_a_plain_series() {
        let stats = Stats::over([10.0, 20.0, 30.0]);
        assert_eq!(
            stats,
            Stats { current: 30.0, average: 20.0, max: 30.0, min: 10.0 }
        );
    }

    #[test]
    fn stats_ignore_negative_values() {
        let stats = Stats::over([-5.0, 10.0, -1.0, 30.0]);
        assert_eq!(
            stats,
            Stats { current: 30.0, average: 20.0, max: 30.0, min: 10.0 }
        );
    }

    #[test]
    fn stats_zero_when_nothing_survives() {
        assert_eq!(Stats::over([]), Stats::default());
        assert_eq!(Stats::over([-1.0, -2.0]), Stats::default());
    }

    #[test]
    fn stats_keep_zero_values() {
        let stats = Stats::over([0.0, 4.0]);
        assert_eq!(
            stats,
            Stats { current: 4.0, average: 2.0, max: 4.0, min: 0.0 }
        );
    }

    #[test]
    fn single_value_fills_every_field() {
        let stats = Stats::over([7.5]);
        assert_eq!(
            stats,
            Stats { current: 7.5, average: 7.5, max: 7.5, min: 7.5 }
        );
    }
}
