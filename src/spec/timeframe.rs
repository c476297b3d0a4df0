//! Time windows attached to extracted entities.
//!
//! JSON shape (or the bare string `"latest"`):
//! {
//!   "to": "today",              // required, natural-language date
//!   "from": "",                 // required key, empty value => to - 1 day
//!   "interval_unit": "day",     // optional: day | week | month | year
//!   "interval": 1,              // optional positive integer
//!   "day_within_period": "last" // optional: first | last
//! }

use crate::error::{Result, SpecError};
use crate::model::TimeFrameView;
use crate::spec::date::parse_date;
use chrono::{Days, Local, NaiveDate};
use serde_json::{Map, Value};

/// Shorthand for `{ "to": "today", "from": "yesterday" }`.
pub const LATEST: &str = "latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

impl IntervalUnit {
    pub const ALL: [IntervalUnit; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayWithinPeriod {
    First,
    Last,
}

impl DayWithinPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            _ => None,
        }
    }
}

/// A resolved date window. `to` and `from` are always concrete dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeframe {
    pub to: NaiveDate,
    pub from: NaiveDate,
    pub interval_unit: IntervalUnit,
    pub interval: u32,
    pub day_within_period: DayWithinPeriod,
}

impl Timeframe {
    /// Parse against the local calendar date.
    pub fn parse(spec: &Value) -> Result<Self> {
        Self::parse_relative(spec, Local::now().date_naive())
    }

    /// Parse a timeframe spec, resolving relative dates against `today`.
    pub fn parse_relative(spec: &Value, today: NaiveDate) -> Result<Self> {
        match spec {
            Value::String(s) if s == LATEST => Self::latest(today),
            Value::Object(map) => Self::from_map(map, today),
            Value::Null => Err(SpecError::incorrect("Timeframe should have a specification")),
            other => Err(SpecError::incorrect(format!(
                "Timeframe specification should be an object or \"{LATEST}\", got {other}"
            ))),
        }
    }

    /// The `"latest"` window: yesterday until today.
    pub fn latest(today: NaiveDate) -> Result<Self> {
        let mut spec = Map::new();
        spec.insert("to".into(), Value::from("today"));
        spec.insert("from".into(), Value::from("yesterday"));
        Self::from_map(&spec, today)
    }

    fn from_map(spec: &Map<String, Value>, today: NaiveDate) -> Result<Self> {
        validate(spec)?;

        let to = match spec.get("to") {
            Some(Value::String(s)) if !s.trim().is_empty() => resolve_date("to", s, today)?,
            other => {
                return Err(SpecError::incorrect(format!(
                    "Timeframe key to should be a non-empty date, got {}",
                    other.unwrap_or(&Value::Null)
                )));
            }
        };

        // `from` must be present (checked in validate) but may be empty.
        let from = match spec.get("from") {
            Some(Value::String(s)) if !s.trim().is_empty() => resolve_date("from", s, today)?,
            Some(Value::Null) | Some(Value::String(_)) | None => {
                to.checked_sub_days(Days::new(1)).ok_or_else(|| {
                    SpecError::incorrect(format!("Timeframe to {to} has no previous day"))
                })?
            }
            Some(other) => {
                return Err(SpecError::incorrect(format!(
                    "Timeframe key from should be a date string, got {other}"
                )));
            }
        };

        let interval_unit = match present(spec, "interval_unit").and_then(Value::as_str) {
            Some(name) => IntervalUnit::from_name(name).unwrap_or(IntervalUnit::Day),
            None => IntervalUnit::Day,
        };
        let interval = present(spec, "interval")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(1);
        let day_within_period = match present(spec, "day_within_period").and_then(Value::as_str) {
            Some(name) => DayWithinPeriod::from_name(name).unwrap_or(DayWithinPeriod::Last),
            None => DayWithinPeriod::Last,
        };

        Ok(Self {
            to,
            from,
            interval_unit,
            interval,
            day_within_period,
        })
    }

    pub fn render(&self) -> TimeFrameView {
        TimeFrameView {
            end_date: self.to.format("%Y-%m-%d").to_string(),
            start_date: self.from.format("%Y-%m-%d").to_string(),
            interval_unit: self.interval_unit.as_str().to_string(),
            day_within_period: self.day_within_period.as_str().to_uppercase(),
            interval: self.interval,
        }
    }
}

/// Parse a timeframe set: a single spec, a list of specs or `"latest"`.
/// Returns `None` when nothing was specified.
pub fn parse_timeframes(spec: Option<&Value>, today: NaiveDate) -> Result<Option<Vec<Timeframe>>> {
    match spec {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| Timeframe::parse_relative(item, today))
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(single) => Timeframe::parse_relative(single, today).map(|t| Some(vec![t])),
    }
}

/// Key-presence and shape checks. Null optional values count as absent.
fn validate(spec: &Map<String, Value>) -> Result<()> {
    if !spec.contains_key("to") {
        return Err(SpecError::insufficient(
            "To key was not specified during the Timeframe creation",
        ));
    }
    if !spec.contains_key("from") {
        return Err(SpecError::insufficient(
            "From key was not specified during the Timeframe creation",
        ));
    }

    if let Some(interval) = present(spec, "interval") {
        match interval.as_u64() {
            Some(n) if n >= 1 && n <= u64::from(u32::MAX) => {}
            _ => {
                return Err(SpecError::incorrect(format!(
                    "Interval key should be a positive integer, got {interval}"
                )));
            }
        }
    }

    if let Some(unit) = present(spec, "interval_unit") {
        if unit.as_str().and_then(IntervalUnit::from_name).is_none() {
            return Err(SpecError::incorrect(format!(
                "Interval_unit key should be one of day, week, month, year, got {unit}"
            )));
        }
    }

    if let Some(day) = present(spec, "day_within_period") {
        if day.as_str().and_then(DayWithinPeriod::from_name).is_none() {
            return Err(SpecError::incorrect(format!(
                "Day within period should be one of first, last, got {day}"
            )));
        }
    }

    Ok(())
}

fn present<'a>(spec: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    spec.get(key).filter(|v| !v.is_null())
}

fn resolve_date(key: &str, text: &str, today: NaiveDate) -> Result<NaiveDate> {
    parse_date(text, today).ok_or_else(|| {
        SpecError::incorrect(format!("Timeframe key {key} has an unrecognised date: {text:?}"))
    })
}
