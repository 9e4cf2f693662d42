//! The document value model.
//!
//! [`Value`] is the closed set of things a document can hold. Host values are
//! converted once, at the boundary, through the `From` impls below; anything
//! without a dedicated conversion can be stored through its string form with
//! [`Value::display`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::America::New_York;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{Error, Result};

/// Format of timestamps once stored.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Standard (non-DST) UTC offset of the zone naive datetimes are read in.
const EASTERN_STANDARD_OFFSET_HOURS: i64 = 5;

/// A document or a part of one.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Stored as a `YYYY-MM-DDTHH:MM:SSZ` string and read back as one.
    Timestamp(DateTime<Utc>),
    /// Stored whole, as a single leaf.
    List(Vec<Value>),
    /// Decomposed into one row per leaf.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Creates an empty map, the document returned for absent keys.
    pub fn empty_map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Stores any displayable value through its string representation.
    pub fn display(value: impl std::fmt::Display) -> Self {
        Value::String(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a direct child of a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Returns true for a map without entries.
    pub fn is_empty_map(&self) -> bool {
        matches!(self, Value::Map(map) if map.is_empty())
    }

    /// Returns the value as it reads back from storage.
    ///
    /// Timestamps become their formatted strings, recursively. Everything else
    /// is unchanged.
    pub fn normalized(&self) -> Value {
        match self {
            Value::Timestamp(ts) => Value::String(format_timestamp(ts)),
            Value::List(items) => Value::List(items.iter().map(Value::normalized).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.normalized()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Converts to the JSON form rows are stored in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] for NaN or infinite floats, which JSON
    /// cannot represent.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    Error::Serialization(format!("float {} cannot be stored", v))
                })?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(ts) => serde_json::Value::String(format_timestamp(ts)),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<_>>()?,
            ),
            Value::Map(map) => {
                let mut object = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    object.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(object)
            }
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Interprets a wall-clock time in America/New_York.
///
/// Ambiguous times (the repeated hour when DST ends) resolve to standard
/// time. Times skipped when DST starts take the standard offset.
fn eastern_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match New_York.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(_, standard) => standard.with_timezone(&Utc),
        LocalResult::None => {
            Utc.from_utc_datetime(&(naive + TimeDelta::hours(EASTERN_STANDARD_OFFSET_HOURS)))
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    /// Values beyond `i64::MAX` are kept as floats.
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Float(v as f64),
        }
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::from(v as u64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Float(v.to_f64().unwrap_or(f64::NAN))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::Timestamp(v.with_timezone(&Utc))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(eastern_to_utc(v))
    }
}

impl From<NaiveDate> for Value {
    /// Midnight of the date, America/New_York.
    fn from(v: NaiveDate) -> Self {
        Value::Timestamp(eastern_to_utc(v.and_time(NaiveTime::MIN)))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Sets become lists in the set's iteration order.
impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(v: BTreeSet<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<HashSet<T>> for Value {
    fn from(v: HashSet<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(v: HashMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => {
                Value::Map(object.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
