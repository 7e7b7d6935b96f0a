use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

type Kw = u64;

/// Reserved request parameter controlling request logging. Never sent over the wire.
pub const DO_LOGGING: &str = "do_logging";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            ParamValue::Bool(b) => *b,
            ParamValue::Int(i) => *i != 0,
            ParamValue::Float(f) => *f != 0.0,
            ParamValue::Str(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Query parameters of a single request, kept in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, ParamValue>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `insert`.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(key.to_owned(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Removes `do_logging` and returns its truthiness, `true` when absent.
    pub fn take_logging_flag(&mut self) -> bool {
        self.remove(DO_LOGGING)
            .map(|v| v.is_truthy())
            .unwrap_or(true)
    }
}

impl fmt::Display for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "&")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Area to search for stations in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub long_min: f64,
    pub long_max: f64,
}

impl From<BoundingBox> for RequestParams {
    fn from(bbox: BoundingBox) -> Self {
        RequestParams::new()
            .with("lat_min", bbox.lat_min)
            .with("lat_max", bbox.lat_max)
            .with("long_min", bbox.long_min)
            .with("long_max", bbox.long_max)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Connector {
    #[serde(rename = "type")]
    pub connector_type: String,
    pub max_kw: Kw,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Evse {
    pub id: u64,
    #[serde(rename = "group name")]
    pub group_name: String,
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub city: String,
    pub country: String,
    pub provider: String,
    pub evses: Vec<Evse>,
}

impl Station {
    /// Highest connector rating across all EVSEs of the station.
    pub fn max_kw(&self) -> Option<Kw> {
        self.evses
            .iter()
            .flat_map(|evse| evse.connectors.iter())
            .map(|connector| connector.max_kw)
            .max()
    }

    /// Every station has at least one EVSE and every EVSE at least one connector.
    pub fn is_well_formed(&self) -> bool {
        !self.evses.is_empty() && self.evses.iter().all(|evse| !evse.connectors.is_empty())
    }
}
