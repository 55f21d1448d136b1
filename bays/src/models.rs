//! # Bay Models
//!
//! Canonical parking bay entity plus the raw upstream shapes.
//!
//! The upstream feed is loosely shaped: records may arrive wrapped in a
//! `record` envelope or flat, identifiers may be numbers or strings, and
//! coordinates show up under four different encodings. Everything optional
//! on the raw side; the canonical side is fully populated or the record is
//! dropped before it gets here.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Fixed set of bay classifications.
///
/// The upstream feed carries no real bay-type tagging, so these are
/// synthesized deterministically from the road segment id (see
/// [`crate::transform::classify_bay_type`]). Plausible distribution, not
/// ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BayType {
    Standard,
    Accessible,
    Motorcycle,
    LoadingZone,
    TaxiZone,
    BusZone,
    AnglePark,
}

impl BayType {
    pub fn label(&self) -> &'static str {
        match self {
            BayType::Standard => "Standard",
            BayType::Accessible => "Accessible",
            BayType::Motorcycle => "Motorcycle",
            BayType::LoadingZone => "Loading Zone",
            BayType::TaxiZone => "Taxi Zone",
            BayType::BusZone => "Bus Zone",
            BayType::AnglePark => "Angle Parking",
        }
    }
}

impl fmt::Display for BayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for BayType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Restriction rules attached to a bay, selected from fixed templates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restriction {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub start_time: &'static str,
    pub end_time: &'static str,
    pub max_duration: &'static str,
    pub days_operational: &'static str,
    pub payment_type: &'static str,
    pub rate: &'static str,
    pub free_parking: bool,
    pub permit_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostInfo {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub rate: &'static str,
    pub free_parking: bool,
}

/// Normalized bay entity, independent of upstream shape variance.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalBay {
    pub id: String,
    pub external_id: Option<String>,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub street_name: String,
    pub zone_number: String,
    pub bay_type: BayType,
    pub parking_type: &'static str,
    pub capacity: u32,
    pub restrictions: Restriction,
    pub cost_info: CostInfo,
    pub last_updated: String,
    pub bay_id: Option<String>,
    pub area: String,
    pub angle_parking: bool,
    pub parallel_parking: bool,
    pub accessible_parking: bool,
    pub motorcycle_parking: bool,
    pub loading_zone: bool,
    pub taxi_zone: bool,
    pub bus_zone: bool,
    pub clearway: bool,
}

/// Aggregate counts over the cached collection.
#[derive(Debug, Serialize)]
pub struct Stats {
    pub total: usize,
    pub by_type: HashMap<String, usize>,
    pub by_zone: HashMap<String, usize>,
    pub accessible_count: usize,
    pub loading_zones: usize,
    pub motorcycle_spots: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// One element of the upstream response, either `{record: {...}}` or flat.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawItem {
    record: Option<Box<RawRecord>>,
    #[serde(flatten)]
    inline: RawRecord,
}

impl RawItem {
    pub fn record(&self) -> &RawRecord {
        self.record.as_deref().unwrap_or(&self.inline)
    }
}

/// Raw upstream payload. Nothing here is guaranteed to be present.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    /// Number in the live feed, but strings have been observed; kept loose.
    pub kerbsideid: Option<Value>,
    pub roadsegmentid: Option<i64>,
    pub roadsegmentdescription: Option<String>,
    pub location: Option<RawLocation>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub geopoint2d: Option<Vec<f64>>,
    pub lastupdated: Option<String>,
    pub clearway: Option<bool>,
}

impl RawRecord {
    /// Stable external identifier, normalized to a string.
    pub fn kerbside_id(&self) -> Option<String> {
        match self.kerbsideid.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawLocation {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}
