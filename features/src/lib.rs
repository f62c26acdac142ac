//! Raw feature records, as returned by whatever spatial query feeds the replay. Nothing here
//! knows about tracks or timelines yet; see the `model` crate for that.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod attributes;
mod esri;
mod geojson_input;
mod ids;
mod rows;

use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use attributes::parse_instant;
pub use ids::{CheapID, IDMapping, TrackID, TrackName};

#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRecord {
    pub attributes: Map<String, Value>,
    /// Each path is an ordered list of vertices. Multi-part geometry has more than one.
    pub paths: Vec<Vec<RawVertex>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawVertex {
    pub x: f64,
    pub y: f64,
    /// How far along the track this vertex is, as a duration since the feature's start time.
    /// The unit is decided by whoever ingests the record.
    pub measure: Option<f64>,
}

impl RawVertex {
    pub fn new(x: f64, y: f64, measure: Option<f64>) -> Self {
        Self { x, y, measure }
    }
}

impl FeatureRecord {
    pub fn new(attributes: Map<String, Value>, paths: Vec<Vec<RawVertex>>) -> Self {
        Self { attributes, paths }
    }

    /// Null attributes count as missing.
    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field).filter(|v| !v.is_null())
    }

    pub fn track_name(&self, field: &str) -> Result<TrackName> {
        match self.attribute(field) {
            Some(value) => attributes::track_name(value),
            None => bail!("missing track ID attribute {field}"),
        }
    }

    pub fn start_time(&self, field: &str) -> Result<DateTime<Utc>> {
        match self.attribute(field) {
            Some(value) => parse_instant(value),
            None => bail!("missing start time attribute {field}"),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.paths.iter().map(|path| path.len()).sum()
    }
}

/// The encodings a query result can arrive in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    GeoJson,
    /// An ArcGIS-style JSON feature set, with polyline `paths` and optional M values.
    Esri,
    /// One row per vertex
    Csv,
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        match x.to_ascii_lowercase().as_str() {
            "geojson" | "json" => Ok(Format::GeoJson),
            "esri" | "arcgis" => Ok(Format::Esri),
            "csv" => Ok(Format::Csv),
            _ => bail!("Unknown input format {x}"),
        }
    }
}

impl Format {
    /// Guess from a file extension, defaulting to GeoJSON.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Format::Csv
        } else if lower.ends_with(".esrijson") || lower.ends_with(".esri.json") {
            Format::Esri
        } else {
            Format::GeoJson
        }
    }
}

pub fn load<R: std::io::Read>(reader: R, format: Format) -> Result<Vec<FeatureRecord>> {
    let features = match format {
        Format::GeoJson => geojson_input::load(reader)?,
        Format::Esri => esri::load(reader)?,
        Format::Csv => rows::load(reader)?,
    };
    info!(
        "Read {} features with {} vertices as {:?}",
        features.len(),
        features.iter().map(|f| f.num_vertices()).sum::<usize>(),
        format
    );
    Ok(features)
}
