use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Value};

use crate::{FeatureRecord, RawVertex};

pub fn load<R: std::io::Read>(mut reader: R) -> Result<Vec<FeatureRecord>> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    let gj: GeoJson = raw.parse().context("parsing GeoJSON")?;

    let features = match gj {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => bail!("Expected a Feature or FeatureCollection, not a bare Geometry"),
    };

    let mut results = Vec::new();
    for (idx, feature) in features.into_iter().enumerate() {
        results.push(convert(feature).with_context(|| format!("feature #{idx}"))?);
    }
    Ok(results)
}

fn convert(feature: Feature) -> Result<FeatureRecord> {
    let paths = match feature.geometry {
        Some(geometry) => match geometry.value {
            Value::LineString(line) => vec![path(line)?],
            Value::MultiLineString(lines) => lines
                .into_iter()
                .map(path)
                .collect::<Result<Vec<_>>>()?,
            Value::Point(pt) => vec![vec![vertex(&pt)?]],
            Value::MultiPoint(pts) => vec![path(pts)?],
            Value::Polygon(_) | Value::MultiPolygon(_) | Value::GeometryCollection(_) => {
                warn!("Ignoring a feature with non-linear geometry");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    Ok(FeatureRecord::new(feature.properties.unwrap_or_default(), paths))
}

fn path(positions: Vec<Vec<f64>>) -> Result<Vec<RawVertex>> {
    positions.iter().map(|pos| vertex(pos)).collect()
}

// A third ordinate is the measure. With four, the third is elevation and the fourth is the measure.
fn vertex(pos: &[f64]) -> Result<RawVertex> {
    match pos.len() {
        0 | 1 => bail!("Position {:?} needs at least 2 ordinates", pos),
        2 => Ok(RawVertex::new(pos[0], pos[1], None)),
        3 => Ok(RawVertex::new(pos[0], pos[1], Some(pos[2]))),
        _ => Ok(RawVertex::new(pos[0], pos[1], Some(pos[3]))),
    }
}
