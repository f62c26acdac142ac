use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{FeatureRecord, RawVertex};

pub fn load<R: std::io::Read>(reader: R) -> Result<Vec<FeatureRecord>> {
    let set: FeatureSet = serde_json::from_reader(reader).context("parsing feature set")?;

    let mut results = Vec::new();
    for (idx, feature) in set.features.into_iter().enumerate() {
        let mut paths = Vec::new();
        if let Some(geometry) = feature.geometry {
            // Geometry can override the set-level flags
            let has_z = geometry.has_z.unwrap_or(set.has_z);
            for path in geometry.paths {
                let mut pts = Vec::new();
                for coords in path {
                    pts.push(vertex(&coords, has_z).with_context(|| format!("feature #{idx}"))?);
                }
                paths.push(pts);
            }
        }
        results.push(FeatureRecord::new(feature.attributes, paths));
    }
    Ok(results)
}

// Coordinates are [x, y, m] or, with Z enabled, [x, y, z, m]. M values may be null.
fn vertex(coords: &[Option<f64>], has_z: bool) -> Result<RawVertex> {
    let (x, y) = match (coords.first(), coords.get(1)) {
        (Some(Some(x)), Some(Some(y))) => (*x, *y),
        _ => bail!("Vertex {:?} is missing x or y", coords),
    };
    let measure_idx = if has_z { 3 } else { 2 };
    let measure = coords.get(measure_idx).copied().flatten();
    Ok(RawVertex::new(x, y, measure))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureSet {
    #[serde(default)]
    has_z: bool,
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    attributes: Map<String, Value>,
    geometry: Option<Polyline>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Polyline {
    has_z: Option<bool>,
    #[serde(default)]
    paths: Vec<Vec<Vec<Option<f64>>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_with_m_values() {
        let input = r#"{
            "hasM": true,
            "features": [{
                "attributes": {"OBJECTID": 1, "StartTimeUTC": 1609459200000},
                "geometry": {"paths": [[[0, 0, 0], [10, 0, null]], [[10, 10]]]}
            }, {
                "attributes": {"OBJECTID": 2},
                "geometry": {"hasZ": true, "paths": [[[1, 1, 50, 2.5]]]}
            }, {
                "attributes": {"OBJECTID": 3}
            }]
        }"#;
        let features = load(input.as_bytes()).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(
            features[0].paths,
            vec![
                vec![
                    RawVertex::new(0.0, 0.0, Some(0.0)),
                    RawVertex::new(10.0, 0.0, None)
                ],
                vec![RawVertex::new(10.0, 10.0, None)],
            ]
        );
        assert_eq!(features[1].paths[0][0], RawVertex::new(1.0, 1.0, Some(2.5)));
        assert!(features[2].paths.is_empty());
    }

    #[test]
    fn missing_coordinates() {
        let input = r#"{"features": [{"attributes": {}, "geometry": {"paths": [[[null, 1]]]}}]}"#;
        assert!(load(input.as_bytes()).is_err());
    }
}
