use anyhow::Result;
use serde_json::{Map, Value};

use crate::{FeatureRecord, RawVertex};

/// Reads one vertex per row. The `x` and `y` columns are required; `m` and `path` are optional.
/// Every other column is an attribute. Consecutive rows with identical attributes belong to the
/// same feature, and a change in `path` starts a new path within it.
pub fn load<R: std::io::Read>(reader: R) -> Result<Vec<FeatureRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let x_col = find("x").ok_or_else(|| anyhow!("CSV input has no x column"))?;
    let y_col = find("y").ok_or_else(|| anyhow!("CSV input has no y column"))?;
    let m_col = find("m");
    let path_col = find("path");

    let mut results: Vec<FeatureRecord> = Vec::new();
    let mut current_path: Option<String> = None;
    for (line, rec) in reader.records().enumerate() {
        let rec = rec?;

        let mut attributes = Map::new();
        for (idx, (header, value)) in headers.iter().zip(rec.iter()).enumerate() {
            if idx == x_col || Some(idx) == m_col || idx == y_col || Some(idx) == path_col {
                continue;
            }
            let value = if value.is_empty() {
                Value::Null
            } else {
                Value::String(value.to_string())
            };
            attributes.insert(header.trim().to_string(), value);
        }

        let x = parse_num(rec.get(x_col), line)?;
        let y = parse_num(rec.get(y_col), line)?;
        let measure = match m_col.and_then(|idx| rec.get(idx)) {
            Some(m) if !m.trim().is_empty() => Some(parse_num(Some(m), line)?),
            _ => None,
        };
        let vertex = RawVertex::new(x, y, measure);
        let path = path_col.and_then(|idx| rec.get(idx)).map(|p| p.to_string());

        match results.last_mut() {
            Some(feature) if feature.attributes == attributes => {
                match feature.paths.last_mut() {
                    Some(last) if path == current_path => last.push(vertex),
                    _ => feature.paths.push(vec![vertex]),
                }
            }
            _ => {
                results.push(FeatureRecord::new(attributes, vec![vec![vertex]]));
            }
        }
        current_path = path;
    }
    Ok(results)
}

fn parse_num(value: Option<&str>, line: usize) -> Result<f64> {
    match value {
        Some(x) => x
            .trim()
            .parse::<f64>()
            .map_err(|err| anyhow!("row {}: {x}: {err}", line + 1)),
        None => bail!("row {} is too short", line + 1),
    }
}
