use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use features::{FeatureRecord, IDMapping, TrackID, TrackName};

use crate::{TimeUnit, Timeline, Track, TrackModel, Vertex};

/// Which attributes identify a track and say when each record starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fields {
    pub track_id: String,
    pub start_time: String,
}

impl Default for Fields {
    fn default() -> Self {
        Self {
            track_id: "OBJECTID".to_string(),
            start_time: "StartTimeUTC".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub features: usize,
    /// Missing or unreadable track ID or start time
    pub skipped_features: usize,
    pub empty_features: usize,
    pub skipped_vertices: usize,
    pub tracks: usize,
    pub vertices: usize,
}

/// Groups raw features into tracks. Multiple records for one track are merged, and every track's
/// vertices are sorted by time. Problems with individual features are logged and skipped, never
/// fatal.
///
/// Measures are durations in `measure_unit` since the feature's start time. Vertices without a
/// measure are placed at progress 0.
pub fn ingest(
    features: &[FeatureRecord],
    fields: &Fields,
    timeline: Timeline,
    measure_unit: TimeUnit,
) -> TrackModel {
    let mut stats = IngestStats {
        features: features.len(),
        ..Default::default()
    };
    let mut ids: IDMapping<TrackName, TrackID> = IDMapping::new();
    let mut partial: BTreeMap<TrackID, (TrackName, Vec<Vertex>)> = BTreeMap::new();

    for (idx, feature) in features.iter().enumerate() {
        let name = match feature.track_name(&fields.track_id) {
            Ok(name) => name,
            Err(err) => {
                warn!("Skipping feature #{idx}: {err}");
                stats.skipped_features += 1;
                continue;
            }
        };
        let start = match feature.start_time(&fields.start_time) {
            Ok(start) => start,
            Err(err) => {
                warn!("Skipping feature #{idx} of track {name}: {err}");
                stats.skipped_features += 1;
                continue;
            }
        };
        let start_offset = timeline.progress_of(start);

        let mut coords = Vec::new();
        for path in &feature.paths {
            for vertex in path {
                let t = match vertex.measure {
                    Some(m) => measure_unit.convert(m, timeline.unit) + start_offset,
                    None => 0.0,
                };
                if !t.is_finite() || !vertex.x.is_finite() || !vertex.y.is_finite() {
                    warn!("Skipping a non-finite vertex of track {name}: {:?}", vertex);
                    stats.skipped_vertices += 1;
                    continue;
                }
                coords.push(Vertex::new(vertex.x, vertex.y, t));
            }
        }
        if coords.is_empty() {
            debug!("Feature #{idx} of track {name} has no vertices");
            stats.empty_features += 1;
            continue;
        }

        let id = ids.insert_idempotent(&name);
        partial
            .entry(id)
            .or_insert_with(|| (name, Vec::new()))
            .1
            .extend(coords);
    }

    let mut tracks = BTreeMap::new();
    for (id, (name, vertices)) in partial {
        match Track::new(id, name, vertices) {
            Ok(track) => {
                debug!(
                    "Track {} has {} vertices covering {:.1} map units",
                    track.name,
                    track.vertices().len(),
                    track.length()
                );
                stats.vertices += track.vertices().len();
                tracks.insert(id, track);
            }
            Err(err) => warn!("{err}"),
        }
    }
    stats.tracks = tracks.len();

    info!(
        "Ingested {} tracks with {} vertices from {} features ({} skipped, {} empty, {} bad vertices)",
        stats.tracks,
        stats.vertices,
        stats.features,
        stats.skipped_features,
        stats.empty_features,
        stats.skipped_vertices
    );
    TrackModel::new(timeline, tracks, ids, stats)
}

/// The earliest readable start time, useful as a default epoch.
pub fn earliest_start(features: &[FeatureRecord], start_time_field: &str) -> Option<DateTime<Utc>> {
    features
        .iter()
        .filter_map(|f| f.start_time(start_time_field).ok())
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use features::RawVertex;
    use serde_json::{json, Value};

    use crate::Pt2D;

    fn jan1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
    }

    fn fields() -> Fields {
        Fields {
            track_id: "track".to_string(),
            start_time: "start".to_string(),
        }
    }

    fn feature(attributes: Value, paths: Vec<Vec<(f64, f64, Option<f64>)>>) -> FeatureRecord {
        FeatureRecord::new(
            attributes.as_object().unwrap().clone(),
            paths
                .into_iter()
                .map(|path| {
                    path.into_iter()
                        .map(|(x, y, m)| RawVertex::new(x, y, m))
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn merges_records_for_one_track() {
        // The second record arrives first, so sorting matters
        let input = vec![
            feature(
                json!({"track": "A", "start": "2021-01-01T00:00:00Z"}),
                vec![vec![(10.0, 0.0, Some(5.0)), (10.0, 10.0, Some(10.0))]],
            ),
            feature(
                json!({"track": "A", "start": "2021-01-01T00:00:00Z"}),
                vec![vec![(0.0, 0.0, Some(0.0)), (10.0, 0.0, Some(5.0))]],
            ),
        ];
        let model = ingest(
            &input,
            &fields(),
            Timeline::new(jan1(), TimeUnit::Seconds),
            TimeUnit::Minutes,
        );
        assert_eq!(model.len(), 1);
        let track = model.find(&TrackName("A".to_string())).unwrap();
        let times: Vec<f64> = track.vertices().iter().map(|v| v.t).collect();
        assert_eq!(times, vec![0.0, 300.0, 300.0, 600.0]);
        assert_eq!(track.time_extent().start, 0.0);
        assert_eq!(track.time_extent().end, 600.0);
        assert_eq!(track.position_at(150.0).pos, Pt2D::new(5.0, 0.0));
    }

    #[test]
    fn start_offsets_and_units() {
        let input = vec![feature(
            json!({"track": 7, "start": "2021-01-01T01:00:00Z"}),
            vec![vec![(0.0, 0.0, Some(0.0)), (1.0, 0.0, Some(30.0))]],
        )];
        let model = ingest(
            &input,
            &fields(),
            Timeline::new(jan1(), TimeUnit::Minutes),
            TimeUnit::Minutes,
        );
        let track = model.find(&TrackName("7".to_string())).unwrap();
        assert_eq!(track.time_extent().start, 60.0);
        assert_eq!(track.time_extent().end, 90.0);

        let model = ingest(
            &input,
            &fields(),
            Timeline::new(jan1(), TimeUnit::Milliseconds),
            TimeUnit::Seconds,
        );
        let track = model.find(&TrackName("7".to_string())).unwrap();
        assert_eq!(track.time_extent().end, 3_600_000.0 + 30_000.0);
    }

    #[test]
    fn skips_bad_features() {
        let input = vec![
            feature(json!({"start": "2021-01-01T00:00:00Z"}), vec![vec![(0.0, 0.0, Some(1.0))]]),
            feature(json!({"track": "B"}), vec![vec![(0.0, 0.0, Some(1.0))]]),
            feature(
                json!({"track": "C", "start": "not a time"}),
                vec![vec![(0.0, 0.0, Some(1.0))]],
            ),
            feature(json!({"track": "D", "start": "2021-01-01T00:00:00Z"}), vec![]),
            feature(
                json!({"track": "E", "start": "2021-01-01T00:00:00Z"}),
                vec![vec![
                    (1.0, 2.0, Some(1.0)),
                    (f64::NAN, 0.0, Some(2.0)),
                    (3.0, 4.0, Some(f64::NAN)),
                ]],
            ),
        ];
        let model = ingest(
            &input,
            &fields(),
            Timeline::new(jan1(), TimeUnit::Seconds),
            TimeUnit::Minutes,
        );
        assert_eq!(model.len(), 1);
        assert!(model.find(&TrackName("E".to_string())).is_some());
        // Empty features never register an ID
        assert!(model.find(&TrackName("D".to_string())).is_none());
        assert_eq!(model.tracks().next().unwrap().id, TrackID(0));
        assert_eq!(model.stats.skipped_features, 3);
        assert_eq!(model.stats.empty_features, 1);
        // Non-finite coordinates or measures drop just that vertex
        assert_eq!(model.stats.skipped_vertices, 2);
        assert_eq!(model.stats.vertices, 1);
        assert_eq!(
            model.find(&TrackName("E".to_string())).unwrap().vertices()[0].pos,
            Pt2D::new(1.0, 2.0)
        );
    }

    #[test]
    fn missing_measures_start_at_zero() {
        let input = vec![feature(
            json!({"track": "A", "start": "2021-01-01T00:10:00Z"}),
            vec![vec![(0.0, 0.0, None), (5.0, 5.0, Some(1.0))]],
        )];
        let model = ingest(
            &input,
            &fields(),
            Timeline::new(jan1(), TimeUnit::Seconds),
            TimeUnit::Minutes,
        );
        let track = model.find(&TrackName("A".to_string())).unwrap();
        assert_eq!(track.vertices()[0].t, 0.0);
        assert_eq!(track.vertices()[1].t, 660.0);
    }

    #[test]
    fn paths_concatenate_in_order() {
        let input = vec![feature(
            json!({"track": "A", "start": "2021-01-01T00:00:00Z"}),
            vec![
                vec![(0.0, 0.0, None), (1.0, 0.0, None)],
                vec![(2.0, 0.0, None)],
            ],
        )];
        let model = ingest(
            &input,
            &fields(),
            Timeline::new(jan1(), TimeUnit::Seconds),
            TimeUnit::Minutes,
        );
        let xs: Vec<f64> = model.tracks().next().unwrap().vertices().iter().map(|v| v.pos.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_input() {
        let model = ingest(
            &[],
            &fields(),
            Timeline::new(jan1(), TimeUnit::Seconds),
            TimeUnit::Minutes,
        );
        assert!(model.is_empty());
        assert_eq!(model.full_extent(), None);
        assert_eq!(earliest_start(&[], "start"), None);
    }

    #[test]
    fn earliest() {
        let input = vec![
            feature(json!({"start": "2021-01-02T00:00:00Z"}), vec![]),
            feature(json!({"start": "2021-01-01T00:00:00Z"}), vec![]),
            feature(json!({"start": "garbage"}), vec![]),
        ];
        assert_eq!(earliest_start(&input, "start"), Some(jan1()));
    }
}
