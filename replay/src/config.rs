use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use features::FeatureRecord;
use model::{earliest_start, Fields, TimeUnit, Timeline};

use crate::{
    AssetSpec, FadeCurve, PendingPolicy, PlaybackOptions, ResolvePolicy, SelectionMode, Symbol,
    SymbolSet,
};

/// Everything about a replay that isn't the data itself. Every field is optional in the JSON.
#[derive(Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub track_id_field: String,
    pub start_time_field: String,
    /// Defaults to the earliest start time in the input
    pub epoch: Option<DateTime<Utc>>,
    /// The canonical unit for progress, cutoff times, and the CLI's step
    pub progress_unit: TimeUnit,
    /// What vertex measures are expressed in
    pub measure_unit: TimeUnit,
    pub identify_enabled: bool,
    pub selection: SelectionMode,
    pub fade: FadeCurve,
    pub pending: PendingPolicy,
    /// For the software renderer's hit-testing, in map units
    pub pick_radius: f64,
    /// Added to the default bird and circle images
    pub assets: Vec<AssetSpec>,
    /// Override or add to the default symbols
    pub symbols: BTreeMap<String, Symbol>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        let fields = Fields::default();
        Self {
            track_id_field: fields.track_id,
            start_time_field: fields.start_time,
            epoch: None,
            progress_unit: TimeUnit::Seconds,
            measure_unit: TimeUnit::Minutes,
            identify_enabled: true,
            selection: SelectionMode::default(),
            fade: FadeCurve::default(),
            pending: PendingPolicy::default(),
            pick_radius: 10.0,
            assets: Vec::new(),
            symbols: BTreeMap::new(),
        }
    }
}

impl ReplayConfig {
    pub fn load(path: &str) -> Result<Self> {
        let raw = fs_err::read_to_string(path)?;
        Self::parse(&raw).with_context(|| format!("reading config {path}"))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn fields(&self) -> Fields {
        Fields {
            track_id: self.track_id_field.clone(),
            start_time: self.start_time_field.clone(),
        }
    }

    /// Falls back to the earliest start time, then the Unix epoch.
    pub fn timeline(&self, features: &[FeatureRecord]) -> Timeline {
        let epoch = self
            .epoch
            .or_else(|| earliest_start(features, &self.start_time_field))
            .unwrap_or_default();
        Timeline::new(epoch, self.progress_unit)
    }

    pub fn symbols(&self) -> SymbolSet {
        let mut set = SymbolSet::defaults(self.progress_unit);
        set.register_assets(&self.assets);
        for (name, symbol) in &self.symbols {
            set.set_symbol(name, symbol.clone());
        }
        set
    }

    pub fn options(&self) -> PlaybackOptions {
        PlaybackOptions {
            policy: ResolvePolicy {
                fade: self.fade,
                pending: self.pending,
            },
            selection: self.selection,
            identify_enabled: self.identify_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::Color;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ReplayConfig::parse("{}").unwrap();
        assert_eq!(config.track_id_field, "OBJECTID");
        assert_eq!(config.progress_unit, TimeUnit::Seconds);
        assert_eq!(config.options(), PlaybackOptions::default());
        let timeline = config.timeline(&[]);
        assert_eq!(timeline.epoch.timestamp(), 0);
        assert!(config.symbols().get("moving").is_some());
    }

    #[test]
    fn overrides() {
        let config = ReplayConfig::parse(
            r##"{
                "track_id_field": "bird_id",
                "epoch": "2021-01-01T00:00:00Z",
                "progress_unit": "minutes",
                "selection": "single",
                "fade": "smoothstep",
                "pending": "hide",
                "assets": [{"kind": "plane", "url": "plane.png"}],
                "symbols": {
                    "moving": {
                        "image_kind": "plane",
                        "size": 20,
                        "fill": "#ff0000",
                        "line_color": "white",
                        "line_width": 2,
                        "line_style": "dashed",
                        "cutoff_time": 10,
                        "opacity_at_cutoff": 0.25
                    }
                }
            }"##,
        )
        .unwrap();
        assert_eq!(config.fields().track_id, "bird_id");
        assert_eq!(config.fields().start_time, "StartTimeUTC");
        assert_eq!(
            config.timeline(&[]).epoch,
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
        );
        let options = config.options();
        assert_eq!(options.selection, SelectionMode::Single);
        assert_eq!(options.policy.fade, FadeCurve::Smoothstep);
        assert_eq!(options.policy.pending, PendingPolicy::Hide);

        let symbols = config.symbols();
        let (marker, line) = symbols.style("moving").unwrap();
        assert_eq!(marker.image_index, 2);
        assert_eq!(marker.color, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(line.cutoff_time, 10.0);
        // Untouched defaults are in minutes now
        assert_eq!(symbols.get("default").unwrap().cutoff_time, 3.0);
    }

    #[test]
    fn bad_config() {
        assert!(ReplayConfig::parse(r#"{"progress_unit": "fortnights"}"#).is_err());
        assert!(ReplayConfig::parse(
            r#"{"symbols": {"x": {"image_kind": "bird", "size": 1, "fill": "nope"}}}"#
        )
        .is_err());
    }
}
