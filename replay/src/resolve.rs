use serde::{Deserialize, Serialize};

use model::Track;

use crate::SymbolSet;

/// Which named symbol a track gets this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleKind {
    Default,
    Moving,
    Selected,
}

impl StyleKind {
    pub fn symbol_name(self) -> &'static str {
        match self {
            StyleKind::Default => "default",
            StyleKind::Moving => "moving",
            StyleKind::Selected => "selected",
        }
    }
}

/// Where the progress cursor sits relative to a track's time extent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackPhase {
    /// The track hasn't started yet
    Pending,
    Moving,
    /// The track has ended; its line is fading out
    Stopped,
}

/// How opacity decays after a track stops. Every curve starts at 1 when the track ends and
/// reaches the symbol's `opacity_at_cutoff` exactly at `cutoff_time` later, never increasing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    #[default]
    Linear,
    /// Eases in and out of the fade
    Smoothstep,
    /// Report full opacity and let the renderer fade the line using the cutoff parameters
    Renderer,
}

impl FadeCurve {
    /// `elapsed` is the time since the track ended.
    pub fn opacity(self, elapsed: f64, cutoff_time: f64, opacity_at_cutoff: f64) -> f64 {
        if self == FadeCurve::Renderer {
            return 1.0;
        }
        if elapsed <= 0.0 {
            return 1.0;
        }
        // Also catches a zero-length window
        if !(elapsed < cutoff_time) {
            return opacity_at_cutoff;
        }
        let pct = elapsed / cutoff_time;
        let eased = match self {
            FadeCurve::Smoothstep => pct * pct * (3.0 - 2.0 * pct),
            _ => pct,
        };
        1.0 + (opacity_at_cutoff - 1.0) * eased
    }
}

/// What to do with tracks that haven't started yet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    /// Draw the marker at its first position with the default symbol
    #[default]
    ShowAtRest,
    Hide,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolvePolicy {
    pub fade: FadeCurve,
    pub pending: PendingPolicy,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderState {
    pub style: StyleKind,
    pub phase: TrackPhase,
    pub opacity: f64,
    pub visible: bool,
}

pub fn phase(track: &Track, progress: f64) -> TrackPhase {
    if track.is_within_time_extent(progress) {
        TrackPhase::Moving
    } else if progress > track.time_extent().end {
        TrackPhase::Stopped
    } else {
        TrackPhase::Pending
    }
}

/// Selection beats everything. Otherwise a track within its time extent is moving, and anything
/// else gets the default symbol, fading out once the track has stopped.
pub fn resolve(
    track: &Track,
    progress: f64,
    selected: bool,
    symbols: &SymbolSet,
    policy: &ResolvePolicy,
) -> RenderState {
    let phase = phase(track, progress);
    if selected {
        return RenderState {
            style: StyleKind::Selected,
            phase,
            opacity: 1.0,
            visible: true,
        };
    }

    match phase {
        TrackPhase::Moving => RenderState {
            style: StyleKind::Moving,
            phase,
            opacity: 1.0,
            visible: true,
        },
        TrackPhase::Pending => RenderState {
            style: StyleKind::Default,
            phase,
            opacity: 1.0,
            visible: policy.pending == PendingPolicy::ShowAtRest,
        },
        TrackPhase::Stopped => {
            let opacity = match symbols.get(StyleKind::Default.symbol_name()) {
                Some(symbol) => policy.fade.opacity(
                    progress - track.time_extent().end,
                    symbol.cutoff_time,
                    symbol.opacity_at_cutoff,
                ),
                None => 1.0,
            };
            RenderState {
                style: StyleKind::Default,
                phase,
                opacity,
                visible: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use features::{TrackID, TrackName};
    use model::{TimeUnit, Vertex};

    fn track() -> Track {
        Track::new(
            TrackID(0),
            TrackName("A".to_string()),
            vec![Vertex::new(0.0, 0.0, 100.0), Vertex::new(10.0, 0.0, 200.0)],
        )
        .unwrap()
    }

    fn symbols() -> SymbolSet {
        // 180 second cutoff, 0.1 floor
        SymbolSet::defaults(TimeUnit::Seconds)
    }

    #[test]
    fn selection_takes_precedence() {
        let policy = ResolvePolicy::default();
        for progress in [0.0, 100.0, 150.0, 200.0, 250.0, 1000.0] {
            let state = resolve(&track(), progress, true, &symbols(), &policy);
            assert_eq!(state.style, StyleKind::Selected);
            assert_eq!(state.opacity, 1.0);
        }
        let state = resolve(&track(), 150.0, true, &symbols(), &policy);
        assert_eq!(state.phase, TrackPhase::Moving);
    }

    #[test]
    fn moving_within_extent() {
        let policy = ResolvePolicy::default();
        for progress in [100.0, 150.0, 200.0] {
            let state = resolve(&track(), progress, false, &symbols(), &policy);
            assert_eq!(state.style, StyleKind::Moving);
            assert_eq!(state.phase, TrackPhase::Moving);
        }
    }

    #[test]
    fn pending_policy() {
        let mut policy = ResolvePolicy::default();
        let state = resolve(&track(), 50.0, false, &symbols(), &policy);
        assert_eq!(state.style, StyleKind::Default);
        assert_eq!(state.phase, TrackPhase::Pending);
        assert!(state.visible);
        assert_eq!(state.opacity, 1.0);

        policy.pending = PendingPolicy::Hide;
        assert!(!resolve(&track(), 50.0, false, &symbols(), &policy).visible);
        assert!(resolve(&track(), 50.0, true, &symbols(), &policy).visible);
    }

    #[test]
    fn fades_after_stopping() {
        let policy = ResolvePolicy::default();
        let symbols = symbols();
        let mut last = 1.0;
        for step in 1..=18 {
            let progress = 200.0 + 10.0 * step as f64;
            let state = resolve(&track(), progress, false, &symbols, &policy);
            assert_eq!(state.style, StyleKind::Default);
            assert_eq!(state.phase, TrackPhase::Stopped);
            assert!(state.opacity <= last);
            last = state.opacity;
        }
        assert_eq!(resolve(&track(), 380.0, false, &symbols, &policy).opacity, 0.1);
        assert_eq!(resolve(&track(), 5000.0, false, &symbols, &policy).opacity, 0.1);
        let halfway = resolve(&track(), 290.0, false, &symbols, &policy).opacity;
        assert!((halfway - 0.55).abs() < 1e-9);
    }

    #[test]
    fn fade_curves() {
        for curve in [FadeCurve::Linear, FadeCurve::Smoothstep] {
            assert_eq!(curve.opacity(0.0, 10.0, 0.2), 1.0);
            assert_eq!(curve.opacity(10.0, 10.0, 0.2), 0.2);
            assert_eq!(curve.opacity(11.0, 10.0, 0.2), 0.2);
            let mut last = 1.0;
            for i in 1..100 {
                let opacity = curve.opacity(i as f64 / 10.0, 10.0, 0.2);
                assert!(opacity <= last);
                assert!(opacity >= 0.2);
                last = opacity;
            }
        }
        // No window at all
        assert_eq!(FadeCurve::Linear.opacity(0.5, 0.0, 0.3), 0.3);
        assert_eq!(FadeCurve::Renderer.opacity(50.0, 10.0, 0.2), 1.0);
    }

    #[test]
    fn without_a_default_symbol() {
        let symbols = SymbolSet::new();
        let state = resolve(&track(), 300.0, false, &symbols, &ResolvePolicy::default());
        assert_eq!(state.style, StyleKind::Default);
        assert_eq!(state.opacity, 1.0);
    }
}
