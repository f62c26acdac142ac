//! Animates markers along tracks as a shared time cursor moves. The host supplies a renderer and
//! forwards time and click events; everything else happens here.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod layer;
mod playback;
mod render;
mod resolve;
mod selection;
mod symbology;

pub use self::config::ReplayConfig;
pub use self::layer::LayerView;
pub use self::playback::{
    ingestion_channel, FrameStats, HostEvent, IngestionSender, PendingIngestion,
    PlaybackController, PlaybackOptions,
};
pub use self::render::{DrawnTrack, RenderBackend, ScreenPt, SoftwareRenderer, TrackUpdate};
pub use self::resolve::{
    phase, resolve, FadeCurve, PendingPolicy, RenderState, ResolvePolicy, StyleKind, TrackPhase,
};
pub use self::selection::{SelectionMode, SelectionSet};
pub use self::symbology::{
    default_assets, AssetSpec, Color, ImageAsset, LineStyle, MarkerStyle, PolylineStyle, Symbol,
    SymbolSet,
};
