use std::collections::BTreeMap;

use features::TrackID;
use model::{Pt2D, Vertex};

use crate::{ImageAsset, MarkerStyle, PolylineStyle, RenderState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPt {
    pub x: f64,
    pub y: f64,
}

impl ScreenPt {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Everything about one track for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackUpdate {
    pub state: RenderState,
    pub pos: Pt2D,
    /// Radians
    pub heading: f64,
    /// The shared progress cursor. The line is drawn up to here.
    pub progress: f64,
    /// None means the symbol couldn't be resolved; keep whatever style was applied before.
    pub marker: Option<MarkerStyle>,
    pub line: Option<PolylineStyle>,
}

/// The drawing surface. Implementations own every GPU resource; callers only describe tracks.
pub trait RenderBackend {
    fn register_images(&mut self, assets: &[ImageAsset]);
    fn create_marker(&mut self, track: TrackID);
    fn create_polyline(&mut self, track: TrackID, vertices: &[Vertex]);
    fn update_style(&mut self, track: TrackID, update: &TrackUpdate);
    /// Which marker, if any, is under this point
    fn hit_test(&self, pt: ScreenPt) -> Option<TrackID>;
    fn render_frame(&mut self);
    /// Forget every marker and polyline
    fn clear(&mut self);
}

/// Keeps the latest state of everything in memory. Screen space is map space.
pub struct SoftwareRenderer {
    pick_radius: f64,
    images: Vec<ImageAsset>,
    objects: BTreeMap<TrackID, DrawnTrack>,
    frames: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawnTrack {
    pub has_marker: bool,
    pub polyline: Vec<Vertex>,
    pub latest: Option<TrackUpdate>,
    // These persist across updates that don't carry a style
    pub marker_style: Option<MarkerStyle>,
    pub line_style: Option<PolylineStyle>,
}

impl SoftwareRenderer {
    pub fn new(pick_radius: f64) -> Self {
        Self {
            pick_radius,
            images: Vec::new(),
            objects: BTreeMap::new(),
            frames: 0,
        }
    }

    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }

    pub fn track(&self, id: TrackID) -> Option<&DrawnTrack> {
        self.objects.get(&id)
    }

    pub fn num_tracks(&self) -> usize {
        self.objects.len()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl RenderBackend for SoftwareRenderer {
    fn register_images(&mut self, assets: &[ImageAsset]) {
        self.images = assets.to_vec();
    }

    fn create_marker(&mut self, track: TrackID) {
        self.objects.entry(track).or_default().has_marker = true;
    }

    fn create_polyline(&mut self, track: TrackID, vertices: &[Vertex]) {
        self.objects.entry(track).or_default().polyline = vertices.to_vec();
    }

    fn update_style(&mut self, track: TrackID, update: &TrackUpdate) {
        let obj = match self.objects.get_mut(&track) {
            Some(obj) => obj,
            None => {
                warn!("Update for {:?}, which has no marker or polyline", track);
                return;
            }
        };
        obj.latest = Some(*update);
        if update.marker.is_some() {
            obj.marker_style = update.marker;
        }
        if update.line.is_some() {
            obj.line_style = update.line;
        }
    }

    fn hit_test(&self, pt: ScreenPt) -> Option<TrackID> {
        let pt = Pt2D::new(pt.x, pt.y);
        let mut best: Option<(TrackID, f64)> = None;
        for (id, obj) in &self.objects {
            let update = match obj.latest {
                Some(update) if obj.has_marker && update.state.visible => update,
                _ => continue,
            };
            let dist = update.pos.dist_to(pt);
            if dist > self.pick_radius {
                continue;
            }
            if best.map(|(_, d)| dist < d).unwrap_or(true) {
                best = Some((*id, dist));
            }
        }
        best.map(|(id, _)| id)
    }

    fn render_frame(&mut self) {
        self.frames += 1;
    }

    fn clear(&mut self) {
        self.objects.clear();
    }
}
