use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures_channel::{mpsc, oneshot};

use features::TrackID;
use model::{Timeline, TrackModel};

use crate::{
    resolve, RenderBackend, RenderState, ResolvePolicy, ScreenPt, SelectionMode, SelectionSet,
    StyleKind, SymbolSet, TrackPhase, TrackUpdate,
};

/// Things the host tells the controller about
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostEvent {
    /// The start of the host's time window moved. None means there's no active window.
    TimeCursorChanged(Option<DateTime<Utc>>),
    Click(ScreenPt),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub policy: ResolvePolicy,
    pub selection: SelectionMode,
    /// Whether clicks hit-test and change the selection
    pub identify_enabled: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            policy: ResolvePolicy::default(),
            selection: SelectionMode::default(),
            identify_enabled: true,
        }
    }
}

/// Creates the two ends of one ingestion. Whoever loads the data finishes the sender, possibly on
/// another thread; the controller picks up the result on a later frame.
pub fn ingestion_channel() -> (IngestionSender, PendingIngestion) {
    let (tx, rx) = oneshot::channel();
    (IngestionSender(tx), PendingIngestion(rx))
}

pub struct IngestionSender(oneshot::Sender<Result<TrackModel>>);

impl IngestionSender {
    pub fn finish(self, result: Result<TrackModel>) {
        if self.0.send(result).is_err() {
            debug!("Nobody is waiting for this ingestion anymore");
        }
    }
}

pub struct PendingIngestion(oneshot::Receiver<Result<TrackModel>>);

/// Per-frame counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub pending: usize,
    pub moving: usize,
    pub stopped: usize,
    pub selected: usize,
    /// Tracks whose symbol couldn't be resolved, so their style didn't change
    pub unstyled: usize,
}

impl FrameStats {
    fn record(&mut self, state: &RenderState) {
        match state.phase {
            TrackPhase::Pending => self.pending += 1,
            TrackPhase::Moving => self.moving += 1,
            TrackPhase::Stopped => self.stopped += 1,
        }
        if state.style == StyleKind::Selected {
            self.selected += 1;
        }
    }
}

/// Owns the progress cursor and the selection, and pushes every track to the renderer each
/// frame.
pub struct PlaybackController<R: RenderBackend> {
    renderer: R,
    symbols: SymbolSet,
    options: PlaybackOptions,
    timeline: Timeline,

    model: Arc<TrackModel>,
    pending: Option<PendingIngestion>,
    events: Vec<mpsc::UnboundedReceiver<HostEvent>>,

    // The host's latest cursor. Progress is derived from this under the current timeline.
    cursor: Option<DateTime<Utc>>,
    progress: f64,
    selection: SelectionSet,
    // The last heading shown per track, for frames where interpolation has none
    headings: BTreeMap<TrackID, f64>,

    attached: bool,
    needs_redraw: bool,
}

impl<R: RenderBackend> PlaybackController<R> {
    /// Starts with no tracks and the progress cursor at 0.
    pub fn new(
        renderer: R,
        symbols: SymbolSet,
        timeline: Timeline,
        options: PlaybackOptions,
    ) -> Self {
        Self {
            renderer,
            symbols,
            options,
            timeline,

            model: Arc::new(TrackModel::empty(timeline)),
            pending: None,
            events: Vec::new(),

            cursor: None,
            progress: 0.0,
            selection: SelectionSet::new(options.selection),
            headings: BTreeMap::new(),

            attached: false,
            needs_redraw: false,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn model(&self) -> &Arc<TrackModel> {
        &self.model
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn set_identify_enabled(&mut self, enabled: bool) {
        self.options.identify_enabled = enabled;
    }

    /// Returns a sender the host can push events into. They're handled at the start of the next
    /// frame.
    pub fn subscribe(&mut self) -> mpsc::UnboundedSender<HostEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.events.push(rx);
        tx
    }

    /// Starts waiting on a new ingestion, abandoning any earlier one. The current tracks stay
    /// until the new ones are ready.
    pub fn set_source(&mut self, pending: PendingIngestion) {
        if self.pending.is_some() {
            info!("Abandoning the previous ingestion");
        }
        self.pending = Some(pending);
    }

    /// Replaces every track at once.
    pub fn set_model(&mut self, model: Arc<TrackModel>) {
        if model.timeline != self.timeline {
            info!(
                "New tracks use a different timeline; epoch {} in {:?}",
                model.timeline.epoch, model.timeline.unit
            );
            self.timeline = model.timeline;
            self.progress = self.progress_at_cursor();
        }
        info!("Replaying {} tracks", model.len());
        self.model = model;
        self.selection.clear();
        self.headings.clear();
        if self.attached {
            self.create_objects();
        }
        self.needs_redraw = true;
    }

    /// Swaps out every symbol. Takes effect on the next frame.
    pub fn set_symbols(&mut self, symbols: SymbolSet) {
        self.symbols = symbols;
        if self.attached {
            self.renderer.register_images(self.symbols.assets());
        }
        self.needs_redraw = true;
    }

    pub fn handle_event(&mut self, ev: HostEvent) {
        match ev {
            HostEvent::TimeCursorChanged(instant) => self.on_time_cursor_changed(instant),
            HostEvent::Click(pt) => {
                self.on_click(pt);
            }
        }
    }

    pub fn on_time_cursor_changed(&mut self, instant: Option<DateTime<Utc>>) {
        self.cursor = instant;
        self.progress = self.progress_at_cursor();
        self.needs_redraw = true;
    }

    fn progress_at_cursor(&self) -> f64 {
        match self.cursor {
            Some(instant) => self.timeline.progress_of(instant),
            None => 0.0,
        }
    }

    /// Returns the track that was hit, if any. Missing everything clears the selection.
    pub fn on_click(&mut self, pt: ScreenPt) -> Option<TrackID> {
        if !self.options.identify_enabled {
            return None;
        }
        let hit = self.renderer.hit_test(pt);
        self.selection.apply_hit(hit);
        self.needs_redraw = true;
        hit
    }

    /// Does the work for one frame: pick up finished ingestion and queued events, then update
    /// every track and render once. Nothing here blocks.
    pub fn tick(&mut self) -> FrameStats {
        self.poll_ingestion();
        self.poll_events();

        let mut stats = FrameStats::default();
        if !self.attached {
            return stats;
        }

        let model = self.model.clone();
        for track in model.tracks() {
            let placement = track.position_at(self.progress);
            let heading = match placement.heading {
                Some(heading) => {
                    self.headings.insert(track.id, heading);
                    heading
                }
                None => self.headings.get(&track.id).copied().unwrap_or(0.0),
            };

            let state = resolve(
                track,
                self.progress,
                self.selection.contains(track.id),
                &self.symbols,
                &self.options.policy,
            );
            stats.record(&state);

            let style = self.symbols.style(state.style.symbol_name());
            if style.is_none() {
                stats.unstyled += 1;
            }
            let update = TrackUpdate {
                state,
                pos: placement.pos,
                heading,
                progress: self.progress,
                marker: style.map(|(marker, _)| marker),
                line: style.map(|(_, line)| line),
            };
            self.renderer.update_style(track.id, &update);
        }
        self.renderer.render_frame();
        self.needs_redraw = false;
        stats
    }

    pub(crate) fn attach_renderer(&mut self) {
        self.renderer.register_images(self.symbols.assets());
        self.attached = true;
        self.create_objects();
        self.needs_redraw = true;
    }

    pub(crate) fn detach_renderer(&mut self) {
        self.renderer.clear();
        self.attached = false;
    }

    fn create_objects(&mut self) {
        self.renderer.clear();
        for track in self.model.tracks() {
            self.renderer.create_marker(track.id);
            self.renderer.create_polyline(track.id, track.vertices());
        }
    }

    fn poll_ingestion(&mut self) {
        let pending = match self.pending.as_mut() {
            Some(pending) => pending,
            None => return,
        };
        let result = match pending.0.try_recv() {
            Ok(Some(result)) => result,
            // Still working
            Ok(None) => return,
            Err(oneshot::Canceled) => Err(anyhow!("the loader went away without finishing")),
        };
        self.pending = None;

        match result {
            Ok(model) => self.set_model(Arc::new(model)),
            Err(err) => {
                error!("Couldn't load tracks: {err:#}");
                self.set_model(Arc::new(TrackModel::empty(self.timeline)));
            }
        }
    }

    fn poll_events(&mut self) {
        let mut queued = Vec::new();
        self.events.retain_mut(|rx| loop {
            match rx.try_next() {
                Ok(Some(ev)) => queued.push(ev),
                // Closed
                Ok(None) => return false,
                // Empty for now
                Err(_) => return true,
            }
        });
        for ev in queued {
            self.handle_event(ev);
        }
    }
}
