mod scheduler;

use anyhow::Result;

use crate::layout::{
    CanvasConfig, ContinuityMemo, LayoutMode, LayoutNode, NodeTransition, transitions,
};
use crate::library::{
    Aggregation, Item, ItemId, ManualEntry, MergeError, Session, SessionStore, top_n,
};
use crate::viewport::Viewport;

pub use scheduler::{LayoutJob, LayoutRequest, LayoutResult, LayoutScheduler};

pub const DEFAULT_TOP_N: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewSettings {
    pub mode: LayoutMode,
    pub seed: u64,
    pub top_n: usize,
    pub show_all: bool,
    pub canvas: CanvasConfig,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            seed: 0,
            top_n: DEFAULT_TOP_N,
            show_all: false,
            canvas: CanvasConfig::default(),
        }
    }
}

/// Owns the catalog, the session and the current layout.
pub struct ViewModel {
    catalog: Vec<Item>,
    session: Session,
    store: Box<dyn SessionStore>,
    aggregation: Aggregation,
    settings: ViewSettings,
    memo: ContinuityMemo,
    scheduler: LayoutScheduler,
    nodes: Vec<LayoutNode>,
    transitions: Vec<NodeTransition>,
    viewport: Viewport,
}

impl ViewModel {
    pub fn new(
        catalog: Vec<Item>,
        store: Box<dyn SessionStore>,
        settings: ViewSettings,
    ) -> Result<Self> {
        let session = store.load()?;
        let aggregation = Aggregation::build(&catalog, &session);
        tracing::info!(
            items = aggregation.unmerged().len(),
            canonical = aggregation.canonical().len(),
            merges = session.merges.len(),
            hidden = session.hidden.len(),
            "library loaded"
        );

        let mut model = Self {
            catalog,
            session,
            store,
            aggregation,
            settings,
            memo: ContinuityMemo::new(),
            scheduler: LayoutScheduler::new(),
            nodes: Vec::new(),
            transitions: Vec::new(),
            viewport: Viewport::default(),
        };
        model.prune_merges();
        model.request_layout();
        Ok(model)
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn transitions(&self) -> &[NodeTransition] {
        &self.transitions
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn processing(&self) -> bool {
        self.scheduler.processing()
    }

    /// Visible canonical items that make the cut, heaviest first.
    pub fn selection(&self) -> Vec<Item> {
        let pool = self.aggregation.visible_pool(&self.session.hidden);
        top_n(&pool, self.settings.top_n, self.settings.show_all)
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<&Item> {
        self.aggregation.search(query, limit)
    }

    pub fn set_catalog(&mut self, catalog: Vec<Item>) {
        self.catalog = catalog;
        self.rebuild();
        self.prune_merges();
        self.request_layout();
    }

    pub fn add_merge(&mut self, from: ItemId, to: ItemId) -> Result<(), MergeError> {
        let aggregation = &self.aggregation;
        self.session
            .add_merge(from, to, |id| aggregation.contains(id))?;
        self.session_changed();
        Ok(())
    }

    pub fn remove_merge(&mut self, from: ItemId) -> bool {
        let changed = self.session.remove_merge(from);
        if changed {
            self.session_changed();
        }
        changed
    }

    pub fn hide(&mut self, id: ItemId) -> bool {
        let changed = self.session.hide(id);
        if changed {
            self.session_changed();
        }
        changed
    }

    pub fn unhide(&mut self, id: ItemId) -> bool {
        let changed = self.session.unhide(id);
        if changed {
            self.session_changed();
        }
        changed
    }

    pub fn upsert_manual(&mut self, entry: ManualEntry) {
        self.session.upsert_manual(entry);
        self.session_changed();
    }

    pub fn remove_manual(&mut self, appid: ItemId) -> bool {
        let changed = self.session.remove_manual(appid);
        if changed {
            self.session_changed();
        }
        changed
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        if self.settings.mode != mode {
            self.settings.mode = mode;
            self.request_layout();
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        if self.settings.seed != seed {
            self.settings.seed = seed;
            self.request_layout();
        }
    }

    pub fn set_selection(&mut self, top_n: usize, show_all: bool) {
        if self.settings.top_n != top_n || self.settings.show_all != show_all {
            self.settings.top_n = top_n;
            self.settings.show_all = show_all;
            self.request_layout();
        }
    }

    pub fn set_canvas(&mut self, canvas: CanvasConfig) {
        if self.settings.canvas != canvas {
            self.settings.canvas = canvas;
            self.request_layout();
        }
    }

    /// Starts a layout for the current selection and returns its generation.
    pub fn request_layout(&mut self) -> u64 {
        let request = LayoutRequest {
            mode: self.settings.mode,
            items: self.selection(),
            seed: self.settings.seed,
            canvas: self.settings.canvas,
        };

        match request.mode {
            LayoutMode::Packed => {
                let job = self.scheduler.immediate(request);
                let result = job.run(&self.memo);
                self.apply(result);
                job.generation
            }
            LayoutMode::Scatter => self.scheduler.defer(request),
        }
    }

    pub fn tick(&mut self) -> bool {
        match self.scheduler.next_job() {
            Some(job) => {
                let result = job.run(&self.memo);
                self.apply(result)
            }
            None => false,
        }
    }

    pub fn apply(&mut self, result: LayoutResult) -> bool {
        if !self.scheduler.is_current(result.generation) {
            tracing::debug!(
                generation = result.generation,
                latest = self.scheduler.latest(),
                "discarding stale layout"
            );
            return false;
        }

        self.transitions = transitions(&self.memo, &result.nodes);
        self.memo.record_positions(&result.nodes);
        self.nodes = result.nodes;
        true
    }

    fn prune_merges(&mut self) {
        let aggregation = &self.aggregation;
        let dropped = self
            .session
            .merges
            .retain_known(|id| aggregation.contains(id));
        if dropped > 0 {
            tracing::info!(dropped, "dropped merges for missing items");
            self.rebuild();
            self.save();
        }
    }

    fn rebuild(&mut self) {
        self.aggregation = Aggregation::build(&self.catalog, &self.session);
    }

    fn save(&self) {
        if let Err(error) = self.store.save(&self.session) {
            tracing::warn!("failed to save session: {error:#}");
        }
    }

    fn session_changed(&mut self) {
        self.rebuild();
        self.save();
        self.request_layout();
    }
}
