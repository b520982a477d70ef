//! Agent Canvas - a structural edit engine for AI-driven design documents
//!
//! This library applies batches of typed edit operations to a live scene
//! graph and algorithmically repairs the surrounding geometry: proportional
//! scaling, tight-fit shrinking, ancestor growth/shrink propagation, and
//! exact preservation of user-intended spacing. Every applied batch can be
//! reverted exactly.
//!
//! # Example
//!
//! ```rust
//! use agent_canvas::{CanvasEditor, EngineConfig};
//! use agent_canvas::ops::{Operation, OperationBatch};
//! use agent_canvas::scene::{Rect, SceneGraph, ShapePrimitive};
//!
//! let mut scene = SceneGraph::new(400.0, 300.0);
//! let hero = scene
//!     .create_shape(
//!         scene.root(),
//!         "hero",
//!         Rect::new(0.0, 0.0, 200.0, 100.0),
//!         ShapePrimitive::Rectangle,
//!     )
//!     .unwrap();
//!
//! let mut editor = CanvasEditor::new(scene, EngineConfig::default());
//! let reports = editor.apply_batch(OperationBatch::new(
//!     "make the hero taller",
//!     vec![Operation::Resize {
//!         node_id: hero,
//!         width: 200.0,
//!         height: 150.0,
//!     }],
//! ));
//! assert!(reports.iter().all(|r| r.outcome.is_ok()));
//!
//! editor.revert_last().unwrap();
//! assert_eq!(editor.scene().get(hero).unwrap().rect.height, 100.0);
//! ```

pub mod engine;
pub mod fonts;
pub mod jobs;
pub mod ops;
pub mod planner;
pub mod revert;
pub mod scene;

pub use engine::{ConfigError, EngineConfig, EngineError, PropagationReport};
pub use fonts::{FontCatalog, FontResolver};
pub use jobs::{JobHandle, JobId, JobRegistry};
pub use ops::{ComponentCatalog, OpError, OpReport, Operation, OperationBatch, StyleCatalog};
pub use planner::{PlanError, Planner};
pub use revert::{JsonFileRevertStore, MemoryRevertStore, RevertError, RevertState, RevertStore};
pub use scene::{NodeId, SceneError, SceneGraph};

use std::time::SystemTime;

use thiserror::Error;

use ops::Dispatcher;

/// Errors surfaced by the editor's outer API and the CLI
#[derive(Debug, Error)]
pub enum EditError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("engine profile error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Revert(#[from] RevertError),

    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}

/// One line of the applied-batch audit log
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: SystemTime,
    pub intent: String,
    pub summary: String,
}

/// The stateful editor owning the scene, its collaborators, and the last
/// revertible state
///
/// All global mutable state of the edit flow — the pending revert slot, the
/// audit log, the in-flight job registry — lives here as explicit injected
/// state rather than module globals.
pub struct CanvasEditor {
    scene: SceneGraph,
    config: EngineConfig,
    fonts: Box<dyn FontResolver>,
    components: ComponentCatalog,
    styles: StyleCatalog,
    store: Box<dyn RevertStore>,
    pending_revert: Option<RevertState>,
    audit: Vec<AuditEntry>,
    jobs: JobRegistry,
}

impl CanvasEditor {
    /// Create an editor with the default font catalog and a volatile revert
    /// store
    pub fn new(scene: SceneGraph, config: EngineConfig) -> Self {
        Self {
            scene,
            config,
            fonts: Box::new(FontCatalog::with_defaults()),
            components: ComponentCatalog::new(),
            styles: StyleCatalog::new(),
            store: Box::new(MemoryRevertStore::new()),
            pending_revert: None,
            audit: Vec::new(),
            jobs: JobRegistry::new(),
        }
    }

    /// Swap in a font resolver
    pub fn with_fonts(mut self, fonts: impl FontResolver + 'static) -> Self {
        self.fonts = Box::new(fonts);
        self
    }

    /// Swap in a revert store (e.g. a file-backed one to survive restarts)
    pub fn with_store(mut self, store: impl RevertStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Set the component catalog
    pub fn with_components(mut self, components: ComponentCatalog) -> Self {
        self.components = components;
        self
    }

    /// Set the style catalog
    pub fn with_styles(mut self, styles: StyleCatalog) -> Self {
        self.styles = styles;
        self
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit
    }

    /// Apply a batch: capture revert state first, then run every operation,
    /// isolating failures per operation, and write an audit entry
    pub fn apply_batch(&mut self, batch: OperationBatch) -> Vec<OpReport> {
        let state = revert::capture(&self.scene, &batch);
        if let Err(error) = self.store.save(&state) {
            log::warn!("failed to persist revert state: {error}");
        }

        let reports = {
            let mut dispatcher = Dispatcher::new(
                &mut self.scene,
                &self.config,
                self.fonts.as_ref(),
                &self.components,
                &self.styles,
            );
            dispatcher.apply_batch(&batch)
        };

        let entry = AuditEntry {
            timestamp: SystemTime::now(),
            intent: batch.intent.clone(),
            summary: batch.summary(),
        };
        log::info!("applied batch '{}' ({})", entry.intent, entry.summary);
        self.audit.push(entry);
        self.pending_revert = Some(state);
        reports
    }

    /// Undo the most recent batch exactly. Single-use: consuming the pending
    /// state clears it, and a second call without an intervening batch fails
    /// with [`RevertError::NothingToRevert`]. Falls back to the persisted
    /// state when the process restarted since the batch was applied.
    pub fn revert_last(&mut self) -> Result<usize, RevertError> {
        let state = match self.pending_revert.take() {
            Some(state) => state,
            None => self.store.load()?.ok_or(RevertError::NothingToRevert)?,
        };
        let restored = revert::restore(&mut self.scene, self.fonts.as_ref(), &self.config, state);
        self.store.clear()?;
        log::info!("reverted last batch ({restored} nodes restored)");
        Ok(restored)
    }

    /// Register a new edit job; the returned handle carries the job's
    /// cancellation flag
    pub fn begin_job(&mut self) -> JobHandle {
        self.jobs.begin()
    }

    /// Cancel an in-flight job by id
    pub fn cancel_job(&mut self, id: JobId) -> bool {
        self.jobs.cancel(id)
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs.active()
    }

    /// Drive one edit job end to end: snapshot the document, ask the planner
    /// for a batch, and apply it. The planner call is the suspension point;
    /// a cancellation observed after it resolves makes the continuation
    /// no-op instead of mutating the tree.
    pub fn run_job(
        &mut self,
        planner: &dyn Planner,
        intent: &str,
        handle: &JobHandle,
    ) -> Result<Vec<OpReport>, PlanError> {
        let result = self.run_job_inner(planner, intent, handle);
        self.jobs.finish(handle.id());
        result
    }

    fn run_job_inner(
        &mut self,
        planner: &dyn Planner,
        intent: &str,
        handle: &JobHandle,
    ) -> Result<Vec<OpReport>, PlanError> {
        if handle.is_cancelled() {
            return Err(PlanError::Cancelled);
        }
        let snapshot = planner::snapshot(&self.scene, self.scene.root())?;
        let batch = planner.plan(intent, &snapshot)?;
        if handle.is_cancelled() {
            return Err(PlanError::Cancelled);
        }
        Ok(self.apply_batch(batch))
    }
}

/// Render the scene tree as indented text, one node per line. Used by the
/// CLI's debug flag and by snapshot tests.
pub fn dump_tree(scene: &SceneGraph) -> String {
    fn walk(scene: &SceneGraph, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = scene.try_get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        out.push_str(&format!(
            "{}[{}] x={:.1} y={:.1} w={:.1} h={:.1}\n",
            indent, node.name, node.rect.x, node.rect.y, node.rect.width, node.rect.height
        ));
        for child in node.children() {
            walk(scene, *child, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(scene, scene.root(), 0, &mut out);
    out
}
