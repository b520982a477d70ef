//! Revert subsystem
//!
//! Before a batch mutates anything, `capture` records the property set of
//! every node the batch could touch: each operation target with all of its
//! descendants, plus every ancestor and all of each ancestor's siblings
//! (propagation can shift those). `restore` replays the captured properties
//! exactly; it is single-use, and the latest state is persisted through a
//! [`RevertStore`] under one fixed key so it survives a process restart.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineConfig;
use crate::fonts::{ensure_font, FontResolver};
use crate::ops::OperationBatch;
use crate::scene::{
    Align, LayoutMode, NodeId, Padding, Paint, Rect, SceneGraph, SizingMode, TextStyle,
};

/// Fixed key under which the last revertible state is persisted
pub const REVERT_STORE_KEY: &str = "agent-canvas.last-batch";

/// Errors from the revert flow
#[derive(Debug, Error)]
pub enum RevertError {
    /// No pending state; user-facing and non-fatal
    #[error("nothing to revert")]
    NothingToRevert,

    #[error("revert store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from reading or writing the persistence store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt revert state: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Captured text payload of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    pub content: String,
    pub font: TextStyle,
}

/// Captured layout attributes of a container; the engine scales padding and
/// item spacing during propagation, so these must round-trip too
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub layout: LayoutMode,
    pub padding: Padding,
    pub item_spacing: f64,
    pub primary_align: Align,
    pub counter_align: Align,
}

/// The serialized property set captured per node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub rect: Rect,
    pub fills: Vec<Paint>,
    pub corner_radius: f64,
    pub sizing_horizontal: SizingMode,
    pub sizing_vertical: SizingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerRecord>,
}

/// Everything needed to exactly restore the pre-batch state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevertState {
    pub batch: OperationBatch,
    pub previous: BTreeMap<NodeId, NodeRecord>,
}

fn record(scene: &SceneGraph, id: NodeId, out: &mut BTreeMap<NodeId, NodeRecord>) {
    if out.contains_key(&id) {
        return;
    }
    let Some(node) = scene.try_get(id) else {
        return;
    };
    out.insert(
        id,
        NodeRecord {
            name: node.name.clone(),
            rect: node.rect,
            fills: node.fills.clone(),
            corner_radius: node.corner_radius,
            sizing_horizontal: node.sizing_horizontal,
            sizing_vertical: node.sizing_vertical,
            style_ref: node.style_ref.clone(),
            text: node.as_text().map(|t| TextRecord {
                content: t.content.clone(),
                font: t.font.clone(),
            }),
            container: node.as_container().map(|c| ContainerRecord {
                layout: c.layout,
                padding: c.padding,
                item_spacing: c.item_spacing,
                primary_align: c.primary_align,
                counter_align: c.counter_align,
            }),
        },
    );
}

/// Capture the pre-batch state of every node the batch could change,
/// directly or through propagation
pub fn capture(scene: &SceneGraph, batch: &OperationBatch) -> RevertState {
    let mut previous = BTreeMap::new();
    for op in &batch.operations {
        let target = op.capture_root();
        if !scene.contains(target) {
            continue;
        }
        // The target and everything under it: later fine-tuning passes may
        // touch any descendant.
        for id in scene.preorder(target) {
            record(scene, id, &mut previous);
        }
        // Every ancestor and all of each ancestor's siblings: propagation
        // can shift and refit those.
        for ancestor in scene.ancestors(target) {
            record(scene, ancestor, &mut previous);
            for sibling in scene.siblings(ancestor) {
                record(scene, sibling, &mut previous);
            }
        }
        // Siblings of the target itself move when it grows or shrinks.
        for sibling in scene.siblings(target) {
            record(scene, sibling, &mut previous);
        }
    }
    RevertState {
        batch: batch.clone(),
        previous,
    }
}

/// Replay a captured state onto the scene.
///
/// Order matters per node: name and text first (reloading the captured
/// typeface), then style and fills, then sizing modes *before* geometry so a
/// conflicting mode cannot reject the rect write, then the rect itself via
/// an unconstrained resize, then corner radius. Nodes created by the batch
/// are not in the capture and are left alone.
pub fn restore(
    scene: &mut SceneGraph,
    fonts: &dyn FontResolver,
    config: &EngineConfig,
    state: RevertState,
) -> usize {
    let mut restored = 0;
    for (id, saved) in state.previous {
        let Ok(node) = scene.get_mut(id) else {
            log::debug!("revert: node {id} no longer exists, skipping");
            continue;
        };
        node.name = saved.name;
        if let Some(text) = saved.text {
            let (family, style) =
                ensure_font(fonts, config, &text.font.family, &text.font.style);
            if let Some(data) = node.as_text_mut() {
                data.content = text.content;
                data.font = TextStyle {
                    family,
                    style,
                    size: text.font.size,
                };
            }
        }
        node.style_ref = saved.style_ref;
        node.fills = saved.fills;
        if let (Some(container), Some(record)) = (node.as_container_mut(), saved.container) {
            container.layout = record.layout;
            container.padding = record.padding;
            container.item_spacing = record.item_spacing;
            container.primary_align = record.primary_align;
            container.counter_align = record.counter_align;
        }
        node.sizing_horizontal = saved.sizing_horizontal;
        node.sizing_vertical = saved.sizing_vertical;
        node.rect = saved.rect;
        node.corner_radius = saved.corner_radius;
        restored += 1;
    }
    restored
}

/// Persistence for the last revertible state, keyed by
/// [`REVERT_STORE_KEY`]. Last batch only; there is no history stack.
pub trait RevertStore {
    fn save(&mut self, state: &RevertState) -> Result<(), StoreError>;
    fn load(&self) -> Result<Option<RevertState>, StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Volatile store for tests and embedded use
#[derive(Debug, Default)]
pub struct MemoryRevertStore {
    entries: BTreeMap<String, String>,
}

impl MemoryRevertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevertStore for MemoryRevertStore {
    fn save(&mut self, state: &RevertState) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(state)?;
        self.entries.insert(REVERT_STORE_KEY.to_string(), encoded);
        Ok(())
    }

    fn load(&self) -> Result<Option<RevertState>, StoreError> {
        match self.entries.get(REVERT_STORE_KEY) {
            Some(encoded) => Ok(Some(serde_json::from_str(encoded)?)),
            None => Ok(None),
        }
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.remove(REVERT_STORE_KEY);
        Ok(())
    }
}

/// JSON-file-backed store so revert state survives process restarts
#[derive(Debug, Clone)]
pub struct JsonFileRevertStore {
    path: PathBuf,
}

impl JsonFileRevertStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RevertStore for JsonFileRevertStore {
    fn save(&mut self, state: &RevertState) -> Result<(), StoreError> {
        let entries: BTreeMap<&str, &RevertState> =
            BTreeMap::from([(REVERT_STORE_KEY, state)]);
        let encoded = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, encoded)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<RevertState>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let mut entries: BTreeMap<String, RevertState> = serde_json::from_str(&content)?;
        Ok(entries.remove(REVERT_STORE_KEY))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
