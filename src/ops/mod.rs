//! Typed edit operations and their batch container
//!
//! The planner emits batches as JSON; the tagged [`Operation`] enum is the
//! wire format, one variant per supported mutation. The dispatcher in
//! [`dispatch`](crate::ops::dispatch) maps each variant to its effect.

pub mod catalog;
pub mod dispatch;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineError;
use crate::scene::{
    Align, LayoutMode, NodeId, Padding, Rect, SceneError, SizingMode,
};
use crate::scene::paint::ImageBytes;

pub use catalog::{ComponentCatalog, StyleCatalog};
pub use dispatch::Dispatcher;

/// A single structural edit, as produced by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Operation {
    /// Instantiate a named component from the component catalog
    InsertReferenceComponent {
        component_key: String,
        parent_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    /// Create an empty container under a parent
    CreateContainer {
        parent_id: NodeId,
        name: String,
        rect: Rect,
        #[serde(default)]
        layout_mode: LayoutMode,
    },
    /// Replace a text node's content, optionally switching its typeface
    SetText {
        node_id: NodeId,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_family: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_style: Option<String>,
    },
    /// Apply a named paint style from the style catalog
    ApplyNamedStyle { node_id: NodeId, style_name: String },
    Rename { node_id: NodeId, name: String },
    /// Replace the node's fills with an image paint
    SetImageFill {
        node_id: NodeId,
        image: ImageBytes,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f64>,
    },
    /// Resize with full geometry propagation
    Resize {
        node_id: NodeId,
        width: f64,
        height: f64,
    },
    /// Reposition within the parent's coordinate space
    Move { node_id: NodeId, x: f64, y: f64 },
    /// Duplicate a node, shifting siblings to make room
    Clone {
        node_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<NodeId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    /// Delete a node, closing the hole it leaves
    Delete { node_id: NodeId },
    /// Replace the node's fills with a solid hex color
    SetFillColor { node_id: NodeId, color: String },
    SetLayoutMode {
        node_id: NodeId,
        mode: LayoutMode,
    },
    SetLayoutProperties {
        node_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        padding: Option<Padding>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_spacing: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        primary_align: Option<Align>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        counter_align: Option<Align>,
    },
    SetSizingMode {
        node_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        horizontal: Option<SizingMode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vertical: Option<SizingMode>,
    },
}

impl Operation {
    /// The kebab-case tag used on the wire and in batch summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::InsertReferenceComponent { .. } => "insert-reference-component",
            Self::CreateContainer { .. } => "create-container",
            Self::SetText { .. } => "set-text",
            Self::ApplyNamedStyle { .. } => "apply-named-style",
            Self::Rename { .. } => "rename",
            Self::SetImageFill { .. } => "set-image-fill",
            Self::Resize { .. } => "resize",
            Self::Move { .. } => "move",
            Self::Clone { .. } => "clone",
            Self::Delete { .. } => "delete",
            Self::SetFillColor { .. } => "set-fill-color",
            Self::SetLayoutMode { .. } => "set-layout-mode",
            Self::SetLayoutProperties { .. } => "set-layout-properties",
            Self::SetSizingMode { .. } => "set-sizing-mode",
        }
    }

    /// The node whose state (and surroundings) this operation can touch.
    /// Insertions report the parent they insert into.
    pub fn capture_root(&self) -> NodeId {
        match self {
            Self::InsertReferenceComponent { parent_id, .. }
            | Self::CreateContainer { parent_id, .. } => *parent_id,
            Self::SetText { node_id, .. }
            | Self::ApplyNamedStyle { node_id, .. }
            | Self::Rename { node_id, .. }
            | Self::SetImageFill { node_id, .. }
            | Self::Resize { node_id, .. }
            | Self::Move { node_id, .. }
            | Self::Clone { node_id, .. }
            | Self::Delete { node_id, .. }
            | Self::SetFillColor { node_id, .. }
            | Self::SetLayoutMode { node_id, .. }
            | Self::SetLayoutProperties { node_id, .. }
            | Self::SetSizingMode { node_id, .. } => *node_id,
        }
    }
}

/// An ordered list of operations applied as one user-visible edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationBatch {
    /// The natural-language request this batch was planned from
    pub intent: String,
    pub operations: Vec<Operation>,
}

impl OperationBatch {
    pub fn new(intent: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            intent: intent.into(),
            operations,
        }
    }

    /// Operation-type counts, e.g. `resize x2, delete`
    pub fn summary(&self) -> String {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for op in &self.operations {
            let label = op.label();
            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => counts.push((label, 1)),
            }
        }
        counts
            .into_iter()
            .map(|(label, count)| {
                if count > 1 {
                    format!("{label} x{count}")
                } else {
                    label.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Errors from a single operation; each one aborts only its own operation
#[derive(Debug, Error)]
pub enum OpError {
    /// The target node id is absent from the scene
    #[error("{op}: target node {id} not found")]
    TargetNotFound { op: &'static str, id: NodeId },

    /// The node lacks the capability the operation requires
    #[error("{op}: node '{name}' ({id}) does not support this: {reason}")]
    CapabilityMismatch {
        op: &'static str,
        id: NodeId,
        name: String,
        reason: String,
    },

    /// The referenced catalog entry does not exist
    #[error("{op}: '{key}' is not in the {catalog} catalog")]
    UnknownCatalogEntry {
        op: &'static str,
        catalog: &'static str,
        key: String,
    },

    #[error("{op}: invalid color '{value}'")]
    InvalidColor { op: &'static str, value: String },

    /// The propagation engine rejected the edit
    #[error("{op}: {source}")]
    Engine {
        op: &'static str,
        #[source]
        source: EngineError,
    },

    /// The scene graph rejected a structural mutation
    #[error("{op}: {source}")]
    Scene {
        op: &'static str,
        #[source]
        source: SceneError,
    },
}

impl OpError {
    pub fn capability(
        op: &'static str,
        id: NodeId,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::CapabilityMismatch {
            op,
            id,
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of one operation within a batch
#[derive(Debug)]
pub struct OpReport {
    pub index: usize,
    pub label: &'static str,
    pub target: NodeId,
    /// Success message or the typed error; failures never abort the batch
    pub outcome: Result<String, OpError>,
}

impl OpReport {
    /// One human-readable status line for the batch summary
    pub fn status_line(&self) -> String {
        match &self.outcome {
            Ok(message) => format!("ok     {} {}: {message}", self.label, self.target),
            Err(error) => format!("failed {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_wire_format() {
        let json = r#"{
            "op": "resize",
            "node_id": 12,
            "width": 390.0,
            "height": 844.0
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(
            op,
            Operation::Resize {
                node_id: NodeId(12),
                width: 390.0,
                height: 844.0
            }
        );
        assert_eq!(op.label(), "resize");
    }

    #[test]
    fn test_batch_wire_format() {
        let json = r##"{
            "intent": "make the hero taller",
            "operations": [
                { "op": "resize", "node_id": 3, "width": 400.0, "height": 320.0 },
                { "op": "set-fill-color", "node_id": 4, "color": "#2196f3" },
                { "op": "delete", "node_id": 9 }
            ]
        }"##;
        let batch: OperationBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.operations.len(), 3);
        assert_eq!(batch.operations[2].capture_root(), NodeId(9));
    }

    #[test]
    fn test_batch_summary_counts() {
        let batch = OperationBatch::new(
            "test",
            vec![
                Operation::Delete { node_id: NodeId(1) },
                Operation::Resize {
                    node_id: NodeId(2),
                    width: 1.0,
                    height: 1.0,
                },
                Operation::Delete { node_id: NodeId(3) },
            ],
        );
        assert_eq!(batch.summary(), "delete x2, resize");
    }

    #[test]
    fn test_set_sizing_round_trip() {
        let op = Operation::SetSizingMode {
            node_id: NodeId(5),
            horizontal: Some(SizingMode::Fill),
            vertical: None,
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"set-sizing-mode\""));
        assert!(json.contains("\"fill\""));
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
