//! The external reasoning collaborator
//!
//! The planner turns a natural-language intent and a read-only snapshot of
//! the document into an operation batch. It is opaque to this crate — a
//! remote reasoning service in production, a scripted stub in tests — so it
//! is modeled as a trait the editor calls at its single suspension point.

use thiserror::Error;

use crate::ops::OperationBatch;
use crate::scene::{export, NodeId, PortableNode, SceneError, SceneGraph};

/// Depth cap applied to planner snapshots; deep subtrees are truncated and
/// flagged rather than serialized whole
pub const SNAPSHOT_DEPTH_CAP: usize = 12;

/// Errors from planning an edit
#[derive(Debug, Error)]
pub enum PlanError {
    /// The reasoning backend failed or returned something unusable
    #[error("planner failed: {0}")]
    Backend(String),

    /// The owning job was cancelled while the plan was in flight
    #[error("edit job was cancelled")]
    Cancelled,

    #[error("snapshot failed: {0}")]
    Snapshot(#[from] SceneError),
}

/// An opaque intent-to-operations reasoning service
pub trait Planner {
    /// Turn an intent plus a document snapshot into a batch of operations
    fn plan(&self, intent: &str, snapshot: &PortableNode) -> Result<OperationBatch, PlanError>;
}

/// Produce the depth-capped read-only snapshot handed to the planner
pub fn snapshot(scene: &SceneGraph, root: NodeId) -> Result<PortableNode, PlanError> {
    Ok(export(scene, root, Some(SNAPSHOT_DEPTH_CAP))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Operation;
    use crate::scene::Rect;

    struct ScriptedPlanner {
        batch: OperationBatch,
    }

    impl Planner for ScriptedPlanner {
        fn plan(&self, _intent: &str, _snapshot: &PortableNode) -> Result<OperationBatch, PlanError> {
            Ok(self.batch.clone())
        }
    }

    #[test]
    fn test_snapshot_feeds_planner() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let shape = scene
            .create_shape(
                root,
                "hero",
                Rect::new(0.0, 0.0, 200.0, 100.0),
                crate::scene::ShapePrimitive::Rectangle,
            )
            .unwrap();

        let planner = ScriptedPlanner {
            batch: OperationBatch::new(
                "grow the hero",
                vec![Operation::Resize {
                    node_id: shape,
                    width: 300.0,
                    height: 150.0,
                }],
            ),
        };

        let snapshot = snapshot(&scene, root).unwrap();
        let batch = planner.plan("grow the hero", &snapshot).unwrap();
        assert_eq!(batch.operations.len(), 1);
    }
}
