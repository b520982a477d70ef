//! Error and diagnostic types for the propagation engine

use thiserror::Error;

use crate::scene::{NodeId, SceneError};

/// Errors that abort a geometry operation outright
#[derive(Debug, Error)]
pub enum EngineError {
    /// The underlying scene rejected a structural mutation
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// The target node's dimensions are not algorithmically resizable
    #[error("node '{name}' ({id}) is not resizable: {reason}")]
    NotResizable {
        id: NodeId,
        name: String,
        reason: String,
    },

    /// Structural edits need a parent to restructure around
    #[error("node {id} has no parent to restructure around")]
    DetachedTarget { id: NodeId },
}

impl EngineError {
    pub fn not_resizable(id: NodeId, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotResizable {
            id,
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Which propagation sub-step produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationStep {
    GapCapture,
    SelfScale,
    SubtreeScale,
    GridNormalize,
    TightFit,
    ContentFit,
    Propagate,
    GapRestore,
    AncestorFit,
}

impl std::fmt::Display for PropagationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::GapCapture => "gap-capture",
            Self::SelfScale => "self-scale",
            Self::SubtreeScale => "subtree-scale",
            Self::GridNormalize => "grid-normalize",
            Self::TightFit => "tight-fit",
            Self::ContentFit => "content-fit",
            Self::Propagate => "propagate",
            Self::GapRestore => "gap-restore",
            Self::AncestorFit => "ancestor-fit",
        };
        f.write_str(label)
    }
}

/// A cosmetic sub-step outcome that was skipped or adjusted rather than
/// aborting the operation
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub step: PropagationStep,
    pub node: NodeId,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.step, self.node, self.message)
    }
}

/// Result of a full propagation run
#[derive(Debug, Clone, Default)]
pub struct PropagationReport {
    /// Size the caller asked for
    pub requested: (f64, f64),
    /// Size the target ended at after tight-fit passes
    pub applied: (f64, f64),
    /// Non-fatal sub-step outcomes, in the order they occurred
    pub diagnostics: Vec<Diagnostic>,
}

impl PropagationReport {
    pub fn note(
        &mut self,
        step: PropagationStep,
        node: NodeId,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            step,
            node,
            message: message.into(),
        };
        log::debug!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}
