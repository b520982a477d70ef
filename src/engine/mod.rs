//! Geometry propagation engine
//!
//! This module owns every algorithm that keeps the scene visually consistent
//! after a mutation: proportional subtree scaling, grid-cell normalization,
//! bottom-up tight fitting, upward growth/shrink propagation, and exact
//! restoration of the free-form gaps the user laid out.
//!
//! ## Key functions
//!
//! - [`propagate_resize`]: the ten-step repair pipeline around one resize
//! - [`clone_into`] / [`delete_node`]: structural edits sharing the same
//!   upward propagation discipline
//!
//! Everything here is synchronous, single-threaded, purely tree-local
//! mutation. Sub-steps are defensive and report skipped or adjusted nodes as
//! [`Diagnostic`] entries instead of aborting; only a missing target node is
//! a hard error.

pub mod config;
pub mod error;
pub mod resize;
pub mod structural;

pub use config::{ConfigError, EngineConfig};
pub use error::{Diagnostic, EngineError, PropagationReport, PropagationStep};
pub use resize::propagate_resize;
pub use structural::{clone_into, delete_node};
