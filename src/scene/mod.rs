//! Scene graph model: the in-memory tree of nodes and their geometric,
//! layout, and paint attributes
//!
//! The model itself is deliberately constraint-unaware: structural mutation
//! keeps parent/children invariants, and [`SceneGraph::resize`] only writes
//! the rectangle. Everything that repairs geometry after a mutation lives in
//! [`crate::engine`].

pub mod geometry;
pub mod graph;
pub mod node;
pub mod paint;
pub mod portable;

pub use geometry::{Padding, Point, Rect};
pub use graph::{SceneError, SceneGraph};
pub use node::{
    Align, ContainerData, LayoutMode, Node, NodeId, NodeKind, ShapePrimitive, SizingMode,
    TextData, TextStyle,
};
pub use paint::{Color, ColorError, ImageBytes, Paint, Stroke};
pub use portable::{export, graft, import, PortableKind, PortableNode};
