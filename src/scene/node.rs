//! Node types for the scene graph
//!
//! A node is one element of the visual document tree. The three variants of
//! [`NodeKind`] expose only the capabilities each element really has:
//! containers hold children and layout attributes, shapes carry a drawing
//! primitive, and text nodes carry typographic content. Text dimensions are
//! never algorithmically resized, only repositioned.

use serde::{Deserialize, Serialize};

use super::geometry::{Padding, Rect};
use super::paint::{Paint, Stroke};

/// Stable identifier of a node within a [`SceneGraph`](super::SceneGraph)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a container arranges its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    /// Free-form: children positioned by absolute `x`/`y`
    #[default]
    None,
    /// Auto-flow: children stack left-to-right
    Horizontal,
    /// Auto-flow: children stack top-to-bottom
    Vertical,
    /// Fixed 2-D arrangement; the first child acts as the reference cell
    Grid,
}

impl LayoutMode {
    /// True for the single-axis stacking modes
    pub fn is_auto_flow(&self) -> bool {
        matches!(self, LayoutMode::Horizontal | LayoutMode::Vertical)
    }
}

/// Per-axis sizing behavior of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizingMode {
    /// Explicit size is respected
    #[default]
    Fixed,
    /// Size is recomputed to exactly fit content plus padding.
    /// Only legal on auto-flow containers.
    Hug,
    /// Size matches the available space in the parent's auto-flow axis.
    /// Only legal when the parent is an auto-flow container.
    Fill,
}

/// Child alignment within an auto-flow container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

/// Drawing primitive of a shape node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapePrimitive {
    Rectangle,
    Ellipse,
    /// Freeform vector outline; treated as an icon and never rescaled
    Vector,
}

/// Typeface attributes of a text node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub family: String,
    pub style: String,
    pub size: f64,
}

/// Container-only attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerData {
    /// Ordered child list; ownership of the subtree flows through here
    pub children: Vec<NodeId>,
    pub layout: LayoutMode,
    pub padding: Padding,
    /// Gap between adjacent children in the auto-flow axis
    pub item_spacing: f64,
    /// Alignment along the auto-flow axis
    pub primary_align: Align,
    /// Alignment across the auto-flow axis
    pub counter_align: Align,
}

impl ContainerData {
    pub fn free_form() -> Self {
        Self {
            children: Vec::new(),
            layout: LayoutMode::None,
            padding: Padding::default(),
            item_spacing: 0.0,
            primary_align: Align::Start,
            counter_align: Align::Start,
        }
    }

    pub fn auto_flow(layout: LayoutMode, padding: Padding, item_spacing: f64) -> Self {
        Self {
            children: Vec::new(),
            layout,
            padding,
            item_spacing,
            primary_align: Align::Start,
            counter_align: Align::Start,
        }
    }
}

/// Text-only attributes
#[derive(Debug, Clone, PartialEq)]
pub struct TextData {
    pub content: String,
    pub font: TextStyle,
}

/// The capability-bearing variant of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Container(ContainerData),
    Shape(ShapePrimitive),
    Text(TextData),
}

/// One element of the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Position and size in the parent's coordinate space
    pub rect: Rect,
    /// Non-owning back-reference; the parent's child list owns the subtree
    pub parent: Option<NodeId>,
    pub fills: Vec<Paint>,
    pub stroke: Option<Stroke>,
    pub corner_radius: f64,
    pub opacity: f64,
    pub sizing_horizontal: SizingMode,
    pub sizing_vertical: SizingMode,
    /// Reference to a named style in the style catalog, if one is applied
    pub style_ref: Option<String>,
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: impl Into<String>, rect: Rect, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            rect,
            parent: None,
            fills: Vec::new(),
            stroke: None,
            corner_radius: 0.0,
            opacity: 1.0,
            sizing_horizontal: SizingMode::Fixed,
            sizing_vertical: SizingMode::Fixed,
            style_ref: None,
            kind,
        }
    }

    /// Child ids in order; empty for leaves
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Container(c) => &c.children,
            _ => &[],
        }
    }

    /// Layout mode; `None` for anything that is not a container
    pub fn layout_mode(&self) -> LayoutMode {
        match &self.kind {
            NodeKind::Container(c) => c.layout,
            _ => LayoutMode::None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerData> {
        match &self.kind {
            NodeKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.kind {
            NodeKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match &self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextData> {
        match &mut self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container(_))
    }

    /// Vector leaves and small leaf elements are treated as icons and are
    /// repositioned rather than rescaled
    pub fn is_icon_sized(&self, threshold: f64) -> bool {
        if matches!(self.kind, NodeKind::Shape(ShapePrimitive::Vector)) {
            return true;
        }
        self.children().is_empty()
            && self.rect.width <= threshold
            && self.rect.height <= threshold
    }

    /// An element reads as circular when it is an ellipse primitive, or a
    /// roughly-square element whose corner radius covers at least half of
    /// its shorter side
    pub fn is_circular(&self, squareness_ratio: f64) -> bool {
        if matches!(self.kind, NodeKind::Shape(ShapePrimitive::Ellipse)) {
            return true;
        }
        let w = self.rect.width;
        let h = self.rect.height;
        if w <= 0.0 || h <= 0.0 {
            return false;
        }
        let roughly_square = w.min(h) / w.max(h) >= squareness_ratio;
        roughly_square && self.corner_radius >= self.rect.min_side() / 2.0
    }
}
