//! Portable nested-tree representation of a scene
//!
//! This is the JSON shape shared by scene files on disk, component catalog
//! templates, and the depth-capped snapshots handed to the planner. It
//! mirrors the arena tree field by field but nests children directly, so a
//! document can be serialized without exposing arena ids.

use serde::{Deserialize, Serialize};

use super::geometry::{Padding, Rect};
use super::graph::{SceneError, SceneGraph};
use super::node::{
    Align, ContainerData, LayoutMode, NodeId, NodeKind, ShapePrimitive, SizingMode, TextStyle,
};
use super::paint::{Paint, Stroke};

/// One node of the portable tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableNode {
    pub name: String,
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub sizing_horizontal: SizingMode,
    #[serde(default)]
    pub sizing_vertical: SizingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_ref: Option<String>,
    #[serde(flatten)]
    pub kind: PortableKind,
}

fn full_opacity() -> f64 {
    1.0
}

/// Kind-specific payload of a portable node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PortableKind {
    Container {
        #[serde(default)]
        layout: LayoutMode,
        #[serde(default)]
        padding: Padding,
        #[serde(default)]
        item_spacing: f64,
        #[serde(default)]
        primary_align: Align,
        #[serde(default)]
        counter_align: Align,
        #[serde(default)]
        children: Vec<PortableNode>,
        /// True when a depth cap cut this container's children off
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        truncated: bool,
    },
    Shape {
        primitive: ShapePrimitive,
    },
    Text {
        content: String,
        font: TextStyle,
    },
}

/// Export a subtree as a portable tree. `depth_cap` limits how many levels of
/// children are included; capped containers are flagged `truncated`.
pub fn export(
    scene: &SceneGraph,
    id: NodeId,
    depth_cap: Option<usize>,
) -> Result<PortableNode, SceneError> {
    let node = scene.get(id)?;
    let kind = match &node.kind {
        NodeKind::Container(data) => {
            let capped = depth_cap == Some(0);
            let children = if capped {
                Vec::new()
            } else {
                let next_cap = depth_cap.map(|d| d - 1);
                let mut out = Vec::with_capacity(data.children.len());
                for child in &data.children {
                    out.push(export(scene, *child, next_cap)?);
                }
                out
            };
            PortableKind::Container {
                layout: data.layout,
                padding: data.padding,
                item_spacing: data.item_spacing,
                primary_align: data.primary_align,
                counter_align: data.counter_align,
                truncated: capped && !data.children.is_empty(),
                children,
            }
        }
        NodeKind::Shape(primitive) => PortableKind::Shape {
            primitive: *primitive,
        },
        NodeKind::Text(text) => PortableKind::Text {
            content: text.content.clone(),
            font: text.font.clone(),
        },
    };

    Ok(PortableNode {
        name: node.name.clone(),
        rect: node.rect,
        fills: node.fills.clone(),
        stroke: node.stroke,
        corner_radius: node.corner_radius,
        opacity: node.opacity,
        sizing_horizontal: node.sizing_horizontal,
        sizing_vertical: node.sizing_vertical,
        style_ref: node.style_ref.clone(),
        kind,
    })
}

/// Build a fresh scene from a portable root. The portable root's kind is
/// expected to be a container; leaf roots get wrapped in a free-form document
/// container of the same size.
pub fn import(portable: &PortableNode) -> Result<SceneGraph, SceneError> {
    let mut scene = SceneGraph::new(portable.rect.width, portable.rect.height);
    let root = scene.root();
    if let PortableKind::Container {
        layout,
        padding,
        item_spacing,
        primary_align,
        counter_align,
        children,
        ..
    } = &portable.kind
    {
        {
            let node = scene.get_mut(root)?;
            node.name = portable.name.clone();
            node.fills = portable.fills.clone();
            node.stroke = portable.stroke;
            node.corner_radius = portable.corner_radius;
            node.opacity = portable.opacity;
            node.style_ref = portable.style_ref.clone();
            let container = node.as_container_mut().expect("root is a container");
            container.layout = *layout;
            container.padding = *padding;
            container.item_spacing = *item_spacing;
            container.primary_align = *primary_align;
            container.counter_align = *counter_align;
        }
        for child in children {
            graft(&mut scene, child, root, None)?;
        }
    } else {
        graft(&mut scene, portable, root, None)?;
    }
    Ok(scene)
}

/// Instantiate a portable subtree under `parent` at an optional index,
/// returning the new root id
pub fn graft(
    scene: &mut SceneGraph,
    portable: &PortableNode,
    parent: NodeId,
    index: Option<usize>,
) -> Result<NodeId, SceneError> {
    let id = match &portable.kind {
        PortableKind::Container {
            layout,
            padding,
            item_spacing,
            primary_align,
            counter_align,
            children,
            ..
        } => {
            let data = ContainerData {
                children: Vec::new(),
                layout: *layout,
                padding: *padding,
                item_spacing: *item_spacing,
                primary_align: *primary_align,
                counter_align: *counter_align,
            };
            let id = scene.create_container(parent, portable.name.clone(), portable.rect, data)?;
            for child in children {
                graft(scene, child, id, None)?;
            }
            id
        }
        PortableKind::Shape { primitive } => {
            scene.create_shape(parent, portable.name.clone(), portable.rect, *primitive)?
        }
        PortableKind::Text { content, font } => scene.create_text(
            parent,
            portable.name.clone(),
            portable.rect,
            content.clone(),
            font.clone(),
        )?,
    };

    {
        let node = scene.get_mut(id)?;
        node.fills = portable.fills.clone();
        node.stroke = portable.stroke;
        node.corner_radius = portable.corner_radius;
        node.opacity = portable.opacity;
        node.sizing_horizontal = portable.sizing_horizontal;
        node.sizing_vertical = portable.sizing_vertical;
        node.style_ref = portable.style_ref.clone();
    }

    if let Some(index) = index {
        scene.detach(id)?;
        scene.insert_child_at(parent, id, index)?;
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::paint::Color;

    fn sample_scene() -> SceneGraph {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let card = scene
            .create_container(
                root,
                "card",
                Rect::new(20.0, 20.0, 200.0, 120.0),
                ContainerData::auto_flow(LayoutMode::Vertical, Padding::uniform(16.0), 8.0),
            )
            .unwrap();
        let title = scene
            .create_text(
                card,
                "title",
                Rect::new(16.0, 16.0, 120.0, 20.0),
                "Card title",
                TextStyle {
                    family: "Inter".to_string(),
                    style: "Bold".to_string(),
                    size: 16.0,
                },
            )
            .unwrap();
        scene.get_mut(title).unwrap().fills = vec![Paint::solid(Color::new(0, 0, 0))];
        scene
    }

    #[test]
    fn test_export_import_round_trip() {
        let scene = sample_scene();
        let portable = export(&scene, scene.root(), None).unwrap();
        let rebuilt = import(&portable).unwrap();
        let round_tripped = export(&rebuilt, rebuilt.root(), None).unwrap();
        assert_eq!(portable, round_tripped);
    }

    #[test]
    fn test_depth_cap_flags_truncation() {
        let scene = sample_scene();
        let portable = export(&scene, scene.root(), Some(1)).unwrap();
        let PortableKind::Container { children, .. } = &portable.kind else {
            panic!("root exports as a container");
        };
        assert_eq!(children.len(), 1);
        let PortableKind::Container {
            children: grand,
            truncated,
            ..
        } = &children[0].kind
        else {
            panic!("card exports as a container");
        };
        assert!(grand.is_empty());
        assert!(*truncated);
    }

    #[test]
    fn test_json_wire_shape() {
        let scene = sample_scene();
        let portable = export(&scene, scene.root(), None).unwrap();
        let json = serde_json::to_string_pretty(&portable).unwrap();
        assert!(json.contains("\"kind\": \"container\""));
        assert!(json.contains("\"kind\": \"text\""));
        assert!(json.contains("\"layout\": \"vertical\""));

        let back: PortableNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, portable);
    }
}
