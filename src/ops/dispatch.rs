//! Operation dispatch
//!
//! Maps each typed operation to its effect on the scene. Every handler
//! validates that the target exists and supports the required capability,
//! and returns a typed error naming the operation and node when it does not.
//! `apply_batch` catches each operation's error independently, so a batch of
//! N operations yields up to N independent outcomes without aborting.

use crate::engine::resize::{ancestor_fit_sweep, reflow};
use crate::engine::{clone_into, delete_node, propagate_resize, EngineConfig, PropagationReport};
use crate::fonts::{ensure_font, FontResolver};
use crate::scene::{
    graft, Color, ContainerData, LayoutMode, NodeId, Paint, SceneError, SceneGraph, SizingMode,
};

use super::catalog::{ComponentCatalog, StyleCatalog};
use super::{OpError, OpReport, Operation, OperationBatch};

/// Applies operations to a scene using the injected collaborators
pub struct Dispatcher<'a> {
    scene: &'a mut SceneGraph,
    config: &'a EngineConfig,
    fonts: &'a dyn FontResolver,
    components: &'a ComponentCatalog,
    styles: &'a StyleCatalog,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        scene: &'a mut SceneGraph,
        config: &'a EngineConfig,
        fonts: &'a dyn FontResolver,
        components: &'a ComponentCatalog,
        styles: &'a StyleCatalog,
    ) -> Self {
        Self {
            scene,
            config,
            fonts,
            components,
            styles,
        }
    }

    /// Apply every operation in order, isolating failures per operation
    pub fn apply_batch(&mut self, batch: &OperationBatch) -> Vec<OpReport> {
        batch
            .operations
            .iter()
            .enumerate()
            .map(|(index, op)| {
                let outcome = self.apply(op);
                if let Err(error) = &outcome {
                    log::warn!("operation {index} ({}) failed: {error}", op.label());
                }
                OpReport {
                    index,
                    label: op.label(),
                    target: op.capture_root(),
                    outcome,
                }
            })
            .collect()
    }

    /// Apply a single operation
    pub fn apply(&mut self, op: &Operation) -> Result<String, OpError> {
        match op {
            Operation::InsertReferenceComponent {
                component_key,
                parent_id,
                index,
            } => self.insert_reference_component(component_key, *parent_id, *index),
            Operation::CreateContainer {
                parent_id,
                name,
                rect,
                layout_mode,
            } => self.create_container(*parent_id, name, *rect, *layout_mode),
            Operation::SetText {
                node_id,
                content,
                font_family,
                font_style,
            } => self.set_text(*node_id, content, font_family.as_deref(), font_style.as_deref()),
            Operation::ApplyNamedStyle {
                node_id,
                style_name,
            } => self.apply_named_style(*node_id, style_name),
            Operation::Rename { node_id, name } => self.rename(*node_id, name),
            Operation::SetImageFill {
                node_id,
                image,
                opacity,
            } => self.set_image_fill(*node_id, image.0.clone(), opacity.unwrap_or(1.0)),
            Operation::Resize {
                node_id,
                width,
                height,
            } => self.resize(*node_id, *width, *height),
            Operation::Move { node_id, x, y } => self.move_node(*node_id, *x, *y),
            Operation::Clone {
                node_id,
                parent_id,
                index,
            } => self.clone_node(*node_id, *parent_id, *index),
            Operation::Delete { node_id } => self.delete(*node_id),
            Operation::SetFillColor { node_id, color } => self.set_fill_color(*node_id, color),
            Operation::SetLayoutMode { node_id, mode } => self.set_layout_mode(*node_id, *mode),
            Operation::SetLayoutProperties {
                node_id,
                padding,
                item_spacing,
                primary_align,
                counter_align,
            } => self.set_layout_properties(
                *node_id,
                *padding,
                *item_spacing,
                *primary_align,
                *counter_align,
            ),
            Operation::SetSizingMode {
                node_id,
                horizontal,
                vertical,
            } => self.set_sizing_mode(*node_id, *horizontal, *vertical),
        }
    }

    fn exists(&self, op: &'static str, id: NodeId) -> Result<(), OpError> {
        if self.scene.contains(id) {
            Ok(())
        } else {
            Err(OpError::TargetNotFound { op, id })
        }
    }

    fn node_name(&self, id: NodeId) -> String {
        self.scene
            .try_get(id)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    }

    fn scene_err(op: &'static str) -> impl Fn(SceneError) -> OpError {
        move |source| OpError::Scene { op, source }
    }

    fn insert_reference_component(
        &mut self,
        key: &str,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<String, OpError> {
        const OP: &str = "insert-reference-component";
        self.exists(OP, parent)?;
        let template = self
            .components
            .resolve(key)
            .ok_or(OpError::UnknownCatalogEntry {
                op: OP,
                catalog: "component",
                key: key.to_string(),
            })?
            .clone();
        let id = graft(self.scene, &template, parent, index).map_err(Self::scene_err(OP))?;
        reflow(self.scene, parent);
        let mut report = PropagationReport::default();
        ancestor_fit_sweep(self.scene, id, &mut report);
        Ok(format!("instantiated '{key}' as {id}"))
    }

    fn create_container(
        &mut self,
        parent: NodeId,
        name: &str,
        rect: crate::scene::Rect,
        layout_mode: LayoutMode,
    ) -> Result<String, OpError> {
        const OP: &str = "create-container";
        self.exists(OP, parent)?;
        let mut data = ContainerData::free_form();
        data.layout = layout_mode;
        let id = self
            .scene
            .create_container(parent, name, rect, data)
            .map_err(Self::scene_err(OP))?;
        let mut report = PropagationReport::default();
        ancestor_fit_sweep(self.scene, id, &mut report);
        Ok(format!("created container '{name}' as {id}"))
    }

    fn set_text(
        &mut self,
        id: NodeId,
        content: &str,
        family: Option<&str>,
        style: Option<&str>,
    ) -> Result<String, OpError> {
        const OP: &str = "set-text";
        self.exists(OP, id)?;
        let node = self.scene.get(id).map_err(Self::scene_err(OP))?;
        let Some(text) = node.as_text() else {
            return Err(OpError::capability(
                OP,
                id,
                node.name.clone(),
                "only text nodes carry content",
            ));
        };

        // The typeface must load before the content can change; an
        // unavailable face degrades to the default rather than aborting.
        let requested_family = family.unwrap_or(&text.font.family).to_string();
        let requested_style = style.unwrap_or(&text.font.style).to_string();
        let (family, style) =
            ensure_font(self.fonts, self.config, &requested_family, &requested_style);
        let degraded = family != requested_family || style != requested_style;

        let node = self.scene.get_mut(id).map_err(Self::scene_err(OP))?;
        let text = node.as_text_mut().expect("checked above");
        text.content = content.to_string();
        text.font.family = family.clone();
        text.font.style = style.clone();

        if degraded {
            Ok(format!(
                "set text with fallback face {family} {style} (requested {requested_family} {requested_style})"
            ))
        } else {
            Ok(format!("set text in {family} {style}"))
        }
    }

    fn apply_named_style(&mut self, id: NodeId, style_name: &str) -> Result<String, OpError> {
        const OP: &str = "apply-named-style";
        self.exists(OP, id)?;
        let paint = self
            .styles
            .resolve(style_name)
            .ok_or(OpError::UnknownCatalogEntry {
                op: OP,
                catalog: "style",
                key: style_name.to_string(),
            })?
            .clone();
        let node = self.scene.get_mut(id).map_err(Self::scene_err(OP))?;
        node.style_ref = Some(style_name.to_string());
        node.fills = vec![paint];
        Ok(format!("applied style '{style_name}'"))
    }

    fn rename(&mut self, id: NodeId, name: &str) -> Result<String, OpError> {
        const OP: &str = "rename";
        self.exists(OP, id)?;
        let node = self.scene.get_mut(id).map_err(Self::scene_err(OP))?;
        let previous = std::mem::replace(&mut node.name, name.to_string());
        Ok(format!("renamed '{previous}' to '{name}'"))
    }

    fn set_image_fill(
        &mut self,
        id: NodeId,
        bytes: Vec<u8>,
        opacity: f64,
    ) -> Result<String, OpError> {
        const OP: &str = "set-image-fill";
        self.exists(OP, id)?;
        let size = bytes.len();
        let node = self.scene.get_mut(id).map_err(Self::scene_err(OP))?;
        node.fills = vec![Paint::Image {
            bytes: crate::scene::ImageBytes(bytes),
            opacity,
        }];
        Ok(format!("set image fill ({size} bytes)"))
    }

    fn resize(&mut self, id: NodeId, width: f64, height: f64) -> Result<String, OpError> {
        const OP: &str = "resize";
        self.exists(OP, id)?;
        let node = self.scene.get(id).map_err(Self::scene_err(OP))?;
        if node.is_text() {
            return Err(OpError::capability(
                OP,
                id,
                node.name.clone(),
                "text dimensions are typographic, not geometric",
            ));
        }
        let report = propagate_resize(self.scene, self.config, id, width, height)
            .map_err(|source| OpError::Engine { op: OP, source })?;
        let (w, h) = report.applied;
        Ok(format!(
            "resized to {w:.0}x{h:.0} ({} diagnostics)",
            report.diagnostics.len()
        ))
    }

    fn move_node(&mut self, id: NodeId, x: f64, y: f64) -> Result<String, OpError> {
        const OP: &str = "move";
        self.exists(OP, id)?;
        if id == self.scene.root() {
            return Err(OpError::capability(
                OP,
                id,
                self.node_name(id),
                "the document root is immovable",
            ));
        }
        self.scene
            .set_position(id, x, y)
            .map_err(Self::scene_err(OP))?;
        let mut report = PropagationReport::default();
        ancestor_fit_sweep(self.scene, id, &mut report);
        Ok(format!("moved to ({x:.0}, {y:.0})"))
    }

    fn clone_node(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        index: Option<usize>,
    ) -> Result<String, OpError> {
        const OP: &str = "clone";
        self.exists(OP, id)?;
        if id == self.scene.root() {
            return Err(OpError::capability(
                OP,
                id,
                self.node_name(id),
                "the document root cannot be cloned",
            ));
        }
        let (copy, _report) = clone_into(self.scene, self.config, id, parent, index)
            .map_err(|source| OpError::Engine { op: OP, source })?;
        Ok(format!("cloned as {copy}"))
    }

    fn delete(&mut self, id: NodeId) -> Result<String, OpError> {
        const OP: &str = "delete";
        self.exists(OP, id)?;
        if id == self.scene.root() {
            return Err(OpError::capability(
                OP,
                id,
                self.node_name(id),
                "the document root cannot be deleted",
            ));
        }
        let name = self.node_name(id);
        delete_node(self.scene, self.config, id)
            .map_err(|source| OpError::Engine { op: OP, source })?;
        Ok(format!("deleted '{name}'"))
    }

    fn set_fill_color(&mut self, id: NodeId, color: &str) -> Result<String, OpError> {
        const OP: &str = "set-fill-color";
        self.exists(OP, id)?;
        let parsed = Color::from_hex(color).map_err(|_| OpError::InvalidColor {
            op: OP,
            value: color.to_string(),
        })?;
        let node = self.scene.get_mut(id).map_err(Self::scene_err(OP))?;
        node.style_ref = None;
        node.fills = vec![Paint::solid(parsed)];
        Ok(format!("filled with {}", parsed.to_hex()))
    }

    fn set_layout_mode(&mut self, id: NodeId, mode: LayoutMode) -> Result<String, OpError> {
        const OP: &str = "set-layout-mode";
        self.exists(OP, id)?;
        let node = self.scene.get_mut(id).map_err(Self::scene_err(OP))?;
        let name = node.name.clone();
        let Some(container) = node.as_container_mut() else {
            return Err(OpError::capability(
                OP,
                id,
                name,
                "only containers have a layout mode",
            ));
        };
        container.layout = mode;
        if mode.is_auto_flow() {
            reflow(self.scene, id);
        }
        Ok(format!("layout mode set to {mode:?}"))
    }

    fn set_layout_properties(
        &mut self,
        id: NodeId,
        padding: Option<crate::scene::Padding>,
        item_spacing: Option<f64>,
        primary_align: Option<crate::scene::Align>,
        counter_align: Option<crate::scene::Align>,
    ) -> Result<String, OpError> {
        const OP: &str = "set-layout-properties";
        self.exists(OP, id)?;
        let node = self.scene.get_mut(id).map_err(Self::scene_err(OP))?;
        let name = node.name.clone();
        let Some(container) = node.as_container_mut() else {
            return Err(OpError::capability(
                OP,
                id,
                name,
                "only containers have layout properties",
            ));
        };
        if let Some(padding) = padding {
            container.padding = padding;
        }
        if let Some(spacing) = item_spacing {
            container.item_spacing = spacing;
        }
        if let Some(align) = primary_align {
            container.primary_align = align;
        }
        if let Some(align) = counter_align {
            container.counter_align = align;
        }
        let auto_flow = container.layout.is_auto_flow();
        if auto_flow {
            reflow(self.scene, id);
        }
        Ok("layout properties updated".to_string())
    }

    fn set_sizing_mode(
        &mut self,
        id: NodeId,
        horizontal: Option<SizingMode>,
        vertical: Option<SizingMode>,
    ) -> Result<String, OpError> {
        const OP: &str = "set-sizing-mode";
        self.exists(OP, id)?;
        let node = self.scene.get(id).map_err(Self::scene_err(OP))?;
        if node.is_text() {
            return Err(OpError::capability(
                OP,
                id,
                node.name.clone(),
                "text sizing is typographic, not per-axis",
            ));
        }
        let is_auto_flow_container = node.layout_mode().is_auto_flow();
        let parent_auto_flow = node
            .parent
            .and_then(|p| self.scene.try_get(p))
            .map(|p| p.layout_mode().is_auto_flow())
            .unwrap_or(false);

        // Hug needs an auto-flow container; Fill needs an auto-flow parent.
        // An illegal request falls back to Fixed instead of corrupting the
        // stored mode.
        let mut notes = Vec::new();
        let mut validate = |axis: &str, requested: SizingMode| -> SizingMode {
            match requested {
                SizingMode::Hug if !is_auto_flow_container => {
                    notes.push(format!("{axis} hug needs an auto-flow container, kept fixed"));
                    SizingMode::Fixed
                }
                SizingMode::Fill if !parent_auto_flow => {
                    notes.push(format!("{axis} fill needs an auto-flow parent, kept fixed"));
                    SizingMode::Fixed
                }
                other => other,
            }
        };
        let horizontal = horizontal.map(|mode| validate("horizontal", mode));
        let vertical = vertical.map(|mode| validate("vertical", mode));

        let node = self.scene.get_mut(id).map_err(Self::scene_err(OP))?;
        if let Some(mode) = horizontal {
            node.sizing_horizontal = mode;
        }
        if let Some(mode) = vertical {
            node.sizing_vertical = mode;
        }

        if notes.is_empty() {
            Ok("sizing mode updated".to_string())
        } else {
            Ok(format!("sizing mode updated ({})", notes.join("; ")))
        }
    }
}
