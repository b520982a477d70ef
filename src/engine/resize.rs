//! Resize propagation
//!
//! The central algorithm of the crate. Resizing one node to a new size kicks
//! off a fixed sequence of repair passes over the tree:
//!
//! 1. Capture the vertical gaps between the node and its lower siblings up
//!    the free-form ancestor chain (ground truth for user-intended spacing).
//! 2. Proportionally scale the node's own radius, padding, and gap.
//! 3. Recursively scale the subtree, with exceptions for text, icons, and
//!    circular elements.
//! 4. Normalize grid cells against their reference cell.
//! 5. Tight-fit auto-flow containers bottom-up to remove slack.
//! 6. Tight-fit the resized node itself against real content growth.
//! 7. Measure the delta that actually survived the fitting passes.
//! 8. Propagate that delta up the ancestor chain, shifting free-form
//!    siblings and growing auto-flow ancestors.
//! 9. Restore the captured gaps exactly; the capture is authoritative over
//!    whatever the propagation math produced.
//! 10. A final sweep growing any ancestor that still clips its children.
//!
//! Every pass is defensive: nodes without the required capability are
//! skipped with a diagnostic, never a panic or an error. Only a missing
//! target node aborts the operation.

use crate::scene::{LayoutMode, NodeId, Point, SceneGraph, SizingMode};

use super::config::EngineConfig;
use super::error::{EngineError, PropagationReport, PropagationStep};

const EPSILON: f64 = 1e-6;

/// Resize `target` to `(new_w, new_h)` and repair the surrounding geometry
pub fn propagate_resize(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    target: NodeId,
    new_w: f64,
    new_h: f64,
) -> Result<PropagationReport, EngineError> {
    let node = scene.get(target)?;
    if node.is_text() {
        return Err(EngineError::not_resizable(
            target,
            node.name.clone(),
            "text dimensions are typographic, not geometric",
        ));
    }

    let old = node.rect;
    let mut report = PropagationReport {
        requested: (new_w, new_h),
        applied: (new_w, new_h),
        diagnostics: Vec::new(),
    };

    let sx = if old.width > EPSILON {
        new_w / old.width
    } else {
        report.note(
            PropagationStep::SelfScale,
            target,
            "zero-width source, horizontal scale skipped",
        );
        1.0
    };
    let sy = if old.height > EPSILON {
        new_h / old.height
    } else {
        report.note(
            PropagationStep::SelfScale,
            target,
            "zero-height source, vertical scale skipped",
        );
        1.0
    };

    // Step 1: gaps up the free-form ancestor chain, captured before anything
    // moves.
    let gaps = capture_free_form_gaps(scene, target);

    // Needed later by the content tight-fit (step 6).
    let pre_required_main = required_auto_flow_size(scene, target).map(|(main, _)| main);

    // Step 2: proportional self-scale.
    {
        let node = scene.get_mut(target)?;
        node.corner_radius *= sx.max(sy);
        if let Some(container) = node.as_container_mut() {
            if container.layout.is_auto_flow() {
                container.padding = container.padding.scaled(sx, sy);
                container.item_spacing *= match container.layout {
                    LayoutMode::Horizontal => sx,
                    _ => sy,
                };
            }
        }
    }
    scene.resize(target, new_w, new_h)?;

    // Step 3: recursive subtree scale.
    scale_children(scene, config, target, (old.width, old.height), sx, sy, &mut report);
    reflow(scene, target);

    // Step 4: grid cell normalization anywhere in the subtree.
    normalize_grids(scene, config, target, &mut report);

    // Step 5: bottom-up tight fit over the subtree.
    tight_fit_subtree(scene, config, target, &mut report);

    // Step 6: tight-fit the resized node against its real content growth.
    if let (Some(pre), Some((post, _))) =
        (pre_required_main, required_auto_flow_size(scene, target))
    {
        let layout = scene.get(target)?.layout_mode();
        let content_delta = (post - pre).max(0.0);
        let old_main = main_len(layout, old.width, old.height);
        let rect = scene.get(target)?.rect;
        let current_main = main_len(layout, rect.width, rect.height);
        let cap = old_main + content_delta;
        if current_main > cap + EPSILON {
            let (w, h) = with_main_len(layout, rect.width, rect.height, cap);
            scene.resize(target, w, h)?;
            report.note(
                PropagationStep::ContentFit,
                target,
                format!("shrunk main axis to content growth ({current_main:.1} -> {cap:.1})"),
            );
            reflow(scene, target);
        }
    }

    // Step 7: measure what actually survived the fitting passes.
    let final_rect = scene.get(target)?.rect;
    let dw = final_rect.width - old.width;
    let dh = final_rect.height - old.height;
    report.applied = (final_rect.width, final_rect.height);

    // Step 8: push the measured delta up the ancestor chain.
    propagate_ancestor_delta(scene, config, target, dw, dh, &mut report);

    // Step 9: captured gaps win over the propagation math.
    restore_free_form_gaps(scene, config, &gaps, &mut report);

    // Step 10: safety net against drift from the earlier passes.
    ancestor_fit_sweep(scene, target, &mut report);

    Ok(report)
}

// ============================================================================
// Gap capture / restore
// ============================================================================

/// Recorded spacing below one node inside one free-form ancestor
#[derive(Debug, Clone)]
pub(crate) struct GapRecord {
    pub anchor: NodeId,
    /// Lower siblings in vertical order, each with its gap to the previous
    /// element in the stack (the anchor for the first entry)
    pub below: Vec<(NodeId, f64)>,
}

/// Walk up through the chain of free-form ancestors, recording the vertical
/// gap between the node (or its ancestor-in-chain) and every sibling below it
pub(crate) fn capture_free_form_gaps(scene: &SceneGraph, start: NodeId) -> Vec<GapRecord> {
    let mut records = Vec::new();
    let mut child = start;
    while let Some(parent) = scene.parent_of(child) {
        let Some(parent_node) = scene.try_get(parent) else {
            break;
        };
        if parent_node.layout_mode() != LayoutMode::None {
            break;
        }
        let Some(anchor_rect) = scene.try_get(child).map(|n| n.rect) else {
            break;
        };
        let mut below = Vec::new();
        let mut prev_bottom = anchor_rect.bottom();
        for sibling in scene.siblings_below(child) {
            if let Some(rect) = scene.try_get(sibling).map(|n| n.rect) {
                below.push((sibling, rect.y - prev_bottom));
                prev_bottom = rect.bottom();
            }
        }
        records.push(GapRecord {
            anchor: child,
            below,
        });
        child = parent;
    }
    records
}

/// Reposition recorded siblings so each sits exactly the captured gap below
/// its predecessor
pub(crate) fn restore_free_form_gaps(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    records: &[GapRecord],
    report: &mut PropagationReport,
) {
    for record in records {
        let Some(anchor) = scene.try_get(record.anchor) else {
            continue;
        };
        let mut prev_bottom = anchor.rect.bottom();
        for (sibling, gap) in &record.below {
            let Some(rect) = scene.try_get(*sibling).map(|n| n.rect) else {
                continue;
            };
            let expected_y = prev_bottom + gap;
            if (expected_y - rect.y).abs() > config.gap_tolerance {
                let _ = scene.set_position(*sibling, rect.x, expected_y);
                report.note(
                    PropagationStep::GapRestore,
                    *sibling,
                    format!("restored gap ({:.1} -> {:.1})", rect.y, expected_y),
                );
            } else if (expected_y - rect.y).abs() > EPSILON {
                let _ = scene.set_position(*sibling, rect.x, expected_y);
            }
            prev_bottom = expected_y + rect.height;
        }
    }
}

// ============================================================================
// Measurement and reflow
// ============================================================================

fn main_len(layout: LayoutMode, width: f64, height: f64) -> f64 {
    match layout {
        LayoutMode::Horizontal => width,
        _ => height,
    }
}

fn with_main_len(layout: LayoutMode, width: f64, height: f64, main: f64) -> (f64, f64) {
    match layout {
        LayoutMode::Horizontal => (main, height),
        _ => (width, main),
    }
}

/// Minimum `(main, cross)` size that exactly contains an auto-flow
/// container's children plus padding and inter-child gaps. `None` for
/// anything that is not an auto-flow container.
pub(crate) fn required_auto_flow_size(scene: &SceneGraph, id: NodeId) -> Option<(f64, f64)> {
    let node = scene.try_get(id)?;
    let container = node.as_container()?;
    if !container.layout.is_auto_flow() {
        return None;
    }

    let mut main_sum = 0.0;
    let mut cross_max: f64 = 0.0;
    let mut count = 0usize;
    for child in container.children.iter() {
        let Some(rect) = scene.try_get(*child).map(|n| n.rect) else {
            continue;
        };
        match container.layout {
            LayoutMode::Horizontal => {
                main_sum += rect.width;
                cross_max = cross_max.max(rect.height);
            }
            _ => {
                main_sum += rect.height;
                cross_max = cross_max.max(rect.width);
            }
        }
        count += 1;
    }

    let gaps = container.item_spacing * count.saturating_sub(1) as f64;
    let (pad_main, pad_cross) = match container.layout {
        LayoutMode::Horizontal => (container.padding.horizontal(), container.padding.vertical()),
        _ => (container.padding.vertical(), container.padding.horizontal()),
    };
    Some((main_sum + gaps + pad_main, cross_max + pad_cross))
}

/// Restack an auto-flow container's children along its axis. This is the
/// deterministic placement the host layout system would perform; free-form
/// and grid containers are left untouched.
pub(crate) fn reflow(scene: &mut SceneGraph, id: NodeId) {
    let Some(node) = scene.try_get(id) else {
        return;
    };
    let Some(container) = node.as_container() else {
        return;
    };
    if !container.layout.is_auto_flow() {
        return;
    }

    let layout = container.layout;
    let padding = container.padding;
    let spacing = container.item_spacing;
    let primary = container.primary_align;
    let counter = container.counter_align;
    let rect = node.rect;
    let children: Vec<NodeId> = container.children.clone();

    let mut content_main = 0.0;
    for child in &children {
        if let Some(r) = scene.try_get(*child).map(|n| n.rect) {
            content_main += main_len(layout, r.width, r.height);
        }
    }
    if !children.is_empty() {
        content_main += spacing * (children.len() - 1) as f64;
    }

    let (avail_main, avail_cross, main_start, cross_start) = match layout {
        LayoutMode::Horizontal => (
            rect.width - padding.horizontal(),
            rect.height - padding.vertical(),
            padding.left,
            padding.top,
        ),
        _ => (
            rect.height - padding.vertical(),
            rect.width - padding.horizontal(),
            padding.top,
            padding.left,
        ),
    };

    let mut cursor = main_start
        + match primary {
            crate::scene::Align::Start => 0.0,
            crate::scene::Align::Center => ((avail_main - content_main) / 2.0).max(0.0),
            crate::scene::Align::End => (avail_main - content_main).max(0.0),
        };

    for child in children {
        let Some(r) = scene.try_get(child).map(|n| n.rect) else {
            continue;
        };
        let (child_main, child_cross) = match layout {
            LayoutMode::Horizontal => (r.width, r.height),
            _ => (r.height, r.width),
        };
        let cross = cross_start
            + match counter {
                crate::scene::Align::Start => 0.0,
                crate::scene::Align::Center => ((avail_cross - child_cross) / 2.0).max(0.0),
                crate::scene::Align::End => (avail_cross - child_cross).max(0.0),
            };
        let (x, y) = match layout {
            LayoutMode::Horizontal => (cursor, cross),
            _ => (cross, cursor),
        };
        let _ = scene.set_position(child, x, y);
        cursor += child_main + spacing;
    }
}

// ============================================================================
// Subtree scaling
// ============================================================================

/// Depth-first proportional scale of a container's children
pub(crate) fn scale_children(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    parent: NodeId,
    parent_old_size: (f64, f64),
    sx: f64,
    sy: f64,
    report: &mut PropagationReport,
) {
    let Some(parent_node) = scene.try_get(parent) else {
        return;
    };
    let parent_layout = parent_node.layout_mode();
    let parent_new_size = (parent_node.rect.width, parent_node.rect.height);
    let children: Vec<NodeId> = parent_node.children().to_vec();

    for child in children {
        scale_one(
            scene,
            config,
            child,
            parent_layout,
            parent_old_size,
            parent_new_size,
            sx,
            sy,
            report,
        );
    }

    if parent_layout.is_auto_flow() {
        reflow(scene, parent);
    }
}

#[allow(clippy::too_many_arguments)]
fn scale_one(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    child: NodeId,
    parent_layout: LayoutMode,
    parent_old_size: (f64, f64),
    parent_new_size: (f64, f64),
    sx: f64,
    sy: f64,
    report: &mut PropagationReport,
) {
    let Some(node) = scene.try_get(child) else {
        return;
    };
    let old = node.rect;
    let was_circular = node.is_circular(config.squareness_ratio);
    let keeps_size = node.is_text() || node.is_icon_sized(config.icon_size_threshold);
    let (new_w, new_h) = if keeps_size {
        (old.width, old.height)
    } else {
        (old.width * sx, old.height * sy)
    };

    // Reposition within free-form parents; auto-flow placement is restacked
    // by the caller afterwards.
    if parent_layout == LayoutMode::None {
        let mut x = (old.x * sx).round();
        let mut y = (old.y * sy).round();

        // Clamp to the tighter of the scaled original margins so the element
        // stays inside its original padding envelope.
        let left = old.x;
        let right = parent_old_size.0 - old.right();
        if left <= right {
            x = x.max((left * sx).round());
        } else {
            x = x.min(parent_new_size.0 - new_w - (right * sx).round());
        }
        let top = old.y;
        let bottom = parent_old_size.1 - old.bottom();
        if top <= bottom {
            y = y.max((top * sy).round());
        } else {
            y = y.min(parent_new_size.1 - new_h - (bottom * sy).round());
        }
        let _ = scene.set_position(child, x, y);
    }

    if keeps_size {
        let what = if scene.try_get(child).map(|n| n.is_text()).unwrap_or(false) {
            "text leaf"
        } else {
            "icon-sized leaf"
        };
        report.note(
            PropagationStep::SubtreeScale,
            child,
            format!("{what} repositioned without resizing"),
        );
        return;
    }

    let _ = scene.resize(child, new_w, new_h);
    {
        let Ok(node) = scene.get_mut(child) else {
            return;
        };
        // Lock the size in so the layout system cannot immediately undo the
        // scale.
        node.sizing_horizontal = SizingMode::Fixed;
        node.sizing_vertical = SizingMode::Fixed;
        node.corner_radius *= sx.max(sy);
        if let Some(container) = node.as_container_mut() {
            if container.layout.is_auto_flow() {
                container.padding = container.padding.scaled(sx, sy);
                container.item_spacing *= match container.layout {
                    LayoutMode::Horizontal => sx,
                    _ => sy,
                };
            }
        }
    }

    scale_children(
        scene,
        config,
        child,
        (old.width, old.height),
        sx,
        sy,
        report,
    );

    if was_circular {
        // Non-uniform scaling would squash the circle; force it back to
        // square on the larger dimension and keep its scaled center.
        let side = new_w.max(new_h);
        let scaled_center = Point::new(old.center().x * sx, old.center().y * sy);
        let _ = scene.resize(child, side, side);
        if parent_layout == LayoutMode::None {
            let _ = scene.set_position(
                child,
                scaled_center.x - side / 2.0,
                scaled_center.y - side / 2.0,
            );
        }
        if (new_w - new_h).abs() > EPSILON {
            report.note(
                PropagationStep::SubtreeScale,
                child,
                format!("restored circularity at {side:.1}"),
            );
        }
    }
}

// ============================================================================
// Grid normalization
// ============================================================================

/// Force every grid cell's children back to the reference cell's sizes.
///
/// The first child is taken as the authoritative reference cell; this is the
/// policy the engine has always applied, not a validated layout property.
pub(crate) fn normalize_grids(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    root: NodeId,
    report: &mut PropagationReport,
) {
    for id in scene.preorder(root) {
        let Some(node) = scene.try_get(id) else {
            continue;
        };
        if node.layout_mode() != LayoutMode::Grid {
            continue;
        }
        let cells: Vec<NodeId> = node.children().to_vec();
        let Some((reference, rest)) = cells.split_first() else {
            continue;
        };
        let reference_children: Vec<NodeId> = scene
            .try_get(*reference)
            .map(|n| n.children().to_vec())
            .unwrap_or_default();

        for cell in rest {
            let cell_children: Vec<NodeId> = scene
                .try_get(*cell)
                .map(|n| n.children().to_vec())
                .unwrap_or_default();
            for (ref_child, cell_child) in reference_children.iter().zip(cell_children.iter()) {
                let Some(ref_rect) = scene.try_get(*ref_child).map(|n| n.rect) else {
                    continue;
                };
                let Some(current) = scene.try_get(*cell_child).map(|n| n.rect) else {
                    continue;
                };
                let divergent = (current.width - ref_rect.width).abs()
                    > config.grid_divergence_tolerance
                    || (current.height - ref_rect.height).abs()
                        > config.grid_divergence_tolerance;
                if !divergent {
                    continue;
                }

                let rsx = if current.width > EPSILON {
                    ref_rect.width / current.width
                } else {
                    1.0
                };
                let rsy = if current.height > EPSILON {
                    ref_rect.height / current.height
                } else {
                    1.0
                };
                if let Ok(node) = scene.get_mut(*cell_child) {
                    node.sizing_horizontal = SizingMode::Fixed;
                    node.sizing_vertical = SizingMode::Fixed;
                }
                let _ = scene.resize(*cell_child, ref_rect.width, ref_rect.height);
                scale_children(
                    scene,
                    config,
                    *cell_child,
                    (current.width, current.height),
                    rsx,
                    rsy,
                    report,
                );
                report.note(
                    PropagationStep::GridNormalize,
                    *cell_child,
                    format!(
                        "forced to reference cell size {:.0}x{:.0}",
                        ref_rect.width, ref_rect.height
                    ),
                );
            }
        }
    }
}

// ============================================================================
// Tight fit
// ============================================================================

/// Post-order pass shrinking every auto-flow container to the minimum size
/// that still contains its children (removes slack left by unscaled icons
/// and text)
pub(crate) fn tight_fit_subtree(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    root: NodeId,
    report: &mut PropagationReport,
) {
    for id in scene.postorder(root) {
        let Some((need_main, need_cross)) = required_auto_flow_size(scene, id) else {
            continue;
        };
        let Some(node) = scene.try_get(id) else {
            continue;
        };
        let layout = node.layout_mode();
        let rect = node.rect;
        let (need_w, need_h) = match layout {
            LayoutMode::Horizontal => (need_main, need_cross),
            _ => (need_cross, need_main),
        };
        let new_w = rect.width.min(need_w).max(config.min_container_size);
        let new_h = rect.height.min(need_h).max(config.min_container_size);
        if (new_w - rect.width).abs() > EPSILON || (new_h - rect.height).abs() > EPSILON {
            let _ = scene.resize(id, new_w, new_h);
            report.note(
                PropagationStep::TightFit,
                id,
                format!(
                    "shrunk to content ({:.1}x{:.1} -> {new_w:.1}x{new_h:.1})",
                    rect.width, rect.height
                ),
            );
            reflow(scene, id);
        }
    }
}

// ============================================================================
// Upward propagation
// ============================================================================

/// Push a measured size delta of `start` up the ancestor chain one level at a
/// time. Free-form ancestors shift the siblings at/after the old trailing
/// edge and keep their trailing margin; auto-flow ancestors grow by the delta
/// on their stacking axis and only on real overflow across it. The delta is
/// re-measured at each level and the walk stops once it reaches zero.
pub(crate) fn propagate_ancestor_delta(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    start: NodeId,
    mut dw: f64,
    mut dh: f64,
    report: &mut PropagationReport,
) {
    let mut child = start;
    loop {
        if dw.abs() < EPSILON && dh.abs() < EPSILON {
            break;
        }
        let Some(parent) = scene.parent_of(child) else {
            break;
        };
        let Some(parent_node) = scene.try_get(parent) else {
            break;
        };
        let parent_old = parent_node.rect;
        let layout = parent_node.layout_mode();

        match layout {
            LayoutMode::None => {
                let Some(child_rect) = scene.try_get(child).map(|n| n.rect) else {
                    break;
                };
                let old_bottom = child_rect.bottom() - dh;
                let old_right = child_rect.right() - dw;

                // Children bound before the shift, with the child's old
                // extents, so the parent's trailing margin is preserved.
                let mut bound_w0 = old_right;
                let mut bound_h0 = old_bottom;
                let siblings = scene.siblings(child);
                for sibling in &siblings {
                    if let Some(r) = scene.try_get(*sibling).map(|n| n.rect) {
                        bound_w0 = bound_w0.max(r.right());
                        bound_h0 = bound_h0.max(r.bottom());
                    }
                }

                for sibling in &siblings {
                    let Some(r) = scene.try_get(*sibling).map(|n| n.rect) else {
                        continue;
                    };
                    let mut x = r.x;
                    let mut y = r.y;
                    let mut moved = false;
                    if dh.abs() > EPSILON && r.y >= old_bottom - config.gap_tolerance {
                        y += dh;
                        moved = true;
                    }
                    if dw.abs() > EPSILON && r.x >= old_right - config.gap_tolerance {
                        x += dw;
                        moved = true;
                    }
                    if moved {
                        let _ = scene.set_position(*sibling, x, y);
                    }
                }

                let mut bound_w1 = child_rect.right();
                let mut bound_h1 = child_rect.bottom();
                for sibling in &siblings {
                    if let Some(r) = scene.try_get(*sibling).map(|n| n.rect) {
                        bound_w1 = bound_w1.max(r.right());
                        bound_h1 = bound_h1.max(r.bottom());
                    }
                }

                let trailing_w = (parent_old.width - bound_w0).max(0.0);
                let trailing_h = (parent_old.height - bound_h0).max(0.0);
                let new_w = if dw.abs() > EPSILON {
                    (bound_w1 + trailing_w).max(config.min_container_size)
                } else {
                    parent_old.width
                };
                let new_h = if dh.abs() > EPSILON {
                    (bound_h1 + trailing_h).max(config.min_container_size)
                } else {
                    parent_old.height
                };
                if (new_w - parent_old.width).abs() > EPSILON
                    || (new_h - parent_old.height).abs() > EPSILON
                {
                    let _ = scene.resize(parent, new_w, new_h);
                    report.note(
                        PropagationStep::Propagate,
                        parent,
                        format!(
                            "free-form ancestor refit ({:.1}x{:.1} -> {new_w:.1}x{new_h:.1})",
                            parent_old.width, parent_old.height
                        ),
                    );
                }
            }
            LayoutMode::Horizontal | LayoutMode::Vertical => {
                let Some(child_rect) = scene.try_get(child).map(|n| n.rect) else {
                    break;
                };
                let padding = scene
                    .try_get(parent)
                    .and_then(|n| n.as_container())
                    .map(|c| c.padding)
                    .unwrap_or_default();
                let mut new_w = parent_old.width;
                let mut new_h = parent_old.height;
                match layout {
                    LayoutMode::Horizontal => {
                        // Children stack on x: the main axis absorbs the
                        // delta directly.
                        if dw.abs() > EPSILON {
                            new_w = (parent_old.width + dw).max(config.min_container_size);
                        }
                        let avail_cross = parent_old.height - padding.vertical();
                        if child_rect.height > avail_cross + EPSILON {
                            new_h = new_h.max(child_rect.height + padding.vertical());
                        }
                    }
                    _ => {
                        if dh.abs() > EPSILON {
                            new_h = (parent_old.height + dh).max(config.min_container_size);
                        }
                        let avail_cross = parent_old.width - padding.horizontal();
                        if child_rect.width > avail_cross + EPSILON {
                            new_w = new_w.max(child_rect.width + padding.horizontal());
                        }
                    }
                }
                if (new_w - parent_old.width).abs() > EPSILON
                    || (new_h - parent_old.height).abs() > EPSILON
                {
                    let _ = scene.resize(parent, new_w, new_h);
                    report.note(
                        PropagationStep::Propagate,
                        parent,
                        format!(
                            "auto-flow ancestor grew ({:.1}x{:.1} -> {new_w:.1}x{new_h:.1})",
                            parent_old.width, parent_old.height
                        ),
                    );
                }
                reflow(scene, parent);
            }
            LayoutMode::Grid => {
                report.note(
                    PropagationStep::Propagate,
                    parent,
                    "grid ancestor left to host cell management",
                );
            }
        }

        let Some(parent_new) = scene.try_get(parent).map(|n| n.rect) else {
            break;
        };
        dw = parent_new.width - parent_old.width;
        dh = parent_new.height - parent_old.height;
        child = parent;
    }
}

/// Final safety net: walk to the document root and grow any ancestor whose
/// rect is smaller than its children's bounding box plus trailing padding
pub(crate) fn ancestor_fit_sweep(
    scene: &mut SceneGraph,
    start: NodeId,
    report: &mut PropagationReport,
) {
    for ancestor in scene.ancestors(start) {
        let Some(node) = scene.try_get(ancestor) else {
            continue;
        };
        let rect = node.rect;
        let (trail_w, trail_h) = node
            .as_container()
            .filter(|c| c.layout.is_auto_flow())
            .map(|c| (c.padding.right, c.padding.bottom))
            .unwrap_or((0.0, 0.0));

        let mut bound_w: f64 = 0.0;
        let mut bound_h: f64 = 0.0;
        for child in node.children() {
            if let Some(r) = scene.try_get(*child).map(|n| n.rect) {
                bound_w = bound_w.max(r.right());
                bound_h = bound_h.max(r.bottom());
            }
        }
        let need_w = bound_w + trail_w;
        let need_h = bound_h + trail_h;
        if rect.width < need_w - EPSILON || rect.height < need_h - EPSILON {
            let new_w = rect.width.max(need_w);
            let new_h = rect.height.max(need_h);
            let _ = scene.resize(ancestor, new_w, new_h);
            report.note(
                PropagationStep::AncestorFit,
                ancestor,
                format!("grown to children bound ({new_w:.1}x{new_h:.1})"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ContainerData, Padding, Rect, ShapePrimitive};

    fn free_form_scene() -> (SceneGraph, NodeId, NodeId) {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let a = scene
            .create_shape(root, "a", Rect::new(0.0, 0.0, 200.0, 100.0), ShapePrimitive::Rectangle)
            .unwrap();
        let b = scene
            .create_shape(root, "b", Rect::new(0.0, 150.0, 200.0, 100.0), ShapePrimitive::Rectangle)
            .unwrap();
        (scene, a, b)
    }

    #[test]
    fn test_resize_preserves_gap_and_grows_parent() {
        let (mut scene, a, b) = free_form_scene();
        let root = scene.root();
        let config = EngineConfig::default();

        propagate_resize(&mut scene, &config, a, 200.0, 150.0).unwrap();

        assert_eq!(scene.get(a).unwrap().rect.height, 150.0);
        // Gap of 50 below `a` preserved: b moves from 150 to 200.
        assert_eq!(scene.get(b).unwrap().rect.y, 200.0);
        // The parent grew by the same delta.
        assert!(scene.get(root).unwrap().rect.height >= 350.0 - 1e-6);
    }

    #[test]
    fn test_resize_is_idempotent() {
        let (mut scene, a, _) = free_form_scene();
        let config = EngineConfig::default();

        propagate_resize(&mut scene, &config, a, 200.0, 150.0).unwrap();
        let after_first: Vec<Rect> = scene
            .preorder(scene.root())
            .into_iter()
            .map(|id| scene.get(id).unwrap().rect)
            .collect();

        propagate_resize(&mut scene, &config, a, 200.0, 150.0).unwrap();
        let after_second: Vec<Rect> = scene
            .preorder(scene.root())
            .into_iter()
            .map(|id| scene.get(id).unwrap().rect)
            .collect();

        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_resize_missing_target_fails() {
        let (mut scene, a, _) = free_form_scene();
        let config = EngineConfig::default();
        scene.remove(a).unwrap();
        assert!(propagate_resize(&mut scene, &config, a, 10.0, 10.0).is_err());
    }

    #[test]
    fn test_text_target_is_not_resizable() {
        let mut scene = SceneGraph::new(400.0, 300.0);
        let root = scene.root();
        let text = scene
            .create_text(
                root,
                "headline",
                Rect::new(0.0, 0.0, 100.0, 20.0),
                "Hello",
                crate::scene::TextStyle {
                    family: "Inter".to_string(),
                    style: "Regular".to_string(),
                    size: 14.0,
                },
            )
            .unwrap();
        let config = EngineConfig::default();
        let err = propagate_resize(&mut scene, &config, text, 200.0, 40.0).unwrap_err();
        assert!(matches!(err, EngineError::NotResizable { .. }));
    }

    #[test]
    fn test_subtree_scale_keeps_icon_size() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let root = scene.root();
        let card = scene
            .create_container(
                root,
                "card",
                Rect::new(0.0, 0.0, 200.0, 200.0),
                ContainerData::free_form(),
            )
            .unwrap();
        let icon = scene
            .create_shape(card, "icon", Rect::new(10.0, 10.0, 24.0, 24.0), ShapePrimitive::Rectangle)
            .unwrap();
        let body = scene
            .create_shape(card, "body", Rect::new(10.0, 60.0, 180.0, 120.0), ShapePrimitive::Rectangle)
            .unwrap();
        let config = EngineConfig::default();

        propagate_resize(&mut scene, &config, card, 400.0, 400.0).unwrap();

        let icon_rect = scene.get(icon).unwrap().rect;
        assert_eq!((icon_rect.width, icon_rect.height), (24.0, 24.0));
        assert_eq!((icon_rect.x, icon_rect.y), (20.0, 20.0));

        let body_rect = scene.get(body).unwrap().rect;
        assert_eq!((body_rect.width, body_rect.height), (360.0, 240.0));
    }

    #[test]
    fn test_circularity_survives_non_uniform_scale() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let root = scene.root();
        let frame = scene
            .create_container(
                root,
                "frame",
                Rect::new(0.0, 0.0, 200.0, 200.0),
                ContainerData::free_form(),
            )
            .unwrap();
        let avatar = scene
            .create_shape(frame, "avatar", Rect::new(50.0, 50.0, 100.0, 100.0), ShapePrimitive::Ellipse)
            .unwrap();
        let config = EngineConfig::default();

        // Non-uniform scale: x2 horizontally, x1.5 vertically.
        propagate_resize(&mut scene, &config, frame, 400.0, 300.0).unwrap();

        let rect = scene.get(avatar).unwrap().rect;
        assert_eq!(rect.width, rect.height);
        assert_eq!(rect.width, 200.0);
        // Re-centered on the scaled center (200, 150).
        assert_eq!(rect.center().x, 200.0);
        assert_eq!(rect.center().y, 150.0);
    }

    #[test]
    fn test_vertical_auto_flow_ancestor_grows_by_delta() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let root = scene.root();
        let stack = scene
            .create_container(
                root,
                "stack",
                Rect::new(0.0, 0.0, 200.0, 220.0),
                ContainerData::auto_flow(LayoutMode::Vertical, Padding::uniform(10.0), 10.0),
            )
            .unwrap();
        let first = scene
            .create_shape(stack, "first", Rect::new(10.0, 10.0, 180.0, 90.0), ShapePrimitive::Rectangle)
            .unwrap();
        let second = scene
            .create_shape(stack, "second", Rect::new(10.0, 110.0, 180.0, 90.0), ShapePrimitive::Rectangle)
            .unwrap();
        let config = EngineConfig::default();

        propagate_resize(&mut scene, &config, first, 180.0, 140.0).unwrap();

        // Stack grew by the +50 delta on its stacking axis.
        assert_eq!(scene.get(stack).unwrap().rect.height, 270.0);
        // And restacked: second child now starts below the taller first.
        assert_eq!(scene.get(second).unwrap().rect.y, 160.0);
    }

    #[test]
    fn test_tight_fit_removes_icon_slack() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let root = scene.root();
        let row = scene
            .create_container(
                root,
                "row",
                Rect::new(0.0, 0.0, 104.0, 44.0),
                ContainerData::auto_flow(LayoutMode::Horizontal, Padding::uniform(10.0), 0.0),
            )
            .unwrap();
        let icon = scene
            .create_shape(row, "icon", Rect::new(10.0, 10.0, 24.0, 24.0), ShapePrimitive::Vector)
            .unwrap();
        let _label = scene
            .create_shape(row, "label", Rect::new(34.0, 10.0, 60.0, 24.0), ShapePrimitive::Rectangle)
            .unwrap();
        let config = EngineConfig::default();

        propagate_resize(&mut scene, &config, row, 208.0, 88.0).unwrap();

        // The icon did not scale, so the doubled row is wider than its
        // content; tight-fit claws the slack back.
        let rect = scene.get(row).unwrap().rect;
        let icon_rect = scene.get(icon).unwrap().rect;
        assert_eq!((icon_rect.width, icon_rect.height), (24.0, 24.0));
        // padding 20 left + 24 icon + 120 label + 20 right = 184 < 208
        assert!(rect.width < 208.0);
        assert_eq!(rect.width, 184.0);
    }

    #[test]
    fn test_grid_cells_follow_reference_cell() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let root = scene.root();
        let grid = scene
            .create_container(
                root,
                "grid",
                Rect::new(0.0, 0.0, 200.0, 100.0),
                ContainerData {
                    children: Vec::new(),
                    layout: LayoutMode::Grid,
                    padding: Padding::default(),
                    item_spacing: 0.0,
                    primary_align: crate::scene::Align::Start,
                    counter_align: crate::scene::Align::Start,
                },
            )
            .unwrap();
        let cell_a = scene
            .create_container(grid, "cell-a", Rect::new(0.0, 0.0, 100.0, 100.0), ContainerData::free_form())
            .unwrap();
        let cell_b = scene
            .create_container(grid, "cell-b", Rect::new(100.0, 0.0, 100.0, 100.0), ContainerData::free_form())
            .unwrap();
        let a_child = scene
            .create_shape(cell_a, "a-child", Rect::new(0.0, 0.0, 80.0, 60.0), ShapePrimitive::Rectangle)
            .unwrap();
        let b_child = scene
            .create_shape(cell_b, "b-child", Rect::new(0.0, 0.0, 70.0, 52.0), ShapePrimitive::Rectangle)
            .unwrap();
        let config = EngineConfig::default();
        let mut report = PropagationReport::default();

        normalize_grids(&mut scene, &config, grid, &mut report);

        let a_rect = scene.get(a_child).unwrap().rect;
        let b_rect = scene.get(b_child).unwrap().rect;
        assert_eq!((b_rect.width, b_rect.height), (a_rect.width, a_rect.height));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.step == PropagationStep::GridNormalize));
    }

    #[test]
    fn test_gap_capture_orders_by_y() {
        let mut scene = SceneGraph::new(400.0, 600.0);
        let root = scene.root();
        let a = scene
            .create_shape(root, "a", Rect::new(0.0, 0.0, 100.0, 100.0), ShapePrimitive::Rectangle)
            .unwrap();
        let c = scene
            .create_shape(root, "c", Rect::new(0.0, 300.0, 100.0, 50.0), ShapePrimitive::Rectangle)
            .unwrap();
        let b = scene
            .create_shape(root, "b", Rect::new(0.0, 150.0, 100.0, 100.0), ShapePrimitive::Rectangle)
            .unwrap();

        let records = capture_free_form_gaps(&scene, a);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].below, vec![(b, 50.0), (c, 50.0)]);
    }
}
