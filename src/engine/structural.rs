//! Structural edits: clone and delete
//!
//! Both operations share the upward propagation discipline of the resize
//! engine: measure the actual size change at each ancestor level and feed it
//! to the next. In auto-flow parents the tree edit is the whole story — the
//! layout system restacks the remaining children — while free-form parents
//! need the sibling-shift and parent-refit logic here.

use crate::scene::{LayoutMode, NodeId, SceneGraph};

use super::config::EngineConfig;
use super::error::{EngineError, PropagationReport, PropagationStep};
use super::resize::{ancestor_fit_sweep, propagate_ancestor_delta, reflow};

const EPSILON: f64 = 1e-6;

/// Duplicate `source` into `target_parent` (the source's own parent when
/// `None`) at an optional child index. Returns the new node's id.
pub fn clone_into(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    source: NodeId,
    target_parent: Option<NodeId>,
    index: Option<usize>,
) -> Result<(NodeId, PropagationReport), EngineError> {
    let source_node = scene.get(source)?;
    let source_rect = source_node.rect;
    let parent = match target_parent {
        Some(p) => p,
        None => source_node
            .parent
            .ok_or(EngineError::DetachedTarget { id: source })?,
    };
    scene.get(parent)?;

    let mut report = PropagationReport::default();
    let copy = scene.clone_subtree(source)?;
    let copy_height = scene.get(copy)?.rect.height;
    let parent_layout = scene.get(parent)?.layout_mode();
    let same_parent = scene.parent_of(source) == Some(parent);

    match parent_layout {
        LayoutMode::None => {
            let gap = typical_sibling_gap(scene, parent);
            report.note(
                PropagationStep::Propagate,
                parent,
                format!("inferred sibling gap {gap:.0}"),
            );

            // The place the clone lands: directly below the source when it
            // stays in the same parent, below the last child otherwise.
            let (anchor_x, anchor_bottom) = if same_parent {
                (source_rect.x, source_rect.bottom())
            } else {
                lowest_child_edge(scene, parent).unwrap_or((source_rect.x, 0.0))
            };

            let parent_old = scene.get(parent)?.rect;
            let bound_before = children_bottom_bound(scene, parent);

            // Make room: everything at or below the anchor's bottom edge
            // moves down by the clone's height plus the inferred gap.
            let shift = copy_height + gap;
            for sibling in scene.get(parent)?.children().to_vec() {
                let Some(rect) = scene.try_get(sibling).map(|n| n.rect) else {
                    continue;
                };
                if rect.y >= anchor_bottom - config.gap_tolerance {
                    let _ = scene.set_position(sibling, rect.x, rect.y + shift);
                }
            }

            let _ = scene.set_position(copy, anchor_x, anchor_bottom + gap);
            let insert_at = index.or_else(|| {
                same_parent
                    .then(|| scene.index_in_parent(source).map(|i| i + 1))
                    .flatten()
            });
            match insert_at {
                Some(i) => scene.insert_child_at(parent, copy, i)?,
                None => scene.append_child(parent, copy)?,
            }

            // Refit the parent, preserving its trailing margin, then push
            // the measured growth up the chain.
            let bound_after = children_bottom_bound(scene, parent);
            let trailing = (parent_old.height - bound_before).max(0.0);
            let new_height = (bound_after + trailing).max(config.min_container_size);
            if (new_height - parent_old.height).abs() > EPSILON {
                let _ = scene.resize(parent, parent_old.width, new_height);
                report.note(
                    PropagationStep::Propagate,
                    parent,
                    format!(
                        "grew for clone ({:.1} -> {new_height:.1})",
                        parent_old.height
                    ),
                );
            }
            let delta = new_height - parent_old.height;
            propagate_ancestor_delta(scene, config, parent, 0.0, delta, &mut report);
        }
        _ => {
            // Auto-flow and grid parents restack on their own; the tree
            // edit is all that is needed.
            let insert_at = index.or_else(|| {
                same_parent
                    .then(|| scene.index_in_parent(source).map(|i| i + 1))
                    .flatten()
            });
            match insert_at {
                Some(i) => scene.insert_child_at(parent, copy, i)?,
                None => scene.append_child(parent, copy)?,
            }
            reflow(scene, parent);
        }
    }

    ancestor_fit_sweep(scene, copy, &mut report);
    Ok((copy, report))
}

/// Remove `target`, closing the vertical hole it leaves in a free-form
/// parent and shrinking the ancestor chain to match
pub fn delete_node(
    scene: &mut SceneGraph,
    config: &EngineConfig,
    target: NodeId,
) -> Result<PropagationReport, EngineError> {
    let node = scene.get(target)?;
    let rect = node.rect;
    let parent = node
        .parent
        .ok_or(EngineError::DetachedTarget { id: target })?;
    let parent_layout = scene.get(parent)?.layout_mode();

    let mut report = PropagationReport::default();

    match parent_layout {
        LayoutMode::None => {
            let below = scene.siblings_below(target);
            let gap_below = below
                .first()
                .and_then(|first| scene.try_get(*first))
                .map(|n| n.rect.y - rect.bottom())
                .unwrap_or(0.0);
            let shift = rect.height + gap_below;

            let parent_old = scene.get(parent)?.rect;
            let bound_before = children_bottom_bound(scene, parent);

            scene.remove(target)?;

            // Later siblings move up by the deleted height plus the gap that
            // sat below it; the gap above the deleted node is what survives.
            for sibling in below {
                if let Some(r) = scene.try_get(sibling).map(|n| n.rect) {
                    let _ = scene.set_position(sibling, r.x, r.y - shift);
                }
            }

            let bound_after = children_bottom_bound(scene, parent);
            let trailing = (parent_old.height - bound_before).max(0.0);
            let new_height = (bound_after + trailing)
                .max(config.min_container_size)
                .min(parent_old.height);
            if (new_height - parent_old.height).abs() > EPSILON {
                let _ = scene.resize(parent, parent_old.width, new_height);
                report.note(
                    PropagationStep::Propagate,
                    parent,
                    format!(
                        "shrunk after delete ({:.1} -> {new_height:.1})",
                        parent_old.height
                    ),
                );
            }
            let delta = new_height - parent_old.height;
            propagate_ancestor_delta(scene, config, parent, 0.0, delta, &mut report);
            ancestor_fit_sweep(scene, parent, &mut report);
        }
        _ => {
            scene.remove(target)?;
            reflow(scene, parent);
            report.note(
                PropagationStep::Propagate,
                parent,
                "auto-flow parent restacked after delete",
            );
        }
    }

    Ok(report)
}

/// The "typical" vertical gap between adjacent siblings in a free-form
/// container: the most frequent rounded gap across all adjacent pairs, or
/// zero when there is no sample to learn from
pub(crate) fn typical_sibling_gap(scene: &SceneGraph, parent: NodeId) -> f64 {
    let Some(parent_node) = scene.try_get(parent) else {
        return 0.0;
    };
    let mut rects: Vec<_> = parent_node
        .children()
        .iter()
        .filter_map(|c| scene.try_get(*c).map(|n| n.rect))
        .collect();
    rects.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal));

    let mut counts: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
    for pair in rects.windows(2) {
        let gap = (pair[1].y - pair[0].bottom()).round() as i64;
        *counts.entry(gap).or_insert(0) += 1;
    }

    counts
        .into_iter()
        // Most frequent wins; ties go to the smaller gap for determinism.
        .max_by(|(gap_a, count_a), (gap_b, count_b)| {
            count_a.cmp(count_b).then(gap_b.cmp(gap_a))
        })
        .map(|(gap, _)| gap as f64)
        .unwrap_or(0.0)
}

fn children_bottom_bound(scene: &SceneGraph, parent: NodeId) -> f64 {
    scene
        .try_get(parent)
        .map(|node| {
            node.children()
                .iter()
                .filter_map(|c| scene.try_get(*c).map(|n| n.rect.bottom()))
                .fold(0.0, f64::max)
        })
        .unwrap_or(0.0)
}

fn lowest_child_edge(scene: &SceneGraph, parent: NodeId) -> Option<(f64, f64)> {
    let node = scene.try_get(parent)?;
    node.children()
        .iter()
        .filter_map(|c| scene.try_get(*c).map(|n| n.rect))
        .max_by(|a, b| {
            a.bottom()
                .partial_cmp(&b.bottom())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|r| (r.x, r.bottom()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Rect, ShapePrimitive};

    fn stacked_scene() -> (SceneGraph, Vec<NodeId>) {
        // Three 100-tall children separated by 20-unit gaps.
        let mut scene = SceneGraph::new(400.0, 400.0);
        let root = scene.root();
        let mut ids = Vec::new();
        for (i, y) in [0.0, 120.0, 240.0].iter().enumerate() {
            ids.push(
                scene
                    .create_shape(
                        root,
                        format!("child-{i}"),
                        Rect::new(0.0, *y, 200.0, 100.0),
                        ShapePrimitive::Rectangle,
                    )
                    .unwrap(),
            );
        }
        (scene, ids)
    }

    #[test]
    fn test_typical_gap_is_mode_of_rounded_gaps() {
        let (scene, _) = stacked_scene();
        assert_eq!(typical_sibling_gap(&scene, scene.root()), 20.0);
    }

    #[test]
    fn test_typical_gap_empty_sample_is_zero() {
        let mut scene = SceneGraph::new(400.0, 400.0);
        let root = scene.root();
        scene
            .create_shape(root, "only", Rect::new(0.0, 0.0, 100.0, 100.0), ShapePrimitive::Rectangle)
            .unwrap();
        assert_eq!(typical_sibling_gap(&scene, root), 0.0);
    }

    #[test]
    fn test_clone_places_below_source_and_shifts() {
        let (mut scene, ids) = stacked_scene();
        let root = scene.root();
        let config = EngineConfig::default();

        let (copy, _) = clone_into(&mut scene, &config, ids[0], None, None).unwrap();

        let copy_rect = scene.get(copy).unwrap().rect;
        assert_eq!((copy_rect.x, copy_rect.y), (0.0, 120.0));
        // Children below the source moved down by clone height + gap.
        assert_eq!(scene.get(ids[1]).unwrap().rect.y, 240.0);
        assert_eq!(scene.get(ids[2]).unwrap().rect.y, 360.0);
        // Clone sits right after the source in the child list.
        assert_eq!(scene.index_in_parent(copy), Some(1));
        // Parent grew by the same 120 (trailing margin 60 preserved).
        assert_eq!(scene.get(root).unwrap().rect.height, 520.0);
    }

    #[test]
    fn test_clone_with_no_siblings_uses_zero_gap() {
        let mut scene = SceneGraph::new(400.0, 400.0);
        let root = scene.root();
        let only = scene
            .create_shape(root, "only", Rect::new(10.0, 10.0, 100.0, 50.0), ShapePrimitive::Rectangle)
            .unwrap();
        let config = EngineConfig::default();

        let (copy, _) = clone_into(&mut scene, &config, only, None, None).unwrap();

        let copy_rect = scene.get(copy).unwrap().rect;
        assert_eq!((copy_rect.x, copy_rect.y), (10.0, 60.0));
    }

    #[test]
    fn test_delete_closes_hole_and_shrinks_parent() {
        let (mut scene, ids) = stacked_scene();
        let root = scene.root();
        let config = EngineConfig::default();

        delete_node(&mut scene, &config, ids[1]).unwrap();

        assert!(!scene.contains(ids[1]));
        // The later sibling moved up by deleted height + gap below = 120.
        assert_eq!(scene.get(ids[2]).unwrap().rect.y, 120.0);
        // Parent shrank by the same amount.
        assert_eq!(scene.get(root).unwrap().rect.height, 280.0);
    }

    #[test]
    fn test_delete_missing_target_fails() {
        let (mut scene, ids) = stacked_scene();
        let config = EngineConfig::default();
        scene.remove(ids[0]).unwrap();
        assert!(delete_node(&mut scene, &config, ids[0]).is_err());
    }
}
