//! Radial layout for the category/code graph.
//!
//! The model is rebuilt from scratch on every "View" press: categories and
//! codes become [LayoutNode]s, an optional focus narrows the model to one
//! subtree, and a bounded resolution loop places every node on a radial
//! fan around its parent. Dragging a node afterwards only moves that node,
//! the layout is never re-run behind the user's back.

use std::collections::HashMap;

use crate::types::{Category, Code};

const RADIUS: f32 = 180.0;
const NUDGE: f32 = 20.0;
const MAX_PASSES: usize = 1000;
const MAX_FOCUS_ROUNDS: usize = 10;
const CODE_FONT_SIZE: f32 = 8.0;
const CATEGORY_FONT_SIZE: f32 = 9.0;
const TOP_CATEGORY_FONT_SIZE: f32 = 10.0;
const WHITE_FILL: &str = "#FFFFFF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Category,
    Code,
}

/// The item the graph is narrowed to when the user picks a focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusItem {
    Category(i64),
    Code(i64),
}

/// One placed graph node. `match_id` is the key other nodes use to find
/// this node as a parent: a category answers to its own id, a code answers
/// to its owning category's id. The two id spaces overlap, so a code can be
/// picked up as the "parent" of its own siblings; the depth guard on edges
/// keeps that from producing arrows between them.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub kind: NodeKind,
    pub id: i64,
    pub name: String,
    /// Hex fill for the node box.
    pub color: String,
    pub font_size: f32,
    pub match_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub depth: u32,
    pub angle: f32,
    pub x: f32,
    pub y: f32,
}

/// Arrow from a child node to its parent, as indices into [GraphLayout::nodes].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEdge {
    pub child: usize,
    pub parent: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    /// Resolution passes the placement loop ran.
    pub passes: usize,
    /// False when the pass cap was hit and stragglers fell back to root
    /// placement.
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphOptions {
    pub black_and_white: bool,
    pub larger_category_font: bool,
}

pub fn build_layout(
    categories: &[Category],
    codes: &[Code],
    focus: Option<FocusItem>,
    width: f32,
    height: f32,
    options: &GraphOptions,
) -> GraphLayout {
    let mut nodes = initial_nodes(categories, codes, options);
    if let Some(focus) = focus {
        nodes = focus_subset(nodes, focus);
    }

    let category_parents: HashMap<i64, Option<i64>> = nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Category)
        .map(|n| (n.id, n.parent_id))
        .collect();
    for i in 0..nodes.len() {
        nodes[i].depth = depth_of(nodes[i].parent_id, &category_parents);
    }
    apply_font_sizes(&mut nodes, options);
    assign_angles(&mut nodes);

    // The parent used for placement is the first other node answering to the
    // child's parent id; categories come before codes in the model, so a
    // real category wins over a same-id sibling code whenever both exist.
    let resolved_parent: Vec<Option<usize>> = (0..nodes.len())
        .map(|i| {
            let parent_id = nodes[i].parent_id?;
            (0..nodes.len()).find(|&j| j != i && nodes[j].match_id == Some(parent_id))
        })
        .collect();

    let c_x = width / 3.0;
    let c_y = height / 2.0;
    let rx_expander = c_x / c_y;

    let mut placed = vec![false; nodes.len()];
    let mut passes = 0;
    let mut unplaced = true;
    while unplaced && passes < MAX_PASSES {
        unplaced = false;
        for i in 0..nodes.len() {
            if placed[i] {
                continue;
            }
            match resolved_parent[i] {
                None => {
                    let (x, y) = root_position(nodes[i].angle, c_x, c_y, rx_expander);
                    nodes[i].x = x;
                    nodes[i].y = y;
                    placed[i] = true;
                }
                Some(p) if placed[p] => {
                    let (x, y) = child_position(&nodes[i], &nodes[p], rx_expander);
                    nodes[i].x = x;
                    nodes[i].y = y;
                    placed[i] = true;
                }
                Some(_) => unplaced = true,
            }
        }
        passes += 1;
    }

    // A parent cycle with no root deadlocks the loop; once the cap is hit
    // the stragglers are dropped onto the root ring so every node still
    // ends up with a position.
    let converged = !unplaced;
    for i in 0..nodes.len() {
        if !placed[i] {
            let (x, y) = root_position(nodes[i].angle, c_x, c_y, rx_expander);
            nodes[i].x = x;
            nodes[i].y = y;
        }
    }

    let max_x = (width - 20.0).max(2.0);
    let max_y = (height - 20.0).max(2.0);
    for node in &mut nodes {
        node.x = node.x.clamp(2.0, max_x);
        node.y = node.y.clamp(2.0, max_y);
    }

    let mut edges = Vec::new();
    for (i, parent) in resolved_parent.iter().enumerate() {
        if let Some(p) = *parent {
            if nodes[p].depth < nodes[i].depth {
                edges.push(LayoutEdge {
                    child: i,
                    parent: p,
                });
            }
        }
    }

    GraphLayout {
        nodes,
        edges,
        passes,
        converged,
    }
}

fn initial_nodes(categories: &[Category], codes: &[Code], options: &GraphOptions) -> Vec<LayoutNode> {
    let mut nodes = Vec::with_capacity(categories.len() + codes.len());
    for category in categories {
        nodes.push(LayoutNode {
            kind: NodeKind::Category,
            id: category.id,
            name: category.name.clone(),
            color: WHITE_FILL.to_string(),
            font_size: CATEGORY_FONT_SIZE,
            match_id: Some(category.id),
            parent_id: category.parent_id,
            depth: 0,
            angle: 0.0,
            x: 0.0,
            y: 0.0,
        });
    }
    for code in codes {
        let color = if options.black_and_white {
            WHITE_FILL.to_string()
        } else {
            code.color.clone()
        };
        nodes.push(LayoutNode {
            kind: NodeKind::Code,
            id: code.id,
            name: code.name.clone(),
            color,
            font_size: CODE_FONT_SIZE,
            match_id: code.category_id,
            parent_id: code.category_id,
            depth: 0,
            angle: 0.0,
            x: 0.0,
            y: 0.0,
        });
    }
    nodes
}

/// Keep the focus node and everything hanging below it. Membership grows in
/// rounds: a node joins when its parent id matches the `match_id` of a node
/// already in, comparing `Some` against `Some` only.
fn focus_subset(nodes: Vec<LayoutNode>, focus: FocusItem) -> Vec<LayoutNode> {
    let mut selected: Vec<bool> = nodes
        .iter()
        .map(|n| match focus {
            FocusItem::Category(id) => n.kind == NodeKind::Category && n.id == id,
            FocusItem::Code(id) => n.kind == NodeKind::Code && n.id == id,
        })
        .collect();

    for _ in 0..MAX_FOCUS_ROUNDS {
        let match_ids: Vec<i64> = nodes
            .iter()
            .zip(&selected)
            .filter(|(_, sel)| **sel)
            .filter_map(|(n, _)| n.match_id)
            .collect();
        let mut changed = false;
        for (i, node) in nodes.iter().enumerate() {
            if selected[i] {
                continue;
            }
            if let Some(parent_id) = node.parent_id {
                if match_ids.contains(&parent_id) {
                    selected[i] = true;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    nodes
        .into_iter()
        .zip(selected)
        .filter(|(_, sel)| *sel)
        .map(|(n, _)| n)
        .collect()
}

/// Hops up the category chain. A parent outside the model ends the walk, as
/// does revisiting a category, so a cyclic chain yields the depth collected
/// before the cycle closed.
fn depth_of(parent_id: Option<i64>, category_parents: &HashMap<i64, Option<i64>>) -> u32 {
    let mut depth = 0;
    let mut visited: Vec<i64> = Vec::new();
    let mut current = parent_id;
    while let Some(id) = current {
        let Some(next) = category_parents.get(&id) else {
            break;
        };
        if visited.contains(&id) {
            break;
        }
        visited.push(id);
        depth += 1;
        current = *next;
    }
    depth
}

fn apply_font_sizes(nodes: &mut [LayoutNode], options: &GraphOptions) {
    for node in nodes {
        node.font_size = match node.kind {
            NodeKind::Code => CODE_FONT_SIZE,
            NodeKind::Category => {
                if options.larger_category_font && node.depth == 0 {
                    TOP_CATEGORY_FONT_SIZE
                } else {
                    CATEGORY_FONT_SIZE
                }
            }
        };
    }
}

/// Spread each sibling group evenly around the circle. The slot counter
/// starts at 1 and the multiplier at 2, so a group is rotated one slot past
/// the positive x axis.
fn assign_angles(nodes: &mut [LayoutNode]) {
    let mut group_sizes: HashMap<Option<i64>, usize> = HashMap::new();
    for node in nodes.iter() {
        *group_sizes.entry(node.parent_id).or_insert(0) += 1;
    }
    let mut slots: HashMap<Option<i64>, usize> = HashMap::new();
    for node in nodes.iter_mut() {
        let size = group_sizes[&node.parent_id];
        let slot = slots.entry(node.parent_id).or_insert(1);
        node.angle = (2.0 * std::f32::consts::PI / size as f32) * (*slot + 1) as f32;
        *slot += 1;
    }
}

fn root_position(angle: f32, c_x: f32, c_y: f32, rx_expander: f32) -> (f32, f32) {
    (
        c_x + angle.cos() * RADIUS * rx_expander,
        c_y + angle.sin() * RADIUS,
    )
}

fn child_position(child: &LayoutNode, parent: &LayoutNode, rx_expander: f32) -> (f32, f32) {
    let shrink = (child.depth + 2) as f32;
    let mut x = parent.x + child.angle.cos() * RADIUS * rx_expander / shrink;
    let mut y = parent.y + child.angle.sin() * RADIUS / shrink;
    if (x - parent.x).abs() < NUDGE && (y - parent.y).abs() < NUDGE {
        x += NUDGE;
        y += NUDGE;
    }
    (x, y)
}

/// Screen rectangle of a drawn node, fed to [link_endpoints].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Pick the attachment points for the arrow between two node boxes. Each
/// axis is handled on its own: when the boxes overlap on an axis the line
/// leaves from the middle of the overlapping side, otherwise from the edge
/// facing the other box.
pub fn link_endpoints(from: &NodeBox, to: &NodeBox) -> ((f32, f32), (f32, f32)) {
    let mut from_x = from.x;
    let mut to_x = to.x;
    let mut overlap_x = false;
    if to_x > from_x && to_x < from_x + from.width {
        from_x += from.width / 2.0;
        overlap_x = true;
    }
    if from_x > to_x && from_x < to_x + to.width {
        to_x += to.width / 2.0;
        overlap_x = true;
    }
    if !overlap_x {
        if to_x > from_x + from.width {
            from_x += from.width;
        } else if from_x > to_x + to.width {
            to_x += to.width;
        }
    }

    let mut from_y = from.y;
    let mut to_y = to.y;
    let mut overlap_y = false;
    if to_y > from_y && to_y < from_y + from.height {
        from_y += from.height / 2.0;
        overlap_y = true;
    }
    if from_y > to_y && from_y < to_y + to.height {
        to_y += to.height / 2.0;
        overlap_y = true;
    }
    if !overlap_y {
        if to_y > from_y {
            from_y += from.height;
        } else if from_y > to_y {
            to_y += to.height;
        }
    }

    ((from_x, from_y), (to_x, to_y))
}
