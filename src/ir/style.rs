use std::collections::HashMap;

use crate::foundation::core::{Affine, Color};
use crate::ir::model::{Frame, FrameNode, MaterialNode, NodeRef, RootMaterial};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
/// Fully resolved style of a shape.
pub struct ResolvedStyle {
    /// Effective fill color.
    pub fill: Color,
    /// Effective stroke color.
    pub stroke: Color,
    /// Effective stroke width.
    pub stroke_width: f64,
}

#[derive(Clone, Debug)]
/// A leaf shape as a renderer would see it.
pub struct LeafInstance {
    /// The leaf node itself.
    pub node: NodeRef,
    /// Product of every enclosing transform, outermost first.
    pub world: Affine,
    /// Id of the innermost enclosing material.
    pub material: String,
    /// Style resolved through the material's ref chain.
    pub style: ResolvedStyle,
}

/// Lookup table from material id to material, built once per frame.
pub struct MaterialIndex<'a> {
    root: &'a RootMaterial,
    by_id: HashMap<&'a str, &'a MaterialNode>,
}

impl<'a> MaterialIndex<'a> {
    /// Index every non-root material in `frame`.
    pub fn new(frame: &'a Frame) -> Self {
        let mut by_id = HashMap::new();
        let mut stack: Vec<&'a NodeRef> = frame.root.children.iter().collect();
        while let Some(node) = stack.pop() {
            if let FrameNode::Material(m) = node.as_ref() {
                by_id.insert(m.id.as_str(), m);
            }
            stack.extend(node.children());
        }
        Self {
            root: &frame.root,
            by_id,
        }
    }

    /// Look up a non-root material.
    pub fn get(&self, id: &str) -> Option<&'a MaterialNode> {
        self.by_id.get(id).copied()
    }

    /// Number of indexed non-root materials.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the frame has no non-root materials.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Resolve the effective style of material `id` by walking its ref chain.
    ///
    /// Each field takes the value of the nearest material in ref-chain order that defines it,
    /// falling back to the root. A dangling ref, or a cycle, ends the walk at the root.
    pub fn resolve(&self, id: &str) -> ResolvedStyle {
        let mut fill = None;
        let mut stroke = None;
        let mut stroke_width = None;

        let mut cur = id;
        let mut steps = 0usize;
        while cur != RootMaterial::ID && steps <= self.by_id.len() {
            let Some(m) = self.get(cur) else {
                break;
            };
            if fill.is_none() {
                fill = m.fill.as_ref();
            }
            if stroke.is_none() {
                stroke = m.stroke.as_ref();
            }
            if stroke_width.is_none() {
                stroke_width = m.stroke_width;
            }
            cur = &m.ref_id;
            steps += 1;
        }

        ResolvedStyle {
            fill: fill.unwrap_or(&self.root.fill).clone(),
            stroke: stroke.unwrap_or(&self.root.stroke).clone(),
            stroke_width: stroke_width.unwrap_or(self.root.stroke_width),
        }
    }
}

/// Every leaf shape of `frame` in document order, with world transform and resolved style.
pub fn collect_leaves(frame: &Frame) -> Vec<LeafInstance> {
    let index = MaterialIndex::new(frame);
    let mut out = Vec::new();

    let mut stack: Vec<(&NodeRef, &str, Affine)> = frame
        .root
        .children
        .iter()
        .rev()
        .map(|c| (c, RootMaterial::ID, Affine::IDENTITY))
        .collect();

    while let Some((node, material, world)) = stack.pop() {
        match node.as_ref() {
            FrameNode::Material(m) => {
                for c in m.children.iter().rev() {
                    stack.push((c, m.id.as_str(), world));
                }
            }
            FrameNode::Transform(t) => {
                let world = world * t.matrix;
                for c in t.children.iter().rev() {
                    stack.push((c, material, world));
                }
            }
            FrameNode::Circle(_)
            | FrameNode::Line(_)
            | FrameNode::Rectangle(_)
            | FrameNode::Image(_) => {
                out.push(LeafInstance {
                    node: NodeRef::clone(node),
                    world,
                    material: material.to_owned(),
                    style: index.resolve(material),
                });
            }
        }
    }

    out
}

/// Resolved style of every leaf in document order.
pub fn resolve_leaf_styles(frame: &Frame) -> Vec<(NodeRef, ResolvedStyle)> {
    collect_leaves(frame)
        .into_iter()
        .map(|l| (l.node, l.style))
        .collect()
}

/// Total node count, the root material included.
pub fn count_nodes(frame: &Frame) -> usize {
    let mut count = 1;
    let mut stack: Vec<&NodeRef> = frame.root.children.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.children());
    }
    count
}

#[cfg(test)]
#[path = "../../tests/unit/ir/style.rs"]
mod tests;
