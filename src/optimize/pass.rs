use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::core::Affine;
use crate::ir::model::{FrameNode, MaterialNode, NodeRef, RootMaterial, TransformNode};
use crate::optimize::opts::{OptimizeOpts, OptimizeStats};
use crate::optimize::refs::RefSet;
use crate::transform::affine;

/// A rewritten subtree plus what its parent needs to know about it.
struct Optimized<'a> {
    node: NodeRef,
    changed: bool,
    /// Refs found strictly below `node`.
    below: RefSet<'a>,
    /// `node`'s own `ref` when it is a material.
    own_ref: Option<&'a str>,
}

impl<'a> Optimized<'a> {
    fn unchanged(node: &NodeRef) -> Self {
        Self {
            node: Arc::clone(node),
            changed: false,
            below: RefSet::default(),
            own_ref: None,
        }
    }
}

enum Owner<'a> {
    Root,
    Node(&'a NodeRef),
}

/// One pending post-order visit on the work stack.
struct Visit<'a> {
    owner: Owner<'a>,
    children: &'a [NodeRef],
    next: usize,
    done: SmallVec<[Optimized<'a>; 4]>,
}

impl<'a> Visit<'a> {
    fn new(owner: Owner<'a>, children: &'a [NodeRef]) -> Self {
        Self {
            owner,
            children,
            next: 0,
            done: SmallVec::with_capacity(children.len()),
        }
    }
}

/// Optimized child list of one node.
struct ChildList<'a> {
    nodes: Vec<NodeRef>,
    /// Refs of every node in the children's subtrees, the children themselves included.
    refs: RefSet<'a>,
    changed: bool,
}

impl<'a> ChildList<'a> {
    fn collect(done: SmallVec<[Optimized<'a>; 4]>) -> Self {
        let mut nodes = Vec::with_capacity(done.len());
        let mut refs = RefSet::default();
        let mut changed = false;
        for c in done {
            changed |= c.changed;
            if let Some(r) = c.own_ref {
                refs.insert(r);
            }
            refs.absorb(c.below);
            nodes.push(c.node);
        }
        Self {
            nodes,
            refs,
            changed,
        }
    }
}

pub(crate) struct Optimizer<'o> {
    opts: &'o OptimizeOpts,
    pub(crate) stats: OptimizeStats,
}

impl<'o> Optimizer<'o> {
    pub(crate) fn new(opts: &'o OptimizeOpts) -> Self {
        Self {
            opts,
            stats: OptimizeStats::default(),
        }
    }

    /// Post-order rewrite of the whole tree.
    ///
    /// Uses an explicit work stack, so nesting depth is bounded by memory rather than by the
    /// thread's call stack.
    pub(crate) fn run(&mut self, root: &Arc<RootMaterial>) -> Arc<RootMaterial> {
        let mut stack: Vec<Visit<'_>> = vec![Visit::new(Owner::Root, &root.children)];

        while let Some(top) = stack.last_mut() {
            let children = top.children;
            if let Some(child) = children.get(top.next) {
                top.next += 1;
                if child.is_leaf() {
                    top.done.push(Optimized::unchanged(child));
                } else {
                    stack.push(Visit::new(Owner::Node(child), child.children()));
                }
                continue;
            }

            let Some(visit) = stack.pop() else {
                break;
            };
            match visit.owner {
                Owner::Root => return self.finish_root(root, visit.done),
                Owner::Node(node) => {
                    let out = self.finish_node(node, visit.done);
                    if let Some(parent) = stack.last_mut() {
                        parent.done.push(out);
                    }
                }
            }
        }

        Arc::clone(root)
    }

    fn finish_root(
        &mut self,
        root: &Arc<RootMaterial>,
        done: SmallVec<[Optimized<'_>; 4]>,
    ) -> Arc<RootMaterial> {
        self.stats.nodes_visited += 1;
        let mut kids = ChildList::collect(done);
        if self.opts.remove_identity_transforms && self.splice_identities(&mut kids.nodes) {
            kids.changed = true;
        }
        if !kids.changed {
            return Arc::clone(root);
        }
        Arc::new(RootMaterial {
            fill: root.fill.clone(),
            stroke: root.stroke.clone(),
            stroke_width: root.stroke_width,
            children: kids.nodes,
        })
    }

    fn finish_node<'a>(
        &mut self,
        node: &'a NodeRef,
        done: SmallVec<[Optimized<'a>; 4]>,
    ) -> Optimized<'a> {
        self.stats.nodes_visited += 1;
        match node.as_ref() {
            FrameNode::Transform(t) => self.finish_transform(node, t, done),
            FrameNode::Material(m) => self.finish_material(node, m, done),
            FrameNode::Circle(_)
            | FrameNode::Line(_)
            | FrameNode::Rectangle(_)
            | FrameNode::Image(_) => Optimized::unchanged(node),
        }
    }

    fn finish_transform<'a>(
        &mut self,
        node: &'a NodeRef,
        t: &'a TransformNode,
        done: SmallVec<[Optimized<'a>; 4]>,
    ) -> Optimized<'a> {
        let mut kids = ChildList::collect(done);
        let mut matrix = t.matrix;

        if self.opts.merge_transforms && self.merge_chain(&mut matrix, &mut kids.nodes) {
            kids.changed = true;
        }
        if self.opts.remove_identity_transforms && self.splice_identities(&mut kids.nodes) {
            kids.changed = true;
            // Splicing an empty identity sibling away can leave a lone transform child.
            if self.opts.merge_transforms {
                self.merge_chain(&mut matrix, &mut kids.nodes);
            }
        }

        let out = if kids.changed {
            FrameNode::Transform(TransformNode {
                matrix,
                children: kids.nodes,
            })
            .into_ref()
        } else {
            Arc::clone(node)
        };
        Optimized {
            node: out,
            changed: kids.changed,
            below: kids.refs,
            own_ref: None,
        }
    }

    fn finish_material<'a>(
        &mut self,
        node: &'a NodeRef,
        m: &'a MaterialNode,
        done: SmallVec<[Optimized<'a>; 4]>,
    ) -> Optimized<'a> {
        let mut kids = ChildList::collect(done);

        if self.opts.squash_materials
            && let Some(squashed) = self.try_squash(m, &mut kids)
        {
            return squashed;
        }

        if self.opts.remove_identity_transforms && self.splice_identities(&mut kids.nodes) {
            kids.changed = true;
            // `M > Identity > C(ref = M)` only becomes squashable once the identity is gone.
            if self.opts.squash_materials
                && let Some(squashed) = self.try_squash(m, &mut kids)
            {
                return squashed;
            }
        }

        let out = if kids.changed {
            FrameNode::Material(MaterialNode {
                id: m.id.clone(),
                ref_id: m.ref_id.clone(),
                fill: m.fill.clone(),
                stroke: m.stroke.clone(),
                stroke_width: m.stroke_width,
                children: kids.nodes,
            })
            .into_ref()
        } else {
            Arc::clone(node)
        };
        Optimized {
            node: out,
            changed: kids.changed,
            below: kids.refs,
            own_ref: Some(m.ref_id.as_str()),
        }
    }

    /// Fold a chain of single-child transforms into `matrix`. Never crosses a material or a
    /// multi-child transform.
    fn merge_chain(&mut self, matrix: &mut Affine, children: &mut Vec<NodeRef>) -> bool {
        let mut merged = false;
        while let [only] = children.as_slice() {
            let FrameNode::Transform(inner) = only.as_ref() else {
                break;
            };
            *matrix = affine::compose(*matrix, inner.matrix);
            let next = inner.children.clone();
            *children = next;
            self.stats.transforms_merged += 1;
            merged = true;
        }
        merged
    }

    /// Squash `m` with its only child `c` when `c.ref == m.id` and nothing below `c` refers to
    /// `m`.
    ///
    /// `kids.refs` holds every ref in the child list including `c`'s own, which is `m.id`, so the
    /// squash is safe exactly when `m.id` occurs there once.
    fn try_squash<'a>(
        &mut self,
        m: &'a MaterialNode,
        kids: &mut ChildList<'a>,
    ) -> Option<Optimized<'a>> {
        let [only] = kids.nodes.as_slice() else {
            return None;
        };
        let FrameNode::Material(c) = only.as_ref() else {
            return None;
        };
        if c.ref_id != m.id || kids.refs.count(&m.id) != 1 {
            return None;
        }

        let style = m.style().overlay(&c.style());
        let squashed = FrameNode::Material(MaterialNode {
            id: c.id.clone(),
            ref_id: m.ref_id.clone(),
            fill: style.fill,
            stroke: style.stroke,
            stroke_width: style.stroke_width,
            children: c.children.clone(),
        })
        .into_ref();
        self.stats.materials_squashed += 1;

        let mut below = std::mem::take(&mut kids.refs);
        below.remove_one(&m.id);
        Some(Optimized {
            node: squashed,
            changed: true,
            below,
            own_ref: Some(m.ref_id.as_str()),
        })
    }

    /// Replace every exact-identity transform in `children` by its own children, in place.
    fn splice_identities(&mut self, children: &mut Vec<NodeRef>) -> bool {
        if !children.iter().any(|c| is_identity_transform(c)) {
            return false;
        }
        let mut out = Vec::with_capacity(children.len());
        for c in children.drain(..) {
            let spliced = match c.as_ref() {
                FrameNode::Transform(t) if affine::is_identity(t.matrix) => {
                    Some(t.children.clone())
                }
                _ => None,
            };
            match spliced {
                Some(grandchildren) => {
                    self.stats.identity_transforms_removed += 1;
                    out.extend(grandchildren);
                }
                None => out.push(c),
            }
        }
        *children = out;
        true
    }
}

fn is_identity_transform(node: &FrameNode) -> bool {
    matches!(node, FrameNode::Transform(t) if affine::is_identity(t.matrix))
}

#[cfg(test)]
#[path = "../../tests/unit/optimize/pass.rs"]
mod tests;
