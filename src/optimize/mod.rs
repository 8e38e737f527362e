//! Frame IR optimizer.
//!
//! A pure, bottom-up rewrite of a [`Frame`] that keeps its rendered meaning. Three independent
//! rules run at every node, in this order, after the node's children have been optimized:
//!
//! 1. **Transform merge**: `Transform(A) > Transform(B) > ...` with `B` the only child becomes
//!    `Transform(A * B) > ...`. Chains collapse fully; merging never crosses a material or a
//!    transform with several children.
//! 2. **Material squash**: a material `M` whose only child is a material `C` with
//!    `C.ref == M.id` becomes one material (`C`'s id, `M`'s ref, `M`'s style overridden by `C`'s)
//!    unless something below `C` still refers to `M`.
//! 3. **Identity removal**: transforms whose matrix is exactly `[1, 0, 0, 1, 0, 0]` are replaced
//!    by their children, in place.
//!
//! If identity removal changes a node's child list, rules 1 and 2 get one more chance at that
//! node, so a single call always reaches a fixed point: optimizing the output again is a no-op.
//!
//! Subtrees where nothing fires are returned as the very same [`NodeRef`](crate::NodeRef); the
//! output frame therefore shares storage with its input.

pub(crate) mod opts;
pub(crate) mod pass;
pub(crate) mod refs;

use crate::ir::model::Frame;
use crate::optimize::opts::{OptimizeOpts, OptimizeStats};
use crate::optimize::pass::Optimizer;

/// Optimize `frame` with `opts`.
///
/// The input is never modified. When no rule fires anywhere, the returned frame's root is the
/// same `Arc` as the input's.
pub fn optimize_frame(frame: &Frame, opts: &OptimizeOpts) -> Frame {
    optimize_frame_with_stats(frame, opts).0
}

/// Optimize `frame` with every rule enabled.
pub fn optimize_frame_default(frame: &Frame) -> Frame {
    optimize_frame(frame, &OptimizeOpts::default())
}

/// Optimize `frame` and report what was rewritten.
#[tracing::instrument(skip(frame))]
pub fn optimize_frame_with_stats(frame: &Frame, opts: &OptimizeOpts) -> (Frame, OptimizeStats) {
    let mut optimizer = Optimizer::new(opts);
    let root = optimizer.run(&frame.root);
    let stats = optimizer.stats;
    tracing::debug!(
        nodes_visited = stats.nodes_visited,
        transforms_merged = stats.transforms_merged,
        materials_squashed = stats.materials_squashed,
        identity_transforms_removed = stats.identity_transforms_removed,
        "frame optimized"
    );
    (
        Frame {
            viewport: frame.viewport,
            background: frame.background.clone(),
            root,
        },
        stats,
    )
}

impl Frame {
    /// Shorthand for [`optimize_frame`].
    pub fn optimized(&self, opts: &OptimizeOpts) -> Frame {
        optimize_frame(self, opts)
    }
}
