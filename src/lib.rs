//! frameir: the Frame IR and its optimizer.
//!
//! A declarative 2D scene is lowered to a tree-shaped intermediate representation (a [`Frame`])
//! before any renderer sees it. This crate owns that IR and the pass that simplifies it.
//!
//! # Pipeline overview
//!
//! 1. **Generate** (upstream): scene graph or drawing API -> [`Frame`]
//! 2. **Validate** (external): structural checks, see [`FrameValidator`]
//! 3. **Optimize**: [`optimize_frame`] merges transform chains, squashes redundant materials and
//!    drops identity transforms without changing what gets drawn
//! 4. **Render** (downstream): walk the optimized frame
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Pure**: the optimizer never mutates its input and keeps no state between calls.
//! - **Structural sharing**: unchanged subtrees come back as the same [`NodeRef`], so input and
//!   output frames may alias; treat both as immutable.
//! - **Idempotent**: optimizing an optimized frame is a no-op.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod ir;
mod optimize;
mod pipeline;

/// Affine matrix helpers shared by the optimizer and renderers.
pub mod transform;

pub use foundation::core::{Affine, Color, Point};
pub use foundation::error::{FrameIrError, FrameIrResult};
pub use foundation::ids::MaterialIdGen;
pub use ir::dsl::{
    FrameBuilder, circle, image, line, material_with_id, rectangle, transform, translate,
};
pub use ir::model::{
    Circle, Frame, FrameNode, Image, Line, MaterialNode, MaterialStyle, NodeRef, Rectangle,
    RootMaterial, ScaleMode, TransformNode, Viewport,
};
pub use ir::style::{
    LeafInstance, MaterialIndex, ResolvedStyle, collect_leaves, count_nodes, resolve_leaf_styles,
};
pub use optimize::opts::{OptimizeOpts, OptimizeStats};
pub use optimize::{optimize_frame, optimize_frame_default, optimize_frame_with_stats};
pub use pipeline::{FramePipeline, FrameValidator, optimize_frame_json};
