use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Affine, Color, Point};
use crate::foundation::error::{FrameIrError, FrameIrResult};

/// Shared handle to an IR node.
///
/// Nodes are immutable once built. The optimizer hands back the same handle for every subtree it
/// leaves untouched, so an optimized frame may alias storage with its input.
pub type NodeRef = Arc<FrameNode>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One IR snapshot of a scene, handed from generator to optimizer to renderer.
pub struct Frame {
    /// Viewport descriptor (opaque to the optimizer).
    pub viewport: Viewport,
    /// Optional clear color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    /// The root material; every other node hangs below it.
    pub root: Arc<RootMaterial>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Logical viewport size and how it maps onto the output surface.
pub struct Viewport {
    /// Half of the logical viewport width.
    pub half_width: f64,
    /// Half of the logical viewport height.
    pub half_height: f64,
    /// Scaling policy applied by renderers.
    #[serde(default)]
    pub scale_mode: ScaleMode,
}

impl Viewport {
    /// Build a viewport with the default scale mode.
    pub fn new(half_width: f64, half_height: f64) -> Self {
        Self {
            half_width,
            half_height,
            scale_mode: ScaleMode::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Viewport scaling policy.
pub enum ScaleMode {
    /// Preserve aspect ratio, letterbox to fit.
    #[default]
    Fit,
    /// Preserve aspect ratio, crop to fill.
    Fill,
    /// Stretch both axes independently.
    Stretch,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RootMaterialDef", into = "RootMaterialDef")]
/// The single root of a frame's material hierarchy.
///
/// Its id is always [`RootMaterial::ID`] and all style fields are concrete; every inherited style
/// lookup bottoms out here.
pub struct RootMaterial {
    /// Root fill color.
    pub fill: Color,
    /// Root stroke color.
    pub stroke: Color,
    /// Root stroke width.
    pub stroke_width: f64,
    /// Ordered children.
    pub children: Vec<NodeRef>,
}

impl RootMaterial {
    /// Fixed id of the root material.
    pub const ID: &'static str = "root";

    /// Id of this material (always `"root"`).
    pub fn id(&self) -> &'static str {
        Self::ID
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum MaterialTag {
    #[serde(rename = "material")]
    Material,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootMaterialDef {
    #[serde(rename = "type")]
    tag: MaterialTag,
    id: String,
    fill: Color,
    stroke: Color,
    stroke_width: f64,
    #[serde(default)]
    children: Vec<NodeRef>,
}

impl TryFrom<RootMaterialDef> for RootMaterial {
    type Error = String;

    fn try_from(def: RootMaterialDef) -> Result<Self, Self::Error> {
        if def.id != RootMaterial::ID {
            return Err(format!(
                "root material id must be '{}', got '{}'",
                RootMaterial::ID,
                def.id
            ));
        }
        Ok(Self {
            fill: def.fill,
            stroke: def.stroke,
            stroke_width: def.stroke_width,
            children: def.children,
        })
    }
}

impl From<RootMaterial> for RootMaterialDef {
    fn from(root: RootMaterial) -> Self {
        Self {
            tag: MaterialTag::Material,
            id: RootMaterial::ID.to_owned(),
            fill: root.fill,
            stroke: root.stroke,
            stroke_width: root.stroke_width,
            children: root.children,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
/// A node below the root material.
pub enum FrameNode {
    /// Non-root material (style override inheriting through `ref`).
    Material(MaterialNode),
    /// Affine transform applied to its children.
    Transform(TransformNode),
    /// Circle leaf.
    Circle(Circle),
    /// Line segment leaf.
    Line(Line),
    /// Axis-aligned rectangle leaf.
    Rectangle(Rectangle),
    /// Image leaf.
    Image(Image),
}

impl FrameNode {
    /// Children of a composite node; empty for leaves.
    pub fn children(&self) -> &[NodeRef] {
        match self {
            Self::Material(m) => &m.children,
            Self::Transform(t) => &t.children,
            Self::Circle(_) | Self::Line(_) | Self::Rectangle(_) | Self::Image(_) => &[],
        }
    }

    /// Whether this node is a shape leaf.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Material(_) | Self::Transform(_))
    }

    /// Serialized `type` discriminant of this node.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Material(_) => "material",
            Self::Transform(_) => "transform",
            Self::Circle(_) => "circle",
            Self::Line(_) => "line",
            Self::Rectangle(_) => "rectangle",
            Self::Image(_) => "image",
        }
    }

    /// Wrap this node in a shared handle.
    pub fn into_ref(self) -> NodeRef {
        Arc::new(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Non-root material.
///
/// `ref_id` names the material this one inherits from. It is usually, but not necessarily, the
/// nearest enclosing material in the tree.
pub struct MaterialNode {
    /// Unique id within the frame.
    pub id: String,
    /// Id of the material inherited from.
    #[serde(rename = "ref")]
    pub ref_id: String,
    /// Fill override; `None` inherits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    /// Stroke override; `None` inherits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    /// Stroke width override; `None` inherits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Ordered children.
    #[serde(default)]
    pub children: Vec<NodeRef>,
}

impl MaterialNode {
    /// Style overrides carried by this material.
    pub fn style(&self) -> MaterialStyle {
        MaterialStyle {
            fill: self.fill.clone(),
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Optional style overrides of a material.
pub struct MaterialStyle {
    /// Fill override.
    pub fill: Option<Color>,
    /// Stroke override.
    pub stroke: Option<Color>,
    /// Stroke width override.
    pub stroke_width: Option<f64>,
}

impl MaterialStyle {
    /// Style that overrides nothing.
    pub fn inherit() -> Self {
        Self::default()
    }

    /// Set the fill override.
    pub fn fill(mut self, c: impl Into<Color>) -> Self {
        self.fill = Some(c.into());
        self
    }

    /// Set the stroke override.
    pub fn stroke(mut self, c: impl Into<Color>) -> Self {
        self.stroke = Some(c.into());
        self
    }

    /// Set the stroke width override.
    pub fn stroke_width(mut self, w: f64) -> Self {
        self.stroke_width = Some(w);
        self
    }

    /// `self` with every field `child` defines replaced by the child's value.
    pub fn overlay(&self, child: &MaterialStyle) -> MaterialStyle {
        MaterialStyle {
            fill: child.fill.clone().or_else(|| self.fill.clone()),
            stroke: child.stroke.clone().or_else(|| self.stroke.clone()),
            stroke_width: child.stroke_width.or(self.stroke_width),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Affine transform group.
pub struct TransformNode {
    /// `[a, b, c, d, e, f]` affine matrix.
    pub matrix: Affine,
    /// Ordered children.
    #[serde(default)]
    pub children: Vec<NodeRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Circle leaf.
pub struct Circle {
    /// Center point.
    pub center: Point,
    /// Radius.
    pub radius: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Line segment leaf.
pub struct Line {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Rectangle leaf, positioned by its center.
pub struct Rectangle {
    /// Center point.
    pub center: Point,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Image leaf. Loading the `url` is the renderer's business.
pub struct Image {
    /// Image source URL.
    pub url: String,
    /// Position of the image.
    pub position: Point,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Frame {
    /// Build a frame without a background.
    pub fn new(viewport: Viewport, root: RootMaterial) -> Self {
        Self {
            viewport,
            background: None,
            root: Arc::new(root),
        }
    }

    /// Set the background color.
    pub fn with_background(mut self, c: impl Into<Color>) -> Self {
        self.background = Some(c.into());
        self
    }

    /// Parse a frame from a JSON string.
    ///
    /// Nesting depth is not limited by serde_json's recursion guard.
    pub fn from_json_str(s: &str) -> FrameIrResult<Self> {
        parse_frame(serde_json::Deserializer::from_str(s))
    }

    /// Parse a frame from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FrameIrResult<Self> {
        parse_frame(serde_json::Deserializer::from_reader(r))
    }

    /// Parse a frame from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FrameIrResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FrameIrError::Other(anyhow::anyhow!("open frame JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize to compact JSON.
    pub fn to_json_string(&self) -> FrameIrResult<String> {
        serde_json::to_string(self)
            .map_err(|e| FrameIrError::serde(format!("write frame JSON: {e}")))
    }

    /// Serialize to indented JSON.
    pub fn to_json_string_pretty(&self) -> FrameIrResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FrameIrError::serde(format!("write frame JSON: {e}")))
    }
}

/// Deep frames nest two JSON levels per node (object plus `children` array), so the default
/// recursion limit is lifted and the stack grows on demand instead.
fn parse_frame<'de, R: serde_json::de::Read<'de>>(
    mut de: serde_json::Deserializer<R>,
) -> FrameIrResult<Frame> {
    de.disable_recursion_limit();
    let frame = Frame::deserialize(serde_stacker::Deserializer::new(&mut de))
        .map_err(|e| FrameIrError::serde(format!("parse frame JSON: {e}")))?;
    de.end().map_err(|e| FrameIrError::serde(format!("parse frame JSON: {e}")))?;
    Ok(frame)
}

#[cfg(test)]
#[path = "../../tests/unit/ir/model.rs"]
mod tests;
