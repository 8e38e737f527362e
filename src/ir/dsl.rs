use std::sync::Arc;

use crate::foundation::core::{Affine, Color, Point};
use crate::foundation::ids::MaterialIdGen;
use crate::ir::model::{
    Circle, Frame, FrameNode, Image, Line, MaterialNode, MaterialStyle, NodeRef, Rectangle,
    RootMaterial, TransformNode, Viewport,
};

/// Builder for [`Frame`](crate::Frame) values.
///
/// Material ids come from the builder's own [`MaterialIdGen`], so frames built in parallel (or
/// rebuilt every tick) get deterministic, non-colliding ids.
pub struct FrameBuilder {
    viewport: Viewport,
    background: Option<Color>,
    fill: Color,
    stroke: Color,
    stroke_width: f64,
    ids: MaterialIdGen,
}

impl FrameBuilder {
    /// Create a builder with black fill/stroke and a 1.0 stroke width at the root.
    pub fn new(viewport: Viewport) -> Self {
        Self::with_id_gen(viewport, MaterialIdGen::default())
    }

    /// Create a builder drawing material ids from `ids`.
    pub fn with_id_gen(viewport: Viewport, ids: MaterialIdGen) -> Self {
        Self {
            viewport,
            background: None,
            fill: Color::from("black"),
            stroke: Color::from("black"),
            stroke_width: 1.0,
            ids,
        }
    }

    /// Set the frame background.
    pub fn background(mut self, c: impl Into<Color>) -> Self {
        self.background = Some(c.into());
        self
    }

    /// Set the concrete root style.
    pub fn root_style(
        mut self,
        fill: impl Into<Color>,
        stroke: impl Into<Color>,
        width: f64,
    ) -> Self {
        self.fill = fill.into();
        self.stroke = stroke.into();
        self.stroke_width = width;
        self
    }

    /// Allocate a fresh material id.
    pub fn next_material_id(&mut self) -> String {
        self.ids.next_id()
    }

    /// Build a material with a generated id inheriting from `parent`.
    ///
    /// `children` receives the builder and the new material's id, so nested materials can
    /// reference it.
    pub fn material(
        &mut self,
        parent: &str,
        style: MaterialStyle,
        children: impl FnOnce(&mut Self, &str) -> Vec<NodeRef>,
    ) -> NodeRef {
        let id = self.next_material_id();
        let children = children(self, id.as_str());
        material_with_id(id, parent, style, children)
    }

    /// Finish the frame with the given root children.
    pub fn build(self, children: Vec<NodeRef>) -> Frame {
        Frame {
            viewport: self.viewport,
            background: self.background,
            root: Arc::new(RootMaterial {
                fill: self.fill,
                stroke: self.stroke,
                stroke_width: self.stroke_width,
                children,
            }),
        }
    }
}

/// Material with an explicit id.
pub fn material_with_id(
    id: impl Into<String>,
    parent: impl Into<String>,
    style: MaterialStyle,
    children: Vec<NodeRef>,
) -> NodeRef {
    FrameNode::Material(MaterialNode {
        id: id.into(),
        ref_id: parent.into(),
        fill: style.fill,
        stroke: style.stroke,
        stroke_width: style.stroke_width,
        children,
    })
    .into_ref()
}

/// Transform group.
pub fn transform(matrix: Affine, children: Vec<NodeRef>) -> NodeRef {
    FrameNode::Transform(TransformNode { matrix, children }).into_ref()
}

/// Translation-only transform group.
pub fn translate(x: f64, y: f64, children: Vec<NodeRef>) -> NodeRef {
    transform(Affine::translate((x, y)), children)
}

/// Circle leaf.
pub fn circle(cx: f64, cy: f64, radius: f64) -> NodeRef {
    FrameNode::Circle(Circle {
        center: Point::new(cx, cy),
        radius,
    })
    .into_ref()
}

/// Line leaf.
pub fn line(start: impl Into<Point>, end: impl Into<Point>) -> NodeRef {
    FrameNode::Line(Line {
        start: start.into(),
        end: end.into(),
    })
    .into_ref()
}

/// Rectangle leaf.
pub fn rectangle(cx: f64, cy: f64, width: f64, height: f64) -> NodeRef {
    FrameNode::Rectangle(Rectangle {
        center: Point::new(cx, cy),
        width,
        height,
    })
    .into_ref()
}

/// Image leaf.
pub fn image(
    url: impl Into<String>,
    position: impl Into<Point>,
    width: f64,
    height: f64,
) -> NodeRef {
    FrameNode::Image(Image {
        url: url.into(),
        position: position.into(),
        width,
        height,
    })
    .into_ref()
}

#[cfg(test)]
#[path = "../../tests/unit/ir/dsl.rs"]
mod tests;
