use super::*;
use crate::ir::dsl::{FrameBuilder, circle, material_with_id, rectangle, transform, translate};
use crate::ir::model::{Frame, MaterialStyle, Viewport};
use crate::optimize::{optimize_frame, optimize_frame_with_stats};
use crate::transform::affine::{from_coeffs, identity, to_coeffs};

fn frame(children: Vec<NodeRef>) -> Frame {
    FrameBuilder::new(Viewport::new(160.0, 90.0))
        .root_style("black", "white", 1.0)
        .build(children)
}

fn opt(f: &Frame) -> Frame {
    optimize_frame(f, &OptimizeOpts::default())
}

fn scale(s: f64, children: Vec<NodeRef>) -> NodeRef {
    transform(from_coeffs([s, 0.0, 0.0, s, 0.0, 0.0]), children)
}

fn ident(children: Vec<NodeRef>) -> NodeRef {
    transform(identity(), children)
}

fn mat(id: &str, parent: &str, style: MaterialStyle, children: Vec<NodeRef>) -> NodeRef {
    material_with_id(id, parent, style, children)
}

fn as_transform(n: &NodeRef) -> &TransformNode {
    match n.as_ref() {
        FrameNode::Transform(t) => t,
        other => panic!("expected transform, got {}", other.kind_name()),
    }
}

fn as_material(n: &NodeRef) -> &MaterialNode {
    match n.as_ref() {
        FrameNode::Material(m) => m,
        other => panic!("expected material, got {}", other.kind_name()),
    }
}

fn assert_fixed_point(once: &Frame) {
    let twice = opt(once);
    assert_eq!(&twice, once);
    assert!(Arc::ptr_eq(&twice.root, &once.root));
}

#[test]
fn translate_then_scale_merges_into_one_transform() {
    let c = circle(0.0, 0.0, 5.0);
    let f = frame(vec![translate(10.0, 20.0, vec![scale(2.0, vec![c.clone()])])]);

    let out = opt(&f);
    assert_eq!(out.root.children.len(), 1);
    let t = as_transform(&out.root.children[0]);
    assert_eq!(to_coeffs(t.matrix), [2.0, 0.0, 0.0, 2.0, 10.0, 20.0]);
    assert_eq!(t.children.len(), 1);
    assert!(Arc::ptr_eq(&t.children[0], &c));
    assert_fixed_point(&out);
}

#[test]
fn transform_chain_collapses_fully() {
    let mut node = circle(1.0, 1.0, 1.0);
    for i in 0..6 {
        node = translate(f64::from(i), 0.0, vec![node]);
    }
    let (out, stats) = optimize_frame_with_stats(&frame(vec![node]), &OptimizeOpts::default());

    let t = as_transform(&out.root.children[0]);
    assert_eq!(to_coeffs(t.matrix), [1.0, 0.0, 0.0, 1.0, 15.0, 0.0]);
    assert!(t.children[0].is_leaf());
    assert_eq!(stats.transforms_merged, 5);
}

#[test]
fn merge_does_not_cross_materials() {
    let f = frame(vec![translate(
        1.0,
        0.0,
        vec![mat(
            "m1",
            "root",
            MaterialStyle::inherit().fill("red"),
            vec![scale(2.0, vec![circle(0.0, 0.0, 1.0)])],
        )],
    )]);
    let out = opt(&f);
    assert!(Arc::ptr_eq(&out.root, &f.root));
}

#[test]
fn merge_does_not_apply_to_multi_child_transforms() {
    let f = frame(vec![translate(
        1.0,
        0.0,
        vec![scale(2.0, vec![circle(0.0, 0.0, 1.0)]), circle(3.0, 3.0, 1.0)],
    )]);
    let out = opt(&f);
    assert!(Arc::ptr_eq(&out.root, &f.root));
}

#[test]
fn material_pair_squashes_with_child_winning() {
    let c = circle(0.0, 0.0, 2.0);
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red").stroke("green"),
        vec![mat("m2", "m1", MaterialStyle::inherit().fill("blue"), vec![c.clone()])],
    )]);

    let (out, stats) = optimize_frame_with_stats(&f, &OptimizeOpts::default());
    assert_eq!(stats.materials_squashed, 1);
    let m = as_material(&out.root.children[0]);
    assert_eq!(m.id, "m2");
    assert_eq!(m.ref_id, "root");
    assert_eq!(m.fill.as_ref().map(|c| c.as_str()), Some("blue"));
    assert_eq!(m.stroke.as_ref().map(|c| c.as_str()), Some("green"));
    assert_eq!(m.stroke_width, None);
    assert!(Arc::ptr_eq(&m.children[0], &c));
    assert_fixed_point(&out);
}

#[test]
fn squash_is_blocked_when_a_deeper_node_refs_the_parent() {
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red"),
        vec![mat(
            "m2",
            "m1",
            MaterialStyle::inherit(),
            vec![mat(
                "m3",
                "m1",
                MaterialStyle::inherit(),
                vec![circle(0.0, 0.0, 1.0)],
            )],
        )],
    )]);
    let out = opt(&f);
    assert!(Arc::ptr_eq(&out.root, &f.root));
}

#[test]
fn squash_is_blocked_by_a_ref_hidden_below_a_transform() {
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red"),
        vec![mat(
            "m2",
            "m1",
            MaterialStyle::inherit().fill("blue"),
            vec![
                circle(0.0, 0.0, 1.0),
                scale(
                    3.0,
                    vec![mat(
                        "m3",
                        "m1",
                        MaterialStyle::inherit(),
                        vec![circle(1.0, 1.0, 1.0)],
                    )],
                ),
            ],
        )],
    )]);
    let out = opt(&f);
    assert!(Arc::ptr_eq(&out.root, &f.root));
}

#[test]
fn material_chain_squashes_transitively() {
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red").stroke_width(4.0),
        vec![mat(
            "m2",
            "m1",
            MaterialStyle::inherit().stroke("navy"),
            vec![mat(
                "m3",
                "m2",
                MaterialStyle::inherit().fill("blue"),
                vec![rectangle(0.0, 0.0, 4.0, 2.0)],
            )],
        )],
    )]);

    let (out, stats) = optimize_frame_with_stats(&f, &OptimizeOpts::default());
    assert_eq!(stats.materials_squashed, 2);
    let m = as_material(&out.root.children[0]);
    assert_eq!(m.id, "m3");
    assert_eq!(m.ref_id, "root");
    assert_eq!(m.fill.as_ref().map(|c| c.as_str()), Some("blue"));
    assert_eq!(m.stroke.as_ref().map(|c| c.as_str()), Some("navy"));
    assert_eq!(m.stroke_width, Some(4.0));
    assert!(m.children[0].is_leaf());
}

#[test]
fn squash_requires_child_to_ref_the_parent() {
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red"),
        vec![mat(
            "m2",
            "root",
            MaterialStyle::inherit().fill("blue"),
            vec![circle(0.0, 0.0, 1.0)],
        )],
    )]);
    assert!(Arc::ptr_eq(&opt(&f).root, &f.root));
}

#[test]
fn squash_requires_a_single_child() {
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red"),
        vec![
            mat("m2", "m1", MaterialStyle::inherit(), vec![circle(0.0, 0.0, 1.0)]),
            circle(5.0, 5.0, 1.0),
        ],
    )]);
    assert!(Arc::ptr_eq(&opt(&f).root, &f.root));
}

#[test]
fn identity_transform_is_spliced_in_order() {
    let a = circle(0.0, 0.0, 1.0);
    let b = circle(2.0, 0.0, 1.0);
    let r = rectangle(0.0, 0.0, 3.0, 3.0);
    let f = frame(vec![ident(vec![a.clone(), b.clone(), r.clone()])]);

    let (out, stats) = optimize_frame_with_stats(&f, &OptimizeOpts::default());
    assert_eq!(stats.identity_transforms_removed, 1);
    let kids = &out.root.children;
    assert_eq!(kids.len(), 3);
    assert!(Arc::ptr_eq(&kids[0], &a));
    assert!(Arc::ptr_eq(&kids[1], &b));
    assert!(Arc::ptr_eq(&kids[2], &r));
}

#[test]
fn identity_between_siblings_keeps_position() {
    let first = circle(0.0, 0.0, 1.0);
    let last = circle(9.0, 9.0, 1.0);
    let f = frame(vec![
        first.clone(),
        ident(vec![circle(1.0, 0.0, 1.0), circle(2.0, 0.0, 1.0)]),
        last.clone(),
    ]);
    let out = opt(&f);
    let kids = &out.root.children;
    assert_eq!(kids.len(), 4);
    assert!(Arc::ptr_eq(&kids[0], &first));
    assert!(Arc::ptr_eq(&kids[3], &last));
}

#[test]
fn near_identity_is_preserved() {
    let f = frame(vec![transform(
        from_coeffs([1.0001, 0.0, 0.0, 1.0, 0.0, 0.0]),
        vec![circle(0.0, 0.0, 1.0)],
    )]);
    assert!(Arc::ptr_eq(&opt(&f).root, &f.root));
}

#[test]
fn cancelling_translations_merge_then_vanish() {
    let a = circle(0.0, 0.0, 1.0);
    let b = circle(1.0, 0.0, 1.0);
    let f = frame(vec![translate(
        10.0,
        -4.0,
        vec![translate(-10.0, 4.0, vec![a.clone(), b.clone()])],
    )]);
    let out = opt(&f);
    assert_eq!(out.root.children.len(), 2);
    assert!(Arc::ptr_eq(&out.root.children[0], &a));
    assert!(Arc::ptr_eq(&out.root.children[1], &b));
    assert_fixed_point(&out);
}

#[test]
fn removing_an_empty_identity_sibling_exposes_a_merge() {
    let c = circle(0.0, 0.0, 1.0);
    let f = frame(vec![scale(
        2.0,
        vec![translate(1.0, 1.0, vec![c.clone()]), ident(vec![])],
    )]);
    let out = opt(&f);
    let t = as_transform(&out.root.children[0]);
    assert_eq!(to_coeffs(t.matrix), [2.0, 0.0, 0.0, 2.0, 2.0, 2.0]);
    assert!(Arc::ptr_eq(&t.children[0], &c));
    assert_fixed_point(&out);
}

#[test]
fn removing_an_identity_between_materials_exposes_a_squash() {
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red"),
        vec![ident(vec![ident(vec![mat(
            "m2",
            "m1",
            MaterialStyle::inherit().stroke("blue"),
            vec![circle(0.0, 0.0, 1.0)],
        )])])],
    )]);

    let out = opt(&f);
    let m = as_material(&out.root.children[0]);
    assert_eq!(m.id, "m2");
    assert_eq!(m.ref_id, "root");
    assert_eq!(m.fill.as_ref().map(|c| c.as_str()), Some("red"));
    assert_eq!(m.stroke.as_ref().map(|c| c.as_str()), Some("blue"));
    assert_fixed_point(&out);
}

#[test]
fn transform_between_materials_blocks_squash() {
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red"),
        vec![translate(
            1.0,
            0.0,
            vec![scale(
                2.0,
                vec![mat(
                    "m2",
                    "m1",
                    MaterialStyle::inherit(),
                    vec![circle(0.0, 0.0, 1.0)],
                )],
            )],
        )],
    )]);

    let out = opt(&f);
    let m1 = as_material(&out.root.children[0]);
    assert_eq!(m1.id, "m1");
    let t = as_transform(&m1.children[0]);
    assert_eq!(to_coeffs(t.matrix), [2.0, 0.0, 0.0, 2.0, 1.0, 0.0]);
    assert_eq!(as_material(&t.children[0]).id, "m2");
    assert_fixed_point(&out);
}

#[test]
fn untouched_siblings_are_shared() {
    let keep = mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red"),
        vec![circle(0.0, 0.0, 1.0)],
    );
    let f = frame(vec![
        keep.clone(),
        translate(1.0, 1.0, vec![translate(2.0, 2.0, vec![circle(0.0, 0.0, 1.0)])]),
    ]);
    let out = opt(&f);
    assert!(!Arc::ptr_eq(&out.root, &f.root));
    assert!(Arc::ptr_eq(&out.root.children[0], &keep));
    assert!(Arc::ptr_eq(&f.root.children[0], &keep));
}

#[test]
fn disabling_every_rule_returns_input() {
    let f = frame(vec![
        translate(1.0, 0.0, vec![scale(2.0, vec![circle(0.0, 0.0, 1.0)])]),
        mat(
            "m1",
            "root",
            MaterialStyle::inherit().fill("red"),
            vec![mat("m2", "m1", MaterialStyle::inherit(), vec![circle(0.0, 0.0, 1.0)])],
        ),
        ident(vec![circle(0.0, 0.0, 1.0)]),
    ]);
    let (out, stats) = optimize_frame_with_stats(&f, &OptimizeOpts::none());
    assert!(Arc::ptr_eq(&out.root, &f.root));
    assert_eq!(out, f);
    assert_eq!(stats.rewrites(), 0);
}

#[test]
fn disabled_merge_still_removes_identities() {
    let c = circle(0.0, 0.0, 1.0);
    let f = frame(vec![translate(
        1.0,
        0.0,
        vec![ident(vec![scale(2.0, vec![c.clone()])])],
    )]);
    let opts = OptimizeOpts {
        merge_transforms: false,
        ..OptimizeOpts::default()
    };
    let out = optimize_frame(&f, &opts);
    let outer = as_transform(&out.root.children[0]);
    assert_eq!(to_coeffs(outer.matrix), [1.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
    let inner = as_transform(&outer.children[0]);
    assert_eq!(to_coeffs(inner.matrix), [2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
    assert!(Arc::ptr_eq(&inner.children[0], &c));

    let again = optimize_frame(&out, &opts);
    assert!(Arc::ptr_eq(&again.root, &out.root));
}

#[test]
fn disabled_identity_removal_keeps_identities_but_merges() {
    let f = frame(vec![
        ident(vec![circle(0.0, 0.0, 1.0), circle(1.0, 0.0, 1.0)]),
        translate(1.0, 0.0, vec![scale(2.0, vec![circle(0.0, 0.0, 1.0)])]),
    ]);
    let opts = OptimizeOpts {
        remove_identity_transforms: false,
        ..OptimizeOpts::default()
    };
    let out = optimize_frame(&f, &opts);
    assert_eq!(out.root.children.len(), 2);
    assert!(Arc::ptr_eq(&out.root.children[0], &f.root.children[0]));
    let merged = as_transform(&out.root.children[1]);
    assert_eq!(to_coeffs(merged.matrix), [2.0, 0.0, 0.0, 2.0, 1.0, 0.0]);
}

#[test]
fn disabled_squash_leaves_materials_but_removes_identities() {
    let f = frame(vec![mat(
        "m1",
        "root",
        MaterialStyle::inherit().fill("red"),
        vec![ident(vec![mat(
            "m2",
            "m1",
            MaterialStyle::inherit(),
            vec![circle(0.0, 0.0, 1.0)],
        )])],
    )]);
    let opts = OptimizeOpts {
        squash_materials: false,
        ..OptimizeOpts::default()
    };
    let out = optimize_frame(&f, &opts);
    let m1 = as_material(&out.root.children[0]);
    assert_eq!(m1.id, "m1");
    assert_eq!(as_material(&m1.children[0]).id, "m2");
}

#[test]
fn deep_nesting_does_not_exhaust_the_stack() {
    const DEPTH: usize = 1_000;

    let mut node = circle(0.0, 0.0, 1.0);
    for _ in 0..DEPTH {
        node = translate(1.0, 0.0, vec![node]);
    }
    let out = opt(&frame(vec![node]));
    let t = as_transform(&out.root.children[0]);
    assert_eq!(to_coeffs(t.matrix)[4], DEPTH as f64);

    let mut node = circle(0.0, 0.0, 1.0);
    for i in (0..DEPTH).rev() {
        let parent = if i == 0 {
            "root".to_string()
        } else {
            format!("m{}", i - 1)
        };
        node = mat(&format!("m{i}"), &parent, MaterialStyle::inherit(), vec![node]);
    }
    let (out, stats) = optimize_frame_with_stats(&frame(vec![node]), &OptimizeOpts::default());
    assert_eq!(stats.materials_squashed, (DEPTH - 1) as u64);
    let m = as_material(&out.root.children[0]);
    assert_eq!(m.id, format!("m{}", DEPTH - 1));
    assert_eq!(m.ref_id, "root");
}

#[test]
fn unchanged_deep_tree_is_shared_and_not_rebuilt() {
    let mut node = circle(0.0, 0.0, 1.0);
    for i in 0..500 {
        node = if i % 2 == 0 {
            mat(&format!("m{i}"), "root", MaterialStyle::inherit(), vec![node])
        } else {
            translate(1.0, 0.0, vec![node])
        };
    }
    let f = frame(vec![node]);
    let (out, stats) = optimize_frame_with_stats(&f, &OptimizeOpts::default());
    assert!(Arc::ptr_eq(&out.root, &f.root));
    assert_eq!(stats.nodes_visited, 501);
}

#[test]
fn frame_optimized_matches_free_function() {
    let f = frame(vec![translate(1.0, 2.0, vec![scale(2.0, vec![circle(0.0, 0.0, 1.0)])])]);
    assert_eq!(f.optimized(&OptimizeOpts::default()), opt(&f));
    assert!(Arc::ptr_eq(&f.optimized(&OptimizeOpts::none()).root, &f.root));
}
