//! Integration tests: wiring, unwiring, cascades, and facade tracing.

use lantern_core::{OutputId, Rgb, Signal, SpaceId, ValidationError};
use lantern_graph::SceneError;
use lantern_store::{EdgeSink, EdgeSource};
use lantern_test_utils::{
    TestScene, CLASS_CONSTANT, CLASS_COUNTER, CLASS_FLOAT_SUM, CLASS_MIXER, CLASS_PASS,
};

fn stage(t: &mut TestScene) -> SpaceId {
    let p = t.scene.create_partition("Stage").unwrap();
    t.scene.store().partitions.get(p).unwrap().space
}

fn rejected(result: Result<impl std::fmt::Debug, SceneError>) -> ValidationError {
    match result {
        Err(SceneError::Validation(e)) => e,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

// ── Wire and unwire ─────────────────────────────────────────────

#[test]
fn wire_then_unwire_restores_disconnected_state() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let a = t.add(space, CLASS_CONSTANT);
    let b = t.add(space, CLASS_PASS);
    let (out, inp) = (t.output(a, 0), t.input(b, 0));

    let edge = t
        .scene
        .wire(EdgeSource::Output(out), EdgeSink::Input(inp))
        .unwrap();
    assert_eq!(t.scene.connection_of(inp), Some(out));
    assert_eq!(t.scene.store().edges.len(), 1);

    t.scene.unwire(edge).unwrap();
    assert_eq!(t.scene.connection_of(inp), None);
    assert!(t.scene.store().edges.is_empty());

    t.scene
        .wire(EdgeSource::Output(out), EdgeSink::Input(inp))
        .unwrap();
    assert_eq!(t.scene.connection_of(inp), Some(out));
}

#[test]
fn second_wire_into_input_is_rejected() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let a = t.add(space, CLASS_CONSTANT);
    let c = t.add(space, CLASS_CONSTANT);
    let b = t.add(space, CLASS_PASS);
    let inp = t.input(b, 0);
    t.scene
        .wire(EdgeSource::Output(t.output(a, 0)), EdgeSink::Input(inp))
        .unwrap();

    let err = rejected(
        t.scene
            .wire(EdgeSource::Output(t.output(c, 0)), EdgeSink::Input(inp)),
    );
    assert!(matches!(err, ValidationError::AlreadyConnected { .. }));
    assert_eq!(t.scene.connection_of(inp), Some(t.output(a, 0)));
    assert_eq!(t.scene.store().edges.len(), 1);
}

#[test]
fn mismatched_types_are_rejected() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let k = t.add(space, CLASS_COUNTER);
    let b = t.add(space, CLASS_PASS);
    let err = rejected(
        t.scene
            .wire(EdgeSource::Output(t.output(k, 0)), EdgeSink::Input(t.input(b, 0))),
    );
    assert!(matches!(err, ValidationError::TypeMismatch { .. }));
    assert!(t.scene.store().edges.is_empty());
}

#[test]
fn wires_across_spaces_are_rejected() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let child = t.scene.add_space(space, "Child").unwrap();
    let a = t.add(space, CLASS_CONSTANT);
    let b = t.add(child, CLASS_PASS);
    let err = rejected(
        t.scene
            .wire(EdgeSource::Output(t.output(a, 0)), EdgeSink::Input(t.input(b, 0))),
    );
    assert!(matches!(err, ValidationError::CrossScope { .. }));
}

#[test]
fn facade_interior_to_interior_is_rejected() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let child = t.scene.add_space(space, "Child").unwrap();
    let fi = t.scene.add_facade_input(child, "In").unwrap();
    let fo = t.scene.add_facade_output(child, "Out").unwrap();
    let err = rejected(t.scene.wire(EdgeSource::FacadeIn(fi), EdgeSink::FacadeOut(fo)));
    assert_eq!(err, ValidationError::BothFacadeInterior);
}

#[test]
fn removing_a_source_node_unwires_its_edges() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let a = t.add(space, CLASS_CONSTANT);
    let b = t.add(space, CLASS_MIXER);
    let out = t.output(a, 0);
    t.scene
        .wire(EdgeSource::Output(out), EdgeSink::Input(t.input(b, 0)))
        .unwrap();
    t.scene
        .wire(EdgeSource::Output(out), EdgeSink::Input(t.input(b, 1)))
        .unwrap();

    t.scene.remove_instance(a).unwrap();
    assert!(t.scene.store().edges.is_empty());
    assert!(!t.scene.store().outputs.contains(out));
    assert_eq!(t.scene.connection_of(t.input(b, 0)), None);
    assert_eq!(t.scene.connection_of(t.input(b, 1)), None);
    assert_eq!(t.scene.live_nodes(), 1);
}

#[test]
fn unknown_edge_is_rejected() {
    let mut t = TestScene::new();
    let err = rejected(t.scene.unwire(lantern_core::EdgeId(99)));
    assert!(matches!(err, ValidationError::UnknownEdge { .. }));
}

// ── Evaluation ──────────────────────────────────────────────────

#[test]
fn shared_source_computes_once_per_frame() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let k = t.add(space, CLASS_COUNTER);
    let s = t.add(space, CLASS_FLOAT_SUM);
    let out = t.output(k, 0);
    t.scene
        .wire(EdgeSource::Output(out), EdgeSink::Input(t.input(s, 0)))
        .unwrap();
    t.scene
        .wire(EdgeSource::Output(out), EdgeSink::Input(t.input(s, 1)))
        .unwrap();
    let sum = t.output(s, 0);

    t.scene.advance_frame();
    assert_eq!(t.scene.evaluate(sum), Signal::Float(2.0));
    assert_eq!(t.scene.evaluate(sum), Signal::Float(2.0));
    assert_eq!(t.compute_calls(), 1);

    t.scene.advance_frame();
    assert_eq!(t.scene.evaluate(sum), Signal::Float(4.0));
    assert_eq!(t.compute_calls(), 2);
}

#[test]
fn pass_through_loop_terminates() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let a = t.add(space, CLASS_PASS);
    let b = t.add(space, CLASS_PASS);
    t.scene
        .wire(EdgeSource::Output(t.output(a, 0)), EdgeSink::Input(t.input(b, 0)))
        .unwrap();
    t.scene
        .wire(EdgeSource::Output(t.output(b, 0)), EdgeSink::Input(t.input(a, 0)))
        .unwrap();

    for _ in 0..3 {
        t.scene.advance_frame();
        assert_eq!(t.scene.evaluate(t.output(a, 0)), Signal::Empty);
        assert_eq!(t.scene.evaluate(t.output(b, 0)), Signal::Empty);
    }
}

#[test]
fn feedback_loop_reads_previous_frame() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let k = t.add(space, CLASS_CONSTANT);
    let m = t.add(space, CLASS_MIXER);
    let p = t.add(space, CLASS_PASS);
    t.set_constant(k, [1.0, 0.0, 0.0]);
    t.scene
        .wire(EdgeSource::Output(t.output(k, 0)), EdgeSink::Input(t.input(m, 0)))
        .unwrap();
    t.scene
        .wire(EdgeSource::Output(t.output(p, 0)), EdgeSink::Input(t.input(m, 1)))
        .unwrap();
    t.scene
        .wire(EdgeSource::Output(t.output(m, 0)), EdgeSink::Input(t.input(p, 0)))
        .unwrap();
    let (mix, pass) = (t.output(m, 0), t.output(p, 0));

    // The mixer sees its own output from the previous frame through the
    // pass-through, so it converges on red by halves.
    t.scene.advance_frame();
    assert_eq!(t.scene.evaluate(mix), Signal::Rgb(Rgb::new(0.5, 0.0, 0.0)));
    assert_eq!(t.scene.evaluate(pass), Signal::Empty);

    t.scene.advance_frame();
    assert_eq!(t.scene.evaluate(mix), Signal::Rgb(Rgb::new(0.75, 0.0, 0.0)));
    assert_eq!(t.scene.evaluate(pass), Signal::Rgb(Rgb::new(0.5, 0.0, 0.0)));

    t.scene.advance_frame();
    assert_eq!(t.scene.evaluate(mix), Signal::Rgb(Rgb::new(0.875, 0.0, 0.0)));
}

#[test]
fn disconnected_input_reads_empty() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let b = t.add(space, CLASS_PASS);
    t.scene.advance_frame();
    assert_eq!(t.scene.evaluate(t.output(b, 0)), Signal::Empty);
}

#[test]
fn plugin_request_reaches_instance_payload() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let a = t.add(space, CLASS_CONSTANT);
    let b = t.add(space, CLASS_PASS);
    t.scene
        .wire(EdgeSource::Output(t.output(a, 0)), EdgeSink::Input(t.input(b, 0)))
        .unwrap();
    t.set_constant(a, [0.25, 0.5, 1.0]);
    t.scene.advance_frame();
    assert_eq!(
        t.scene.evaluate(t.output(b, 0)),
        Signal::Rgb(Rgb::new(0.25, 0.5, 1.0))
    );
}

// ── Facades ─────────────────────────────────────────────────────

/// Nest `depth` spaces under a partition space, put a constant at the
/// bottom, and export it outward one facade output per level.
fn nested_export(t: &mut TestScene, depth: usize) -> (SpaceId, lantern_core::NodeId, OutputId) {
    let top = stage(t);
    let mut spaces = vec![top];
    for i in 0..depth {
        let parent = *spaces.last().unwrap();
        spaces.push(t.scene.add_space(parent, &format!("Level {i}")).unwrap());
    }
    let inner = t.add(*spaces.last().unwrap(), CLASS_CONSTANT);
    let mut exported = t.output(inner, 0);
    for &space in spaces[1..].iter().rev() {
        let fo = t.scene.add_facade_output(space, "Out").unwrap();
        t.scene
            .wire(EdgeSource::Output(exported), EdgeSink::FacadeOut(fo))
            .unwrap();
        exported = fo;
    }
    (top, inner, exported)
}

#[test]
fn facade_input_forwards_to_interior_node() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let child = t.scene.add_space(space, "Child").unwrap();
    let fi = t.scene.add_facade_input(child, "In").unwrap();
    let p = t.add(child, CLASS_PASS);
    t.scene
        .wire(EdgeSource::FacadeIn(fi), EdgeSink::Input(t.input(p, 0)))
        .unwrap();
    assert_eq!(t.scene.resolve_input(fi), Ok(t.input(p, 0)));

    let k = t.add(space, CLASS_CONSTANT);
    t.scene
        .wire(EdgeSource::Output(t.output(k, 0)), EdgeSink::Input(fi))
        .unwrap();
    t.set_constant(k, [1.0, 0.0, 0.0]);
    t.scene.advance_frame();
    assert_eq!(
        t.scene.evaluate(t.output(p, 0)),
        Signal::Rgb(Rgb::new(1.0, 0.0, 0.0))
    );

    let other = t.add(child, CLASS_PASS);
    let err = rejected(
        t.scene
            .wire(EdgeSource::FacadeIn(fi), EdgeSink::Input(t.input(other, 0))),
    );
    assert!(matches!(err, ValidationError::AlreadyConnected { .. }));
}

#[test]
fn unaliased_facade_cannot_be_used_outside() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let child = t.scene.add_space(space, "Child").unwrap();
    let fo = t.scene.add_facade_output(child, "Out").unwrap();
    let b = t.add(space, CLASS_PASS);
    let err = rejected(
        t.scene
            .wire(EdgeSource::Output(fo), EdgeSink::Input(t.input(b, 0))),
    );
    assert!(matches!(err, ValidationError::UnaliasedFacade { .. }));
}

#[test]
fn unwiring_interior_cascades_to_exterior_edges() {
    let mut t = TestScene::new();
    let (top, inner, exported) = nested_export(&mut t, 2);
    let b = t.add(top, CLASS_PASS);
    let inp = t.input(b, 0);
    t.scene
        .wire(EdgeSource::Output(exported), EdgeSink::Input(inp))
        .unwrap();
    assert_eq!(t.scene.connection_of(inp), Some(t.output(inner, 0)));

    let innermost = t.scene.store().edges_from(EdgeSource::Output(t.output(inner, 0)));
    t.scene.unwire(innermost[0]).unwrap();
    assert_eq!(t.scene.connection_of(inp), None);
    assert!(t.scene.store().edges.is_empty());
    assert_eq!(t.scene.store().outputs.get(exported).unwrap().aliased, None);
}

#[test]
fn removing_a_space_unwires_its_facades_in_the_parent() {
    let mut t = TestScene::new();
    let (top, _, exported) = nested_export(&mut t, 1);
    let b = t.add(top, CLASS_PASS);
    t.scene
        .wire(EdgeSource::Output(exported), EdgeSink::Input(t.input(b, 0)))
        .unwrap();
    let child = t.scene.store().child_spaces(top)[0];

    t.scene.remove_space(child).unwrap();
    assert!(t.scene.store().edges.is_empty());
    assert!(!t.scene.store().outputs.contains(exported));
    assert_eq!(t.scene.live_nodes(), 1);
}

#[test]
fn root_and_partition_spaces_are_protected() {
    let mut t = TestScene::new();
    let space = stage(&mut t);
    let err = rejected(t.scene.add_space(SpaceId::ROOT, "Loose"));
    assert_eq!(err, ValidationError::RootSpace);
    let err = rejected(t.scene.remove_space(space));
    assert_eq!(err, ValidationError::PartitionSpace { space });
}

#[cfg(not(miri))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn trace_reaches_innermost_output(depth in 1usize..6) {
            let mut t = TestScene::new();
            let (top, inner, exported) = nested_export(&mut t, depth);
            let concrete = t.output(inner, 0);
            prop_assert_eq!(t.scene.resolve_output(exported), Ok(concrete));
            prop_assert_eq!(
                t.scene.trace_output(exported).ok(),
                t.scene.store().outputs.get(concrete).and_then(|o| o.arr_idx)
            );

            let b = t.add(top, CLASS_PASS);
            t.scene
                .wire(EdgeSource::Output(exported), EdgeSink::Input(t.input(b, 0)))
                .unwrap();
            t.set_constant(inner, [0.0, 1.0, 0.0]);
            t.scene.advance_frame();
            prop_assert_eq!(
                t.scene.evaluate(t.output(b, 0)),
                Signal::Rgb(Rgb::new(0.0, 1.0, 0.0))
            );
        }
    }
}
