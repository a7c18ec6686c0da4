//! Behavioural coverage for the evaluation pipeline.

use super::*;
use crate::engine::GraphEngine;
use crate::error::GraphError;
use crate::types::{GraphSpec, InputConnection, NodeKind, NodeSpec};

fn node(id: &str, kind: NodeKind) -> NodeSpec {
    NodeSpec::new(id, kind)
}

fn wire(node: &mut NodeSpec, input: &str, from: &str, output: &str) {
    node.inputs
        .entry(input.to_string())
        .or_default()
        .push(InputConnection::new(from, output));
}

fn run(spec: &GraphSpec) -> Result<PassOutcome, GraphError> {
    evaluate(spec, &SinkSelector::First, &CancelToken::new())
}

fn committed_source(spec: &GraphSpec) -> String {
    match run(spec).expect("pass should succeed") {
        PassOutcome::Committed(source) => source,
        other => panic!("expected committed source, got {other:?}"),
    }
}

// --- Generation scenarios ------------------------------------------------

#[test]
fn it_should_default_a_bare_canvas_to_opaque_black() {
    let spec = GraphSpec {
        nodes: vec![node("canvas", NodeKind::Canvas)],
    };
    let source = committed_source(&spec);
    assert!(source.contains("gl_FragColor = vec4(0.0, 0.0, 0.0, 1.0);"));
    assert!(!source.contains(" = texture2D"));
    assert_eq!(source.matches("gl_FragColor").count(), 1);
}

#[test]
fn it_should_generate_the_starter_graph_shader() {
    let source = committed_source(&GraphSpec::starter());
    let expected = "precision mediump float;\n\
                    \n\
                    varying vec2 vTexCoord;\n\
                    \n\
                    uniform vec2 resolution;\n\
                    uniform sampler2D videoTexture;\n\
                    \n\
                    void main() {\n\
                    \x20   vec4 tex_webcam_0 = texture2D(videoTexture, vTexCoord + vec2(0.0 / resolution.x, 0.0 / resolution.y));\n\
                    \x20   gl_FragColor = tex_webcam_0;\n\
                    }\n";
    assert_eq!(source, expected);
}

#[test]
fn it_should_fold_both_constants_into_a_blend() {
    let mut color_a = node("a", NodeKind::Color);
    color_a.params.color = Some([1.0, 0.0, 0.0, 1.0]);
    let mut color_b = node("b", NodeKind::Color);
    color_b.params.color = Some([0.0, 0.0, 1.0, 1.0]);
    let mut blend = node("blend", NodeKind::Blend);
    wire(&mut blend, "color_a", "a", "color");
    wire(&mut blend, "color_b", "b", "color");
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "blend", "color");

    let spec = GraphSpec {
        nodes: vec![color_a, color_b, blend, canvas],
    };
    let source = committed_source(&spec);
    assert!(source.contains(
        "gl_FragColor = (vec4(1.0, 0.0, 0.0, 1.0) + vec4(0.0, 0.0, 1.0, 1.0)) / 2.0;"
    ));
}

#[test]
fn it_should_pass_through_a_half_connected_blend() {
    let mut color = node("a", NodeKind::Color);
    color.params.color = Some([0.2, 0.4, 0.6, 1.0]);
    let mut blend = node("blend", NodeKind::Blend);
    wire(&mut blend, "color_b", "a", "color");
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "blend", "color");

    let spec = GraphSpec {
        nodes: vec![color, blend, canvas],
    };
    let source = committed_source(&spec);
    assert!(source.contains("gl_FragColor = vec4(0.2, 0.4, 0.6, 1.0);"));
}

#[test]
fn it_should_blend_to_black_when_fully_unconnected() {
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "blend", "color");
    let spec = GraphSpec {
        nodes: vec![node("blend", NodeKind::Blend), canvas],
    };
    let source = committed_source(&spec);
    assert!(source.contains("gl_FragColor = vec4(0.0, 0.0, 0.0, 1.0);"));
}

#[test]
fn it_should_swap_channels_through_split_and_join() {
    let webcam = node("cam", NodeKind::Webcam);
    let mut split = node("split", NodeKind::Split);
    wire(&mut split, "color", "cam", "color");
    let mut join = node("join", NodeKind::Join);
    wire(&mut join, "r", "split", "g");
    wire(&mut join, "g", "split", "r");
    wire(&mut join, "b", "split", "b");
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "join", "color");

    let spec = GraphSpec {
        nodes: vec![webcam, split, join, canvas],
    };
    let source = committed_source(&spec);
    assert!(source
        .contains("gl_FragColor = vec4((tex_cam_0).g, (tex_cam_0).r, (tex_cam_0).b, 1.0);"));
    // The shared sample definition is emitted exactly once.
    assert_eq!(source.matches(" = texture2D").count(), 1);
}

#[test]
fn it_should_memoize_samples_with_equal_offsets() {
    let cam_a = node("cam_a", NodeKind::Webcam);
    let cam_b = node("cam_b", NodeKind::Webcam);
    let mut blend = node("blend", NodeKind::Blend);
    wire(&mut blend, "color_a", "cam_a", "color");
    wire(&mut blend, "color_b", "cam_b", "color");
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "blend", "color");

    let spec = GraphSpec {
        nodes: vec![cam_a, cam_b, blend, canvas],
    };
    let source = committed_source(&spec);
    assert_eq!(source.matches(" = texture2D").count(), 1);
    assert!(source.contains("(tex_cam_a_0 + tex_cam_a_0) / 2.0"));
}

#[test]
fn it_should_keep_memoized_samples_defined_on_multi_edge_sockets() {
    // Blend reads only the first edge on each socket, so the shader
    // that first defined the sample never reaches the sink; the
    // memoized hit arriving on color_b must still carry the definition.
    let mut tint = node("tint", NodeKind::Color);
    tint.params.color = Some([1.0, 0.0, 0.0, 1.0]);
    let cam_a = node("cam_a", NodeKind::Webcam);
    let cam_b = node("cam_b", NodeKind::Webcam);
    let mut blend = node("blend", NodeKind::Blend);
    wire(&mut blend, "color_a", "tint", "color");
    wire(&mut blend, "color_a", "cam_a", "color");
    wire(&mut blend, "color_b", "cam_b", "color");
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "blend", "color");

    let spec = GraphSpec {
        nodes: vec![tint, cam_a, cam_b, blend, canvas],
    };
    let source = committed_source(&spec);
    assert!(source.contains("(vec4(1.0, 0.0, 0.0, 1.0) + tex_cam_a_0) / 2.0"));
    assert_eq!(source.matches(" = texture2D").count(), 1);
}

#[test]
fn it_should_sample_separately_for_distinct_offsets() {
    let cam_a = node("cam_a", NodeKind::Webcam);
    let mut cam_b = node("cam_b", NodeKind::Webcam);
    cam_b.params.offset_x = Some(4.0);
    let mut blend = node("blend", NodeKind::Blend);
    wire(&mut blend, "color_a", "cam_a", "color");
    wire(&mut blend, "color_b", "cam_b", "color");
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "blend", "color");

    let spec = GraphSpec {
        nodes: vec![cam_a, cam_b, blend, canvas],
    };
    let source = committed_source(&spec);
    assert_eq!(source.matches(" = texture2D").count(), 2);
    assert!(source.contains("vec2(4.0 / resolution.x, 0.0 / resolution.y)"));
}

// --- Emission properties -------------------------------------------------

#[test]
fn it_should_emit_definitions_strictly_before_uses() {
    let webcam = node("cam", NodeKind::Webcam);
    let mut split = node("split", NodeKind::Split);
    wire(&mut split, "color", "cam", "color");
    let mut join = node("join", NodeKind::Join);
    for channel in ["r", "g", "b", "a"] {
        wire(&mut join, channel, "split", channel);
    }
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "join", "color");

    let spec = GraphSpec {
        nodes: vec![webcam, split, join, canvas],
    };
    let source = committed_source(&spec);

    let def_pos = source.find("vec4 tex_cam_0 = ").expect("definition present");
    let first_use = source.find("(tex_cam_0)").expect("use present");
    assert!(def_pos < first_use);
    assert_eq!(source.matches("vec4 tex_cam_0 = ").count(), 1);
}

#[test]
fn it_should_skip_nodes_with_no_path_to_the_sink() {
    let mut spec = GraphSpec::starter();
    // An orphaned webcam and color node: neither may contribute.
    let mut stray_cam = node("stray", NodeKind::Webcam);
    stray_cam.params.offset_x = Some(9.0);
    spec.nodes.push(stray_cam);
    spec.nodes.push(node("teal", NodeKind::Color));

    let source = committed_source(&spec);
    assert!(!source.contains("9.0"));
    assert!(!source.contains("0.7"));
    assert_eq!(source.matches(" = texture2D").count(), 1);
}

#[test]
fn it_should_regenerate_byte_identical_source() {
    let spec = GraphSpec::starter();
    let first = committed_source(&spec);
    let second = committed_source(&spec);
    assert_eq!(first, second);
}

// --- Sink selection ------------------------------------------------------

#[test]
fn it_should_yield_no_sink_for_sinkless_graphs() {
    let spec = GraphSpec {
        nodes: vec![node("cam", NodeKind::Webcam)],
    };
    assert_eq!(run(&spec), Ok(PassOutcome::NoSink));
}

#[test]
fn it_should_select_the_first_sink_in_declaration_order() {
    let mut canvas_a = node("canvas_a", NodeKind::Canvas);
    wire(&mut canvas_a, "color", "teal", "color");
    let canvas_b = node("canvas_b", NodeKind::Canvas);
    let spec = GraphSpec {
        nodes: vec![node("teal", NodeKind::Color), canvas_a, canvas_b],
    };
    let source = committed_source(&spec);
    assert!(source.contains("vec4(0.0, 0.7, 0.7, 1.0)"));
}

#[test]
fn it_should_honor_an_explicit_sink_id() {
    let mut canvas_a = node("canvas_a", NodeKind::Canvas);
    wire(&mut canvas_a, "color", "teal", "color");
    let canvas_b = node("canvas_b", NodeKind::Canvas);
    let spec = GraphSpec {
        nodes: vec![node("teal", NodeKind::Color), canvas_a, canvas_b],
    };

    let outcome = evaluate(
        &spec,
        &SinkSelector::ById("canvas_b".to_string()),
        &CancelToken::new(),
    )
    .expect("pass should succeed");
    match outcome {
        PassOutcome::Committed(source) => {
            // canvas_b is unconnected: default black, and the teal
            // branch is dead code for this sink.
            assert!(source.contains("gl_FragColor = vec4(0.0, 0.0, 0.0, 1.0);"));
            assert!(!source.contains("0.7"));
        }
        other => panic!("expected committed source, got {other:?}"),
    }
}

#[test]
fn it_should_fail_when_the_selected_sink_is_missing() {
    let spec = GraphSpec::starter();
    let err = evaluate(
        &spec,
        &SinkSelector::ById("nope".to_string()),
        &CancelToken::new(),
    )
    .expect_err("missing sink");
    assert_eq!(err, GraphError::SinkNotFound("nope".to_string()));

    // A non-sink node is not a valid selection either.
    let err = evaluate(
        &spec,
        &SinkSelector::ById("webcam".to_string()),
        &CancelToken::new(),
    )
    .expect_err("webcam is not a sink");
    assert_eq!(err, GraphError::SinkNotFound("webcam".to_string()));
}

// --- Failure & cancellation ----------------------------------------------

#[test]
fn it_should_report_cycles_without_output() {
    let mut blend_a = node("a", NodeKind::Blend);
    wire(&mut blend_a, "color_a", "b", "color");
    let mut blend_b = node("b", NodeKind::Blend);
    wire(&mut blend_b, "color_a", "a", "color");
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "a", "color");

    let spec = GraphSpec {
        nodes: vec![blend_a, blend_b, canvas],
    };
    assert_eq!(run(&spec), Err(GraphError::CycleDetected));
}

#[test]
fn it_should_deliver_nothing_from_a_cancelled_pass() {
    let token = CancelToken::new();
    token.cancel();
    let outcome = evaluate(&GraphSpec::starter(), &SinkSelector::First, &token)
        .expect("cancellation is not an error");
    assert_eq!(outcome, PassOutcome::Cancelled);
}

#[test]
fn it_should_preempt_an_in_flight_pass_when_retriggered() {
    let mut engine = GraphEngine::new(GraphSpec::starter());

    let mut pass_a = engine
        .start_pass(&SinkSelector::First)
        .expect("pass a starts")
        .expect("sink present");
    assert!(pass_a.step());

    // A second trigger arrives before pass A commits.
    let outcome_b = engine.process(&SinkSelector::First).expect("pass b runs");
    assert!(matches!(outcome_b, PassOutcome::Committed(_)));

    // Pass A keeps stepping but must abort and deliver nothing.
    let outcome_a = pass_a.run().expect("cancellation is not an error");
    assert_eq!(outcome_a, PassOutcome::Cancelled);
    assert_eq!(
        engine.last_committed().map(str::to_string),
        match outcome_b {
            PassOutcome::Committed(source) => Some(source),
            _ => None,
        }
    );
}

#[test]
fn it_should_deliver_nothing_from_an_abandoned_pass() {
    let mut engine = GraphEngine::new(GraphSpec::starter());
    let mut pass = engine
        .start_pass(&SinkSelector::First)
        .expect("pass starts")
        .expect("sink present");
    assert!(pass.step());

    // Finished without being driven to completion.
    let outcome = pass.finish().expect("abandonment is not an error");
    assert_eq!(outcome, PassOutcome::Cancelled);
}

#[test]
fn it_should_recover_cleanly_after_a_failed_pass() {
    let mut blend_a = node("a", NodeKind::Blend);
    wire(&mut blend_a, "color_a", "b", "color");
    let mut blend_b = node("b", NodeKind::Blend);
    wire(&mut blend_b, "color_a", "a", "color");
    let mut canvas = node("canvas", NodeKind::Canvas);
    wire(&mut canvas, "color", "a", "color");

    let mut engine = GraphEngine::new(GraphSpec {
        nodes: vec![blend_a, blend_b, canvas],
    });
    assert_eq!(
        engine.process(&SinkSelector::First),
        Err(GraphError::CycleDetected)
    );

    // Breaking the cycle retriggers a clean pass.
    engine.disconnect("b", "color", "a", "color_a").expect("disconnect");
    let outcome = engine.process(&SinkSelector::First).expect("clean pass");
    assert!(matches!(outcome, PassOutcome::Committed(_)));
}

// --- Persistence ---------------------------------------------------------

#[test]
fn it_should_round_trip_an_edited_graph() {
    let mut engine = GraphEngine::new(GraphSpec::starter());
    let mut teal = node("teal", NodeKind::Color);
    teal.position = [120.0, 80.0];
    engine.add_node(teal).expect("add color");
    engine.add_node(node("blend", NodeKind::Blend)).expect("add blend");
    engine.disconnect("webcam", "color", "canvas", "color").expect("disconnect");
    engine.connect("webcam", "color", "blend", "color_a").expect("connect");
    engine.connect("teal", "color", "blend", "color_b").expect("connect");
    engine.connect("blend", "color", "canvas", "color").expect("connect");

    let json = engine.to_json().expect("serialize");
    let restored = GraphSpec::parse(&json).expect("parse");
    assert_eq!(&restored, engine.spec());

    // Equivalent documents generate equivalent shaders.
    let original = committed_source(engine.spec());
    let reloaded = committed_source(&restored);
    assert_eq!(original, reloaded);
}
