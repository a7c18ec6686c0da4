use criterion::{criterion_group, criterion_main, Criterion};
use fxgraph_core::{
    evaluate, CancelToken, GraphSpec, InputConnection, NodeKind, NodeSpec, SinkSelector,
};

/// A balanced tree of blends over `leaves` webcam samples at distinct
/// offsets, wired into one canvas.
fn blend_tree(leaves: usize) -> GraphSpec {
    let mut nodes = Vec::new();
    let mut layer: Vec<String> = Vec::new();

    for i in 0..leaves {
        let id = format!("cam{i}");
        let mut cam = NodeSpec::new(id.clone(), NodeKind::Webcam);
        cam.params.offset_x = Some(i as f32);
        nodes.push(cam);
        layer.push(id);
    }

    let mut depth = 0;
    while layer.len() > 1 {
        let mut next = Vec::new();
        for (i, pair) in layer.chunks(2).enumerate() {
            if let [a, b] = pair {
                let id = format!("blend{depth}_{i}");
                let mut blend = NodeSpec::new(id.clone(), NodeKind::Blend);
                blend
                    .inputs
                    .insert("color_a".to_string(), vec![InputConnection::new(a.clone(), "color")]);
                blend
                    .inputs
                    .insert("color_b".to_string(), vec![InputConnection::new(b.clone(), "color")]);
                nodes.push(blend);
                next.push(id);
            } else {
                next.push(pair[0].clone());
            }
        }
        layer = next;
        depth += 1;
    }

    let mut canvas = NodeSpec::new("canvas", NodeKind::Canvas);
    canvas.inputs.insert(
        "color".to_string(),
        vec![InputConnection::new(layer[0].clone(), "color")],
    );
    nodes.push(canvas);

    GraphSpec { nodes }
}

fn bench_evaluate(c: &mut Criterion) {
    let spec = blend_tree(64);
    c.bench_function("evaluate_blend_tree_64", |b| {
        b.iter(|| {
            evaluate(&spec, &SinkSelector::First, &CancelToken::new())
                .expect("bench graph is acyclic")
        })
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
