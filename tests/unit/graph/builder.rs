use super::*;

fn cand(source: &str, target: &str, score: f64, source_face: bool, target_face: bool) -> EdgeCandidate {
    EdgeCandidate {
        source: source.into(),
        target: target.into(),
        score,
        source_face,
        target_face,
    }
}

#[test]
fn pareidolia_boost_lifts_over_threshold() {
    let b = GraphBuilder::default();
    let (w, kind) = b.judge(&cand("a", "b", 0.75, false, true)).unwrap();
    assert!((w - 0.95).abs() < 1e-12);
    assert_eq!(kind, EdgeKind::Pareidolia);

    // Below the floor nothing is boosted and nothing survives.
    assert_eq!(b.judge(&cand("a", "b", 0.5, false, true)), None);
    // Face to face is plain similarity.
    assert_eq!(b.judge(&cand("a", "b", 0.75, true, true)), None);
    // Non-face target gets no boost.
    assert_eq!(b.judge(&cand("a", "b", 0.75, false, false)), None);
}

#[test]
fn similarity_threshold_is_strict() {
    let b = GraphBuilder::default();
    assert_eq!(b.judge(&cand("a", "b", 0.85, false, false)), None);
    assert_eq!(
        b.judge(&cand("a", "b", 0.9, false, false)),
        Some((0.9, EdgeKind::Similarity))
    );
    assert_eq!(b.judge(&cand("a", "b", f64::NAN, false, false)), None);
}

#[test]
fn resolve_keeps_max_per_ordered_pair_sorted() {
    let b = GraphBuilder::default();
    let edges = b.resolve(&[
        cand("b", "a", 0.9, false, false),
        cand("a", "b", 0.88, false, false),
        cand("a", "b", 0.75, false, true),
        cand("a", "b", 0.92, false, false),
        cand("a", "a", 0.99, false, false),
        cand("a", "c", 0.1, false, false),
    ]);

    assert_eq!(edges.len(), 2);
    assert_eq!((edges[0].source.as_str(), edges[0].target.as_str()), ("a", "b"));
    assert!((edges[0].weight - 0.95).abs() < 1e-12);
    assert_eq!(edges[0].kind, EdgeKind::Pareidolia);
    assert_eq!((edges[1].source.as_str(), edges[1].target.as_str()), ("b", "a"));
    assert!(edges.iter().all(|e| e.weight > b.threshold));
}

#[test]
fn build_links_similar_artifacts_only() {
    let d = |artifact: &str, vector: Vec<f32>, face: bool| Descriptor {
        artifact: artifact.into(),
        vector,
        face,
    };
    let descriptors = vec![
        d("x", vec![1.0, 0.0, 0.0], false),
        d("x", vec![0.99, 0.05, 0.0], false),
        d("y", vec![1.0, 0.02, 0.0], false),
        d("z", vec![0.0, 0.0, 1.0], false),
    ];
    let node = |id: &str| GraphNode {
        id: id.into(),
        file: format!("{id}.png"),
        descriptors: 1,
    };
    let graph = GraphBuilder::default()
        .build(vec![node("x"), node("y"), node("z")], &descriptors)
        .unwrap();

    let pairs: Vec<(&str, &str)> = graph
        .edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert_eq!(pairs, vec![("x", "y"), ("y", "x")]);
    assert_eq!(graph.nodes.len(), 3);
}

#[test]
fn edge_serializes_kind_as_type() {
    let e = Edge {
        source: "a".into(),
        target: "b".into(),
        weight: 0.9,
        kind: EdgeKind::Pareidolia,
    };
    assert_eq!(
        serde_json::to_value(&e).unwrap(),
        serde_json::json!({ "source": "a", "target": "b", "weight": 0.9, "type": "pareidolia" })
    );
}
