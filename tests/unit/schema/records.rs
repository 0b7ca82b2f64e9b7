use super::*;
use serde_json::json;

#[test]
fn legacy_list_parses_with_verbatim_leftovers() {
    let raw = json!([
        { "color": [10, 20, 30], "bbox": [1, 2, 3, 4], "z": 0.25, "stability": 0.5 },
        { "color": [10, 20, 30], "bbox": [1, 2, 0, 4], "z": 0.25, "stability": 0.5 },
        "junk"
    ]);
    let rec = ArtifactRecord::from_value(raw, "PXL_2021_Fog").unwrap();

    assert_eq!(rec.id(), "PXL_2021_Fog");
    assert_eq!(rec.meta.stroke_count, 3);
    assert_eq!(rec.strokes().count(), 1);
    assert!(matches!(rec.strokes[1], StrokeEntry::Legacy(_)));
    assert_eq!(rec.strokes[2], StrokeEntry::Legacy(json!("junk")));
    assert!(!rec.has_face());

    let back = serde_json::to_value(&rec).unwrap();
    assert_eq!(back["strokes"][2], json!("junk"));
    assert_eq!(back["strokes"][1]["bbox"], json!([1, 2, 0, 4]));
}

#[test]
fn unknown_keys_survive_a_round_trip() {
    let raw = json!({
        "meta": { "resolution": [8, 8], "artist": "someone" },
        "strokes": [],
        "pareidolia": [{ "x": 0.5, "y": 0.5, "w": 0.1, "h": 0.1, "confidence": 0.8 }],
        "notes": { "a": 1 }
    });
    let rec = ArtifactRecord::from_value(raw, "x").unwrap();
    assert_eq!(rec.ghost_count(), 1);
    assert_eq!(rec.meta.extra["artist"], json!("someone"));

    let back = serde_json::to_value(&rec).unwrap();
    assert_eq!(back["notes"], json!({ "a": 1 }));
    assert_eq!(back["meta"]["artist"], json!("someone"));
    assert_eq!(back["meta"]["schema"], json!(2));
}

#[test]
fn manifest_nodes_take_defaults() {
    let m = ManifestRecord::from_value(json!([{ "id": "a", "src": "/data/a.json" }])).unwrap();
    assert_eq!(m.total_nodes, 1);
    let n = &m.nodes[0];
    assert_eq!(n.file, "/data/a.json");
    assert_eq!(n.res, Resolution::new(1024, 1024));
    assert_eq!(n.color, [0, 0, 0]);
    assert!(n.neighbors.is_empty());
}

#[test]
fn manifest_node_without_id_is_a_schema_error() {
    let err = ManifestRecord::from_value(json!([{ "file": "a.json" }])).unwrap_err();
    assert!(matches!(err, VoidError::Schema(_)));
}
