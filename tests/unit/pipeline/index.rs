use super::*;
use std::fs;

fn stroke(c: [u8; 3]) -> serde_json::Value {
    serde_json::json!({ "color": c, "bbox": [0, 0, 1, 1], "z": 0.0, "stability": 1.0 })
}

#[test]
fn manifest_links_nearest_colours_and_skips_broken_records() {
    let dir = std::env::temp_dir().join(format!("voidgrind_index_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    let write = |name: &str, v: serde_json::Value| fs::write(dir.join(name), v.to_string()).unwrap();
    write("red.json", serde_json::json!([stroke([250, 0, 0])]));
    write("rose.json", serde_json::json!([stroke([240, 10, 10])]));
    write("navy.json", serde_json::json!([stroke([0, 0, 90])]));
    write(
        "ghosted.json",
        serde_json::json!({
            "meta": { "dominant_color": [0, 0, 100], "resolution": [1500, 1000] },
            "strokes": [],
            "pareidolia": [{ "x": 0.5, "y": 0.5, "w": 0.1, "h": 0.1, "confidence": 0.8 }]
        }),
    );
    fs::write(dir.join("broken.json"), "{").unwrap();
    write("manifest.json", serde_json::json!([]));

    let (m, report) = build_manifest(&dir, 1).unwrap();

    assert_eq!(report, IndexReport { indexed: 4, skipped: 1 });
    assert_eq!(m.total_nodes, 4);
    let ids: Vec<&str> = m.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["ghosted", "navy", "red", "rose"]);

    let by_id = |id: &str| m.nodes.iter().find(|n| n.id == id).unwrap();
    assert_eq!(by_id("red").neighbors, vec!["rose"]);
    assert_eq!(by_id("navy").neighbors, vec!["ghosted"]);
    assert_eq!(by_id("ghosted").regions, 1);
    assert_eq!(by_id("ghosted").res, crate::foundation::core::Resolution::new(1500, 1000));
    assert_eq!(by_id("rose").file, "rose.json");
    assert_eq!(by_id("rose").color, [240, 10, 10]);
    assert!(chrono::DateTime::parse_from_rfc3339(&m.generated_at).is_ok());

    fs::remove_dir_all(&dir).ok();
}
