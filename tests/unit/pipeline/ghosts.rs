use super::*;

/// Fires on any patch whose mean red channel is high.
struct RedSpot;

impl SalienceDetector for RedSpot {
    fn name(&self) -> &'static str {
        "red"
    }

    fn detect_salient_region(&self, patch: &RgbImage) -> bool {
        let n = (patch.width() * patch.height()).max(1);
        let red: u32 = patch.pixels().map(|p| u32::from(p.0[0])).sum();
        red / n > 200
    }
}

fn scanner() -> GhostScanner {
    GhostScanner::new(GhostConfig {
        min_size: 10,
        scale_step: 2.0,
        stride_fraction: 1.0,
        ..GhostConfig::default()
    })
}

#[test]
fn detections_are_stored_in_flipped_uv() {
    // Red block in the top-left 10x10 of a 40x20 image.
    let img = RgbImage::from_fn(40, 20, |x, y| {
        if x < 10 && y < 10 {
            image::Rgb([255, 0, 0])
        } else {
            image::Rgb([0, 0, 0])
        }
    });
    let ghosts = scanner().scan(&img, &RedSpot);

    assert_eq!(ghosts.len(), 1);
    let g = ghosts[0];
    assert!((g.x - 0.125).abs() < 1e-12);
    assert!((g.y - 0.75).abs() < 1e-12);
    assert!((g.w - 0.25).abs() < 1e-12);
    assert!((g.h - 0.5).abs() < 1e-12);
    assert!((g.confidence - 0.8).abs() < 1e-6);
}

#[test]
fn overlapping_hits_collapse_to_the_largest() {
    let img = RgbImage::from_pixel(40, 40, image::Rgb([255, 0, 0]));
    let ghosts = scanner().scan(&img, &RedSpot);

    // Sizes 10, 20, 40; the single 40 window covers everything else.
    assert_eq!(ghosts.len(), 1);
    assert!((ghosts[0].w - 1.0).abs() < 1e-12);
}

#[test]
fn images_smaller_than_a_window_have_no_ghosts() {
    let img = RgbImage::from_pixel(8, 8, image::Rgb([255, 0, 0]));
    assert!(scanner().scan(&img, &RedSpot).is_empty());
}

#[test]
fn window_overlap_is_relative_to_the_smaller() {
    let a = Window { x: 0, y: 0, size: 10 };
    assert_eq!(a.overlap(&a), 1.0);
    assert_eq!(a.overlap(&Window { x: 10, y: 0, size: 10 }), 0.0);
    assert_eq!(a.overlap(&Window { x: 5, y: 0, size: 10 }), 0.5);
    assert_eq!(a.overlap(&Window { x: 0, y: 0, size: 40 }), 1.0);
}

#[test]
fn migrated_records_find_their_source_by_extension() {
    let root = std::env::temp_dir().join(format!("voidgrind_ghosts_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    let mut cfg = VoidConfig::default();
    cfg.paths.raw_dir = root.join("raw");
    cfg.paths.data_dir = root.join("data");
    cfg.ghosts.min_size = 10;
    std::fs::create_dir_all(&cfg.paths.raw_dir).unwrap();
    std::fs::create_dir_all(&cfg.paths.data_dir).unwrap();

    // A bare stroke list migrates with `original_file` set to the id.
    std::fs::write(
        cfg.paths.data_dir.join("PXL_2019_Old.json"),
        r#"[{"color":[1,2,3],"bbox":[0,0,1,1],"z":0,"stability":1}]"#,
    )
    .unwrap();
    RgbImage::from_pixel(20, 20, image::Rgb([255, 0, 0]))
        .save(cfg.paths.raw_dir.join("PXL_2019_Old.png"))
        .unwrap();

    let report = scan_records(&cfg, &RedSpot).unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.skipped, 0);
    assert!(report.ghosts > 0);

    let rec = store::load_record(&cfg.paths.data_dir.join("PXL_2019_Old.json")).unwrap();
    assert_eq!(rec.ghost_count(), report.ghosts);

    std::fs::remove_dir_all(&root).ok();
}
