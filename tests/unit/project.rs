use super::*;

fn stroke(bbox: BBox, depth: f32) -> Stroke {
    Stroke {
        color: [9, 8, 7],
        bbox,
        depth,
        stability: 1.0,
        embedding: None,
        face: None,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn image_centre_projects_onto_the_view_axis() {
    let p = Projector::new(Resolution::new(100, 100), 75.0).unwrap();
    let placed = p.place(BBox::new(40, 40, 20, 20).unwrap(), 0.5);
    assert!(close(placed.x, 0.0));
    assert!(close(placed.y, 0.0));
    assert!(close(placed.z, -0.5));
}

#[test]
fn position_and_scale_are_linear_in_depth() {
    let p = Projector::new(Resolution::new(160, 90), 60.0).unwrap();
    let b = BBox::new(10, 5, 30, 12).unwrap();
    let near = p.place(b, 1.0);
    let far = p.place(b, 2.0);
    assert!(close(far.x, 2.0 * near.x));
    assert!(close(far.y, 2.0 * near.y));
    assert!(close(far.scale, 2.0 * near.scale));
    assert!(close(far.z, -2.0));
}

#[test]
fn known_values_at_ninety_degrees() {
    // h1 = 2 tan(45°) = 2, w1 = 4 for a 2:1 image.
    let p = Projector::new(Resolution::new(200, 100), 90.0).unwrap();
    let placed = p.place(BBox::new(150, 0, 50, 10).unwrap(), 1.0);
    // u = 175 → un = 0.375; v = 5 → vn = 0.45
    assert!(close(placed.x, 0.375 * 4.0));
    assert!(close(placed.y, 0.45 * 2.0));
    assert!(close(placed.scale, 0.5 * 2.0));
}

#[test]
fn upper_left_lands_up_and_left() {
    let p = Projector::new(Resolution::new(64, 64), 75.0).unwrap();
    let placed = p.place(BBox::new(0, 0, 4, 4).unwrap(), 1.0);
    assert!(placed.x < 0.0);
    assert!(placed.y > 0.0);
}

#[test]
fn rotation_does_not_disturb_placement() {
    let p = Projector::new(Resolution::new(64, 64), 75.0).unwrap();
    let s = stroke(BBox::new(3, 9, 5, 2).unwrap(), 0.7);
    let a = p.project(&s, &mut Rng64::new(1));
    let b = p.project(&s, &mut Rng64::new(99));
    assert_eq!(a.placement, b.placement);
    assert!((0.0..TAU).contains(&a.rotation));
    assert_eq!(a.color, [9, 8, 7]);
}

#[test]
fn invalid_cameras_are_rejected() {
    assert!(Projector::new(Resolution::new(0, 10), 75.0).is_err());
    assert!(Projector::new(Resolution::new(10, 10), 0.0).is_err());
    assert!(Projector::new(Resolution::new(10, 10), 180.0).is_err());
}

#[test]
fn cloud_is_deterministic_and_offsets_flat_depth() {
    let camera = CameraConfig::default();
    let strokes = vec![
        stroke(BBox::new(0, 0, 8, 8).unwrap(), 0.0),
        stroke(BBox::new(8, 8, 8, 8).unwrap(), 1.0),
    ];
    let res = Resolution::new(16, 16);
    let a = build_cloud("PXL_1", res, &strokes, &camera).unwrap();
    let b = build_cloud("PXL_1", res, &strokes, &camera).unwrap();
    assert_eq!(a, b);

    assert_eq!(a.strokes.len(), 2);
    assert!(close(a.strokes[0][2], -camera.near));
    assert!(close(a.strokes[1][2], -(camera.near + camera.depth_range)));
    assert_eq!(&a.strokes[0][5..], &[9.0, 8.0, 7.0]);

    let other = build_cloud("PXL_2", res, &strokes, &camera).unwrap();
    assert_ne!(a.strokes[0][4], other.strokes[0][4]);
}
