use super::*;

#[test]
fn bbox_rejects_zero_extent() {
    assert!(BBox::new(0, 0, 0, 4).is_err());
    assert!(BBox::new(0, 0, 4, 0).is_err());
    assert!(BBox::new(3, 3, 1, 1).is_ok());
}

#[test]
fn bbox_serializes_as_array_and_validates_on_read() {
    let b = BBox::new(1, 2, 3, 4).unwrap();
    assert_eq!(serde_json::to_string(&b).unwrap(), "[1,2,3,4]");
    assert_eq!(serde_json::from_str::<BBox>("[1,2,3,4]").unwrap(), b);
    assert!(serde_json::from_str::<BBox>("[1,2,0,4]").is_err());
}

#[test]
fn pixel_rect_clips_to_bounds() {
    let res = Resolution::new(10, 8);
    assert_eq!(
        PixelRect::new(-2, -2, 5, 5).clip_to(res),
        Some(BBox::new(0, 0, 3, 3).unwrap())
    );
    assert_eq!(
        PixelRect::new(8, 6, 10, 10).clip_to(res),
        Some(BBox::new(8, 6, 2, 2).unwrap())
    );
    assert_eq!(PixelRect::new(12, 0, 4, 4).clip_to(res), None);
    assert_eq!(PixelRect::new(0, 0, 0, 4).clip_to(res), None);
    assert_eq!(PixelRect::new(0, 0, 4, -1).clip_to(res), None);
}

#[test]
fn dilate_stays_inside_resolution() {
    let res = Resolution::new(10, 10);
    let b = BBox::new(0, 8, 2, 2).unwrap().dilate(3, res);
    assert_eq!(b, BBox::new(0, 5, 5, 5).unwrap());
    assert!(res.contains(b));
}

#[test]
fn resolution_contains_edges() {
    let res = Resolution::new(4, 4);
    assert!(res.contains(BBox::new(0, 0, 4, 4).unwrap()));
    assert!(!res.contains(BBox::new(1, 0, 4, 4).unwrap()));
}
