use super::*;
use crate::foundation::core::PixelRect;

const RED: [u8; 3] = [220, 30, 30];
const BLUE: [u8; 3] = [20, 20, 250];

/// Blue field with a red square at (4,4)-(8,8).
fn square_on_field() -> RgbImage {
    RgbImage::from_fn(16, 16, |x, y| {
        if (4..8).contains(&x) && (4..8).contains(&y) {
            image::Rgb(RED)
        } else {
            image::Rgb(BLUE)
        }
    })
}

/// Depth 0 on the square, 1 elsewhere.
fn square_depth() -> DepthMap {
    let raw: Vec<f32> = (0..256)
        .map(|i| {
            let (x, y) = (i % 16, i / 16);
            if (4..8).contains(&x) && (4..8).contains(&y) { 0.0 } else { 1.0 }
        })
        .collect();
    DepthMap::normalized(Resolution::new(16, 16), raw).unwrap()
}

#[test]
fn nearest_first_and_occluded_colour_comes_from_healed_canvas() {
    let masks = vec![
        Mask::from_rect(PixelRect::new(0, 0, 16, 16), 0.9),
        Mask::from_rect(PixelRect::new(4, 4, 4, 4), 0.8),
    ];
    let strokes = StrokeExtractor::new(1)
        .extract(&square_on_field(), &square_depth(), &masks)
        .unwrap();

    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes[0].bbox, BBox::new(4, 4, 4, 4).unwrap());
    assert_eq!(strokes[0].color, RED);
    assert_eq!(strokes[0].depth, 0.0);

    // The square is gone from the canvas by the time the backdrop is sampled.
    let c = strokes[1].color;
    for i in 0..3 {
        assert!((i32::from(c[i]) - i32::from(BLUE[i])).abs() <= 1, "{c:?}");
    }
}

#[test]
fn empty_and_out_of_bounds_masks_never_become_strokes() {
    let masks = vec![
        Mask::from_rect(PixelRect::new(3, 3, 0, 5), 1.0),
        Mask::from_rect(PixelRect::new(-10, -10, 5, 5), 1.0),
        Mask::from_rect(PixelRect::new(14, 14, 10, 10), 1.0),
        Mask {
            rect: PixelRect::new(0, 0, 2, 2),
            bits: Some(vec![false; 4]),
            stability: 1.0,
        },
    ];
    let strokes = StrokeExtractor::default()
        .extract(&square_on_field(), &square_depth(), &masks)
        .unwrap();

    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].bbox, BBox::new(14, 14, 2, 2).unwrap());
    assert!(strokes.iter().all(|s| s.bbox.w > 0 && s.bbox.h > 0));
}

#[test]
fn equal_depth_keeps_mask_order_and_clamps_stability() {
    let img = RgbImage::from_pixel(8, 8, image::Rgb([10, 10, 10]));
    let depth = DepthMap::flat(Resolution::new(8, 8));
    let masks = vec![
        Mask::from_rect(PixelRect::new(0, 0, 2, 2), 1.7),
        Mask::from_rect(PixelRect::new(4, 4, 2, 2), -0.3),
        Mask::from_rect(PixelRect::new(2, 2, 2, 2), f32::NAN),
    ];
    let strokes = StrokeExtractor::default().extract(&img, &depth, &masks).unwrap();

    let xs: Vec<u32> = strokes.iter().map(|s| s.bbox.x).collect();
    assert_eq!(xs, vec![0, 4, 2]);
    assert_eq!(strokes[0].stability, 1.0);
    assert_eq!(strokes[1].stability, 0.0);
    assert_eq!(strokes[2].stability, 0.0);
}

#[test]
fn depth_resolution_must_match_image() {
    let err = StrokeExtractor::default()
        .extract(
            &RgbImage::new(4, 4),
            &DepthMap::flat(Resolution::new(4, 5)),
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, VoidError::Validation(_)));
}

#[test]
fn stroke_serializes_depth_as_z_and_omits_empty_annotations() {
    let s = Stroke {
        color: [1, 2, 3],
        bbox: BBox::new(0, 0, 2, 2).unwrap(),
        depth: 0.5,
        stability: 0.25,
        embedding: None,
        face: None,
    };
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(
        v,
        serde_json::json!({ "color": [1, 2, 3], "bbox": [0, 0, 2, 2], "z": 0.5, "stability": 0.25 })
    );
}

struct ConstEmbedding;

impl EmbeddingOracle for ConstEmbedding {
    fn name(&self) -> &'static str {
        "const"
    }

    fn extract_embedding(&self, patch: &RgbImage) -> crate::oracle::OracleResult<Vec<f32>> {
        if patch.width() > 4 {
            return Err(crate::oracle::OracleError::failed("too wide"));
        }
        Ok(vec![patch.width() as f32])
    }
}

struct AlwaysFace;

impl SalienceDetector for AlwaysFace {
    fn name(&self) -> &'static str {
        "always"
    }

    fn detect_salient_region(&self, _patch: &RgbImage) -> bool {
        true
    }
}

#[test]
fn annotation_tolerates_embedding_failures() {
    let img = square_on_field();
    let mk = |w| Stroke {
        color: [0, 0, 0],
        bbox: BBox::new(0, 0, w, 2).unwrap(),
        depth: 0.0,
        stability: 1.0,
        embedding: None,
        face: None,
    };
    let mut strokes = vec![mk(3), mk(8)];
    let n = annotate_strokes(&mut strokes, &img, Some(&ConstEmbedding), Some(&AlwaysFace));

    assert_eq!(n, 1);
    assert_eq!(strokes[0].embedding, Some(vec![3.0]));
    assert_eq!(strokes[1].embedding, None);
    assert!(strokes.iter().all(|s| s.face == Some(true)));
}

#[test]
fn dominant_color_samples_first_hundred() {
    assert_eq!(dominant_color(std::iter::empty()), None);
    assert_eq!(dominant_color([[10, 20, 30], [11, 21, 31]]), Some([10, 20, 30]));

    let colors = std::iter::repeat_n([100, 100, 100], 100).chain(std::iter::repeat_n([0, 0, 0], 50));
    assert_eq!(dominant_color(colors), Some([100, 100, 100]));
}
