use super::*;
use crate::foundation::core::PixelRect;
use crate::raster::mask::Mask;

fn solid(w: u32, h: u32, c: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(w, h, image::Rgb(c))
}

#[test]
fn hole_in_uniform_image_heals_to_surrounding_colour() {
    let mut img = solid(9, 9, [40, 80, 120]);
    for y in 3..6 {
        for x in 3..6 {
            img.put_pixel(x, y, image::Rgb([255, 0, 0]));
        }
    }
    let fp = Mask::from_rect(PixelRect::new(3, 3, 3, 3), 1.0)
        .resolve(Resolution::new(9, 9))
        .unwrap();

    heal(&mut img, &fp, 1);

    for p in img.pixels() {
        assert_eq!(p.0, [40, 80, 120]);
    }
}

#[test]
fn pixels_outside_dilated_footprint_are_untouched() {
    let mut img = RgbImage::from_fn(12, 12, |x, y| image::Rgb([(x * 20) as u8, (y * 20) as u8, 7]));
    let before = img.clone();
    let fp = Mask::from_rect(PixelRect::new(5, 5, 2, 2), 1.0)
        .resolve(Resolution::new(12, 12))
        .unwrap();

    heal(&mut img, &fp, 1);

    for y in 0..12u32 {
        for x in 0..12u32 {
            let inside = (4..8).contains(&x) && (4..8).contains(&y);
            if !inside {
                assert_eq!(img.get_pixel(x, y), before.get_pixel(x, y), "({x},{y})");
            }
        }
    }
}

#[test]
fn fully_covered_canvas_is_left_alone() {
    let mut img = solid(4, 4, [9, 9, 9]);
    img.put_pixel(0, 0, image::Rgb([200, 0, 0]));
    let before = img.clone();
    let fp = Mask::from_rect(PixelRect::new(0, 0, 4, 4), 1.0)
        .resolve(Resolution::new(4, 4))
        .unwrap();

    heal(&mut img, &fp, 2);

    assert_eq!(img, before);
}

#[test]
fn healed_values_stay_within_border_range() {
    let mut img = RgbImage::from_fn(10, 10, |x, _| {
        if x < 5 {
            image::Rgb([0, 0, 0])
        } else {
            image::Rgb([200, 200, 200])
        }
    });
    let fp = Mask::from_rect(PixelRect::new(3, 3, 4, 4), 1.0)
        .resolve(Resolution::new(10, 10))
        .unwrap();

    heal(&mut img, &fp, 0);

    for y in 3..7 {
        for x in 3..7 {
            let v = img.get_pixel(x, y).0[0];
            assert!(v <= 200);
        }
    }
    // Left of the hole stays dark, right of it stays bright.
    assert!(img.get_pixel(3, 5).0[0] < img.get_pixel(6, 5).0[0]);
}
