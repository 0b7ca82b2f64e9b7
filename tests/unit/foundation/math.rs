use super::*;

#[test]
fn fnv_is_independent_of_chunking() {
    let mut split = Fnv1a64::default();
    split.update(b"void").update(b"").update(b"grind");
    assert_eq!(split.finish(), fnv1a64_str("voidgrind"));
    assert_eq!(Fnv1a64::default().finish(), Fnv1a64::OFFSET_BASIS);
}

#[test]
fn fnv_matches_reference_vector() {
    // Published FNV-1a 64 test vector for "a".
    assert_eq!(fnv1a64_str("a"), 0xaf63_dc4c_8601_ec8c);
}

#[test]
fn rng_is_deterministic_and_in_unit_interval() {
    let mut a = Rng64::new(7);
    let mut b = Rng64::new(7);
    for _ in 0..256 {
        let x = a.next_f64_01();
        assert_eq!(x, b.next_f64_01());
        assert!((0.0..1.0).contains(&x));
    }
}
