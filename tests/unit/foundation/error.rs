use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VoidError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(VoidError::startup("x").to_string().contains("startup error:"));
    assert!(VoidError::schema("x").to_string().contains("schema error:"));
    assert!(
        VoidError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VoidError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_become_serde_variant() {
    let err: VoidError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, VoidError::Serde(_)));
}
