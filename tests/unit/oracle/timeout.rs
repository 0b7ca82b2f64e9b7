use super::*;

#[test]
fn no_limit_runs_inline() {
    let out = call_with_timeout(None, || Ok::<_, OracleError>(41 + 1));
    assert_eq!(out, Ok(42));
}

#[test]
fn fast_call_returns_its_result() {
    let out = call_with_timeout(Some(Duration::from_secs(5)), || {
        Err::<u8, _>(OracleError::failed("nope"))
    });
    assert_eq!(out, Err(OracleError::Failed("nope".to_string())));
}

#[test]
fn slow_call_times_out() {
    let limit = Duration::from_millis(20);
    let out = call_with_timeout(Some(limit), || {
        std::thread::sleep(Duration::from_millis(500));
        Ok(1u8)
    });
    assert_eq!(out, Err(OracleError::Timeout(limit)));
}

#[test]
fn panicking_call_is_a_failure() {
    let out: OracleResult<u8> = call_with_timeout(Some(Duration::from_secs(5)), || {
        panic!("model exploded");
    });
    assert!(matches!(out, Err(OracleError::Failed(_))));
}
