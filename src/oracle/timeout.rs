use std::{sync::mpsc, time::Duration};

use crate::oracle::{OracleError, OracleResult};

/// Run `f`, giving up after `limit`.
///
/// With no limit the call runs inline. With a limit it runs on a helper
/// thread; on expiry the thread is detached and keeps running to completion,
/// its result discarded. A panic inside `f` is reported as a failure.
pub fn call_with_timeout<T, F>(limit: Option<Duration>, f: F) -> OracleResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> OracleResult<T> + Send + 'static,
{
    let Some(limit) = limit else {
        return f();
    };

    let (tx, rx) = mpsc::sync_channel(1);
    let spawned = std::thread::Builder::new()
        .name("voidgrind-oracle".to_string())
        .spawn(move || {
            let _ = tx.send(f());
        });
    if let Err(e) = spawned {
        return Err(OracleError::failed(format!("spawn oracle thread: {e}")));
    }

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(OracleError::Timeout(limit)),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(OracleError::failed("oracle thread exited without a result"))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/oracle/timeout.rs"]
mod tests;
