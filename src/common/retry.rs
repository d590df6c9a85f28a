use crate::common::observer::Observer;
use crate::common::{Error, Result};
use std::thread;
use std::time::Duration;

/// Calls `f` up to `attempts` times, sleeping `delay` after each failure.
///
/// Returns the first successful value, or the error of the final attempt.
/// Every failed attempt is reported to the observer at warn level. Zero
/// attempts is treated as invalid input and `f` is never called.
pub fn retry<T, F>(attempts: usize, delay: Duration, observer: &dyn Observer, mut f: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    if attempts == 0 {
        return Err(Error::InvalidInput(
            "retry requires at least one attempt".to_string(),
        ));
    }

    let mut attempt = 1;
    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(err) => {
                observer.warn(&format!("Attempt {attempt} failed: {err}"));
                if attempt == attempts {
                    observer.error(&format!("All {attempts} attempts failed."));
                    return Err(err);
                }
                attempt += 1;
                thread::sleep(delay);
            }
        }
    }
}
