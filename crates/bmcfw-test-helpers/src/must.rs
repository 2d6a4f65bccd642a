//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code. `#[track_caller]`
//! keeps the panic location pointing at the test, not at this crate.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value on `Err`.
///
/// # Example
///
/// ```rust
/// use bmcfw_test_helpers::must;
///
/// let result: Result<i32, &str> = Ok(42);
/// assert_eq!(must(result), 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap the error of a `Result` that is expected to fail.
///
/// # Example
///
/// ```rust
/// use bmcfw_test_helpers::must_err;
///
/// let result: Result<i32, &str> = Err("refused");
/// assert_eq!(must_err(result), "refused");
/// ```
///
/// # Panics
///
/// Panics if the result is `Ok`.
#[track_caller]
pub fn must_err<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("must_err: unexpected Ok: {v:?}"),
        Err(e) => e,
    }
}
