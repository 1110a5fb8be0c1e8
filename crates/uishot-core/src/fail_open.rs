//! Fail-open utilities for absorbing non-critical failures
//!
//! The capture pipeline never lets one element or one page take down the
//! batch. These helpers log the error via `tracing::warn!` and turn it into
//! `None` so the caller can move on.
//!
//! DO NOT use fail-open for:
//! - Browser launch (the only fatal failure)
//! - Geometry reads whose result decides whether a record is emitted

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Run an async operation, logging and discarding its error
///
/// # Usage
///
/// ```no_run
/// use uishot_core::fail_open::fail_open;
/// use uishot_core::Result;
///
/// async fn close_page() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let closed = fail_open("page_close", || close_page()).await;
///     // closed is None if close_page() failed
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

/// Synchronous counterpart of [`fail_open`]
pub fn fail_open_sync<T>(operation_name: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UishotError;

    #[tokio::test]
    async fn test_fail_open_success() {
        let result = fail_open("test_op", || async { Ok::<_, UishotError>(42) }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn test_fail_open_failure() {
        let result = fail_open("test_op", || async {
            Err::<i32, _>(UishotError::Capture("clip outside surface".to_string()))
        })
        .await;
        assert_eq!(result, None);
    }

    #[test]
    fn test_fail_open_sync() {
        assert_eq!(fail_open_sync("test_op", Ok::<_, UishotError>("ok")), Some("ok"));
        assert_eq!(
            fail_open_sync::<()>("test_op", Err(UishotError::Other("boom".to_string()))),
            None
        );
    }
}
