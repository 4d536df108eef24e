//! Bounded retry-and-report wrappers.
//!
//! Corresponds to `upsonic/utils/error_wrapper.py` (`upsonic_error_handler`):
//! operations are attempted up to `max_retries` extra times with exponential
//! backoff, and error details are logged when `show_error_details` is set.
//! Configuration errors (missing model, uninitialized engine) are surfaced
//! immediately without retrying.

use std::future::Future;
use std::time::Duration;

use crate::utilities::errors::KnowledgeBaseError;

const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Run an async operation with bounded retries and error reporting.
///
/// # Arguments
/// * `operation` - Name used in log messages (e.g., "setup_rag").
/// * `max_retries` - Number of additional attempts after the first failure.
/// * `show_error_details` - Log the full error chain on each failure.
/// * `f` - Factory producing a fresh future per attempt.
pub async fn with_error_report<T, F, Fut>(
    operation: &str,
    max_retries: u32,
    show_error_details: bool,
    mut f: F,
) -> Result<T, KnowledgeBaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, KnowledgeBaseError>>,
{
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut last_error: Option<KnowledgeBaseError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            log::warn!("{} retry attempt {} after {:?}", operation, attempt, retry_delay);
            tokio::time::sleep(retry_delay).await;
            retry_delay *= 2; // Exponential backoff
        }

        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_configuration() => {
                if show_error_details {
                    log::error!("{} configuration error: {}", operation, e);
                }
                return Err(e);
            }
            Err(e) => {
                if show_error_details {
                    log::error!("{} failed on attempt {}: {}", operation, attempt + 1, e);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        KnowledgeBaseError::Engine(anyhow::anyhow!("{} failed with no recorded error", operation))
    }))
}

/// Run a blocking operation with bounded retries and error reporting.
///
/// Synchronous sibling of [`with_error_report`] for non-async call sites
/// such as markdown rendering.
pub fn with_error_report_blocking<T, F>(
    operation: &str,
    max_retries: u32,
    show_error_details: bool,
    mut f: F,
) -> Result<T, KnowledgeBaseError>
where
    F: FnMut() -> Result<T, KnowledgeBaseError>,
{
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut last_error: Option<KnowledgeBaseError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            log::warn!("{} retry attempt {} after {:?}", operation, attempt, retry_delay);
            std::thread::sleep(retry_delay);
            retry_delay *= 2;
        }

        match f() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_configuration() => {
                if show_error_details {
                    log::error!("{} configuration error: {}", operation, e);
                }
                return Err(e);
            }
            Err(e) => {
                if show_error_details {
                    log::error!("{} failed on attempt {}: {}", operation, attempt + 1, e);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        KnowledgeBaseError::Engine(anyhow::anyhow!("{} failed with no recorded error", operation))
    }))
}
