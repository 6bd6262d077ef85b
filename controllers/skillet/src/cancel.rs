//! Ambient cancellation for collaborator calls

use crate::error::LifecycleError;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Await `call` unless `cancel` fires first
///
/// The call's own result is returned untouched so the caller can attach its
/// own error context; cancellation drops the in-flight future.
pub async fn guarded<F>(
    cancel: &CancellationToken,
    operation: &str,
    call: F,
) -> Result<F::Output, LifecycleError>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            warn!("Cancelled while {}", operation);
            Err(LifecycleError::Cancelled {
                operation: operation.to_string(),
            })
        }
        output = call => Ok(output),
    }
}
