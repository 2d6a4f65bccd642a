//! Command implementations for bmcfwctl CLI

pub mod inspect;
pub mod install;

use std::time::Duration;

use bmcfw_install::OperationContext;
use tracing::warn;

/// Context bounded by an optional deadline in minutes and cancelled on Ctrl-C
pub fn operation_context(deadline_mins: Option<u64>) -> OperationContext {
    let ctx = deadline_mins.map_or_else(OperationContext::unbounded, |mins| {
        OperationContext::with_timeout(Duration::from_secs(mins.saturating_mul(60)))
    });

    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            token.cancel();
        }
    });
    ctx
}
