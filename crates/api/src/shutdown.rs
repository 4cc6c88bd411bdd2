//! Process shutdown signals.

use std::future::Future;

use tracing::{error, info};

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let source = first_signal(ctrl_c, terminate).await;
    info!(signal = source, "Shutdown signal received");
}

/// Waits for whichever signal arrives first and names it.
async fn first_signal(
    ctrl_c: impl Future<Output = ()>,
    terminate: impl Future<Output = ()>,
) -> &'static str {
    tokio::select! {
        () = ctrl_c => "ctrl_c",
        () = terminate => "sigterm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_terminate_alone_triggers_shutdown() {
        let (tx, rx) = oneshot::channel::<()>();
        tx.send(()).unwrap();

        let source = first_signal(std::future::pending::<()>(), async {
            rx.await.ok();
        })
        .await;
        assert_eq!(source, "sigterm");
    }

    #[tokio::test]
    async fn test_ctrl_c_triggers_shutdown() {
        let source = first_signal(async {}, std::future::pending::<()>()).await;
        assert_eq!(source, "ctrl_c");
    }
}
