use tokio::signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    Interrupt,
    Terminate,
}

impl ShutdownReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install never fires.
pub(crate) async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        ShutdownReason::Interrupt
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
        ShutdownReason::Terminate
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<ShutdownReason>();

    let reason = tokio::select! {
        reason = interrupt => reason,
        reason = terminate => reason,
    };

    tracing::info!(signal = reason.as_str(), "Shutdown signal received, draining connections");
}
