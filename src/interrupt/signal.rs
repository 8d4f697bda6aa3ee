use log::{error, info, warn};

/// Waits for SIGINT or SIGTERM. Returns `false` if no handler could be registered.
#[cfg(unix)]
pub async fn wait_for_signal() -> bool {
    use tokio::signal::unix::{SignalKind, signal};

    match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(mut sigint), Ok(mut sigterm)) => {
            tokio::select! {
                _ = sigint.recv() => info!("received SIGINT"),
                _ = sigterm.recv() => info!("received SIGTERM"),
            }
            true
        }
        (Ok(mut sigint), Err(e)) => {
            warn!("could not register SIGTERM handler, waiting for SIGINT only: {e}");
            sigint.recv().await;
            info!("received SIGINT");
            true
        }
        (Err(e), Ok(mut sigterm)) => {
            warn!("could not register SIGINT handler, waiting for SIGTERM only: {e}");
            sigterm.recv().await;
            info!("received SIGTERM");
            true
        }
        (Err(e), Err(_)) => {
            error!("could not register any signal handler, interrupts are not handled: {e}");
            false
        }
    }
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> bool {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("received Ctrl+C");
            true
        }
        Err(e) => {
            error!("failed to listen for Ctrl+C, interrupts are not handled: {e}");
            false
        }
    }
}
