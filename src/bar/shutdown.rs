//! # Shutdown signal handling.
//!
//! [`wait_for_shutdown_signal`] completes when the process receives a
//! termination signal: `SIGINT` or `SIGTERM` on unix (the signals a
//! session manager or `kill` sends a bar), Ctrl-C elsewhere.

/// Waits for a termination signal.
///
/// Returns `Ok(())` when a signal is received, or `Err` if listener
/// registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when a signal is received, or `Err` if listener
/// registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
