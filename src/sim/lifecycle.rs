use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::SimulatorExit;

pub static LIFECYCLE_TARGET: &'static str = "lifecycle";

/// The session is `Running` until the simulator leaves; `ShuttingDown` is
/// terminal. The transition is taken exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifecycleState {
    Running,
    ShuttingDown,
}

/// Supervises the session: waits for the simulator termination event (any
/// exit code) or an interrupt, then cancels the shared token exactly once
/// so every other managed task and process terminates. Fire-and-forget, the
/// children's termination is not verified here.
pub async fn lifecycle_coordinator(
    exit: oneshot::Receiver<SimulatorExit>,
    cancel: CancellationToken,
) -> LifecycleState {
    tokio::select! {
        exit = exit => match exit {
            Ok(SimulatorExit { code }) => {
                log::info!(target: LIFECYCLE_TARGET, "Simulator exited with code {:?}, shutting the session down.", code);
            }
            Err(_) => {
                log::error!(target: LIFECYCLE_TARGET, "Simulator monitor disappeared, shutting the session down.");
            }
        },
        _ = interrupt_signal() => {
            log::info!(target: LIFECYCLE_TARGET, "Interrupt received, shutting the session down.");
        }
    }

    cancel.cancel();
    LifecycleState::ShuttingDown
}

/// Resolves on Ctrl+C or SIGTERM, whichever comes first.
async fn interrupt_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::test]
async fn test_shutdown_fires_once_on_simulator_exit() {
    let (exit_tx, exit_rx) = oneshot::channel();
    let cancel = CancellationToken::new();

    exit_tx.send(SimulatorExit { code: Some(0) }).unwrap();
    let state = lifecycle_coordinator(exit_rx, cancel.clone()).await;

    assert_eq!(state, LifecycleState::ShuttingDown);
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_shutdown_fires_regardless_of_exit_code() {
    let (exit_tx, exit_rx) = oneshot::channel();
    let cancel = CancellationToken::new();

    exit_tx.send(SimulatorExit { code: Some(137) }).unwrap();
    let state = lifecycle_coordinator(exit_rx, cancel.clone()).await;

    assert_eq!(state, LifecycleState::ShuttingDown);
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_dropped_monitor_counts_as_exit() {
    let (exit_tx, exit_rx) = oneshot::channel::<SimulatorExit>();
    let cancel = CancellationToken::new();

    drop(exit_tx);
    let state = lifecycle_coordinator(exit_rx, cancel.clone()).await;

    assert_eq!(state, LifecycleState::ShuttingDown);
    assert!(cancel.is_cancelled());
}
