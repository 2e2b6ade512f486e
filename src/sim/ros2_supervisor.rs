use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::LaunchConfig;

pub static SUPERVISOR_TARGET: &'static str = "ros2_supervisor";

/// Starts the supervisory bridge that relays simulator state to the
/// middleware and accepts spawn requests on the configured port. On session
/// shutdown the bridge is killed rather than awaited. A bridge that fails
/// to start is reported by the caller, not remediated here.
pub async fn start_ros2_supervisor(
    config: &LaunchConfig,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, Box<dyn std::error::Error + Send + Sync>> {
    let mut child = Command::new("ros2")
        .arg("run")
        .arg("webots_ros2_driver")
        .arg("ros2_supervisor")
        .arg("--ros-args")
        .arg("-p")
        .arg(format!("port:={}", config.supervisor_port))
        .spawn()?;

    log::info!(target: SUPERVISOR_TARGET,
        "Supervisor bridge started on port {}.", config.supervisor_port);

    let child_future = async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!(target: SUPERVISOR_TARGET, "Shutdown requested, stopping the supervisor bridge.");
                if let Err(e) = child.kill().await {
                    log::error!(target: SUPERVISOR_TARGET, "Failed to kill the supervisor bridge: {}", e);
                }
            }
            status = child.wait() => {
                match status {
                    Ok(status) => {
                        if !status.success() {
                            log::error!(target: SUPERVISOR_TARGET, "Supervisor bridge exited with code {:?}.", status.code());
                        } else {
                            log::info!(target: SUPERVISOR_TARGET, "Supervisor bridge exited successfully.");
                        }
                    }
                    Err(e) => {
                        log::error!(target: SUPERVISOR_TARGET, "Error waiting for the supervisor bridge: {}", e);
                    }
                }
            }
        }
    };

    let handle = tokio::spawn(child_future);

    Ok(handle)
}

#[tokio::test]
async fn test_shutdown_kills_a_lingering_child() {
    // Stands in for the bridge process: would sleep for an hour if the
    // cancellation path did not kill it.
    let mut child = Command::new("sleep").arg("3600").spawn().unwrap();
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = cancel_clone.cancelled() => {
                child.kill().await.unwrap();
            }
            _ = child.wait() => {}
        }
    });

    cancel.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
