use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::{LaunchConfig, SimulatorExit};

pub static WEBOTS_TARGET: &'static str = "webots_launcher";

/// Running simulator process. `exit` fires once when the process leaves,
/// with any exit code; there is no restart policy.
pub struct WebotsHandle {
    pub exit: oneshot::Receiver<SimulatorExit>,
    pub monitor: JoinHandle<()>,
}

/// Simulator command line: stepping mode, headless flags when the gui is
/// off, then the resolved world path.
pub fn webots_args(config: &LaunchConfig) -> Vec<String> {
    let mut args = vec![
        format!("--mode={}", config.mode.as_arg()),
        "--stdout".to_string(),
        "--stderr".to_string(),
    ];
    if !config.gui {
        args.push("--batch".to_string());
        args.push("--no-rendering".to_string());
    }
    args.push(config.world_path().to_string_lossy().to_string());
    args
}

/// Starts the simulator process. Failure to start is fatal to launch
/// construction; everything after that is reported through `exit`.
pub async fn start_webots(
    config: &LaunchConfig,
) -> Result<WebotsHandle, Box<dyn std::error::Error + Send + Sync>> {
    let mut command = Command::new(&config.simulator_binary);
    command.args(webots_args(config));
    log::info!(target: WEBOTS_TARGET,
        "Starting {} with world {}.", config.simulator_binary, config.world_path().display());
    spawn_and_monitor(command, WEBOTS_TARGET)
}

/// Spawns a child process and monitors it on a task: the returned receiver
/// resolves once, when the child exits.
pub fn spawn_and_monitor(
    mut command: Command,
    log_target: &'static str,
) -> Result<WebotsHandle, Box<dyn std::error::Error + Send + Sync>> {
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            log::error!(target: log_target, "Failed to spawn the simulator process: {}", e);
            return Err(Box::new(e));
        }
    };

    let (exit_tx, exit_rx) = oneshot::channel();
    let child_future = async move {
        match child.wait().await {
            Ok(status) => {
                if !status.success() {
                    log::error!(target: log_target, "Simulator exited with code {:?}.", status.code());
                } else {
                    log::info!(target: log_target, "Simulator exited successfully.");
                }
                let _ = exit_tx.send(SimulatorExit { code: status.code() });
            }
            Err(e) => {
                log::error!(target: log_target, "Error waiting for the simulator: {}", e);
                let _ = exit_tx.send(SimulatorExit { code: None });
            }
        }
    };

    let monitor = tokio::spawn(child_future);

    Ok(WebotsHandle {
        exit: exit_rx,
        monitor,
    })
}

#[cfg(test)]
fn test_config() -> LaunchConfig {
    use crate::SimulationMode;
    use std::path::PathBuf;
    use std::time::Duration;

    LaunchConfig {
        package_dir: PathBuf::from("/opt/andino_webots"),
        world: "andino_webots.wbt".to_string(),
        simulator_binary: "webots".to_string(),
        mode: SimulationMode::Realtime,
        gui: true,
        ros2_supervisor: true,
        supervisor_port: 9560,
        robot_name: "andino".to_string(),
        translation: "0 0 0.022".to_string(),
        rotation: "0 0 1 0".to_string(),
        spawn_timeout: Duration::from_secs(60),
    }
}

#[test]
fn test_webots_args_with_gui() {
    let args = webots_args(&test_config());
    assert_eq!(args[0], "--mode=realtime");
    assert!(!args.contains(&"--no-rendering".to_string()));
    assert_eq!(
        args.last().unwrap(),
        "/opt/andino_webots/worlds/andino_webots.wbt"
    );
}

#[test]
fn test_webots_args_headless_fast() {
    use crate::SimulationMode;

    let mut config = test_config();
    config.gui = false;
    config.mode = SimulationMode::Fast;
    let args = webots_args(&config);
    assert_eq!(args[0], "--mode=fast");
    assert!(args.contains(&"--batch".to_string()));
    assert!(args.contains(&"--no-rendering".to_string()));
}

#[tokio::test]
async fn test_exit_event_carries_the_exit_code() {
    let mut command = Command::new("sh");
    command.arg("-c").arg("exit 7");
    let handle = spawn_and_monitor(command, WEBOTS_TARGET).unwrap();
    let exit = handle.exit.await.unwrap();
    assert_eq!(exit, SimulatorExit { code: Some(7) });
    handle.monitor.await.unwrap();
}

#[tokio::test]
async fn test_spawn_failure_is_fatal() {
    let command = Command::new("/nonexistent/simulator/binary");
    assert!(spawn_and_monitor(command, WEBOTS_TARGET).is_err());
}
