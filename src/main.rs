use andino_webots_launcher::*;
use std::error::Error;
use tokio_util::sync::CancellationToken;

pub static NODE_ID: &'static str = "andino_webots_launcher";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    initialize_env_logger();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = LaunchConfig::resolve(&args);
    log::info!(target: NODE_ID, "Resolved world: {}", config.world_path().display());

    // Bad pose literals are a construction-time error, not something to
    // discover after the simulator is already up.
    parse_translation(&config.translation)?;
    parse_rotation(&config.rotation)?;

    let templates = load_templates(&config.description_glob())?;
    let description = materialize_description(
        &templates,
        DEFAULT_DESCRIPTION_TEMPLATE,
        &DescriptionParameters::default(),
    )?;

    let cancel = CancellationToken::new();

    let webots = start_webots(&config).await?;

    let supervisor_handle = if config.ros2_supervisor {
        match start_ros2_supervisor(&config, cancel.clone()).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!(target: NODE_ID, "Failed to start the supervisor bridge: {}", e);
                log::error!(target: NODE_ID, "Proceeding without it.");
                None
            }
        }
    } else {
        None
    };

    let request = SpawnRequest {
        name: config.robot_name.clone(),
        robot_description: description,
        translation: config.translation.clone(),
        rotation: config.rotation.clone(),
    };
    let address = config.supervisor_address();
    let spawn_timeout = config.spawn_timeout;
    let cancel_clone = cancel.clone();
    tokio::task::spawn(async move {
        match spawn_entity(&address, request, spawn_timeout, cancel_clone).await {
            Ok(true) => (),
            Ok(false) => {
                log::error!(target: NODE_ID, "The robot was not spawned.");
            }
            Err(e) => {
                log::error!(target: NODE_ID, "Spawn request failed with: {}", e);
            }
        }
    });

    log::info!(target: NODE_ID, "Launch session started.");

    lifecycle_coordinator(webots.exit, cancel).await;

    let _ = webots.monitor.await;
    if let Some(handle) = supervisor_handle {
        let _ = handle.await;
    }

    log::info!(target: NODE_ID, "Launch session ended.");

    Ok(())
}
