use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub static CONFIG_TARGET: &'static str = "launch_config";

pub static DEFAULT_WORLD: &'static str = "andino_webots.wbt";
pub static DEFAULT_ROBOT_NAME: &'static str = "andino";
pub static DEFAULT_TRANSLATION: &'static str = "0 0 0.022";
pub static DEFAULT_ROTATION: &'static str = "0 0 1 0";
pub static DEFAULT_SIMULATOR_BINARY: &'static str = "webots";
pub static DEFAULT_SUPERVISOR_PORT: u16 = 9560;
pub static DEFAULT_SPAWN_TIMEOUT_S: u64 = 60;

/// Simulation stepping mode handed to the simulator on its command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulationMode {
    Pause,
    Realtime,
    Fast,
}

impl SimulationMode {
    pub fn as_arg(&self) -> &'static str {
        match self {
            SimulationMode::Pause => "pause",
            SimulationMode::Realtime => "realtime",
            SimulationMode::Fast => "fast",
        }
    }
}

impl FromStr for SimulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pause" => Ok(SimulationMode::Pause),
            "realtime" => Ok(SimulationMode::Realtime),
            "fast" => Ok(SimulationMode::Fast),
            other => Err(format!("unknown simulation mode '{}'", other)),
        }
    }
}

/// Everything the launch session needs, resolved once at startup. No global
/// lookups happen after this struct is built.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub package_dir: PathBuf,
    pub world: String,
    pub simulator_binary: String,
    pub mode: SimulationMode,
    pub gui: bool,
    pub ros2_supervisor: bool,
    pub supervisor_port: u16,
    pub robot_name: String,
    pub translation: String,
    pub rotation: String,
    pub spawn_timeout: Duration,
}

impl LaunchConfig {
    /// Resolves the configuration from the environment plus `key:=value`
    /// command line overrides. Only `world` is recognized as an override.
    pub fn resolve(args: &[String]) -> LaunchConfig {
        let package_dir = match std::env::var("WEBOTS_PACKAGE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => match std::env::var("CARGO_MANIFEST_DIR") {
                Ok(dir) => PathBuf::from(dir),
                Err(e) => {
                    log::error!(target: CONFIG_TARGET, "Failed to read WEBOTS_PACKAGE_DIR environment variable: {}", e);
                    log::error!(target: CONFIG_TARGET, "Setting the package directory to the current directory.");
                    PathBuf::from(".")
                }
            },
        };

        let world = launch_override(args, "world").unwrap_or_else(|| DEFAULT_WORLD.to_string());

        let robot_name = match std::env::var("ROBOT_NAME") {
            Ok(name) => name,
            Err(_) => DEFAULT_ROBOT_NAME.to_string(),
        };

        let mode = env_parsed_or("WEBOTS_MODE", SimulationMode::Realtime);

        LaunchConfig {
            package_dir,
            world,
            simulator_binary: env_string_or("WEBOTS_BINARY", DEFAULT_SIMULATOR_BINARY),
            mode,
            gui: env_bool_or("WEBOTS_GUI", true),
            ros2_supervisor: env_bool_or("ROS2_SUPERVISOR", true),
            supervisor_port: env_parsed_or("SUPERVISOR_PORT", DEFAULT_SUPERVISOR_PORT),
            robot_name,
            translation: env_string_or("ROBOT_TRANSLATION", DEFAULT_TRANSLATION),
            rotation: env_string_or("ROBOT_ROTATION", DEFAULT_ROTATION),
            spawn_timeout: Duration::from_secs(env_parsed_or("SPAWN_TIMEOUT_S", DEFAULT_SPAWN_TIMEOUT_S)),
        }
    }

    /// `<package_dir>/worlds/<world>`. The file is not checked for
    /// existence, a missing world is the simulator's error to report.
    pub fn world_path(&self) -> PathBuf {
        self.package_dir.join("worlds").join(&self.world)
    }

    pub fn description_glob(&self) -> String {
        format!("{}/description/*.xacro", self.package_dir.to_string_lossy())
    }

    pub fn supervisor_address(&self) -> String {
        format!("127.0.0.1:{}", self.supervisor_port)
    }
}

/// Finds a `key:=value` override among the launch arguments.
pub fn launch_override(args: &[String], key: &str) -> Option<String> {
    args.iter().find_map(|arg| {
        arg.split_once(":=")
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
}

fn env_string_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) => val,
        Err(_) => default.to_string(),
    }
}

fn env_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val_str) => match val_str.to_lowercase().parse::<bool>() {
            Ok(b) => b,
            Err(e) => {
                log::error!(target: CONFIG_TARGET, "Failed to parse {} value '{}' as boolean: {}", key, val_str, e);
                log::error!(target: CONFIG_TARGET, "Setting {} to {}.", key, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_parsed_or<T: FromStr + std::fmt::Debug + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(val_str) => match val_str.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                log::error!(target: CONFIG_TARGET, "Failed to parse {} value '{}'.", key, val_str);
                log::error!(target: CONFIG_TARGET, "Setting {} to {:?}.", key, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[test]
fn test_default_world_path() {
    let config = LaunchConfig::resolve(&[]);
    assert!(config.world_path().ends_with("worlds/andino_webots.wbt"));
}

#[test]
fn test_world_override() {
    let args = vec!["world:=my_custom.wbt".to_string()];
    let config = LaunchConfig::resolve(&args);
    assert!(config.world_path().ends_with("worlds/my_custom.wbt"));
}

#[test]
fn test_launch_override_parsing() {
    let args = vec![
        "--something".to_string(),
        "world:=empty.wbt".to_string(),
        "mode:=fast".to_string(),
    ];
    assert_eq!(launch_override(&args, "world"), Some("empty.wbt".to_string()));
    assert_eq!(launch_override(&args, "mode"), Some("fast".to_string()));
    assert_eq!(launch_override(&args, "gui"), None);
}

#[test]
fn test_simulation_mode_from_str() {
    assert_eq!("realtime".parse::<SimulationMode>().unwrap(), SimulationMode::Realtime);
    assert_eq!("Fast".parse::<SimulationMode>().unwrap(), SimulationMode::Fast);
    assert!("turbo".parse::<SimulationMode>().is_err());
}
