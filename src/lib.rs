pub mod core;
pub use self::core::config::*;
pub use self::core::structs::*;

pub mod sim;
pub use sim::description::*;
pub use sim::lifecycle::*;
pub use sim::ros2_supervisor::*;
pub use sim::urdf_spawner::*;
pub use sim::webots_launcher::*;

pub fn initialize_env_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
