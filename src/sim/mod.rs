pub mod description;
pub mod lifecycle;
pub mod ros2_supervisor;
pub mod urdf_spawner;
pub mod webots_launcher;
