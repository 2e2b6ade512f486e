use serde::{Deserialize, Serialize};

/// Substitution flags applied when rendering the robot description template.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DescriptionParameters {
    pub use_gazebo_ros_control: bool,
    pub use_fixed_caster: bool,
}

/// One-shot request asking the supervisor to put a named robot into the
/// running simulation. Pose literals keep the whitespace-separated form the
/// simulator expects: `translation` is "x y z", `rotation` is axis-angle
/// "x y z angle".
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SpawnRequest {
    pub name: String,
    pub robot_description: String,
    pub translation: String,
    pub rotation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnReply {
    Ok,
    Error(String),
}

/// Termination event of the simulator process. `code` is None when the
/// process was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorExit {
    pub code: Option<i32>,
}

pub fn parse_spawn_reply(line: &str) -> SpawnReply {
    let line = line.trim();
    if line == "ok" {
        return SpawnReply::Ok;
    }
    if let Some(reason) = line.strip_prefix("error") {
        return SpawnReply::Error(reason.trim().to_string());
    }
    SpawnReply::Error(line.to_string())
}

fn parse_pose_components(literal: &str) -> Result<Vec<f64>, Box<dyn std::error::Error + Send + Sync>> {
    literal
        .split_whitespace()
        .map(|c| {
            c.parse::<f64>()
                .map_err(|e| format!("bad pose component '{}': {}", c, e).into())
        })
        .collect()
}

/// Validates an "x y z" translation literal.
pub fn parse_translation(literal: &str) -> Result<[f64; 3], Box<dyn std::error::Error + Send + Sync>> {
    let components = parse_pose_components(literal)?;
    match components.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        other => Err(format!(
            "translation '{}' has {} components, expected 3",
            literal,
            other.len()
        )
        .into()),
    }
}

/// Validates an axis-angle "x y z angle" rotation literal.
pub fn parse_rotation(literal: &str) -> Result<[f64; 4], Box<dyn std::error::Error + Send + Sync>> {
    let components = parse_pose_components(literal)?;
    match components.as_slice() {
        [x, y, z, angle] => Ok([*x, *y, *z, *angle]),
        other => Err(format!(
            "rotation '{}' has {} components, expected 4",
            literal,
            other.len()
        )
        .into()),
    }
}

#[test]
fn test_parse_translation() {
    assert_eq!(parse_translation("0 0 0.022").unwrap(), [0.0, 0.0, 0.022]);
    assert!(parse_translation("0 0").is_err());
    assert!(parse_translation("0 0 up").is_err());
}

#[test]
fn test_parse_rotation() {
    assert_eq!(parse_rotation(" 0 0 1 0").unwrap(), [0.0, 0.0, 1.0, 0.0]);
    assert!(parse_rotation("0 0 1").is_err());
}

#[test]
fn test_parse_spawn_reply() {
    assert_eq!(parse_spawn_reply("ok"), SpawnReply::Ok);
    assert_eq!(
        parse_spawn_reply("error entity already exists"),
        SpawnReply::Error("entity already exists".to_string())
    );
    assert_eq!(
        parse_spawn_reply("garbage"),
        SpawnReply::Error("garbage".to_string())
    );
}

#[test]
fn test_spawn_request_is_a_single_json_line() {
    let request = SpawnRequest {
        name: "andino".to_string(),
        robot_description: "<robot name=\"andino\">\n</robot>".to_string(),
        translation: "0 0 0.022".to_string(),
        rotation: "0 0 1 0".to_string(),
    };
    let line = serde_json::to_string(&request).unwrap();
    assert!(!line.contains('\n'));
    let back: SpawnRequest = serde_json::from_str(&line).unwrap();
    assert_eq!(back.name, "andino");
    assert!(back.robot_description.contains('\n'));
}
