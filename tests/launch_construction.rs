use andino_webots_launcher::*;

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;

#[test]
fn construct_launch_artifacts_from_the_packaged_assets() {
    let config = LaunchConfig::resolve(&[]);
    assert!(config.world_path().ends_with("worlds/andino_webots.wbt"));
    assert!(config.world_path().exists());

    parse_translation(&config.translation).unwrap();
    parse_rotation(&config.rotation).unwrap();

    let templates = load_templates(&config.description_glob()).unwrap();
    let description = materialize_description(
        &templates,
        DEFAULT_DESCRIPTION_TEMPLATE,
        &DescriptionParameters::default(),
    )
    .unwrap();

    assert!(description.contains("use_gazebo_ros_control: false"));
    assert!(description.contains("use_fixed_caster: false"));
    assert!(!description.contains("libgazebo_ros_control.so"));
    assert!(description.contains(r#"<joint name="caster_joint" type="continuous">"#));
}

#[test]
fn world_override_changes_the_resolved_path() {
    let args = vec!["world:=my_custom.wbt".to_string()];
    let config = LaunchConfig::resolve(&args);
    assert!(config.world_path().ends_with("worlds/my_custom.wbt"));
}

#[tokio::test]
async fn spawn_request_carries_the_rendered_description() {
    let config = LaunchConfig::resolve(&[]);
    let templates = load_templates(&config.description_glob()).unwrap();
    let description = materialize_description(
        &templates,
        DEFAULT_DESCRIPTION_TEMPLATE,
        &DescriptionParameters::default(),
    )
    .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let supervisor = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut lines = Framed::new(stream, LinesCodec::new());
        let line = lines.next().await.unwrap().unwrap();
        let request: SpawnRequest = serde_json::from_str(&line).unwrap();
        assert_eq!(request.name, "andino");
        assert_eq!(request.translation, "0 0 0.022");
        assert_eq!(request.rotation, "0 0 1 0");
        assert!(request.robot_description.contains(r#"<robot name="andino">"#));
        lines.send("ok").await.unwrap();
    });

    let request = SpawnRequest {
        name: config.robot_name.clone(),
        robot_description: description,
        translation: config.translation.clone(),
        rotation: config.rotation.clone(),
    };
    let spawned = spawn_entity(
        &address,
        request,
        Duration::from_secs(5),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(spawned);
    supervisor.await.unwrap();
}
