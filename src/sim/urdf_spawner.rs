use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;

use crate::{parse_spawn_reply, SpawnReply, SpawnRequest};

/// Connect loop keeps trying to connect to address until it succeeds, or
/// until the session shuts down.
async fn connect_loop(
    address: &str,
    cancel: &CancellationToken,
    log_target: &str,
) -> Option<TcpStream> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            ret = TcpStream::connect(address) => match ret {
                Ok(s) => {
                    log::info!(target: log_target, "Connected to the supervisor at {}.", address);
                    return Some(s);
                }
                Err(e) => {
                    log::warn!(target: log_target, "Could not connect to the supervisor at {}: {}", address, e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

/// Issues the one-time spawn request: one JSON line out, one `ok`/`error`
/// line back. Returns whether the entity was spawned. No retry after a
/// reply, a duplicate name is the simulator's problem.
pub async fn spawn_entity(
    address: &str,
    request: SpawnRequest,
    spawn_timeout: Duration,
    cancel: CancellationToken,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let log_target = format!("{}_spawner", request.name);
    match timeout(
        spawn_timeout,
        send_spawn_request(address, &request, &cancel, &log_target),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            log::error!(target: &log_target, "Spawn request timed out after {:?}.", spawn_timeout);
            Err(format!("spawn request for '{}' timed out", request.name).into())
        }
    }
}

async fn send_spawn_request(
    address: &str,
    request: &SpawnRequest,
    cancel: &CancellationToken,
    log_target: &str,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let stream = match connect_loop(address, cancel, log_target).await {
        Some(stream) => stream,
        None => {
            log::warn!(target: log_target, "Shutdown requested before the spawn request was sent.");
            return Ok(false);
        }
    };

    // line-based protocol
    let mut lines = Framed::new(stream, LinesCodec::new());

    let payload = serde_json::to_string(request)?;
    lines.send(&payload).await?;

    match lines.next().await {
        Some(Ok(line)) => match parse_spawn_reply(&line) {
            SpawnReply::Ok => {
                log::info!(target: log_target, "Simulator accepted '{}'.", request.name);
                Ok(true)
            }
            SpawnReply::Error(reason) => {
                log::error!(target: log_target, "Simulator rejected '{}': {}", request.name, reason);
                Ok(false)
            }
        },
        Some(Err(e)) => Err(Box::new(e)),
        None => {
            log::error!(target: log_target, "Supervisor closed the connection without a reply.");
            Ok(false)
        }
    }
}

#[cfg(test)]
fn test_request() -> SpawnRequest {
    SpawnRequest {
        name: "andino".to_string(),
        robot_description: "<robot name=\"andino\"></robot>".to_string(),
        translation: "0 0 0.022".to_string(),
        rotation: "0 0 1 0".to_string(),
    }
}

#[cfg(test)]
async fn one_shot_supervisor(reply: &'static str) -> std::net::SocketAddr {
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut lines = Framed::new(stream, LinesCodec::new());
        let line = lines.next().await.unwrap().unwrap();
        let request: SpawnRequest = serde_json::from_str(&line).unwrap();
        assert_eq!(request.name, "andino");
        assert_eq!(request.translation, "0 0 0.022");
        lines.send(reply).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_spawn_accepted() {
    let addr = one_shot_supervisor("ok").await;
    let spawned = spawn_entity(
        &addr.to_string(),
        test_request(),
        Duration::from_secs(5),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert!(spawned);
}

#[tokio::test]
async fn test_spawn_rejected() {
    let addr = one_shot_supervisor("error entity already exists").await;
    let spawned = spawn_entity(
        &addr.to_string(),
        test_request(),
        Duration::from_secs(5),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert!(!spawned);
}

#[tokio::test]
async fn test_shutdown_aborts_a_pending_spawn() {
    // Nothing is listening here, the spawner stays in its connect loop
    // until the token fires.
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel_clone.cancel();
    });
    let spawned = spawn_entity(
        "10.255.255.1:9560",
        test_request(),
        Duration::from_secs(30),
        cancel,
    )
    .await
    .unwrap();
    assert!(!spawned);
}
