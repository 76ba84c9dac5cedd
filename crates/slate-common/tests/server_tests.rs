//! Payload server integration tests: bound before start returns, serves the
//! staged file at the expected path, and shuts down cleanly.

use slate_common::UpdateServer;
use std::path::Path;

fn stage_payload(root: &Path) -> String {
    let updates = root.join("updates");
    std::fs::create_dir(&updates).unwrap();
    let name = "3.2.3.1595_reMarkable2-wVbHkgKisg.signed";
    std::fs::write(updates.join(name), b"firmware bytes").unwrap();
    format!("updates/{name}")
}

#[tokio::test(flavor = "multi_thread")]
async fn serves_staged_payload_then_stops() {
    let dir = tempfile::tempdir().unwrap();
    let payload_path = stage_payload(dir.path());

    let server = UpdateServer::start(dir.path(), "127.0.0.1", 0).await.unwrap();
    let base = format!("http://{}", server.local_addr());

    let response = reqwest::get(format!("{base}/{payload_path}")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"firmware bytes");

    let missing = reqwest::get(format!("{base}/updates/nope.signed"))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    server.stop().await;

    // the socket is gone once stop returns
    assert!(reqwest::get(format!("{base}/{payload_path}")).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_without_any_request_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    stage_payload(dir.path());

    let server = UpdateServer::start(dir.path(), "127.0.0.1", 0).await.unwrap();
    assert_ne!(server.port(), 0, "ephemeral port resolved at bind time");
    server.stop().await;
}
