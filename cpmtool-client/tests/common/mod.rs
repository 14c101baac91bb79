//! Shared helpers for client tests.

#![allow(dead_code)]

use cpmtool_client::{ClientConfig, CpmClient};
use cpmtool_device::{DeviceCache, DeviceResolver, HostPlatform, NoPrompt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCESS_KEY: &str = "test-access-key";
pub const DEVICE_NAME: &str = "Test Device";
pub const AUTH_TOKEN: &str = "auth-token-123";

/// A client pointed at `base_url` whose device name is already cached.
pub fn client_for(base_url: &str, dir: &TempDir) -> CpmClient {
    client_with_config(ClientConfig::with_base_url(base_url), dir)
}

/// Like [`client_for`], with full control over the configuration.
pub fn client_with_config(config: ClientConfig, dir: &TempDir) -> CpmClient {
    let cache_path = dir.path().join("device_token.json");
    std::fs::write(&cache_path, json!({ "device_name": DEVICE_NAME }).to_string()).unwrap();

    let resolver = DeviceResolver::with_parts(
        DeviceCache::new(cache_path),
        Arc::new(HostPlatform::default()),
        Arc::new(NoPrompt),
    );
    CpmClient::with_resolver(ACCESS_KEY, config, resolver).unwrap()
}

pub async fn setup() -> (MockServer, CpmClient, TempDir) {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = client_for(&server.uri(), &dir);
    (server, client, dir)
}

/// Mounts the device gate answering with `body`.
pub async fn mount_gate(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/check_device"))
        .and(query_param("key", ACCESS_KEY))
        .and(query_param("device_name", DEVICE_NAME))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_open_gate(server: &MockServer) {
    mount_gate(server, json!({ "ok": true })).await;
}

/// Accepts error reports so they show up in `received_requests`.
pub async fn mount_error_sink(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/errors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(server)
        .await;
}

/// Logs `client` in against `server`.
pub async fn login(server: &MockServer, client: &CpmClient) {
    Mock::given(method("POST"))
        .and(path("/account_login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true, "error": 0, "auth": AUTH_TOKEN })),
        )
        .mount(server)
        .await;
    assert_eq!(client.login("a@b.c", "secret").await.unwrap(), 0);
}

/// Waits for the detached error report about `endpoint` to arrive.
pub async fn wait_for_error_report(server: &MockServer, endpoint: &str) -> Option<Value> {
    for _ in 0..100 {
        let requests = server.received_requests().await.unwrap_or_default();
        let report = requests
            .iter()
            .filter(|r| r.url.path() == "/errors")
            .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
            .find(|body| body["endpoint"] == endpoint);
        if report.is_some() {
            return report;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}

/// Number of requests `server` saw for `path`.
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
