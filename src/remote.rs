// remote.rs
//
// The store behind the dashboard: one listing of every device, and a
// command endpoint that answers with nothing useful.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::error::SyncError;
use crate::models::{Command, DeviceSnapshot};

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Every device's current snapshot in one round trip.
    async fn fetch_devices(&self) -> Result<Vec<DeviceSnapshot>, SyncError>;

    async fn send_command(&self, command: &Command) -> Result<(), SyncError>;
}

/// `GET {base}/devices` and `POST {base}/command` over JSON.
pub struct HttpRemote {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpRemote {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, SyncError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, parse_base(base_url)?))
    }

    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        Ok(self.base_url.join(path)?)
    }
}

/// Ensures a trailing slash so `join` appends instead of replacing the last
/// path segment (`.../prod` + `devices` → `.../prod/devices`).
fn parse_base(raw: &str) -> Result<Url, SyncError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_devices(&self) -> Result<Vec<DeviceSnapshot>, SyncError> {
        let url = self.endpoint("devices")?;
        trace!(%url, "fetching devices");
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = resp.bytes().await?;
        let entries: Vec<serde_json::Value> = serde_json::from_slice(&body)?;
        let total = entries.len();
        // A record without a usable deviceId simply matches no adapter.
        let devices: Vec<DeviceSnapshot> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<DeviceSnapshot>(entry) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    debug!(error = %e, "skipping malformed device entry");
                    None
                }
            })
            .collect();
        debug!(count = devices.len(), skipped = total - devices.len(), "devices fetched");
        Ok(devices)
    }

    async fn send_command(&self, command: &Command) -> Result<(), SyncError> {
        let url = self.endpoint("command")?;
        debug!(device_id = %command.device_id, command = %command.command, value = %command.value, "sending command");
        let resp = self.http.post(url.clone()).json(command).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommandName, Scalar};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, HttpRemote) {
        let server = MockServer::start().await;
        let remote = HttpRemote::new(&format!("{}/prod", server.uri()), None).unwrap();
        (server, remote)
    }

    #[test]
    fn base_url_keeps_its_path() {
        let url = parse_base("https://example.com/prod").unwrap();
        assert_eq!(url.join("devices").unwrap().as_str(), "https://example.com/prod/devices");
        assert!(parse_base("not a url").is_err());
    }

    #[tokio::test]
    async fn fetch_parses_loose_snapshots() {
        let (server, remote) = setup().await;
        Mock::given(method("GET"))
            .and(path("/prod/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "deviceId": "lamp1", "status": "ON", "brightness": "70", "color": "#00ff00" },
                { "deviceId": "thermo1", "display_temperature": 21.5, "display_unit": "C" }
            ])))
            .mount(&server)
            .await;

        let devices = remote.fetch_devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_id, "lamp1");
        assert_eq!(devices[0].field("brightness"), Some(&json!("70")));
        assert_eq!(devices[1].field("display_temperature"), Some(&json!(21.5)));
    }

    #[tokio::test]
    async fn non_success_is_an_error() {
        let (server, remote) = setup().await;
        Mock::given(method("GET"))
            .and(path("/prod/devices"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let result = remote.fetch_devices().await;
        assert!(
            matches!(result, Err(SyncError::Status { status: 502, .. })),
            "expected Status error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn command_body_uses_the_wire_names() {
        let (server, remote) = setup().await;
        Mock::given(method("POST"))
            .and(path("/prod/command"))
            .and(body_json(json!({
                "deviceId": "lamp1",
                "command": "set_brightness",
                "value": 70
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let cmd = Command::new("lamp1", CommandName::SetBrightness, Scalar::Int(70));
        remote.send_command(&cmd).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped() {
        let (server, remote) = setup().await;
        Mock::given(method("GET"))
            .and(path("/prod/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "deviceId": "lamp1", "status": "ON", "brightness": 70 },
                { "status": "orphan" },
                { "deviceId": 42, "status": "ON" },
                "noise"
            ])))
            .mount(&server)
            .await;

        let devices = remote.fetch_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_id, "lamp1");
        assert_eq!(devices[0].field("status"), Some(&json!("ON")));
    }

    #[tokio::test]
    async fn non_array_body_is_a_decode_error() {
        let (server, remote) = setup().await;
        Mock::given(method("GET"))
            .and(path("/prod/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "devices": [] })))
            .mount(&server)
            .await;

        assert!(matches!(remote.fetch_devices().await, Err(SyncError::Decode(_))));
    }

    #[tokio::test]
    async fn command_rejected_by_the_store_is_a_status_error() {
        let (server, remote) = setup().await;
        Mock::given(method("POST"))
            .and(path("/prod/command"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let cmd = Command::new("lamp1", CommandName::SetStatus, "ON");
        let result = remote.send_command(&cmd).await;
        assert!(
            matches!(result, Err(SyncError::Status { status: 500, ref url }) if url.ends_with("/prod/command")),
            "expected Status error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn command_transport_failure_is_reported() {
        let remote = HttpRemote::new("http://127.0.0.1:9/prod", None).unwrap();
        let cmd = Command::new("lock1", CommandName::SetStatus, "LOCKED");
        assert!(matches!(
            remote.send_command(&cmd).await,
            Err(SyncError::Transport(_))
        ));
    }
}
