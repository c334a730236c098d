//! 🗄️ REST content repository: where the claim photos live and where their labels go.
//!
//! Two endpoints, both behind basic auth:
//! - `GET  {host}{api_path}/nodes/{id}/content` → raw bytes
//! - `PUT  {host}{api_path}/nodes/{id}`         → JSON metadata patch
//!
//! ⚠️ Status codes are LOGGED, not ENFORCED. A 404 on the content fetch still hands
//! its (error page) bytes to the classifier, and a 500 on the update still counts
//! as written. That is the long-standing behavior of this pipeline and the success
//! counts depend on it. Tightening it is a requirements change, not a bug fix.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::asset_repository::AssetRepository;
use crate::common::AssetContent;
use crate::metadata::UpdateRequest;

/// 🔧 How to reach the repository and who to be when we get there.
#[derive(Deserialize, Clone)]
pub struct RepositoryConfig {
    /// 📡 Hostname or base URL. A bare hostname gets `http://` glued on.
    pub host: String,
    /// 🔒 Basic-auth user. Defaults to `admin`, as repositories have since the dawn of time.
    #[serde(default = "default_username")]
    pub username: String,
    /// 🔒 Basic-auth password. Never printed by `Debug`.
    #[serde(default)]
    pub password: Option<String>,
    /// 🧭 Public REST API root under the host.
    #[serde(default = "default_api_path")]
    pub api_path: String,
    /// ⏱️ Optional TCP connect timeout. Unset means reqwest's default: wait.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// ⏱️ Optional whole-request timeout. Unset means a slow photo is still a photo.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_api_path() -> String {
    "/alfresco/api/-default-/public/alfresco/versions/1".to_string()
}

// 🎭 Hand-written so the password stays out of logs. `{:?}` on a config should not be a breach.
impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("api_path", &self.api_path)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl RepositoryConfig {
    /// 🧭 `{scheme}://{host}{api_path}` with no trailing slash.
    pub fn base_url(&self) -> String {
        let the_host = self.host.trim_end_matches('/');
        let the_host = if the_host.starts_with("http://") || the_host.starts_with("https://") {
            the_host.to_string()
        } else {
            format!("http://{the_host}")
        };
        let the_api_path = self.api_path.trim_matches('/');
        if the_api_path.is_empty() {
            the_host
        } else {
            format!("{the_host}/{the_api_path}")
        }
    }

    pub fn node_url(&self, asset_id: &str) -> String {
        format!("{}/nodes/{}", self.base_url(), asset_id)
    }

    pub fn content_url(&self, asset_id: &str) -> String {
        format!("{}/content", self.node_url(asset_id))
    }
}

/// 📡 The reqwest-backed repository. One client, reused for every record in the batch.
#[derive(Debug)]
pub(crate) struct RestContentRepository {
    client: reqwest::Client,
    config: RepositoryConfig,
}

impl RestContentRepository {
    /// 🚀 Build the HTTP client. No ping: an unreachable repository is a per-record
    /// problem, and it will show up as exactly that on the first fetch.
    pub(crate) fn new(config: RepositoryConfig) -> Result<Self> {
        let mut the_builder = reqwest::Client::builder();
        // ⏱️ only set when configured; unset means no client-side timeout at all
        if let Some(secs) = config.connect_timeout_secs {
            the_builder = the_builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.request_timeout_secs {
            the_builder = the_builder.timeout(Duration::from_secs(secs));
        }
        let client = the_builder
            .build()
            .context("💀 The HTTP client refused to be born. Probably TLS. It's always TLS.")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl AssetRepository for RestContentRepository {
    async fn fetch_content(&self, asset_id: &str) -> Result<AssetContent> {
        // 🧭 {host}{api_path}/nodes/{id}/content, the photo's front door
        let the_url = self.config.content_url(asset_id);
        debug!("📡 retrieving content from: {the_url}");

        // 📡 one GET, basic auth, no retries. If the wire is down, this record is down.
        let the_response = self
            .client
            .get(&the_url)
            .basic_auth(&self.config.username, self.config.password.as_ref())
            .send()
            .await
            .with_context(|| {
                format!("💀 Could not reach the repository to fetch content for node '{asset_id}'")
            })?;

        // 📋 grab the status before the body consumes the response
        let the_status = the_response.status();
        // 📦 buffer the whole thing. No streaming contract, the classifier wants it all at once.
        let the_bytes = the_response
            .bytes()
            .await
            .with_context(|| {
                format!("💀 The content body for node '{asset_id}' was cut off mid-stream")
            })?;

        // ⚠️ logged, never judged: a 404 page is still bytes, and the classifier gets them
        if the_status.is_success() {
            debug!(
                "📸 Retrieved {} bytes of content with status: {the_status}",
                the_bytes.len()
            );
        } else {
            warn!(
                "⚠️ Content for node '{asset_id}' came back with status {the_status}; passing its {} bytes on anyway",
                the_bytes.len()
            );
        }

        Ok(AssetContent {
            asset_id: asset_id.to_string(),
            bytes: the_bytes.to_vec(),
            status: the_status.as_u16(),
        })
    }

    async fn update_node(&self, asset_id: &str, request: &UpdateRequest) -> Result<()> {
        // 🧭 the node itself this time, not its content
        let the_url = self.config.node_url(asset_id);
        // 📦 serialize up front so the debug line shows exactly what goes over the wire
        let the_body =
            serde_json::to_vec(request).context("💀 The update request would not serialize")?;
        debug!(
            "📤 Updating image '{asset_id}' with: {}",
            String::from_utf8_lossy(&the_body)
        );

        // 📤 one PUT, same credentials, JSON body. Fire, then wait for the answer.
        let the_response = self
            .client
            .put(&the_url)
            .basic_auth(&self.config.username, self.config.password.as_ref())
            .header(CONTENT_TYPE, "application/json")
            .body(the_body)
            .send()
            .await
            .with_context(|| {
                format!("💀 Failed to update image '{asset_id}'. The PUT never landed.")
            })?;

        let the_status = the_response.status();
        // 🧹 drain the body so the update only counts once the exchange is complete
        the_response
            .bytes()
            .await
            .with_context(|| {
                format!("💀 The update response for '{asset_id}' was cut off mid-stream")
            })?;

        // ⚠️ a 500 still counts as written. Logged loudly, counted quietly.
        if the_status.is_success() {
            info!("✅ Successfully updated image '{asset_id}' with status: {the_status}");
        } else {
            warn!("⚠️ Update of image '{asset_id}' answered {the_status}; counted as written");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::classify::Category;
    use crate::metadata::MetadataConfig;

    // 🔒 base64("admin:secret")
    const THE_BASIC_AUTH: &str = "Basic YWRtaW46c2VjcmV0";
    const THE_API: &str = "/alfresco/api/-default-/public/alfresco/versions/1";

    fn config_pointing_at(server: &MockServer) -> RepositoryConfig {
        RepositoryConfig {
            host: server.uri(),
            username: "admin".to_string(),
            password: Some("secret".to_string()),
            api_path: default_api_path(),
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }

    #[test]
    fn the_one_where_a_bare_hostname_gets_a_scheme() {
        let the_config: RepositoryConfig =
            toml::from_str(r#"host = "repo.example.com""#).expect("💀 host-only config");
        assert_eq!(
            the_config.content_url("n1"),
            "http://repo.example.com/alfresco/api/-default-/public/alfresco/versions/1/nodes/n1/content"
        );
        assert_eq!(the_config.username, "admin");
        assert_eq!(the_config.connect_timeout_secs, None);
        assert_eq!(the_config.request_timeout_secs, None);
    }

    #[test]
    fn the_one_where_slashes_do_not_multiply() {
        let the_config: RepositoryConfig = toml::from_str(
            r#"
            host = "https://repo.example.com/"
            api_path = "/api/v1/"
            "#,
        )
        .expect("💀 config with slashes");
        assert_eq!(the_config.node_url("n1"), "https://repo.example.com/api/v1/nodes/n1");
    }

    #[test]
    fn the_one_where_debug_keeps_the_password_a_secret() {
        let the_config: RepositoryConfig = toml::from_str(
            r#"
            host = "repo"
            password = "hunter2"
            "#,
        )
        .expect("💀 config");
        let the_debug = format!("{the_config:?}");
        assert!(!the_debug.contains("hunter2"));
        assert!(the_debug.contains("***"));
    }

    #[tokio::test]
    async fn the_one_where_content_comes_back_as_bytes_with_basic_auth() -> Result<()> {
        let the_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{THE_API}/nodes/n1/content")))
            .and(header("authorization", THE_BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, 0xff, 0xe0]))
            .expect(1)
            .mount(&the_server)
            .await;

        let the_repo = RestContentRepository::new(config_pointing_at(&the_server))?;
        let the_content = the_repo.fetch_content("n1").await?;

        assert_eq!(the_content.asset_id, "n1");
        assert_eq!(the_content.bytes, vec![0xff, 0xd8, 0xff, 0xe0]);
        assert_eq!(the_content.status, 200);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_404_is_still_treated_as_alive() -> Result<()> {
        let the_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{THE_API}/nodes/missing/content")))
            .respond_with(ResponseTemplate::new(404).set_body_string("{\"error\":\"not found\"}"))
            .mount(&the_server)
            .await;

        let the_repo = RestContentRepository::new(config_pointing_at(&the_server))?;
        let the_content = the_repo.fetch_content("missing").await?;

        assert_eq!(the_content.status, 404);
        assert_eq!(the_content.bytes, b"{\"error\":\"not found\"}".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_put_carries_the_claim_type() -> Result<()> {
        let the_server = MockServer::start().await;
        let the_request =
            MetadataConfig::default().build_request(Category::Boat, 1_500_000_000_000);

        Mock::given(method("PUT"))
            .and(path(format!("{THE_API}/nodes/n1")))
            .and(header("authorization", THE_BASIC_AUTH))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "nodeType": "acme:insuranceClaimImage",
                "properties": {
                    "acme:imageId": 1_500_000_000_000i64,
                    "acme:claimType": "Boat"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&the_server)
            .await;

        let the_repo = RestContentRepository::new(config_pointing_at(&the_server))?;
        the_repo.update_node("n1", &the_request).await?;
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_500_on_update_still_counts_as_written() -> Result<()> {
        let the_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(format!("{THE_API}/nodes/n1")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&the_server)
            .await;

        let the_repo = RestContentRepository::new(config_pointing_at(&the_server))?;
        let the_request = MetadataConfig::default().build_request(Category::Unknown, 42);
        the_repo.update_node("n1", &the_request).await?;
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_slow_photo_is_still_a_photo() -> Result<()> {
        // 🐢 no timeout configured, so a sluggish repository costs time, not the record
        let the_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{THE_API}/nodes/slow/content")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0xff, 0xd8])
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&the_server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{THE_API}/nodes/slow")))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
            .mount(&the_server)
            .await;

        let the_repo = RestContentRepository::new(config_pointing_at(&the_server))?;
        let the_content = the_repo.fetch_content("slow").await?;
        assert_eq!(the_content.bytes, vec![0xff, 0xd8]);

        let the_request = MetadataConfig::default().build_request(Category::Car, 1);
        the_repo.update_node("slow", &the_request).await?;
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_nobody_is_listening() {
        // 🔌 grab a free port, then let go of it so the port is dead air
        let the_dead_uri = {
            let the_listener =
                std::net::TcpListener::bind("127.0.0.1:0").expect("💀 could not bind a port");
            let the_port = the_listener.local_addr().expect("💀 no local addr").port();
            format!("http://127.0.0.1:{the_port}")
        };
        let the_repo = RestContentRepository::new(RepositoryConfig {
            host: the_dead_uri,
            username: "admin".to_string(),
            password: None,
            api_path: default_api_path(),
            connect_timeout_secs: Some(1),
            request_timeout_secs: Some(2),
        })
        .expect("💀 client should build");

        assert!(the_repo.fetch_content("n1").await.is_err());
        let the_request = MetadataConfig::default().build_request(Category::Car, 1);
        assert!(the_repo.update_node("n1", &the_request).await.is_err());
    }
}
