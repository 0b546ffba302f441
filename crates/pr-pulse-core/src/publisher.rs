//! Document store publisher.
//!
//! One lookup, one write per run. The target page is resolved by exact
//! title within the configured space; a miss takes the create path, a hit
//! takes the update path at `observed_version + 1` (the store rejects any
//! other version, which is what surfaces concurrent writers as a runtime
//! failure instead of silent corruption).
//!
//! The observed version is always re-resolved in the same run and never
//! cached across runs.

use crate::config::WikiConfig;
use crate::error::{PulseError, Result};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// The (id, version) pair identifying a page's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIdentity {
    /// Store-side page id.
    pub id: String,
    /// Version last observed for this page. Updates must present
    /// `version + 1`.
    pub version: u32,
}

/// Terminal outcome of a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No page matched the title; a new page was created.
    Created,
    /// An existing page was replaced at this new version.
    Updated { version: u32 },
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    id: String,
    version: LookupVersion,
}

#[derive(Debug, Deserialize)]
struct LookupVersion {
    number: u32,
}

/// Client for the document store's content API.
pub struct WikiClient {
    config: WikiConfig,
    http_client: reqwest::Client,
}

impl WikiClient {
    /// Create a new document store client.
    pub fn new(config: WikiConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("pr-pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        WikiClient {
            config,
            http_client,
        }
    }

    fn content_url(&self) -> String {
        format!("{}/rest/api/content", self.config.base_url)
    }

    /// Resolve the page identity for `title` in the configured space.
    ///
    /// `Ok(None)` means confirmed absent (an empty result set). A
    /// non-success response is a [`PulseError::PublishLookup`], not an
    /// absent page, so a transient lookup error can never create a
    /// duplicate page.
    pub async fn resolve_page(&self, title: &str) -> Result<Option<PageIdentity>> {
        let response = self
            .http_client
            .get(self.content_url())
            .query(&[
                ("title", title),
                ("spaceKey", &self.config.space_key),
                ("expand", "version"),
            ])
            .basic_auth(&self.config.user, Some(&self.config.token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PulseError::PublishLookup {
                status: status.as_u16(),
            });
        }

        let body: LookupResponse = response.json().await?;
        if body.results.len() > 1 {
            // Title uniqueness is not guaranteed by the store; first match
            // wins, but make the ambiguity visible.
            warn!(
                title,
                matches = body.results.len(),
                "page title matched more than one page, using the first"
            );
        }

        Ok(body.results.into_iter().next().map(|page| PageIdentity {
            id: page.id,
            version: page.version.number,
        }))
    }

    /// Publish `body` under `title`: create the page if absent, otherwise
    /// replace it at the next version. Exactly one write is issued.
    pub async fn publish(&self, title: &str, body: &str) -> Result<PublishOutcome> {
        match self.resolve_page(title).await? {
            None => {
                debug!(title, "no existing page, creating");
                self.create_page(title, body).await
            }
            Some(identity) => {
                debug!(title, page_id = %identity.id, version = identity.version, "existing page, updating");
                self.update_page(&identity, title, body).await
            }
        }
    }

    async fn create_page(&self, title: &str, body: &str) -> Result<PublishOutcome> {
        let payload = self.page_payload(title, body);
        let response = self
            .http_client
            .post(self.content_url())
            .basic_auth(&self.config.user, Some(&self.config.token))
            .json(&payload)
            .send()
            .await?;

        check_write_status(response).await?;
        info!(title, space = %self.config.space_key, "page created");
        Ok(PublishOutcome::Created)
    }

    async fn update_page(
        &self,
        identity: &PageIdentity,
        title: &str,
        body: &str,
    ) -> Result<PublishOutcome> {
        let next_version = identity.version + 1;
        let mut payload = self.page_payload(title, body);
        payload["version"] = json!({ "number": next_version });

        let url = format!("{}/{}", self.content_url(), identity.id);
        let response = self
            .http_client
            .put(&url)
            .basic_auth(&self.config.user, Some(&self.config.token))
            .json(&payload)
            .send()
            .await?;

        check_write_status(response).await?;
        info!(title, page_id = %identity.id, version = next_version, "page updated");
        Ok(PublishOutcome::Updated {
            version: next_version,
        })
    }

    /// Shared payload for create and update. The parent reference is
    /// attached on both paths when configured.
    fn page_payload(&self, title: &str, body: &str) -> serde_json::Value {
        let mut payload = json!({
            "type": "page",
            "title": title,
            "space": { "key": self.config.space_key },
            "body": {
                "storage": {
                    "value": body,
                    "representation": "storage"
                }
            }
        });
        if let Some(parent) = &self.config.parent_page_id {
            payload["ancestors"] = json!([{ "id": parent }]);
        }
        payload
    }
}

async fn check_write_status(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status == StatusCode::OK || status == StatusCode::CREATED {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(PulseError::PublishWrite {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn wiki_config(server_uri: &str) -> WikiConfig {
        WikiConfig {
            base_url: server_uri.to_string(),
            space_key: "ENG".to_string(),
            parent_page_id: None,
            user: "reporter@example.com".to_string(),
            token: "secret".to_string(),
        }
    }

    fn lookup_hit(id: &str, version: u32) -> serde_json::Value {
        json!({ "results": [{ "id": id, "version": { "number": version } }] })
    }

    #[tokio::test]
    async fn test_resolve_absent_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/content"))
            .and(query_param("title", "Open Pull Requests"))
            .and(query_param("spaceKey", "ENG"))
            .and(query_param("expand", "version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .mount(&server)
            .await;

        let client = WikiClient::new(wiki_config(&server.uri()));
        let identity = client
            .resolve_page("Open Pull Requests")
            .await
            .expect("resolve");
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_resolve_captures_id_and_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/content"))
            .respond_with(ResponseTemplate::new(200).set_body_json(lookup_hit("12345", 3)))
            .mount(&server)
            .await;

        let client = WikiClient::new(wiki_config(&server.uri()));
        let identity = client
            .resolve_page("Open Pull Requests")
            .await
            .expect("resolve")
            .expect("page present");
        assert_eq!(identity.id, "12345");
        assert_eq!(identity.version, 3);
    }

    #[tokio::test]
    async fn test_resolve_multiple_matches_takes_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/content"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "id": "111", "version": { "number": 5 } },
                    { "id": "222", "version": { "number": 9 } }
                ]
            })))
            .mount(&server)
            .await;

        let client = WikiClient::new(wiki_config(&server.uri()));
        let identity = client
            .resolve_page("Open Pull Requests")
            .await
            .expect("resolve")
            .expect("page present");
        assert_eq!(identity.id, "111");
        assert_eq!(identity.version, 5);
    }

    #[tokio::test]
    async fn test_lookup_error_does_not_fall_through_to_create() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/content"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        // No POST mock: a create attempt would fail the test via 404 below
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&server)
            .await;

        let client = WikiClient::new(wiki_config(&server.uri()));
        let err = client
            .publish("Open Pull Requests", "<p>body</p>")
            .await
            .expect_err("lookup failure must abort");
        match err {
            PulseError::PublishLookup { status } => assert_eq!(status, 500),
            other => panic!("expected PublishLookup, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_rejection_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/content"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/content"))
            .respond_with(ResponseTemplate::new(400).set_body_string("space does not exist"))
            .mount(&server)
            .await;

        let client = WikiClient::new(wiki_config(&server.uri()));
        let err = client
            .publish("Open Pull Requests", "<p>body</p>")
            .await
            .expect_err("write rejection");
        match err {
            PulseError::PublishWrite { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "space does not exist");
            }
            other => panic!("expected PublishWrite, got {:?}", other),
        }
    }
}
