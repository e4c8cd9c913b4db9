//! InfluxDB v2 HTTP client and point store.
//!
//! Talks to the InfluxDB v2 API over HTTP: organization lookup at startup,
//! line protocol writes per point, and a health probe.

use crate::models::Point;
use crate::storage::point_store::{PointStore, PointStoreError};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// An InfluxDB organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Organization {
    /// Organization ID, used when writing points.
    pub id: String,
    /// Organization name.
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct OrganizationList {
    #[serde(default)]
    orgs: Vec<Organization>,
}

#[derive(Debug, Deserialize)]
struct InfluxErrorBody {
    message: Option<String>,
}

/// HTTP client for the InfluxDB v2 API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl InfluxClient {
    /// Creates a client for the InfluxDB instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PointStoreError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, PointStoreError> {
        let raw = format!("{}{path}", self.base_url);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| PointStoreError::StorageError(format!("Invalid store URL: {e}")))
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Looks up an organization by its name.
    ///
    /// # Errors
    ///
    /// Returns [`PointStoreError::OrganizationNotFound`] if no organization
    /// has that name, or another error if the request fails.
    pub async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Organization, PointStoreError> {
        let url = self.url("/api/v2/orgs", &[("org", name)])?;
        tracing::debug!(%url, org = name, "Looking up organization");

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PointStoreError::OrganizationNotFound(name.to_string()));
        }
        let response = check_status(response).await?;

        let list: OrganizationList = response.json().await?;
        list.orgs
            .into_iter()
            .find(|org| org.name == name)
            .ok_or_else(|| PointStoreError::OrganizationNotFound(name.to_string()))
    }

    /// Writes one point to `bucket` in the organization with ID `org_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the point cannot be encoded, the request fails,
    /// or InfluxDB rejects the write.
    pub async fn write_point(
        &self,
        org_id: &str,
        bucket: &str,
        point: &Point,
    ) -> Result<(), PointStoreError> {
        let line = point.to_line_protocol()?;
        let url = self.url(
            "/api/v2/write",
            &[("orgID", org_id), ("bucket", bucket), ("precision", "ns")],
        )?;

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, self.auth_header())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// Checks that the InfluxDB instance is reachable and healthy.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the instance reports a
    /// non-success status.
    pub async fn ping(&self) -> Result<(), PointStoreError> {
        let url = self.url("/health", &[])?;
        let response = self.http.get(url).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Passes 2xx responses through and turns the rest into
/// [`PointStoreError::Rejected`].
async fn check_status(response: Response) -> Result<Response, PointStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<InfluxErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or(text);

    Err(PointStoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// InfluxDB-backed point store.
///
/// Writes each point to a fixed bucket of an organization resolved at
/// startup.
#[derive(Debug, Clone)]
pub struct InfluxPointStore {
    client: InfluxClient,
    org_id: String,
    bucket: String,
}

impl InfluxPointStore {
    /// Creates a store writing into `bucket` of `organization`.
    #[must_use]
    pub fn new(client: InfluxClient, organization: &Organization, bucket: impl Into<String>) -> Self {
        Self {
            client,
            org_id: organization.id.clone(),
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl PointStore for InfluxPointStore {
    async fn write(&self, point: Point) -> Result<(), PointStoreError> {
        self.client
            .write_point(&self.org_id, &self.bucket, &point)
            .await
    }
}
