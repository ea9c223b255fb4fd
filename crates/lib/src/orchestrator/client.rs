//! Cloud controller client over HTTP.
//!
//! Listings are paginated: every page carries `resources` and a `next_url`
//! that is absent (or null) on the last page.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::services::ServiceSpec;

use super::{PlatformClient, PlatformError, ServiceOffering, ServicePlan};

const SERVICES_PATH: &str = "/v2/services";
const SERVICE_INSTANCES_PATH: &str = "/v2/service_instances?accepts_incomplete=true";

/// One page of a paginated listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Page {
  #[serde(default)]
  pub resources: Vec<Value>,
  #[serde(default)]
  pub next_url: Option<String>,
}

/// Fetches single pages of a listing.
#[async_trait]
pub trait PageFetcher: Send + Sync {
  async fn fetch_page(&self, url: &str) -> Result<Page, PlatformError>;
}

/// Collect the resources of every page, starting at `first`.
///
/// Stops when a page has no `next_url` or points at a page already seen.
pub async fn collect_pages<F>(fetcher: &F, first: &str) -> Result<Vec<Value>, PlatformError>
where
  F: PageFetcher + ?Sized,
{
  let mut resources = Vec::new();
  let mut seen = HashSet::new();
  let mut next = Some(first.to_string());

  while let Some(url) = next.take() {
    if !seen.insert(url.clone()) {
      debug!(url = %url, "pagination loops back, stopping");
      break;
    }
    let page = fetcher.fetch_page(&url).await?;
    debug!(url = %url, count = page.resources.len(), "fetched page");
    resources.extend(page.resources);
    next = page.next_url.filter(|u| !u.is_empty());
  }
  Ok(resources)
}

/// A [`PlatformClient`] talking to a cloud controller.
pub struct CloudControllerClient {
  client: Client,
  base_url: String,
  token: String,
  space_guid: String,
}

impl CloudControllerClient {
  pub fn new(
    base_url: &str,
    token: impl Into<String>,
    space_guid: impl Into<String>,
  ) -> Result<Self, PlatformError> {
    let client = Client::builder()
      .timeout(std::time::Duration::from_secs(60))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      token: token.into(),
      space_guid: space_guid.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
      path.to_string()
    } else {
      format!("{}{}", self.base_url, path)
    }
  }

  async fn plans(&self, url: &str) -> Result<Vec<ServicePlan>, PlatformError> {
    let resources = collect_pages(self, url).await?;
    Ok(
      resources
        .iter()
        .filter_map(|r| {
          Some(ServicePlan {
            name: r.pointer("/entity/name")?.as_str()?.to_string(),
            guid: r.pointer("/metadata/guid")?.as_str()?.to_string(),
          })
        })
        .collect(),
    )
  }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  error!(status = %status, body = %body, "platform request failed");
  Err(PlatformError::new(Some(status.as_u16()), body))
}

#[async_trait]
impl PageFetcher for CloudControllerClient {
  async fn fetch_page(&self, url: &str) -> Result<Page, PlatformError> {
    let url = self.url(url);
    debug!(url = %url, "GET");
    let response = self
      .client
      .get(&url)
      .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }
}

#[async_trait]
impl PlatformClient for CloudControllerClient {
  async fn service_offerings(&self) -> Result<Vec<ServiceOffering>, PlatformError> {
    let mut offerings = Vec::new();
    for resource in collect_pages(self, SERVICES_PATH).await? {
      let Some(label) = resource.pointer("/entity/label").and_then(Value::as_str) else {
        continue;
      };
      let plans = match resource.pointer("/entity/service_plans_url").and_then(Value::as_str) {
        Some(url) => self.plans(url).await?,
        None => Vec::new(),
      };
      offerings.push(ServiceOffering {
        label: label.to_string(),
        plans,
      });
    }
    Ok(offerings)
  }

  async fn create_service(&self, service: &ServiceSpec, label: &str, plan: &ServicePlan) -> Result<(), PlatformError> {
    let body = json!({
      "name": service.name,
      "space_guid": self.space_guid,
      "service_plan_guid": plan.guid,
      "parameters": service.credentials,
      "tags": service.tags,
    });
    let url = self.url(SERVICE_INSTANCES_PATH);
    debug!(url = %url, service = %service.name, offering = %label, plan = %plan.name, "POST");
    let response = self
      .client
      .post(&url)
      .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
      .json(&body)
      .send()
      .await?;
    check(response).await?;
    Ok(())
  }
}
