//! Network side of the router: a `Network` trait so tests can substitute a
//! fake, and the reqwest-backed implementation used in production.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::collections::BTreeMap;
use url::Url;

use crate::config::Config;

use super::types::{Method, Request, Response, ResponseKind};

/// Issues requests to the network.
#[async_trait]
pub trait Network: Send + Sync {
  /// Issue the request and capture the response.
  ///
  /// Returns `Err` only when no response is obtainable at all (offline,
  /// DNS failure); a non-success status is still an `Ok` response.
  async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Production network client over reqwest.
#[derive(Clone)]
pub struct HttpNetwork {
  client: reqwest::Client,
  origin: Url,
}

impl HttpNetwork {
  pub fn new(config: &Config) -> Result<Self> {
    let origin = config.origin_url()?;
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, origin })
  }

  fn resolve(&self, url: &str) -> Result<Url> {
    self
      .origin
      .join(url)
      .map_err(|e| eyre!("Invalid request URL {}: {}", url, e))
  }
}

#[async_trait]
impl Network for HttpNetwork {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    let url = self.resolve(&request.url)?;

    let mut builder = self.client.request(to_reqwest_method(request.method), url);
    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| eyre!("Network request failed for {}: {}", request.url, e))?;

    let status = response.status().as_u16();
    let final_url = response.url().clone();

    let mut headers = BTreeMap::new();
    for (name, value) in response.headers() {
      if let Ok(value) = value.to_str() {
        headers.insert(name.as_str().to_string(), value.to_string());
      }
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read response body for {}: {}", request.url, e))?
      .to_vec();

    let kind = if same_origin(&final_url, &self.origin) {
      ResponseKind::Basic
    } else {
      ResponseKind::Opaque
    };

    Ok(Response {
      status,
      headers,
      body,
      url: final_url.to_string(),
      kind,
    })
  }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
  match method {
    Method::Get => reqwest::Method::GET,
    Method::Head => reqwest::Method::HEAD,
    Method::Post => reqwest::Method::POST,
    Method::Put => reqwest::Method::PUT,
    Method::Delete => reqwest::Method::DELETE,
    Method::Options => reqwest::Method::OPTIONS,
    Method::Patch => reqwest::Method::PATCH,
  }
}

/// Scheme, host, and port must all match.
fn same_origin(a: &Url, b: &Url) -> bool {
  a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn same_origin_compares_scheme_host_port() {
    let origin = Url::parse("https://pathpatrol.example").unwrap();

    let same = Url::parse("https://pathpatrol.example/static/manifest.json").unwrap();
    assert!(same_origin(&same, &origin));

    let other_host = Url::parse("https://tiles.example/z/x/y.png").unwrap();
    assert!(!same_origin(&other_host, &origin));

    let other_scheme = Url::parse("http://pathpatrol.example/").unwrap();
    assert!(!same_origin(&other_scheme, &origin));
  }

  #[test]
  fn default_ports_are_equivalent() {
    let origin = Url::parse("https://pathpatrol.example").unwrap();
    let explicit = Url::parse("https://pathpatrol.example:443/").unwrap();
    assert!(same_origin(&explicit, &origin));
  }
}
