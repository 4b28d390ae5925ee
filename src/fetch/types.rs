//! Request and response model shared by the router, the store, and the
//! network client.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use url::Url;

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Delete,
  Options,
  Patch,
}

impl Method {
  /// Only GET requests are routed through the cache; everything else
  /// passes through untouched.
  pub fn is_cacheable(&self) -> bool {
    matches!(self, Method::Get)
  }
}

impl std::fmt::Display for Method {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Method::Get => write!(f, "GET"),
      Method::Head => write!(f, "HEAD"),
      Method::Post => write!(f, "POST"),
      Method::Put => write!(f, "PUT"),
      Method::Delete => write!(f, "DELETE"),
      Method::Options => write!(f, "OPTIONS"),
      Method::Patch => write!(f, "PATCH"),
    }
  }
}

/// What kind of resource a request is loading.
///
/// Only `Document` requests get the offline fallback; failed subresource
/// loads propagate to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
  /// Full-page navigation
  Document,
  Script,
  Style,
  Image,
  Font,
  Manifest,
  Other,
}

impl Destination {
  pub fn is_navigation(&self) -> bool {
    matches!(self, Destination::Document)
  }
}

/// An outbound resource request as seen by the interception layer.
#[derive(Debug, Clone)]
pub struct Request {
  pub method: Method,
  /// Absolute URL or origin-relative path
  pub url: String,
  pub headers: BTreeMap<String, String>,
  pub destination: Destination,
}

impl Request {
  /// Create a plain GET request for a subresource.
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method: Method::Get,
      url: url.into(),
      headers: BTreeMap::new(),
      destination: Destination::Other,
    }
  }

  /// Create a full-page navigation request.
  pub fn navigate(url: impl Into<String>) -> Self {
    Self {
      destination: Destination::Document,
      ..Self::get(url)
    }
  }

  /// Canonical descriptor used for exact-match store lookups: method plus
  /// the absolute URL resolved against the worker origin. Fragments are not
  /// part of the match.
  pub fn descriptor(&self, origin: &Url) -> Result<String> {
    let mut url = origin
      .join(&self.url)
      .map_err(|e| eyre!("Invalid request URL {}: {}", self.url, e))?;
    url.set_fragment(None);
    Ok(format!("{} {}", self.method, url))
  }

  /// SHA256 digest of the descriptor, for stable fixed-length store keys.
  pub fn store_key(&self, origin: &Url) -> Result<String> {
    let descriptor = self.descriptor(origin)?;
    let mut hasher = Sha256::new();
    hasher.update(descriptor.as_bytes());
    Ok(hex::encode(hasher.finalize()))
  }
}

/// Whether a response body is readable by this origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
  /// Same-origin response with a readable body
  Basic,
  /// Cross-origin response; status and body are not trusted
  Opaque,
}

impl ResponseKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ResponseKind::Basic => "basic",
      ResponseKind::Opaque => "opaque",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "basic" => Ok(ResponseKind::Basic),
      "opaque" => Ok(ResponseKind::Opaque),
      other => Err(eyre!("Unknown response kind: {}", other)),
    }
  }
}

/// A captured response.
#[derive(Debug, Clone)]
pub struct Response {
  pub status: u16,
  pub headers: BTreeMap<String, String>,
  pub body: Vec<u8>,
  /// Final URL after redirects
  pub url: String,
  pub kind: ResponseKind,
}

impl Response {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// A response is stored only when it is a same-origin, non-opaque
  /// success.
  pub fn is_cacheable(&self) -> bool {
    self.is_success() && self.kind == ResponseKind::Basic
  }

  /// Duplicate the response so one copy can be stored while the other is
  /// returned to the caller. Must happen before either consumer reads the
  /// body.
  pub fn duplicate(&self) -> Self {
    self.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn origin() -> Url {
    Url::parse("https://pathpatrol.example").unwrap()
  }

  #[test]
  fn only_get_is_cacheable() {
    assert!(Method::Get.is_cacheable());
    assert!(!Method::Head.is_cacheable());
    assert!(!Method::Post.is_cacheable());
    assert!(!Method::Delete.is_cacheable());
  }

  #[test]
  fn descriptor_resolves_relative_paths() {
    let request = Request::get("/offline.html");
    let descriptor = request.descriptor(&origin()).unwrap();
    assert_eq!(descriptor, "GET https://pathpatrol.example/offline.html");
  }

  #[test]
  fn descriptor_ignores_fragment() {
    let with = Request::get("https://pathpatrol.example/map#zoomed");
    let without = Request::get("https://pathpatrol.example/map");
    assert_eq!(
      with.store_key(&origin()).unwrap(),
      without.store_key(&origin()).unwrap()
    );
  }

  #[test]
  fn store_key_differs_by_method() {
    let origin = origin();
    let get = Request::get("/api/complaints");
    let head = Request {
      method: Method::Head,
      ..Request::get("/api/complaints")
    };
    assert_ne!(
      get.store_key(&origin).unwrap(),
      head.store_key(&origin).unwrap()
    );
  }

  #[test]
  fn cacheability_requires_success_and_basic() {
    let mut response = Response {
      status: 200,
      headers: BTreeMap::new(),
      body: b"ok".to_vec(),
      url: "https://pathpatrol.example/".to_string(),
      kind: ResponseKind::Basic,
    };
    assert!(response.is_cacheable());

    response.status = 404;
    assert!(!response.is_cacheable());

    response.status = 200;
    response.kind = ResponseKind::Opaque;
    assert!(!response.is_cacheable());
  }
}
