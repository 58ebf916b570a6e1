//! Request and response values passed between the engine, the transport and the cache.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// How the request was issued by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

impl FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigate" => Ok(Self::Navigate),
            "same-origin" => Ok(Self::SameOrigin),
            "cors" => Ok(Self::Cors),
            "no-cors" => Ok(Self::NoCors),
            other => Err(Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    /// Upper-case method name.
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl Request {
    /// Build a request, normalising the method to upper case.
    pub fn new(method: &str, url: Url, mode: RequestMode) -> Self {
        Self { method: method.trim().to_ascii_uppercase(), url, mode, headers: Vec::new(), body: None }
    }

    /// A sub-resource GET.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, RequestMode::NoCors)
    }

    /// A top-level navigation GET.
    pub fn navigate(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Navigate)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Response tainting, as seen by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    /// Cross-origin response the origin opted into sharing.
    Cors,
    /// Cross-origin response with no sharing headers; never cached.
    Opaque,
    /// Synthesized locally.
    Default,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "cors" => Ok(Self::Cors),
            "opaque" => Ok(Self::Opaque),
            "default" => Ok(Self::Default),
            other => Err(Error::CorruptEntry(format!("unknown response type: {other}"))),
        }
    }
}

/// A complete response. Bodies are always fully read before a `Response` exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Final URL after redirects; `None` for synthesized responses.
    pub url: Option<Url>,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub response_type: ResponseType,
}

impl Response {
    /// A locally synthesized response.
    pub fn synthesized(status: u16, status_text: &str, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            url: None,
            status,
            status_text: status_text.to_string(),
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.into(),
            response_type: ResponseType::Default,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Status 200 and a same-origin or CORS response.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && matches!(self.response_type, ResponseType::Basic | ResponseType::Cors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_request_method_normalized() {
        let req = Request::new(" post ", url("http://localhost:5000/add"), RequestMode::SameOrigin);
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_navigation_flag() {
        assert!(Request::navigate(url("http://localhost:5000/")).is_navigation());
        assert!(!Request::get(url("http://localhost:5000/static/app.js")).is_navigation());
    }

    #[test]
    fn test_request_mode_parse() {
        assert_eq!("no-cors".parse::<RequestMode>().unwrap(), RequestMode::NoCors);
        assert!("sideways".parse::<RequestMode>().is_err());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = Response::synthesized(503, "Service Unavailable", "text/plain; charset=utf-8", "offline");
        assert_eq!(resp.header("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_cacheable_requires_200_and_non_opaque() {
        let mut resp = Response::synthesized(200, "OK", "text/css", "body{}");
        resp.response_type = ResponseType::Basic;
        assert!(resp.is_cacheable());

        resp.response_type = ResponseType::Opaque;
        assert!(!resp.is_cacheable());

        resp.response_type = ResponseType::Cors;
        resp.status = 206;
        assert!(!resp.is_cacheable());
    }

    #[test]
    fn test_response_type_round_trip_str() {
        for t in [ResponseType::Basic, ResponseType::Cors, ResponseType::Opaque, ResponseType::Default] {
            assert_eq!(t.as_str().parse::<ResponseType>().unwrap(), t);
        }
    }
}
