//! Deterministic responses for requests that neither the network nor the cache can serve.

use url::Url;

use crate::cache::CacheStore;
use crate::http::{Request, Response};

pub const OFFLINE_STATUS: u16 = 503;
pub const OFFLINE_STATUS_TEXT: &str = "Service Unavailable";
pub const OFFLINE_TEXT: &str = "You are offline";

const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Offline</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
               text-align: center; padding: 40px 20px; background: #f8f9fa; }
        .offline-message { background: white; padding: 40px; border-radius: 12px;
                           box-shadow: 0 2px 15px rgba(0,0,0,0.1); max-width: 400px; margin: 0 auto; }
        h1 { color: #495057; margin-bottom: 15px; }
        p { color: #6c757d; margin-bottom: 20px; }
        .btn { background: #007bff; color: white; padding: 10px 20px;
               border: none; border-radius: 6px; cursor: pointer; }
    </style>
</head>
<body>
    <div class="offline-message">
        <h1>You are offline</h1>
        <p>Check your internet connection.<br>Reload once the connection is back.</p>
        <button class="btn" onclick="location.reload()">Retry</button>
    </div>
</body>
</html>
"#;

/// Builds fallback responses; never touches the network.
#[derive(Debug, Clone)]
pub struct OfflineResponder {
    fallback_url: Url,
}

impl OfflineResponder {
    /// `fallback_url` is the page served to failed navigations when it is cached.
    pub fn new(fallback_url: Url) -> Self {
        Self { fallback_url }
    }

    pub fn fallback_url(&self) -> &Url {
        &self.fallback_url
    }

    pub async fn respond(&self, store: &CacheStore, request: &Request) -> Response {
        if !request.is_navigation() {
            return offline_text();
        }

        match store.lookup_any(&Request::navigate(self.fallback_url.clone())).await {
            Ok(Some(page)) => {
                tracing::debug!(url = %request.url, fallback = %self.fallback_url, "serving cached fallback page");
                page
            }
            Ok(None) => offline_html(),
            Err(e) => {
                tracing::warn!(error = %e, "fallback page lookup failed");
                offline_html()
            }
        }
    }
}

/// The synthesized page for failed navigations.
pub fn offline_html() -> Response {
    Response::synthesized(OFFLINE_STATUS, OFFLINE_STATUS_TEXT, "text/html; charset=utf-8", OFFLINE_HTML)
}

/// The synthesized body for failed sub-resource requests.
pub fn offline_text() -> Response {
    Response::synthesized(OFFLINE_STATUS, OFFLINE_STATUS_TEXT, "text/plain; charset=utf-8", OFFLINE_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheDb, PartitionNames};
    use crate::http::ResponseType;
    use bytes::Bytes;

    async fn setup() -> (CacheStore, OfflineResponder) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = CacheStore::new(db, PartitionNames::for_version("v1"));
        let responder = OfflineResponder::new(Url::parse("http://localhost:5000/login").unwrap());
        (store, responder)
    }

    #[tokio::test]
    async fn test_navigation_without_fallback_gets_html() {
        let (store, responder) = setup().await;
        let req = Request::navigate(Url::parse("http://localhost:5000/refrigerator").unwrap());

        let resp = responder.respond(&store, &req).await;
        assert_eq!(resp.status, 503);
        assert_eq!(resp.content_type(), Some("text/html; charset=utf-8"));
        let body = String::from_utf8(resp.body.to_vec()).unwrap();
        assert!(body.contains("location.reload()"));
    }

    #[tokio::test]
    async fn test_navigation_serves_cached_fallback() {
        let (store, responder) = setup().await;
        let login = Response {
            url: None,
            status: 200,
            status_text: "OK".into(),
            headers: vec![("content-type".into(), "text/html".into())],
            body: Bytes::from_static(b"<form>login</form>"),
            response_type: ResponseType::Basic,
        };
        store
            .prime_static(&[(Request::get(responder.fallback_url().clone()), login.clone())])
            .await
            .unwrap();

        let req = Request::navigate(Url::parse("http://localhost:5000/").unwrap());
        assert_eq!(responder.respond(&store, &req).await, login);
    }

    #[tokio::test]
    async fn test_subresource_gets_plain_text() {
        let (store, responder) = setup().await;
        let req = Request::get(Url::parse("http://localhost:5000/static/app.js").unwrap());

        let resp = responder.respond(&store, &req).await;
        assert_eq!(resp.status, 503);
        assert_eq!(resp.content_type(), Some("text/plain; charset=utf-8"));
        assert_eq!(resp.body, Bytes::from_static(OFFLINE_TEXT.as_bytes()));
    }

    #[test]
    fn test_synthesized_pages_are_deterministic() {
        assert_eq!(offline_html(), offline_html());
        assert_eq!(offline_text(), offline_text());
    }
}
