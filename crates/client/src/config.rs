//! Client configuration from environment variables.

use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// `base` and `path` with exactly one slash between them. An empty base gives
/// a root-relative path.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Where the backend lives and which session to present to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the HTTP API, e.g. `http://localhost:8000`.
    pub api_url: String,
    /// Opaque `Cookie` header value issued by the login flow, e.g. `session_token=...`.
    pub session_cookie: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_cookie: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            session_cookie: None,
        }
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Read configuration from the environment.
    ///
    /// Environment variables:
    /// - `SOCIALNET_API_URL`: API base URL (default: "http://localhost:8000")
    /// - `SOCIALNET_SESSION_COOKIE`: Cookie header value to authenticate with (default: none)
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("SOCIALNET_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let session_cookie = std::env::var("SOCIALNET_SESSION_COOKIE")
            .ok()
            .filter(|c| !c.trim().is_empty());

        Self {
            api_url,
            session_cookie,
        }
    }

    /// Absolute HTTP URL for an API path.
    pub fn http_url(&self, path: &str) -> String {
        join_url(&self.api_url, path)
    }

    /// Absolute WebSocket URL for an API path (http→ws, https→wss).
    pub fn ws_url(&self, path: &str) -> String {
        let http = self.http_url(path);
        match Url::parse(&http) {
            Ok(mut url) => {
                let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
                if url.set_scheme(scheme).is_err() {
                    crate::log_warn!("Cannot derive a WebSocket URL from {}", http);
                }
                url.to_string()
            }
            Err(e) => {
                crate::log_warn!("Invalid API URL {}: {}", http, e);
                http
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_double_slashes() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(
            config.http_url("/api/get-chats"),
            "http://localhost:8000/api/get-chats"
        );
        assert_eq!(
            config.http_url("api/get-chats"),
            "http://localhost:8000/api/get-chats"
        );
    }

    #[test]
    fn join_without_base_is_root_relative() {
        assert_eq!(join_url("", "api/get-chats"), "/api/get-chats");
        assert_eq!(join_url("http://h/", "/x"), "http://h/x");
    }

    #[test]
    fn derives_websocket_scheme_from_http_scheme() {
        assert_eq!(
            ClientConfig::new("http://localhost:8000").ws_url("/api/chat/ws"),
            "ws://localhost:8000/api/chat/ws"
        );
        assert_eq!(
            ClientConfig::new("https://social.example").ws_url("/api/notifications/ws"),
            "wss://social.example/api/notifications/ws"
        );
    }

    #[test]
    fn default_points_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.session_cookie.is_none());
        let config = config.with_session_cookie("session_token=abc");
        assert_eq!(config.session_cookie.as_deref(), Some("session_token=abc"));
    }
}
