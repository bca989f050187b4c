//! HTTP client for the REST endpoints the real-time core depends on.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use socialnet_shared::{
    ApiError, AuthStatus, ChatInfo, ChatMessage, ChatRequest, AUTH_STATUS_PATH, GET_CHATS_PATH,
    GET_MESSAGES_PATH, UNREAD_MESSAGES_PATH,
};

use crate::config::{join_url, ClientConfig};

/// HTTP client that authenticates with the (opaque) session cookie.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: String::new(),
            session_cookie: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new()
            .with_base_url(config.api_url.clone())
            .with_session_cookie(config.session_cookie.clone())
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the `Cookie` header value sent with every request
    pub fn with_session_cookie(mut self, cookie: Option<String>) -> Self {
        self.session_cookie = cookie;
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        join_url(&self.base_url, path)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn authenticate(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => rb.header(reqwest::header::COOKIE, cookie.as_str()),
            None => rb,
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn authenticate(&self, rb: RequestBuilder) -> RequestBuilder {
        // The browser owns the cookie jar
        rb.fetch_credentials_include()
    }

    /// Send the request and return the body of a 2xx response.
    async fn execute(&self, rb: RequestBuilder) -> Result<String, ApiError> {
        let resp = self
            .authenticate(rb)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            return Err(ApiError::Http { status, body: text });
        }
        Ok(text)
    }

    fn decode<TRes: DeserializeOwned>(text: &str) -> Result<TRes, ApiError> {
        let text = if text.trim().is_empty() { "null" } else { text };
        serde_json::from_str(text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    /// Make a GET request
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let text = self.execute(self.client.get(self.url(path))).await?;
        Self::decode(&text)
    }

    /// Make a POST request with JSON body
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let body_bytes =
            serde_json::to_vec(body).map_err(|e| ApiError::Deserialize(e.to_string()))?;
        let rb = self
            .client
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body_bytes);
        let text = self.execute(rb).await?;
        Self::decode(&text)
    }

    // --- Chat/notification API methods ---

    /// Message history of a chat, oldest first. A `null` body means no messages.
    pub async fn get_messages(&self, chat_id: i64) -> Result<Vec<ChatMessage>, ApiError> {
        let messages: Option<Vec<ChatMessage>> = self
            .post_json(GET_MESSAGES_PATH, &ChatRequest { chat_id })
            .await?;
        Ok(messages.unwrap_or_default())
    }

    /// Chats the current user takes part in
    pub async fn get_chats(&self) -> Result<Vec<ChatInfo>, ApiError> {
        let chats: Option<Vec<ChatInfo>> = self.get_json(GET_CHATS_PATH).await?;
        Ok(chats.unwrap_or_default())
    }

    /// Ids of chats holding messages the current user has not read
    pub async fn get_unread_chats(&self) -> Result<Vec<i64>, ApiError> {
        let ids: Option<Vec<i64>> = self.get_json(UNREAD_MESSAGES_PATH).await?;
        Ok(ids.unwrap_or_default())
    }

    /// Whether the session cookie is accepted. A 401 answers "no" rather than failing.
    pub async fn auth_status(&self) -> Result<bool, ApiError> {
        match self.get_json::<AuthStatus>(AUTH_STATUS_PATH).await {
            Ok(status) => Ok(status.is_authenticated),
            Err(ApiError::Http { status: 401, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let api = ApiClient::new().with_base_url("http://localhost:8000/");
        assert_eq!(api.url("/api/get-chats"), "http://localhost:8000/api/get-chats");
        assert_eq!(api.url("http://other/x"), "http://other/x");
        assert_eq!(ApiClient::new().url("api/get-chats"), "/api/get-chats");
    }

    #[test]
    fn from_config_resolves_like_the_config() {
        let config = ClientConfig::new("http://localhost:8000/");
        let api = ApiClient::from_config(&config);
        assert_eq!(api.url(GET_MESSAGES_PATH), config.http_url(GET_MESSAGES_PATH));
    }

    #[test]
    fn empty_body_decodes_as_null() {
        let decoded: Option<Vec<i64>> = ApiClient::decode("").unwrap();
        assert_eq!(decoded, None);
        let decoded: Option<Vec<i64>> = ApiClient::decode("null").unwrap();
        assert_eq!(decoded, None);
        let decoded: Vec<i64> = ApiClient::decode("[1,2]").unwrap();
        assert_eq!(decoded, vec![1, 2]);
        assert!(matches!(
            ApiClient::decode::<Vec<i64>>("{"),
            Err(ApiError::Deserialize(_))
        ));
    }
}
