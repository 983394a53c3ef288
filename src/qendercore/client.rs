use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use reqwest::{Client, Response, multipart};
use serde::de::DeserializeOwned;

use super::types::{DeviceTree, DsQuery, DsResponse, TokenGrant, TokenResponse};
use super::{AuthApi, CLIENT_SEQ, QueryApi, REFRESH_COOKIE, USER_AGENT};
use crate::config::QendercoreConfig;
use crate::error::{BridgeError, Result};
use crate::logging::get_logger;
use crate::session::{BearerToken, extract_refresh_token};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const AUTH_ERROR_BODY_LIMIT: usize = 300;
const QUERY_ERROR_BODY_LIMIT: usize = 400;

/// HTTP client for the Qendercore auth and data services
pub struct QenderClient {
    http: Client,
    auth_base_url: String,
    api_base_url: String,
    logger: crate::logging::StructuredLogger,
}

impl QenderClient {
    /// Build a client from the cloud settings
    pub fn new(config: &QendercoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-qc-client-seq", HeaderValue::from_static(CLIENT_SEQ));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()?;

        let logger = get_logger("qendercore");
        if config.insecure_tls {
            logger.warn("TLS certificate verification is disabled for the Qendercore API");
        }

        Ok(Self {
            http,
            auth_base_url: config.auth_base_url.trim_end_matches('/').to_string(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            logger,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}{path}", self.auth_base_url)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base_url)
    }

    /// Turn a token endpoint response into a grant
    async fn read_grant(response: Response, what: &str) -> Result<TokenGrant> {
        let status = response.status();
        let refresh_token = refresh_token_from_headers(response.headers());
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BridgeError::api(format!(
                "{what} failed ({}): {}",
                status.as_u16(),
                truncate(&body, AUTH_ERROR_BODY_LIMIT)
            )));
        }

        let payload: TokenResponse = serde_json::from_str(&body)?;
        let access_token = payload
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BridgeError::missing_field("access_token", format!("{what} response"))
            })?;

        Ok(TokenGrant {
            access_token,
            refresh_token,
        })
    }

    /// Check status and decode a data endpoint response
    async fn read_json<T: DeserializeOwned>(
        response: Response,
        what: &str,
        limit: usize,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BridgeError::api(format!(
                "{what} failed ({}): {}",
                status.as_u16(),
                truncate(&body, limit)
            )));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl AuthApi for QenderClient {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.logger.debug("Refreshing bearer token");
        let response = self
            .http
            .get(self.auth_url("/v1/auth/tokens"))
            .header(COOKIE, format!("{REFRESH_COOKIE}={refresh_token}"))
            .send()
            .await?;
        Self::read_grant(response, "Token refresh").await
    }

    async fn login(&self, username: &str, password: &str) -> Result<TokenGrant> {
        self.logger.debug("Logging in with username and password");
        let form = multipart::Form::new()
            .text("username", username.to_string())
            .text("password", password.to_string());
        let response = self
            .http
            .post(self.auth_url("/v1/auth/login"))
            .multipart(form)
            .send()
            .await?;
        Self::read_grant(response, "Login").await
    }
}

#[async_trait::async_trait]
impl QueryApi for QenderClient {
    async fn ds(&self, token: &BearerToken, query: &DsQuery) -> Result<DsResponse> {
        let response = self
            .http
            .post(self.api_url("/v1/h/ds"))
            .header(AUTHORIZATION, token.authorization())
            .json(query)
            .send()
            .await?;
        Self::read_json(response, "API ds", QUERY_ERROR_BODY_LIMIT).await
    }

    async fn device_tree(&self, token: &BearerToken) -> Result<DeviceTree> {
        let response = self
            .http
            .get(self.api_url("/v1/h/devicetree"))
            .query(&[("hf", "soltinv")])
            .header(AUTHORIZATION, token.authorization())
            .send()
            .await?;
        Self::read_json(response, "devicetree", AUTH_ERROR_BODY_LIMIT).await
    }
}

/// Look for the refresh cookie across every `Set-Cookie` header, in order
fn refresh_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let joined = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(", ");
    extract_refresh_token(&joined)
}

fn truncate(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}
