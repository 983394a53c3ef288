//! Bearer token acquisition for the Qendercore cloud
//!
//! Each poll cycle asks the [`SessionManager`] for a fresh bearer token. It
//! tries the stored rotating refresh token first and falls back to a full
//! login; whichever call succeeds and carries a new refresh token overwrites
//! the stored one before the bearer is handed out.

mod cookie;

pub use cookie::extract_refresh_token;

use std::sync::Arc;

use crate::error::{BridgeError, Result};
use crate::logging::get_logger;
use crate::persistence::SessionStore;
use crate::qendercore::{AuthApi, TokenGrant};

/// Short-lived bearer token, held in memory for one cycle only
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `authorization` header value in the form the API expects
    pub fn authorization(&self) -> String {
        format!("bearer {}", self.0)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Account credentials for the login fallback
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How the last bearer token was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquiredVia {
    Refresh,
    Login,
}

/// Refresh-first, login-fallback token acquisition
pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    store: SessionStore,
    credentials: Credentials,
    last_acquired_via: Option<AcquiredVia>,
    logger: crate::logging::StructuredLogger,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthApi>, store: SessionStore, credentials: Credentials) -> Self {
        Self {
            auth,
            store,
            credentials,
            last_acquired_via: None,
            logger: get_logger("session"),
        }
    }

    /// Obtain a bearer token; fails only if both refresh and login fail
    pub async fn acquire(&mut self) -> Result<BearerToken> {
        let refresh_error = match self.store.refresh_token().map(str::to_owned) {
            Some(refresh_token) => match self.auth.refresh(&refresh_token).await {
                Ok(grant) => {
                    self.logger.debug("Bearer token obtained via refresh");
                    return self.accept(grant, AcquiredVia::Refresh);
                }
                Err(e) => {
                    self.logger
                        .warn(&format!("Token refresh failed, falling back to login: {e}"));
                    Some(e)
                }
            },
            None => {
                self.logger.debug("No stored refresh token, logging in");
                None
            }
        };

        match self
            .auth
            .login(&self.credentials.username, &self.credentials.password)
            .await
        {
            Ok(grant) => {
                self.logger.info("Logged in to Qendercore");
                self.accept(grant, AcquiredVia::Login)
            }
            Err(login_error) => Err(BridgeError::auth(match refresh_error {
                Some(refresh_error) => {
                    format!("refresh failed ({refresh_error}); login failed ({login_error})")
                }
                None => format!("login failed ({login_error})"),
            })),
        }
    }

    /// Persist any newly issued refresh token, then hand out the bearer
    fn accept(&mut self, grant: TokenGrant, via: AcquiredVia) -> Result<BearerToken> {
        if let Some(refresh_token) = grant.refresh_token {
            self.store.set_refresh_token(refresh_token)?;
            self.logger.debug("Stored rotated refresh token");
        }
        self.last_acquired_via = Some(via);
        Ok(BearerToken::new(grant.access_token))
    }

    /// How the most recent [`SessionManager::acquire`] succeeded
    pub const fn last_acquired_via(&self) -> Option<AcquiredVia> {
        self.last_acquired_via
    }

    /// Backing store of the rotating refresh token
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }
}
