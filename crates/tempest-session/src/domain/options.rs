//! Connect parameters handed to the connector.

use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters required to dial a server.
///
/// Only `server_code` is mandatory; everything else is passed through to the
/// connector untouched apart from whitespace trimming.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Authentication server address
    pub auth_server: String,
    pub username: String,
    pub password: String,
    /// Pre-issued auth token, used instead of username/password
    pub token: String,
    /// Server to join
    pub server_code: String,
    pub server_password: String,
}

impl ConnectOptions {
    /// Options for `server_code` with no credentials.
    pub fn new(server_code: impl Into<String>) -> Self {
        Self {
            server_code: server_code.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_auth_server(mut self, address: impl Into<String>) -> Self {
        self.auth_server = address.into();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_server_password(mut self, password: impl Into<String>) -> Self {
        self.server_password = password.into();
        self
    }

    /// Trim identification fields and check that the required ones are set.
    ///
    /// Passwords are kept verbatim.
    pub fn validate(mut self) -> SessionResult<Self> {
        self.auth_server = self.auth_server.trim().to_string();
        self.username = self.username.trim().to_string();
        self.token = self.token.trim().to_string();
        self.server_code = self.server_code.trim().to_string();

        if self.server_code.is_empty() {
            return Err(SessionError::invalid_options("server code is required"));
        }
        Ok(self)
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("auth_server", &self.auth_server)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("token", &redact(&self.token))
            .field("server_code", &self.server_code)
            .field("server_password", &redact(&self.server_password))
            .finish()
    }
}
