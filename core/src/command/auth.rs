/*
 * auth.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Portalettere, an asynchronous IMAP client engine.
 *
 * Portalettere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Portalettere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Portalettere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Credential-bearing commands: LOGIN and the AUTHENTICATE bearer-token
//! mechanisms. Whether the SASL payload goes inline on the AUTHENTICATE
//! line or as the continuation response is decided once, at construction,
//! from the server's SASL-IR capability; using the other path afterwards
//! is a contract violation, not a silent re-encode.

use bytes::Bytes;

use super::CRLF;
use crate::capability::{self, Capability};
use crate::error::ImapError;
use crate::mailbox::quote_string;
use crate::sasl::{oauthbearer_client_response, xoauth2_client_response, SaslMechanism};

/// LOGIN with username and password, both sent as quoted strings.
pub struct LoginCommand {
    username: String,
    password: String,
}

impl std::fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoginCommand {{ username: {:?}, password: <redacted> }}", self.username)
    }
}

impl LoginCommand {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub(crate) fn encode(&self) -> Result<Bytes, ImapError> {
        Ok(Bytes::from(format!(
            "LOGIN {} {}{}",
            quote_string(&self.username),
            quote_string(&self.password),
            CRLF
        )))
    }

    pub(crate) fn debug_data(&self) -> String {
        format!("LOGIN FOR USER:{}", self.username)
    }

    pub(crate) fn cleanup(&mut self) {
        self.username = String::new();
        self.password = String::new();
    }
}

/// AUTHENTICATE OAUTHBEARER (RFC 7628).
pub struct AuthOauthBearerCommand {
    email: String,
    hostname: String,
    port: u16,
    token: String,
    /// Whether the server allows the one-liner form (RFC 4959) instead of
    /// a server challenge; captured from the capability set at build time.
    sasl_ir: bool,
}

impl AuthOauthBearerCommand {
    pub fn new(
        email: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
        token: impl Into<String>,
        caps: &Capability,
    ) -> Self {
        Self {
            email: email.into(),
            hostname: hostname.into(),
            port,
            token: token.into(),
            sasl_ir: caps.has_capability(capability::SASL_IR),
        }
    }

    fn client_response(&self) -> String {
        oauthbearer_client_response(&self.email, &self.hostname, self.port, &self.token)
    }

    pub(crate) fn encode(&self, caps: &Capability) -> Result<Bytes, ImapError> {
        let mechanism = SaslMechanism::OauthBearer;
        if !caps.has_capability(mechanism.auth_capability()) {
            return Err(ImapError::CapabilityMissing(
                mechanism.auth_capability().to_string(),
            ));
        }
        if self.sasl_ir {
            Ok(Bytes::from(format!(
                "AUTHENTICATE OAUTHBEARER {}{}",
                self.client_response(),
                CRLF
            )))
        } else {
            Ok(Bytes::from(format!("AUTHENTICATE OAUTHBEARER{}", CRLF)))
        }
    }

    pub(crate) fn expects_continuation(&self) -> bool {
        !self.sasl_ir
    }

    pub(crate) fn next_line(&self, _challenge: &str) -> Result<Bytes, ImapError> {
        // With SASL-IR the payload already went out inline; a challenge
        // here means the caller mixed up the two paths.
        if self.sasl_ir {
            return Err(ImapError::UnsupportedOperation);
        }
        Ok(Bytes::from(format!("{}{}", self.client_response(), CRLF)))
    }

    pub(crate) fn debug_data(&self) -> String {
        format!("AUTHENTICATE OAUTHBEARER FOR USER:{}", self.email)
    }

    pub(crate) fn cleanup(&mut self) {
        self.email = String::new();
        self.hostname = String::new();
        self.token = String::new();
    }
}

impl std::fmt::Debug for AuthOauthBearerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AuthOauthBearerCommand {{ email: {:?}, hostname: {:?}, port: {}, token: <redacted> }}",
            self.email, self.hostname, self.port
        )
    }
}

/// AUTHENTICATE XOAUTH2 (legacy bearer framing).
pub struct AuthXOauth2Command {
    email: String,
    token: String,
    sasl_ir: bool,
}

impl std::fmt::Debug for AuthXOauth2Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AuthXOauth2Command {{ email: {:?}, token: <redacted> }}",
            self.email
        )
    }
}

impl AuthXOauth2Command {
    pub fn new(email: impl Into<String>, token: impl Into<String>, caps: &Capability) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
            sasl_ir: caps.has_capability(capability::SASL_IR),
        }
    }

    fn client_response(&self) -> String {
        xoauth2_client_response(&self.email, &self.token)
    }

    pub(crate) fn encode(&self, caps: &Capability) -> Result<Bytes, ImapError> {
        let mechanism = SaslMechanism::XOAuth2;
        if !caps.has_capability(mechanism.auth_capability()) {
            return Err(ImapError::CapabilityMissing(
                mechanism.auth_capability().to_string(),
            ));
        }
        if self.sasl_ir {
            Ok(Bytes::from(format!(
                "AUTHENTICATE XOAUTH2 {}{}",
                self.client_response(),
                CRLF
            )))
        } else {
            Ok(Bytes::from(format!("AUTHENTICATE XOAUTH2{}", CRLF)))
        }
    }

    pub(crate) fn expects_continuation(&self) -> bool {
        !self.sasl_ir
    }

    pub(crate) fn next_line(&self, _challenge: &str) -> Result<Bytes, ImapError> {
        if self.sasl_ir {
            return Err(ImapError::UnsupportedOperation);
        }
        Ok(Bytes::from(format!("{}{}", self.client_response(), CRLF)))
    }

    pub(crate) fn debug_data(&self) -> String {
        format!("AUTHENTICATE XOAUTH2 FOR USER:{}", self.email)
    }

    pub(crate) fn cleanup(&mut self) {
        self.email = String::new();
        self.token = String::new();
    }
}
