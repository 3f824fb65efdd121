/*
 * mechanism.rs
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

//! SASL mechanism names and metadata.

use crate::capability;

/// Supported SASL mechanisms (client-side, bearer token only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaslMechanism {
    /// OAUTHBEARER (RFC 7628) – GS2-framed OAuth2 bearer token.
    OauthBearer,
    /// XOAUTH2 – legacy bearer token framing (Gmail, Outlook).
    XOAuth2,
}

impl SaslMechanism {
    pub fn name(&self) -> &'static str {
        match self {
            SaslMechanism::OauthBearer => "OAUTHBEARER",
            SaslMechanism::XOAuth2 => "XOAUTH2",
        }
    }

    /// Capability token the server must advertise for this mechanism.
    pub fn auth_capability(&self) -> &'static str {
        match self {
            SaslMechanism::OauthBearer => capability::AUTH_OAUTHBEARER,
            SaslMechanism::XOAuth2 => capability::AUTH_XOAUTH2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "OAUTHBEARER" => Some(SaslMechanism::OauthBearer),
            "XOAUTH2" => Some(SaslMechanism::XOAuth2),
            _ => None,
        }
    }
}

impl std::fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_case_insensitive() {
        assert_eq!(
            SaslMechanism::from_name("oauthbearer"),
            Some(SaslMechanism::OauthBearer)
        );
        assert_eq!(SaslMechanism::from_name(" XOAUTH2 "), Some(SaslMechanism::XOAuth2));
        assert_eq!(SaslMechanism::from_name("PLAIN"), None);
    }
}
