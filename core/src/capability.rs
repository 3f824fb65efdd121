/*
 * capability.rs
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

//! Server capability set, parsed from "* CAPABILITY ..." lines or from a
//! "[CAPABILITY ...]" response code. Replaced wholesale on every CAPABILITY
//! response; capabilities are a point-in-time full list and may change after
//! authentication, so stale entries are never merged in.

use std::collections::HashSet;

/// Inline SASL initial response (RFC 4959).
pub const SASL_IR: &str = "SASL-IR";
/// Server-side IDLE support (RFC 2177).
pub const IDLE: &str = "IDLE";
/// XOAUTH2 SASL mechanism.
pub const AUTH_XOAUTH2: &str = "AUTH=XOAUTH2";
/// OAUTHBEARER SASL mechanism (RFC 7628).
pub const AUTH_OAUTHBEARER: &str = "AUTH=OAUTHBEARER";
/// Baseline protocol revision.
pub const IMAP4REV1: &str = "IMAP4REV1";

/// Case-insensitive set of capability tokens advertised by the server.
/// Empty at connect time.
#[derive(Debug, Clone, Default)]
pub struct Capability {
    tokens: HashSet<String>,
}

impl Capability {
    pub fn new() -> Self {
        Self {
            tokens: HashSet::new(),
        }
    }

    /// Build from an iterator of tokens (used by tests and greeting codes).
    pub fn from_tokens<I, S>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: iter
                .into_iter()
                .map(|s| s.as_ref().to_ascii_uppercase())
                .collect(),
        }
    }

    /// Parse a capability list from either an untagged "* CAPABILITY ..."
    /// line or a line embedding a "[CAPABILITY ...]" response code.
    /// Returns an empty set if the line carries neither form.
    pub fn parse(line: &str) -> Self {
        let upper = line.to_ascii_uppercase();
        let list = if let Some(rest) = upper.strip_prefix("* CAPABILITY ") {
            rest
        } else if let Some(start) = upper.find("[CAPABILITY ") {
            let after = &upper[start + "[CAPABILITY ".len()..];
            after.split(']').next().unwrap_or("")
        } else {
            ""
        };
        Self {
            tokens: list.split_whitespace().map(|w| w.to_string()).collect(),
        }
    }

    /// True if the server advertises this capability. Case-insensitive
    /// exact-token match.
    pub fn has_capability(&self, name: &str) -> bool {
        self.tokens.contains(&name.to_ascii_uppercase())
    }

    /// Replace the whole set with a freshly parsed one.
    pub fn replace_with(&mut self, other: Capability) {
        self.tokens = other.tokens;
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}
