/*
 * oauthbearer.rs
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

//! OAUTHBEARER SASL client response (RFC 7628).
//!
//! The raw form is a GS2 header followed by key/value pairs separated by
//! SOH (0x01):
//!
//! ```text
//! n,a=<email>,^Ahost=<host>^Aport=<port>^Aauth=Bearer <token>^A^A
//! ```
//!
//! The wire form is the base64 encoding of the raw string, sent inline on
//! the AUTHENTICATE line when SASL-IR is available, otherwise as the
//! response to the server's `+` challenge.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

const SOH: char = '\x01';

/// Build the base64-encoded OAUTHBEARER client response.
pub fn oauthbearer_client_response(email: &str, host: &str, port: u16, token: &str) -> String {
    let mut raw = String::with_capacity(email.len() + host.len() + token.len() + 50);
    raw.push_str("n,a=");
    raw.push_str(email);
    raw.push(',');
    raw.push(SOH);
    raw.push_str("host=");
    raw.push_str(host);
    raw.push(SOH);
    raw.push_str("port=");
    raw.push_str(&port.to_string());
    raw.push(SOH);
    raw.push_str("auth=Bearer ");
    raw.push_str(token);
    raw.push(SOH);
    raw.push(SOH);
    BASE64.encode(raw.as_bytes())
}
