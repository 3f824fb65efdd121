/*
 * xoauth2.rs
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

//! XOAUTH2 SASL client response (Gmail/Outlook legacy bearer framing).
//!
//! ```text
//! base64("user=" {email} "\x01" "auth=Bearer " {access_token} "\x01\x01")
//! ```
//!
//! See <https://developers.google.com/gmail/imap/xoauth2-protocol>

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Build the base64-encoded XOAUTH2 client response.
pub fn xoauth2_client_response(email: &str, access_token: &str) -> String {
    let raw = format!("user={}\x01auth=Bearer {}\x01\x01", email, access_token);
    BASE64.encode(raw.as_bytes())
}
