/*
 * mod.rs
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

//! SASL client responses for the AUTHENTICATE command family. Only bearer
//! token mechanisms are carried: OAUTHBEARER (RFC 7628) and the older
//! XOAUTH2. Both are single-shot: the whole payload goes either inline on
//! the AUTHENTICATE line (SASL-IR) or as the one continuation response.

mod mechanism;
mod oauthbearer;
mod xoauth2;

pub use mechanism::SaslMechanism;
pub use oauthbearer::oauthbearer_client_response;
pub use xoauth2::xoauth2_client_response;
