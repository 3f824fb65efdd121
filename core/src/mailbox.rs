/*
 * mailbox.rs
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

//! Mailbox name codec for the wire (RFC 3501 §5.1.3). Names are sent as
//! 7-bit ASCII: non-ASCII characters are re-encoded with modified UTF-7
//! (shift sequences `&`...`-`, modified base64 with `,` for `/`, no
//! padding); a pure-ASCII name containing a space or another special is
//! wrapped in double quotes instead. The two escaping paths are chosen by
//! inspecting the character set before encoding.

use std::sync::OnceLock;

use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use base64::{alphabet::Alphabet, Engine};

const MODIFIED_B64: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+,";

fn utf7_engine() -> &'static GeneralPurpose {
    static ENGINE: OnceLock<GeneralPurpose> = OnceLock::new();
    ENGINE.get_or_init(|| {
        let alphabet = Alphabet::new(MODIFIED_B64).expect("modified base64 alphabet");
        GeneralPurpose::new(
            &alphabet,
            GeneralPurposeConfig::new()
                .with_encode_padding(false)
                .with_decode_padding_mode(DecodePaddingMode::RequireNone),
        )
    })
}

/// Direct characters: printable US-ASCII except `&`, which shifts.
fn is_direct(c: char) -> bool {
    (' '..='~').contains(&c) && c != '&'
}

fn needs_quoting(name: &str) -> bool {
    name.is_empty()
        || name
            .chars()
            .any(|c| matches!(c, ' ' | '"' | '\\' | '(' | ')' | '{' | '}' | '%' | '*'))
}

/// Quote a string argument, escaping backslash and double quote.
pub fn quote_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Encode a mailbox name for transmission. Names that are already
/// unreserved ASCII pass through bare; ASCII names with a space or special
/// are quoted; names with characters outside printable ASCII go through
/// modified UTF-7 first.
pub fn encode_mailbox_name(name: &str) -> String {
    let encoded = if name.chars().all(is_direct) {
        name.to_string()
    } else {
        utf7_encode(name)
    };
    if needs_quoting(&encoded) {
        quote_string(&encoded)
    } else {
        encoded
    }
}

/// Modified UTF-7 transform (RFC 3501 variant of RFC 2152): printable
/// ASCII passes through, `&` becomes `&-`, runs of anything else become
/// `&` + modified-base64(UTF-16BE) + `-`.
pub fn utf7_encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len() * 2);
    let mut run: Vec<u8> = Vec::new();
    for c in name.chars() {
        if is_direct(c) {
            flush_run(&mut out, &mut run);
            out.push(c);
        } else if c == '&' {
            flush_run(&mut out, &mut run);
            out.push_str("&-");
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                run.extend_from_slice(&unit.to_be_bytes());
            }
        }
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut Vec<u8>) {
    if run.is_empty() {
        return;
    }
    out.push('&');
    out.push_str(&utf7_engine().encode(run.as_slice()));
    out.push('-');
    run.clear();
}

/// Decode a modified UTF-7 mailbox name. Malformed shift sequences are
/// kept verbatim rather than failing the whole name.
pub fn utf7_decode(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        let mut shifted = String::new();
        let mut closed = false;
        for c2 in chars.by_ref() {
            if c2 == '-' {
                closed = true;
                break;
            }
            shifted.push(c2);
        }
        if shifted.is_empty() {
            // "&-" is a literal ampersand
            out.push('&');
            continue;
        }
        match decode_shift(&shifted) {
            Some(s) if closed => out.push_str(&s),
            _ => {
                out.push('&');
                out.push_str(&shifted);
                if closed {
                    out.push('-');
                }
            }
        }
    }
    out
}

fn decode_shift(shifted: &str) -> Option<String> {
    let bytes = utf7_engine().decode(shifted).ok()?;
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|p| u16::from_be_bytes([p[0], p[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_ascii_passes_through() {
        assert_eq!(encode_mailbox_name("folderABC"), "folderABC");
        assert_eq!(encode_mailbox_name("INBOX.Drafts"), "INBOX.Drafts");
    }

    #[test]
    fn test_space_means_quoted_not_utf7() {
        assert_eq!(encode_mailbox_name("folder ABC"), "\"folder ABC\"");
    }

    #[test]
    fn test_embedded_quote_is_escaped() {
        assert_eq!(encode_mailbox_name("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_non_ascii_uses_modified_utf7() {
        assert_eq!(encode_mailbox_name("测试"), "&bUuL1Q-");
    }

    #[test]
    fn test_mixed_ascii_and_non_ascii() {
        assert_eq!(utf7_encode("Entw&urfe"), "Entw&-urfe");
        assert_eq!(utf7_encode("Boîte"), "Bo&AO4-te");
    }

    #[test]
    fn test_utf7_round_trip() {
        for name in ["测试", "Boîte d'envoi", "Папка", "A&B", "mixed 日本語 run"] {
            assert_eq!(utf7_decode(&utf7_encode(name)), name);
        }
    }

    #[test]
    fn test_decode_literal_ampersand() {
        assert_eq!(utf7_decode("A&-B"), "A&B");
    }

    #[test]
    fn test_decode_malformed_shift_kept_verbatim() {
        assert_eq!(utf7_decode("&!!-x"), "&!!-x");
    }
}
