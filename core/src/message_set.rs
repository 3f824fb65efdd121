/*
 * message_set.rs
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

//! Message number sets for FETCH-family commands: ordered singletons and
//! ranges of sequence numbers or UIDs, serialized in the protocol's compact
//! grammar (colon-joined ranges, comma-joined entries, `*` for the last
//! message).

use std::fmt;

/// One entry of a message set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageNumberSet {
    /// A single message number.
    Single(u32),
    /// An inclusive range `start:end`.
    Range(u32, u32),
    /// An open range `start:*` up to the last message.
    RangeFrom(u32),
    /// The last message, `*`.
    LastMessage,
}

impl fmt::Display for MessageNumberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageNumberSet::Single(n) => write!(f, "{}", n),
            MessageNumberSet::Range(a, b) => write!(f, "{}:{}", a, b),
            MessageNumberSet::RangeFrom(a) => write!(f, "{}:*", a),
            MessageNumberSet::LastMessage => write!(f, "*"),
        }
    }
}

/// Serialize a sequence of sets as one comma-joined argument.
pub fn to_sequence_string(sets: &[MessageNumberSet]) -> String {
    let mut out = String::new();
    for (i, s) in sets.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&s.to_string());
    }
    out
}

/// Build sets from explicit message numbers, collapsing contiguous runs
/// into ranges. Input is sorted and deduplicated first.
pub fn from_numbers(numbers: &[u32]) -> Vec<MessageNumberSet> {
    let mut nums: Vec<u32> = numbers.to_vec();
    nums.sort_unstable();
    nums.dedup();

    let mut out = Vec::new();
    let mut i = 0;
    while i < nums.len() {
        let start = nums[i];
        let mut end = start;
        while i + 1 < nums.len() && nums[i + 1] == end + 1 {
            end = nums[i + 1];
            i += 1;
        }
        if start == end {
            out.push(MessageNumberSet::Single(start));
        } else {
            out.push(MessageNumberSet::Range(start, end));
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(MessageNumberSet::Single(7).to_string(), "7");
        assert_eq!(MessageNumberSet::Range(1, 5).to_string(), "1:5");
        assert_eq!(MessageNumberSet::RangeFrom(4).to_string(), "4:*");
        assert_eq!(MessageNumberSet::LastMessage.to_string(), "*");
    }

    #[test]
    fn test_sequence_string_is_comma_joined() {
        let sets = [
            MessageNumberSet::Range(1, 5),
            MessageNumberSet::Single(8),
            MessageNumberSet::RangeFrom(10),
        ];
        assert_eq!(to_sequence_string(&sets), "1:5,8,10:*");
    }

    #[test]
    fn test_from_numbers_collapses_runs() {
        let sets = from_numbers(&[5, 1, 2, 3, 9, 8, 3]);
        assert_eq!(
            sets,
            vec![
                MessageNumberSet::Range(1, 3),
                MessageNumberSet::Single(5),
                MessageNumberSet::Range(8, 9),
            ]
        );
    }

    #[test]
    fn test_from_numbers_empty() {
        assert!(from_numbers(&[]).is_empty());
    }
}
