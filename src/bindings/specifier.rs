/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Splitting of ALC specifier lists.

/// Split a list of null-terminated names ended by an empty name, e.g.
/// `b"Speakers\0Headphones\0\0"`. Anything after the empty name is ignored,
/// as is a missing final terminator.
pub fn parse_specifier(list: &[u8]) -> Vec<String> {
    list.split(|&byte| byte == 0)
        .take_while(|entry| !entry.is_empty())
        .map(|entry| String::from_utf8_lossy(entry).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists() {
        assert_eq!(parse_specifier(b"A\0B\0\0"), vec!["A", "B"]);
        assert_eq!(parse_specifier(b"OpenAL Soft\0\0"), vec!["OpenAL Soft"]);
    }

    #[test]
    fn empty_lists() {
        assert!(parse_specifier(b"\0").is_empty());
        assert!(parse_specifier(b"\0\0").is_empty());
        assert!(parse_specifier(b"").is_empty());
    }

    #[test]
    fn stops_at_first_empty_entry() {
        assert_eq!(parse_specifier(b"A\0\0B\0\0"), vec!["A"]);
    }
}
