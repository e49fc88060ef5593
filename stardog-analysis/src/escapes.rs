//! Unicode codepoint escape normalization.
//!
//! Query languages such as SPARQL process `\uXXXX` and `\UXXXXXXXX` escapes
//! before tokenizing. Lexing then happens on the unescaped text, so every
//! offset it reports is shifted left by the characters each escape swallowed.
//! [`EscapeMap`] records that shift and maps offsets back to the raw text the
//! editor sees.

use crate::cst::CstNode;
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EscapeEntry {
    /// Offset in the unescaped text just past the decoded character.
    position: usize,
    /// Total bytes removed by this and every earlier escape.
    displaced: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscapeMap {
    entries: Vec<EscapeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unescaped {
    pub text: String,
    pub escapes: EscapeMap,
}

/// Decode every valid codepoint escape in `raw`. Malformed escapes and
/// escapes naming an invalid scalar value are left untouched.
pub fn unescape_codepoints(raw: &str) -> Unescaped {
    let mut text = String::with_capacity(raw.len());
    let mut entries = Vec::new();
    let mut displaced = 0;
    let mut rest = raw;

    while let Some(idx) = rest.find('\\') {
        text.push_str(&rest[..idx]);
        rest = &rest[idx..];
        match decode_escape(rest) {
            Some((ch, consumed)) => {
                text.push(ch);
                displaced += consumed - ch.len_utf8();
                entries.push(EscapeEntry {
                    position: text.len(),
                    displaced,
                });
                rest = &rest[consumed..];
            }
            None => {
                text.push('\\');
                rest = &rest[1..];
            }
        }
    }
    text.push_str(rest);

    Unescaped {
        text,
        escapes: EscapeMap { entries },
    }
}

fn hex_value(digits: &str, len: usize) -> Option<u32> {
    let digits = digits.get(..len)?;
    if !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn decode_escape(text: &str) -> Option<(char, usize)> {
    if let Some(rest) = text.strip_prefix("\\u") {
        let unit = hex_value(rest, 4)?;
        if (0xD800..0xDC00).contains(&unit) {
            // surrogate pair written as two escapes
            let low = rest
                .get(4..)
                .and_then(|tail| tail.strip_prefix("\\u"))
                .and_then(|tail| hex_value(tail, 4))
                .filter(|low| (0xDC00..0xE000).contains(low))?;
            let scalar = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(scalar).map(|ch| (ch, 12));
        }
        return char::from_u32(unit).map(|ch| (ch, 6));
    }
    if let Some(rest) = text.strip_prefix("\\U") {
        let scalar = hex_value(rest, 8)?;
        return char::from_u32(scalar).map(|ch| (ch, 10));
    }
    None
}

impl EscapeMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map an offset in the unescaped text back to the raw text. An offset
    /// sitting right after a decoded character lands after its escape.
    pub fn to_raw_offset(&self, offset: usize) -> usize {
        let idx = self.entries.partition_point(|entry| entry.position <= offset);
        match idx {
            0 => offset,
            _ => offset + self.entries[idx - 1].displaced,
        }
    }

    /// Rewrite a token lexed from unescaped text into raw coordinates. The
    /// image becomes the raw slice so it matches what the editor shows.
    pub fn remap_token(&self, token: &mut Token, raw: &str) {
        if self.is_empty() {
            return;
        }
        let start = self.to_raw_offset(token.start_offset);
        if token.image.is_empty() {
            token.start_offset = start;
            token.end_offset = start;
            return;
        }
        let end = self.to_raw_offset(token.end());
        if let Some(image) = raw.get(start..end) {
            token.image = image.to_string();
        }
        token.start_offset = start;
        token.end_offset = end.saturating_sub(1).max(start);
    }

    pub fn remap_cst(&self, cst: &mut CstNode, raw: &str) {
        if self.is_empty() {
            return;
        }
        cst.for_each_token_mut(&mut |token| self.remap_token(token, raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn decodes_four_digit_escapes() {
        let raw = "S\\u0045LECT * \\u007B ?s ?p ?o \\u007D";
        assert_eq!(unescape_codepoints(raw).text, "SELECT * { ?s ?p ?o }");
    }

    #[test]
    fn decodes_eight_digit_escapes_and_surrogate_pairs() {
        assert_eq!(unescape_codepoints("a\\U0001F600b").text, "a😀b");
        assert_eq!(unescape_codepoints("\\uD83D\\uDE00").text, "😀");
    }

    #[test]
    fn leaves_malformed_escapes_alone() {
        let result = unescape_codepoints("\\u12 \\UFFFFFFFF \\n \\uD800x");
        assert_eq!(result.text, "\\u12 \\UFFFFFFFF \\n \\uD800x");
        assert!(result.escapes.is_empty());
    }

    #[test]
    fn maps_offsets_around_an_escape() {
        // raw: a b c  ->  unescaped: a b c
        let result = unescape_codepoints("a\\u0062c");
        assert_eq!(result.text, "abc");
        assert_eq!(result.escapes.to_raw_offset(0), 0);
        assert_eq!(result.escapes.to_raw_offset(1), 1);
        assert_eq!(result.escapes.to_raw_offset(2), 7);
        assert_eq!(result.escapes.to_raw_offset(3), 8);
    }

    #[test]
    fn remapped_token_spans_its_escape() {
        let raw = "x \\u0041BC y";
        let result = unescape_codepoints(raw);
        assert_eq!(result.text, "x ABC y");
        let ty = Arc::new(TokenType::literal("WORD", "ABC"));
        let mut token = Token::new(ty, "ABC", 2);
        result.escapes.remap_token(&mut token, raw);
        assert_eq!(token.image, "\\u0041BC");
        assert_eq!(token.start_offset, 2);
        assert_eq!(token.end_offset, 9);
    }

    fn escape_char(ch: char, long: bool) -> String {
        if long {
            format!("\\U{:08X}", ch as u32)
        } else if (ch as u32) < 0x10000 {
            format!("\\u{:04X}", ch as u32)
        } else {
            format!("\\U{:08X}", ch as u32)
        }
    }

    proptest! {
        #[test]
        fn remapped_tokens_recover_raw_text(
            parts in prop::collection::vec(("[a-zé😀]{1,5}", prop::collection::vec(any::<(bool, bool)>(), 5)), 1..6)
        ) {
            let ty = Arc::new(TokenType::literal("WORD", "word"));
            let mut raw = String::new();
            let mut raw_words = Vec::new();
            for (word, flags) in &parts {
                let start = raw.len();
                for (ch, (escaped, long)) in word.chars().zip(flags.iter().cycle()) {
                    if *escaped {
                        raw.push_str(&escape_char(ch, *long));
                    } else {
                        raw.push(ch);
                    }
                }
                raw_words.push(raw[start..].to_string());
                raw.push(' ');
            }

            let result = unescape_codepoints(&raw);
            let mut offset = 0;
            for (idx, word) in result.text.split(' ').filter(|w| !w.is_empty()).enumerate() {
                let start = result.text[offset..].find(word).map(|at| at + offset).unwrap();
                offset = start + word.len();
                let mut token = Token::new(ty.clone(), word, start);
                result.escapes.remap_token(&mut token, &raw);
                prop_assert_eq!(&token.image, &raw_words[idx]);
                prop_assert_eq!(&raw[token.start_offset..=token.end_offset], raw_words[idx].as_str());
                prop_assert_eq!(unescape_codepoints(&token.image).text, word);
            }
        }
    }
}
