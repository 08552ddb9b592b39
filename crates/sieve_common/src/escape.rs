//! Backslash escape decoding and encoding for tab-delimited text.
//!
//! Used for the `--separator` option and the `tsv` query library, where a
//! column may contain tabs or newlines only in escaped form.

/// Decodes `\t`, `\n`, `\r`, `\'`, `\"` and `\\` escapes.
///
/// Unknown escapes are dropped along with their backslash, and a trailing lone
/// backslash is ignored.
pub fn decode_escapes(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => decoded.push('\t'),
            Some('n') => decoded.push('\n'),
            Some('r') => decoded.push('\r'),
            Some('\'') => decoded.push('\''),
            Some('"') => decoded.push('"'),
            Some('\\') => decoded.push('\\'),
            Some(_) | None => {}
        }
    }
    decoded
}

/// Escapes backslashes, tabs, and line breaks so the result fits in one column.
pub fn encode_escapes(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => encoded.push_str("\\\\"),
            '\t' => encoded.push_str("\\t"),
            '\n' => encoded.push_str("\\n"),
            '\r' => encoded.push_str("\\r"),
            other => encoded.push(other),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_escapes() {
        assert_eq!(decode_escapes(r"a\tb\nc"), "a\tb\nc");
        assert_eq!(decode_escapes(r#"\'q\" \\"#), "'q\" \\");
    }

    #[test]
    fn drops_unknown_escape() {
        assert_eq!(decode_escapes(r"a\qb"), "ab");
    }

    #[test]
    fn trailing_backslash_ignored() {
        assert_eq!(decode_escapes("abc\\"), "abc");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(decode_escapes("plain"), "plain");
    }

    #[test]
    fn encode_then_decode_preserves_control_chars() {
        let raw = "col\twith\nbreaks\\";
        let encoded = encode_escapes(raw);
        assert!(!encoded.contains('\t'));
        assert!(!encoded.contains('\n'));
        assert_eq!(decode_escapes(&encoded), raw);
    }
}
