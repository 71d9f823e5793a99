//! Small string and encoding helpers shared across the crate.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

use crate::error::{Error, Result};

/// Characters that stay literal when percent-encoding userinfo. Everything
/// outside this set (including `@`, `:`, `/`, and `%` themselves) is escaped.
const USERINFO_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn encode_userinfo(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, USERINFO_ENCODE_SET).to_string()
}

pub(crate) fn percent_decode(s: &str, err_message: &str) -> Result<String> {
    match percent_encoding::percent_decode_str(s).decode_utf8() {
        Ok(result) => Ok(result.to_string()),
        Err(_) => Err(Error::invalid_argument(err_message)),
    }
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

pub(crate) fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_userinfo_reserved_characters() {
        assert_eq!(encode_userinfo("fjudge7@gmail.com"), "fjudge7%40gmail.com");
        assert_eq!(encode_userinfo("P@ssw/0r%d@"), "P%40ssw%2F0r%25d%40");
    }

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(
            percent_decode("fjudge7%40gmail.com", "bad").unwrap(),
            "fjudge7@gmail.com"
        );
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some("   ")));
        assert!(!is_blank(Some("a")));
    }

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("27017"));
        assert!(is_numeric(" 27017 "));
        assert!(is_numeric("27017.5"));
        assert!(!is_numeric("abcde"));
        assert!(!is_numeric(""));
    }
}
