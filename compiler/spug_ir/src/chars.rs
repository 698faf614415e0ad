//! Character classes shared by the markup lexer and the expression parser.
//!
//! All classes are ASCII-only. Template syntax is ASCII; non-ASCII bytes only
//! ever appear inside text runs and string literals, where they are copied
//! through without classification.

/// Space or tab.
#[inline]
pub const fn is_spacing(b: u8) -> bool {
    matches!(b, b' ' | b'\t')
}

/// Line terminator bytes.
#[inline]
pub const fn is_newline(b: u8) -> bool {
    matches!(b, b'\n' | b'\r')
}

/// Spacing or line terminator.
#[inline]
pub const fn is_whitespace(b: u8) -> bool {
    is_spacing(b) || is_newline(b)
}

#[inline]
pub const fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// ASCII letters; a line starting with one is a keyword or tag line.
#[inline]
pub const fn is_latin(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

/// Identifier characters in expressions: variable, member and key names.
#[inline]
pub const fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Tag names, class and id shorthand.
#[inline]
pub const fn is_tag_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_')
}

/// Bare attribute names, wide enough for framework bindings like
/// `@click`, `:value` or `(event)`.
#[inline]
pub const fn is_attr_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'@' | b'-' | b'_' | b':' | b'(' | b')' | b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_words_cover_framework_bindings() {
        for b in "@click:value(event).x-y_z".bytes() {
            assert!(is_attr_word(b), "{}", b as char);
        }
        assert!(!is_attr_word(b'='));
        assert!(!is_attr_word(b' '));
    }

    #[test]
    fn test_tag_words() {
        assert!("my-tag_2".bytes().all(is_tag_word));
        assert!(!is_tag_word(b'.'));
        assert!(!is_tag_word(b'#'));
        assert!(!is_tag_word(b':'));
    }

    #[test]
    fn test_ident_excludes_operators() {
        assert!("user_name1".bytes().all(is_ident));
        for b in "-+.[(".bytes() {
            assert!(!is_ident(b));
        }
    }

    #[test]
    fn test_whitespace_classes() {
        assert!(is_spacing(b'\t'));
        assert!(!is_spacing(b'\n'));
        assert!(is_newline(b'\r'));
        assert!(is_whitespace(b'\n'));
        assert!(!is_whitespace(b'x'));
    }
}
