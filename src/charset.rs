//! Charsets and mask parsing
//!
//! Resolves hashcat-style masks (`?l?u?d?s?a?b`, `??` for a literal `?`) into
//! one alphabet per output position, and builds the effective charset used by
//! the charset/length-range mode.

use crate::error::{GeneratorError, Result};

pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
/// The 32 printable ASCII punctuation characters
pub const SPECIAL: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
/// `?b` is the two characters `0` and `1`, not a byte range
pub const BINARY: &str = "01";

/// Ordered alphabet for one output position
///
/// Order is significant: enumeration follows it exactly. Duplicates are kept
/// unless [`Charset::dedup`] is called.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    pub fn new(chars: &str) -> Self {
        Self {
            chars: chars.chars().collect(),
        }
    }

    pub fn single(c: char) -> Self {
        Self { chars: vec![c] }
    }

    /// Built-in charset for a mask code (`l`, `u`, `d`, `s`, `a`, `b`)
    pub fn builtin(code: char) -> Option<Self> {
        let chars = match code {
            'l' => LOWERCASE.to_string(),
            'u' => UPPERCASE.to_string(),
            'd' => DIGITS.to_string(),
            's' => SPECIAL.to_string(),
            'a' => [LOWERCASE, UPPERCASE, DIGITS, SPECIAL].concat(),
            'b' => BINARY.to_string(),
            _ => return None,
        };
        Some(Self::new(&chars))
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Drop repeated characters, keeping the first occurrence of each
    pub fn dedup(&self) -> Self {
        let mut seen = hashbrown::HashSet::with_capacity(self.chars.len());
        let chars = self.chars.iter().copied().filter(|c| seen.insert(*c)).collect();
        Self { chars }
    }

    /// Sorted, deduplicated rendering for display only
    pub fn preview(&self) -> String {
        let mut chars = self.chars.clone();
        chars.sort_unstable();
        chars.dedup();
        chars.into_iter().collect()
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

/// A parsed mask: one alphabet per output position
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedMask {
    positions: Vec<Charset>,
}

impl ParsedMask {
    pub fn positions(&self) -> &[Charset] {
        &self.positions
    }

    /// Length of every string the mask produces
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Parse a hashcat-style mask, left to right
pub fn parse_mask(mask: &str) -> Result<ParsedMask> {
    let mut positions = Vec::with_capacity(mask.len());
    let mut chars = mask.chars();

    while let Some(c) = chars.next() {
        if c != '?' {
            positions.push(Charset::single(c));
            continue;
        }

        match chars.next() {
            Some('?') => positions.push(Charset::single('?')),
            Some(code) => {
                let charset = Charset::builtin(code).ok_or_else(|| {
                    GeneratorError::mask(mask, format!("unknown charset '?{}'", code))
                })?;
                positions.push(charset);
            }
            None => return Err(GeneratorError::mask(mask, "mask ends with an unescaped '?'")),
        }
    }

    Ok(ParsedMask { positions })
}

/// Build the effective charset for charset/length-range mode
///
/// The special set is appended after the user charset when requested. With
/// `dedup` set, repeats are removed keeping first occurrences, so the result
/// is deterministic but not sorted.
pub fn resolve_charset(base: &str, include_special: bool, dedup: bool) -> Charset {
    let mut chars = base.to_string();
    if include_special {
        chars.push_str(SPECIAL);
    }

    let charset = Charset::new(&chars);
    if dedup {
        charset.dedup()
    } else {
        charset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sizes() {
        assert_eq!(Charset::builtin('l').unwrap().len(), 26);
        assert_eq!(Charset::builtin('u').unwrap().len(), 26);
        assert_eq!(Charset::builtin('d').unwrap().len(), 10);
        assert_eq!(Charset::builtin('s').unwrap().len(), 32);
        assert_eq!(Charset::builtin('a').unwrap().len(), 94);
        assert_eq!(Charset::builtin('b').unwrap().chars(), &['0', '1']);
        assert!(Charset::builtin('x').is_none());
    }

    #[test]
    fn test_parse_lower_digit() {
        let mask = parse_mask("?l?d").unwrap();
        assert_eq!(mask.len(), 2);
        assert_eq!(mask.positions()[0].len(), 26);
        assert_eq!(mask.positions()[1].len(), 10);
    }

    #[test]
    fn test_parse_literals_and_escape() {
        let mask = parse_mask("a??b").unwrap();
        let rendered: Vec<String> = mask.positions().iter().map(|c| c.as_string()).collect();
        assert_eq!(rendered, vec!["a", "?", "b"]);
    }

    #[test]
    fn test_parse_unknown_escape() {
        let err = parse_mask("?l?x").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidMask { .. }));
    }

    #[test]
    fn test_parse_trailing_question_mark() {
        let err = parse_mask("abc?").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidMask { .. }));
    }

    #[test]
    fn test_resolve_keeps_order() {
        let charset = resolve_charset("cab", false, false);
        assert_eq!(charset.as_string(), "cab");

        let charset = resolve_charset("ab!", true, true);
        assert_eq!(charset.len(), 2 + SPECIAL.len());
        assert_eq!(&charset.as_string()[..3], "ab!");
    }

    #[test]
    fn test_resolve_without_dedup_keeps_repeats() {
        let charset = resolve_charset("aab", false, false);
        assert_eq!(charset.len(), 3);
        assert_eq!(resolve_charset("aab", false, true).as_string(), "ab");
    }

    #[test]
    fn test_preview_sorted() {
        let charset = Charset::new("cbacb");
        assert_eq!(charset.preview(), "abc");
        assert_eq!(charset.as_string(), "cbacb");
    }
}
