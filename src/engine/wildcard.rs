//! Wildcard translation.
//!
//! A rule pattern becomes an anchored regular expression by plain substring
//! replacement, in this order:
//!
//! ```text
//! "*" -> ".+"     "_" -> ".+"      (one or more of anything)
//! "^" -> ".*"     "#" -> ".*"      (zero or more of anything)
//! " " -> "\s*"                     (any run of whitespace, including none)
//! ```
//!
//! Nothing else in the pattern is escaped: literal text is handed to the
//! expression engine as-is, so a `.` in a pattern matches any character and
//! an unbalanced `(` makes the pattern fail to translate. Both spellings of a
//! cardinality produce the same expression.

use crate::{Error, Result, Wildcard};
use regex::Regex;

/// A translated pattern: a full-string match test over normalized input.
#[derive(Debug, Clone)]
pub struct MatchPredicate {
    pattern: String,
    regex: Regex,
}

impl MatchPredicate {
    /// Whether the whole of `input` is accepted.
    pub fn accepts(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }
}

/// Translate `pattern` into its match predicate.
pub fn translate(pattern: &str) -> Result<MatchPredicate> {
    let mut expression = pattern.trim().to_string();
    for wildcard in Wildcard::ALL {
        expression = expression.replace(wildcard.symbol(), wildcard.expression());
    }
    expression = expression.replace(' ', r"\s*");

    let regex = Regex::new(&format!("^(?:{expression})$"))
        .map_err(|source| Error::InvalidPattern { pattern: pattern.to_string(), source })?;
    Ok(MatchPredicate { pattern: pattern.to_string(), regex })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts(pattern: &str, input: &str) -> bool {
        translate(pattern).unwrap().accepts(input)
    }

    #[test]
    fn literal_patterns_match_themselves_and_whitespace_variants() {
        for pattern in ["HELLO", "HOW ARE YOU", "WHAT IS YOUR NAME"] {
            assert!(accepts(pattern, pattern), "{pattern}");
            assert!(accepts(pattern, &pattern.replace(' ', "   ")), "{pattern}");
            assert!(accepts(pattern, &pattern.replace(' ', "\t")), "{pattern}");
        }
        assert!(!accepts("HELLO", "HELLO THERE"));
        assert!(!accepts("HELLO", "SAY HELLO"));
    }

    #[test]
    fn spaces_may_collapse_entirely() {
        assert!(accepts("HOW ARE YOU", "HOWAREYOU"));
    }

    #[test]
    fn one_or_more_needs_input() {
        for pattern in ["*", "_"] {
            assert!(accepts(pattern, "ANYTHING AT ALL"));
            assert!(accepts(pattern, "X"));
            assert!(!accepts(pattern, ""));
        }
    }

    #[test]
    fn zero_or_more_accepts_empty_input() {
        for pattern in ["^", "#"] {
            assert!(accepts(pattern, ""));
            assert!(accepts(pattern, "ANYTHING AT ALL"));
        }
    }

    #[test]
    fn priority_spellings_translate_identically() {
        assert_eq!(translate("HELLO *").unwrap().expression(), translate("HELLO _").unwrap().expression());
        assert_eq!(translate("^ YES").unwrap().expression(), translate("# YES").unwrap().expression());
    }

    #[test]
    fn wildcards_inside_sentences() {
        assert!(accepts("HELLO *", "HELLO WORLD"));
        assert!(!accepts("HELLO *", "HELLO"));
        assert!(accepts("HELLO ^", "HELLO"));
        assert!(accepts("I LIKE * AND *", "I LIKE TEA AND CAKE"));
    }

    #[test]
    fn pattern_is_trimmed() {
        assert!(accepts("  HELLO  ", "HELLO"));
        assert_eq!(translate(" HI ").unwrap().pattern(), " HI ");
    }

    #[test]
    fn literal_metacharacters_are_not_escaped() {
        // "." is handed to the expression engine unchanged.
        assert!(accepts("A.B", "AXB"));
        assert!(matches!(translate("SMILE (:"), Err(Error::InvalidPattern { .. })));
    }
}
