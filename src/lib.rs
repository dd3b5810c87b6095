#[macro_use]
mod macros;
mod api;
mod document;
mod engine;
mod error;
mod store;

use std::collections::HashMap;

pub use api::{Interpreter, MatchDetails, Options, Reply, TopicSearch};
pub use document::{Element, Node, parse_document};
pub use engine::{MatchPredicate, translate};
pub use error::{Error, Result};
pub use store::{Category, CategoryIndex, CategoryStore};

// --- Pattern language ---------------------------------------------------------

/// Pattern returned by matching when nothing else accepts the input, and the
/// pattern rendered as a last resort by [`Interpreter::render_by_pattern`].
pub const MATCHES_ANYTHING: &str = "*";

/// A wildcard token of the pattern language.
///
/// Each cardinality has two spellings. The "highest" spellings advertise a
/// higher priority, but matching treats both spellings of a cardinality the
/// same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// `*`
    OneOrMore,
    /// `_`
    OneOrMoreHighest,
    /// `^`
    ZeroOrMore,
    /// `#`
    ZeroOrMoreHighest,
}

impl Wildcard {
    /// All spellings, in the order they are translated.
    pub const ALL: [Wildcard; 4] =
        [Wildcard::OneOrMore, Wildcard::OneOrMoreHighest, Wildcard::ZeroOrMore, Wildcard::ZeroOrMoreHighest];

    pub fn symbol(self) -> &'static str {
        match self {
            Wildcard::OneOrMore => "*",
            Wildcard::OneOrMoreHighest => "_",
            Wildcard::ZeroOrMore => "^",
            Wildcard::ZeroOrMoreHighest => "#",
        }
    }

    /// Regular-expression fragment the token translates to.
    pub fn expression(self) -> &'static str {
        match self {
            Wildcard::OneOrMore | Wildcard::OneOrMoreHighest => ".+",
            Wildcard::ZeroOrMore | Wildcard::ZeroOrMoreHighest => ".*",
        }
    }

    fn flag(self) -> WildcardSet {
        match self {
            Wildcard::OneOrMore => WildcardSet::ONE_OR_MORE,
            Wildcard::OneOrMoreHighest => WildcardSet::ONE_OR_MORE_HIGHEST,
            Wildcard::ZeroOrMore => WildcardSet::ZERO_OR_MORE,
            Wildcard::ZeroOrMoreHighest => WildcardSet::ZERO_OR_MORE_HIGHEST,
        }
    }
}

bitflags::bitflags! {
    /// Which wildcard spellings occur in a pattern.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WildcardSet: u8 {
        const ONE_OR_MORE          = 1 << 0;
        const ONE_OR_MORE_HIGHEST  = 1 << 1;
        const ZERO_OR_MORE         = 1 << 2;
        const ZERO_OR_MORE_HIGHEST = 1 << 3;
    }
}

impl WildcardSet {
    /// Scan `pattern` for wildcard spellings.
    pub fn of(pattern: &str) -> Self {
        Wildcard::ALL
            .iter()
            .filter(|w| pattern.contains(w.symbol()))
            .fold(WildcardSet::empty(), |set, w| set | w.flag())
    }

    /// True when the pattern has no wildcards at all.
    pub fn is_literal(self) -> bool {
        self.is_empty()
    }
}

// --- Session state ------------------------------------------------------------

/// Per-session conversational state ("predicates").
///
/// Owned by the caller and passed by `&mut` into every render call; the
/// interpreter never keeps a reference to it between calls. Entries are
/// only ever created or overwritten, never removed, by rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicates {
    values: HashMap<String, String>,
}

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Store `value` under `name`, returning the previous value if any.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Predicates {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Predicates { values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_set_records_each_spelling() {
        assert!(WildcardSet::of("HELLO WORLD").is_literal());
        assert_eq!(WildcardSet::of("HELLO *"), WildcardSet::ONE_OR_MORE);
        assert_eq!(WildcardSet::of("_ LIKES #"), WildcardSet::ONE_OR_MORE_HIGHEST | WildcardSet::ZERO_OR_MORE_HIGHEST);
        assert_eq!(WildcardSet::of("^ YES"), WildcardSet::ZERO_OR_MORE);
    }

    #[test]
    fn predicates_overwrite_and_report_previous() {
        let mut predicates = Predicates::new();
        assert_eq!(predicates.set("name", "Bob"), None);
        assert_eq!(predicates.set("name", "Alice"), Some("Bob".to_string()));
        assert_eq!(predicates.get("name"), Some("Alice"));
        assert_eq!(predicates.len(), 1);
    }
}
