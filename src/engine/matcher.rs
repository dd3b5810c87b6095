//! Pattern matching with topic fallback.
//!
//! ```text
//! input ── uppercase + trim ──┬─ topic patterns (store order) ── first accept ─▶ pattern
//!                             ├─ default-topic patterns ──────── first accept ─▶ pattern
//!                             └─ nothing accepted ──────────────────────────────▶ "*"
//! ```
//!
//! There is no specificity ranking: the first pattern in enumeration order
//! that accepts the input wins, whether it is literal or wildcard. Pattern
//! text is not normalized here; patterns are expected to be uppercase.
//!
//! Translated predicates are memoized per pattern string, including patterns
//! that fail to translate (those are skipped, once warned about).

use super::metrics::TopicSearch;
use super::wildcard::{MatchPredicate, translate};
use crate::CategoryStore;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Where a match was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Found {
    pub topic: String,
    pub pattern: String,
}

#[derive(Debug, Default)]
pub(crate) struct Matcher {
    cache: HashMap<String, Option<MatchPredicate>>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct patterns translated so far.
    #[cfg(test)]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// First pattern accepting `input`, searching `topic` then `default_topic`.
    ///
    /// `_that` is part of the matching contract but does not influence the
    /// decision yet.
    pub fn find<S: CategoryStore>(
        &mut self,
        store: &S,
        input: &str,
        topic: &str,
        _that: &str,
        default_topic: &str,
    ) -> Option<Found> {
        let normalized = normalize(input);
        self.search(store, &normalized, topic, None)
            .or_else(|| if topic == default_topic { None } else { self.search(store, &normalized, default_topic, None) })
    }

    /// Like [`Matcher::find`], also returning one [`TopicSearch`] per topic
    /// visited.
    pub fn find_with_metrics<S: CategoryStore>(
        &mut self,
        store: &S,
        input: &str,
        topic: &str,
        _that: &str,
        default_topic: &str,
    ) -> (Option<Found>, Vec<TopicSearch>) {
        let normalized = normalize(input);
        let mut searches = Vec::new();

        let mut first = TopicSearch { topic: topic.to_string(), ..TopicSearch::default() };
        let mut found = self.search(store, &normalized, topic, Some(&mut first));
        searches.push(first);

        if found.is_none() && topic != default_topic {
            let mut fallback = TopicSearch { topic: default_topic.to_string(), ..TopicSearch::default() };
            found = self.search(store, &normalized, default_topic, Some(&mut fallback));
            searches.push(fallback);
        }

        (found, searches)
    }

    fn search<S: CategoryStore>(
        &mut self,
        store: &S,
        input: &str,
        topic: &str,
        mut metrics: Option<&mut TopicSearch>,
    ) -> Option<Found> {
        let started = Instant::now();
        let mut found = None;

        for pattern in store.patterns(topic) {
            let Some(predicate) = self.predicate(pattern) else {
                if let Some(m) = metrics.as_deref_mut() {
                    m.skipped += 1;
                }
                continue;
            };
            if let Some(m) = metrics.as_deref_mut() {
                m.tried += 1;
            }

            let accepted = predicate.accepts(input);
            trace!(topic, pattern, accepted, "pattern tested");
            if accepted {
                found = Some(Found { topic: topic.to_string(), pattern: pattern.to_string() });
                break;
            }
        }

        if let Some(m) = metrics {
            m.matched = found.as_ref().map(|f| f.pattern.clone());
            m.elapsed = started.elapsed();
        }
        debug!(topic, input, matched = ?found.as_ref().map(|f| f.pattern.as_str()), "topic searched");
        found
    }

    fn predicate(&mut self, pattern: &str) -> Option<&MatchPredicate> {
        if !self.cache.contains_key(pattern) {
            let translated = match translate(pattern) {
                Ok(predicate) => Some(predicate),
                Err(err) => {
                    warn!(pattern, error = %err, "skipping pattern that does not translate");
                    None
                }
            };
            self.cache.insert(pattern.to_string(), translated);
        }
        self.cache.get(pattern).and_then(Option::as_ref)
    }
}

/// Input normalization: case folding by uppercasing, surrounding whitespace
/// removed.
pub(crate) fn normalize(input: &str) -> String {
    input.to_uppercase().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, CategoryIndex, Element};

    fn index(entries: &[(&str, &str)]) -> CategoryIndex {
        let mut index = CategoryIndex::new();
        for (topic, pattern) in entries {
            index.insert(Category::with_template(*topic, *pattern, Element::new("template").with_text("x")));
        }
        index
    }

    fn find(store: &CategoryIndex, input: &str, topic: &str) -> Option<Found> {
        Matcher::new().find(store, input, topic, "", "default")
    }

    #[test]
    fn input_is_uppercased_before_matching() {
        let store = index(&[("default", "HELLO *")]);
        let found = find(&store, "hello world", "default").unwrap();
        assert_eq!(found.pattern, "HELLO *");
    }

    #[test]
    fn topic_patterns_win_over_default_topic() {
        let store = index(&[("default", "I LIKE *"), ("FOOD", "I LIKE *")]);
        assert_eq!(find(&store, "i like tea", "FOOD").unwrap().topic, "FOOD");
    }

    #[test]
    fn falls_back_to_default_topic() {
        let store = index(&[("FOOD", "PIZZA"), ("default", "HELLO")]);
        let found = find(&store, "hello", "FOOD").unwrap();
        assert_eq!(found, Found { topic: "default".to_string(), pattern: "HELLO".to_string() });
    }

    #[test]
    fn no_match_anywhere() {
        let store = index(&[("FOOD", "PIZZA"), ("default", "HELLO")]);
        assert_eq!(find(&store, "goodbye", "FOOD"), None);
        assert_eq!(find(&store, "goodbye", "UNKNOWN TOPIC"), None);
    }

    #[test]
    fn first_match_in_enumeration_order_wins() {
        let store = index(&[("default", "*"), ("default", "HELLO")]);
        assert_eq!(find(&store, "hello", "default").unwrap().pattern, "*");

        let store = index(&[("default", "HELLO"), ("default", "*")]);
        assert_eq!(find(&store, "hello", "default").unwrap().pattern, "HELLO");
    }

    #[test]
    fn that_context_does_not_change_the_result() {
        let store = index(&[("default", "YES")]);
        let mut matcher = Matcher::new();
        let a = matcher.find(&store, "yes", "default", "", "default");
        let b = matcher.find(&store, "yes", "default", "DO YOU LIKE TEA", "default");
        assert_eq!(a, b);
    }

    #[test]
    fn untranslatable_patterns_are_skipped_and_counted() {
        let store = index(&[("default", "SMILE (:"), ("default", "SMILE *")]);
        let mut matcher = Matcher::new();
        let (found, searches) = matcher.find_with_metrics(&store, "smile (:", "default", "", "default");

        assert_eq!(found.unwrap().pattern, "SMILE *");
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].skipped, 1);
        assert_eq!(searches[0].tried, 1);
        assert_eq!(matcher.cached(), 2);
    }

    #[test]
    fn metrics_cover_both_topics_on_fallback() {
        let store = index(&[("FOOD", "PIZZA"), ("FOOD", "PASTA"), ("default", "HELLO")]);
        let (found, searches) = Matcher::new().find_with_metrics(&store, "hello", "FOOD", "", "default");

        assert_eq!(found.unwrap().pattern, "HELLO");
        assert_eq!(searches.len(), 2);
        assert_eq!((searches[0].tried, searches[0].matched.as_deref()), (2, None));
        assert_eq!((searches[1].tried, searches[1].matched.as_deref()), (1, Some("HELLO")));
    }

    #[test]
    fn cache_does_not_change_results() {
        let store = index(&[("default", "HELLO *"), ("default", "BYE")]);
        let mut matcher = Matcher::new();
        for _ in 0..3 {
            assert_eq!(matcher.find(&store, "bye", "default", "", "default").unwrap().pattern, "BYE");
            assert_eq!(matcher.find(&store, "hello you", "default", "", "default").unwrap().pattern, "HELLO *");
        }
        assert_eq!(matcher.cached(), 2);
    }
}
