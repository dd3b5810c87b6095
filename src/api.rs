use crate::engine::{Evaluator, Matcher};
use crate::{CategoryStore, Element, MATCHES_ANYTHING, Predicates, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};
use tracing::debug;

pub use crate::engine::TopicSearch;

/// Options that affect matching and rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Topic searched when the requested topic has no match, and the only
    /// topic `<srai>` looks in.
    pub default_topic: String,
    /// Answer when nothing matched or a rule rendered to nothing.
    pub default_response: String,
    /// Answer when an `<srai>` target does not exist.
    pub error_response: String,
    /// Deepest allowed `<srai>` nesting.
    pub max_srai_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_topic: "default".to_string(),
            default_response: "I have no answer for that.".to_string(),
            error_response: "Something is wrong with my brain.".to_string(),
            max_srai_depth: 32,
        }
    }
}

/// One conversational turn: the pattern that was matched and the rendered
/// answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub pattern: String,
    pub text: String,
}

/// Result of [`Interpreter::match_verbose`].
#[derive(Debug, Clone)]
pub struct MatchDetails {
    /// Input after normalization.
    pub input: String,
    /// Winning pattern, or [`MATCHES_ANYTHING`].
    pub pattern: String,
    /// Topic the pattern was found in; `None` when nothing matched.
    pub topic: Option<String>,
    /// One entry per topic searched, in search order.
    pub searches: Vec<TopicSearch>,
    pub total: Duration,
}

/// Matches input against a [`CategoryStore`] and renders templates.
///
/// One interpreter serves one conversation at a time: every call takes the
/// session's [`Predicates`] explicitly, and `&mut self` keeps calls serialized.
/// Random choices come from `R`, so a seeded generator makes rendering
/// reproducible.
///
/// # Example
/// ```
/// use aimlet::{CategoryIndex, Interpreter, Options, Predicates};
///
/// let aiml = "<aiml><category><pattern>HELLO *</pattern><template>Hi there</template></category></aiml>";
/// let store = CategoryIndex::from_aiml(aiml, &Options::default()).unwrap();
/// let mut bot = Interpreter::seeded(store, 42);
///
/// assert_eq!(bot.match_pattern("hello world", "default", ""), "HELLO *");
/// let text = bot.render_by_pattern("HELLO *", "default", "", &mut Predicates::new()).unwrap();
/// assert_eq!(text, "Hi there");
/// ```
#[derive(Debug)]
pub struct Interpreter<S, R = ChaCha8Rng> {
    store: S,
    rng: R,
    options: Options,
    matcher: Matcher,
}

impl<S: CategoryStore> Interpreter<S, ChaCha8Rng> {
    /// Interpreter with default options and an entropy-seeded generator.
    pub fn new(store: S) -> Self {
        Self::with_rng(store, ChaCha8Rng::from_entropy(), Options::default())
    }

    /// Interpreter with default options and a fixed seed.
    pub fn seeded(store: S, seed: u64) -> Self {
        Self::with_rng(store, ChaCha8Rng::seed_from_u64(seed), Options::default())
    }
}

impl<S: CategoryStore, R: Rng> Interpreter<S, R> {
    pub fn with_rng(store: S, rng: R, options: Options) -> Self {
        Self { store, rng, options, matcher: Matcher::new() }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn topic_count(&self) -> usize {
        self.store.topic_count()
    }

    pub fn category_count(&self) -> usize {
        self.store.category_count()
    }

    /// First pattern accepting `input` in `topic`, else in the default topic,
    /// else [`MATCHES_ANYTHING`].
    ///
    /// `that` (the previous bot output) is accepted but does not affect the
    /// result yet.
    pub fn match_pattern(&mut self, input: &str, topic: &str, that: &str) -> String {
        self.matcher
            .find(&self.store, input, topic, that, &self.options.default_topic)
            .map(|found| found.pattern)
            .unwrap_or_else(|| MATCHES_ANYTHING.to_string())
    }

    /// [`Interpreter::match_pattern`] plus a per-topic trace.
    pub fn match_verbose(&mut self, input: &str, topic: &str, that: &str) -> MatchDetails {
        let started = Instant::now();
        let (found, searches) =
            self.matcher.find_with_metrics(&self.store, input, topic, that, &self.options.default_topic);

        let (topic, pattern) = match found {
            Some(found) => (Some(found.topic), found.pattern),
            None => (None, MATCHES_ANYTHING.to_string()),
        };
        MatchDetails {
            input: crate::engine::normalize(input),
            pattern,
            topic,
            searches,
            total: started.elapsed(),
        }
    }

    /// Render the rule stored at `(topic, pattern)`.
    ///
    /// Falls back to `(default topic, "*")`, then to the default response.
    /// `predicates` is read and updated by `<set>`.
    pub fn render_by_pattern(
        &mut self,
        pattern: &str,
        topic: &str,
        _that: &str,
        predicates: &mut Predicates,
    ) -> Result<String> {
        let store = &self.store;
        let category = match store.category(topic, pattern) {
            Some(category) => Some(category),
            None => {
                debug!(topic, pattern, "no rule, falling back to catch-all");
                store.category(&self.options.default_topic, MATCHES_ANYTHING)
            }
        };

        let mut evaluator = Evaluator { store, rng: &mut self.rng, options: &self.options, predicates };
        match category {
            Some(category) => evaluator.render_rule(Some(&category.node), 0),
            None => Ok(self.options.default_response.clone()),
        }
    }

    /// Render a `<category>` element (its `<template>` child). `None` or an
    /// empty render gives the default response.
    pub fn render_rule(&mut self, category: Option<&Element>, predicates: &mut Predicates) -> Result<String> {
        let mut evaluator = Evaluator { store: &self.store, rng: &mut self.rng, options: &self.options, predicates };
        evaluator.render_rule(category, 0)
    }

    /// Render the children of `template` and concatenate them. An empty
    /// result stays empty.
    pub fn render_template(&mut self, template: &Element, predicates: &mut Predicates) -> Result<String> {
        let mut evaluator = Evaluator { store: &self.store, rng: &mut self.rng, options: &self.options, predicates };
        evaluator.render_template(template, 0)
    }

    /// Match `input`, then render the matched rule from the topic it was
    /// found in.
    pub fn respond(&mut self, input: &str, topic: &str, that: &str, predicates: &mut Predicates) -> Result<Reply> {
        let found = self.matcher.find(&self.store, input, topic, that, &self.options.default_topic);
        let (topic, pattern) = match found {
            Some(found) => (found.topic, found.pattern),
            None => (self.options.default_topic.clone(), MATCHES_ANYTHING.to_string()),
        };

        let text = self.render_by_pattern(&pattern, &topic, that, predicates)?;
        Ok(Reply { pattern, text })
    }
}
