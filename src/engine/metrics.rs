//! Match trace.
//!
//! The matcher can optionally record what it did in each topic it searched.
//! The cheap path (`Matcher::find`) records nothing; `Matcher::find_with_metrics`
//! fills one [`TopicSearch`] per topic visited.

use std::time::Duration;

/// What happened while searching one topic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TopicSearch {
    pub topic: String,
    /// Patterns tested against the input (including the winner).
    pub tried: usize,
    /// Patterns skipped because they do not translate.
    pub skipped: usize,
    /// Winning pattern in this topic, if any.
    pub matched: Option<String>,
    pub elapsed: Duration,
}
