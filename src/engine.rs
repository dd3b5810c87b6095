//! Matching and rendering engine.
//!
//! ## How the parts work together
//!
//! ```text
//! pattern text ── translate (wildcard.rs) ──▶ MatchPredicate
//!                                                  │
//! input ── Matcher::find (matcher.rs) ─────────────┘
//!            - topic patterns, then default topic
//!            - first accepting pattern wins, else "*"
//!                                                  │
//!                                                  v
//!                         (topic, pattern) ── CategoryStore lookup
//!                                                  │
//!                                                  v
//!                         Evaluator::render_rule (template.rs)
//!                           - dispatch per TemplateNode
//!                           - <set>/<think> mutate Predicates
//!                           - <srai> re-enters the store, depth-limited
//!                                                  │
//!                                                  v
//!                                               String
//! ```
//!
//! ## Responsibilities by module
//!
//! - `wildcard.rs`: pattern text to anchored regular expression.
//! - `matcher.rs`: topic-scoped first-match search with a predicate cache.
//! - `template.rs`: the tag interpreter.
//! - `metrics.rs`: per-topic search trace for the verbose API.
//!
//! ## Adding tags
//!
//! Add a `TemplateNode` variant, teach `TemplateNode::classify` its name, and
//! the compiler points at the `match` in `Evaluator::dispatch` that needs the
//! new arm.

#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/template.rs"]
mod template;
#[path = "engine/wildcard.rs"]
mod wildcard;


pub(crate) use matcher::{Matcher, normalize};
pub use metrics::TopicSearch;
pub(crate) use template::Evaluator;
pub use wildcard::{MatchPredicate, translate};
