use thiserror::Error;

/// Errors surfaced by loading and rendering.
///
/// An input that matches no rule is not an error: the interpreter answers
/// with the configured default (or error) response instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A `<random>` element had no `<li>` candidates.
    #[error("random choice has no <li> candidates")]
    EmptySelection,

    /// `<srai>` re-entry went deeper than `Options::max_srai_depth`.
    #[error("srai recursion depth {depth} exceeds limit {limit}")]
    RecursionLimitExceeded { depth: usize, limit: usize },

    /// A pattern did not compile once its wildcards were translated.
    #[error("pattern '{pattern}' does not translate to a valid expression")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed document: {0}")]
    Document(String),

    #[error("malformed category: {0}")]
    MalformedCategory(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.into())
    }
}
