//! Category storage.
//!
//! The interpreter only needs two questions answered: "which patterns exist in
//! this topic, in a stable order?" and "which category sits at this exact
//! (topic, pattern)?". [`CategoryStore`] is that seam; [`CategoryIndex`] is
//! the in-memory implementation used by the loader and the tests.
//!
//! Enumeration order is insertion order. Matching is first-match-wins, so the
//! order categories are loaded in is the order they are tried.

use crate::{Element, Error, Options, Result, WildcardSet, parse_document};
use std::collections::HashMap;
use tracing::debug;

/// A stored dialogue rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub topic: String,
    pub pattern: String,
    pub that: String,
    /// The whole `<category>` element; the response subtree is its
    /// `<template>` child.
    pub node: Element,
}

impl Category {
    pub fn new(topic: impl Into<String>, pattern: impl Into<String>, that: impl Into<String>, node: Element) -> Self {
        Category { topic: topic.into(), pattern: pattern.into(), that: that.into(), node }
    }

    /// Build a category around a bare `<template>` element.
    pub fn with_template(topic: impl Into<String>, pattern: impl Into<String>, template: Element) -> Self {
        Category::new(topic, pattern, "", Element::new("category").with_child(template))
    }

    /// The response subtree. When several are present the last one wins, as
    /// in rendering.
    pub fn template(&self) -> Option<&Element> {
        self.node.children_named("template").last()
    }

    pub fn wildcards(&self) -> WildcardSet {
        WildcardSet::of(&self.pattern)
    }
}

/// Lookup surface the interpreter consumes.
pub trait CategoryStore {
    /// Patterns of `topic`, in a stable order. Unknown topics yield nothing.
    fn patterns(&self, topic: &str) -> Vec<&str>;

    /// Exact `(topic, pattern)` lookup.
    fn category(&self, topic: &str, pattern: &str) -> Option<&Category>;

    fn topic_count(&self) -> usize;

    fn category_count(&self) -> usize;
}

impl<S: CategoryStore + ?Sized> CategoryStore for &S {
    fn patterns(&self, topic: &str) -> Vec<&str> {
        (**self).patterns(topic)
    }

    fn category(&self, topic: &str, pattern: &str) -> Option<&Category> {
        (**self).category(topic, pattern)
    }

    fn topic_count(&self) -> usize {
        (**self).topic_count()
    }

    fn category_count(&self) -> usize {
        (**self).category_count()
    }
}

#[derive(Debug, Default, Clone)]
struct TopicBucket {
    order: Vec<String>,
    by_pattern: HashMap<String, Category>,
}

/// In-memory [`CategoryStore`] keyed by topic, then pattern.
#[derive(Debug, Default, Clone)]
pub struct CategoryIndex {
    topics: HashMap<String, TopicBucket>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category. An existing `(topic, pattern)` is replaced in place
    /// and keeps its enumeration position.
    pub fn insert(&mut self, category: Category) {
        let bucket = self.topics.entry(category.topic.clone()).or_default();
        if !bucket.by_pattern.contains_key(&category.pattern) {
            bucket.order.push(category.pattern.clone());
        }
        bucket.by_pattern.insert(category.pattern.clone(), category);
    }

    /// Topic names, sorted.
    pub fn topics(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.topics.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse an AIML document and index its categories.
    ///
    /// ```text
    /// <aiml>
    ///   <category>...</category>            -> options.default_topic
    ///   <topic name="T">
    ///     <category>...</category>          -> "T"
    ///   </topic>
    ///   <category><topic>U</topic>...</category>  -> "U"
    /// </aiml>
    /// ```
    pub fn from_aiml(xml: &str, options: &Options) -> Result<Self> {
        let mut index = CategoryIndex::new();
        index.load_aiml(xml, options)?;
        Ok(index)
    }

    /// Parse an AIML document and add its categories to this index.
    /// Returns the number of categories read.
    pub fn load_aiml(&mut self, xml: &str, options: &Options) -> Result<usize> {
        let root = parse_document(xml)?;
        if root.name != "aiml" {
            return Err(Error::Document(format!("expected <aiml> root, found <{}>", root.name)));
        }

        let mut loaded = 0;
        for element in root.children.iter().filter_map(crate::Node::as_element) {
            match element.name.as_str() {
                "category" => {
                    self.insert(read_category(element, &options.default_topic)?);
                    loaded += 1;
                }
                "topic" => {
                    let name = element.attribute("name").ok_or_else(|| {
                        Error::Document("<topic> without a name attribute".to_string())
                    })?;
                    for category in element.children_named("category") {
                        self.insert(read_category(category, name)?);
                        loaded += 1;
                    }
                }
                _ => {}
            }
        }

        debug!(loaded, topics = self.topic_count(), categories = self.category_count(), "aiml loaded");
        Ok(loaded)
    }
}

fn read_category(element: &Element, topic: &str) -> Result<Category> {
    let pattern = element
        .child("pattern")
        .map(|p| p.text_content().trim().to_string())
        .ok_or_else(|| Error::MalformedCategory(format!("no <pattern> in {}", element.to_markup())))?;
    if element.child("template").is_none() {
        return Err(Error::MalformedCategory(format!("no <template> for pattern '{pattern}'")));
    }

    let that = element.child("that").map(|t| t.text_content().trim().to_string()).unwrap_or_default();
    let topic = match element.child("topic") {
        Some(own) => own.text_content().trim().to_string(),
        None => topic.to_string(),
    };

    Ok(Category { topic, pattern, that, node: element.clone() })
}

impl CategoryStore for CategoryIndex {
    fn patterns(&self, topic: &str) -> Vec<&str> {
        self.topics.get(topic).map(|b| b.order.iter().map(String::as_str).collect()).unwrap_or_default()
    }

    fn category(&self, topic: &str, pattern: &str) -> Option<&Category> {
        self.topics.get(topic)?.by_pattern.get(pattern)
    }

    fn topic_count(&self) -> usize {
        self.topics.len()
    }

    fn category_count(&self) -> usize {
        self.topics.values().map(|b| b.by_pattern.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<aiml version="2.0">
  <category>
    <pattern> HELLO * </pattern>
    <template>Hi there</template>
  </category>
  <topic name="FOOD">
    <category>
      <pattern>I LIKE *</pattern>
      <that>WHAT DO YOU EAT</that>
      <template>Tasty.</template>
    </category>
  </topic>
  <category>
    <pattern>BYE</pattern>
    <topic>FAREWELL</topic>
    <template>See you.</template>
  </category>
</aiml>"#;

    #[test]
    fn loads_categories_into_topics() {
        let index = CategoryIndex::from_aiml(AIML, &Options::default()).unwrap();

        assert_eq!(index.topic_count(), 3);
        assert_eq!(index.category_count(), 3);
        assert_eq!(index.topics(), vec!["FAREWELL", "FOOD", "default"]);

        let hello = index.category("default", "HELLO *").unwrap();
        assert_eq!(hello.that, "");
        assert_eq!(hello.template().unwrap().text_content(), "Hi there");
        assert_eq!(hello.wildcards(), WildcardSet::ONE_OR_MORE);

        let food = index.category("FOOD", "I LIKE *").unwrap();
        assert_eq!(food.that, "WHAT DO YOU EAT");
        assert!(index.category("FAREWELL", "BYE").is_some());
    }

    #[test]
    fn enumeration_follows_insertion_and_replacement_keeps_position() {
        let mut index = CategoryIndex::new();
        for pattern in ["B", "A", "C"] {
            index.insert(Category::with_template("t", pattern, Element::new("template").with_text(pattern)));
        }
        index.insert(Category::with_template("t", "A", Element::new("template").with_text("again")));

        assert_eq!(index.patterns("t"), vec!["B", "A", "C"]);
        assert_eq!(index.category_count(), 3);
        assert_eq!(index.category("t", "A").unwrap().template().unwrap().text_content(), "again");
        assert!(index.patterns("missing").is_empty());
    }

    #[test]
    fn rejects_categories_without_pattern_or_template() {
        let options = Options::default();
        let no_template = "<aiml><category><pattern>X</pattern></category></aiml>";
        assert!(matches!(CategoryIndex::from_aiml(no_template, &options), Err(Error::MalformedCategory(_))));

        let no_pattern = "<aiml><category><template>x</template></category></aiml>";
        assert!(matches!(CategoryIndex::from_aiml(no_pattern, &options), Err(Error::MalformedCategory(_))));

        assert!(matches!(CategoryIndex::from_aiml("<rules/>", &options), Err(Error::Document(_))));
    }
}
