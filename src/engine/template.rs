//! Template evaluation.
//!
//! A rule's `<template>` is rendered by walking its children in order and
//! concatenating what each one produces. Each child is classified once into a
//! [`TemplateNode`] and dispatched with an exhaustive `match`:
//!
//! ```text
//! Text      -> literal text, line breaks removed, one pass of "  " -> " "
//! template  -> render children
//! random    -> raw markup of one <li>, chosen with the injected RNG
//! srai      -> exact (default topic, inner source) lookup, render that rule
//! set       -> render children, store under the first attribute's value, ""
//! think     -> render children for their effects, ""
//! anything  -> ""
//! ```
//!
//! Predicates and the `<srai>` depth are threaded through every call; the
//! evaluator itself only lives for one render.

use crate::{CategoryStore, Element, Error, Node, Options, Predicates, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

/// The tag vocabulary understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplateNode<'n> {
    Text(&'n str),
    Template(&'n Element),
    Random(&'n Element),
    Srai(&'n Element),
    Set(&'n Element),
    Think(&'n Element),
    Unknown(&'n str),
}

impl<'n> TemplateNode<'n> {
    pub fn classify(node: &'n Node) -> Self {
        match node {
            Node::Text(value) => TemplateNode::Text(value),
            Node::Element(element) => match element.name.as_str() {
                "template" => TemplateNode::Template(element),
                "random" => TemplateNode::Random(element),
                "srai" => TemplateNode::Srai(element),
                "set" => TemplateNode::Set(element),
                "think" => TemplateNode::Think(element),
                other => TemplateNode::Unknown(other),
            },
        }
    }
}

pub(crate) struct Evaluator<'a, S: ?Sized, R: ?Sized> {
    pub store: &'a S,
    pub rng: &'a mut R,
    pub options: &'a Options,
    pub predicates: &'a mut Predicates,
}

impl<'a, S, R> Evaluator<'a, S, R>
where
    S: CategoryStore + ?Sized,
    R: Rng + ?Sized,
{
    /// Render a category element: its last `<template>` child, or the default
    /// response when there is no category or the render is empty.
    pub fn render_rule(&mut self, category: Option<&Element>, depth: usize) -> Result<String> {
        let Some(category) = category else {
            return Ok(self.options.default_response.clone());
        };

        let rendered = match category.children_named("template").last() {
            Some(template) => self.render_template(template, depth)?,
            None => String::new(),
        };
        Ok(if rendered.is_empty() { self.options.default_response.clone() } else { rendered })
    }

    /// Concatenate the output of every child of `element`.
    pub fn render_template(&mut self, element: &Element, depth: usize) -> Result<String> {
        let mut out = String::new();
        for child in &element.children {
            out.push_str(&self.dispatch(child, depth)?);
        }
        Ok(out)
    }

    fn dispatch(&mut self, node: &Node, depth: usize) -> Result<String> {
        match TemplateNode::classify(node) {
            TemplateNode::Text(value) => Ok(clean_text(value)),
            TemplateNode::Template(element) => self.render_template(element, depth),
            TemplateNode::Random(element) => self.random(element),
            TemplateNode::Srai(element) => self.srai(element, depth),
            TemplateNode::Set(element) => {
                self.set(element, depth)?;
                Ok(String::new())
            }
            TemplateNode::Think(element) => {
                self.render_template(element, depth)?;
                Ok(String::new())
            }
            TemplateNode::Unknown(name) => {
                trace!(tag = name, "unknown tag renders empty");
                Ok(String::new())
            }
        }
    }

    /// One `<li>` child, picked uniformly. The result is the item's inner
    /// markup (the `<li>` tag itself is not included) and is returned as-is,
    /// without rendering any tags it contains.
    fn random(&mut self, element: &Element) -> Result<String> {
        let candidates: Vec<&Element> = element.children_named("li").collect();
        let chosen = candidates.choose(&mut *self.rng).ok_or(Error::EmptySelection)?;
        Ok(chosen.inner_markup())
    }

    fn srai(&mut self, element: &Element, depth: usize) -> Result<String> {
        let depth = depth + 1;
        let limit = self.options.max_srai_depth;
        if depth > limit {
            return Err(Error::RecursionLimitExceeded { depth, limit });
        }

        // Same encoding as stored pattern text: unescaped.
        let input = element.inner_source();
        let input = input.trim();
        let store = self.store;
        match store.category(&self.options.default_topic, input) {
            Some(category) => {
                debug!(input, depth, "srai resolved");
                self.render_rule(Some(&category.node), depth)
            }
            None => {
                debug!(input, depth, "srai unresolved");
                Ok(self.options.error_response.clone())
            }
        }
    }

    fn set(&mut self, element: &Element, depth: usize) -> Result<()> {
        let Some((_, name)) = element.attributes.first() else {
            return Ok(());
        };
        let value = self.render_template(element, depth)?;
        trace!(name = name.as_str(), value = value.as_str(), "predicate set");
        self.predicates.set(name.clone(), value);
        Ok(())
    }
}

/// Text as it appears in output: line breaks dropped, then a single
/// non-overlapping pass replacing double spaces with one.
pub(crate) fn clean_text(value: &str) -> String {
    regex!(r"\r\n|\n\r|\r|\n").replace_all(value, "").replace("  ", " ")
}
