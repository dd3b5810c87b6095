//! Markup tree the interpreter walks.
//!
//! Rules reach the interpreter as generic element/text trees. This module
//! defines that tree, builds it from markup with `quick-xml`, and serializes
//! subtrees back to markup (random-choice candidates are taken as raw markup,
//! `<srai>` input as markup with its text left unescaped).
//!
//! The tree is read-only once built. Whitespace inside text is preserved
//! exactly as written; comments, processing instructions and declarations
//! are dropped.

use crate::{Error, Result};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::borrow::Cow;

/// A node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

/// A tagged node with ordered attributes and ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Serialize this node back to markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match self {
            Node::Text(value) => out.push_str(&partial_escape(value.as_str())),
            Node::Element(element) => element.write_markup(out),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element { name: name.into(), attributes: Vec::new(), children: Vec::new() }
    }

    /// Builder-style attribute append (keeps insertion order).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, value: impl Into<String>) -> Self {
        self.with_child(Node::Text(value.into()))
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Direct child elements named `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter_map(Node::as_element).filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().filter_map(Node::as_element).find(|e| e.name == name)
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serialize the children only (no surrounding tag).
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_markup(&mut out);
        }
        out
    }

    /// Like [`Element::inner_markup`], but text children are written as-is,
    /// without escaping. This is the form pattern text is stored in.
    pub fn inner_source(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(value) => out.push_str(value),
                Node::Element(inner) => inner.write_markup(&mut out),
            }
        }
        out
    }

    /// Serialize the element including its own tag.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_markup(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(value) => out.push_str(value),
            Node::Element(inner) => collect_text(inner, out),
        }
    }
}

/// Parse a markup document into its root element.
///
/// Text outside the root element is ignored. A document without a root
/// element, with more than one root, or with unbalanced tags is rejected.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(end) => {
                let end_name = end.name();
                let name = utf8(end_name.as_ref())?;
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::Document(format!("unexpected closing tag </{name}>")))?;
                if element.name != name {
                    return Err(Error::Document(format!("expected </{}>, found </{name}>", element.name)));
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let bytes = data.into_inner();
                    push_text(parent, Cow::Borrowed(utf8(&bytes)?));
                }
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Document(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| Error::Document("no root element".to_string()))
}

fn open_element(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Document(format!("second root element <{}>", element.name))),
    }
    Ok(())
}

// Adjacent text and CDATA runs merge into one text node.
fn push_text(parent: &mut Element, text: Cow<'_, str>) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(last)) = parent.children.last_mut() {
        last.push_str(&text);
    } else {
        parent.children.push(Node::Text(text.into_owned()));
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| Error::Document(format!("invalid utf-8 in markup: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_attributes_and_text() {
        let root = parse_document(r#"<template>Hi <set name="user">Bob</set>!</template>"#).unwrap();

        assert_eq!(root.name, "template");
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0], Node::text("Hi "));
        let set = root.child("set").unwrap();
        assert_eq!(set.attribute("name"), Some("user"));
        assert_eq!(set.text_content(), "Bob");
        assert_eq!(root.text_content(), "Hi Bob!");
    }

    #[test]
    fn preserves_whitespace_and_drops_comments() {
        let root = parse_document("<li>\n  one<!-- note -->  two\n</li>").unwrap();
        assert_eq!(root.children, vec![Node::text("\n  one  two\n")]);
    }

    #[test]
    fn cdata_becomes_text() {
        let root = parse_document("<li><![CDATA[a < b]]></li>").unwrap();
        assert_eq!(root.text_content(), "a < b");
    }

    #[test]
    fn serializes_back_to_markup() {
        let root = parse_document(r#"<random><li>A &amp; B</li><li><star/> said "hi"</li></random>"#).unwrap();
        assert_eq!(root.to_markup(), r#"<random><li>A &amp; B</li><li><star/> said "hi"</li></random>"#);

        let items: Vec<String> = root.children_named("li").map(Element::inner_markup).collect();
        assert_eq!(items, vec!["A &amp; B".to_string(), r#"<star/> said "hi""#.to_string()]);
    }

    #[test]
    fn inner_source_leaves_text_unescaped() {
        let srai = parse_document("<srai>FISH &amp; CHIPS <star/></srai>").unwrap();
        assert_eq!(srai.inner_source(), "FISH & CHIPS <star/>");
        assert_eq!(srai.inner_markup(), "FISH &amp; CHIPS <star/>");
    }

    #[test]
    fn mismatched_closing_tag_is_named_in_the_error() {
        let err = parse_document("<template><li>a</template>").unwrap_err();
        assert!(err.to_string().contains("template"), "{err}");

        let tree = parse_document("<category><pattern>HI</pattern><template>Hello</template></category>").unwrap();
        assert_eq!(tree.child("template").map(Element::text_content).as_deref(), Some("Hello"));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let element = Element::new("set").with_attribute("name", "a\"b").with_text("x");
        assert_eq!(element.to_markup(), "<set name=\"a&quot;b\">x</set>");
    }

    #[test]
    fn rejects_unbalanced_documents() {
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a>").is_err());
        assert!(parse_document("just text").is_err());
        assert!(parse_document("<a/><b/>").is_err());
    }
}
