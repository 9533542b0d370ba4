//! Schema-driven refinement.
//!
//! Turns the raw syntax tree into a tree whose attributes are type-checked
//! against the schema. Refinement never fails: every problem becomes a
//! transformer-phase [`MlError`] and the walk carries on, so one pass reports
//! everything wrong with a document.

use deskml_combinator::{Located, SourceLocation};
use deskml_parser::ast::{MlNode, TagNode, TextNode};
use deskml_parser::{ErrorCode, MlError};

use crate::schema::{ResolvedAttrs, Schema, TagDefinition};

#[derive(Debug, Clone, PartialEq)]
pub enum RefinedNode {
    Tag(RefinedTagNode),
    Text(TextNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinedTagNode {
    /// Schema entry the renderer looks up.
    pub refined_type: String,
    pub tag: Located<String>,
    /// Only declared, type-correct attributes.
    pub attrs: ResolvedAttrs,
    pub children: Vec<Located<RefinedNode>>,
}

/// Where a node sits, for deciding whether text may appear there.
#[derive(Clone, Copy)]
enum Parent<'a> {
    Root,
    Known(&'a str, &'a TagDefinition),
    Unknown,
}

impl Parent<'_> {
    /// `None` when text is allowed, otherwise how to name the parent.
    fn text_rejected_by(self) -> Option<String> {
        match self {
            Parent::Root => Some("the document root".to_string()),
            Parent::Known(name, definition) if !definition.allows_text => {
                Some(format!("<{name}>"))
            }
            Parent::Known(..) | Parent::Unknown => None,
        }
    }
}

/// Refine `nodes` against `schema`, collecting diagnostics in document order.
pub fn refine(
    schema: &Schema,
    nodes: &[Located<MlNode>],
) -> (Vec<Located<RefinedNode>>, Vec<MlError>) {
    let mut errors = Vec::new();
    let refined = refine_nodes(schema, nodes, Parent::Root, &mut errors);
    log::debug!("refinement produced {} diagnostics", errors.len());
    (refined, errors)
}

fn refine_nodes(
    schema: &Schema,
    nodes: &[Located<MlNode>],
    parent: Parent<'_>,
    errors: &mut Vec<MlError>,
) -> Vec<Located<RefinedNode>> {
    let mut refined = Vec::with_capacity(nodes.len());
    for node in nodes {
        match &node.value {
            // Whitespace between tags is formatting, never content.
            MlNode::Text(text) if text.content.trim().is_empty() => {}
            MlNode::Text(text) => match parent.text_rejected_by() {
                Some(parent) => {
                    errors.push(
                        MlError::new(ErrorCode::TextNotAllowed, node.loc).with("parent", parent),
                    );
                }
                None => refined.push(Located::new(RefinedNode::Text(text.clone()), node.loc)),
            },
            MlNode::Tag(tag) => {
                let tag = refine_tag(schema, tag, errors);
                refined.push(Located::new(RefinedNode::Tag(tag), node.loc));
            }
        }
    }
    refined
}

fn refine_tag(schema: &Schema, tag: &TagNode, errors: &mut Vec<MlError>) -> RefinedTagNode {
    let name = tag.tag.value.as_str();
    let definition = schema.get(name);

    let (attrs, parent) = match definition {
        Some(definition) => (
            resolve_attrs(name, definition, tag, errors),
            Parent::Known(name, definition),
        ),
        None => {
            errors.push(MlError::new(ErrorCode::UnknownTag, tag.tag.loc).with("tag", name));
            (ResolvedAttrs::new(), Parent::Unknown)
        }
    };

    // Children are refined even under an invalid parent so their own
    // problems are still reported.
    let children = refine_nodes(schema, &tag.children, parent, errors);

    RefinedTagNode {
        refined_type: name.to_string(),
        tag: tag.tag.clone(),
        attrs,
        children,
    }
}

fn resolve_attrs(
    name: &str,
    definition: &TagDefinition,
    tag: &TagNode,
    errors: &mut Vec<MlError>,
) -> ResolvedAttrs {
    let mut attrs = ResolvedAttrs::new();

    for attribute in &tag.attributes {
        let key = attribute.key.value.as_str();
        let Some(declared) = definition.attrs.get(key) else {
            errors.push(
                MlError::new(ErrorCode::UnexpectedAttribute, attribute.key.loc)
                    .with("key", key)
                    .with("tag", name),
            );
            continue;
        };

        let actual = attribute.attr.value.attr_type();
        if actual != declared.attr_type {
            errors.push(
                MlError::new(ErrorCode::AttributeTypeMismatch, attribute.attr.loc)
                    .with("key", key)
                    .with("expected", declared.attr_type)
                    .with("actual", actual),
            );
            continue;
        }

        attrs.insert(key, attribute.attr.value.clone());
    }

    for (key, declared) in &definition.attrs {
        let seen = tag.attributes.iter().any(|a| a.key.value == *key);
        if declared.required && !seen {
            errors.push(
                MlError::new(ErrorCode::MissingRequiredAttribute, tag.tag.loc)
                    .with("key", key)
                    .with("tag", name),
            );
        }
    }

    if let Some(validate) = definition.validate {
        for invalid in validate(&attrs) {
            let loc = value_loc(tag, &invalid.key).unwrap_or(tag.tag.loc);
            errors.push(
                MlError::new(ErrorCode::InvalidAttributeValue, loc)
                    .with("key", &invalid.key)
                    .with("reason", &invalid.reason),
            );
        }
    }

    attrs
}

/// Span of the value that won for `key` (the last one written).
fn value_loc(tag: &TagNode, key: &str) -> Option<SourceLocation> {
    tag.attributes
        .iter()
        .rev()
        .find(|a| a.key.value == key)
        .map(|a| a.attr.loc)
}
