//! Tag schema.
//!
//! A [`Schema`] maps each tag name to a [`TagDefinition`]: the attributes it
//! accepts, an optional validator over the resolved values, whether it may
//! contain text, and the rule that renders it to HTML.

use std::collections::BTreeMap;
use std::fmt;

use deskml_parser::ast::{format_number, AttrType, AttrValue};
use once_cell::sync::Lazy;
use serde::Serialize;

/// Renders a tag from its resolved attributes and already-rendered children.
pub type RenderFn = fn(&ResolvedAttrs, &str) -> String;

/// Extra checks over resolved attributes, beyond their declared types.
pub type ValidateFn = fn(&ResolvedAttrs) -> Vec<InvalidValue>;

/// A value rejected by a tag validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    pub key: String,
    pub reason: String,
}

impl InvalidValue {
    pub fn new(key: &str, reason: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("tag name \"{0}\" must be non-empty and ASCII alphanumeric")]
    InvalidTagName(String),
    #[error("attribute \"{key}\" on <{tag}> must be non-empty and ASCII alphanumeric")]
    InvalidAttributeName { tag: String, key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrDefinition {
    pub attr_type: AttrType,
    pub required: bool,
}

#[derive(Clone)]
pub struct TagDefinition {
    pub attrs: BTreeMap<String, AttrDefinition>,
    pub validate: Option<ValidateFn>,
    pub render: RenderFn,
    pub allows_text: bool,
}

impl TagDefinition {
    /// A definition with no attributes that rejects direct text.
    pub fn new(render: RenderFn) -> Self {
        Self {
            attrs: BTreeMap::new(),
            validate: None,
            render,
            allows_text: false,
        }
    }

    pub fn attr(mut self, key: &str, attr_type: AttrType) -> Self {
        self.attrs.insert(
            key.to_string(),
            AttrDefinition {
                attr_type,
                required: false,
            },
        );
        self
    }

    pub fn required_attr(mut self, key: &str, attr_type: AttrType) -> Self {
        self.attrs.insert(
            key.to_string(),
            AttrDefinition {
                attr_type,
                required: true,
            },
        );
        self
    }

    pub fn validator(mut self, validate: ValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn with_text(mut self) -> Self {
        self.allows_text = true;
        self
    }

    pub fn render(&self, attrs: &ResolvedAttrs, children: &str) -> String {
        (self.render)(attrs, children)
    }
}

impl fmt::Debug for TagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagDefinition")
            .field("attrs", &self.attrs)
            .field("validate", &self.validate.is_some())
            .field("allows_text", &self.allows_text)
            .finish_non_exhaustive()
    }
}

/// Type-checked attribute values of one tag, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedAttrs(BTreeMap<String, AttrValue>);

impl ResolvedAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AttrValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttrValue::as_number)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(AttrValue::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for ResolvedAttrs {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

static BUILTIN: Lazy<Schema> = Lazy::new(Schema::with_builtin_tags);

/// Tag name to definition.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tags: BTreeMap<String, TagDefinition>,
}

impl Schema {
    /// An empty schema. Every tag is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared schema with the `box`, `text`, `heading` and `main` tags.
    pub fn builtin() -> &'static Schema {
        &BUILTIN
    }

    /// Add or replace a tag, returning the previous definition.
    ///
    /// Names must be ASCII alphanumeric, since the grammar cannot produce any
    /// other tag or attribute name.
    pub fn register(
        &mut self,
        name: &str,
        definition: TagDefinition,
    ) -> Result<Option<TagDefinition>, SchemaError> {
        if !is_name(name) {
            return Err(SchemaError::InvalidTagName(name.to_string()));
        }
        if let Some(key) = definition.attrs.keys().find(|key| !is_name(key)) {
            return Err(SchemaError::InvalidAttributeName {
                tag: name.to_string(),
                key: key.clone(),
            });
        }
        log::debug!("registered tag <{name}>");
        Ok(self.tags.insert(name.to_string(), definition))
    }

    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        self.tags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Definitions in tag name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagDefinition)> {
        self.tags.iter().map(|(name, def)| (name.as_str(), def))
    }

    fn with_builtin_tags() -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(
            "box".to_string(),
            TagDefinition::new(render_box)
                .attr("color", AttrType::String)
                .attr("width", AttrType::Number)
                .attr("height", AttrType::Number)
                .attr("center", AttrType::Boolean)
                .validator(validate_box),
        );
        tags.insert(
            "text".to_string(),
            TagDefinition::new(render_text)
                .attr("color", AttrType::String)
                .with_text(),
        );
        tags.insert(
            "heading".to_string(),
            TagDefinition::new(render_heading)
                .attr("level", AttrType::Number)
                .validator(validate_heading)
                .with_text(),
        );
        tags.insert("main".to_string(), TagDefinition::new(render_main));
        Self { tags }
    }
}

fn is_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

// =========================================================================
// Built-in tags
// =========================================================================

/// Escape a value for use inside a double-quoted HTML attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn open_tag(name: &str, style: &[String]) -> String {
    if style.is_empty() {
        format!("<{name}>")
    } else {
        format!("<{name} style=\"{}\">", escape_attr(&style.join("; ")))
    }
}

fn render_box(attrs: &ResolvedAttrs, children: &str) -> String {
    let mut style = Vec::new();
    if let Some(color) = attrs.get_str("color") {
        style.push(format!("background-color: {color}"));
    }
    if let Some(width) = attrs.get_number("width") {
        style.push(format!("width: {}px", format_number(width)));
    }
    if let Some(height) = attrs.get_number("height") {
        style.push(format!("height: {}px", format_number(height)));
    }
    if attrs.get_bool("center") == Some(true) {
        style.push("display: flex; justify-content: center; align-items: center".to_string());
    }
    format!("{}{children}</div>", open_tag("div", &style))
}

fn validate_box(attrs: &ResolvedAttrs) -> Vec<InvalidValue> {
    ["width", "height"]
        .into_iter()
        .filter(|key| attrs.get_number(key).is_some_and(|n| n < 0.0))
        .map(|key| InvalidValue::new(key, "must not be negative"))
        .collect()
}

fn render_text(attrs: &ResolvedAttrs, children: &str) -> String {
    let style: Vec<String> = attrs
        .get_str("color")
        .map(|color| format!("color: {color}"))
        .into_iter()
        .collect();
    format!("{}{children}</p>", open_tag("p", &style))
}

fn heading_level(attrs: &ResolvedAttrs) -> u8 {
    match attrs.get_number("level") {
        Some(level) if level.fract() == 0.0 && (1.0..=6.0).contains(&level) => level as u8,
        _ => 1,
    }
}

fn render_heading(attrs: &ResolvedAttrs, children: &str) -> String {
    let level = heading_level(attrs);
    format!("<h{level}>{children}</h{level}>")
}

fn validate_heading(attrs: &ResolvedAttrs) -> Vec<InvalidValue> {
    match attrs.get_number("level") {
        Some(level) if level.fract() != 0.0 || !(1.0..=6.0).contains(&level) => {
            vec![InvalidValue::new("level", "must be a whole number from 1 to 6")]
        }
        _ => Vec::new(),
    }
}

fn render_main(_attrs: &ResolvedAttrs, children: &str) -> String {
    format!("<main>{children}</main>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(pairs: Vec<(&str, AttrValue)>) -> ResolvedAttrs {
        pairs.into_iter().collect()
    }

    fn render(tag: &str, attrs: &ResolvedAttrs, children: &str) -> String {
        Schema::builtin().get(tag).unwrap().render(attrs, children)
    }

    // =========================================================================
    // Registry
    // =========================================================================

    #[test]
    fn test_builtin_tags() {
        let names: Vec<&str> = Schema::builtin().iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["box", "heading", "main", "text"]);
    }

    #[test]
    fn test_builtin_text_placement() {
        let schema = Schema::builtin();
        assert!(!schema.get("box").unwrap().allows_text);
        assert!(!schema.get("main").unwrap().allows_text);
        assert!(schema.get("text").unwrap().allows_text);
        assert!(schema.get("heading").unwrap().allows_text);
    }

    #[test]
    fn test_register_extends_a_copy() {
        let mut schema = Schema::builtin().clone();
        let previous = schema
            .register(
                "img",
                TagDefinition::new(|_, _| "<img>".into()).required_attr("src", AttrType::String),
            )
            .unwrap();
        assert!(previous.is_none());
        assert!(schema.contains("img"));
        assert!(!Schema::builtin().contains("img"));
        assert!(schema.get("img").unwrap().attrs["src"].required);
    }

    #[test]
    fn test_register_replaces() {
        let mut schema = Schema::builtin().clone();
        let previous = schema
            .register("main", TagDefinition::new(|_, c| format!("<section>{c}</section>")))
            .unwrap();
        assert!(previous.is_some());
        assert_eq!(
            schema.get("main").unwrap().render(&ResolvedAttrs::new(), "x"),
            "<section>x</section>"
        );
    }

    #[test]
    fn test_register_rejects_unparseable_names() {
        let mut schema = Schema::new();
        let err = schema
            .register("my-tag", TagDefinition::new(render_main))
            .unwrap_err();
        assert_eq!(err, SchemaError::InvalidTagName("my-tag".into()));
        let err = schema
            .register("ok", TagDefinition::new(render_main).attr("", AttrType::String))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidAttributeName { .. }));
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn test_box_style() {
        let attrs = attrs(vec![
            ("color", AttrValue::String("red".into())),
            ("width", AttrValue::Number(100.0)),
            ("height", AttrValue::Number(20.5)),
        ]);
        assert_eq!(
            render("box", &attrs, "x"),
            "<div style=\"background-color: red; width: 100px; height: 20.5px\">x</div>"
        );
    }

    #[test]
    fn test_box_center() {
        let attrs = attrs(vec![("center", AttrValue::Boolean(true))]);
        assert_eq!(
            render("box", &attrs, ""),
            "<div style=\"display: flex; justify-content: center; align-items: center\"></div>"
        );
    }

    #[test]
    fn test_box_without_attrs_has_no_style() {
        assert_eq!(render("box", &ResolvedAttrs::new(), ""), "<div></div>");
    }

    #[test]
    fn test_style_values_are_escaped() {
        let attrs = attrs(vec![("color", AttrValue::String("red\" onclick=\"x".into()))]);
        assert_eq!(
            render("text", &attrs, "hi"),
            "<p style=\"color: red&quot; onclick=&quot;x\">hi</p>"
        );
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(render("heading", &ResolvedAttrs::new(), "T"), "<h1>T</h1>");
        let attrs = attrs(vec![("level", AttrValue::Number(3.0))]);
        assert_eq!(render("heading", &attrs, "T"), "<h3>T</h3>");
    }

    // =========================================================================
    // Validators
    // =========================================================================

    #[test]
    fn test_box_rejects_negative_dimensions() {
        let attrs = attrs(vec![
            ("width", AttrValue::Number(-1.0)),
            ("height", AttrValue::Number(4.0)),
        ]);
        assert_eq!(
            validate_box(&attrs),
            vec![InvalidValue::new("width", "must not be negative")]
        );
    }

    #[test]
    fn test_heading_level_range() {
        for bad in [0.0, 7.0, 2.5] {
            let attrs = attrs(vec![("level", AttrValue::Number(bad))]);
            assert_eq!(validate_heading(&attrs).len(), 1, "level {bad}");
        }
        let attrs = attrs(vec![("level", AttrValue::Number(6.0))]);
        assert!(validate_heading(&attrs).is_empty());
    }
}
