//! HTML generator.
//!
//! Walks the refined tree bottom-up: children are rendered first and handed
//! to the tag's render rule as a single string. Text is emitted verbatim.

use deskml_combinator::Located;

use crate::refine::RefinedNode;
use crate::schema::{escape_attr, Schema};

/// Render refined nodes to an HTML fragment.
pub fn generate(schema: &Schema, nodes: &[Located<RefinedNode>]) -> String {
    let mut html = String::new();
    for node in nodes {
        generate_node(schema, &node.value, &mut html);
    }
    html
}

fn generate_node(schema: &Schema, node: &RefinedNode, out: &mut String) {
    match node {
        RefinedNode::Text(text) => out.push_str(&text.content),
        RefinedNode::Tag(tag) => {
            // Unknown tags were already reported during refinement.
            let Some(definition) = schema.get(&tag.refined_type) else {
                log::trace!("skipping unknown tag <{}>", tag.refined_type);
                return;
            };
            let children = generate(schema, &tag.children);
            out.push_str(&definition.render(&tag.attrs, &children));
        }
    }
}

/// Wrap a fragment in a complete HTML page.
pub fn standalone_page(title: &str, body: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"UTF-8\">\n");
    html.push_str(&format!("  <title>{}</title>\n", escape_attr(title)));
    html.push_str("</head>\n<body>\n");
    html.push_str(body);
    if !body.ends_with('\n') {
        html.push('\n');
    }
    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::refine;
    use crate::schema::TagDefinition;
    use pretty_assertions::assert_eq;

    fn gen(source: &str) -> String {
        let doc = deskml_parser::parse(source).unwrap();
        let (nodes, _) = refine(Schema::builtin(), &doc.nodes);
        generate(Schema::builtin(), &nodes)
    }

    #[test]
    fn test_nested_tags() {
        assert_eq!(
            gen("<main><box><text>Hello World</text></box></main>"),
            "<main><div><p>Hello World</p></div></main>"
        );
    }

    #[test]
    fn test_siblings_concatenate() {
        assert_eq!(
            gen("<heading level=2>A</heading><text>B</text>"),
            "<h2>A</h2><p>B</p>"
        );
    }

    #[test]
    fn test_text_is_verbatim() {
        assert_eq!(gen("<text>a & b</text>"), "<p>a & b</p>");
    }

    #[test]
    fn test_unknown_tag_renders_nothing() {
        assert_eq!(gen("<main><asdf><text>x</text></asdf></main>"), "<main></main>");
    }

    #[test]
    fn test_custom_render_rule() {
        let mut schema = Schema::new();
        schema
            .register("card", TagDefinition::new(|_, c| format!("<article>{c}</article>")))
            .unwrap();
        let doc = deskml_parser::parse("<card><card></card></card>").unwrap();
        let (nodes, errors) = refine(&schema, &doc.nodes);
        assert!(errors.is_empty());
        assert_eq!(generate(&schema, &nodes), "<article><article></article></article>");
    }

    #[test]
    fn test_standalone_page() {
        let page = standalone_page("demo", "<main></main>");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>demo</title>"));
        assert!(page.contains("<body>\n<main></main>\n</body>"));
    }
}
