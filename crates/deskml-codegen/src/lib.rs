//! DeskML Code Generator
//!
//! Runs the whole pipeline: parse, refine against a schema, render HTML.
//!
//! ```text
//! source → Grammar::parse() → refine() → html::generate() → CompilerOutput { html, errors }
//! ```
//!
//! A syntax error stops the pipeline and yields no HTML. Schema errors are
//! collected and rendering still happens, so a host can preview a document
//! while its diagnostics are shown next to it.
//!
//! ```
//! let output = deskml_codegen::process_document("<box color=\"red\"><text>Hi</text></box>");
//! assert!(output.errors.is_empty());
//! assert_eq!(
//!     output.html.as_deref(),
//!     Some("<div style=\"background-color: red\"><p>Hi</p></div>")
//! );
//! ```

pub mod html;
pub mod refine;
pub mod schema;

use deskml_parser::{Grammar, MlError, DEFAULT_MAX_DEPTH};
use serde::Serialize;

pub use refine::{refine, RefinedNode, RefinedTagNode};
pub use schema::{
    AttrDefinition, InvalidValue, RenderFn, ResolvedAttrs, Schema, SchemaError, TagDefinition,
    ValidateFn,
};

/// Result of compiling one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompilerOutput {
    /// `None` when the document has a syntax error.
    pub html: Option<String>,
    pub errors: Vec<MlError>,
}

impl CompilerOutput {
    pub fn has_syntax_error(&self) -> bool {
        self.html.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Deepest tag nesting the parser accepts.
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A configured pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'s> {
    schema: &'s Schema,
    options: CompileOptions,
}

impl Default for Compiler<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler<'static> {
    /// Built-in schema, default options.
    pub fn new() -> Self {
        Self::with_schema(Schema::builtin())
    }
}

impl<'s> Compiler<'s> {
    pub fn with_schema(schema: &'s Schema) -> Self {
        Self {
            schema,
            options: CompileOptions::default(),
        }
    }

    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Compile `input`. Never fails; every problem is in `errors`.
    pub fn process(&self, input: &str) -> CompilerOutput {
        let grammar = Grammar::with_max_depth(self.options.max_depth);
        let doc = match grammar.parse(input) {
            Ok(doc) => doc,
            Err(error) => {
                return CompilerOutput {
                    html: None,
                    errors: vec![error],
                }
            }
        };

        let (nodes, errors) = refine(self.schema, &doc.nodes);
        let html = html::generate(self.schema, &nodes);
        log::debug!(
            "compiled {} bytes into {} bytes of html with {} diagnostics",
            input.len(),
            html.len(),
            errors.len()
        );

        CompilerOutput {
            html: Some(html),
            errors,
        }
    }
}

/// Compile `input` with the built-in schema and default options.
pub fn process_document(input: &str) -> CompilerOutput {
    Compiler::new().process(input)
}
