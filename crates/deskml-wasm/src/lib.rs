//! WASM bindings for the DeskML compiler.
//!
//! Exposes `processDocument()`, `formatError()` and `utf16Offset()` to
//! JavaScript via wasm-bindgen. Diagnostics cross the boundary as plain
//! objects `{ phase, code, params?, loc: { start, end } }`.
//!
//! Locations are UTF-8 byte offsets. Editors that index strings in UTF-16
//! code units convert them with `utf16Offset(source, offset)`.

use deskml_parser::MlError;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

/// Compile DeskML source.
///
/// Returns `{ html: string | null, errors: MlError[] }`. `html` is `null` when
/// the document has a syntax error. Never throws for bad input.
#[wasm_bindgen(js_name = processDocument)]
pub fn process_document(source: &str) -> Result<JsValue, JsError> {
    let output = deskml_codegen::process_document(source);

    let html: JsValue = match output.html {
        Some(html) => html.into(),
        None => JsValue::NULL,
    };
    let errors = output
        .errors
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("Failed to convert diagnostics: {e}")))?;

    let js_obj = js_sys::Object::new();
    js_sys::Reflect::set(&js_obj, &"html".into(), &html)
        .map_err(|_| JsError::new("Failed to set html property"))?;
    js_sys::Reflect::set(&js_obj, &"errors".into(), &errors)
        .map_err(|_| JsError::new("Failed to set errors property"))?;

    Ok(js_obj.into())
}

/// Render a diagnostic object returned by `processDocument` against its source.
///
/// Throws if `error` is not a diagnostic.
#[wasm_bindgen(js_name = formatError)]
pub fn format_error(source: &str, error: JsValue) -> Result<String, JsError> {
    let error: MlError = serde_wasm_bindgen::from_value(error)
        .map_err(|e| JsError::new(&format!("Not a DeskML diagnostic: {e}")))?;
    Ok(deskml_parser::format_error(source, &error))
}

/// Convert a byte offset from a diagnostic into a UTF-16 index into `source`.
#[wasm_bindgen(js_name = utf16Offset)]
pub fn utf16_offset(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source
        .char_indices()
        .take_while(|(i, _)| *i < end)
        .map(|(_, c)| c.len_utf16())
        .sum()
}

/// Get the compiler version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskml_parser::ErrorCode;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Native tests (non-WASM): the pipeline behind the bindings
    // =========================================================================

    fn native_process(source: &str) -> deskml_codegen::CompilerOutput {
        deskml_codegen::process_document(source)
    }

    #[test]
    fn test_empty_document() {
        let output = native_process("");
        assert_eq!(output.html.as_deref(), Some(""));
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_preview_despite_semantic_errors() {
        let output = native_process("<box color=1><text>still here</text></box>");
        assert_eq!(output.errors[0].code, ErrorCode::AttributeTypeMismatch);
        assert!(output.html.unwrap().contains("still here"));
    }

    #[test]
    fn test_syntax_error_has_no_html() {
        let output = native_process("<main>");
        assert_eq!(output.html, None);
        assert_eq!(output.errors[0].code, ErrorCode::UnclosedTag);
    }

    #[test]
    fn test_multiple_compiles() {
        let out1 = native_process("<asdf></asdf>");
        let out2 = native_process("<main></main>");
        assert_eq!(out1.errors.len(), 1);
        assert!(out2.errors.is_empty());
    }

    // =========================================================================
    // Offsets and version
    // =========================================================================

    #[test]
    fn test_utf16_offset_ascii() {
        assert_eq!(utf16_offset("<box></box>", 5), 5);
    }

    #[test]
    fn test_utf16_offset_multibyte() {
        // 'é' is two bytes and one code unit, '😀' four bytes and two code units
        let source = "é😀<asdf>";
        assert_eq!(utf16_offset(source, 6), 3);
        assert_eq!(utf16_offset(source, 7), 4);
        assert_eq!(utf16_offset(source, 100), 9);
    }

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
        assert!(v.contains('.'));
    }
}
