use relay_repl_parser::parse_document;
use relay_repl_playground::defaults::{DEFAULT_OPERATION, DEFAULT_SCHEMA};
use relay_repl_playground::{CompilationPipeline, PlaygroundConfig, Session as PlaygroundSession};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn compile_text(schema: &str, operation: &str, disabled: Vec<String>) -> Result<String, String> {
    let config = PlaygroundConfig {
        disabled_transforms: disabled,
        ..Default::default()
    };
    let selection = config.selection().map_err(|e| e.to_string())?;
    CompilationPipeline::new()
        .run(schema, operation, &selection)
        .map(|compiled| compiled.printed_text)
        .map_err(|e| e.to_string())
}

fn parse_text(source: &str) -> Result<String, String> {
    let document = parse_document(source).map_err(|e| format!("Parse error: {}", e))?;
    serde_json::to_string(&document).map_err(|e| format!("Serialization error: {}", e))
}

/// Compile once with the named transforms switched off
#[wasm_bindgen]
pub fn compile(schema: &str, operation: &str, disabled: Vec<String>) -> Result<String, JsValue> {
    compile_text(schema, operation, disabled).map_err(js_error)
}

/// Parse an operation document and return the AST as JSON
#[wasm_bindgen(js_name = parse)]
pub fn parse_js(source: &str) -> Result<String, JsValue> {
    parse_text(source).map_err(js_error)
}

#[wasm_bindgen(js_name = defaultSchema)]
pub fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

#[wasm_bindgen(js_name = defaultOperation)]
pub fn default_operation() -> String {
    DEFAULT_OPERATION.to_string()
}

/// Editor session. The page owns the debounce timer and calls `recompile`
/// when it fires.
#[wasm_bindgen]
pub struct Session {
    inner: PlaygroundSession,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Session {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Session {
        Session {
            inner: PlaygroundSession::default(),
        }
    }

    /// Returns the edit's revision
    #[wasm_bindgen(js_name = setSchema)]
    pub fn set_schema(&mut self, text: &str) -> f64 {
        self.inner.set_schema_text(text).get() as f64
    }

    #[wasm_bindgen(js_name = setOperation)]
    pub fn set_operation(&mut self, text: &str) -> f64 {
        self.inner.set_operation_text(text).get() as f64
    }

    /// Returns whether the transform is now enabled
    #[wasm_bindgen(js_name = toggleTransform)]
    pub fn toggle_transform(&mut self, name: &str) -> Result<bool, JsValue> {
        self.inner.toggle_transform(name).map_err(js_error)
    }

    /// `[{name, title, description, enabled}]` in pipeline order
    pub fn transforms(&self) -> String {
        serde_json::to_string(self.inner.selection()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Compile the current buffers; returns whether the output changed
    pub fn recompile(&mut self) -> bool {
        self.inner.recompile()
    }

    #[wasm_bindgen(getter)]
    pub fn output(&self) -> String {
        self.inner.printed_text()
    }

    /// Message of the last failed compile, if the last compile failed
    #[wasm_bindgen(getter, js_name = lastError)]
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error().map(|e| e.to_string())
    }

    /// Diagnostics for the operation as JSON
    pub fn lint(&self) -> String {
        serde_json::to_string(&self.inner.lint()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Field completions at a byte offset of the operation, as JSON
    #[wasm_bindgen(js_name = completeAt)]
    pub fn complete_at(&self, offset: usize) -> String {
        serde_json::to_string(&self.inner.complete_at(offset)).unwrap_or_else(|_| "[]".to_string())
    }

    /// `{runs, applied, discarded, failed}` as JSON
    pub fn stats(&self) -> String {
        serde_json::to_string(&self.inner.stats()).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_defaults() {
        let output = compile_text(DEFAULT_SCHEMA, DEFAULT_OPERATION, Vec::new()).unwrap();
        assert!(output.starts_with("query UserProfile {"));
        assert!(!output.contains("..."));
    }

    #[test]
    fn test_compile_with_disabled_transform() {
        let output = compile_text(
            DEFAULT_SCHEMA,
            DEFAULT_OPERATION,
            vec!["inline_fragments".to_string()],
        )
        .unwrap();
        assert!(output.contains("...CharacterData_"));

        let err = compile_text(DEFAULT_SCHEMA, DEFAULT_OPERATION, vec!["nope".to_string()])
            .unwrap_err();
        assert!(err.contains("nope"));
    }

    #[test]
    fn test_parse_returns_json() {
        let json = parse_text("query Q { hero { id } }").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["definitions"].is_array());
        assert!(parse_text("query {").is_err());
    }

    #[test]
    fn test_session_round_trip() {
        let mut session = Session::new();
        assert!(session.recompile());
        let original = session.output();

        assert!(session.toggle_transform("flatten").is_ok());
        session.recompile();
        assert!(session.transforms().contains("\"enabled\":false"));

        session.set_operation("query {");
        assert!(!session.recompile());
        assert!(session.last_error().is_some());
        assert_ne!(session.output(), "");

        session.set_operation(DEFAULT_OPERATION);
        session.toggle_transform("flatten").unwrap();
        assert!(session.recompile());
        assert_eq!(session.output(), original);
        assert!(session.stats().contains("\"failed\":1"));
    }
}
