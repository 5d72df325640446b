//! Hermetic JavaScript evaluation of packed player scripts

use crate::core::unpacker::Evaluator;
use crate::error::DecodeError;
use deno_core::{FastString, JsRuntime, RuntimeOptions};
use tracing::debug;

/// Evaluator backed by a throwaway V8 isolate.
///
/// The runtime carries no extensions, so scripts see only the ECMAScript
/// builtins plus the stubs installed by [`wrap_packed`]. A new isolate is
/// created for every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxEvaluator;

impl SandboxEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for SandboxEvaluator {
    fn evaluate(&self, packed: &str) -> Result<Option<String>, DecodeError> {
        debug!("Evaluating packed script in sandbox ({} chars)", packed.len());

        let mut runtime = JsRuntime::new(RuntimeOptions::default());

        let code = FastString::from(wrap_packed(packed));
        let result = runtime
            .execute_script("<packed>", code)
            .map_err(|e| DecodeError::Evaluation(format!("{}", e)))?;

        let scope = &mut runtime.handle_scope();
        let value = result.open(scope);
        if value.is_null_or_undefined() {
            return Ok(None);
        }

        Ok(Some(value.to_rust_string_lossy(scope)))
    }
}

/// Embed packed code in a scope where `eval`, `window` and `document` are stubs.
///
/// The `eval` stub records its argument instead of running it. The script
/// evaluates to the last recorded argument as a string, or `null` when the stub
/// was never called. `Deno`, `globalThis` and `self` are shadowed so the packed
/// code cannot reach the runtime's own namespace.
pub fn wrap_packed(packed: &str) -> String {
    format!(
        r#"(function () {{
  var __vscrape_capture = {{ called: false, value: undefined }};
  var __vscrape_window = {{}};
  var __vscrape_env = {{
    eval: function (code) {{
      __vscrape_capture.called = true;
      __vscrape_capture.value = code;
    }},
    window: __vscrape_window,
    document: {{}},
    self: __vscrape_window,
    globalThis: __vscrape_window,
    Deno: undefined
  }};
  with (__vscrape_env) {{
{packed}
  }}
  return __vscrape_capture.called ? String(__vscrape_capture.value) : null;
}})();"#
    )
}
