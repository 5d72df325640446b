//! Packed script deobfuscation

use crate::core::layout;
use crate::core::metadata::PlainSource;
use crate::error::DecodeError;
use crate::platform::{PackerEvaluator, SandboxEvaluator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Marker that opens a P.A.C.K.E.R. bootstrap routine
pub const PACKER_MARKER: &str = "eval(function(p,a,c,k,e,";

/// Runs a packed script and captures the payload it hands to `eval`.
///
/// Implementations must not share state between calls: each evaluation gets
/// its own context.
pub trait Evaluator {
    /// Returns the last string passed to the eval hook, or `None` if the script
    /// never called it.
    fn evaluate(&self, packed: &str) -> Result<Option<String>, DecodeError>;
}

/// Evaluation engine selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Embedded V8 isolate with stubbed globals
    #[default]
    Sandbox,
    /// Native decoder for the P.A.C.K.E.R. argument grammar
    Native,
}

impl Engine {
    /// Get an evaluator for this engine
    pub fn evaluator(&self) -> Box<dyn Evaluator> {
        match self {
            Engine::Sandbox => Box::new(SandboxEvaluator::new()),
            Engine::Native => Box::new(PackerEvaluator::new()),
        }
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" | "v8" | "js" => Ok(Engine::Sandbox),
            "native" | "packer" => Ok(Engine::Native),
            other => Err(format!("unknown engine: {}", other)),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Sandbox => f.write_str("sandbox"),
            Engine::Native => f.write_str("native"),
        }
    }
}

/// Unpack a packed script with the default sandbox engine
pub fn unpack(packed: &str) -> Result<PlainSource, DecodeError> {
    unpack_with(&SandboxEvaluator::new(), packed)
}

/// Unpack a packed script with the given evaluator.
///
/// When the script never calls `eval`, the packed text itself is laid out.
pub fn unpack_with(evaluator: &dyn Evaluator, packed: &str) -> Result<PlainSource, DecodeError> {
    let payload = match evaluator.evaluate(packed)? {
        Some(payload) => {
            debug!("Captured payload ({} chars)", payload.len());
            payload
        }
        None => {
            debug!("Eval hook never called, formatting packed text as-is");
            packed.to_string()
        }
    };

    Ok(PlainSource::new(layout::reformat(&payload)))
}

/// Check if a script looks like packer output
pub fn detect(script: &str) -> bool {
    script.replace(char::is_whitespace, "").contains(PACKER_MARKER)
}
