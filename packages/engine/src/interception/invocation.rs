// packages/engine/src/interception/invocation.rs
//! Arguments of an intercepted call and the recording keys derived from them

use crate::utils::errors::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Positional and named arguments of an intercepted invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationArgs {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl InvocationArgs {
    pub fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    /// Invocation with positional arguments only
    pub fn positional(args: Vec<Value>) -> Self {
        Self::new(args, Map::new())
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }

    /// Argument passed by `name`, falling back to position `index`
    ///
    /// A named argument set to `null` counts as not passed.
    pub fn argument(&self, index: usize, name: &str) -> Option<&Value> {
        self.kwargs
            .get(name)
            .filter(|value| !value.is_null())
            .or_else(|| self.args.get(index))
    }
}

/// An argument that identifies an input invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedArg {
    /// Position for arguments that may be passed positionally
    pub position: Option<usize>,
    pub name: String,
}

impl CapturedArg {
    pub fn new(position: Option<usize>, name: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
        }
    }
}

/// Key uniquely identifying an input invocation of `alias`
///
/// `capture_args` selects which arguments take part in the key: `None` uses
/// every argument, an empty slice none of them.
pub fn input_interception_key(
    alias: &str,
    capture_args: Option<&[CapturedArg]>,
    invocation: &InvocationArgs,
) -> Result<String> {
    let (args, kwargs) = match capture_args {
        None => (invocation.args.clone(), invocation.kwargs.clone()),
        Some(captured) => {
            let mut args = Vec::new();
            let mut kwargs = Map::new();
            for arg in captured {
                if let Some(value) = invocation.kwargs.get(&arg.name) {
                    kwargs.insert(arg.name.clone(), value.clone());
                } else if let Some(position) = arg.position {
                    let value = invocation.args.get(position).ok_or_else(|| {
                        PlaybackError::InputInterceptionKeyCreation(format!(
                            "Input {}: argument '{}' expected at position {} but only {} were passed",
                            alias,
                            arg.name,
                            position,
                            invocation.args.len()
                        ))
                    })?;
                    args.push(value.clone());
                }
            }
            (args, kwargs)
        }
    };

    let mut sorted_kwargs: Vec<(String, Value)> = kwargs.into_iter().collect();
    sorted_kwargs.sort_by(|a, b| a.0.cmp(&b.0));

    let args_key = serde_json::to_string(&args).map_err(|e| {
        PlaybackError::InputInterceptionKeyCreation(format!("Input {}: {}", alias, e))
    })?;
    let kwargs_key = serde_json::to_string(&sorted_kwargs).map_err(|e| {
        PlaybackError::InputInterceptionKeyCreation(format!("Input {}: {}", alias, e))
    })?;

    Ok(format!("input: {} args={}, kwargs={}", alias, args_key, kwargs_key))
}

/// Key of the `invocation_number`-th output of `alias`
pub fn output_interception_key(alias: &str, invocation_number: usize) -> String {
    format!("output: {} #{}", alias, invocation_number)
}
