//! Per-invocation transform context
//!
//! Carries the declared graph inputs and outputs plus the free-form
//! parameters a transform was invoked with.

use std::collections::BTreeMap;

use crate::error::{GraphResult, TransformError};
use crate::graph::{build_required_names, RequiredNames};

/// Context handed to every transform function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformFuncContext {
    /// Declared graph input references
    pub input_names: Vec<String>,
    /// Declared graph output references
    pub output_names: Vec<String>,
    /// Parameters; a key may be given more than once
    pub params: BTreeMap<String, Vec<String>>,
}

impl TransformFuncContext {
    /// Context with declared inputs and outputs and no parameters
    pub fn new<I, O, S, T>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            input_names: inputs.into_iter().map(Into::into).collect(),
            output_names: outputs.into_iter().map(Into::into).collect(),
            params: BTreeMap::new(),
        }
    }

    /// Replace the parameter set
    pub fn with_params(mut self, params: BTreeMap<String, Vec<String>>) -> Self {
        self.params = params;
        self
    }

    /// Add one value for `name`
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    /// Base names of every declared input and output
    pub fn required_names(&self) -> RequiredNames {
        build_required_names(self.input_names.iter().chain(self.output_names.iter()))
    }

    /// Number of values given for `name`
    pub fn count_parameters(&self, name: &str) -> usize {
        self.params.get(name).map_or(0, |values| values.len())
    }

    /// Single string value of `name`, or `default` when absent
    pub fn get_one_string_parameter(&self, name: &str, default: &str) -> GraphResult<String> {
        match self.params.get(name).map(|v| v.as_slice()) {
            None | Some([]) => Ok(default.to_string()),
            Some([value]) => Ok(value.clone()),
            Some(values) => Err(TransformError::InvalidParameter(format!(
                "expected a single value for '{}', found {}",
                name,
                values.len()
            ))),
        }
    }

    /// Single i32 value of `name`
    pub fn get_one_int32_parameter(&self, name: &str, default: i32) -> GraphResult<i32> {
        self.get_one_parsed(name, default)
    }

    /// Single i64 value of `name`
    pub fn get_one_int64_parameter(&self, name: &str, default: i64) -> GraphResult<i64> {
        self.get_one_parsed(name, default)
    }

    /// Single f32 value of `name`
    pub fn get_one_float_parameter(&self, name: &str, default: f32) -> GraphResult<f32> {
        self.get_one_parsed(name, default)
    }

    /// Single boolean value of `name`
    ///
    /// Accepts `true`/`false` and `1`/`0`.
    pub fn get_one_bool_parameter(&self, name: &str, default: bool) -> GraphResult<bool> {
        if self.count_parameters(name) == 0 {
            return Ok(default);
        }
        let value = self.get_one_string_parameter(name, "")?;
        match value.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(TransformError::InvalidParameter(format!(
                "couldn't interpret '{}' as a boolean for '{}'",
                other, name
            ))),
        }
    }

    fn get_one_parsed<T: std::str::FromStr>(&self, name: &str, default: T) -> GraphResult<T> {
        if self.count_parameters(name) == 0 {
            return Ok(default);
        }
        let value = self.get_one_string_parameter(name, "")?;
        value.trim().parse::<T>().map_err(|_| {
            TransformError::InvalidParameter(format!(
                "couldn't interpret '{}' as a number for '{}'",
                value, name
            ))
        })
    }
}
