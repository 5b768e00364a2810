//! Transform list parsing
//!
//! Parses the driver syntax for selecting transforms:
//!
//! ```text
//! remove_noop_split remove_noop_padv2(force=true) fold_transposed_pads
//! some_transform(name="a value, with commas", name=second)
//! ```
//!
//! Transforms are separated by whitespace. Parameters are `key=value` pairs
//! separated by commas; values may be double-quoted. A key may repeat.

use std::collections::BTreeMap;

use crate::error::{GraphResult, TransformError};

/// Parameters of one transform invocation
pub type TransformParameters = BTreeMap<String, Vec<String>>;

/// Ordered list of transforms with their parameters
pub type TransformList = Vec<(String, TransformParameters)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    TransformName,
    ParamName,
    ParamValue,
    QuotedValue,
    AfterQuote,
}

/// Parse a transform list
pub fn parse_transform_list(text: &str) -> GraphResult<TransformList> {
    let mut transforms = TransformList::new();
    let mut state = State::TransformName;
    let mut name = String::new();
    let mut params = TransformParameters::new();
    let mut param_name = String::new();
    let mut param_value = String::new();

    let invalid = |msg: &str| TransformError::InvalidParameter(format!("{} in '{}'", msg, text));

    let finish_param =
        |params: &mut TransformParameters, param_name: &mut String, param_value: &mut String| {
            params
                .entry(std::mem::take(param_name).trim().to_string())
                .or_default()
                .push(std::mem::take(param_value));
        };

    for ch in text.chars() {
        match state {
            State::TransformName => match ch {
                '(' => {
                    if name.is_empty() {
                        return Err(invalid("parameters without a transform name"));
                    }
                    state = State::ParamName;
                }
                c if c.is_whitespace() => {
                    if !name.is_empty() {
                        transforms.push((std::mem::take(&mut name), std::mem::take(&mut params)));
                    }
                }
                ')' | ',' | '=' | '"' => return Err(invalid("unexpected character")),
                c => name.push(c),
            },
            State::ParamName => match ch {
                '=' => {
                    if param_name.trim().is_empty() {
                        return Err(invalid("empty parameter name"));
                    }
                    state = State::ParamValue;
                }
                ')' if param_name.trim().is_empty() && params.is_empty() => {
                    transforms.push((std::mem::take(&mut name), std::mem::take(&mut params)));
                    state = State::TransformName;
                }
                c if c.is_whitespace() && param_name.is_empty() => {}
                ',' | ')' | '(' | '"' => return Err(invalid("expected '=' after parameter name")),
                c => param_name.push(c),
            },
            State::ParamValue => match ch {
                '"' if param_value.trim().is_empty() => {
                    param_value.clear();
                    state = State::QuotedValue;
                }
                ',' => {
                    param_value = param_value.trim().to_string();
                    finish_param(&mut params, &mut param_name, &mut param_value);
                    state = State::ParamName;
                }
                ')' => {
                    param_value = param_value.trim().to_string();
                    finish_param(&mut params, &mut param_name, &mut param_value);
                    transforms.push((std::mem::take(&mut name), std::mem::take(&mut params)));
                    state = State::TransformName;
                }
                '"' | '(' => return Err(invalid("unexpected character in value")),
                c => param_value.push(c),
            },
            State::QuotedValue => match ch {
                '"' => {
                    finish_param(&mut params, &mut param_name, &mut param_value);
                    state = State::AfterQuote;
                }
                c => param_value.push(c),
            },
            State::AfterQuote => match ch {
                ',' => state = State::ParamName,
                ')' => {
                    transforms.push((std::mem::take(&mut name), std::mem::take(&mut params)));
                    state = State::TransformName;
                }
                c if c.is_whitespace() => {}
                _ => return Err(invalid("expected ',' or ')' after quoted value")),
            },
        }
    }

    match state {
        State::TransformName => {
            if !name.is_empty() {
                transforms.push((name, params));
            }
            Ok(transforms)
        }
        State::QuotedValue => Err(invalid("unterminated quoted value")),
        _ => Err(invalid("unterminated parameter list")),
    }
}
