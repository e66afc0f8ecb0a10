//! JavaScript config file generation.
//!
//! Generated config files such as `.eslintrc.js` are plain JS object
//! literals behind `module.exports`. [`JsValue`] is a JSON value that can
//! also carry a raw JS expression (`require('path')`, `process.env.X`).

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

const INDENT: &str = "  ";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("static regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<JsValue>),
    /// Ordered key/value pairs.
    Object(Vec<(String, JsValue)>),
    /// Emitted verbatim.
    Expression(String),
}

impl JsValue {
    pub fn expression(source: impl Into<String>) -> Self {
        Self::Expression(source.into())
    }

    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JsValue)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<Value> for JsValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// `module.exports = <literal>`.
pub fn gen_js_config(value: &JsValue) -> String {
    format!("module.exports = {}", stringify_js(value))
}

/// Render a value as a two-space indented JS literal.
pub fn stringify_js(value: &JsValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &JsValue, depth: usize) {
    match value {
        JsValue::Null => out.push_str("null"),
        JsValue::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        JsValue::Number(n) => {
            let _ = write!(out, "{n}");
        }
        JsValue::String(s) => write_string(out, s),
        JsValue::Expression(src) => out.push_str(src),
        JsValue::Array(items) if items.is_empty() => out.push_str("[]"),
        JsValue::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                push_indent(out, depth + 1);
                write_value(out, item, depth + 1);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth);
            out.push(']');
        }
        JsValue::Object(entries) if entries.is_empty() => out.push_str("{}"),
        JsValue::Object(entries) => {
            out.push_str("{\n");
            for (i, (key, item)) in entries.iter().enumerate() {
                push_indent(out, depth + 1);
                if IDENTIFIER.is_match(key) {
                    out.push_str(key);
                } else {
                    write_string(out, key);
                }
                out.push_str(": ");
                write_value(out, item, depth + 1);
                if i + 1 < entries.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth);
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
