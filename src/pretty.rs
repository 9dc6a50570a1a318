// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Size-bounded, human-friendly JSON serialization
//!
//! Every node is first tried as a single line (`{"a": 1, "b": [1, 2]}`). When
//! that line does not fit into the remaining width, objects and arrays are
//! broken up one element per line and the elements are tried again, one
//! indent unit deeper. Lines are joined with `\r\n`.
//!
//! The value's [`Serialize`] impl is the conversion hook: it runs before any
//! layout decision, and entries it skips never show up in the output.

use serde::Serialize;
use serde_json::Value;

/// Layout options for [`stringify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrettyOptions {
    indent: String,
    max_length: usize,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            max_length: 80,
        }
    }
}

impl PrettyOptions {
    /// Use `width` spaces per indent level
    #[must_use]
    pub fn indent_width(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    /// Use a literal indent string; `""` produces compact single-line output
    #[must_use]
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Maximum line length, including indentation
    #[must_use]
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn effective_max_length(&self) -> usize {
        if self.indent.is_empty() {
            usize::MAX
        } else {
            self.max_length
        }
    }
}

/// Serialize `value` with the given layout options.
pub fn stringify<T: Serialize + ?Sized>(
    value: &T,
    options: &PrettyOptions,
) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let printer = Printer {
        indent: &options.indent,
        max_length: options.effective_max_length(),
    };
    printer.render(&value, "", 0)
}

struct Printer<'a> {
    indent: &'a str,
    max_length: usize,
}

impl Printer<'_> {
    fn render(
        &self,
        value: &Value,
        current_indent: &str,
        reserved: usize,
    ) -> Result<String, serde_json::Error> {
        let compact = serde_json::to_string(value)?;
        let available = self
            .max_length
            .saturating_sub(current_indent.chars().count())
            .saturating_sub(reserved);

        if compact.chars().count() <= available {
            let spaced = space_tokens(&compact);
            if spaced.chars().count() <= available {
                return Ok(spaced);
            }
        }

        let next_indent = format!("{current_indent}{}", self.indent);
        let (start, end, items) = match value {
            Value::Array(elements) => {
                let last = elements.len().saturating_sub(1);
                let mut items = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    let reserved = usize::from(index != last);
                    items.push(self.render(element, &next_indent, reserved)?);
                }
                ('[', ']', items)
            }
            Value::Object(map) => {
                let last = map.len().saturating_sub(1);
                let mut items = Vec::with_capacity(map.len());
                for (index, (key, element)) in map.iter().enumerate() {
                    let key_part = format!("{}: ", serde_json::to_string(key)?);
                    let reserved = key_part.chars().count() + usize::from(index != last);
                    let rendered = self.render(element, &next_indent, reserved)?;
                    items.push(format!("{key_part}{rendered}"));
                }
                ('{', '}', items)
            }
            _ => return Ok(compact),
        };

        if items.is_empty() {
            return Ok(compact);
        }

        let separator = format!(",\r\n{next_indent}");
        Ok(format!(
            "{start}\r\n{current_indent}{}{}\r\n{current_indent}{end}",
            self.indent,
            items.join(&separator)
        ))
    }
}

/// Put a space after every `:` and `,` that is not inside a string literal.
fn space_tokens(compact: &str) -> String {
    let mut out = String::with_capacity(compact.len() + compact.len() / 4);
    let mut in_string = false;
    let mut escaped = false;

    for ch in compact.chars() {
        out.push(ch);
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            ':' | ',' => out.push(' '),
            _ => {}
        }
    }

    out
}
