//! Printing values into template output.

use std::borrow::Cow;
use std::fmt::{self, Write};

use spug_ir::Value;

/// Replace `& < > " '` with their entities.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Printed form of a value: strings as-is, `null` for null, JSON for
/// containers.
pub fn printed(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed("null"),
        _ => value.to_text(),
    }
}

pub fn write_value(out: &mut dyn Write, value: &Value, escape: bool) -> fmt::Result {
    let text = printed(value);
    if escape {
        out.write_str(&escape_html(&text))
    } else {
        out.write_str(&text)
    }
}

/// Print ` name="value"` with the attribute conventions: `true` prints the
/// bare name, `false` and null print nothing, arrays are space-joined and a
/// `style` dictionary prints as `key:value;` pairs.
pub fn write_attribute(out: &mut dyn Write, name: &str, value: &Value, escape: bool) -> fmt::Result {
    let text: Cow<'_, str> = match value {
        Value::Null | Value::Bool(false) => return Ok(()),
        Value::Bool(true) => return write!(out, " {name}"),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(|item| item.to_text())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Value::Dict(entries) if name == "style" => {
            let mut style = String::new();
            for (key, value) in entries {
                let _ = write!(style, "{key}:{};", value.to_text());
            }
            Cow::Owned(style)
        }
        _ => value.to_text(),
    };
    if escape {
        write!(out, " {name}=\"{}\"", escape_html(&text))
    } else {
        write!(out, " {name}=\"{text}\"")
    }
}

/// `&attributes(dict)`: one escaped attribute per entry.
pub fn write_attribute_list(out: &mut dyn Write, value: &Value) -> fmt::Result {
    if let Value::Dict(entries) = value {
        for (name, value) in entries {
            write_attribute(out, name, value, true)?;
        }
    }
    Ok(())
}
