//! Diagnostic type and its caret rendering.

use std::fmt;

use crate::LineOffsetTable;

/// Engine phase that produced a diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Markup structure and embedded expression syntax.
    Lexer,
    /// Template compilation, including constant folding.
    Compiler,
    /// Expression evaluation while rendering.
    Context,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Lexer => "Lexer",
            Phase::Compiler => "Compiler",
            Phase::Context => "Context",
        })
    }
}

/// Source position of a syntax diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// 1-based line.
    pub line: u32,
    /// 1-based character column.
    pub column: u32,
    pub line_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Diagnostic {
            phase,
            message: message.into(),
            location: None,
        }
    }

    /// Diagnostic pointing at byte `offset` of `source`.
    pub fn at(phase: Phase, source: &str, offset: usize, message: impl Into<String>) -> Self {
        let table = LineOffsetTable::build(source);
        let (line, column) = table.offset_to_line_col(source, offset);
        Diagnostic {
            phase,
            message: message.into(),
            location: Some(Location {
                line,
                column,
                line_text: table.line_text(source, line).to_owned(),
            }),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            let prefix = format!("-> {}: ", location.line);
            writeln!(f, "{prefix}{}", location.line_text)?;
            f.write_str(&" ".repeat(prefix.len()))?;
            // Keep tabs so the caret lines up under tab-indented source.
            for c in location
                .line_text
                .chars()
                .take(location.column.saturating_sub(1) as usize)
            {
                f.write_str(if c == '\t' { "\t" } else { " " })?;
            }
            writeln!(f, "^")?;
        }
        write!(f, "{} error: {}", self.phase, self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_caret_rendering() {
        let source = "html\n\tbody(class=\n";
        let offset = source.find("(class").map_or(0, |i| i + 1);
        let diagnostic = Diagnostic::at(Phase::Lexer, source, offset, "Invalid attribute list");
        assert_eq!(
            diagnostic.to_string(),
            "-> 2: \tbody(class=\n      \t     ^\nLexer error: Invalid attribute list"
        );
    }

    #[test]
    fn test_plain_message() {
        let diagnostic = Diagnostic::new(Phase::Context, "Invalid variable name: user");
        assert_eq!(
            diagnostic.to_string(),
            "Context error: Invalid variable name: user"
        );
    }
}
