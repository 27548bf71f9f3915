// ABOUTME: Error taxonomy and diagnostic rendering for lex/parse/runtime failures

use crate::context::Context;
use crate::position::Position;
use std::rc::Rc;
use thiserror::Error;

/// The closed set of errors the pipeline can produce. Each carries the span
/// it occurred at; `Runtime` additionally carries the `Context` so a
/// traceback can be walked.
#[derive(Error, Debug, Clone)]
pub enum LangError {
    #[error("Illegal character in the stream ({0})")]
    IllegalChar(String, Position, Position),

    #[error("{0}")]
    ExpectedChar(String, Position, Position),

    #[error("Invalid syntax in the stream ({0})")]
    InvalidSyntax(String, Position, Position),

    #[error("Runtime error encountered ({0})")]
    Runtime(String, Position, Position, Rc<Context>),
}

impl LangError {
    pub fn name(&self) -> &'static str {
        match self {
            LangError::IllegalChar(..) => "IllegalCharError",
            LangError::ExpectedChar(..) => "ExpectedCharError",
            LangError::InvalidSyntax(..) => "InvalidSyntaxError",
            LangError::Runtime(..) => "RuntimeError",
        }
    }

    pub fn start(&self) -> &Position {
        match self {
            LangError::IllegalChar(_, s, _)
            | LangError::ExpectedChar(_, s, _)
            | LangError::InvalidSyntax(_, s, _)
            | LangError::Runtime(_, s, _, _) => s,
        }
    }

    pub fn end(&self) -> &Position {
        match self {
            LangError::IllegalChar(_, _, e)
            | LangError::ExpectedChar(_, _, e)
            | LangError::InvalidSyntax(_, _, e)
            | LangError::Runtime(_, _, e, _) => e,
        }
    }

    pub fn details(&self) -> String {
        match self {
            LangError::IllegalChar(d, ..) => format!("Illegal character in the stream ({d})"),
            LangError::ExpectedChar(d, ..) => d.clone(),
            LangError::InvalidSyntax(d, ..) => format!("Invalid syntax in the stream ({d})"),
            LangError::Runtime(d, ..) => format!("Runtime error encountered ({d})"),
        }
    }

    /// Full multi-line diagnostic: traceback (runtime errors only), the
    /// `File <fn>, on line <n>` header, and the source line with carets
    /// under the failing span.
    pub fn report(&self) -> String {
        let mut out = String::new();
        if let LangError::Runtime(_, _, _, ctx) = self {
            out.push_str(&generate_traceback(ctx, self.start()));
        }
        out.push_str(&format!(
            "File {}, on line {}\n",
            self.start().filename,
            self.start().line + 1
        ));
        out.push_str(&format!("{}: {}\n", self.name(), self.details()));
        out.push_str(&string_with_arrows(
            &self.start().source,
            self.start(),
            self.end(),
        ));
        out.push('\n');
        out
    }
}

/// Walks the `Context` parent chain, most-recent-call-last, producing
/// `File <fn>, line <n>, in <display-name>` lines.
fn generate_traceback(ctx: &Rc<Context>, start: &Position) -> String {
    let mut lines = Vec::new();
    let mut context = Some(ctx.clone());
    let mut position = start.clone();
    while let Some(c) = context {
        lines.push(format!(
            "File {}, line {}, in {}\n",
            position.filename,
            position.line + 1,
            c.display_name
        ));
        match (&c.parent, &c.parent_entry_pos) {
            (Some(parent), Some(pos)) => {
                position = pos.clone();
                context = Some(parent.clone());
            }
            _ => break,
        }
    }
    lines.reverse();
    let mut out = String::from("\nTraceback (most recent call last):\n");
    out.push_str(&lines.concat());
    out
}

/// Renders `text` with `^` carets underlining the `start..end` span,
/// one rendered source line per line the span covers.
pub fn string_with_arrows(text: &str, start: &Position, end: &Position) -> String {
    let bytes = text.as_bytes();
    let start_idx = start.idx.max(0) as usize;
    let mut idx_start = text[..start_idx.min(text.len())]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let mut idx_end = find_newline_from(bytes, idx_start + 1).unwrap_or(text.len());

    let line_count = end.line.saturating_sub(start.line) + 1;
    let mut result = String::new();
    for i in 0..line_count {
        let idx_end_clamped = idx_end.min(text.len());
        let idx_start_clamped = idx_start.min(idx_end_clamped);
        let line = &text[idx_start_clamped..idx_end_clamped];
        let col_start = if i == 0 { start.col.max(0) as usize } else { 0 };
        let col_end = if i == line_count - 1 {
            (end.col.max(0) as usize).max(col_start)
        } else {
            line.len().saturating_sub(1)
        };
        result.push_str(line);
        result.push('\n');
        result.push_str(&" ".repeat(col_start));
        result.push_str(&"^".repeat(col_end.saturating_sub(col_start).max(1)));
        idx_start = idx_end_clamped;
        idx_end = find_newline_from(bytes, idx_start + 1).unwrap_or(text.len());
    }
    result.replace('\t', "")
}

fn find_newline_from(bytes: &[u8], from: usize) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..].iter().position(|&b| b == b'\n').map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc as StdRc;

    fn pos(idx: isize, line: usize, col: isize, src: &str) -> Position {
        Position::new(idx, line, col, StdRc::from("<test>"), StdRc::from(src))
    }

    #[test]
    fn arrows_underline_single_line_span() {
        let src = "VAR a = @";
        let start = pos(8, 0, 8, src);
        let end = pos(9, 0, 9, src);
        let rendered = string_with_arrows(src, &start, &end);
        assert!(rendered.contains("VAR a = @"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn illegal_char_report_has_name_and_line() {
        let src = "1 + @";
        let start = pos(4, 0, 4, src);
        let end = pos(5, 0, 5, src);
        let err = LangError::IllegalChar("\"@\"".to_string(), start, end);
        let report = err.report();
        assert!(report.contains("IllegalCharError"));
        assert!(report.contains("on line 1"));
    }
}
