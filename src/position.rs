// ABOUTME: Source position tracking for tokens, AST nodes, and values

use std::rc::Rc;

/// A single point in a source buffer: byte index, line, column, plus a
/// shared handle to the filename and full source text so diagnostics can be
/// rendered without re-threading them through every call site.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub idx: isize,
    pub line: usize,
    pub col: isize,
    pub filename: Rc<str>,
    pub source: Rc<str>,
}

impl Position {
    pub fn new(idx: isize, line: usize, col: isize, filename: Rc<str>, source: Rc<str>) -> Self {
        Position {
            idx,
            line,
            col,
            filename,
            source,
        }
    }

    /// Advance past `current`, incrementing line/column bookkeeping.
    /// Mirrors the lexer's own notion of "current char" rather than reading
    /// from `source` directly, since the lexer calls this before updating
    /// its own cursor.
    pub fn advance(&mut self, current: Option<char>) -> &mut Self {
        self.idx += 1;
        self.col += 1;
        if current == Some('\n') {
            self.line += 1;
            self.col = 0;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Position {
        Position::new(-1, 0, -1, Rc::from("<test>"), Rc::from(""))
    }

    #[test]
    fn advance_increments_col_and_idx() {
        let mut p = pos();
        p.advance(None);
        assert_eq!(p.idx, 0);
        assert_eq!(p.col, 0);
        assert_eq!(p.line, 0);
    }

    #[test]
    fn advance_on_newline_resets_column() {
        let mut p = pos();
        p.advance(None);
        p.advance(Some('\n'));
        assert_eq!(p.line, 1);
        assert_eq!(p.col, 0);
    }
}
