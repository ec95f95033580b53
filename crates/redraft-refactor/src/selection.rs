use redraft_types::Span;

use crate::edit::TextRange;

/// A user selection in a document, in UTF-8 byte offsets.
///
/// Most invocations are a zero-width cursor; a non-empty selection behaves
/// the same way as long as it stays inside the targeted node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid selection: {start}..{end}");
        Self { start, end }
    }

    /// A zero-width selection at `offset`.
    pub fn cursor(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn from_span(span: Span) -> Self {
        Self::new(span.start, span.end)
    }

    /// Whether the whole selection lies inside `span` (end-inclusive, so a
    /// cursor sitting right after the last character still counts).
    pub fn is_inside(self, span: Span) -> bool {
        span.start <= self.start && self.end <= span.end
    }

    pub fn extend_start_to(self, offset: usize) -> Self {
        Self::new(offset.min(self.start), self.end)
    }

    pub fn extend_end_to(self, offset: usize) -> Self {
        Self::new(self.start, offset.max(self.end))
    }

    pub fn extend_to_start_of_line(self, source: &str) -> Self {
        self.extend_start_to(line_start(source, self.start))
    }

    pub fn extend_to_start_of_next_line(self, source: &str) -> Self {
        self.extend_end_to(start_of_next_line(source, self.end))
    }

    pub fn to_range(self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

pub(crate) fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0)
}

pub(crate) fn start_of_next_line(text: &str, offset: usize) -> usize {
    text[offset..]
        .find('\n')
        .map(|p| offset + p + 1)
        .unwrap_or(text.len())
}

pub(crate) fn indentation_at(text: &str, offset: usize) -> String {
    let start = line_start(text, offset);
    let mut out = String::new();
    for ch in text[start..].chars() {
        if ch == ' ' || ch == '\t' {
            out.push(ch);
        } else {
            break;
        }
    }
    out
}

/// Deletion range for a whole statement: grows to full lines, but only over
/// whitespace, so a statement sharing its line with other code loses exactly
/// its own text.
pub(crate) fn statement_deletion_range(source: &str, span: Span) -> TextRange {
    let line = line_start(source, span.start);
    let owns_line_start = source[line..span.start].trim().is_empty();
    let start = if owns_line_start { line } else { span.start };

    let next_line = start_of_next_line(source, span.end);
    let end = if owns_line_start && source[span.end..next_line].trim().is_empty() {
        next_line
    } else {
        span.end
    };
    TextRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_is_inside_enclosing_span() {
        let span = Span::new(4, 10);
        assert!(Selection::cursor(4).is_inside(span));
        assert!(Selection::cursor(10).is_inside(span));
        assert!(!Selection::cursor(11).is_inside(span));
        assert!(Selection::new(5, 9).is_inside(span));
        assert!(!Selection::new(3, 9).is_inside(span));
    }

    #[test]
    fn line_extension() {
        let source = "const a = 1;\nuse(a);\n";
        let selection = Selection::new(6, 12)
            .extend_to_start_of_line(source)
            .extend_to_start_of_next_line(source);
        assert_eq!(selection, Selection::new(0, 13));
    }

    #[test]
    fn statement_deletion_stays_on_shared_lines() {
        let source = "run(); const a = 1;\nuse(a);\n";
        let range = statement_deletion_range(source, Span::new(7, 19));
        assert_eq!(range, TextRange::new(7, 19));

        let source = "const a = 1;\nuse(a);\n";
        let range = statement_deletion_range(source, Span::new(0, 12));
        assert_eq!(range, TextRange::new(0, 13));
    }
}
