use crate::line_index::LineIndex;
use crate::span::Span;

/// A source buffer together with its path and line table. Diagnostics
/// resolve spans against this to produce `file:line:col` positions.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub src: Vec<u8>,
    index: LineIndex,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, src: Vec<u8>) -> Self {
        let index = LineIndex::new(&src);
        Self {
            path: path.into(),
            src,
            index,
        }
    }

    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        self.index.line_col(offset)
    }

    /// Render the position of a span's first byte as `file:line:col`.
    pub fn pos_string(&self, span: Span) -> String {
        let (line, col) = self.line_col(span.start);
        format!("{}:{}:{}", self.path, line, col)
    }

    pub fn slice(&self, span: Span) -> &[u8] {
        span.as_bytes(&self.src)
    }
}
