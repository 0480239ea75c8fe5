//! Sources, byte spans, and source-qualified ranges.
//!
//! Every position in the compiler is a byte offset into one source's
//! text. Human-readable line/column pairs exist only at the diagnostic
//! boundary, so each [`Source`] converts offsets on demand through a
//! lazily built table of line-start offsets.

use std::cell::OnceCell;

use serde::Serialize;

/// Identifies a source file within a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceId(pub u32);

/// A byte range within one source's text. Start is inclusive, end is
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span runs backwards: {start}..{end}");
        Self { start, end }
    }

    /// Length in bytes.
    pub fn len(self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// The smallest span covering both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A span tied to the source file it came from.
///
/// All diagnostics and syntax tree nodes carry a `Range`. Ranges from two
/// different sources are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub source: SourceId,
    pub span: Span,
}

impl Range {
    pub fn new(source: SourceId, start: u32, end: u32) -> Self {
        Self {
            source,
            span: Span::new(start, end),
        }
    }

    /// Merge two ranges from the same source into one that covers both.
    pub fn merge(self, other: Range) -> Range {
        debug_assert_eq!(
            self.source, other.source,
            "ranges from different sources must not be merged"
        );
        Range {
            source: self.source,
            span: self.span.merge(other.span),
        }
    }
}

/// An immutable (name, contents) pair. The line-start table is built the
/// first time a diagnostic asks for a line/column and cached after that.
#[derive(Debug)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub contents: String,
    line_starts: OnceCell<Vec<u32>>,
}

impl Source {
    /// Slice the contents by a span.
    pub fn text(&self, span: Span) -> &str {
        &self.contents[span.start as usize..span.end as usize]
    }

    /// Byte offsets at which each line begins. Line 0 starts at offset 0;
    /// every later line starts just past a newline.
    fn line_starts(&self) -> &[u32] {
        self.line_starts.get_or_init(|| {
            std::iter::once(0)
                .chain(
                    self.contents
                        .match_indices('\n')
                        .map(|(offset, _)| offset as u32 + 1),
                )
                .collect()
        })
    }

    /// Convert a byte offset to a 1-based (line, column) pair in
    /// O(log lines). Column counts bytes from the line start.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let starts = self.line_starts();
        // An offset sitting exactly on a line start belongs to that line;
        // anything else belongs to the line starting just before it.
        let line = match starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line as u32 + 1, offset - starts[line] + 1)
    }
}

/// Owns every source participating in one compilation, including sources
/// pulled in through `#include` and the synthesized built-in API source.
#[derive(Debug, Default)]
pub struct SourceMap {
    sources: Vec<Source>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source and return its id.
    pub fn add(&mut self, name: impl Into<String>, contents: impl Into<String>) -> SourceId {
        let id = SourceId(self.sources.len() as u32);
        self.sources.push(Source {
            id,
            name: name.into(),
            contents: contents.into(),
            line_starts: OnceCell::new(),
        });
        id
    }

    pub fn get(&self, id: SourceId) -> &Source {
        &self.sources[id.0 as usize]
    }

    /// Find a source by name. Used for `#include` cycle detection.
    pub fn find_by_name(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_length_and_merge() {
        let a = Span::new(4, 9);
        assert_eq!(a.len(), 5);
        assert!(!a.is_empty());
        assert!(Span::new(3, 3).is_empty());

        let b = Span::new(7, 15);
        assert_eq!(a.merge(b), Span::new(4, 15));
        // Merging is order-independent.
        assert_eq!(b.merge(a), Span::new(4, 15));
    }

    #[test]
    fn add_and_get() {
        let mut map = SourceMap::new();
        let id = map.add("shader.glsl", "void main() {}");
        assert_eq!(map.get(id).name, "shader.glsl");
        assert_eq!(map.get(id).contents, "void main() {}");
    }

    #[test]
    fn text_slicing() {
        let mut map = SourceMap::new();
        let id = map.add("a", "vec4 color;");
        assert_eq!(map.get(id).text(Span::new(0, 4)), "vec4");
        assert_eq!(map.get(id).text(Span::new(5, 10)), "color");
    }

    #[test]
    fn line_col_over_a_shader() {
        let mut map = SourceMap::new();
        let id = map.add("a", "void f() {\n  int x;\n}\n");
        let src = map.get(id);
        // 'v' of "void".
        assert_eq!(src.line_col(0), (1, 1));
        // 'i' of "int" on the second line.
        assert_eq!(src.line_col(13), (2, 3));
        // The closing brace.
        assert_eq!(src.line_col(20), (3, 1));
    }

    #[test]
    fn line_col_at_boundaries() {
        let mut map = SourceMap::new();
        let id = map.add("a", "ab\ncd");
        let src = map.get(id);
        // The newline itself still belongs to line 1.
        assert_eq!(src.line_col(2), (1, 3));
        // The first byte after it starts line 2.
        assert_eq!(src.line_col(3), (2, 1));
    }

    #[test]
    fn line_col_single_line() {
        let mut map = SourceMap::new();
        let id = map.add("a", "gl_FragColor");
        assert_eq!(map.get(id).line_col(0), (1, 1));
        assert_eq!(map.get(id).line_col(11), (1, 12));
    }

    #[test]
    fn find_by_name() {
        let mut map = SourceMap::new();
        map.add("a.glsl", "");
        let id = map.add("b.glsl", "");
        assert_eq!(map.find_by_name("b.glsl").map(|s| s.id), Some(id));
        assert!(map.find_by_name("c.glsl").is_none());
    }

    #[test]
    fn range_merge_same_source() {
        let a = Range::new(SourceId(0), 2, 5);
        let b = Range::new(SourceId(0), 4, 9);
        assert_eq!(a.merge(b).span, Span::new(2, 9));
    }
}
