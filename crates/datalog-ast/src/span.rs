use internment::Intern;
use std::{fmt, ops::Range, path::Path};

/// Interned identity of a source file
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct SrcId(Intern<Vec<String>>);

impl SrcId {
    pub fn empty() -> Self {
        Self(Intern::new(Vec::new()))
    }

    pub fn repl() -> Self {
        Self(Intern::new(vec!["repl".to_string()]))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self(Intern::new(
            path.as_ref()
                .iter()
                .map(|segment| segment.to_string_lossy().into_owned())
                .collect(),
        ))
    }
}

impl fmt::Display for SrcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "?")
        } else {
            write!(f, "{}", self.0.join("/"))
        }
    }
}

impl fmt::Debug for SrcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A byte range within one source file
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    src: SrcId,
    range: (usize, usize),
}

impl Span {
    pub fn new(src: SrcId, range: Range<usize>) -> Self {
        assert!(range.start <= range.end);
        Self {
            src,
            range: (range.start, range.end),
        }
    }

    /// Span used for nodes synthesized by analysis passes
    pub fn internal() -> Self {
        Self::new(SrcId::empty(), 0..0)
    }

    pub fn src(&self) -> SrcId {
        self.src
    }

    pub fn start(&self) -> usize {
        self.range.0
    }

    pub fn end(&self) -> usize {
        self.range.1
    }

    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn union(self, other: Self) -> Self {
        assert_eq!(self.src, other.src, "span source ids must match");
        Self {
            src: self.src,
            range: (self.start().min(other.start()), self.end().max(other.end())),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{:?}", self.src, self.range())
    }
}

impl ariadne::Span for Span {
    type SourceId = SrcId;

    fn source(&self) -> &Self::SourceId {
        &self.src
    }

    fn start(&self) -> usize {
        self.range.0
    }

    fn end(&self) -> usize {
        self.range.1
    }
}
