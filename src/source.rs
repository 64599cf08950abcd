use std::{fmt::Debug, fmt::Display, fs, io, ops::Range, path::Path, rc::Rc};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeSpan {
    pub start: usize,
    pub end: usize,
}

impl CodeSpan {
    pub const ZEROSPAN: Self = CodeSpan { start: 0, end: 0 };

    pub fn extended(self, other: Self) -> Self {
        Self {
            start: self.start,
            end: other.end,
        }
    }

    pub fn into_area(self, src: Rc<EmberSource>) -> CodeArea {
        CodeArea { span: self, src }
    }
}

impl Debug for CodeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Range<usize>> for CodeSpan {
    fn from(value: Range<usize>) -> Self {
        Self {
            start: value.start,
            end: value.end,
        }
    }
}
impl From<CodeSpan> for Range<usize> {
    fn from(value: CodeSpan) -> Self {
        value.start..value.end
    }
}

/// One module's worth of code, identified by its module path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmberSource {
    path: String,
    code: String,
}

impl EmberSource {
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let code = fs::read_to_string(path)?;
        Ok(Self {
            path: path.display().to_string(),
            code,
        })
    }
    pub fn from_string(path: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code: code.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.path
    }
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 1-based line and column (in chars) of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.code.len());
        let before = &self.code[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let col = before[line_start..].chars().count() + 1;
        (line, col)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CodeArea {
    pub span: CodeSpan,
    pub src: Rc<EmberSource>,
}

impl CodeArea {
    pub fn line_col(&self) -> (usize, usize) {
        self.src.line_col(self.span.start)
    }
}

impl Debug for CodeArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} @ {:?}>", self.src.name(), self.span)
    }
}

impl Display for CodeArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (line, col) = self.line_col();
        write!(f, "{}:{}:{}", self.src.name(), line, col)
    }
}
