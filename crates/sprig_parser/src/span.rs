use std::fmt::Display;

/// A byte offset into the line being lexed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BytePos(usize);

impl BytePos {
    pub fn new(pos: usize) -> Self {
        BytePos(pos)
    }

    pub fn shift(self, ch: char) -> Self {
        BytePos(self.0 + ch.len_utf8())
    }
}

impl Display for BytePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A range of the line, `start` inclusive and `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    start: BytePos,
    end: BytePos,
}

impl Span {
    pub fn new(start: BytePos, end: BytePos) -> Span {
        Span { start, end }
    }

    /// Convert the given span to the "(at 1:2)" format
    pub fn at_str(&self) -> String {
        format!("(at {})", self)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithSpan<T> {
    pub value: T,
    pub span: Span,
}

impl<T> WithSpan<T> {
    pub fn new(value: T, span: Span) -> WithSpan<T> {
        WithSpan { value, span }
    }
}

/// Formats as "value (at 1:2)"
impl<T> Display for WithSpan<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.span.at_str())
    }
}

impl<T> std::error::Error for WithSpan<T> where T: std::error::Error {}

#[cfg(test)]
mod tests {
    use crate::span::{BytePos, Span, WithSpan};

    #[test]
    fn shift_counts_bytes() {
        let pos = BytePos::new(0).shift('a').shift('é');
        assert_eq!(pos, BytePos::new(3));
    }

    #[test]
    fn display_with_span() {
        let spanned = WithSpan::new("oops", Span::new(BytePos::new(2), BytePos::new(3)));
        assert_eq!(spanned.to_string(), "oops (at 2:3)");
    }
}
