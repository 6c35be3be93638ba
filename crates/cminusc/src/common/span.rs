//! Source locations

use std::ops::Range;

/// Byte range into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_orders_endpoints() {
        let a = Span::new(10, 14);
        let b = Span::new(2, 5);
        assert_eq!(a.merge(b), Span::new(2, 14));
        assert_eq!(b.merge(a).range(), 2..14);
    }
}
