/*! This module implements the [`Slice`] type.

[`Slice`] is an allocation-free view over a range of code points within a
subject sequence. The view itself stores only a start and end offset; the
actual characters are obtained by resolving the view against the subject
with [`Slice::resolve`]. Tokens consumed during matching and the content
captured by variables are both represented as slices, which is what makes
capturing and backreference comparison zero-copy.
*/

use std::ops::Range;

/// A view over a range of code points within a subject sequence.
///
/// The range is expressed in code points (not bytes), with an inclusive
/// start and exclusive end. Two slices are equal when they designate the
/// same range; content comparison requires resolving both against the
/// subject.
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug)]
pub struct Slice {
    start: usize,
    end: usize,
}

impl Slice {
    /// Creates a slice spanning `start..end`.
    ///
    /// # Panics
    ///
    /// If `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid slice range {start}..{end}");
        Self { start, end }
    }

    /// Creates an empty slice positioned at `pos`.
    #[inline]
    pub fn empty_at(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }

    /// Offset of the first code point in the slice.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last code point in the slice.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of code points in the slice.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the slice contains no code points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The `start..end` range designated by the slice.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Extends the slice by `n` code points.
    ///
    /// This is how an open variable's buffer grows while tokens are being
    /// consumed: the view is widened in place, no content is copied.
    #[inline]
    pub fn extend(&mut self, n: usize) {
        self.end += n;
    }

    /// Returns the sub-slice designated by `range`, which is relative to
    /// this slice.
    ///
    /// # Panics
    ///
    /// If `range` exceeds the length of the slice.
    pub fn sub(&self, range: Range<usize>) -> Self {
        assert!(range.end <= self.len(), "sub-range out of bounds");
        Self::new(self.start + range.start, self.start + range.end)
    }

    /// Resolves the view against the subject it refers to, yielding the
    /// designated code points.
    #[inline]
    pub fn resolve<'s>(&self, subject: &'s [char]) -> &'s [char] {
        &subject[self.start..self.end]
    }
}
