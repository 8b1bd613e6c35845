// Borrowed cursor into a byte buffer.
//
// A `Span` is a buffer reference plus an offset.  It never owns data and
// is `Copy`, so moving a cursor around costs one `usize`.

/// A read-only position inside a byte buffer.
///
/// `len()` counts the bytes from the cursor to the end of the buffer;
/// bytes before the cursor stay reachable through [`Span::before`] so that
/// matches can be extended backwards.
#[derive(Debug, Clone, Copy)]
pub struct Span<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Span<'a> {
    /// Cursor at `offset` within `data`.
    ///
    /// # Panics
    /// If `offset > data.len()`, like slice indexing.
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        assert!(
            offset <= data.len(),
            "span offset {offset} past end of {}-byte buffer",
            data.len()
        );
        Self { data, offset }
    }

    /// Cursor at the start of `data`.
    pub fn start(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Offset of the cursor from the start of the buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The whole underlying buffer.
    #[inline]
    pub fn buffer(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes remaining from the cursor to the end of the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - self.offset
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes from the cursor to the end of the buffer.
    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    /// The next `len` bytes, or `None` if fewer remain.
    #[inline]
    pub fn window(&self, len: usize) -> Option<&'a [u8]> {
        self.as_slice().get(..len)
    }

    /// The `len` bytes immediately before the cursor.
    ///
    /// # Panics
    /// If `len > self.offset()`.
    #[inline]
    pub fn before(&self, len: usize) -> &'a [u8] {
        &self.data[self.offset - len..self.offset]
    }

    /// True if both spans' buffers start at the same address.
    ///
    /// Lengths are not compared: a span over a prefix of a buffer shares the
    /// buffer with a span over the whole of it.
    #[inline]
    pub fn same_buffer(&self, other: &Span<'_>) -> bool {
        std::ptr::eq(self.data.as_ptr(), other.data.as_ptr())
    }

    /// Distance from `base` to this cursor when both share a buffer and
    /// `base` is not past `self`.
    #[inline]
    pub fn distance_from(&self, base: &Span<'_>) -> Option<usize> {
        if !self.same_buffer(base) {
            return None;
        }
        self.offset.checked_sub(base.offset)
    }
}
