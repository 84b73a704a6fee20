//! Cursor positions in a view.
//!
//! A [`Range`] has two positions: `anchor` and `head`. The `head` is where the
//! cursor is, while the `anchor` is the other end of the selection. When
//! `anchor == head`, the range is a bar cursor between two characters.
//!
//! ```text
//! anchor=2, head=7: "he[llo w]orld"  (forward selection)
//! anchor=7, head=2: "he]llo w[orld"  (backward selection)
//! anchor=5, head=5: "hello|world"    (cursor)
//! ```
//!
//! All positions are char offsets; a position equal to the text length is the
//! end of the text.

use ropey::RopeSlice;
use lit_core::line_ending::line_span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  #[inline]
  pub fn point(head: usize) -> Self {
    Self::new(head, head)
  }

  /// Selects the line containing `pos`, without its line ending.
  pub fn line_at(text: RopeSlice, pos: usize) -> Self {
    let pos = pos.min(text.len_chars());
    let span = line_span(&text, text.char_to_line(pos));
    Self::new(span.start, span.end)
  }

  /// Start of the range
  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    std::cmp::min(self.anchor, self.head)
  }

  /// End of the range
  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    std::cmp::max(self.anchor, self.head)
  }

  /// When the head and anchor are in the same position, we have no range.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.head
  }

  /// Whether both ends lie within a text of `len` chars.
  #[inline]
  pub fn fits(&self, len: usize) -> bool {
    self.to() <= len
  }

  /// Moves the head to `head`, keeping the anchor where it is.
  #[inline]
  #[must_use]
  pub fn put_head(self, head: usize) -> Self {
    Self::new(self.anchor, head)
  }

  /// Pulls both ends back inside a text of `len` chars.
  #[inline]
  #[must_use]
  pub fn clamp(self, len: usize) -> Self {
    Self::new(self.anchor.min(len), self.head.min(len))
  }
}
