//! One side of a synced pair: text, cursor and view state.
//!
//! A [`Document`] holds a text buffer, the cursor within it, the way the view
//! splits its text into fragments, and whether the view currently accepts
//! edits. The text itself is replaced wholesale (for example after a
//! re-render); editing is left to whatever owns the view.
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//!
//! use ropey::Rope;
//! use lit_lib::{
//!   document::{
//!     Document,
//!     DocumentId,
//!   },
//!   selection::Range,
//! };
//!
//! let id = DocumentId::new(NonZeroUsize::new(1).unwrap());
//! let mut doc = Document::new(id, Rope::from("hello"));
//!
//! doc.set_selection(Range::new(1, 4)).unwrap();
//! assert!(doc.set_selection(Range::point(9)).is_err());
//! ```

use std::{
  borrow::Cow,
  num::NonZeroUsize,
};

use ropey::{
  Rope,
  RopeSlice,
};
use thiserror::Error;

use crate::{
  Tendril,
  fragment::Segmentation,
  selection::Range,
  sync::SyncView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(NonZeroUsize);

impl DocumentId {
  pub const fn new(id: NonZeroUsize) -> Self {
    Self(id)
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
  #[error("selection {anchor}..{head} is outside the document (length {len})")]
  SelectionOutOfBounds {
    anchor: usize,
    head:   usize,
    len:    usize,
  },
}

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Clone)]
pub struct Document {
  id:           DocumentId,
  display_name: Tendril,
  text:         Rope,
  selection:    Range,
  segmentation: Segmentation,
  editable:     bool,
  version:      u64,
}

impl Document {
  pub fn new(id: DocumentId, text: Rope) -> Self {
    Self {
      id,
      display_name: Tendril::new(),
      text,
      selection: Range::point(0),
      segmentation: Segmentation::default(),
      editable: true,
      version: 0,
    }
  }

  #[must_use]
  pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
    self.segmentation = segmentation;
    self
  }

  pub fn id(&self) -> DocumentId {
    self.id
  }

  pub fn display_name(&self) -> Cow<'_, str> {
    if self.display_name.is_empty() {
      Cow::Borrowed("<untitled>")
    } else {
      Cow::Borrowed(self.display_name.as_str())
    }
  }

  pub fn set_display_name(&mut self, name: impl Into<Tendril>) {
    self.display_name = name.into();
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  /// Replaces the whole text. The selection is pulled back inside the new
  /// text.
  pub fn set_text(&mut self, text: Rope) {
    self.selection = self.selection.clamp(text.len_chars());
    self.text = text;
    self.version += 1;
  }

  pub fn selection(&self) -> Range {
    self.selection
  }

  pub fn set_selection(&mut self, selection: Range) -> Result<()> {
    let len = self.text.len_chars();
    if !selection.fits(len) {
      return Err(DocumentError::SelectionOutOfBounds {
        anchor: selection.anchor,
        head: selection.head,
        len,
      });
    }
    self.selection = selection;
    Ok(())
  }

  pub fn segmentation(&self) -> &Segmentation {
    &self.segmentation
  }

  pub fn set_segmentation(&mut self, segmentation: Segmentation) {
    self.segmentation = segmentation;
  }

  pub fn is_editable(&self) -> bool {
    self.editable
  }

  pub fn set_editable(&mut self, editable: bool) {
    self.editable = editable;
  }

  /// Bumped every time the text is replaced.
  pub fn version(&self) -> u64 {
    self.version
  }
}

impl SyncView for Document {
  fn text(&self) -> RopeSlice<'_> {
    self.text.slice(..)
  }

  fn cursor(&self) -> Range {
    self.selection
  }

  fn set_cursor(&mut self, range: Range) {
    self.selection = range.clamp(self.text.len_chars());
  }

  fn set_editable(&mut self, editable: bool) {
    self.editable = editable;
  }

  fn segmentation(&self) -> &Segmentation {
    &self.segmentation
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(text: &str) -> Document {
    Document::new(DocumentId::new(NonZeroUsize::new(1).unwrap()), Rope::from(text))
  }

  #[test]
  fn new_document_defaults() {
    let doc = doc("hello");
    assert_eq!(doc.selection(), Range::point(0));
    assert_eq!(doc.segmentation(), &Segmentation::Lines);
    assert!(doc.is_editable());
    assert_eq!(doc.version(), 0);
    assert_eq!(doc.display_name(), "<untitled>");
  }

  #[test]
  fn selection_must_fit() {
    let mut doc = doc("hello");
    doc.set_selection(Range::new(0, 5)).unwrap();
    assert_eq!(
      doc.set_selection(Range::new(2, 6)),
      Err(DocumentError::SelectionOutOfBounds {
        anchor: 2,
        head:   6,
        len:    5,
      })
    );
    assert_eq!(doc.selection(), Range::new(0, 5));
  }

  #[test]
  fn replacing_text_clamps_selection() {
    let mut doc = doc("hello world");
    doc.set_selection(Range::new(2, 10)).unwrap();
    doc.set_text(Rope::from("hey"));
    assert_eq!(doc.selection(), Range::new(2, 3));
    assert_eq!(doc.version(), 1);
  }

  #[test]
  fn sync_view_clamps_cursor() {
    let mut doc = doc("abc");
    SyncView::set_cursor(&mut doc, Range::point(10));
    assert_eq!(SyncView::cursor(&doc), Range::point(3));
    SyncView::set_editable(&mut doc, false);
    assert!(!doc.is_editable());
  }

  #[test]
  fn display_name() {
    let mut doc = doc("");
    doc.set_display_name("README.rst");
    assert_eq!(doc.display_name(), "README.rst");
  }
}
