//! Keeping the cursors of a source view and its rendered view in step.
//!
//! When the cursor moves in one view, [`CursorSync::sync`] locates the
//! matching position in the other view and moves that view's cursor there.
//! Moving the other cursor usually triggers the other view's own "cursor
//! moved" notification, which would sync straight back. A suppression flag
//! turns that echo into a no-op: while a sync is running, any nested sync
//! returns [`SyncOutcome::Suppressed`] without touching either view.
//!
//! The flag is held by a [`SuppressGuard`], so it is released when the sync
//! returns, including by unwinding.
//!
//! If the position cannot be located, the other view is made read-only until
//! a later sync succeeds, since edits there could not be mapped back.

use std::{
  cell::Cell,
  num::NonZeroUsize,
};

use ropey::{
  Rope,
  RopeSlice,
};

use crate::{
  config::{
    Config,
    SyncConfig,
    TargetSelect,
  },
  document::{
    Document,
    DocumentId,
    Result,
  },
  fragment::{
    Segmentation,
    select_window,
  },
  locate::Locator,
  selection::Range,
};

/// A view that takes part in cursor sync.
pub trait SyncView {
  fn text(&self) -> RopeSlice<'_>;

  fn cursor(&self) -> Range;

  /// Implementations clamp `range` to their text.
  fn set_cursor(&mut self, range: Range);

  fn set_editable(&mut self, editable: bool);

  fn segmentation(&self) -> &Segmentation;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The other cursor was placed at this offset.
  Moved(usize),
  /// The other selection's head was moved to this offset, keeping its anchor.
  Extended(usize),
  /// No unique position was found; the other view was made read-only.
  Unknown,
  /// A sync was already running.
  Suppressed,
}

impl SyncOutcome {
  pub fn offset(self) -> Option<usize> {
    match self {
      SyncOutcome::Moved(offset) | SyncOutcome::Extended(offset) => Some(offset),
      SyncOutcome::Unknown | SyncOutcome::Suppressed => None,
    }
  }
}

#[derive(Debug, Default)]
pub struct Suppression(Cell<bool>);

impl Suppression {
  pub fn is_held(&self) -> bool {
    self.0.get()
  }

  /// `None` if the flag is already held.
  pub fn try_acquire(&self) -> Option<SuppressGuard<'_>> {
    if self.0.replace(true) {
      return None;
    }
    Some(SuppressGuard { flag: &self.0 })
  }
}

#[must_use]
#[derive(Debug)]
pub struct SuppressGuard<'a> {
  flag: &'a Cell<bool>,
}

impl Drop for SuppressGuard<'_> {
  fn drop(&mut self) {
    self.flag.set(false);
  }
}

#[derive(Debug, Default)]
pub struct CursorSync {
  locator:     Locator,
  config:      SyncConfig,
  suppression: Suppression,
}

impl CursorSync {
  pub fn new(config: &Config) -> Self {
    Self {
      locator:     Locator::new(config.locate.clone()),
      config:      config.sync.clone(),
      suppression: Suppression::default(),
    }
  }

  pub fn locator(&self) -> &Locator {
    &self.locator
  }

  pub fn is_suppressed(&self) -> bool {
    self.suppression.is_held()
  }

  /// Mirrors the cursor of `moved` into `other`.
  pub fn sync<M, O>(&self, moved: &M, other: &mut O) -> SyncOutcome
  where
    M: SyncView + ?Sized,
    O: SyncView + ?Sized,
  {
    let Some(_guard) = self.suppression.try_acquire() else {
      tracing::trace!("sync: suppressed nested sync");
      return SyncOutcome::Suppressed;
    };

    let cursor = moved.cursor();
    let search = moved.text();
    let locus = select_window(search, cursor.head, moved.segmentation());

    let Some(offset) = self.locator.locate_refined(search, locus, other.text()) else {
      tracing::debug!(head = cursor.head, "sync: no unique match, locking other view");
      other.set_editable(false);
      return SyncOutcome::Unknown;
    };

    let outcome = if cursor.is_empty() {
      let range = match self.config.target_select {
        TargetSelect::Cursor => Range::point(offset),
        TargetSelect::Line => Range::line_at(other.text(), offset),
      };
      other.set_cursor(range);
      SyncOutcome::Moved(offset)
    } else {
      let range = other.cursor().put_head(offset);
      other.set_cursor(range);
      SyncOutcome::Extended(offset)
    };
    other.set_editable(true);

    tracing::debug!(head = cursor.head, ?outcome, "sync: done");
    outcome
  }
}

/// A source document and its rendering, synced in both directions.
#[derive(Debug)]
pub struct SyncPair {
  source:   Document,
  rendered: Document,
  sync:     CursorSync,
}

impl SyncPair {
  /// The documents start out named `source` and `rendered`.
  pub fn new(source: Rope, rendered: Rope, config: &Config) -> Self {
    let mut source = Document::new(DocumentId::new(NonZeroUsize::MIN), source)
      .with_segmentation(config.sync.source_window.into());
    source.set_display_name("source");
    let mut rendered = Document::new(DocumentId::new(NonZeroUsize::MIN.saturating_add(1)), rendered)
      .with_segmentation(config.sync.rendered_window.into());
    rendered.set_display_name("rendered");
    Self {
      source,
      rendered,
      sync: CursorSync::new(config),
    }
  }

  pub fn source(&self) -> &Document {
    &self.source
  }

  pub fn source_mut(&mut self) -> &mut Document {
    &mut self.source
  }

  pub fn rendered(&self) -> &Document {
    &self.rendered
  }

  pub fn rendered_mut(&mut self) -> &mut Document {
    &mut self.rendered
  }

  pub fn cursor_sync(&self) -> &CursorSync {
    &self.sync
  }

  /// Moves the source cursor and mirrors it into the rendered view.
  pub fn set_source_cursor(&mut self, range: Range) -> Result<SyncOutcome> {
    self.source.set_selection(range)?;
    Ok(self.source_cursor_moved())
  }

  /// Moves the rendered cursor and mirrors it into the source view.
  pub fn set_rendered_cursor(&mut self, range: Range) -> Result<SyncOutcome> {
    self.rendered.set_selection(range)?;
    Ok(self.rendered_cursor_moved())
  }

  pub fn source_cursor_moved(&mut self) -> SyncOutcome {
    self.sync.sync(&self.source, &mut self.rendered)
  }

  pub fn rendered_cursor_moved(&mut self) -> SyncOutcome {
    self.sync.sync(&self.rendered, &mut self.source)
  }

  /// Swaps in a fresh rendering and re-syncs it from the source cursor.
  pub fn rerender(&mut self, rendered: Rope) -> SyncOutcome {
    self.rendered.set_text(rendered);
    self.source_cursor_moved()
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::RefCell,
    panic::{
      AssertUnwindSafe,
      catch_unwind,
    },
  };

  use super::*;

  fn doc(text: &str) -> Document {
    Document::new(DocumentId::new(NonZeroUsize::MIN), Rope::from(text))
  }

  #[test]
  fn cursor_moves_other_view() {
    let sync = CursorSync::default();
    let mut source = doc("# The user manual\nx = 1\n");
    let mut rendered = doc("The user manual\n");
    source.set_selection(Range::point(6)).unwrap();

    let outcome = sync.sync(&source, &mut rendered);
    assert_eq!(outcome, SyncOutcome::Moved(4));
    assert_eq!(rendered.selection(), Range::point(4));
    assert!(rendered.is_editable());
    assert!(!sync.is_suppressed());
  }

  #[test]
  fn selection_extends_other_view() {
    let sync = CursorSync::default();
    let mut source = doc("# The user manual\n");
    let mut rendered = doc("The user manual\n");
    rendered.set_selection(Range::point(1)).unwrap();
    source.set_selection(Range::new(2, 10)).unwrap();

    let outcome = sync.sync(&source, &mut rendered);
    assert_eq!(outcome, SyncOutcome::Extended(8));
    assert_eq!(rendered.selection(), Range::new(1, 8));
  }

  #[test]
  fn unknown_locks_other_view() {
    let sync = CursorSync::default();
    let source = doc("zzzz qqqq xxxx");
    let mut rendered = doc("abcdefgh ijklmnop");
    rendered.set_selection(Range::point(3)).unwrap();

    assert_eq!(sync.sync(&source, &mut rendered), SyncOutcome::Unknown);
    assert!(!rendered.is_editable());
    assert_eq!(rendered.selection(), Range::point(3));
  }

  #[test]
  fn target_select_line() {
    let config = Config {
      sync: SyncConfig {
        target_select: TargetSelect::Line,
        ..SyncConfig::default()
      },
      ..Config::default()
    };
    let sync = CursorSync::new(&config);
    let mut source = doc("# first line\n# second line\n");
    let mut rendered = doc("first line\nsecond line\n");
    source.set_selection(Range::point(18)).unwrap();

    assert_eq!(sync.sync(&source, &mut rendered), SyncOutcome::Moved(14));
    assert_eq!(rendered.selection(), Range::new(11, 22));
  }

  /// A view whose cursor notification syncs straight back, like an editor
  /// widget that reports programmatic cursor moves.
  struct Echoing<'a> {
    doc:    Document,
    sync:   &'a CursorSync,
    echoes: RefCell<Vec<SyncOutcome>>,
  }

  impl SyncView for Echoing<'_> {
    fn text(&self) -> RopeSlice<'_> {
      self.doc.text().slice(..)
    }

    fn cursor(&self) -> Range {
      self.doc.selection()
    }

    fn set_cursor(&mut self, range: Range) {
      SyncView::set_cursor(&mut self.doc, range);
      let mut back = doc("The user manual");
      let echo = self.sync.sync(&self.doc, &mut back);
      self.echoes.borrow_mut().push(echo);
    }

    fn set_editable(&mut self, editable: bool) {
      self.doc.set_editable(editable);
    }

    fn segmentation(&self) -> &Segmentation {
      self.doc.segmentation()
    }
  }

  #[test]
  fn nested_sync_is_suppressed() {
    let sync = CursorSync::default();
    let mut source = doc("# The user manual");
    source.set_selection(Range::point(6)).unwrap();
    let mut rendered = Echoing {
      doc:    doc("The user manual"),
      sync:   &sync,
      echoes: RefCell::new(Vec::new()),
    };

    assert_eq!(sync.sync(&source, &mut rendered), SyncOutcome::Moved(4));
    assert_eq!(rendered.echoes.into_inner(), vec![SyncOutcome::Suppressed]);
    assert!(!sync.is_suppressed());
  }

  struct Exploding(Document);

  impl SyncView for Exploding {
    fn text(&self) -> RopeSlice<'_> {
      self.0.text().slice(..)
    }

    fn cursor(&self) -> Range {
      self.0.selection()
    }

    fn set_cursor(&mut self, _range: Range) {
      panic!("view went away");
    }

    fn set_editable(&mut self, _editable: bool) {}

    fn segmentation(&self) -> &Segmentation {
      self.0.segmentation()
    }
  }

  #[test]
  fn suppression_released_on_unwind() {
    let sync = CursorSync::default();
    let source = doc("same text");
    let mut other = Exploding(doc("same text"));

    let result = catch_unwind(AssertUnwindSafe(|| sync.sync(&source, &mut other)));
    assert!(result.is_err());
    assert!(!sync.is_suppressed());
  }

  #[test]
  fn guard_is_exclusive() {
    let suppression = Suppression::default();
    let guard = suppression.try_acquire();
    assert!(guard.is_some());
    assert!(suppression.try_acquire().is_none());
    drop(guard);
    assert!(suppression.try_acquire().is_some());
  }

  #[test]
  fn outcome_offset() {
    assert_eq!(SyncOutcome::Moved(3).offset(), Some(3));
    assert_eq!(SyncOutcome::Extended(7).offset(), Some(7));
    assert_eq!(SyncOutcome::Unknown.offset(), None);
    assert_eq!(SyncOutcome::Suppressed.offset(), None);
  }
}
