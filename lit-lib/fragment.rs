//! Choosing the search window around a cursor.
//!
//! Each view splits its text into fragments in its own way. A source buffer
//! is naturally split into lines. A rendered document is split into the text
//! runs its renderer produced (paragraphs, list items, table cells), which are
//! known only to the view itself. When nothing better is available, a fixed
//! radius around the cursor works for any text.

use std::ops::Range;

use lit_core::line_ending::line_span;
use ropey::RopeSlice;

use crate::locate::SearchLocus;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Segmentation {
  /// The line containing the point, without its line ending.
  #[default]
  Lines,
  /// Explicit fragments as char ranges.
  Runs(Vec<Range<usize>>),
  /// Up to this many chars on either side of the point.
  Radius(usize),
}

/// The search locus for `point` in `text` under `segmentation`.
///
/// The point is clamped to the text, and the window always contains it.
pub fn select_window(text: RopeSlice, point: usize, segmentation: &Segmentation) -> SearchLocus {
  let len = text.len_chars();
  let point = point.min(len);
  match segmentation {
    Segmentation::Lines => SearchLocus::spanning(point, enclosing_line(text, point)),
    Segmentation::Runs(runs) => {
      let window = enclosing_run(runs, point).map_or(point..point, |run| run.start.min(len)..run.end.min(len));
      SearchLocus::spanning(point, window)
    },
    Segmentation::Radius(radius) => SearchLocus::around(text, point, *radius),
  }
}

/// The line containing `point`. An empty line has nothing to search for, so
/// the nearest non-empty line above it is used instead.
fn enclosing_line(text: RopeSlice, point: usize) -> Range<usize> {
  let line = text.char_to_line(point);
  (0..=line)
    .rev()
    .map(|line| line_span(&text, line))
    .find(|span| !span.is_empty())
    .unwrap_or(point..point)
}

/// The first run containing `point`, else the last run ending at or before it.
fn enclosing_run(runs: &[Range<usize>], point: usize) -> Option<&Range<usize>> {
  runs
    .iter()
    .find(|run| run.start <= point && point <= run.end)
    .or_else(|| {
      runs
        .iter()
        .filter(|run| run.end <= point)
        .max_by_key(|run| run.end)
    })
}
