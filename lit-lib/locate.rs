//! Map a position in one text to the corresponding position in another.
//!
//! The two texts are different renderings of the same material: a source file
//! and the document produced from it. The text around the position in the
//! search text (the *window*) is looked up approximately in the target text.
//! A lookup succeeds only when the window occurs exactly once within the
//! tolerance, and the part of the window before the position lines up with the
//! target character for character.
//!
//! ```text
//! search: "# The CodeChat user manual"        window = whole line, point = 9
//!                  ^
//! target: "The CodeChat user manual"          found = 7
//!                 ^
//! ```
//!
//! # Tolerance
//!
//! Without an explicit bound, the number of allowed edits grows with the
//! window length (see [`LocateConfig::default_mismatches`]). When a search is
//! ambiguous, the tolerance is lowered one step at a time and the search
//! repeated, as long as it stays at or above `retry_floor`.
//!
//! # Refinement
//!
//! [`Locator::locate_refined`] retries a failed lookup with narrower windows:
//! first it moves the window start toward the point, halving the gap each
//! time, then it does the same with the window end. This finds positions whose
//! surroundings differ between the texts, such as comment markers that only
//! exist in the source.

use std::ops::Range;

use ropey::RopeSlice;
use thiserror::Error;

use crate::{
  approx::{
    Agrep,
    ApproxSearch,
  },
  config::LocateConfig,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocusError {
  #[error("window {start}..{end} is inverted")]
  InvertedWindow { start: usize, end: usize },
  #[error("point {point} lies outside window {start}..{end}")]
  PointOutsideWindow {
    point: usize,
    start: usize,
    end:   usize,
  },
}

pub type Result<T> = std::result::Result<T, LocusError>;

/// A position in a text plus the window around it to search for.
///
/// Always `window_start <= point <= window_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLocus {
  point:        usize,
  window_start: usize,
  window_end:   usize,
}

impl SearchLocus {
  pub fn new(point: usize, window_start: usize, window_end: usize) -> Result<Self> {
    if window_start > window_end {
      return Err(LocusError::InvertedWindow {
        start: window_start,
        end:   window_end,
      });
    }
    if point < window_start || point > window_end {
      return Err(LocusError::PointOutsideWindow {
        point,
        start: window_start,
        end: window_end,
      });
    }
    Ok(Self {
      point,
      window_start,
      window_end,
    })
  }

  /// Builds a locus from a window, widening it to cover `point` if needed.
  pub(crate) fn spanning(point: usize, window: Range<usize>) -> Self {
    Self {
      point,
      window_start: window.start.min(point),
      window_end: window.end.max(point),
    }
  }

  /// The whole text as the window. `point` is clamped to the text.
  pub fn whole(text: RopeSlice, point: usize) -> Self {
    let len = text.len_chars();
    Self::spanning(point.min(len), 0..len)
  }

  /// Up to `radius` chars on either side of `point`, clamped to the text.
  pub fn around(text: RopeSlice, point: usize, radius: usize) -> Self {
    let len = text.len_chars();
    let point = point.min(len);
    Self::spanning(
      point,
      point.saturating_sub(radius)..point.saturating_add(radius).min(len),
    )
  }

  #[inline]
  pub fn point(&self) -> usize {
    self.point
  }

  #[inline]
  pub fn window_start(&self) -> usize {
    self.window_start
  }

  #[inline]
  pub fn window_end(&self) -> usize {
    self.window_end
  }

  #[inline]
  pub fn window(&self) -> Range<usize> {
    self.window_start..self.window_end
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.window_start == self.window_end
  }

  /// Chars of the window that precede the point.
  #[inline]
  pub fn match_len(&self) -> usize {
    self.point - self.window_start
  }

  fn with_window_start(self, window_start: usize) -> Self {
    Self {
      window_start,
      ..self
    }
  }

  fn with_window_end(self, window_end: usize) -> Self {
    Self { window_end, ..self }
  }
}

/// Runs lookups with a fixed configuration and search engine.
#[derive(Debug, Clone)]
pub struct Locator<S = Agrep> {
  config: LocateConfig,
  engine: S,
}

impl Default for Locator {
  fn default() -> Self {
    Self::new(LocateConfig::default())
  }
}

impl Locator {
  pub fn new(config: LocateConfig) -> Self {
    let engine = Agrep::new(config.fold);
    Self { config, engine }
  }
}

impl<S: ApproxSearch> Locator<S> {
  pub fn with_engine(config: LocateConfig, engine: S) -> Self {
    Self { config, engine }
  }

  pub fn config(&self) -> &LocateConfig {
    &self.config
  }

  pub fn engine(&self) -> &S {
    &self.engine
  }

  /// Finds the position in `target` that corresponds to `locus.point()` in
  /// `search`.
  ///
  /// Returns `None` when the window is empty, lies past the end of `search`,
  /// has no match or several matches in `target`, or when the part before the
  /// point does not line up exactly with the match.
  pub fn locate(
    &self,
    search: RopeSlice,
    locus: SearchLocus,
    target: RopeSlice,
    max_mismatches: Option<usize>,
  ) -> Option<usize> {
    if locus.is_empty() {
      tracing::trace!("locate: empty window");
      return None;
    }
    if locus.window_end() > search.len_chars() {
      tracing::trace!(
        window_end = locus.window_end(),
        len = search.len_chars(),
        "locate: window past end of search text"
      );
      return None;
    }

    let needle = search.slice(locus.window());
    // A tolerance of the full needle length matches anywhere.
    let mut mismatches = max_mismatches
      .unwrap_or_else(|| self.config.default_mismatches(needle.len_chars()))
      .min(needle.len_chars() - 1);

    let start = loop {
      let compiled = self.engine.compile(needle, mismatches);
      let matches = self.engine.search(&compiled, target, true);
      match matches.as_slice() {
        [] => {
          tracing::trace!(mismatches, "locate: no match");
          return None;
        },
        [found] => break found.start,
        many if mismatches >= self.config.retry_floor && mismatches > 0 => {
          tracing::trace!(
            mismatches,
            count = many.len(),
            "locate: ambiguous, lowering tolerance"
          );
          mismatches -= 1;
        },
        many => {
          tracing::trace!(mismatches, count = many.len(), "locate: ambiguous");
          return None;
        },
      }
    };

    let match_len = locus.match_len();
    let end = start + match_len;
    if end > target.len_chars() {
      tracing::trace!(start, match_len, "locate: match runs past end of target");
      return None;
    }

    if !self
      .config
      .fold
      .eq_slices(needle.slice(..match_len), target.slice(start..end))
    {
      tracing::trace!(start, match_len, "locate: prefix differs from target");
      return None;
    }

    Some(end)
  }

  /// [`Self::locate`] with the default tolerance, falling back to narrower
  /// windows when `refine` is enabled.
  pub fn locate_refined(
    &self,
    search: RopeSlice,
    locus: SearchLocus,
    target: RopeSlice,
  ) -> Option<usize> {
    if let Some(found) = self.locate(search, locus, target, None) {
      return Some(found);
    }
    if !self.config.refine {
      return None;
    }

    let point = locus.point();

    let mut start = locus.window_start();
    while start < point {
      start += ((point - start) / 2).max(1);
      let narrowed = locus.with_window_start(start);
      if let Some(found) = self.locate(search, narrowed, target, None) {
        tracing::trace!(window = ?narrowed.window(), "locate: found after narrowing start");
        return Some(found);
      }
    }

    let mut end = locus.window_end();
    while end > point {
      end -= ((end - point) / 2).max(1);
      let narrowed = locus.with_window_end(end);
      if let Some(found) = self.locate(search, narrowed, target, None) {
        tracing::trace!(window = ?narrowed.window(), "locate: found after narrowing end");
        return Some(found);
      }
    }

    None
  }

  /// Looks up `anchor` using a window of `radius` chars on each side.
  pub fn locate_near(&self, search: RopeSlice, anchor: usize, target: RopeSlice) -> Option<usize> {
    let locus = SearchLocus::around(search, anchor, self.config.radius);
    self.locate_refined(search, locus, target)
  }
}

/// [`Locator::locate`] with the default configuration.
pub fn locate(
  search: RopeSlice,
  locus: SearchLocus,
  target: RopeSlice,
  max_mismatches: Option<usize>,
) -> Option<usize> {
  Locator::default().locate(search, locus, target, max_mismatches)
}

/// [`Locator::locate_near`] with the default configuration.
pub fn locate_near(search: RopeSlice, anchor: usize, target: RopeSlice) -> Option<usize> {
  Locator::default().locate_near(search, anchor, target)
}

#[cfg(test)]
mod tests {
  use ropey::Rope;

  use std::cell::Cell;

  use super::*;
  use crate::approx::{
    CharFold,
    CompiledPattern,
    Matches,
  };

  /// Counts how many times the locator compiles a pattern.
  #[derive(Default)]
  struct CountingAgrep {
    inner:    Agrep,
    compiles: Cell<usize>,
  }

  impl ApproxSearch for CountingAgrep {
    type Compiled = CompiledPattern;

    fn compile(&self, pattern: RopeSlice, max_errors: usize) -> CompiledPattern {
      self.compiles.set(self.compiles.get() + 1);
      self.inner.compile(pattern, max_errors)
    }

    fn search(&self, compiled: &CompiledPattern, text: RopeSlice, extend_to_boundary: bool) -> Matches {
      self.inner.search(compiled, text, extend_to_boundary)
    }
  }

  fn whole(search: &str, point: usize, target: &str) -> Option<usize> {
    let search = Rope::from(search);
    let target = Rope::from(target);
    let locus = SearchLocus::whole(search.slice(..), point);
    locate(search.slice(..), locus, target.slice(..), None)
  }

  fn near(search: &str, anchor: usize, target: &str) -> Option<usize> {
    let search = Rope::from(search);
    let target = Rope::from(target);
    locate_near(search.slice(..), anchor, target.slice(..))
  }

  #[test]
  fn locus_validation() {
    assert!(SearchLocus::new(3, 0, 5).is_ok());
    assert!(SearchLocus::new(0, 0, 0).is_ok());
    assert_eq!(
      SearchLocus::new(2, 5, 3),
      Err(LocusError::InvertedWindow { start: 5, end: 3 })
    );
    assert_eq!(
      SearchLocus::new(9, 0, 5),
      Err(LocusError::PointOutsideWindow {
        point: 9,
        start: 0,
        end:   5,
      })
    );
  }

  #[test]
  fn locus_around_clamps() {
    let text = Rope::from("short");
    let locus = SearchLocus::around(text.slice(..), 2, 20);
    assert_eq!(locus.window(), 0..5);
    assert_eq!(locus.point(), 2);
    assert_eq!(locus.match_len(), 2);

    let locus = SearchLocus::around(text.slice(..), 99, 1);
    assert_eq!(locus.point(), 5);
    assert_eq!(locus.window(), 4..5);
  }

  #[test]
  fn identical_texts() {
    assert_eq!(whole("test", 2, "test"), Some(2));
    assert_eq!(whole("test", 0, "test"), Some(0));
    assert_eq!(whole("test", 4, "test"), Some(4));
  }

  #[test]
  fn empty_window_is_not_found() {
    assert_eq!(whole("", 0, "test"), None);

    let search = Rope::from("test");
    let target = Rope::from("test");
    let locus = SearchLocus::new(2, 2, 2).unwrap();
    assert_eq!(
      locate(search.slice(..), locus, target.slice(..), None),
      None
    );
  }

  #[test]
  fn window_past_end_is_not_found() {
    let search = Rope::from("abc");
    let target = Rope::from("abc");
    let locus = SearchLocus::new(1, 0, 10).unwrap();
    assert_eq!(
      locate(search.slice(..), locus, target.slice(..), None),
      None
    );
  }

  #[test]
  fn ambiguous_is_not_found() {
    // Two exact copies stay ambiguous at every tolerance.
    assert_eq!(whole("test", 2, "test test"), None);
  }

  #[test]
  fn near_duplicates() {
    // An exact copy and a copy with one edit qualify at tolerance 2 and at 1.
    // Only tolerance 0 would tell them apart, and retries stop at 1.
    assert_eq!(whole("abcdefghij", 3, "abcdefghij abcdefghiX"), None);

    // The second copy is three edits away, so it never qualifies.
    let search = Rope::from("abcdefghij");
    let target = Rope::from("abcdefghij abcdXXghiX");
    let locus = SearchLocus::whole(search.slice(..), 3);
    assert_eq!(
      locate(search.slice(..), locus, target.slice(..), Some(2)),
      Some(3)
    );
  }

  #[test]
  fn lower_tolerance_resolves_ambiguity() {
    // 15 chars give a tolerance of 3, which also admits the copy with three
    // substitutions. One step lower only the exact copy is left.
    assert_eq!(
      whole("abcdefghijklmno", 3, "abcdefghijklmno abcXefXhijXlmno"),
      Some(3)
    );
  }

  #[test]
  fn prefix_must_match_exactly() {
    // The match itself is within tolerance, but the char before the point
    // differs.
    assert_eq!(whole("abcdefghij", 3, "abXdefghij"), None);
    // After the point differences are fine.
    assert_eq!(whole("abcdefghij", 3, "abcdefgXij"), Some(3));
  }

  #[test]
  fn whitespace_fold_in_prefix() {
    assert_eq!(whole("a b c d e f", 4, "a\u{00A0}b c d e f"), Some(4));

    let config = LocateConfig {
      fold: CharFold::Exact,
      refine: false,
      ..LocateConfig::default()
    };
    let locator = Locator::new(config);
    let search = Rope::from("a b c d e f");
    let target = Rope::from("a\u{00A0}b c d e f");
    let locus = SearchLocus::whole(search.slice(..), 4);
    assert_eq!(
      locator.locate(search.slice(..), locus, target.slice(..), None),
      None
    );
  }

  #[test]
  fn explicit_tolerance_is_used() {
    let search = Rope::from("# test");
    let target = Rope::from("test");
    let locus = SearchLocus::whole(search.slice(..), 4);
    assert_eq!(
      locate(search.slice(..), locus, target.slice(..), None),
      None
    );
    assert_eq!(
      locate(search.slice(..), locus, target.slice(..), Some(2)),
      None,
      "the marker chars before the point differ"
    );
  }

  #[test]
  fn anchor_in_identical_text() {
    assert_eq!(near("test", 2, "test"), Some(2));
  }

  #[test]
  fn anchor_past_comment_marker() {
    assert_eq!(near("# test", 4, "test"), Some(2));
    assert_eq!(near("// test", 5, "test"), Some(2));
  }

  #[test]
  fn anchor_on_second_line() {
    assert_eq!(near("test\ntest", 4, "test\ntest"), Some(4));
    assert_eq!(near("# test\n# test", 6, "test\ntest"), Some(4));
  }

  #[test]
  fn anchor_in_long_sentence() {
    let search = "# The :doc:`README` user manual gives a broad overview of this system. In \
                  contrast, this document discusses the implementation specifics of the \
                  CodeChat system.";
    let target = "The CodeChat user manual gives a broad overview of this system. In contrast, \
                  this document discusses the implementation specifics of the CodeChat system.";
    assert_eq!(near(search, 39, target), Some(32));
  }

  #[test]
  fn refinement_can_be_disabled() {
    let locator = Locator::new(LocateConfig {
      refine: false,
      ..LocateConfig::default()
    });
    let search = Rope::from("# test");
    let target = Rope::from("test");
    assert_eq!(
      locator.locate_near(search.slice(..), 4, target.slice(..)),
      None
    );
  }

  #[test]
  fn oversized_tolerance_is_capped_before_retrying() {
    let locator = Locator::with_engine(LocateConfig::default(), CountingAgrep::default());
    let search = Rope::from("ab");
    let target = Rope::from("ab ab");
    let locus = SearchLocus::whole(search.slice(..), 1);

    let found = locator.locate(search.slice(..), locus, target.slice(..), Some(usize::MAX));
    assert_eq!(found, None);
    // Capped to 1, which is already below the retry floor.
    assert_eq!(locator.engine().compiles.get(), 1);
  }

  #[test]
  fn ambiguous_retries_step_down_from_capped_tolerance() {
    let locator = Locator::with_engine(LocateConfig::default(), CountingAgrep::default());
    let search = Rope::from("abcdefghij");
    let target = Rope::from("abcdefghij abcdefghij");
    let locus = SearchLocus::whole(search.slice(..), 3);

    let found = locator.locate(search.slice(..), locus, target.slice(..), Some(1_000_000));
    assert_eq!(found, None);
    // Tolerances 9 down to 1.
    assert_eq!(locator.engine().compiles.get(), 9);
  }

  quickcheck::quickcheck! {
    fn duplicated_needle_is_never_resolved(
      needle: String,
      before: String,
      between: String,
      after: String,
      point: usize
    ) -> bool {
      let len = needle.chars().count();
      if len == 0 {
        return true;
      }
      let target = format!("{before}{needle}{between}{needle}{after}");
      whole(&needle, point % (len + 1), &target).is_none()
    }

    fn repeated_calls_agree(search: String, target: String, anchor: usize) -> bool {
      let len = search.chars().count();
      let anchor = anchor % (len + 1);
      near(&search, anchor, &target) == near(&search, anchor, &target)
    }

    fn text_locates_itself(text: String, k: usize) -> bool {
      let len = text.chars().count();
      if len == 0 {
        return true;
      }
      let point = k % (len + 1);
      whole(&text, point, &text) == Some(point)
    }
  }
}
