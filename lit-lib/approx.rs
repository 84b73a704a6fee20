//! Approximate substring search with a bounded number of edit errors.
//!
//! This module finds every place a pattern occurs in a text while tolerating
//! up to `k` insertions, deletions or substitutions. It backs the
//! [`locate`](crate::locate) module, which needs *all* acceptable occurrences
//! so that it can tell a unique match from an ambiguous one.
//!
//! # Algorithm
//!
//! [`Agrep`] runs the k-differences dynamic program column by column over the
//! text (any text position may begin a match, so row zero of every column is
//! `0`). Only the prefix of the column that can still be within `k` is
//! updated; everything below the last active row is known to exceed the bound
//! and is left alone.
//!
//! Each contiguous run of text positions at which the whole pattern matches
//! within the bound is one occurrence. Its end is the cheapest position of the
//! run, and its start is recovered by a short reverse pass over at most
//! `pattern_len + k` characters. Scanning resumes at the chosen end, so
//! reported matches never overlap.
//!
//! # Boundaries
//!
//! With `extend_to_boundary` set, the reported range covers the whole aligned
//! span, so `range.start` lines up with the first pattern character. Without
//! it, leading and trailing text characters that were only substituted for a
//! pattern character are trimmed, leaving the first and last characters that
//! matched exactly.
//!
//! # Examples
//!
//! ```
//! use lit_lib::approx::{Agrep, ApproxSearch};
//! use ropey::Rope;
//!
//! let pattern = Rope::from("user manual");
//! let text = Rope::from("The CodeChat usr manual gives");
//!
//! let agrep = Agrep::default();
//! let compiled = agrep.compile(pattern.slice(..), 1);
//! let matches = agrep.search(&compiled, text.slice(..), true);
//!
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].start, 13);
//! assert_eq!(matches[0].cost, 1);
//! ```

use std::cmp::Ordering;

use lit_core::chars::fold_whitespace;
use ropey::RopeSlice;
use serde::{
  Deserialize,
  Serialize,
};
use smallvec::SmallVec;

/// How characters are compared while matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CharFold {
  /// Characters must be identical.
  Exact,
  /// Horizontal whitespace of any kind compares equal to a plain space.
  #[default]
  Whitespace,
}

impl CharFold {
  #[inline]
  pub fn apply(self, ch: char) -> char {
    match self {
      CharFold::Exact => ch,
      CharFold::Whitespace => fold_whitespace(ch),
    }
  }

  /// Compares two slices char by char under this fold.
  pub fn eq_slices(self, a: RopeSlice, b: RopeSlice) -> bool {
    a.len_chars() == b.len_chars() && a.chars().map(|c| self.apply(c)).eq(b.chars().map(|c| self.apply(c)))
  }
}

/// One occurrence of a pattern, as char offsets into the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRange {
  pub start: usize,
  pub end:   usize,
  /// Number of edits in the alignment.
  pub cost:  usize,
}

impl MatchRange {
  #[inline]
  pub fn len(&self) -> usize {
    self.end - self.start
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }
}

pub type Matches = SmallVec<[MatchRange; 2]>;

/// A fuzzy substring search engine.
///
/// Implementations must report every non-overlapping occurrence within the
/// compiled error bound, in text order. An empty result means no match.
pub trait ApproxSearch {
  type Compiled;

  fn compile(&self, pattern: RopeSlice, max_errors: usize) -> Self::Compiled;

  fn search(&self, compiled: &Self::Compiled, text: RopeSlice, extend_to_boundary: bool) -> Matches;
}

/// Pattern prepared for [`Agrep::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
  chars:      Vec<char>,
  max_errors: usize,
}

impl CompiledPattern {
  pub fn len(&self) -> usize {
    self.chars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.chars.is_empty()
  }

  pub fn max_errors(&self) -> usize {
    self.max_errors
  }
}

/// The default k-differences engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Agrep {
  fold: CharFold,
}

impl Agrep {
  pub fn new(fold: CharFold) -> Self {
    Self { fold }
  }

  pub fn fold(&self) -> CharFold {
    self.fold
  }

  /// Scans forward from `from` and returns the cheapest end of the first run
  /// of positions where the whole pattern matches, with its cost.
  fn next_end(&self, pattern: &CompiledPattern, text: RopeSlice, from: usize) -> Option<(usize, usize)> {
    let m = pattern.len();
    let k = pattern.max_errors;
    // Values above `k` are only ever compared against `k`, so they are
    // clamped to `k + 1`.
    let over = k + 1;
    let mut col: Vec<usize> = (0..=m).map(|i| i.min(over)).collect();
    let mut last = k.min(m);
    let mut best: Option<(usize, usize)> = None;

    for (offset, ch) in text.chars_at(from).enumerate() {
      let ch = self.fold.apply(ch);
      if last < m {
        col[last + 1] = over;
      }
      let top = (last + 1).min(m);

      let mut diag = col[0];
      for i in 1..=top {
        let up = col[i];
        let cell = if pattern.chars[i - 1] == ch {
          diag
        } else {
          1 + diag.min(up).min(col[i - 1])
        };
        col[i] = cell.min(over);
        diag = up;
      }

      last = top;
      while last > 0 && col[last] > k {
        last -= 1;
      }

      if last == m {
        let cost = col[m];
        if cost == 0 {
          return Some((from + offset + 1, 0));
        }
        if best.is_none_or(|(_, best_cost)| cost < best_cost) {
          best = Some((from + offset + 1, cost));
        }
      } else if best.is_some() {
        return best;
      }
    }

    best
  }

  /// Finds the cheapest start for an occurrence ending at `end`, never
  /// reaching before `floor`.
  fn start_for(&self, pattern: &CompiledPattern, text: RopeSlice, floor: usize, end: usize) -> (usize, usize) {
    let m = pattern.len();
    let k = pattern.max_errors;
    let lo = floor.max(end.saturating_sub(m + k));
    let window: Vec<char> = text.slice(lo..end).chars().map(|c| self.fold.apply(c)).collect();

    // Edit distance between the reversed pattern and the reversed text
    // suffix of length `len`.
    let mut col: Vec<usize> = (0..=m).collect();
    let mut best = (end, usize::MAX);
    for (len, &ch) in (1..).zip(window.iter().rev()) {
      let mut diag = col[0];
      col[0] = len;
      for i in 1..=m {
        let up = col[i];
        let cell = if pattern.chars[m - i] == ch {
          diag
        } else {
          1 + diag.min(up).min(col[i - 1])
        };
        col[i] = cell;
        diag = up;
      }

      let cost = col[m];
      let start = end - len;
      let better = match cost.cmp(&best.1) {
        Ordering::Less => true,
        Ordering::Equal => len.abs_diff(m) <= (end - best.0).abs_diff(m),
        Ordering::Greater => false,
      };
      if better {
        best = (start, cost);
      }

      // Column minima never decrease as the span grows.
      if col.iter().min().is_some_and(|&min| min > best.1) {
        break;
      }
    }

    best
  }

  /// Narrows `start..end` to the first and last text characters that an
  /// optimal alignment pairs with an identical pattern character.
  fn trim(&self, pattern: &CompiledPattern, text: RopeSlice, start: usize, end: usize) -> (usize, usize) {
    let span: Vec<char> = text.slice(start..end).chars().map(|c| self.fold.apply(c)).collect();
    let m = pattern.len();
    let n = span.len();

    let width = n + 1;
    let mut dp = vec![0usize; (m + 1) * width];
    for i in 0..=m {
      dp[i * width] = i;
    }
    for j in 0..=n {
      dp[j] = j;
    }
    for i in 1..=m {
      for j in 1..=n {
        let sub = dp[(i - 1) * width + j - 1] + usize::from(pattern.chars[i - 1] != span[j - 1]);
        let del = dp[(i - 1) * width + j] + 1;
        let ins = dp[i * width + j - 1] + 1;
        dp[i * width + j] = sub.min(del).min(ins);
      }
    }

    let (mut i, mut j) = (m, n);
    let mut first = None;
    let mut last = None;
    while i > 0 && j > 0 {
      let here = dp[i * width + j];
      let diag = dp[(i - 1) * width + j - 1];
      if pattern.chars[i - 1] == span[j - 1] && here == diag {
        last.get_or_insert(j - 1);
        first = Some(j - 1);
        i -= 1;
        j -= 1;
      } else if here == diag + 1 {
        i -= 1;
        j -= 1;
      } else if here == dp[i * width + j - 1] + 1 {
        j -= 1;
      } else {
        i -= 1;
      }
    }

    match (first, last) {
      (Some(first), Some(last)) => (start + first, start + last + 1),
      _ => (start, end),
    }
  }
}

impl ApproxSearch for Agrep {
  type Compiled = CompiledPattern;

  /// `max_errors` is capped at one less than the pattern length, since a
  /// bound that large would match at every position.
  fn compile(&self, pattern: RopeSlice, max_errors: usize) -> CompiledPattern {
    let chars: Vec<char> = pattern.chars().map(|c| self.fold.apply(c)).collect();
    let max_errors = max_errors.min(chars.len().saturating_sub(1));
    CompiledPattern { chars, max_errors }
  }

  fn search(&self, compiled: &CompiledPattern, text: RopeSlice, extend_to_boundary: bool) -> Matches {
    let mut matches = Matches::new();
    if compiled.is_empty() {
      return matches;
    }

    let len = text.len_chars();
    let mut from = 0;
    while from < len {
      let Some((end, _)) = self.next_end(compiled, text, from) else {
        break;
      };
      let (start, cost) = self.start_for(compiled, text, from, end);
      let (start, end_trimmed) = if extend_to_boundary {
        (start, end)
      } else {
        self.trim(compiled, text, start, end)
      };
      matches.push(MatchRange {
        start,
        end: end_trimmed,
        cost,
      });
      from = end;
    }

    matches
  }
}
