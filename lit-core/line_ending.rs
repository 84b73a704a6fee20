use std::ops::Range;

use ropey::RopeSlice;

/// Line endings recognised by ropey with its default `unicode_lines` feature.
///
/// Line boundaries computed here must agree with `RopeSlice::char_to_line`, so
/// every separator ropey breaks on is listed.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineEnding {
  /// CarriageReturn followed by LineFeed.
  Crlf,
  /// U+000A -- LineFeed
  LF,
  /// U+000B -- VerticalTab
  VT,
  /// U+000C -- FormFeed
  FF,
  /// U+000D -- CarriageReturn
  CR,
  /// U+0085 -- NextLine
  Nel,
  /// U+2028 -- Line Separator
  LS,
  /// U+2029 -- ParagraphSeparator
  PS,
}

impl LineEnding {
  #[inline]
  pub const fn len_chars(&self) -> usize {
    match self {
      Self::Crlf => 2,
      _ => 1,
    }
  }

  #[inline]
  pub const fn from_char(ch: char) -> Option<LineEnding> {
    match ch {
      '\u{000A}' => Some(LineEnding::LF),
      '\u{000B}' => Some(LineEnding::VT),
      '\u{000C}' => Some(LineEnding::FF),
      '\u{000D}' => Some(LineEnding::CR),
      '\u{0085}' => Some(LineEnding::Nel),
      '\u{2028}' => Some(LineEnding::LS),
      '\u{2029}' => Some(LineEnding::PS),
      _ => None,
    }
  }
}

/// Returns the line ending that terminates `line`, if any.
pub fn get_line_ending(line: &RopeSlice) -> Option<LineEnding> {
  let len = line.len_chars();
  let last = LineEnding::from_char(line.get_char(len.checked_sub(1)?)?)?;
  if last == LineEnding::LF && len >= 2 && line.char(len - 2) == '\u{000D}' {
    return Some(LineEnding::Crlf);
  }
  Some(last)
}

/// Returns the char index of the end of the given line, not including its line
/// ending.
pub fn line_end_char_index(slice: &RopeSlice, line: usize) -> usize {
  slice.line_to_char(line + 1)
    - get_line_ending(&slice.line(line))
      .map(|le| le.len_chars())
      .unwrap_or(0)
}

/// The char span of line `line`, sans its line ending.
pub fn line_span(slice: &RopeSlice, line: usize) -> Range<usize> {
  slice.line_to_char(line)..line_end_char_index(slice, line)
}
