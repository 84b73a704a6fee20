use crate::line_ending::LineEnding;

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  LineEnding::from_char(ch).is_some()
}

/// Horizontal whitespace, including the non-breaking and fixed-width spaces a
/// documentation renderer tends to substitute for plain spaces.
#[inline]
pub fn char_is_whitespace(ch: char) -> bool {
  match ch {
      '\u{0009}' | // Character Tabulation
      '\u{0020}' | // Space
      '\u{00A0}' | // No-break Space
      '\u{180E}' | // Mongolian Vowel Separator
      '\u{202F}' | // Narrow No-break Space
      '\u{205F}' | // Medium Mathematical Space
      '\u{3000}' | // Ideographic Space
      '\u{FEFF}'   // Zero Width No-break Space
      => true,

      // En Quad, Em Quad, En Space, Em Space, Three-per-em Space,
      // Four-per-em Space, Six-per-em Space, Figure Space,
      // Punctuation Space, Thin Space, Hair Space, Zero Width Space.
      ch if ('\u{2000}' ..= '\u{200B}').contains(&ch) => true,

      _ => false,
    }
}

/// Maps every horizontal whitespace character onto a plain space.
///
/// The mapping is one char to one char, so offsets computed on folded text
/// are valid in the original.
#[inline]
pub fn fold_whitespace(ch: char) -> char {
  if char_is_whitespace(ch) { ' ' } else { ch }
}
