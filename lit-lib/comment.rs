//! Line comment tokens per source language.
//!
//! Literate sources keep their prose in line comments. The rendered view shows
//! that prose without the comment markers, so the source side of a sync often
//! has to look past a `#` or `//` prefix. This module knows the marker for
//! each supported file extension and can strip markers from a text.
//!
//! # Example
//!
//! ```
//! use ropey::Rope;
//! use lit_lib::comment::{language_for_extension, strip_line_comments};
//!
//! let python = language_for_extension("py").unwrap();
//! assert_eq!(python.comment_token, Some("#"));
//!
//! let source = Rope::from("# Prose.\nx = 1\n");
//! assert_eq!(strip_line_comments(source.slice(..), "#"), "Prose.\nx = 1\n");
//! ```

use std::path::Path;

use lit_core::chars::char_is_whitespace;
use ropey::RopeSlice;

pub const DEFAULT_COMMENT_TOKEN: &str = "#";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageOptions {
  pub name:          &'static str,
  /// Extensions without the leading dot, lowercase.
  pub extensions:    &'static [&'static str],
  pub comment_token: Option<&'static str>,
}

pub static LANGUAGES: &[LanguageOptions] = &[
  LanguageOptions {
    name:          "c",
    extensions:    &["c", "h"],
    comment_token: Some("//"),
  },
  LanguageOptions {
    name:          "cpp",
    extensions:    &["cc", "cpp", "hh", "hpp"],
    comment_token: Some("//"),
  },
  LanguageOptions {
    name:          "java",
    extensions:    &["java"],
    comment_token: Some("//"),
  },
  LanguageOptions {
    name:          "rust",
    extensions:    &["rs"],
    comment_token: Some("//"),
  },
  LanguageOptions {
    name:          "python",
    extensions:    &["py"],
    comment_token: Some("#"),
  },
  LanguageOptions {
    name:          "php",
    extensions:    &["php"],
    comment_token: Some("#"),
  },
  LanguageOptions {
    name:          "assembly",
    extensions:    &["s"],
    comment_token: Some(";"),
  },
  LanguageOptions {
    name:          "ini",
    extensions:    &["ini", "iss"],
    comment_token: Some(";"),
  },
  LanguageOptions {
    name:          "matlab",
    extensions:    &["m"],
    comment_token: Some("%"),
  },
  LanguageOptions {
    name:          "batch",
    extensions:    &["bat"],
    comment_token: Some(":"),
  },
  LanguageOptions {
    name:          "rest",
    extensions:    &["rst"],
    comment_token: None,
  },
];

/// Case-insensitive lookup; a leading dot is ignored.
pub fn language_for_extension(extension: &str) -> Option<&'static LanguageOptions> {
  let extension = extension.strip_prefix('.').unwrap_or(extension);
  LANGUAGES.iter().find(|language| {
    language
      .extensions
      .iter()
      .any(|ext| ext.eq_ignore_ascii_case(extension))
  })
}

pub fn language_for_path(path: &Path) -> Option<&'static LanguageOptions> {
  let extension = path.extension()?.to_str()?;
  language_for_extension(extension)
}

/// The comment token for a file at `path`.
///
/// Unknown extensions get [`DEFAULT_COMMENT_TOKEN`]. Known languages without
/// line comments return `None`.
pub fn comment_token_for_path(path: &Path) -> Option<&'static str> {
  match language_for_path(path) {
    Some(language) => language.comment_token,
    None => Some(DEFAULT_COMMENT_TOKEN),
  }
}

/// Returns the longest of `tokens` that opens line `line_num`, after optional
/// indentation.
pub fn get_comment_token<'a, S: AsRef<str>>(
  text: RopeSlice,
  tokens: &'a [S],
  line_num: usize,
) -> Option<&'a str> {
  let line = text.line(line_num);
  let start = first_non_whitespace_char(line)?;

  tokens
    .iter()
    .map(AsRef::as_ref)
    .filter(|token| starts_with(line.slice(start..), token))
    .max_by_key(|token| token.len())
}

/// Removes the comment marker (and one following space) from every line that
/// starts with `token` after optional indentation. Other lines are kept as
/// they are. Indentation and line endings are preserved.
pub fn strip_line_comments(text: RopeSlice, token: &str) -> String {
  let mut out = String::with_capacity(text.len_bytes());
  if token.is_empty() {
    out.extend(text.chunks());
    return out;
  }

  let tokens = [token];
  for (line_num, line) in text.lines().enumerate() {
    let (Some(token), Some(start)) = (
      get_comment_token(text, &tokens, line_num),
      first_non_whitespace_char(line),
    ) else {
      out.extend(line.chunks());
      continue;
    };

    out.extend(line.slice(..start).chunks());
    let mut body = line.slice(start + token.chars().count()..);
    if body.len_chars() > 0 && body.char(0) == ' ' {
      body = body.slice(1..);
    }
    out.extend(body.chunks());
  }
  out
}

fn first_non_whitespace_char(line: RopeSlice) -> Option<usize> {
  line.chars().position(|ch| !char_is_whitespace(ch))
}

fn starts_with(slice: RopeSlice, token: &str) -> bool {
  let len = token.chars().count();
  slice.len_chars() >= len && slice.slice(..len) == token
}
