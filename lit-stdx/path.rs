//! Path helpers for user-supplied locations (config overrides, log files).

use std::{
  borrow::Cow,
  path::{
    Component,
    Path,
    PathBuf,
  },
};

/// Replaces a leading `~` with the user's home directory.
pub fn expand_tilde<'a, P>(path: P) -> Cow<'a, Path>
where
  P: Into<Cow<'a, Path>>,
{
  let path = path.into();
  let mut components = path.components();
  if let Some(Component::Normal(first)) = components.next()
    && first == "~"
    && let Ok(mut home) = etcetera::home_dir()
  {
    home.push(components.as_path());
    return Cow::Owned(home);
  }
  path
}

/// Normalize a path without touching the filesystem: `.` is dropped and `..`
/// cancels the directory before it. Leading `..` components are kept, and `..`
/// directly under the root stays at the root.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.as_ref().components() {
    match component {
      Component::CurDir => {},
      Component::ParentDir => match normalized.components().next_back() {
        Some(Component::Normal(_)) => {
          normalized.pop();
        },
        Some(Component::RootDir | Component::Prefix(_)) => {},
        _ => normalized.push(component),
      },
      other => normalized.push(other),
    }
  }
  normalized
}
