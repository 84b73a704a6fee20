//! Functions for working with the host environment.

use std::path::PathBuf;

use eyre::{
  Result,
  WrapErr,
};
use parking_lot::RwLock;

// The CWD is cached so config discovery sees one directory for the whole run,
// even if the process directory is deleted underneath us.
static CWD: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Get the current working directory.
///
/// Prefers `$PWD` when it names the same directory, so symlinked working
/// directories are reported the way the shell shows them (`pwd -L`).
pub fn current_working_dir() -> Result<PathBuf> {
  if let Some(path) = &*CWD.read() {
    return Ok(path.clone());
  }

  let mut cwd = std::env::current_dir().wrap_err("failed to get current working directory")?;

  let pwd = std::env::var_os("PWD");
  #[cfg(windows)]
  let pwd = pwd.or_else(|| std::env::var_os("CD"));

  if let Some(pwd) = pwd.map(PathBuf::from)
    && pwd.canonicalize().ok().as_ref() == Some(&cwd)
  {
    cwd = pwd;
  }

  let mut dst = CWD.write();
  *dst = Some(cwd.clone());

  Ok(cwd)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_dir_is_cached() {
    let first = current_working_dir().unwrap();
    let second = current_working_dir().unwrap();
    assert_eq!(first, second);
  }
}
