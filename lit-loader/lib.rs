pub mod config;

use std::{
  borrow::Cow,
  path::{
    Path,
    PathBuf,
  },
  sync::OnceLock,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use lit_stdx::{
  env::current_working_dir,
  path,
};

/// Name of the per-project directory holding `sync.toml`.
pub const WORKSPACE_DIR: &str = ".lit-sync";

pub const CONFIG_FILE_NAME: &str = "sync.toml";

static CONFIG_FILE: OnceLock<PathBuf> = OnceLock::new();

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

pub fn initialize_config_file(specified_file: Option<PathBuf>) {
  let config_file = specified_file.unwrap_or_else(default_config_file);
  ensure_parent_dir(&config_file);
  CONFIG_FILE.set(config_file).ok();
}

pub fn initialize_log_file(specified_file: Option<PathBuf>) {
  let log_file = specified_file.unwrap_or_else(default_log_file);
  ensure_parent_dir(&log_file);
  LOG_FILE.set(log_file).ok();
}

/// Base directory for user configuration.
///
/// `LIT_SYNC_CONFIG_DIR` wins when set; otherwise this is the platform config
/// directory with a `lit-sync` subdirectory.
pub fn config_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("LIT_SYNC_CONFIG_DIR") {
    return path::expand_tilde(Cow::Borrowed(Path::new(&dir))).into_owned();
  }
  match choose_base_strategy() {
    Ok(strategy) => strategy.config_dir().join("lit-sync"),
    Err(err) => {
      tracing::warn!("unable to find the config directory: {err}");
      PathBuf::from(WORKSPACE_DIR)
    },
  }
}

pub fn cache_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("LIT_SYNC_CACHE_DIR") {
    return path::expand_tilde(Cow::Borrowed(Path::new(&dir))).into_owned();
  }
  match choose_base_strategy() {
    Ok(strategy) => strategy.cache_dir().join("lit-sync"),
    Err(err) => {
      tracing::warn!("unable to find the cache directory: {err}");
      std::env::temp_dir().join("lit-sync")
    },
  }
}

pub fn config_file() -> PathBuf {
  CONFIG_FILE
    .get_or_init(|| {
      let path = default_config_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

pub fn log_file() -> PathBuf {
  LOG_FILE
    .get_or_init(|| {
      let path = default_log_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

pub fn workspace_config_file() -> PathBuf {
  find_workspace().0.join(WORKSPACE_DIR).join(CONFIG_FILE_NAME)
}

pub fn default_log_file() -> PathBuf {
  cache_dir().join("lit-sync.log")
}

/// Layers `right` over `left`.
///
/// Tables present on both sides are merged key by key, down to `merge_depth`
/// levels; below that, `right` replaces `left` outright. Overriding only the
/// tolerance cap keeps every other built-in setting:
///
/// ```toml
/// # built-in            # user               # merged
/// [locate]              [locate]             [locate]
/// divisor = 5           cap = 4              divisor = 5
/// cap = 8                                    cap = 4
/// ```
///
/// Anything that is not a table, arrays included, is replaced by `right`.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (key, rvalue) in right_map {
        let merged = match left_map.remove(&key) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(key, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}

/// Finds the current workspace folder.
///
/// Searches upward from the CWD and returns the first directory that contains
/// `.git`, `.svn`, `.jj` or `.lit-sync`. If no workspace was found returns
/// (CWD, true). Otherwise (workspace, false) is returned.
pub fn find_workspace() -> (PathBuf, bool) {
  match current_working_dir() {
    Ok(current_dir) => find_workspace_in(current_dir),
    Err(_) => (PathBuf::new(), true),
  }
}

pub fn find_workspace_in(dir: impl AsRef<Path>) -> (PathBuf, bool) {
  let dir = dir.as_ref();
  for ancestor in dir.ancestors() {
    if [".git", ".svn", ".jj", WORKSPACE_DIR]
      .iter()
      .any(|marker| ancestor.join(marker).exists())
    {
      return (ancestor.to_owned(), false);
    }
  }

  (dir.to_owned(), true)
}

fn default_config_file() -> PathBuf {
  config_dir().join(CONFIG_FILE_NAME)
}

fn ensure_parent_dir(path: &Path) {
  if let Some(parent) = path.parent()
    && !parent.exists()
  {
    std::fs::create_dir_all(parent).ok();
  }
}
