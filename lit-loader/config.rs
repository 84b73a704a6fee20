use std::{
  path::Path,
  str::from_utf8,
};

use eyre::{
  Result,
  WrapErr,
};

/// Default built-in sync.toml.
pub fn default_sync_config() -> Result<toml::Value> {
  let default_config = include_bytes!("sync.toml");
  let config_str = from_utf8(default_config).wrap_err("built-in sync.toml contains invalid UTF-8")?;
  toml::from_str(config_str).wrap_err("failed to parse built-in sync.toml")
}

/// User configured sync.toml files, merged onto the default config.
///
/// The user config directory is applied first, then the workspace's
/// `.lit-sync/sync.toml`. Missing files are skipped.
pub fn user_sync_config() -> Result<toml::Value> {
  let default = default_sync_config()?;

  let config = [
    crate::config_dir(),
    crate::find_workspace().0.join(crate::WORKSPACE_DIR),
  ]
  .into_iter()
  .map(|path| path.join(crate::CONFIG_FILE_NAME))
  .filter_map(|file| {
    std::fs::read_to_string(&file)
      .map(|config| {
        tracing::debug!("loading config from {}", file.display());
        toml::from_str(&config)
      })
      .ok()
  })
  .collect::<Result<Vec<_>, _>>()
  .wrap_err("failed to parse user sync.toml")?
  .into_iter()
  .fold(default, |a, b| crate::merge_toml_values(a, b, 3));

  Ok(config)
}

/// The default config with a single explicit file merged on top.
pub fn file_sync_config(path: &Path) -> Result<toml::Value> {
  let default = default_sync_config()?;
  let content = std::fs::read_to_string(path)
    .wrap_err_with(|| format!("failed to read config file '{}'", path.display()))?;
  let user: toml::Value = toml::from_str(&content)
    .wrap_err_with(|| format!("failed to parse config file '{}'", path.display()))?;
  Ok(crate::merge_toml_values(default, user, 3))
}
