mod cli;

use std::{
  fs::OpenOptions,
  path::Path,
  process::ExitCode,
  sync::Mutex,
};

use anyhow::{
  Context,
  Result,
  anyhow,
  bail,
};
use clap::Parser;
use lit_lib::{
  comment::{
    DEFAULT_COMMENT_TOKEN,
    LANGUAGES,
    comment_token_for_path,
    language_for_path,
    strip_line_comments,
  },
  config::Config,
  fragment::{
    Segmentation,
    select_window,
  },
  locate::{
    Locator,
    SearchLocus,
  },
  selection::Range,
  sync::{
    SyncOutcome,
    SyncPair,
  },
};
use ropey::Rope;
use tracing_subscriber::EnvFilter;

use crate::cli::{
  Cli,
  Command,
  ConfigArgs,
  LocateArgs,
  RenderArgs,
  Side,
  SyncArgs,
  WindowArg,
};

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  setup_logging(cli.verbosity, cli.log_file.clone())?;
  lit_loader::initialize_config_file(cli.config_file.clone());

  run(cli)
}

/// Only `locate`, `sync` and `config` load the configuration.
fn run(cli: Cli) -> Result<ExitCode> {
  let config_file = cli.config_file.as_deref();
  match cli.command {
    Command::Locate(args) => locate(&load_config(config_file)?, args),
    Command::Sync(args) => sync(&load_config(config_file)?, args),
    Command::Render(args) => render(args),
    Command::Languages => languages(),
    Command::Config(args) => show_config(config_file, args),
  }
}

fn setup_logging(verbosity: u8, log_file: Option<std::path::PathBuf>) -> Result<()> {
  let level = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  let builder = tracing_subscriber::fmt().with_env_filter(filter);

  match log_file {
    Some(path) => {
      lit_loader::initialize_log_file(Some(path));
      let path = lit_loader::log_file();
      let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file '{}'", path.display()))?;
      builder
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
    },
    None => builder.with_writer(std::io::stderr).try_init(),
  }
  .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
  let value = match explicit {
    Some(path) => lit_loader::config::file_sync_config(path),
    None => lit_loader::config::user_sync_config(),
  }
  .map_err(|err| anyhow!("{err:#}"))?;
  let config = Config::from_toml(value).context("invalid configuration")?;
  tracing::debug!(?config, "loaded config");
  Ok(config)
}

fn read_rope(path: &Path) -> Result<Rope> {
  let text =
    std::fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))?;
  Ok(Rope::from(text))
}

fn locate(config: &Config, args: LocateArgs) -> Result<ExitCode> {
  let search = read_rope(&args.search)?;
  let target = read_rope(&args.target)?;
  if args.offset > search.len_chars() {
    bail!(
      "offset {} is past the end of '{}' ({} chars)",
      args.offset,
      args.search.display(),
      search.len_chars()
    );
  }

  let mut locate_config = config.locate.clone();
  if args.no_refine {
    locate_config.refine = false;
  }
  let locator = Locator::new(locate_config);

  let text = search.slice(..);
  let locus = match args.window {
    WindowArg::Line => select_window(text, args.offset, &Segmentation::Lines),
    WindowArg::Whole => SearchLocus::whole(text, args.offset),
    WindowArg::Radius(radius) => {
      SearchLocus::around(text, args.offset, radius.unwrap_or(config.locate.radius))
    },
  };

  let found = match args.mismatches {
    Some(k) => locator.locate(text, locus, target.slice(..), Some(k)),
    None => locator.locate_refined(text, locus, target.slice(..)),
  };

  match found {
    Some(offset) => {
      println!("{offset}");
      Ok(ExitCode::SUCCESS)
    },
    None => {
      eprintln!("not found");
      Ok(ExitCode::FAILURE)
    },
  }
}

fn sync(config: &Config, args: SyncArgs) -> Result<ExitCode> {
  let source = read_rope(&args.source)?;
  let rendered = match &args.rendered {
    Some(path) => read_rope(path)?,
    None => Rope::from(render_text(&source, &args.source, None)?),
  };

  let mut pair = SyncPair::new(source, rendered, config);
  pair
    .source_mut()
    .set_display_name(args.source.display().to_string());
  if let Some(path) = &args.rendered {
    pair
      .rendered_mut()
      .set_display_name(path.display().to_string());
  }
  let range = Range::new(args.anchor.unwrap_or(args.offset), args.offset);
  let outcome = match args.from {
    Side::Source => pair.set_source_cursor(range),
    Side::Rendered => pair.set_rendered_cursor(range),
  }?;

  let other = match args.from {
    Side::Source => pair.rendered(),
    Side::Rendered => pair.source(),
  };
  let other_range = other.selection();
  let other = other.display_name();
  match outcome {
    SyncOutcome::Moved(_) | SyncOutcome::Extended(_) => {
      println!("{other} {}..{}", other_range.anchor, other_range.head);
      Ok(ExitCode::SUCCESS)
    },
    SyncOutcome::Unknown | SyncOutcome::Suppressed => {
      eprintln!("{other} position unknown");
      Ok(ExitCode::FAILURE)
    },
  }
}

fn render_text(source: &Rope, path: &Path, token: Option<&str>) -> Result<String> {
  let token = match token {
    Some(token) => token,
    None => {
      if language_for_path(path).is_none() {
        tracing::warn!(
          "unknown language for '{}', assuming '{DEFAULT_COMMENT_TOKEN}' comments",
          path.display()
        );
      }
      comment_token_for_path(path)
        .with_context(|| format!("'{}' has no line comments, pass --token", path.display()))?
    },
  };
  Ok(strip_line_comments(source.slice(..), token))
}

fn render(args: RenderArgs) -> Result<ExitCode> {
  let source = read_rope(&args.source)?;
  print!("{}", render_text(&source, &args.source, args.token.as_deref())?);
  Ok(ExitCode::SUCCESS)
}

fn languages() -> Result<ExitCode> {
  for language in LANGUAGES {
    println!(
      "{:<10} {:<18} {}",
      language.name,
      language.extensions.join(" "),
      language.comment_token.unwrap_or("-")
    );
  }
  Ok(ExitCode::SUCCESS)
}

fn show_config(config_file: Option<&Path>, args: ConfigArgs) -> Result<ExitCode> {
  if args.paths {
    println!("user      {}", lit_loader::config_file().display());
    println!("workspace {}", lit_loader::workspace_config_file().display());
    return Ok(ExitCode::SUCCESS);
  }
  let config = load_config(config_file)?;
  print!("{}", toml::to_string(&config).context("failed to serialize config")?);
  Ok(ExitCode::SUCCESS)
}
