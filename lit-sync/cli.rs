use std::{
  path::{
    Path,
    PathBuf,
  },
  str::FromStr,
};

use clap::{
  ArgAction,
  Args,
  Parser,
  Subcommand,
  ValueEnum,
};
use lit_stdx::path;

#[derive(Parser, Debug)]
#[command(
  name = "lit-sync",
  about = "Map cursor positions between a literate source and its rendered document",
  long_about = None,
  version
)]
pub struct Cli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count, global = true)]
  pub verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE", global = true, value_parser = parse_pathbuf)]
  pub log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE", global = true, value_parser = parse_pathbuf)]
  pub config_file: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Print the offset in TARGET corresponding to an offset in SEARCH
  Locate(LocateArgs),
  /// Move a cursor in one view and print where the other view's cursor lands
  Sync(SyncArgs),
  /// Print a source file with its comment markers removed
  Render(RenderArgs),
  /// List known source languages and their comment tokens
  Languages,
  /// Print the effective configuration
  Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct LocateArgs {
  #[arg(value_name = "SEARCH", value_parser = parse_pathbuf)]
  pub search: PathBuf,

  #[arg(value_name = "TARGET", value_parser = parse_pathbuf)]
  pub target: PathBuf,

  /// Char offset in SEARCH
  #[arg(long, value_name = "N")]
  pub offset: usize,

  /// Window around the offset: `line`, `whole`, `radius` or `radius=N`
  #[arg(long, value_name = "WINDOW", default_value = "radius")]
  pub window: WindowArg,

  /// Fixed mismatch tolerance; disables refinement
  #[arg(long, value_name = "K")]
  pub mismatches: Option<usize>,

  /// Do not retry with narrower windows
  #[arg(long)]
  pub no_refine: bool,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
  #[arg(value_name = "SOURCE", value_parser = parse_pathbuf)]
  pub source: PathBuf,

  /// Rendered document; defaults to SOURCE with comment markers removed
  #[arg(value_name = "RENDERED", value_parser = parse_pathbuf)]
  pub rendered: Option<PathBuf>,

  /// Char offset of the cursor head in the moved view
  #[arg(long, value_name = "N")]
  pub offset: usize,

  /// Anchor of a selection ending at the offset
  #[arg(long, value_name = "N")]
  pub anchor: Option<usize>,

  /// Which view the cursor moved in
  #[arg(long, value_enum, default_value_t = Side::Source)]
  pub from: Side,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
  #[arg(value_name = "SOURCE", value_parser = parse_pathbuf)]
  pub source: PathBuf,

  /// Comment token to strip; defaults to the token for the file extension
  #[arg(long, value_name = "TOKEN")]
  pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
  /// Print the config file locations instead
  #[arg(long)]
  pub paths: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Side {
  Source,
  Rendered,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowArg {
  Line,
  Whole,
  /// `None` uses the configured radius.
  Radius(Option<usize>),
}

impl FromStr for WindowArg {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "line" => Ok(Self::Line),
      "whole" => Ok(Self::Whole),
      "radius" => Ok(Self::Radius(None)),
      _ => {
        let radius = value
          .strip_prefix("radius=")
          .ok_or_else(|| format!("unknown window '{value}'"))?;
        radius
          .parse()
          .map(|radius| Self::Radius(Some(radius)))
          .map_err(|err| format!("invalid radius '{radius}': {err}"))
      },
    }
  }
}

fn parse_pathbuf(value: &str) -> Result<PathBuf, String> {
  Ok(path::normalize(path::expand_tilde(Path::new(value))))
}
