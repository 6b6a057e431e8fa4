use crate::output::OutputArgs;
use crate::prelude::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A direct translation of `original_source/eprc`'s `argparse` surface
/// (spec.md §6) into `clap::Parser` derives, in the style of
/// `njsmith-posy`'s `output.rs::OutputArgs`.
#[derive(Parser, Debug)]
#[command(name = "pincalc", version, about = "Computes a globally consistent pinned Python package version set")]
pub struct Cli {
    #[command(flatten)]
    pub output: OutputArgs,

    /// Override the cache root directory (defaults to the platform cache dir).
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover dependencies for one or more local projects and pin a
    /// consistent version set.
    Calc(CalcArgs),
    /// Dump the cached metadata record(s) for a single package name.
    Get(GetArgs),
}

#[derive(clap::Args, Debug)]
pub struct CalcArgs {
    /// Project roots to resolve, as DIR or DIR:extra1,extra2,...
    #[arg(required = true, value_name = "DIR[:EXTRAS]")]
    pub paths: Vec<PathSpec>,

    /// Command used to create a throwaway virtualenv for metadata extraction.
    #[arg(long, default_value = "virtualenv")]
    pub virtualenv: String,

    /// External PBO solver command (a fixed argv, whitespace-split).
    #[arg(long, default_value = "minisat+")]
    pub solver: String,

    /// Where to write the pinned requirements file (defaults to stdout).
    #[arg(long, short = 'o', value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Skip extraction entirely; resolve only from whatever is already cached.
    #[arg(short, long)]
    pub cached: bool,

    /// Include the must-satisfy root seeds in the pinned output.
    #[arg(short, long)]
    pub include_seeds: bool,

    /// Emit a scheduler progress line every N processed items.
    #[arg(long, default_value_t = crate::output::DEFAULT_REPORT_EVERY)]
    pub report_every: usize,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    pub name: Name,
    pub version: Option<Version>,
}

/// One `calc` path argument: `DIR` or `DIR:extra1,extra2,...`.
#[derive(Debug, Clone)]
pub struct PathSpec {
    pub path: PathBuf,
    pub extras: Vec<Extra>,
}

impl std::str::FromStr for PathSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((path, extras)) => Ok(PathSpec {
                path: PathBuf::from(path),
                extras: extras.split(',').filter(|e| !e.is_empty()).map(Extra::new).collect(),
            }),
            None => Ok(PathSpec {
                path: PathBuf::from(s),
                extras: vec![],
            }),
        }
    }
}
