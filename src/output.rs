use clap::{Args, ValueEnum};
use tracing::metadata::LevelFilter;
use tracing_subscriber::{filter::EnvFilter, prelude::*};

/// `-v/-q/--color`, merged into a `LevelFilter` and installed once at the
/// top of `main` -- same shape as `njsmith-posy`'s `output.rs::OutputArgs`,
/// minus the custom eyre panic hook (this crate uses plain `anyhow`).
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Increase verbosity. (Can be repeated.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Reduce verbosity. (Can be repeated.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
    #[arg(long, default_value_t = ColorChoice::Auto, value_enum, value_name = "WHEN", global = true)]
    pub color: ColorChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl OutputArgs {
    fn level_filter(&self) -> LevelFilter {
        let verbosity = self
            .verbose
            .try_into()
            .unwrap_or(i8::MAX)
            .saturating_sub(self.quiet.try_into().unwrap_or(i8::MAX));
        match verbosity {
            2.. => LevelFilter::TRACE,
            1 => LevelFilter::DEBUG,
            0 => LevelFilter::INFO,
            -1 => LevelFilter::WARN,
            i8::MIN..=-2 => LevelFilter::ERROR,
        }
    }
}

pub fn init(args: &OutputArgs) {
    match args.color {
        ColorChoice::Auto => (),
        ColorChoice::Always => console::set_colors_enabled_stderr(true),
        ColorChoice::Never => console::set_colors_enabled_stderr(false),
    }

    let filter = EnvFilter::builder()
        .with_default_directive(args.level_filter().into())
        .with_env_var("PINCALC_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .init();
}

/// Every `Scheduler::get()` call past this many increments a progress log
/// line (spec.md §4.H's "configured verbosity threshold"), unless overridden
/// via `--report-every`.
pub const DEFAULT_REPORT_EVERY: usize = 25;
