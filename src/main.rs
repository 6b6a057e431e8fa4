use clap::Parser;
use pincalc::cli::{Cli, Command};
use pincalc::prelude::*;
use pincalc::{cache, config, driver, extractor, index, output};

fn main() {
    let cli = Cli::parse();
    output::init(&cli.output);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cache_dir = config::resolve_cache_dir(cli.cache_dir.clone());
    let cache_impl = cache::FsCache::new(&cache_dir)?;

    match &cli.command {
        Command::Calc(args) => {
            let agent = ureq::AgentBuilder::new()
                .timeout_read(std::time::Duration::from_secs(30))
                .timeout_write(std::time::Duration::from_secs(30))
                .build();
            let index_impl = index::PyPiIndex::new(agent, config::resolve_pypi_root()?);
            let scratch_dir = tempfile::tempdir().context("creating scratch directory")?;
            let extractor_impl = extractor::SubprocessExtractor::new(args.virtualenv.clone(), scratch_dir.path());
            driver::run_calc(args, &cache_impl, &index_impl, &extractor_impl)
        }
        Command::Get(args) => driver::run_get(&cache_impl, &args.name, args.version.as_ref()),
    }
}
