// src/main.rs

use docci::config::load_configuration;
use docci::tags::TagCatalog;
use docci::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("docci error: {err:#}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();

    if args.tags {
        print!("{}", TagCatalog::builtin().render_listing());
        return Ok(());
    }

    let input = args
        .config
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("missing CONFIG argument"))?;
    let loaded = load_configuration(input)?;

    let level = logging::resolve_level(args.log_level, loaded.config.log_level());
    logging::init_logging(level)?;

    run(args, loaded).await
}
