use anyhow::{Context, Result};
use clap::Parser;
use ctgscreen::debug::{format_f64, format_worst};
use ctgscreen::{load_case, screen, FilterMode, ScreenOptBuilder, TopologyStrategy};
use std::path::PathBuf;

/// Post-contingency thermal limit screening.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The input case (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file for the violations and penalties (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Reach interval topologies by low-rank updates of the static
    /// network instead of refactorizing.
    #[arg(long, default_value_t = false)]
    chained: bool,

    /// Evaluate every branch, without the bracket filter.
    #[arg(long, default_value_t = false)]
    exhaustive: bool,

    /// Reference bus index.
    #[arg(long)]
    ref_bus: Option<usize>,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(_) => {
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(2);
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let case = load_case(&cli.input)?;

    let mut builder = ScreenOptBuilder::default();
    if cli.chained {
        builder.topology(TopologyStrategy::Chained);
    }
    if cli.exhaustive {
        builder.filter(FilterMode::Exhaustive);
    }
    if let Some(ref_bus) = cli.ref_bus {
        builder.ref_bus(ref_bus);
    }
    let opt = builder.build()?;

    let res = screen(&case, opt)?;

    println!("{}", format_worst(&res.worst));
    println!("total penalty: {}", format_f64(res.total_penalty()));

    if let Some(out_path) = &cli.output {
        let json = serde_json::to_string_pretty(&res)?;
        std::fs::write(out_path, json)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
    }

    Ok(())
}
