mod config;
mod tokens;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tg_core::{
    BuildStats, DegreeCap, DescriptorSimilarity, Edge, GraphOptions, LayeredGraphBuilder,
    TokenDescriptor, check_invariants, summarize,
};

#[derive(Parser)]
#[command(name = "tg", about = "Build layered similarity graphs over text tokens")]
struct Cli {
    /// Config file (defaults to $TG_CONFIG, then ./tg.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    /// Collapse repeated tokens to their first occurrence
    #[arg(long, global = true)]
    dedupe: bool,

    #[command(flatten)]
    graph: GraphArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GraphArgs {
    /// Expansion layers above the base ring
    #[arg(long, global = true, allow_negative_numbers = true)]
    max_layers: Option<i64>,

    /// Hard cap on total edges
    #[arg(long, global = true, allow_negative_numbers = true)]
    max_edges: Option<i64>,

    /// Per-layer degree cap; repeat to configure layers in order
    #[arg(long = "degree", global = true)]
    degree: Vec<usize>,

    /// Minimum similarity for expansion edges
    #[arg(long = "threshold", global = true)]
    similarity_threshold: Option<f64>,

    /// Similarity at which pairs must end up within bounded hops
    #[arg(long = "strong", global = true)]
    strong_similarity_threshold: Option<f64>,

    /// Per-level weight decay
    #[arg(long = "decay", global = true)]
    decay_factor: Option<f64>,
}

impl GraphArgs {
    fn to_options(&self) -> GraphOptions {
        let max_degree_per_layer = match self.degree.as_slice() {
            [] => None,
            [cap] => Some(DegreeCap::from(*cap)),
            caps => Some(DegreeCap::from(caps.to_vec())),
        };
        GraphOptions {
            max_layers: self.max_layers,
            max_edges: self.max_edges,
            max_degree_per_layer,
            similarity_threshold: self.similarity_threshold,
            strong_similarity_threshold: self.strong_similarity_threshold,
            decay_factor: self.decay_factor,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the edge list as JSON
    Build {
        /// Input text file (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print graph statistics
    Stats {
        /// Input text file (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Verify the built graph's structural guarantees
    Check {
        /// Input text file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Build { file, pretty } => cmd_build(&cli, file.as_deref(), *pretty),
        Commands::Stats { file } => cmd_stats(&cli, file.as_deref()),
        Commands::Check { file } => cmd_check(&cli, file.as_deref()),
    }
}

fn resolve_options(cli: &Cli) -> Result<GraphOptions> {
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let file_options =
        config::load_options(cli.config.as_deref(), &cwd).context("failed to load config")?;
    Ok(file_options.merged_with(&cli.graph.to_options()))
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn load_descriptors(cli: &Cli, file: Option<&Path>) -> Result<Vec<TokenDescriptor>> {
    let text = read_input(file)?;
    let mut words = tokens::tokenize(&text);
    if cli.dedupe {
        words = tokens::dedupe(words);
    }
    tracing::info!("tokenized {} words", words.len());
    Ok(words.iter().map(|w| TokenDescriptor::from_text(w)).collect())
}

fn run_build(
    cli: &Cli,
    file: Option<&Path>,
) -> Result<(Vec<TokenDescriptor>, Vec<Edge>, BuildStats)> {
    let options = resolve_options(cli)?;
    let descriptors = load_descriptors(cli, file)?;
    let builder = LayeredGraphBuilder::new(options);
    let (edges, stats) = builder.build_with_stats(&descriptors, &DescriptorSimilarity);
    tracing::info!(
        "built {} edges over {} tokens (budget {})",
        edges.len(),
        descriptors.len(),
        stats.config.max_edges
    );
    Ok((descriptors, edges, stats))
}

fn cmd_build(cli: &Cli, file: Option<&Path>, pretty: bool) -> Result<()> {
    let (_, edges, _) = run_build(cli, file)?;
    let json = if pretty {
        tg_core::export_json_pretty(&edges)
    } else {
        tg_core::export_json(&edges)
    }
    .context("failed to serialize edges")?;
    println!("{json}");
    Ok(())
}

fn cmd_stats(cli: &Cli, file: Option<&Path>) -> Result<()> {
    let (descriptors, edges, stats) = run_build(cli, file)?;
    let summary = summarize(&edges, descriptors.len());

    println!("tokens:     {}", summary.node_count);
    println!("edges:      {}", summary.edge_count);
    println!("budget:     {}", stats.config.max_edges);
    println!("layers:     {}", stats.config.max_layers);
    for (level, count) in &summary.edges_per_level {
        let max_degree = summary.max_degree_per_level.get(level).copied().unwrap_or(0);
        println!("level {level}:    {count} edges, max degree {max_degree}");
    }
    println!("bridged:    {}", stats.connectivity_edges);
    println!("mean span:  {:.2}", summary.mean_span);
    println!(
        "oracle:     calls={}, cache_hits={}",
        stats.oracle_calls, stats.cache_hits
    );
    if stats.budget_exhausted {
        println!("budget exhausted");
    }
    Ok(())
}

fn cmd_check(cli: &Cli, file: Option<&Path>) -> Result<()> {
    let (descriptors, edges, stats) = run_build(cli, file)?;
    let violations = check_invariants(&edges, &descriptors, &stats.config, &DescriptorSimilarity);
    if violations.is_empty() {
        println!("ok: {} edges over {} tokens", edges.len(), descriptors.len());
        return Ok(());
    }
    for v in &violations {
        println!("violation: {v}");
    }
    bail!("{} invariant violation(s)", violations.len())
}
