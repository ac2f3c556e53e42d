use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use delta_sssp::harness::{first_mismatch, reference_distances, run_backends};
use delta_sssp::{BackendKind, Distance, EdgeDirection, Graph, SsspConfig, Weight, INF};

#[cfg(feature = "alloc-mimalloc")]
use mimalloc::MiMalloc;

#[cfg(feature = "alloc-mimalloc")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(feature = "alloc-snmalloc")]
use snmalloc_rs::SnMalloc;

#[cfg(feature = "alloc-snmalloc")]
#[global_allocator]
static GLOBAL: SnMalloc = SnMalloc;

#[cfg(feature = "alloc-jemalloc")]
use jemallocator::Jemalloc;

#[cfg(feature = "alloc-jemalloc")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser)]
#[command(name = "delta-bench")]
#[command(about = "Time delta-stepping SSSP across execution backends", long_about = None)]
struct Cli {
    /// Edge-list file to load; a random graph is generated when omitted
    graph: Option<PathBuf>,

    /// Vertices in the generated graph
    #[arg(long, default_value_t = 100)]
    vertices: usize,

    /// Probability of each forward edge in the generated graph
    #[arg(long, default_value_t = 0.5)]
    prob: f64,

    /// Bucket width (overrides the config file)
    #[arg(long)]
    delta: Option<Distance>,

    /// Largest generated edge weight (overrides the config file)
    #[arg(long)]
    max_weight: Option<Weight>,

    /// Source vertex
    #[arg(long, default_value_t = 0)]
    source: usize,

    /// Seed for graph generation; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Backend to run; repeat to compare several (default: all)
    #[arg(long = "backend", value_name = "KIND")]
    backends: Vec<BackendKind>,

    /// Highest bucket index a run may reach (overrides the config file)
    #[arg(long)]
    max_buckets: Option<usize>,

    /// Worker threads, 0 for all cores (overrides the config file)
    #[arg(long)]
    threads: Option<usize>,

    /// Runs per backend
    #[arg(long, default_value_t = 1)]
    repeats: usize,

    /// Relax every edge in both directions
    #[arg(long, default_value_t = false)]
    undirected: bool,

    /// Write the graph to this edge-list file
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Print the distance vector
    #[arg(long, default_value_t = false)]
    print: bool,

    /// Check the result against a sequential Dijkstra
    #[arg(long, default_value_t = false)]
    verify: bool,

    /// Emit the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// JSON run configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let graph = load_graph(&cli, &config)?;

    if let Some(path) = &cli.save {
        graph
            .save(path)
            .with_context(|| format!("failed to save graph to {}", path.display()))?;
        if !cli.json {
            println!("Graph saved to {}", path.display());
        }
    }

    let kinds = if cli.backends.is_empty() {
        BackendKind::ALL.to_vec()
    } else {
        cli.backends.clone()
    };

    let (report, distances) = run_backends(&graph, cli.source, &config, &kinds, cli.repeats)
        .context("delta-stepping run failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Vertices: {}, edges: {}, delta: {}",
            report.vertices, report.edges, report.delta
        );
        for t in &report.timings {
            println!(
                "{:<12} {:>3} threads  {:.6} s",
                t.backend, t.parallelism, t.mean_secs
            );
        }
    }

    if cli.print {
        println!("{}", format_distances(&distances));
    }

    if let Some(m) = &report.mismatch {
        bail!(
            "{} disagrees at vertex {}: expected {}, got {}",
            m.backend,
            m.vertex,
            m.expected,
            m.actual
        );
    }
    if kinds.len() > 1 && !cli.json {
        println!("Results match");
    }

    if cli.verify {
        let expected = reference_distances(&graph, cli.source, config.direction);
        if let Some(v) = first_mismatch(&expected, &distances) {
            bail!(
                "verification failed at vertex {v}: dijkstra {}, delta-stepping {}",
                expected.get(v).copied().unwrap_or(INF),
                distances.get(v).copied().unwrap_or(INF)
            );
        }
        if !cli.json {
            println!("Verified against Dijkstra");
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<SsspConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SsspConfig::from_json_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SsspConfig::default(),
    };
    if let Some(delta) = cli.delta {
        config.delta = delta;
    }
    if let Some(max_weight) = cli.max_weight {
        config.max_edge_weight = max_weight;
    }
    if let Some(max_buckets) = cli.max_buckets {
        config.max_buckets = max_buckets;
    }
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    if cli.undirected {
        config.direction = EdgeDirection::Undirected;
    }
    config.validate()?;
    Ok(config)
}

fn load_graph(cli: &Cli, config: &SsspConfig) -> Result<Graph> {
    if let Some(path) = &cli.graph {
        let graph =
            Graph::load(path).with_context(|| format!("failed to load graph {}", path.display()))?;
        if !cli.json {
            println!("Graph loaded from {}", path.display());
        }
        return Ok(graph);
    }

    if cli.vertices == 0 {
        bail!("--vertices must be positive");
    }
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    if !cli.json {
        println!(
            "Generating random graph: {} vertices, edge probability {}",
            cli.vertices, cli.prob
        );
    }
    Ok(Graph::random(cli.vertices, cli.prob, config.max_edge_weight, &mut rng)?)
}

fn format_distances(distances: &[Distance]) -> String {
    distances
        .iter()
        .map(|&d| if d == INF { "INF".to_owned() } else { d.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}
