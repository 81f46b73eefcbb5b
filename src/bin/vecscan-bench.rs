//! VECSCAN Benchmark Binary
//!
//! Fills an engine with random embeddings and times single and batch
//! searches against it.

use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vecscan::bench::Benchmark;
use vecscan::{DocId, Engine, EngineConfig, KernelChoice};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KernelArg {
    Auto,
    Scalar,
    Wide,
}

impl From<KernelArg> for KernelChoice {
    fn from(arg: KernelArg) -> Self {
        match arg {
            KernelArg::Auto => KernelChoice::Auto,
            KernelArg::Scalar => KernelChoice::Scalar,
            KernelArg::Wide => KernelChoice::Wide,
        }
    }
}

/// VECSCAN Bench - brute-force vector search throughput
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Embedding dimension
    #[arg(short, long, default_value_t = vecscan::DEFAULT_DIMENSION)]
    dimension: usize,

    /// Number of stored vectors
    #[arg(short = 'n', long, default_value_t = 50_000)]
    vectors: usize,

    /// Timed single-query searches
    #[arg(short, long, default_value_t = 200)]
    queries: u64,

    /// Queries per batch in the batch benchmark (0 = skip)
    #[arg(long, default_value_t = 32)]
    batch: usize,

    /// Results per query
    #[arg(short = 'k', long, default_value_t = 10)]
    top_k: usize,

    /// Inclusive similarity floor
    #[arg(long, default_value_t = 0.0)]
    min_similarity: f32,

    /// Search worker threads (0 = rayon global pool)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Similarity kernel
    #[arg(long, value_enum, default_value_t = KernelArg::Auto)]
    kernel: KernelArg,

    /// RNG seed for the synthetic data
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn random_vector(rng: &mut StdRng, dimension: usize) -> Vec<f32> {
    (0..dimension).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vecscan=info".parse()?))
        .init();

    let args = Args::parse();

    let config = EngineConfig::default()
        .with_dimension(args.dimension)
        .with_threads(args.threads)
        .with_kernel(args.kernel.into());
    let mut engine = Engine::with_config(config)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    info!(
        "Loading {} random vectors of dimension {}",
        args.vectors, args.dimension
    );
    let load_start = Instant::now();
    engine.reserve(args.vectors);
    for id in 0..args.vectors {
        let embedding = random_vector(&mut rng, args.dimension);
        engine.append(DocId::try_from(id)?, &embedding)?;
    }
    info!(
        "Loaded {} vectors in {:.2?} ({:.1} MiB estimated)",
        engine.count(),
        load_start.elapsed(),
        engine.memory_footprint() as f64 / (1024.0 * 1024.0)
    );

    let query = random_vector(&mut rng, args.dimension);
    let single = Benchmark::new("search")
        .iterations(args.queries)
        .warmup(args.queries.min(10))
        .run(|| {
            if let Err(e) = engine.search(&query, args.top_k, args.min_similarity) {
                tracing::error!("Search failed: {}", e);
            }
        });
    println!("{}", single.report());

    if args.batch > 0 {
        let queries: Vec<Vec<f32>> = (0..args.batch)
            .map(|_| random_vector(&mut rng, args.dimension))
            .collect();
        let batch = Benchmark::new("search_batch")
            .iterations((args.queries / args.batch as u64).max(1))
            .run(|| {
                if let Err(e) = engine.search_batch(&queries, args.top_k, args.min_similarity) {
                    tracing::error!("Batch search failed: {}", e);
                }
            });
        println!("{}", batch.report());
    }

    let quantized = engine.quantize_with_params(&query)?;
    println!(
        "quantize: {} bytes as f32 -> {} bytes as i8 (step {:.5})",
        args.dimension * std::mem::size_of::<f32>(),
        quantized.byte_size(),
        quantized.step()
    );

    println!("{}", engine.metrics().summary());
    Ok(())
}
