//! Command-line interface for the simulated AES-128 accelerator.

#![forbid(unsafe_code)]

mod logger;
mod stats;

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use aes_accel::{RegisterBus, SimBus};
use aes_core::{encrypt_block, expand_key, Aes128Key, Block};
use aes_link::{
    CompletionMode, CycleCounter, DownCounter, HandlerConfig, LinkConfig, ProtocolHandler,
    RequestFrame, ResponseFrame, MARKER,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use stats::{cycles_to_us, Latency, Throughput};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// AES-128 accelerator CLI.
#[derive(Parser)]
#[command(
    name = "aesaccel",
    version,
    author,
    about = "Serial front end and evaluation harness for a simulated AES-128 accelerator"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve request frames from a byte stream, writing response frames back.
    Serve {
        /// TOML file with `[serial]` and `[handler]` sections.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Read request frames from this file instead of stdin.
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Write response frames to this file instead of stdout.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Write the text banner before serving.
        #[arg(long, default_value_t = false)]
        banner: bool,
        #[command(flatten)]
        handler: HandlerArgs,
    },
    /// Encrypt one block through the simulated accelerator.
    Encrypt {
        #[command(flatten)]
        block: BlockArgs,
        #[command(flatten)]
        handler: HandlerArgs,
    },
    /// Print the 34-byte request frame for a key and plaintext.
    Frame {
        #[command(flatten)]
        block: BlockArgs,
    },
    /// Validate against FIPS-197, check random vectors, measure throughput and latency.
    Bench {
        #[command(flatten)]
        bench: BenchArgs,
        #[command(flatten)]
        handler: HandlerArgs,
    },
}

#[derive(Args)]
struct BenchArgs {
    /// Number of random vectors after the known-answer check.
    #[arg(long, default_value_t = 100)]
    vectors: usize,
    /// Optional RNG seed for reproducibility.
    #[arg(long)]
    seed: Option<u64>,
    /// Inject up to this many garbage bytes plus a marker before each frame.
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    max_garbage: usize,
    /// Run the throughput test for this many seconds.
    #[arg(long, value_name = "SECS")]
    throughput_time: Option<f64>,
    /// Run the latency test with this many samples.
    #[arg(long, value_name = "N")]
    latency_samples: Option<usize>,
    /// Accelerator clock used to convert cycles to time.
    #[arg(long, value_name = "MHZ", default_value_t = 125.0)]
    clock_mhz: f64,
}

#[derive(Args)]
struct BlockArgs {
    /// AES-128 key as 32 hex characters.
    #[arg(long, value_name = "HEX")]
    key_hex: String,
    /// Plaintext block as 32 hex characters.
    #[arg(long, value_name = "HEX")]
    plaintext_hex: String,
}

#[derive(Args)]
struct HandlerArgs {
    /// Wait for the completion interrupt instead of polling status.
    #[arg(long, default_value_t = false)]
    interrupt: bool,
    /// Give up on a wait after this many ticks.
    #[arg(long, value_name = "TICKS")]
    wait_budget: Option<u64>,
}

impl HandlerArgs {
    fn apply(&self, config: &mut HandlerConfig) {
        if self.interrupt {
            config.completion = CompletionMode::Interrupt;
        }
        if self.wait_budget.is_some() {
            config.wait_budget = self.wait_budget;
        }
    }

    fn to_config(&self) -> HandlerConfig {
        let mut config = HandlerConfig::default();
        self.apply(&mut config);
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose).context("install logger")?;
    match cli.command {
        Commands::Serve {
            config,
            input,
            output,
            banner,
            handler,
        } => cmd_serve(
            config.as_deref(),
            input.as_deref(),
            output.as_deref(),
            banner,
            &handler,
        ),
        Commands::Encrypt { block, handler } => cmd_encrypt(&block, &handler),
        Commands::Frame { block } => cmd_frame(&block),
        Commands::Bench { bench, handler } => cmd_bench(&bench, &handler),
    }
}

fn cmd_serve(
    config_path: Option<&Path>,
    input_path: Option<&Path>,
    output_path: Option<&Path>,
    banner: bool,
    args: &HandlerArgs,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => LinkConfig::default(),
    };
    args.apply(&mut config.handler);
    config.handler.banner |= banner;

    let input: Box<dyn Read> = match input_path {
        Some(path) => {
            Box::new(File::open(path).with_context(|| format!("open {}", path.display()))?)
        }
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match output_path {
        Some(path) => {
            Box::new(File::create(path).with_context(|| format!("create {}", path.display()))?)
        }
        None => Box::new(io::stdout().lock()),
    };

    info!(
        "serving on {} ({} completion)",
        config.serial, config.handler.completion
    );
    let mut handler = simulated_handler(config.handler)?;
    handler.run(input, output).context("serve link")?;
    Ok(())
}

fn cmd_encrypt(block: &BlockArgs, args: &HandlerArgs) -> Result<()> {
    let request = parse_request(block)?;
    let mut handler = simulated_handler(args.to_config())?;
    let response = handler.process(&request).context("encrypt block")?;
    println!("ciphertext: {}", hex::encode(response.ciphertext));
    println!("cycles: {}", response.cycles);
    Ok(())
}

fn cmd_frame(block: &BlockArgs) -> Result<()> {
    let request = parse_request(block)?;
    println!("{}", hex::encode(request.encode()));
    Ok(())
}

const NIST_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
const NIST_PLAINTEXT: &str = "3243f6a8885a308d313198a2e0370734";
const NIST_CIPHERTEXT: &str = "3925841d02dc09fbdc118597196a0b32";

#[derive(Default)]
struct BenchReport {
    passed: usize,
    failed: usize,
    lost: usize,
    spurious: usize,
    cycles: Vec<u32>,
}

fn cmd_bench(bench: &BenchArgs, args: &HandlerArgs) -> Result<()> {
    if bench.clock_mhz.is_nan() || bench.clock_mhz <= 0.0 {
        bail!("clock frequency must be positive");
    }
    let config = args.to_config();
    println!("mode: {}", config.completion);
    println!("clock: {} MHz", bench.clock_mhz);
    let mut handler = simulated_handler(config)?;

    let key = parse_block_hex(NIST_KEY, "key")?;
    let plaintext = parse_block_hex(NIST_PLAINTEXT, "plaintext")?;
    let expected = parse_block_hex(NIST_CIPHERTEXT, "ciphertext")?;
    let response = handler
        .process(&RequestFrame::new(key, plaintext))
        .context("known-answer test")?;
    if response.ciphertext != expected {
        bail!(
            "known-answer test failed: got {}, expected {}",
            hex::encode(response.ciphertext),
            NIST_CIPHERTEXT
        );
    }
    println!("known-answer test: ok ({} cycles)", response.cycles);

    let mut rng = seeded_rng(bench.seed);
    let report = run_vectors(&mut handler, &mut rng, bench.vectors, bench.max_garbage)?;
    report.print(bench.vectors, bench.clock_mhz);
    let stats = handler.stats();
    println!(
        "link: {} resyncs, {} bytes discarded",
        stats.resyncs, stats.discarded_bytes
    );
    if report.failed > 0 {
        bail!(
            "{} vectors did not match the software reference",
            report.failed
        );
    }

    if let Some(secs) = bench.throughput_time {
        let window = Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|window| !window.is_zero())
            .context("throughput time must be a positive number of seconds")?;
        let throughput = run_throughput(&mut handler, &mut rng, window)?;
        println!(
            "throughput: {} blocks in {:.2}s",
            throughput.blocks,
            throughput.elapsed.as_secs_f64()
        );
        println!(
            "  {:.1} blocks/s, {:.1} bytes/s, {:.2} kbps",
            throughput.blocks_per_sec(),
            throughput.bytes_per_sec(),
            throughput.kbps()
        );
        println!(
            "  avg {:.2} cycles ({:.3} us per block at {} MHz)",
            throughput.avg_cycles(),
            cycles_to_us(throughput.avg_cycles(), bench.clock_mhz),
            bench.clock_mhz
        );
    }

    if let Some(samples) = bench.latency_samples {
        match run_latency(&mut handler, &mut rng, samples)? {
            Some(latency) => {
                println!("latency: {} samples", latency.samples);
                println!(
                    "  round trip ms: min {:.4}, max {:.4}, avg {:.4}, median {:.4}, p95 {:.4}, p99 {:.4}",
                    latency.min_ms,
                    latency.max_ms,
                    latency.avg_ms,
                    latency.median_ms,
                    latency.p95_ms,
                    latency.p99_ms
                );
                println!(
                    "  hardware cycles: min {}, max {}, avg {:.2} ({:.3} us at {} MHz)",
                    latency.min_cycles,
                    latency.max_cycles,
                    latency.avg_cycles,
                    cycles_to_us(latency.avg_cycles, bench.clock_mhz),
                    bench.clock_mhz
                );
            }
            None => println!("latency: no samples"),
        }
    }
    Ok(())
}

fn random_block(rng: &mut impl RngCore) -> Block {
    let mut block = [0u8; 16];
    rng.fill_bytes(&mut block);
    block
}

fn run_vectors<B, C>(
    handler: &mut ProtocolHandler<B, C>,
    rng: &mut impl Rng,
    vectors: usize,
    max_garbage: usize,
) -> Result<BenchReport>
where
    B: RegisterBus,
    C: CycleCounter,
{
    let mut report = BenchReport::default();
    for _ in 0..vectors {
        let request = RequestFrame::new(random_block(rng), random_block(rng));

        if max_garbage > 0 {
            let len = rng.gen_range(0..=max_garbage);
            let garbage: Vec<u8> = (0..len).map(|_| rng.gen_range(0..0xff)).collect();
            for &byte in garbage.iter().chain(MARKER.iter()) {
                if handler.feed(byte)?.is_some() {
                    report.spurious += 1;
                }
            }
        }

        let bytes = request.encode();
        let (last, head) = bytes
            .split_last()
            .context("request frame is never empty")?;
        for &byte in head {
            if handler.feed(byte)?.is_some() {
                report.spurious += 1;
            }
        }
        match handler.feed(*last)? {
            Some(response) => report.record(&request, &response),
            None => report.lost += 1,
        }
    }
    Ok(report)
}

/// Encrypts random blocks under one key until `window` has passed.
fn run_throughput<B, C>(
    handler: &mut ProtocolHandler<B, C>,
    rng: &mut impl RngCore,
    window: Duration,
) -> Result<Throughput>
where
    B: RegisterBus,
    C: CycleCounter,
{
    let key = random_block(rng);
    let started = Instant::now();
    let mut blocks = 0;
    let mut total_cycles = 0;
    while started.elapsed() < window {
        let response = handler.process(&RequestFrame::new(key, random_block(rng)))?;
        blocks += 1;
        total_cycles += u64::from(response.cycles);
    }
    Ok(Throughput {
        blocks,
        elapsed: started.elapsed(),
        total_cycles,
    })
}

/// Times `samples` individual round trips under one key.
fn run_latency<B, C>(
    handler: &mut ProtocolHandler<B, C>,
    rng: &mut impl RngCore,
    samples: usize,
) -> Result<Option<Latency>>
where
    B: RegisterBus,
    C: CycleCounter,
{
    let key = random_block(rng);
    let mut latencies_ms = Vec::with_capacity(samples);
    let mut cycles = Vec::with_capacity(samples);
    for _ in 0..samples {
        let request = RequestFrame::new(key, random_block(rng));
        let started = Instant::now();
        let response = handler.process(&request)?;
        latencies_ms.push(started.elapsed().as_secs_f64() * 1000.0);
        cycles.push(response.cycles);
    }
    Ok(Latency::from_samples(latencies_ms, &cycles))
}

impl BenchReport {
    fn print(&self, vectors: usize, clock_mhz: f64) {
        println!(
            "vectors: {} passed, {} failed, {} lost, {} spurious",
            self.passed, self.failed, self.lost, self.spurious
        );
        if vectors > 0 {
            println!(
                "pass rate: {:.1}%",
                100.0 * self.passed as f64 / vectors as f64
            );
        }
        if let (Some(min), Some(max)) = (self.cycles.iter().min(), self.cycles.iter().max()) {
            let avg = self.cycles.iter().map(|&c| u64::from(c)).sum::<u64>() as f64
                / self.cycles.len() as f64;
            println!(
                "cycles: min {min}, max {max}, avg {avg:.2} ({:.3} us at {clock_mhz} MHz)",
                cycles_to_us(avg, clock_mhz)
            );
        }
    }

    fn record(&mut self, request: &RequestFrame, response: &ResponseFrame) {
        let round_keys = expand_key(&Aes128Key::from(request.key));
        if encrypt_block(&request.plaintext, &round_keys) == response.ciphertext {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.cycles.push(response.cycles);
    }
}

fn simulated_handler(config: HandlerConfig) -> Result<ProtocolHandler<SimBus, DownCounter>> {
    let bus = SimBus::default();
    let counter = DownCounter::new(bus.clock());
    ProtocolHandler::new(bus, counter, config).context("bring up accelerator")
}

fn load_config(path: &Path) -> Result<LinkConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    LinkConfig::from_toml_str(&text).with_context(|| format!("parse {}", path.display()))
}

fn parse_request(block: &BlockArgs) -> Result<RequestFrame> {
    Ok(RequestFrame::new(
        parse_block_hex(&block.key_hex, "key")?,
        parse_block_hex(&block.plaintext_hex, "plaintext")?,
    ))
}

fn parse_block_hex(hex_str: &str, what: &str) -> Result<Block> {
    let bytes = hex::decode(hex_str.trim()).with_context(|| format!("decode {what} hex"))?;
    if bytes.len() != 16 {
        bail!("{what} must be 16 bytes (32 hex characters)");
    }
    let mut block = [0u8; 16];
    block.copy_from_slice(&bytes);
    Ok(block)
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    match seed {
        Some(value) => {
            let mut seed_bytes = [0u8; 32];
            seed_bytes[..8].copy_from_slice(&value.to_le_bytes());
            ChaCha20Rng::from_seed(seed_bytes)
        }
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}
