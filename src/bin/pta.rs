//! `pta` - Points-to analysis CLI
//!
//! # Usage
//!
//! ```bash
//! pta --input events.json --policy 2-cfa
//! pta --input events.json --preset thorough --async-facts facts.jsonl
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use codegraph_ir::config::{EngineConfig, Preset};
use codegraph_ir::domain::FunctionIr;
use codegraph_ir::features::{collect, to_jsonl};
use codegraph_ir::{Engine, PtaResult};

#[derive(Parser)]
#[command(name = "pta")]
#[command(about = "Context-sensitive points-to analysis over a semantic event stream", long_about = None)]
struct Cli {
    /// Path to the JSON input file; reads stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Context-sensitivity policy token (e.g. `0-cfa`, `2-cfa`, `1-obj`, `1-rcv`, `1c1o`).
    #[arg(short, long, conflicts_with = "preset")]
    policy: Option<String>,

    /// Named configuration preset (`fast`, `balanced`, `thorough`).
    #[arg(long, conflicts_with = "policy")]
    preset: Option<String>,

    /// Iteration cap; the engine stops early and marks the result partial if exceeded.
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Wall-clock timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Verbose engine logging.
    #[arg(short, long)]
    verbose: bool,

    /// Also run the async-facts helper and write its JSONL export here.
    #[arg(long)]
    async_facts: Option<PathBuf>,
}

/// Input shape: a map from function name to its event stream, matching
/// `FunctionIr` minus the `name` field (supplied by the map key).
#[derive(Debug, Deserialize)]
struct InputFunction {
    #[serde(default)]
    params: Option<Vec<String>>,
    events: Vec<codegraph_ir::Event>,
}

fn build_config(cli: &Cli) -> PtaResult<EngineConfig> {
    let mut config = if let Some(preset) = &cli.preset {
        Preset::parse(preset)?.build()
    } else if let Some(policy) = &cli.policy {
        EngineConfig::with_policy_token(policy)?
    } else {
        Preset::Balanced.build()
    };
    if let Some(n) = cli.max_iterations {
        config = config.max_iterations(n);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.timeout(Duration::from_secs(secs));
    }
    config = config.verbose(cli.verbose);
    config.validate()?;
    Ok(config)
}

fn read_input(path: &Option<PathBuf>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run() -> PtaResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    if cli.verbose {
        tracing_subscriber::fmt::init();
    }

    let raw = read_input(&cli.input)?;
    let input: FxHashMap<String, InputFunction> = serde_json::from_str(&raw)?;
    let function_irs: FxHashMap<String, FunctionIr> = input
        .into_iter()
        .map(|(name, f)| {
            let ir = FunctionIr { name: name.clone(), params: f.params, events: f.events };
            (name, ir)
        })
        .collect();

    let mut engine = Engine::new(config)?;
    for (name, ir) in function_irs.clone() {
        engine.register_function(name, ir);
    }

    engine.initialize();
    let outcome = engine.run();
    if outcome.partial {
        eprintln!("warning: analysis stopped early after {} iterations (partial result)", outcome.iterations);
    }

    if let Some(path) = &cli.async_facts {
        let facts = collect(&function_irs, engine.env());
        let jsonl = to_jsonl(&facts)?;
        fs::write(path, jsonl)?;
    }

    let bundle = engine.results();
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
