//! `gol_engine`: run Life-like patterns headlessly and manage the rule library.
//!
//! ```text
//! gol_engine run glider.rle -g 100 --rule B36/S23
//! gol_engine run "Gosper glider gun" -g 120 --print
//! gol_engine rules list --config gol.toml
//! gol_engine rules add HighLife B36/S23 --description "Has a replicator"
//! gol_engine presets
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::{LevelFilter, Log, Metadata, Record};

use gol_engine::application::{GenerationEngine, Settings};
use gol_engine::domain::{Pattern, presets, read_rules, rle, write_rules};

#[derive(Parser)]
#[command(name = "gol_engine", about = "Unbounded Life-like cellular automaton engine")]
struct Args {
    /// Settings file (TOML); built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a pattern and step it.
    Run {
        /// RLE file, or the name of a built-in pattern.
        pattern: String,

        /// Generations to run.
        #[arg(short, long, default_value_t = 100)]
        generations: u64,

        /// Rule to run under; overrides the pattern's own rule.
        #[arg(long)]
        rule: Option<String>,

        /// Print the final grid.
        #[arg(long)]
        print: bool,
    },
    /// Manage the rule library.
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
    /// List the built-in patterns.
    Presets,
}

#[derive(Subcommand)]
enum RulesAction {
    /// List every rule in the library.
    List,
    /// Append a rule and save the library.
    Add {
        name: String,
        rule: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) -> Result<()> {
    log::set_logger(&LOGGER).map_err(|e| anyhow!("could not install logger: {e}"))?;
    log::set_max_level(match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    });
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn load_pattern(source: &str) -> Result<Pattern> {
    let path = Path::new(source);
    if path.exists() {
        return rle::read_pattern_file(path).with_context(|| format!("decoding {source}"));
    }
    let preset = presets::find(source)
        .with_context(|| format!("{source:?} is neither a file nor a built-in pattern"))?;
    Ok(preset.pattern()?)
}

fn run(
    settings: &Settings,
    source: &str,
    generations: u64,
    rule: Option<&str>,
    print: bool,
) -> Result<()> {
    let pattern = load_pattern(source)?;
    let rules = settings.shared_rules().context("opening rule library")?;
    let mut engine = GenerationEngine::from_settings(settings, rules)?;

    if let Some(rule) = rule.or(pattern.rule()) {
        if !engine.set_rule_string(Some(rule)) {
            bail!("invalid rule string {rule:?}");
        }
    }
    engine.set_pattern(&pattern);

    let started = Instant::now();
    for _ in 0..generations {
        engine.next_generation()?;
    }
    let elapsed = started.elapsed();

    let name = if pattern.name.is_empty() { source } else { pattern.name.as_str() };
    println!("pattern:     {name}");
    println!("rule:        {}", engine.active_rule());
    println!("generation:  {}", engine.generation_no());
    println!("extent:      {}x{}", engine.width(), engine.height());
    println!("origin:      {:?}", engine.origin());
    println!("population:  {}", engine.population());
    println!("elapsed:     {elapsed:.2?} on {} workers", engine.workers());
    if print {
        print!("{engine}");
    }
    Ok(())
}

fn rules(settings: &Settings, action: RulesAction) -> Result<()> {
    let shared = settings.shared_rules().context("opening rule library")?;
    match action {
        RulesAction::List => {
            let rules = read_rules(&shared);
            for entry in rules.library() {
                println!(
                    "{:>3}  {:<24} {:<12} {}",
                    entry.index, entry.name, entry.rule_string, entry.description
                );
            }
        }
        RulesAction::Add { name, rule, description } => {
            if settings.rules.library.is_none() {
                bail!("no [rules] library file configured; nothing to save to");
            }
            let entry = write_rules(&shared).add_rule(&name, &rule, &description)?;
            println!("added {} as rule {}", entry.name, entry.index);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;
    let settings = load_settings(args.config.as_deref())?;

    match args.command {
        Command::Run { pattern, generations, rule, print } => {
            run(&settings, &pattern, generations, rule.as_deref(), print)
        }
        Command::Rules { action } => rules(&settings, action),
        Command::Presets => {
            for preset in presets::all_patterns() {
                println!("{:<20} {}", preset.name, preset.description);
            }
            Ok(())
        }
    }
}
