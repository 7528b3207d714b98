//! # CLI Module
//!
//! Command-line interface for the near-duplicate pair finder.
//!
//! ## Usage
//! ```bash
//! # Find copies of ~/Photos/originals inside ~/Downloads
//! dupe-pairs find ~/Photos/originals ~/Downloads
//!
//! # Keep weaker matches too, with fewer workers
//! dupe-pairs find ~/Photos/originals ~/Downloads --min-confidence 2 --workers 4
//!
//! # Confirm pairs one by one (resumes where you stopped)
//! dupe-pairs review
//!
//! # Act on the confirmed duplicates
//! dupe-pairs move ~/dupes --dry-run
//! dupe-pairs delete
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Key, Term};
use dupe_pairs::core::actions::{Action, ActionOptions, ActionReport, DuplicateActions};
use dupe_pairs::core::hasher::ImageDecoder;
use dupe_pairs::core::matcher::ConfidenceThresholds;
use dupe_pairs::core::pipeline::{
    DetectConfigBuilder, DetectionPipeline, DetectionReport, PipelineContext,
    DEFAULT_MIN_CONFIDENCE, DEFAULT_RESULTS_FILE,
};
use dupe_pairs::core::progress::{default_style, ProgressMonitor, ProgressSummary};
use dupe_pairs::core::results::{JsonFileStore, ResultsStore};
use dupe_pairs::core::review::{ReviewItem, ReviewPair, ReviewSession};
use dupe_pairs::core::scanner::WalkErrorPolicy;
use dupe_pairs::error::Result;
use dupe_pairs::events::EventChannel;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;

/// Log file used with `--log`
const LOG_FILE: &str = "dupe-pairs.log";

/// Dupe Pairs - find copies of your reference photos hiding elsewhere
#[derive(Parser, Debug)]
#[command(name = "dupe-pairs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Append log output to dupe-pairs.log instead of the terminal
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find near-duplicates of reference images in an evaluation tree
    Find(FindArgs),

    /// Step through the found pairs and confirm real duplicates
    Review {
        #[command(flatten)]
        results: ResultsArg,
    },

    /// Move the duplicate image of each confirmed pair into a directory
    Move {
        /// Directory to move duplicates into
        destination: PathBuf,

        #[command(flatten)]
        action: ActionArgs,
    },

    /// Delete the duplicate image of each confirmed pair
    Delete {
        #[command(flatten)]
        action: ActionArgs,
    },
}

#[derive(Args, Debug)]
struct FindArgs {
    /// Directory holding the originals
    reference: PathBuf,

    /// Directory to search for copies of the originals
    evaluation: PathBuf,

    /// Results file to write
    #[arg(short, long, default_value = DEFAULT_RESULTS_FILE)]
    output: PathBuf,

    /// Lowest confidence (1-5) to keep
    #[arg(short = 'c', long, default_value_t = DEFAULT_MIN_CONFIDENCE,
          value_parser = clap::value_parser!(u8).range(1..=5))]
    min_confidence: u8,

    /// Five increasing distance cut-offs for confidence 5..1
    #[arg(long, value_name = "D5,D4,D3,D2,D1")]
    thresholds: Option<ConfidenceThresholds>,

    /// Number of image reading workers (capped by the open file limit)
    #[arg(short, long, env = "DUPE_PAIRS_WORKERS")]
    workers: Option<usize>,

    /// Open file limit to budget workers against (default: the process limit)
    #[arg(long, env = "DUPE_PAIRS_FD_LIMIT")]
    fd_limit: Option<u64>,

    /// Skip unreadable directories instead of stopping
    #[arg(long)]
    skip_unreadable: bool,

    /// Ignore hidden files and directories
    #[arg(long)]
    exclude_hidden: bool,

    /// Follow symbolic links
    #[arg(long)]
    follow_symlinks: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct ResultsArg {
    /// Results file written by `find`
    #[arg(short, long = "input", default_value = DEFAULT_RESULTS_FILE)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct ActionArgs {
    #[command(flatten)]
    results: ResultsArg,

    /// Act on every pair, not only confirmed ones
    #[arg(long)]
    all: bool,

    /// Show what would happen without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON summary for scripting
    Json,
    /// Minimal output (one tab-separated pair per line)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log.then(|| PathBuf::from(LOG_FILE));
    dupe_pairs::init_tracing(log_file.as_deref())?;

    match cli.command {
        Commands::Find(args) => run_find(args),
        Commands::Review { results } => run_review(results),
        Commands::Move {
            destination,
            action,
        } => run_action(Action::Move { destination }, action),
        Commands::Delete { action } => run_action(Action::Delete, action),
    }
}

fn run_find(args: FindArgs) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(args.format, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Dupe Pairs").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let walk_errors = if args.skip_unreadable {
        WalkErrorPolicy::Skip
    } else {
        WalkErrorPolicy::Abort
    };

    let mut builder = DetectConfigBuilder::new(&args.reference, &args.evaluation)
        .min_confidence(args.min_confidence)
        .walk_errors(walk_errors)
        .include_hidden(!args.exclude_hidden)
        .follow_symlinks(args.follow_symlinks)
        .output(&args.output);
    if let Some(thresholds) = args.thresholds {
        builder = builder.thresholds(thresholds);
    }
    if let Some(workers) = args.workers {
        builder = builder.worker_cap(workers);
    }
    if let Some(limit) = args.fd_limit {
        builder = builder.fd_ceiling(limit);
    }

    let ctx = PipelineContext::new(builder.build()?)?;
    if pretty && args.verbose {
        term.write_line(&format!(
            "  {} workers (open file limit {})",
            style(ctx.worker_cap()).cyan(),
            ctx.descriptor_ceiling()
        ))
        .ok();
    }
    let pipeline = DetectionPipeline::new(ctx);

    // Set up event handling
    let (sender, receiver) = EventChannel::new();
    let bar = if pretty {
        let pb = ProgressBar::new(0);
        pb.set_style(default_style());
        pb
    } else {
        ProgressBar::hidden()
    };
    let monitor = ProgressMonitor::spawn(receiver, bar);

    let outcome = pipeline.run_with_events(&sender);

    // Drop sender to let the monitor finish
    drop(sender);
    let progress = monitor.finish();
    let report = outcome?;

    match args.format {
        OutputFormat::Pretty => print_pretty_report(&term, &report, progress, args.verbose),
        OutputFormat::Json => print_json_report(&report),
        OutputFormat::Minimal => print_minimal_report(&report),
    }

    Ok(())
}

fn print_pretty_report(
    term: &Term,
    report: &DetectionReport,
    progress: ProgressSummary,
    verbose: bool,
) {
    term.write_line(&format!("{} Search Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} reference and {} evaluation images read in {:.1}s",
        style(report.reference_photos).cyan(),
        style(report.evaluation_photos).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} candidate pairs saved to {}",
        style(report.results.len()).cyan(),
        style(report.output.display()).bold()
    ))
    .ok();

    let skipped = progress.failed.max(report.failures.len()) + report.scan_errors.len();
    if skipped > 0 {
        term.write_line(&format!(
            "  {} files or directories could not be read and were skipped",
            style(skipped).yellow()
        ))
        .ok();

        if verbose {
            for error in &report.scan_errors {
                term.write_line(&format!("    {} {}", style("!").yellow(), error))
                    .ok();
            }
            for failure in &report.failures {
                term.write_line(&format!("    {} {}", style("!").yellow(), failure.error))
                    .ok();
            }
        }
    }

    term.write_line("").ok();

    if report.results.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green()))
            .ok();
    } else if verbose {
        for pair in &report.results.image_pairs {
            term.write_line(&format!(
                "  {} {}\n      {} {}",
                style(format!("[{}]", pair.confidence)).yellow(),
                pair.reference_image.display(),
                style("~").dim(),
                pair.duplicate_image.display()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("No files were changed. Run `dupe-pairs review` to confirm pairs.").dim()
    ))
    .ok();
}

fn print_json_report(report: &DetectionReport) {
    let output = serde_json::json!({
        "output": report.output,
        "reference_photos": report.reference_photos,
        "evaluation_photos": report.evaluation_photos,
        "pairs_found": report.results.len(),
        "skipped": report.failures.iter().map(|f| {
            serde_json::json!({ "path": f.path, "error": f.error.to_string() })
        }).collect::<Vec<_>>(),
        "duration_ms": report.duration_ms,
        "results": &report.results,
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("cannot render JSON: {}", e),
    }
}

fn print_minimal_report(report: &DetectionReport) {
    for pair in &report.results.image_pairs {
        println!(
            "{}\t{}\t{}",
            pair.confidence,
            pair.reference_image.display(),
            pair.duplicate_image.display()
        );
    }
}

fn run_review(args: ResultsArg) -> Result<()> {
    let term = Term::stdout();
    let store = JsonFileStore::new(&args.input);
    let mut session = ReviewSession::open(store, Arc::new(ImageDecoder::default()))?;

    loop {
        let shown = session.current();
        print_review_pair(&term, &shown, session.cursor(), session.len());

        match read_key(&term) {
            'y' => {
                session.confirm()?;
            }
            'n' | ' ' => {
                session.next()?;
            }
            'p' => {
                session.previous()?;
            }
            'q' => break,
            _ => {}
        }
    }

    let confirmed = session.results().confirmed().count();
    term.write_line(&format!(
        "{} {} of {} pairs confirmed; progress saved to {}",
        style("✓").green().bold(),
        style(confirmed).cyan(),
        session.len(),
        args.input.display()
    ))
    .ok();
    Ok(())
}

fn print_review_pair(term: &Term, shown: &ReviewPair, cursor: usize, len: usize) {
    term.write_line("").ok();

    if cursor >= len {
        term.write_line(&format!(
            "{} All {} pairs reviewed. [p] back  [q] quit",
            style("✓").green().bold(),
            len
        ))
        .ok();
        return;
    }

    let status = if shown.pair.confirmed {
        style("confirmed").green().to_string()
    } else {
        style("unconfirmed").dim().to_string()
    };
    term.write_line(&format!(
        "{} confidence {}  {}",
        style(format!("[{}/{}]", shown.index + 1, len)).bold(),
        style(shown.pair.confidence).yellow(),
        status
    ))
    .ok();
    term.write_line(&format!("  reference  {}", describe(&shown.reference)))
        .ok();
    term.write_line(&format!("  duplicate  {}", describe(&shown.duplicate)))
        .ok();
    term.write_line(&format!(
        "{}",
        style("[y] confirm  [n] skip  [p] back  [q] quit").dim()
    ))
    .ok();
}

fn describe(item: &ReviewItem) -> String {
    match (item.dimensions(), item.image.failure()) {
        (Some((w, h)), _) => format!("{} ({}x{})", item.path.display(), w, h),
        (None, Some(reason)) => format!(
            "{} {}",
            item.path.display(),
            style(format!("(unreadable: {})", reason)).red()
        ),
        (None, None) => item.path.display().to_string(),
    }
}

/// One lower-case key press; end of input counts as quit
fn read_key(term: &Term) -> char {
    if term.is_term() {
        return match term.read_key() {
            Ok(Key::Char(c)) => c.to_ascii_lowercase(),
            Ok(Key::Escape) => 'q',
            Ok(Key::ArrowRight) | Ok(Key::Enter) => 'n',
            Ok(Key::ArrowLeft) => 'p',
            Ok(_) => '\0',
            Err(_) => 'q',
        };
    }

    match term.read_line() {
        Ok(line) => line
            .trim()
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or('q'),
        Err(_) => 'q',
    }
}

fn run_action(action: Action, args: ActionArgs) -> Result<()> {
    let term = Term::stderr();
    let results = JsonFileStore::new(&args.results.input).load()?;
    let options = ActionOptions {
        include_unconfirmed: args.all,
        dry_run: args.dry_run,
    };

    let targets = DuplicateActions::targets(&results, options);
    if targets.is_empty() {
        term.write_line(&format!(
            "{} Nothing to do: no confirmed pairs (use --all to include unconfirmed pairs)",
            style("i").cyan()
        ))
        .ok();
        return Ok(());
    }

    let verb = match &action {
        Action::Move { destination } => format!("Move to {}", destination.display()),
        Action::Delete => "Delete".to_string(),
    };

    if !args.dry_run && !args.yes {
        term.write_str(&format!("{} {} files? [y/N] ", verb, targets.len()))
            .ok();
        let answer = term.read_line().unwrap_or_default();
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            term.write_line("Aborted; no files were changed.").ok();
            return Ok(());
        }
    }

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(default_style());
    pb.set_message(verb);
    let report = DuplicateActions::execute(&results, &action, options, |done, total, _| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish_and_clear();

    print_action_report(&term, &action, &report);
    Ok(())
}

fn print_action_report(term: &Term, action: &Action, report: &ActionReport) {
    if report.dry_run {
        for path in &report.processed {
            let line = match action {
                Action::Move { destination } => {
                    match DuplicateActions::destination_for(path, destination) {
                        Ok(target) => {
                            format!("would move {} -> {}", path.display(), target.display())
                        }
                        Err(_) => format!("would move {}", path.display()),
                    }
                }
                Action::Delete => format!("would delete {}", path.display()),
            };
            term.write_line(&format!("  {}", style(line).dim())).ok();
        }
    }

    let done = if report.dry_run { "would be processed" } else { "processed" };
    term.write_line(&format!(
        "{} {} files {}",
        style("✓").green().bold(),
        style(report.processed.len()).cyan(),
        done
    ))
    .ok();

    if !report.failures.is_empty() {
        term.write_line(&format!(
            "{} {} files failed:",
            style("!").red().bold(),
            report.failures.len()
        ))
        .ok();
        for failure in &report.failures {
            term.write_line(&format!(
                "    {}: {}",
                failure.path.display(),
                failure.message
            ))
            .ok();
        }
    }
}
