//! # dupe-pairs CLI
//!
//! Command-line interface for the near-duplicate pair finder.
//!
//! ## Usage
//! ```bash
//! dupe-pairs find ~/Photos/originals ~/Downloads
//! dupe-pairs review
//! dupe-pairs delete --dry-run
//! ```

mod cli;

use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
