//! biograph - biography graph synthesis CLI
//!
//! Fuses per-document annotation bundles (NER, relations, semantic roles,
//! entity links, coreference, temporal expressions) into one consistent
//! entity/event graph per document, and optionally one merged graph per
//! group of documents.
//!
//! # Usage
//!
//! ```bash
//! # One document
//! biograph convert albrecht_duerer.nlp.json
//!
//! # A whole movement, with a merged group-level graph
//! biograph batch data/art_nouveau --group art_nouveau --merge
//! ```

use biograph::cli::{run, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
