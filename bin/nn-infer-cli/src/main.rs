// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # nninfer
//!
//! Command-line interface for the inference engine.
//!
//! ## Usage
//! ```bash
//! # Run a model on a JSON tensor
//! nninfer run --model ./models/lenet.msgpack.gz --input digit.json --output scores.json
//!
//! # Print the node table
//! nninfer inspect --model ./models/lenet.msgpack.gz
//!
//! # Check a layer against a reference fixture
//! nninfer verify --kind conv --fixture data/conv.json
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nninfer",
    about = "Feed-forward neural network inference on CPU",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (overrides CLI arguments).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a model on input tensors read from JSON.
    Run {
        /// Path to the model file.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Model framing: raw or gzip (default: from the file extension).
        #[arg(long, value_parser = commands::parse_framing)]
        framing: Option<model_ir::Framing>,

        /// JSON file holding one tensor or `{ "inputs": [...] }`.
        #[arg(short, long)]
        input: PathBuf,

        /// Write the output tensor here as JSON.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the run metrics here as JSON.
        #[arg(long)]
        metrics: Option<PathBuf>,
    },

    /// Inspect a model: print its node table and parameter counts.
    Inspect {
        /// Path to the model file.
        #[arg(short, long)]
        model: PathBuf,

        /// Model framing: raw or gzip (default: from the file extension).
        #[arg(long, value_parser = commands::parse_framing)]
        framing: Option<model_ir::Framing>,
    },

    /// Re-encode a model file, e.g. to add or strip gzip framing.
    Convert {
        /// Source model file.
        #[arg(short, long)]
        model: PathBuf,

        /// Destination file.
        #[arg(long)]
        to: PathBuf,

        /// Destination framing (default: from the destination extension).
        #[arg(long, value_parser = commands::parse_framing)]
        framing: Option<model_ir::Framing>,
    },

    /// Check one layer against a reference fixture.
    Verify {
        /// Fixture kind.
        #[arg(short, long, value_enum)]
        kind: commands::verify::FixtureKind,

        /// Path to the fixture JSON.
        #[arg(short, long)]
        fixture: PathBuf,

        /// Largest absolute error tolerated.
        #[arg(long, default_value_t = 1e-5)]
        eps: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            model,
            framing,
            input,
            output,
            metrics,
        } => commands::run::execute(commands::run::RunArgs {
            config: cli.config,
            model,
            framing,
            input,
            output,
            metrics,
        }),
        Commands::Inspect { model, framing } => commands::inspect::execute(model, framing),
        Commands::Convert { model, to, framing } => commands::inspect::convert(model, to, framing),
        Commands::Verify { kind, fixture, eps } => commands::verify::execute(kind, fixture, eps),
    }
}
