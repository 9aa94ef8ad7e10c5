// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nninfer run` command: execute a model on JSON inputs.
//!
//! Demonstrates the full type-state pipeline:
//! ```text
//! InferenceEngine<Idle> → load_model → <Ready> → run
//! ```

use super::{preview, read_inputs, write_json, JsonTensor};
use anyhow::Context;
use model_ir::Framing;
use runtime::{InferenceEngine, InferenceOutput, RuntimeConfig};
use std::path::PathBuf;
use tensor_core::TensorView;

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub framing: Option<Framing>,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub metrics: Option<PathBuf>,
}

pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              nninfer · Inference Runner              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Configuration ──────────────────────────────────────────
    let config = resolve_config(&args)?;

    println!("  Config:");
    println!("   Model:     {}", config.model_path.display());
    println!("   Framing:   {}", config.resolve_framing());
    println!("   Profiling: {}", config.enable_profiling);
    println!("   Input:     {}", args.input.display());
    println!();

    // ── Type-State Pipeline ────────────────────────────────────
    println!("  [1/2] Loading model...");
    let model_path = config.model_path.clone();
    let engine = InferenceEngine::new(config)
        .load_model()
        .map_err(|e| {
            tracing::warn!("model load failed: {e}");
            e
        })
        .with_context(|| format!("failed to load model from '{}'", model_path.display()))?;
    println!("        {}", engine.graph().summary());
    println!();

    let inputs = read_inputs(&args.input)?;
    let views: Vec<TensorView<'_>> = inputs.iter().map(|t| t.view()).collect();

    println!("  [2/2] Running inference ({} input tensor(s))...", views.len());
    let output = engine.run(&views)?;
    println!();

    print_results(&output);

    if let Some(path) = &args.output {
        write_json(path, &JsonTensor::from_tensor(&output.output))?;
        println!("  Output written to {}", path.display());
    }
    if let Some(path) = &args.metrics {
        write_json(path, &output.metrics)?;
        println!("  Metrics written to {}", path.display());
    }

    Ok(())
}

/// A config file wins over `--model` / `--framing`.
fn resolve_config(args: &RunArgs) -> anyhow::Result<RuntimeConfig> {
    match (&args.config, &args.model) {
        (Some(path), _) => {
            let ignored = ignored_flags(args);
            if !ignored.is_empty() {
                tracing::warn!(
                    "config file '{}' takes precedence; ignoring {}",
                    path.display(),
                    ignored.join(", ")
                );
            }
            Ok(RuntimeConfig::from_file(path)?)
        }
        (None, Some(model)) => Ok(RuntimeConfig {
            framing: args.framing,
            ..RuntimeConfig::for_model(model.clone())
        }),
        (None, None) => anyhow::bail!("either --model or --config is required"),
    }
}

/// Model flags that a config file overrides.
fn ignored_flags(args: &RunArgs) -> Vec<&'static str> {
    if args.config.is_none() {
        return Vec::new();
    }
    let mut ignored = Vec::new();
    if args.model.is_some() {
        ignored.push("--model");
    }
    if args.framing.is_some() {
        ignored.push("--framing");
    }
    ignored
}

fn print_results(output: &InferenceOutput) {
    println!("  Results:");
    println!("   Shape:  {}", output.output.shape());
    println!("   Values: {}", preview(&output.output.to_vec(), 10));
    if let Some(best) = argmax(&output.output.to_vec()) {
        println!("   Argmax: {best}");
    }
    println!();

    println!("  Metrics:");
    println!("   {}", output.metrics.summary());
    if let Some(slowest) = output.metrics.slowest_node() {
        println!(
            "   Slowest: #{} {} ({:.3} ms)",
            slowest.node_id,
            slowest.node_name,
            slowest.compute_duration.as_secs_f64() * 1000.0,
        );
    }
    if !output.metrics.node_metrics.is_empty() {
        println!();
        println!(
            "   {:<4} {:<20} {:<12} {:<16} {:>10} {:>10}",
            "Id", "Name", "Kind", "Output", "Time", "Live",
        );
        println!("   {}", "-".repeat(76));
        for m in &output.metrics.node_metrics {
            println!(
                "   {:<4} {:<20} {:<12} {:<16} {:>7.3} ms {:>7.1} KB",
                m.node_id,
                truncate(&m.node_name, 20),
                m.kind.as_str(),
                format!("{:?}", m.output_shape),
                m.compute_duration.as_secs_f64() * 1000.0,
                m.live_bytes as f64 / 1024.0,
            );
        }
    }
    println!();
}

/// Index of the largest value; the first one wins on ties.
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Truncates a string with ellipsis.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}
