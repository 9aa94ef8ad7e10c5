// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nninfer inspect` and `nninfer convert`: model structure and re-encoding.

use super::run::truncate;
use model_ir::graph::Validated;
use model_ir::{Framing, InputRef, ModelGraph, ModelLoader};
use std::path::{Path, PathBuf};

fn load(model: &Path, framing: Option<Framing>) -> anyhow::Result<ModelGraph<Validated>> {
    let framing = framing.unwrap_or_else(|| Framing::from_path(model));
    ModelLoader::load_with(model, framing).map_err(|e| {
        tracing::warn!("model load failed: {e}");
        anyhow::anyhow!("failed to load model from '{}': {e}", model.display())
    })
}

pub fn execute(model: PathBuf, framing: Option<Framing>) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              nninfer · Model Inspector               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let graph = load(&model, framing)?;

    // ── Summary ────────────────────────────────────────────────
    println!("  Model: {}", if graph.name.is_empty() { "<unnamed>" } else { graph.name.as_str() });
    println!("  Nodes: {}", graph.num_nodes());
    println!("  External inputs: {}", graph.external_inputs());
    println!("  Output node: {}", graph.output_id());
    println!(
        "  Parameters: {} ({:.2} KB)",
        graph.num_parameters(),
        (graph.num_parameters() * std::mem::size_of::<f64>()) as f64 / 1024.0,
    );
    println!();

    // ── Per-Node Detail ────────────────────────────────────────
    println!(
        "  {:<4} {:<20} {:<12} {:<12} {:>10}  {}",
        "Id", "Name", "Kind", "Inputs", "Params", "Detail",
    );
    println!("  {}", "-".repeat(90));

    for node in graph.nodes() {
        let inputs: Vec<String> = node
            .inputs
            .iter()
            .map(|r| match r {
                InputRef::External(s) => format!("in{s}"),
                InputRef::Node(n) => format!("#{n}"),
            })
            .collect();
        println!(
            "  {:<4} {:<20} {:<12} {:<12} {:>10}  {}",
            node.id(),
            truncate(&node.name, 20),
            node.kind().as_str(),
            inputs.join(","),
            node.layer.num_parameters(),
            node.layer.summary(),
        );
    }
    println!();
    Ok(())
}

pub fn convert(model: PathBuf, to: PathBuf, framing: Option<Framing>) -> anyhow::Result<()> {
    let graph = load(&model, None)?;
    let framing = framing.unwrap_or_else(|| Framing::from_path(&to));
    ModelLoader::save(&to, &graph, framing)?;
    println!(
        "  Wrote '{}' ({} nodes, {framing}) to {}",
        graph.name,
        graph.num_nodes(),
        to.display()
    );
    Ok(())
}
