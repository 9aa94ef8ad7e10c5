// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the JSON tensor format they share.

pub mod inspect;
pub mod run;
pub mod verify;

use anyhow::Context;
use model_ir::Framing;
use std::path::Path;
use tensor_core::{Shape, Tensor};
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the `-v` count picks the level.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parses a `--framing` argument.
pub fn parse_framing(s: &str) -> Result<Framing, String> {
    match s.to_ascii_lowercase().as_str() {
        "raw" | "msgpack" => Ok(Framing::Raw),
        "gzip" | "gz" => Ok(Framing::Gzip),
        other => Err(format!("unknown framing '{other}'; expected 'raw' or 'gzip'")),
    }
}

// ── JSON tensors ───────────────────────────────────────────────

/// A dense row-major tensor as JSON: `{ "shape": [...], "data": [...] }`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JsonTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl JsonTensor {
    pub fn into_tensor(self) -> anyhow::Result<Tensor> {
        let shape = Shape::new(self.shape);
        Tensor::from_vec(shape.clone(), self.data)
            .with_context(|| format!("invalid tensor with shape {shape}"))
    }

    pub fn from_tensor(tensor: &Tensor) -> Self {
        Self {
            shape: tensor.shape().dims().to_vec(),
            data: tensor.to_vec(),
        }
    }
}

/// An input file: either a single tensor or a list for multi-input models.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum InputFile {
    Many { inputs: Vec<JsonTensor> },
    One(JsonTensor),
}

/// Reads the input tensors for a run.
pub fn read_inputs(path: &Path) -> anyhow::Result<Vec<Tensor>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read input file '{}'", path.display()))?;
    parse_inputs(&text).with_context(|| format!("bad input file '{}'", path.display()))
}

fn parse_inputs(text: &str) -> anyhow::Result<Vec<Tensor>> {
    let file: InputFile = serde_json::from_str(text)?;
    let tensors = match file {
        InputFile::Many { inputs } => inputs,
        InputFile::One(tensor) => vec![tensor],
    };
    tensors.into_iter().map(JsonTensor::into_tensor).collect()
}

/// Writes any serialisable value as pretty JSON.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("cannot write '{}'", path.display()))
}

/// Formats at most `max` values, marking truncation.
pub fn preview(values: &[f64], max: usize) -> String {
    let shown: Vec<String> = values.iter().take(max).map(|v| format!("{v:.6}")).collect();
    let more = if values.len() > max { ", ..." } else { "" };
    format!("[{}{more}]", shown.join(", "))
}
