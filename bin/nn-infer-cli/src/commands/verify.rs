// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nninfer verify` command: compare one layer with reference outputs.
//!
//! Fixtures are JSON files produced by a Torch script. Every tensor is a
//! flat row-major array; the extents are given as separate keys.

use anyhow::{ensure, Context};
use model_ir::{Convolution, Linear, MaxPooling};
use std::path::PathBuf;
use tensor_core::{Layout, Shape, Tensor};

/// Which layer a fixture exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FixtureKind {
    /// Spatial convolution (`conv.json`).
    Conv,
    /// Channel-first max pooling (`pool.json`).
    Pool,
    /// Channel-last max pooling on the transposed copy in `pool.json`.
    PoolHwd,
    /// Fully connected layer (`full.json`).
    Linear,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConvFixture {
    op: usize,
    ip: usize,
    k_h: usize,
    k_w: usize,
    i_h: usize,
    i_w: usize,
    #[serde(default)]
    pad_h: usize,
    #[serde(default)]
    pad_w: usize,
    weight: Vec<f64>,
    bias: Vec<f64>,
    inp: Vec<f64>,
    out: Vec<f64>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolFixture {
    np: usize,
    k_h: usize,
    k_w: usize,
    d_h: usize,
    d_w: usize,
    i_h: usize,
    i_w: usize,
    inp: Vec<f64>,
    out: Vec<f64>,
    #[serde(rename = "inpHWD", default)]
    inp_hwd: Option<Vec<f64>>,
    #[serde(rename = "outHWD", default)]
    out_hwd: Option<Vec<f64>>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinearFixture {
    in_size: usize,
    out_size: usize,
    weight: Vec<f64>,
    bias: Vec<f64>,
    inp: Vec<f64>,
    out: Vec<f64>,
}

pub fn execute(kind: FixtureKind, fixture: PathBuf, eps: f64) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&fixture)
        .with_context(|| format!("cannot read fixture '{}'", fixture.display()))?;
    let err = max_error(kind, &text)
        .with_context(|| format!("fixture '{}' ({kind:?})", fixture.display()))?;

    println!("  {kind:?}: max abs error {err:.3e} (eps {eps:.0e})");
    ensure!(err <= eps, "{kind:?} check failed: error {err:e} exceeds {eps:e}");
    println!("  OK");
    Ok(())
}

/// Runs the layer described by a fixture and returns the largest
/// absolute difference from the expected output.
fn max_error(kind: FixtureKind, text: &str) -> anyhow::Result<f64> {
    match kind {
        FixtureKind::Conv => {
            let f: ConvFixture = serde_json::from_str(text)?;
            let layer = Convolution::new(
                Tensor::from_vec(Shape::new(vec![f.op, f.ip, f.k_h, f.k_w]), f.weight)?,
                Tensor::from_vec(Shape::vector(f.op), f.bias)?,
                f.pad_h,
                f.pad_w,
            )?;
            let input = Tensor::from_vec(Shape::cube(f.ip, f.i_h, f.i_w), f.inp)?;
            compare(&layer.forward(&input.view())?, &f.out)
        }
        FixtureKind::Pool => {
            let f: PoolFixture = serde_json::from_str(text)?;
            let layer = MaxPooling::channel_first(f.k_h, f.k_w, f.d_h, f.d_w)?;
            let input = Tensor::from_vec(Shape::cube(f.np, f.i_h, f.i_w), f.inp)?;
            compare(&layer.forward(&input.view())?, &f.out)
        }
        FixtureKind::PoolHwd => {
            let f: PoolFixture = serde_json::from_str(text)?;
            let inp = f.inp_hwd.context("fixture has no 'inpHWD'")?;
            let out = f.out_hwd.context("fixture has no 'outHWD'")?;
            let layer = MaxPooling::new(f.k_h, f.k_w, f.d_h, f.d_w, Layout::ChannelLast)?;
            let input = Tensor::from_vec(Shape::cube(f.i_h, f.i_w, f.np), inp)?;
            compare(&layer.forward(&input.view())?, &out)
        }
        FixtureKind::Linear => {
            let f: LinearFixture = serde_json::from_str(text)?;
            let layer = Linear::new(
                Tensor::from_vec(Shape::matrix(f.out_size, f.in_size), f.weight)?,
                Tensor::from_vec(Shape::vector(f.out_size), f.bias)?,
            )?;
            let input = Tensor::from_vec(Shape::vector(f.in_size), f.inp)?;
            compare(&layer.forward(&input.view())?, &f.out)
        }
    }
}

fn compare(got: &Tensor, expected: &[f64]) -> anyhow::Result<f64> {
    let got = got.to_vec();
    ensure!(
        got.len() == expected.len(),
        "layer produced {} values, fixture expects {}",
        got.len(),
        expected.len()
    );
    // A NaN on either side never matches.
    Ok(got
        .iter()
        .zip(expected)
        .map(|(a, b)| (a - b).abs())
        .map(|d| if d.is_nan() { f64::INFINITY } else { d })
        .fold(0.0, f64::max))
}
