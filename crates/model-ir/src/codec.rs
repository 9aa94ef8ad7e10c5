// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Binary model format.
//!
//! A model is a MessagePack document of field-named maps, optionally
//! wrapped in a single gzip member:
//!
//! ```text
//! Model { name?, inputs, node_count, output?, nodes: [Node] }
//! Node  { name?, kind, pad_h?, pad_w?, k_h?, k_w?, d_h?, d_w?, layout?,
//!         params?: { weight: Param, bias: Param }, inputs: [Wire] }
//! Param { shape: [uint], data: [f64] }
//! Wire  { kind, index }
//! ```
//!
//! Kind tags: `0` convolution, `1` max pooling, `2` linear. Layout tags:
//! `0` channel-first, `1` channel-last. Wire tags: `0` external input,
//! `1` node output.
//!
//! Decoding runs in two passes: every node is built with its wiring left
//! unresolved, then [`ModelGraph::validate`] resolves the references.

use crate::graph::{GraphNode, InputRef, ModelGraph, Validated};
use crate::{Convolution, LayerConfig, LayerKind, Linear, MaxPooling, ModelError};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tensor_core::{Layout, Shape, Tensor};

// ── Wire structs ───────────────────────────────────────────────────

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WireModel {
    #[serde(default)]
    name: String,
    inputs: usize,
    node_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<usize>,
    nodes: Vec<WireNode>,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct WireNode {
    #[serde(default)]
    name: String,
    kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pad_h: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pad_w: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    k_h: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    k_w: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d_h: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d_w: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layout: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<WireParams>,
    inputs: Vec<WireRef>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WireParams {
    weight: WireParam,
    bias: WireParam,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WireParam {
    shape: Vec<usize>,
    data: Vec<f64>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WireRef {
    kind: u8,
    index: usize,
}

// ── Decoding ───────────────────────────────────────────────────────

/// Decodes a raw MessagePack model into a validated graph.
///
/// # Errors
/// Every structural problem, from truncated bytes to dangling wiring, is
/// reported as [`ModelError::MalformedModel`].
pub fn decode(bytes: &[u8]) -> Result<ModelGraph<Validated>, ModelError> {
    let wire: WireModel = rmp_serde::from_slice(bytes)
        .map_err(|e| ModelError::malformed(format!("cannot decode model bytes: {e}")))?;

    if wire.nodes.len() != wire.node_count {
        return Err(ModelError::malformed(format!(
            "header declares {} nodes, found {}",
            wire.node_count,
            wire.nodes.len()
        )));
    }

    let nodes = wire
        .nodes
        .into_iter()
        .enumerate()
        .map(|(id, node)| build_node(id, node))
        .collect::<Result<Vec<_>, _>>()?;

    let mut graph = ModelGraph::new(wire.name, wire.inputs, nodes);
    if let Some(output) = wire.output {
        graph = graph.with_output(output);
    }
    let graph = graph.validate()?;

    tracing::debug!(
        "decoded model '{}': {} nodes, {} parameters",
        graph.name,
        graph.num_nodes(),
        graph.num_parameters()
    );
    Ok(graph)
}

/// Decompresses a gzip-framed model and decodes it.
pub fn decode_gzip(bytes: &[u8]) -> Result<ModelGraph<Validated>, ModelError> {
    let mut raw = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut raw)
        .map_err(|e| ModelError::malformed(format!("bad gzip framing: {e}")))?;
    decode(&raw)
}

fn build_node(id: usize, wire: WireNode) -> Result<GraphNode, ModelError> {
    let kind = LayerKind::from_code(wire.kind)
        .ok_or_else(|| ModelError::malformed(format!("node {id}: unknown layer kind {}", wire.kind)))?;

    let inputs = wire
        .inputs
        .iter()
        .map(|w| {
            InputRef::from_code(w.kind, w.index).ok_or_else(|| {
                ModelError::malformed(format!("node {id}: unknown input kind {}", w.kind))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let context = |e: tensor_core::TensorError| ModelError::malformed(format!("node {id} ({kind}): {e}"));

    let layer: LayerConfig = match kind {
        LayerKind::Convolution => {
            let (weight, bias) = take_params(id, wire.params)?;
            Convolution::new(weight, bias, wire.pad_h.unwrap_or(0), wire.pad_w.unwrap_or(0))
                .map_err(context)?
                .into()
        }
        LayerKind::MaxPooling => {
            let field = |value: Option<usize>, name: &str| {
                value.ok_or_else(|| ModelError::malformed(format!("node {id}: pooling is missing '{name}'")))
            };
            let layout = match wire.layout {
                None => Layout::ChannelFirst,
                Some(code) => Layout::from_code(code).ok_or_else(|| {
                    ModelError::malformed(format!("node {id}: unknown layout {code}"))
                })?,
            };
            if wire.params.is_some() {
                tracing::warn!("node {id}: ignoring parameters on a pooling layer");
            }
            MaxPooling::new(
                field(wire.k_h, "k_h")?,
                field(wire.k_w, "k_w")?,
                field(wire.d_h, "d_h")?,
                field(wire.d_w, "d_w")?,
                layout,
            )
            .map_err(context)?
            .into()
        }
        LayerKind::Linear => {
            let (weight, bias) = take_params(id, wire.params)?;
            Linear::new(weight, bias).map_err(context)?.into()
        }
    };

    Ok(GraphNode::new(wire.name, layer, inputs))
}

fn take_params(id: usize, params: Option<WireParams>) -> Result<(Tensor, Tensor), ModelError> {
    let params = params.ok_or_else(|| ModelError::malformed(format!("node {id}: missing 'params'")))?;
    Ok((
        take_param(id, "weight", params.weight)?,
        take_param(id, "bias", params.bias)?,
    ))
}

fn take_param(id: usize, name: &str, param: WireParam) -> Result<Tensor, ModelError> {
    Tensor::from_vec(Shape::new(param.shape), param.data)
        .map_err(|e| ModelError::malformed(format!("node {id}: parameter '{name}': {e}")))
}

// ── Encoding ───────────────────────────────────────────────────────

/// Encodes a validated graph as raw MessagePack.
pub fn encode(graph: &ModelGraph<Validated>) -> Result<Vec<u8>, ModelError> {
    let wire = WireModel {
        name: graph.name.clone(),
        inputs: graph.external_inputs(),
        node_count: graph.num_nodes(),
        output: Some(graph.output_id()),
        nodes: graph.nodes().iter().map(wire_node).collect(),
    };
    rmp_serde::to_vec_named(&wire).map_err(|e| ModelError::Io(std::io::Error::other(e)))
}

/// Encodes a validated graph as MessagePack inside one gzip member.
pub fn encode_gzip(graph: &ModelGraph<Validated>) -> Result<Vec<u8>, ModelError> {
    let raw = encode(graph)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

fn wire_node(node: &GraphNode) -> WireNode {
    let inputs = node
        .inputs
        .iter()
        .map(|r| WireRef {
            kind: r.code(),
            index: r.index(),
        })
        .collect();
    let mut wire = WireNode {
        name: node.name.clone(),
        kind: node.kind().code(),
        inputs,
        ..WireNode::default()
    };
    match &node.layer {
        LayerConfig::Convolution(conv) => {
            let (pad_h, pad_w) = conv.padding();
            wire.pad_h = Some(pad_h);
            wire.pad_w = Some(pad_w);
            wire.params = Some(wire_params(conv.weight(), conv.bias()));
        }
        LayerConfig::MaxPooling(pool) => {
            let ((k_h, k_w), (d_h, d_w)) = (pool.kernel(), pool.stride());
            wire.k_h = Some(k_h);
            wire.k_w = Some(k_w);
            wire.d_h = Some(d_h);
            wire.d_w = Some(d_w);
            wire.layout = Some(pool.layout().code());
        }
        LayerConfig::Linear(fc) => wire.params = Some(wire_params(fc.weight(), fc.bias())),
    }
    wire
}

fn wire_params(weight: &Tensor, bias: &Tensor) -> WireParams {
    let param = |t: &Tensor| WireParam {
        shape: t.shape().dims().to_vec(),
        data: t.to_vec(),
    };
    WireParams {
        weight: param(weight),
        bias: param(bias),
    }
}
