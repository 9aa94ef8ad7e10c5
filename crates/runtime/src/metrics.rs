// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference profiling metrics.
//!
//! [`InferenceMetrics`] collects per-node and aggregate timing and scratch
//! memory data. It plugs into graph execution as an
//! [`ExecutionObserver`].

use model_ir::{ExecutionObserver, LayerKind, NodeReport};
use std::time::Duration;

/// Metrics for a single node's execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeMetrics {
    /// Node id.
    pub node_id: usize,
    /// Node name.
    pub node_name: String,
    /// Layer kind.
    pub kind: LayerKind,
    /// Dimensions of the node's output.
    pub output_shape: Vec<usize>,
    /// Time spent in the layer kernel.
    pub compute_duration: Duration,
    /// Intermediate bytes held once this node's output was stored.
    pub live_bytes: usize,
}

/// Aggregate metrics for a complete inference run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InferenceMetrics {
    /// Total wall-clock time for the run.
    pub total_duration: Duration,
    /// Total time spent inside layer kernels.
    pub total_compute_duration: Duration,
    /// Largest amount of intermediate data held at once, in bytes.
    pub peak_live_bytes: usize,
    /// Per-node metrics, in execution order. Empty when profiling is off.
    pub node_metrics: Vec<NodeMetrics>,
    /// Number of nodes in the executed graph.
    pub num_nodes: usize,
    /// Number of elements in the model output.
    pub output_elements: usize,
}

impl InferenceMetrics {
    /// Creates an empty metrics container.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            total_duration: Duration::ZERO,
            total_compute_duration: Duration::ZERO,
            peak_live_bytes: 0,
            node_metrics: Vec::with_capacity(num_nodes),
            num_nodes,
            output_elements: 0,
        }
    }

    /// Records metrics for a single node.
    pub fn record_node(&mut self, metrics: NodeMetrics) {
        self.total_compute_duration += metrics.compute_duration;
        self.peak_live_bytes = self.peak_live_bytes.max(metrics.live_bytes);
        self.node_metrics.push(metrics);
    }

    /// Finalises metrics with the total wall-clock time and output size.
    pub fn finalise(&mut self, total: Duration, output_elements: usize) {
        self.total_duration = total;
        self.output_elements = output_elements;
    }

    /// Returns the slowest node, if any were recorded.
    pub fn slowest_node(&self) -> Option<&NodeMetrics> {
        self.node_metrics.iter().max_by_key(|m| m.compute_duration)
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let peak_kb = self.peak_live_bytes as f64 / 1024.0;
        let compute_pct = if self.total_duration.as_secs_f64() > 0.0 {
            (self.total_compute_duration.as_secs_f64() / self.total_duration.as_secs_f64()) * 100.0
        } else {
            0.0
        };

        format!(
            "Inference: {:.3}ms total, {} nodes, {:.3}ms compute ({:.0}%), \
             peak scratch {:.2} KB, {} output values",
            self.total_duration.as_secs_f64() * 1000.0,
            self.num_nodes,
            self.total_compute_duration.as_secs_f64() * 1000.0,
            compute_pct,
            peak_kb,
            self.output_elements,
        )
    }
}

impl ExecutionObserver for InferenceMetrics {
    fn on_node(&mut self, report: &NodeReport<'_>) {
        self.record_node(NodeMetrics {
            node_id: report.id,
            node_name: report.name.to_string(),
            kind: report.kind,
            output_shape: report.output_shape.dims().to_vec(),
            compute_duration: report.elapsed,
            live_bytes: report.live_bytes,
        });
    }
}
