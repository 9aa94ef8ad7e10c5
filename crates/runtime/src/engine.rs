// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The inference engine with a type-state enforced pipeline.
//!
//! ```text
//! InferenceEngine<Idle>
//!     │  .load_model()   or   InferenceEngine::from_graph()
//!     ▼
//! InferenceEngine<Ready>
//!     │  .run()
//!     ▼
//!   InferenceOutput
//! ```
//!
//! Each state transition consumes the old value and returns a new one,
//! making invalid state sequences a compile error. The `Ready` state owns
//! the validated graph, so there is nothing to unwrap at run time.

use crate::{InferenceMetrics, RuntimeConfig, RuntimeError};
use model_ir::{graph::Validated, ModelGraph, ModelLoader};
use std::time::Instant;
use tensor_core::{Tensor, TensorView};

// ── Type-state markers ─────────────────────────────────────────

/// Engine is created but no model is loaded.
#[derive(Debug)]
pub struct Idle;

/// Engine holds a validated model and can run inference.
#[derive(Debug)]
pub struct Ready {
    graph: ModelGraph<Validated>,
}

/// Sealed trait for engine states.
pub trait EngineState: std::fmt::Debug {}
impl EngineState for Idle {}
impl EngineState for Ready {}

// ── Inference output ───────────────────────────────────────────

/// The result of a single inference run.
#[derive(Debug)]
pub struct InferenceOutput {
    /// The tensor produced by the model's output node.
    pub output: Tensor,
    /// Per-node and overall timing/memory metrics.
    pub metrics: InferenceMetrics,
}

// ── Engine ─────────────────────────────────────────────────────

/// The primary inference engine.
///
/// `S` is a type-state marker that enforces the pipeline ordering at
/// compile time: `.run()` does not exist on an `Idle` engine.
///
/// # Example
/// ```no_run
/// use runtime::{InferenceEngine, RuntimeConfig};
/// use tensor_core::{Shape, Tensor};
///
/// # fn example() -> Result<(), runtime::RuntimeError> {
/// let engine = InferenceEngine::new(RuntimeConfig::for_model("lenet.msgpack.gz"))
///     .load_model()?;
/// let image = Tensor::zeros(Shape::cube(1, 28, 28));
/// let output = engine.run_one(image.view())?;
/// println!("{}", output.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct InferenceEngine<S: EngineState = Idle> {
    config: RuntimeConfig,
    state: S,
}

// ── Idle → Ready ───────────────────────────────────────────────

impl InferenceEngine<Idle> {
    /// Creates a new engine from the given configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        tracing::info!("engine created for '{}'", config.model_path.display());
        Self { config, state: Idle }
    }

    /// Loads and validates the configured model.
    /// Transitions to the `Ready` state.
    pub fn load_model(self) -> Result<InferenceEngine<Ready>, RuntimeError> {
        let framing = self.config.resolve_framing();
        let graph = ModelLoader::load_with(&self.config.model_path, framing)?;
        tracing::info!("{}", graph.summary());

        Ok(InferenceEngine {
            config: self.config,
            state: Ready { graph },
        })
    }

    /// Wraps an already validated graph (for tests and embedding).
    pub fn from_graph(config: RuntimeConfig, graph: ModelGraph<Validated>) -> InferenceEngine<Ready> {
        tracing::info!("engine created from in-memory graph: {}", graph.summary());
        InferenceEngine {
            config,
            state: Ready { graph },
        }
    }
}

// ── Ready: run inference ───────────────────────────────────────

impl InferenceEngine<Ready> {
    /// Returns the model graph.
    pub fn graph(&self) -> &ModelGraph<Validated> {
        &self.state.graph
    }

    /// Runs the model on one tensor per external input slot.
    ///
    /// With profiling enabled every node is timed and its scratch
    /// footprint recorded; otherwise only the total time is measured.
    pub fn run(&self, inputs: &[TensorView<'_>]) -> Result<InferenceOutput, RuntimeError> {
        let run_start = Instant::now();
        let graph = &self.state.graph;
        let mut metrics = InferenceMetrics::new(graph.num_nodes());

        tracing::debug!(
            "starting inference: {} input tensor(s), {} nodes",
            inputs.len(),
            graph.num_nodes(),
        );

        let output = if self.config.enable_profiling {
            graph.forward_observed(inputs, &mut metrics)?
        } else {
            graph.forward(inputs)?
        };

        metrics.finalise(run_start.elapsed(), output.num_elements());
        tracing::info!("{}", metrics.summary());

        Ok(InferenceOutput { output, metrics })
    }

    /// Runs a single-input model.
    pub fn run_one(&self, input: TensorView<'_>) -> Result<InferenceOutput, RuntimeError> {
        self.run(std::slice::from_ref(&input))
    }
}

impl<S: EngineState> InferenceEngine<S> {
    /// Returns the engine configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl<S: EngineState> std::fmt::Debug for InferenceEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("state", &std::any::type_name::<S>())
            .field("model_path", &self.config.model_path)
            .field("profiling", &self.config.enable_profiling)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{GraphNode, InputRef, Linear, MaxPooling, ModelError};
    use tensor_core::Shape;

    /// pool 2x2/2 -> linear(4 -> 2)
    fn pool_then_linear() -> ModelGraph<Validated> {
        let weight = Tensor::from_vec(Shape::matrix(2, 4), vec![1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0])
            .unwrap();
        let bias = Tensor::from_vec(Shape::vector(2), vec![0.0, -1.0]).unwrap();
        ModelGraph::new(
            "pool-fc",
            1,
            vec![
                GraphNode::new("pool", MaxPooling::channel_first(2, 2, 2, 2).unwrap(), vec![InputRef::External(0)]),
                GraphNode::new("fc", Linear::new(weight, bias).unwrap(), vec![InputRef::Node(0)]),
            ],
        )
        .validate()
        .unwrap()
    }

    fn grid() -> Tensor {
        Tensor::from_vec(Shape::cube(1, 4, 4), (1..=16).map(f64::from).collect()).unwrap()
    }

    #[test]
    fn test_run_with_profiling() {
        let engine = InferenceEngine::from_graph(RuntimeConfig::default(), pool_then_linear());
        let out = engine.run_one(grid().view()).unwrap();

        // pool: [6, 8, 14, 16]; fc: [6, 6 + 8 + 14 + 16 - 1].
        assert_eq!(out.output.to_vec(), vec![6.0, 43.0]);
        assert_eq!(out.metrics.node_metrics.len(), 2);
        assert_eq!(out.metrics.node_metrics[0].output_shape, vec![1, 2, 2]);
        assert_eq!(out.metrics.output_elements, 2);
        assert!(out.metrics.total_duration >= out.metrics.total_compute_duration);
    }

    #[test]
    fn test_run_without_profiling() {
        let config = RuntimeConfig {
            enable_profiling: false,
            ..Default::default()
        };
        let engine = InferenceEngine::from_graph(config, pool_then_linear());
        let out = engine.run_one(grid().view()).unwrap();
        assert_eq!(out.output.to_vec(), vec![6.0, 43.0]);
        assert!(out.metrics.node_metrics.is_empty());
    }

    #[test]
    fn test_run_missing_input() {
        let engine = InferenceEngine::from_graph(RuntimeConfig::default(), pool_then_linear());
        let err = engine.run(&[]).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Model(ModelError::UnresolvedInput { node: 0, .. })
        ));
    }

    #[test]
    fn test_load_missing_model() {
        let engine = InferenceEngine::new(RuntimeConfig::for_model("/nonexistent/model.msgpack"));
        assert!(matches!(
            engine.load_model(),
            Err(RuntimeError::Model(ModelError::Io(_)))
        ));
    }

    #[test]
    fn test_multiple_runs() {
        let engine = InferenceEngine::from_graph(RuntimeConfig::default(), pool_then_linear());
        let first = engine.run_one(grid().view()).unwrap();
        for _ in 0..3 {
            let again = engine.run_one(grid().view()).unwrap();
            assert_eq!(again.output, first.output);
        }
    }

    #[test]
    fn test_debug_format() {
        let engine = InferenceEngine::new(RuntimeConfig::default());
        let debug = format!("{engine:?}");
        assert!(debug.contains("InferenceEngine"));
        assert!(debug.contains("Idle"));
    }
}
