// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: a feed-forward model as a DAG of layer nodes.
//!
//! # Type-State Pattern
//!
//! The graph transitions through states enforced at compile time:
//!
//! ```text
//! ModelGraph<Loaded>     : nodes assembled, wiring not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated>  : wiring resolved, ready to execute.
//! ```
//!
//! Only a validated graph exposes [`forward`](ModelGraph::forward). The
//! transition consumes the old state and returns the new one; the marker
//! types are `PhantomData` (ZST).
//!
//! # Execution
//!
//! Nodes are stored in dependency order and run in that order. Each
//! `forward` call keeps its own scratch table of node outputs and drops an
//! intermediate as soon as its last consumer has run, so a validated graph
//! can be shared between threads and executed concurrently.

use crate::{LayerConfig, LayerKind, ModelError};
use std::fmt;
use std::time::{Duration, Instant};
use tensor_core::{Shape, Tensor, TensorView};

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been assembled but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and can be executed.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── Wiring ─────────────────────────────────────────────────────────

/// Where a node input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputRef {
    /// The caller-supplied tensor in this slot.
    External(usize),
    /// The output of the node with this id.
    Node(usize),
}

impl InputRef {
    /// Numeric slot-kind tag used by the model format.
    pub fn code(self) -> u8 {
        match self {
            InputRef::External(_) => 0,
            InputRef::Node(_) => 1,
        }
    }

    /// The slot or node index.
    pub fn index(self) -> usize {
        match self {
            InputRef::External(i) | InputRef::Node(i) => i,
        }
    }

    /// Builds a reference from a model-format tag and index.
    pub fn from_code(code: u8, index: usize) -> Option<Self> {
        match code {
            0 => Some(InputRef::External(index)),
            1 => Some(InputRef::Node(index)),
            _ => None,
        }
    }
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRef::External(slot) => write!(f, "external input {slot}"),
            InputRef::Node(id) => write!(f, "output of node {id}"),
        }
    }
}

/// A single layer in the graph together with its input wiring.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    id: usize,
    /// Display name; defaults to `"<kind>.<id>"` when empty.
    pub name: String,
    /// The layer computed by this node.
    pub layer: LayerConfig,
    /// Input sources, one per layer input, in order.
    pub inputs: Vec<InputRef>,
}

impl GraphNode {
    /// Creates a node; its id is assigned from its position in the graph.
    pub fn new(name: impl Into<String>, layer: impl Into<LayerConfig>, inputs: Vec<InputRef>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            layer: layer.into(),
            inputs,
        }
    }

    /// Position of this node in the graph.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the layer kind.
    pub fn kind(&self) -> LayerKind {
        self.layer.kind()
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        let inputs: Vec<String> = self
            .inputs
            .iter()
            .map(|r| match r {
                InputRef::External(s) => format!("in{s}"),
                InputRef::Node(n) => format!("#{n}"),
            })
            .collect();
        format!(
            "[{}] {} <- ({}): {}, {} params",
            self.id,
            self.name,
            inputs.join(", "),
            self.layer.summary(),
            self.layer.num_parameters(),
        )
    }
}

// ── Execution observer ─────────────────────────────────────────────

/// What a forward pass reports after each node completes.
#[derive(Debug, Clone)]
pub struct NodeReport<'a> {
    pub id: usize,
    pub name: &'a str,
    pub kind: LayerKind,
    pub output_shape: &'a Shape,
    /// Wall-clock time spent in the layer kernel.
    pub elapsed: Duration,
    /// Bytes held by intermediate outputs once this node's output is stored.
    pub live_bytes: usize,
}

/// Hook into [`ModelGraph::forward_observed`].
pub trait ExecutionObserver {
    /// Called once per node, in execution order, after the node succeeds.
    fn on_node(&mut self, report: &NodeReport<'_>);
}

impl ExecutionObserver for () {
    fn on_node(&mut self, _report: &NodeReport<'_>) {}
}

// ── ModelGraph ─────────────────────────────────────────────────────

/// The complete model as an ordered list of nodes.
///
/// The generic parameter `S` encodes the validation state at compile time.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Human-readable model name.
    pub name: String,
    nodes: Vec<GraphNode>,
    external_inputs: usize,
    output: usize,
    /// For each node, the id of the last node reading its output.
    last_use: Vec<Option<usize>>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a new graph in the `Loaded` state.
    ///
    /// Node ids are assigned from list positions. The last node is the
    /// output unless [`with_output`](ModelGraph::with_output) says otherwise.
    pub fn new(name: impl Into<String>, external_inputs: usize, mut nodes: Vec<GraphNode>) -> Self {
        for (id, node) in nodes.iter_mut().enumerate() {
            node.id = id;
            if node.name.is_empty() {
                node.name = format!("{}.{id}", node.kind());
            }
        }
        let output = nodes.len().saturating_sub(1);
        Self {
            name: name.into(),
            nodes,
            external_inputs,
            output,
            last_use: Vec::new(),
            _state: std::marker::PhantomData,
        }
    }

    /// Selects which node's output is the model output.
    pub fn with_output(mut self, output: usize) -> Self {
        self.output = output;
        self
    }

    /// Validates the wiring and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The graph is non-empty and the output id names a node.
    /// - Each node has exactly as many inputs as its layer consumes.
    /// - External references name a declared slot.
    /// - Node references point strictly backwards (no cycles, no forward
    ///   references).
    pub fn validate(self) -> Result<ModelGraph<Validated>, ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::malformed("model graph contains no nodes"));
        }
        if self.output >= self.nodes.len() {
            return Err(ModelError::malformed(format!(
                "output node {} does not exist ({} nodes)",
                self.output,
                self.nodes.len()
            )));
        }

        let mut last_use = vec![None; self.nodes.len()];
        for node in &self.nodes {
            let arity = node.layer.arity();
            if node.inputs.len() != arity {
                return Err(ModelError::malformed(format!(
                    "node {} ({}) has {} input(s), {} expects {arity}",
                    node.id,
                    node.name,
                    node.inputs.len(),
                    node.kind(),
                )));
            }
            for &input in &node.inputs {
                match input {
                    InputRef::External(slot) if slot >= self.external_inputs => {
                        return Err(ModelError::malformed(format!(
                            "node {} reads external input {slot}, but the model declares {}",
                            node.id, self.external_inputs
                        )));
                    }
                    InputRef::Node(src) if src >= node.id => {
                        return Err(ModelError::malformed(format!(
                            "node {} reads node {src}, which does not precede it",
                            node.id
                        )));
                    }
                    InputRef::Node(src) => last_use[src] = Some(node.id),
                    InputRef::External(_) => {}
                }
            }
        }

        for (id, used) in last_use.iter().enumerate() {
            if used.is_none() && id != self.output {
                tracing::warn!(
                    "node {id} ('{}') feeds nothing and is not the model output",
                    self.nodes[id].name
                );
            }
        }

        Ok(ModelGraph {
            name: self.name,
            nodes: self.nodes,
            external_inputs: self.external_inputs,
            output: self.output,
            last_use,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Runs the forward pass on one tensor per external input slot.
    ///
    /// # Errors
    /// Returns [`ModelError::UnresolvedInput`] if a node reads a slot beyond
    /// `inputs.len()`, and [`ModelError::Tensor`] carrying the kernel's own
    /// error if a layer fails. No output is produced on failure.
    pub fn forward(&self, inputs: &[TensorView<'_>]) -> Result<Tensor, ModelError> {
        self.forward_observed(inputs, &mut ())
    }

    /// Runs the forward pass of a single-input model.
    pub fn forward_one(&self, input: TensorView<'_>) -> Result<Tensor, ModelError> {
        self.forward(std::slice::from_ref(&input))
    }

    /// Runs the forward pass, reporting each completed node to `observer`.
    pub fn forward_observed<O>(
        &self,
        inputs: &[TensorView<'_>],
        observer: &mut O,
    ) -> Result<Tensor, ModelError>
    where
        O: ExecutionObserver + ?Sized,
    {
        self.check_inputs(inputs)?;
        tracing::debug!(
            "forward '{}': {} nodes, {} input tensor(s)",
            self.name,
            self.nodes.len(),
            inputs.len()
        );

        let mut scratch: Vec<Option<Tensor>> = vec![None; self.nodes.len()];
        let mut live_bytes = 0usize;

        for node in &self.nodes {
            let start = Instant::now();
            let output = {
                let mut views = Vec::with_capacity(node.inputs.len());
                for &input in &node.inputs {
                    let view = match input {
                        InputRef::External(slot) => inputs[slot].clone(),
                        InputRef::Node(src) => scratch[src]
                            .as_ref()
                            .map(Tensor::view)
                            .ok_or_else(|| {
                                ModelError::malformed(format!(
                                    "node {} reads node {src} after it was released",
                                    node.id
                                ))
                            })?,
                    };
                    views.push(view);
                }
                node.layer.apply(&views).map_err(|e| {
                    tracing::debug!("node {} ('{}') failed: {e}", node.id, node.name);
                    e
                })?
            };
            let elapsed = start.elapsed();

            // Release inputs whose last reader was this node.
            for &input in &node.inputs {
                if let InputRef::Node(src) = input {
                    if self.last_use[src] == Some(node.id) && src != self.output {
                        if let Some(done) = scratch[src].take() {
                            live_bytes -= done.size_bytes();
                        }
                    }
                }
            }

            tracing::debug!(
                "node {} ('{}', {}) -> {} in {:?}",
                node.id,
                node.name,
                node.kind(),
                output.shape(),
                elapsed
            );

            let keep = self.last_use[node.id].is_some() || node.id == self.output;
            if keep {
                live_bytes += output.size_bytes();
            }
            observer.on_node(&NodeReport {
                id: node.id,
                name: &node.name,
                kind: node.kind(),
                output_shape: output.shape(),
                elapsed,
                live_bytes,
            });
            if keep {
                scratch[node.id] = Some(output);
            }
        }

        scratch[self.output]
            .take()
            .ok_or_else(|| ModelError::malformed("output node produced no tensor"))
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "Model '{}': {} nodes, {} external input(s), output node {}, {} parameters",
            self.name,
            self.nodes.len(),
            self.external_inputs,
            self.output,
            self.num_parameters(),
        )
    }

    fn check_inputs(&self, inputs: &[TensorView<'_>]) -> Result<(), ModelError> {
        for node in &self.nodes {
            for &input in &node.inputs {
                if let InputRef::External(slot) = input {
                    if slot >= inputs.len() {
                        return Err(ModelError::UnresolvedInput {
                            node: node.id,
                            input,
                            supplied: inputs.len(),
                        });
                    }
                }
            }
        }
        if inputs.len() > self.external_inputs {
            tracing::warn!(
                "'{}' declares {} input(s); ignoring {} extra",
                self.name,
                self.external_inputs,
                inputs.len() - self.external_inputs
            );
        }
        Ok(())
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> ModelGraph<S> {
    /// Returns the nodes in execution order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Returns a node by id.
    pub fn node(&self, id: usize) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of external input slots the model declares.
    pub fn external_inputs(&self) -> usize {
        self.external_inputs
    }

    /// Returns the id of the node whose output is the model output.
    pub fn output_id(&self) -> usize {
        self.output
    }

    /// Returns the total number of learned scalars.
    pub fn num_parameters(&self) -> usize {
        self.nodes.iter().map(|n| n.layer.num_parameters()).sum()
    }
}

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModelGraph '{}' ({} nodes):", self.name, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}
