// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! The execution engine that runs a validated `ModelGraph` from `model-ir`
//! with per-node timing and scratch-memory profiling.
//!
//! # Type-State Pipeline
//! The runtime enforces a type-safe pipeline:
//! ```text
//! InferenceEngine<Idle> → InferenceEngine<Ready>
//! ```
//! Transitions are compile-time checked.
//!
//! # Execution
//! Inference is synchronous and single-threaded. A ready engine only
//! borrows its graph during `run`, so one engine can serve several threads.

mod config;
mod engine;
mod error;
mod metrics;

pub use config::RuntimeConfig;
pub use engine::{EngineState, Idle, InferenceEngine, InferenceOutput, Ready};
pub use error::RuntimeError;
pub use metrics::{InferenceMetrics, NodeMetrics};
