// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the inference runtime.

/// Errors that can occur while configuring or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Model loading or execution failed.
    #[error("model error: {0}")]
    Model(#[from] model_ir::ModelError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
