// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model decoding, graph assembly and execution.

use crate::InputRef;

/// Errors that can occur when working with model graphs.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model bytes or the assembled graph are structurally inconsistent.
    #[error("malformed model: {0}")]
    MalformedModel(String),

    /// A node reads an external input slot the caller did not supply.
    #[error("node {node} reads {input}, but only {supplied} input tensor(s) were supplied")]
    UnresolvedInput {
        node: usize,
        input: InputRef,
        supplied: usize,
    },

    /// A layer kernel failed; the kernel's error is passed through as-is.
    #[error(transparent)]
    Tensor(#[from] tensor_core::TensorError),

    /// The model file could not be read or written.
    #[error("model file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedModel(detail.into())
    }
}
