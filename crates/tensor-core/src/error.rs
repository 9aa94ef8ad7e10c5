// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor indexing and kernels.

use crate::Shape;

/// Errors that can occur during tensor operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    /// A multi-index (or a strided layout) reaches outside the tensor.
    ///
    /// Raised when the index arity differs from the rank, when a component
    /// is not below the matching dimension, or when explicit strides would
    /// address past the end of the buffer.
    #[error("index {index:?} out of bounds for shape {shape}")]
    OutOfBounds { index: Vec<usize>, shape: Shape },

    /// A shape is degenerate, or a kernel would produce a non-positive extent.
    #[error("invalid shape in {op}: {detail}")]
    InvalidShape { op: &'static str, detail: String },

    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// The provided buffer length does not match the element count of the shape.
    #[error("buffer size mismatch: expected {expected} elements, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

impl TensorError {
    pub(crate) fn invalid_shape(op: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidShape {
            op,
            detail: detail.into(),
        }
    }
}
