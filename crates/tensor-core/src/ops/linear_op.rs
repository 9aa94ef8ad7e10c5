// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully connected affine transform.

use crate::{Shape, Tensor, TensorError, TensorView};

/// Computes `out[i] = bias[i] + Σ_j weight[i, j] · input[j]`.
///
/// `weight` is `[out_size, in_size]` and `bias` is `[out_size]`. An input of
/// rank above 1 is read as its row-major flattening, so a `[C, H, W]`
/// feature map feeds straight into a classifier without a copy.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the input element count is
/// not `in_size`, or if the parameters are not a matrix and a matching
/// vector.
pub fn linear(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: &TensorView<'_>,
) -> Result<Tensor, TensorError> {
    if weight.rank() != 2 || bias.rank() != 1 || bias.shape().dims()[0] != weight.shape().dims()[0]
    {
        return Err(TensorError::ShapeMismatch {
            op: "linear (parameters)",
            lhs: weight.shape().clone(),
            rhs: bias.shape().clone(),
        });
    }
    let (out_size, in_size) = (weight.shape().dims()[0], weight.shape().dims()[1]);
    if input.num_elements() != in_size {
        return Err(TensorError::ShapeMismatch {
            op: "linear",
            lhs: input.shape().clone(),
            rhs: weight.shape().clone(),
        });
    }

    let x: Vec<f64> = input.iter().collect();
    let mut out = Vec::with_capacity(out_size);
    for i in 0..out_size {
        let dot: f64 = x
            .iter()
            .enumerate()
            .map(|(j, &xj)| weight.at2(i, j) * xj)
            .sum();
        out.push(bias.get(&[i])? + dot);
    }

    Tensor::from_vec(Shape::vector(out_size), out)
}
