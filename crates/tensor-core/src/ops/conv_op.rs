// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Spatial convolution (cross-correlation) with implicit zero padding.

use crate::{Shape, Tensor, TensorError, TensorView};

/// Computes a 2-D cross-correlation over a `[in_ch, H, W]` input.
///
/// `weight` is `[out_ch, in_ch, kH, kW]` and `bias` is `[out_ch]`. The input
/// is treated as if surrounded by `pad_h` rows and `pad_w` columns of zeros;
/// no padded copy is made. For every output position
///
/// ```text
/// out[o, j, k] = bias[o] + Σ_c Σ_u Σ_v weight[o, c, u, v] · in_pad[c, j + u, k + v]
/// ```
///
/// with the sum taken in channel, kernel-row, kernel-column order. The
/// kernel is not flipped. Output shape is
/// `[out_ch, H + 2·pad_h − kH + 1, W + 2·pad_w − kW + 1]`.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the ranks are wrong, the bias
/// length differs from `out_ch`, or the input channel count differs from
/// the weight's. Returns [`TensorError::InvalidShape`] if either output
/// extent would be zero or negative, or the padded extents or output size
/// overflow `usize`.
pub fn conv2d(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: &TensorView<'_>,
    pad_h: usize,
    pad_w: usize,
) -> Result<Tensor, TensorError> {
    if weight.rank() != 4 || bias.rank() != 1 || bias.shape().dims()[0] != weight.shape().dims()[0]
    {
        return Err(TensorError::ShapeMismatch {
            op: "conv2d (parameters)",
            lhs: weight.shape().clone(),
            rhs: bias.shape().clone(),
        });
    }
    let wd = weight.shape().dims();
    let (out_ch, in_ch, kh, kw) = (wd[0], wd[1], wd[2], wd[3]);

    if input.rank() != 3 || input.shape().dims()[0] != in_ch {
        return Err(TensorError::ShapeMismatch {
            op: "conv2d",
            lhs: input.shape().clone(),
            rhs: weight.shape().clone(),
        });
    }
    let (h, w) = (input.shape().dims()[1], input.shape().dims()[2]);

    let overflow = || TensorError::InvalidShape {
        op: "conv2d",
        detail: format!("padding {pad_h}x{pad_w} on a {h}x{w} input overflows"),
    };
    let padded = |len: usize, pad: usize| pad.checked_mul(2).and_then(|p| p.checked_add(len));
    let padded_h = padded(h, pad_h).ok_or_else(overflow)?;
    let padded_w = padded(w, pad_w).ok_or_else(overflow)?;
    if padded_h < kh || padded_w < kw {
        return Err(TensorError::InvalidShape {
            op: "conv2d",
            detail: format!(
                "kernel {kh}x{kw} exceeds padded input {padded_h}x{padded_w}"
            ),
        });
    }
    let out_h = padded_h - kh + 1;
    let out_w = padded_w - kw + 1;
    let out_shape = Shape::cube(out_ch, out_h, out_w);
    let out_len = out_shape.checked_num_elements().ok_or_else(overflow)?;

    tracing::trace!(
        "conv2d: [{in_ch}, {h}, {w}] -> [{out_ch}, {out_h}, {out_w}], kernel {kh}x{kw}, pad {pad_h}x{pad_w}"
    );

    let mut out = Vec::with_capacity(out_len);
    for o in 0..out_ch {
        let b = bias.get(&[o])?;
        for j in 0..out_h {
            for k in 0..out_w {
                let mut sum = 0.0f64;
                for c in 0..in_ch {
                    for u in 0..kh {
                        // Row j + u of the padded input; rows in the border read as zero.
                        let Some(y) = (j + u).checked_sub(pad_h).filter(|&y| y < h) else {
                            continue;
                        };
                        for v in 0..kw {
                            let Some(x) = (k + v).checked_sub(pad_w).filter(|&x| x < w) else {
                                continue;
                            };
                            sum += weight.get(&[o, c, u, v])? * input.at3(c, y, x);
                        }
                    }
                }
                out.push(b + sum);
            }
        }
    }

    Tensor::from_vec(out_shape, out)
}
