// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Spatial max-pooling over channel-first or channel-last tensors.

use crate::{Layout, Tensor, TensorError, TensorView};

/// Takes the maximum over each `kH x kW` window, stepping `dH` / `dW`.
///
/// `layout` selects whether `input` is read as `[C, H, W]` or `[H, W, C]`;
/// the arithmetic is identical and the output uses the same layout. Output
/// extents are `⌊(H − kH) / dH⌋ + 1` and `⌊(W − kW) / dW⌋ + 1`. There is
/// no padding.
///
/// Windows are scanned row-major and the first maximum wins, so equal
/// inputs always give equal outputs. A NaN in a window propagates to the
/// output.
///
/// # Errors
/// Returns [`TensorError::InvalidShape`] if a kernel or stride size is
/// zero or the kernel is larger than the input, and
/// [`TensorError::ShapeMismatch`] if `input` is not rank 3.
pub fn max_pool2d(
    input: &TensorView<'_>,
    kernel: (usize, usize),
    stride: (usize, usize),
    layout: Layout,
) -> Result<Tensor, TensorError> {
    let (kh, kw) = kernel;
    let (dh, dw) = stride;
    if kh == 0 || kw == 0 || dh == 0 || dw == 0 {
        return Err(TensorError::InvalidShape {
            op: "max_pool2d",
            detail: format!("kernel {kh}x{kw} and stride {dh}x{dw} must be positive"),
        });
    }
    if input.rank() != 3 {
        return Err(TensorError::ShapeMismatch {
            op: "max_pool2d",
            lhs: input.shape().clone(),
            rhs: layout.shape(1, kh, kw),
        });
    }

    let (c_axis, h_axis, w_axis) = layout.axes();
    let dims = input.shape().dims();
    let (channels, h, w) = (dims[c_axis], dims[h_axis], dims[w_axis]);
    if h < kh || w < kw {
        return Err(TensorError::InvalidShape {
            op: "max_pool2d",
            detail: format!("kernel {kh}x{kw} exceeds input {h}x{w}"),
        });
    }
    let out_h = (h - kh) / dh + 1;
    let out_w = (w - kw) / dw + 1;

    tracing::trace!(
        "max_pool2d ({layout}): {channels}x{h}x{w} -> {channels}x{out_h}x{out_w}, kernel {kh}x{kw}, stride {dh}x{dw}"
    );

    // Reorders a logical (c, y, x) coordinate into the input's axis order.
    let read = |c: usize, y: usize, x: usize| {
        let [i, j, k] = layout.index(c, y, x);
        input.at3(i, j, k)
    };

    let mut out = Tensor::zeros(layout.shape(channels, out_h, out_w));
    for c in 0..channels {
        for j in 0..out_h {
            for k in 0..out_w {
                let (y0, x0) = (j * dh, k * dw);
                let mut best = read(c, y0, x0);
                for u in 0..kh {
                    for v in 0..kw {
                        let value = read(c, y0 + u, x0 + v);
                        if value > best || value.is_nan() {
                            best = value;
                        }
                    }
                }
                out.set(&layout.index(c, j, k), best)?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    fn grid_1_to_16() -> Tensor {
        Tensor::from_vec(Shape::cube(1, 4, 4), (1..=16).map(f64::from).collect()).unwrap()
    }

    #[test]
    fn test_2x2_stride_2() {
        let input = grid_1_to_16();
        let out = max_pool2d(&input.view(), (2, 2), (2, 2), Layout::ChannelFirst).unwrap();
        assert_eq!(out.shape(), &Shape::cube(1, 2, 2));
        assert_eq!(out.to_vec(), vec![6.0, 8.0, 14.0, 16.0]);
    }

    #[test]
    fn test_overlapping_windows() {
        let input = grid_1_to_16();
        let out = max_pool2d(&input.view(), (3, 3), (1, 1), Layout::ChannelFirst).unwrap();
        assert_eq!(out.to_vec(), vec![11.0, 12.0, 15.0, 16.0]);
    }

    #[test]
    fn test_floor_on_uneven_stride() {
        // (5 - 2) / 2 + 1 = 2 rows, (4 - 2) / 3 + 1 = 1 column.
        let input = Tensor::zeros(Shape::cube(2, 5, 4));
        let out = max_pool2d(&input.view(), (2, 2), (2, 3), Layout::ChannelFirst).unwrap();
        assert_eq!(out.shape(), &Shape::cube(2, 2, 1));
    }

    #[test]
    fn test_channel_last_matches_channel_first() {
        let chw =
            Tensor::from_vec(Shape::cube(3, 6, 5), (0..90).map(|i| ((i * 37) % 11) as f64).collect())
                .unwrap();
        let hwc = chw.permute(&[1, 2, 0]).unwrap();

        let first = max_pool2d(&chw.view(), (2, 3), (2, 1), Layout::ChannelFirst).unwrap();
        let last = max_pool2d(&hwc, (2, 3), (2, 1), Layout::ChannelLast).unwrap();

        assert_eq!(last.shape(), &Shape::cube(3, 3, 3));
        assert_eq!(last.permute(&[2, 0, 1]).unwrap(), first.view());
    }

    #[test]
    fn test_negative_values() {
        let input = Tensor::from_vec(Shape::cube(1, 2, 2), vec![-4.0, -3.0, -2.0, -1.0]).unwrap();
        let out = max_pool2d(&input.view(), (2, 2), (1, 1), Layout::ChannelFirst).unwrap();
        assert_eq!(out.to_vec(), vec![-1.0]);
    }

    #[test]
    fn test_nan_propagates() {
        let input = Tensor::from_vec(Shape::cube(1, 2, 2), vec![1.0, f64::NAN, 3.0, 2.0]).unwrap();
        let out = max_pool2d(&input.view(), (2, 2), (2, 2), Layout::ChannelFirst).unwrap();
        assert!(out.to_vec()[0].is_nan());
    }

    #[test]
    fn test_kernel_too_large() {
        let input = grid_1_to_16();
        let result = max_pool2d(&input.view(), (5, 1), (1, 1), Layout::ChannelFirst);
        assert!(matches!(result, Err(TensorError::InvalidShape { .. })));
    }

    #[test]
    fn test_zero_stride() {
        let input = grid_1_to_16();
        let result = max_pool2d(&input.view(), (2, 2), (0, 1), Layout::ChannelFirst);
        assert!(matches!(result, Err(TensorError::InvalidShape { .. })));
    }

    #[test]
    fn test_wrong_rank() {
        let input = Tensor::zeros(Shape::matrix(4, 4));
        let result = max_pool2d(&input.view(), (2, 2), (2, 2), Layout::ChannelFirst);
        assert!(matches!(result, Err(TensorError::ShapeMismatch { .. })));
    }
}
