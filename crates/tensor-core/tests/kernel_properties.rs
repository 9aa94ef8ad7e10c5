// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Property tests for the layer kernels.

use proptest::prelude::*;
use tensor_core::{conv2d, linear, max_pool2d, Layout, Shape, Tensor, TensorError};

/// Deterministic pseudo-random fill so failures are reproducible from the seed.
fn filled(shape: Shape, seed: u64) -> Tensor {
    let n = shape.num_elements();
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let data = (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % 2001) as f64 / 1000.0 - 1.0
        })
        .collect();
    Tensor::from_vec(shape, data).unwrap()
}

proptest! {
    #[test]
    fn conv2d_output_shape_law(
        in_ch in 1usize..4,
        out_ch in 1usize..4,
        kh in 1usize..6,
        kw in 1usize..6,
        h in 1usize..8,
        w in 1usize..8,
        pad_h in 0usize..3,
        pad_w in 0usize..3,
        seed in any::<u64>(),
    ) {
        let input = filled(Shape::cube(in_ch, h, w), seed);
        let weight = filled(Shape::new(vec![out_ch, in_ch, kh, kw]), seed ^ 1);
        let bias = filled(Shape::vector(out_ch), seed ^ 2);

        let result = conv2d(&input.view(), &weight.view(), &bias.view(), pad_h, pad_w);

        let out_h = (h + 2 * pad_h) as isize - kh as isize + 1;
        let out_w = (w + 2 * pad_w) as isize - kw as isize + 1;
        if out_h <= 0 || out_w <= 0 {
            prop_assert!(matches!(result, Err(TensorError::InvalidShape { .. })), "expected InvalidShape");
        } else {
            let out = result.unwrap();
            prop_assert_eq!(out.shape(), &Shape::cube(out_ch, out_h as usize, out_w as usize));
        }
    }

    #[test]
    fn conv2d_matches_explicitly_padded_input(
        kh in 1usize..4,
        kw in 1usize..4,
        h in 3usize..6,
        w in 3usize..6,
        pad in 0usize..3,
        seed in any::<u64>(),
    ) {
        let input = filled(Shape::cube(2, h, w), seed);
        let weight = filled(Shape::new(vec![2, 2, kh, kw]), seed ^ 7);
        let bias = filled(Shape::vector(2), seed ^ 9);

        let mut padded = Tensor::zeros(Shape::cube(2, h + 2 * pad, w + 2 * pad));
        for c in 0..2 {
            for y in 0..h {
                for x in 0..w {
                    padded.set(&[c, y + pad, x + pad], input.get(&[c, y, x]).unwrap()).unwrap();
                }
            }
        }

        let implicit = conv2d(&input.view(), &weight.view(), &bias.view(), pad, pad).unwrap();
        let explicit = conv2d(&padded.view(), &weight.view(), &bias.view(), 0, 0).unwrap();

        prop_assert_eq!(implicit.shape(), explicit.shape());
        for (a, b) in implicit.to_vec().iter().zip(explicit.to_vec()) {
            prop_assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn max_pool2d_is_window_max_and_layout_invariant(
        channels in 1usize..4,
        h in 1usize..9,
        w in 1usize..9,
        kh in 1usize..4,
        kw in 1usize..4,
        dh in 1usize..4,
        dw in 1usize..4,
        seed in any::<u64>(),
    ) {
        prop_assume!(kh <= h && kw <= w);
        let chw = filled(Shape::cube(channels, h, w), seed);

        let out = max_pool2d(&chw.view(), (kh, kw), (dh, dw), Layout::ChannelFirst).unwrap();
        let (oh, ow) = ((h - kh) / dh + 1, (w - kw) / dw + 1);
        prop_assert_eq!(out.shape(), &Shape::cube(channels, oh, ow));

        for c in 0..channels {
            for j in 0..oh {
                for k in 0..ow {
                    let mut expected = f64::NEG_INFINITY;
                    for u in 0..kh {
                        for v in 0..kw {
                            expected = expected.max(chw.get(&[c, j * dh + u, k * dw + v]).unwrap());
                        }
                    }
                    prop_assert_eq!(out.get(&[c, j, k]).unwrap(), expected);
                }
            }
        }

        let hwc = chw.permute(&[1, 2, 0]).unwrap();
        let out_last = max_pool2d(&hwc, (kh, kw), (dh, dw), Layout::ChannelLast).unwrap();
        prop_assert_eq!(out_last.permute(&[2, 0, 1]).unwrap(), out.view());
    }

    #[test]
    fn linear_obeys_dot_product_law(
        out_size in 1usize..6,
        in_size in 1usize..9,
        seed in any::<u64>(),
    ) {
        let weight = filled(Shape::matrix(out_size, in_size), seed);
        let bias = filled(Shape::vector(out_size), seed ^ 3);
        let input = filled(Shape::vector(in_size), seed ^ 5);

        let out = linear(&input.view(), &weight.view(), &bias.view()).unwrap();

        for i in 0..out_size {
            let mut expected = 0.0;
            for j in 0..in_size {
                expected += weight.get(&[i, j]).unwrap() * input.get(&[j]).unwrap();
            }
            expected += bias.get(&[i]).unwrap();
            prop_assert!((out.get(&[i]).unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn linear_shape_mismatch_iff_lengths_differ(
        in_size in 1usize..8,
        input_len in 1usize..8,
    ) {
        let weight = Tensor::zeros(Shape::matrix(3, in_size));
        let bias = Tensor::zeros(Shape::vector(3));
        let input = Tensor::zeros(Shape::vector(input_len));

        let result = linear(&input.view(), &weight.view(), &bias.view());
        if input_len == in_size {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(TensorError::ShapeMismatch { .. })), "expected ShapeMismatch");
        }
    }
}
