// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph execution against hand-composed kernel calls.

use model_ir::{
    Convolution, GraphNode, InputRef, Linear, MaxPooling, ModelError, ModelGraph,
};
use model_ir::graph::Validated;
use tensor_core::{conv2d, linear, max_pool2d, Layout, Shape, Tensor, TensorError};

fn filled(shape: Shape, seed: u64) -> Tensor {
    let n = shape.num_elements();
    let data = (0..n)
        .map(|i| (((i as u64 + 1).wrapping_mul(seed * 2 + 1) % 97) as f64 - 48.0) / 16.0)
        .collect();
    Tensor::from_vec(shape, data).unwrap()
}

struct Params {
    conv_w: Tensor,
    conv_b: Tensor,
    fc_w: Tensor,
    fc_b: Tensor,
}

fn params() -> Params {
    Params {
        conv_w: filled(Shape::new(vec![3, 2, 3, 3]), 1),
        conv_b: filled(Shape::vector(3), 2),
        fc_w: filled(Shape::matrix(4, 27), 3),
        fc_b: filled(Shape::vector(4), 4),
    }
}

/// conv(2->3, 3x3, pad 1) -> pool 2x2/2 -> linear(27 -> 4)
fn lenet_like(p: &Params) -> ModelGraph<Validated> {
    ModelGraph::new(
        "lenet-like",
        1,
        vec![
            GraphNode::new(
                "conv1",
                Convolution::new(p.conv_w.clone(), p.conv_b.clone(), 1, 1).unwrap(),
                vec![InputRef::External(0)],
            ),
            GraphNode::new(
                "pool1",
                MaxPooling::channel_first(2, 2, 2, 2).unwrap(),
                vec![InputRef::Node(0)],
            ),
            GraphNode::new(
                "fc",
                Linear::new(p.fc_w.clone(), p.fc_b.clone()).unwrap(),
                vec![InputRef::Node(1)],
            ),
        ],
    )
    .validate()
    .unwrap()
}

#[test]
fn forward_equals_manual_composition() {
    let p = params();
    let graph = lenet_like(&p);
    let input = filled(Shape::cube(2, 6, 6), 5);

    let got = graph.forward_one(input.view()).unwrap();

    let c = conv2d(&input.view(), &p.conv_w.view(), &p.conv_b.view(), 1, 1).unwrap();
    let m = max_pool2d(&c.view(), (2, 2), (2, 2), Layout::ChannelFirst).unwrap();
    let flat = m.reshape(Shape::vector(27)).unwrap();
    let expected = linear(&flat.view(), &p.fc_w.view(), &p.fc_b.view()).unwrap();

    assert_eq!(got.shape(), &Shape::vector(4));
    assert_eq!(got.to_vec(), expected.to_vec());
}

#[test]
fn ones_kernel_on_ones_gives_nines() {
    let weight = Tensor::from_vec(Shape::new(vec![1, 1, 3, 3]), vec![1.0; 9]).unwrap();
    let bias = Tensor::zeros(Shape::vector(1));
    let graph = ModelGraph::new(
        "ones",
        1,
        vec![GraphNode::new(
            "conv",
            Convolution::new(weight, bias, 0, 0).unwrap(),
            vec![InputRef::External(0)],
        )],
    )
    .validate()
    .unwrap();

    let input = Tensor::from_vec(Shape::cube(1, 5, 5), vec![1.0; 25]).unwrap();
    let out = graph.forward_one(input.view()).unwrap();
    assert_eq!(out.shape(), &Shape::cube(1, 3, 3));
    assert!(out.to_vec().iter().all(|&v| v == 9.0));
}

#[test]
fn channel_last_pool_on_permuted_input() {
    let graph = ModelGraph::new(
        "hwc",
        1,
        vec![GraphNode::new(
            "pool",
            MaxPooling::new(2, 2, 2, 2, Layout::ChannelLast).unwrap(),
            vec![InputRef::External(0)],
        )],
    )
    .validate()
    .unwrap();

    let chw = Tensor::from_vec(Shape::cube(1, 4, 4), (1..=16).map(f64::from).collect()).unwrap();
    let hwc = chw.permute(&[1, 2, 0]).unwrap();
    let out = graph.forward_one(hwc).unwrap();

    assert_eq!(out.shape(), &Shape::cube(2, 2, 1));
    assert_eq!(out.to_vec(), vec![6.0, 8.0, 14.0, 16.0]);
}

#[test]
fn node_output_feeds_two_consumers() {
    // Both branches read the conv output; the model output is the second.
    let p = params();
    let graph = ModelGraph::new(
        "fanout",
        1,
        vec![
            GraphNode::new(
                "conv",
                Convolution::new(p.conv_w.clone(), p.conv_b.clone(), 0, 0).unwrap(),
                vec![InputRef::External(0)],
            ),
            GraphNode::new("pool_a", MaxPooling::channel_first(2, 2, 1, 1).unwrap(), vec![InputRef::Node(0)]),
            GraphNode::new("pool_b", MaxPooling::channel_first(4, 4, 1, 1).unwrap(), vec![InputRef::Node(0)]),
        ],
    )
    .validate()
    .unwrap();

    let input = filled(Shape::cube(2, 6, 6), 9);
    let out = graph.forward_one(input.view()).unwrap();

    let c = conv2d(&input.view(), &p.conv_w.view(), &p.conv_b.view(), 0, 0).unwrap();
    let expected = max_pool2d(&c.view(), (4, 4), (1, 1), Layout::ChannelFirst).unwrap();
    assert_eq!(out, expected);
}

#[test]
fn missing_external_input_is_unresolved() {
    let p = params();
    let graph = lenet_like(&p);
    match graph.forward(&[]) {
        Err(ModelError::UnresolvedInput { node, input, supplied }) => {
            assert_eq!(node, 0);
            assert_eq!(input, InputRef::External(0));
            assert_eq!(supplied, 0);
        }
        other => panic!("expected UnresolvedInput, got {other:?}"),
    }
}

#[test]
fn kernel_errors_propagate_unchanged() {
    let p = params();
    let graph = lenet_like(&p);
    // Three channels where the convolution expects two.
    let input = filled(Shape::cube(3, 6, 6), 1);
    assert!(matches!(
        graph.forward_one(input.view()),
        Err(ModelError::Tensor(TensorError::ShapeMismatch { .. }))
    ));

    // The padded convolution yields 1x1, smaller than the pooling window.
    let tiny = filled(Shape::cube(2, 1, 1), 1);
    assert!(matches!(
        graph.forward_one(tiny.view()),
        Err(ModelError::Tensor(TensorError::InvalidShape { .. }))
    ));
}

#[test]
fn concurrent_forward_calls() {
    let p = params();
    let graph = lenet_like(&p);
    let input = filled(Shape::cube(2, 6, 6), 5);
    let expected = graph.forward_one(input.view()).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| graph.forward_one(input.view()).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}
