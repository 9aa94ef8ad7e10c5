// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Strided `f64` tensors and the layer kernels of the inference engine.
//!
//! This crate provides:
//! - [`Tensor`]: an owned n-dimensional tensor with explicit strides.
//! - [`TensorView`]: a borrowed view; [`permute`](TensorView::permute)
//!   reorders axes without copying.
//! - [`Shape`]: runtime shape descriptors.
//! - [`Layout`]: channel-first / channel-last axis conventions.
//! - Kernels: [`conv2d`], [`max_pool2d`], [`linear`].
//!
//! # Design Goals
//! - Zero-copy views wherever possible.
//! - Kernels are pure functions: validate, allocate the output, compute.
//! - Clean error types via `thiserror`.

mod error;
mod layout;
mod ops;
mod shape;
mod tensor;

pub use error::TensorError;
pub use layout::Layout;
pub use ops::{conv2d, linear, max_pool2d};
pub use shape::Shape;
pub use tensor::{Iter, Tensor, TensorView};
