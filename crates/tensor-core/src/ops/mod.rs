// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer kernels.
//!
//! Each kernel is a pure function of its input view and parameter views:
//! it validates shapes up front, then allocates and returns a fresh
//! row-major output tensor. Inputs may be arbitrarily strided.

mod conv_op;
mod linear_op;
mod pool_op;

pub use conv_op::conv2d;
pub use linear_op::linear;
pub use pool_op::max_pool2d;
