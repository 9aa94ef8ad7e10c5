// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Logical tensor extents.

use std::fmt;

/// The extent of every axis of a [`crate::Tensor`], outermost first.
///
/// A shape says nothing about memory order; strides live on the tensor.
/// Rank 0 is allowed and holds one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a shape from axis extents.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![6, 1, 5, 5]);
    /// assert_eq!(s.rank(), 4);
    /// assert_eq!(s.num_elements(), 150);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// `[len]`, e.g. a bias.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// `[rows, cols]`, e.g. a linear weight.
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self { dims: vec![rows, cols] }
    }

    /// `[d0, d1, d2]`, e.g. a `[C, H, W]` feature map.
    pub fn cube(d0: usize, d1: usize, d2: usize) -> Self {
        Self { dims: vec![d0, d1, d2] }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Extent of axis `index`, or `None` past the last axis.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Product of the extents.
    ///
    /// Only meaningful for shapes that passed [`checked_num_elements`];
    /// `Tensor::from_vec` and the strided constructors check it.
    ///
    /// [`checked_num_elements`]: Shape::checked_num_elements
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Product of the extents, or `None` if it does not fit in `usize`.
    ///
    /// Zero extents are skipped while checking so a shape such as
    /// `[0, 2^40, 2^40]` is still rejected: its row-major strides would
    /// overflow even though it holds no elements.
    pub fn checked_num_elements(&self) -> Option<usize> {
        let nonzero = self
            .dims
            .iter()
            .filter(|&&d| d != 0)
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))?;
        Some(if self.is_degenerate() { 0 } else { nonzero })
    }

    /// `true` if some axis has extent zero.
    pub fn is_degenerate(&self) -> bool {
        self.dims.contains(&0)
    }

    /// Row-major strides, in elements: the last axis is contiguous.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1usize; self.dims.len()];
        for i in (1..self.dims.len()).rev() {
            strides[i - 1] = strides[i] * self.dims[i];
        }
        strides
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}
