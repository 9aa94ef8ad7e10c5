// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and strided view abstractions.

use crate::{Shape, TensorError};

/// An owned, n-dimensional `f64` tensor.
///
/// `Tensor` is the primary data carrier in the inference pipeline: layer
/// parameters, caller inputs and kernel outputs are all owned tensors.
/// Borrowed, possibly permuted access goes through [`TensorView`].
///
/// # Memory Layout
/// Data is a flat buffer addressed through per-dimension strides. Tensors
/// built with [`from_vec`](Tensor::from_vec) or [`zeros`](Tensor::zeros)
/// are row-major (last dimension fastest).
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: Shape,
    strides: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    /// Creates a new row-major tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::zeros(Shape::matrix(2, 3));
    /// assert_eq!(t.size_bytes(), 48); // 2 * 3 * 8 bytes
    /// ```
    pub fn zeros(shape: Shape) -> Self {
        let strides = shape.strides();
        let data = vec![0.0; shape.num_elements()];
        Self {
            shape,
            strides,
            data,
        }
    }

    /// Creates a row-major tensor from a flat buffer.
    ///
    /// # Errors
    /// Returns [`TensorError::BufferSizeMismatch`] if `data.len()` is not the
    /// shape's element count, and [`TensorError::InvalidShape`] if any
    /// dimension is zero or the element count overflows `usize`.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_vec(Shape::matrix(2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(t.get(&[1, 0]).unwrap(), 3.0);
    /// ```
    pub fn from_vec(shape: Shape, data: Vec<f64>) -> Result<Self, TensorError> {
        if shape.is_degenerate() {
            return Err(TensorError::invalid_shape(
                "tensor",
                format!("shape {shape} has a zero dimension"),
            ));
        }
        let expected = shape.checked_num_elements().ok_or_else(|| {
            TensorError::invalid_shape("tensor", format!("shape {shape} has too many elements"))
        })?;
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let strides = shape.strides();
        Ok(Self {
            shape,
            strides,
            data,
        })
    }

    /// Creates a tensor over `data` with explicit strides.
    ///
    /// # Errors
    /// Returns [`TensorError::OutOfBounds`] if some valid multi-index would
    /// address past the end of `data`, and [`TensorError::InvalidShape`] if
    /// the stride count differs from the rank or a dimension is zero.
    pub fn from_strided(
        data: Vec<f64>,
        shape: Shape,
        strides: Vec<usize>,
    ) -> Result<Self, TensorError> {
        check_layout(data.len(), &shape, &strides, 0)?;
        Ok(Self {
            shape,
            strides,
            data,
        })
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the per-dimension strides, in elements.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the number of logical elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns the memory footprint of the backing buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }

    /// Reads the element at a multi-index.
    ///
    /// # Errors
    /// Returns [`TensorError::OutOfBounds`] if the arity differs from the
    /// rank or any component is not below its dimension.
    pub fn get(&self, index: &[usize]) -> Result<f64, TensorError> {
        let at = locate(&self.shape, &self.strides, 0, index)?;
        Ok(self.data[at])
    }

    /// Writes the element at a multi-index.
    ///
    /// # Errors
    /// Same conditions as [`get`](Tensor::get); nothing is written on error.
    pub fn set(&mut self, index: &[usize], value: f64) -> Result<(), TensorError> {
        let at = locate(&self.shape, &self.strides, 0, index)?;
        self.data[at] = value;
        Ok(())
    }

    /// Returns a borrowed view over this tensor.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            data: &self.data,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: 0,
        }
    }

    /// Returns a zero-copy view with the axes reordered.
    ///
    /// `axes[i]` names the source axis that becomes axis `i` of the view.
    pub fn permute(&self, axes: &[usize]) -> Result<TensorView<'_>, TensorError> {
        self.view().permute(axes)
    }

    /// Returns `true` if the buffer is laid out row-major with no gaps.
    pub fn is_contiguous(&self) -> bool {
        self.strides == self.shape.strides() && self.data.len() == self.num_elements()
    }

    /// Reinterprets the tensor with a new shape of equal element count.
    ///
    /// Elements keep their logical row-major order. Contiguous tensors are
    /// reshaped in place; strided ones are compacted first.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::zeros(Shape::cube(2, 3, 4)).reshape(Shape::vector(24)).unwrap();
    /// assert_eq!(t.shape(), &Shape::vector(24));
    /// ```
    pub fn reshape(self, shape: Shape) -> Result<Tensor, TensorError> {
        if shape.checked_num_elements() != Some(self.num_elements()) {
            return Err(TensorError::ShapeMismatch {
                op: "reshape",
                lhs: self.shape,
                rhs: shape,
            });
        }
        let data = if self.is_contiguous() {
            self.data
        } else {
            self.view().to_vec()
        };
        Tensor::from_vec(shape, data)
    }

    /// Copies the elements out in logical row-major order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.view().to_vec()
    }

    /// Returns the raw backing buffer, in storage order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Logical equality: same shape and same elements in row-major order,
/// regardless of how either side is strided.
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl<'a> From<&'a Tensor> for TensorView<'a> {
    fn from(tensor: &'a Tensor) -> Self {
        tensor.view()
    }
}

/// A borrowed, read-only strided view over an `f64` buffer.
///
/// Views are zero-copy and tied to the lifetime of the source buffer,
/// enforced by the borrow checker. Permuting a view only reorders its
/// shape and strides.
#[derive(Debug, Clone)]
pub struct TensorView<'a> {
    data: &'a [f64],
    shape: Shape,
    strides: Vec<usize>,
    offset: usize,
}

impl<'a> TensorView<'a> {
    /// Creates a view over `data` with explicit strides and a base offset.
    ///
    /// # Errors
    /// Returns [`TensorError::OutOfBounds`] if some valid multi-index would
    /// address outside `data`, and [`TensorError::InvalidShape`] if the
    /// stride count differs from the rank or a dimension is zero.
    pub fn from_strided(
        data: &'a [f64],
        shape: Shape,
        strides: Vec<usize>,
        offset: usize,
    ) -> Result<Self, TensorError> {
        check_layout(data.len(), &shape, &strides, offset)?;
        Ok(Self {
            data,
            shape,
            strides,
            offset,
        })
    }

    /// Returns the shape of the view.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the per-dimension strides, in elements.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the number of logical elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Reads the element at a multi-index.
    ///
    /// # Errors
    /// Returns [`TensorError::OutOfBounds`] if the arity differs from the
    /// rank or any component is not below its dimension.
    pub fn get(&self, index: &[usize]) -> Result<f64, TensorError> {
        let at = locate(&self.shape, &self.strides, self.offset, index)?;
        Ok(self.data[at])
    }

    /// Reads a rank-3 element without bounds checking against the shape.
    ///
    /// Kernels call this after validating extents once up front.
    #[inline]
    pub(crate) fn at3(&self, i: usize, j: usize, k: usize) -> f64 {
        let s = &self.strides;
        self.data[self.offset + i * s[0] + j * s[1] + k * s[2]]
    }

    /// Reads a rank-2 element without bounds checking against the shape.
    #[inline]
    pub(crate) fn at2(&self, i: usize, j: usize) -> f64 {
        self.data[self.offset + i * self.strides[0] + j * self.strides[1]]
    }

    /// Returns a zero-copy view with the axes reordered.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidShape`] if `axes` is not a permutation
    /// of `0..rank`.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let chw = Tensor::from_vec(Shape::cube(2, 1, 3), (0..6).map(f64::from).collect()).unwrap();
    /// let hwc = chw.permute(&[1, 2, 0]).unwrap();
    /// assert_eq!(hwc.shape(), &Shape::cube(1, 3, 2));
    /// assert_eq!(hwc.get(&[0, 2, 1]).unwrap(), chw.get(&[1, 0, 2]).unwrap());
    /// ```
    pub fn permute(&self, axes: &[usize]) -> Result<TensorView<'a>, TensorError> {
        let rank = self.rank();
        let mut seen = vec![false; rank];
        if axes.len() != rank {
            return Err(TensorError::invalid_shape(
                "permute",
                format!("{} axes given for rank {rank}", axes.len()),
            ));
        }
        for &axis in axes {
            if axis >= rank || seen[axis] {
                return Err(TensorError::invalid_shape(
                    "permute",
                    format!("{axes:?} is not a permutation of 0..{rank}"),
                ));
            }
            seen[axis] = true;
        }
        let dims = axes.iter().map(|&a| self.shape.dims()[a]).collect();
        let strides = axes.iter().map(|&a| self.strides[a]).collect();
        Ok(TensorView {
            data: self.data,
            shape: Shape::new(dims),
            strides,
            offset: self.offset,
        })
    }

    /// Returns `true` if the view walks its buffer row-major with no gaps.
    pub fn is_contiguous(&self) -> bool {
        self.strides == self.shape.strides()
    }

    /// Iterates the elements in logical row-major order.
    pub fn iter(&self) -> Iter<'_> {
        let remaining = self.num_elements();
        Iter {
            data: self.data,
            dims: self.shape.dims(),
            strides: &self.strides,
            index: vec![0; self.rank()],
            pos: self.offset,
            remaining,
        }
    }

    /// Copies the elements out in logical row-major order.
    pub fn to_vec(&self) -> Vec<f64> {
        if self.is_contiguous() {
            let end = self.offset + self.num_elements();
            return self.data[self.offset..end].to_vec();
        }
        self.iter().collect()
    }

    /// Materialises the view as an owned row-major tensor.
    pub fn to_contiguous(&self) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            strides: self.shape.strides(),
            data: self.to_vec(),
        }
    }
}

impl PartialEq for TensorView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.iter().eq(other.iter())
    }
}

/// Row-major iterator over a [`TensorView`].
#[derive(Debug)]
pub struct Iter<'v> {
    data: &'v [f64],
    dims: &'v [usize],
    strides: &'v [usize],
    index: Vec<usize>,
    pos: usize,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.data[self.pos];
        self.remaining -= 1;

        // Odometer step: bump the fastest axis, carrying into slower ones.
        for axis in (0..self.dims.len()).rev() {
            self.index[axis] += 1;
            self.pos += self.strides[axis];
            if self.index[axis] < self.dims[axis] {
                break;
            }
            self.pos -= self.strides[axis] * self.dims[axis];
            self.index[axis] = 0;
        }
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Resolves a multi-index to a flat buffer offset.
fn locate(
    shape: &Shape,
    strides: &[usize],
    offset: usize,
    index: &[usize],
) -> Result<usize, TensorError> {
    let dims = shape.dims();
    if index.len() != dims.len() || index.iter().zip(dims).any(|(&i, &d)| i >= d) {
        return Err(TensorError::OutOfBounds {
            index: index.to_vec(),
            shape: shape.clone(),
        });
    }
    Ok(offset + index.iter().zip(strides).map(|(i, s)| i * s).sum::<usize>())
}

/// Checks that every valid multi-index of `shape` lands inside a buffer of `len`.
fn check_layout(
    len: usize,
    shape: &Shape,
    strides: &[usize],
    offset: usize,
) -> Result<(), TensorError> {
    if strides.len() != shape.rank() {
        return Err(TensorError::invalid_shape(
            "tensor",
            format!("{} strides given for shape {shape}", strides.len()),
        ));
    }
    if shape.is_degenerate() {
        return Err(TensorError::invalid_shape(
            "tensor",
            format!("shape {shape} has a zero dimension"),
        ));
    }
    if shape.checked_num_elements().is_none() {
        return Err(TensorError::invalid_shape(
            "tensor",
            format!("shape {shape} has too many elements"),
        ));
    }
    let last: Vec<usize> = shape.dims().iter().map(|d| d - 1).collect();
    let reach = last
        .iter()
        .zip(strides)
        .try_fold(offset, |acc, (&i, &s)| i.checked_mul(s).and_then(|x| acc.checked_add(x)));
    match reach {
        Some(max) if max < len => Ok(()),
        _ => Err(TensorError::OutOfBounds {
            index: last,
            shape: shape.clone(),
        }),
    }
}
