// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer definitions for the model IR.
//!
//! Each layer owns its parameter tensors and validates their shapes when it
//! is constructed, so a malformed layer fails fast instead of at the first
//! forward call. [`LayerConfig`] is the closed set of layer kinds a graph
//! node can carry; [`apply_layer`] dispatches over it.

use tensor_core::{conv2d, linear, max_pool2d, Layout, Tensor, TensorError, TensorView};

/// The kind of computation a layer performs.
///
/// The discriminants are the tags used by the binary model format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Spatial cross-correlation with zero padding.
    Convolution = 0,
    /// Spatial max-pooling.
    MaxPooling = 1,
    /// Fully connected affine layer.
    Linear = 2,
}

impl LayerKind {
    /// Numeric tag used by the model format.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parses a numeric tag from the model format.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Convolution),
            1 => Some(Self::MaxPooling),
            2 => Some(Self::Linear),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Convolution => "convolution",
            Self::MaxPooling => "max_pooling",
            Self::Linear => "linear",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spatial convolution layer: `weight[out_ch, in_ch, kH, kW]`, `bias[out_ch]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Convolution {
    weight: Tensor,
    bias: Tensor,
    pad_h: usize,
    pad_w: usize,
}

impl Convolution {
    /// Creates a convolution layer, checking that the weight is rank 4 and
    /// the bias is a vector with one entry per output channel.
    pub fn new(weight: Tensor, bias: Tensor, pad_h: usize, pad_w: usize) -> Result<Self, TensorError> {
        check_affine_params("convolution", &weight, &bias, 4)?;
        Ok(Self {
            weight,
            bias,
            pad_h,
            pad_w,
        })
    }

    /// Runs the layer on a `[in_ch, H, W]` input.
    pub fn forward(&self, input: &TensorView<'_>) -> Result<Tensor, TensorError> {
        conv2d(input, &self.weight.view(), &self.bias.view(), self.pad_h, self.pad_w)
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    /// Zero padding as `(rows, columns)`.
    pub fn padding(&self) -> (usize, usize) {
        (self.pad_h, self.pad_w)
    }
}

/// Spatial max-pooling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPooling {
    kernel: (usize, usize),
    stride: (usize, usize),
    layout: Layout,
}

impl MaxPooling {
    /// Creates a pooling layer with kernel `k_h x k_w` and stride `d_h x d_w`.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidShape`] if any size is zero.
    pub fn new(
        k_h: usize,
        k_w: usize,
        d_h: usize,
        d_w: usize,
        layout: Layout,
    ) -> Result<Self, TensorError> {
        if k_h == 0 || k_w == 0 || d_h == 0 || d_w == 0 {
            return Err(TensorError::InvalidShape {
                op: "max_pooling",
                detail: format!("kernel {k_h}x{k_w} and stride {d_h}x{d_w} must be positive"),
            });
        }
        Ok(Self {
            kernel: (k_h, k_w),
            stride: (d_h, d_w),
            layout,
        })
    }

    /// Shorthand for a channel-first pooling layer.
    pub fn channel_first(k_h: usize, k_w: usize, d_h: usize, d_w: usize) -> Result<Self, TensorError> {
        Self::new(k_h, k_w, d_h, d_w, Layout::ChannelFirst)
    }

    /// Runs the layer on an input in this layer's layout.
    pub fn forward(&self, input: &TensorView<'_>) -> Result<Tensor, TensorError> {
        max_pool2d(input, self.kernel, self.stride, self.layout)
    }

    pub fn kernel(&self) -> (usize, usize) {
        self.kernel
    }

    pub fn stride(&self) -> (usize, usize) {
        self.stride
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }
}

/// Fully connected layer: `weight[out_size, in_size]`, `bias[out_size]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    weight: Tensor,
    bias: Tensor,
}

impl Linear {
    /// Creates a linear layer, checking that the weight is a matrix and the
    /// bias has one entry per output row.
    pub fn new(weight: Tensor, bias: Tensor) -> Result<Self, TensorError> {
        check_affine_params("linear", &weight, &bias, 2)?;
        Ok(Self { weight, bias })
    }

    /// Runs the layer; inputs of rank above 1 are read flattened.
    pub fn forward(&self, input: &TensorView<'_>) -> Result<Tensor, TensorError> {
        linear(input, &self.weight.view(), &self.bias.view())
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }
}

/// The closed set of layers a graph node can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerConfig {
    Convolution(Convolution),
    MaxPooling(MaxPooling),
    Linear(Linear),
}

impl LayerConfig {
    /// Returns the kind tag of this layer.
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Convolution(_) => LayerKind::Convolution,
            Self::MaxPooling(_) => LayerKind::MaxPooling,
            Self::Linear(_) => LayerKind::Linear,
        }
    }

    /// Number of input tensors the layer consumes.
    pub fn arity(&self) -> usize {
        match self {
            Self::Convolution(_) | Self::MaxPooling(_) | Self::Linear(_) => 1,
        }
    }

    /// Named parameter tensors, in a fixed order.
    pub fn params(&self) -> Vec<(&'static str, &Tensor)> {
        match self {
            Self::Convolution(l) => vec![("weight", l.weight()), ("bias", l.bias())],
            Self::MaxPooling(_) => vec![],
            Self::Linear(l) => vec![("weight", l.weight()), ("bias", l.bias())],
        }
    }

    /// Total number of learned scalars.
    pub fn num_parameters(&self) -> usize {
        self.params().iter().map(|(_, t)| t.num_elements()).sum()
    }

    /// Runs the layer on its inputs.
    pub fn apply(&self, inputs: &[TensorView<'_>]) -> Result<Tensor, TensorError> {
        apply_layer(self, inputs)
    }

    /// Returns a concise description for display.
    pub fn summary(&self) -> String {
        match self {
            Self::Convolution(l) => {
                let (ph, pw) = l.padding();
                format!("{} weight {}, pad {ph}x{pw}", self.kind(), l.weight().shape())
            }
            Self::MaxPooling(l) => {
                let (kh, kw) = l.kernel();
                let (dh, dw) = l.stride();
                format!("{} {kh}x{kw} / {dh}x{dw} ({})", self.kind(), l.layout())
            }
            Self::Linear(l) => format!("{} weight {}", self.kind(), l.weight().shape()),
        }
    }
}

impl From<Convolution> for LayerConfig {
    fn from(layer: Convolution) -> Self {
        Self::Convolution(layer)
    }
}

impl From<MaxPooling> for LayerConfig {
    fn from(layer: MaxPooling) -> Self {
        Self::MaxPooling(layer)
    }
}

impl From<Linear> for LayerConfig {
    fn from(layer: Linear) -> Self {
        Self::Linear(layer)
    }
}

/// Computes one layer's forward transform.
///
/// # Errors
/// Returns [`TensorError::InvalidShape`] if the number of inputs differs
/// from the layer's arity, otherwise whatever the kernel reports.
pub fn apply_layer(layer: &LayerConfig, inputs: &[TensorView<'_>]) -> Result<Tensor, TensorError> {
    let [input] = inputs else {
        return Err(TensorError::InvalidShape {
            op: "apply_layer",
            detail: format!(
                "{} expects {} input(s), got {}",
                layer.kind(),
                layer.arity(),
                inputs.len()
            ),
        });
    };
    match layer {
        LayerConfig::Convolution(l) => l.forward(input),
        LayerConfig::MaxPooling(l) => l.forward(input),
        LayerConfig::Linear(l) => l.forward(input),
    }
}

fn check_affine_params(
    op: &'static str,
    weight: &Tensor,
    bias: &Tensor,
    weight_rank: usize,
) -> Result<(), TensorError> {
    let rows = weight.shape().dim(0);
    if weight.rank() != weight_rank || bias.rank() != 1 || bias.shape().dim(0) != rows {
        return Err(TensorError::ShapeMismatch {
            op,
            lhs: weight.shape().clone(),
            rhs: bias.shape().clone(),
        });
    }
    Ok(())
}
