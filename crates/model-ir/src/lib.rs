// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! A minimal intermediate representation for small feed-forward networks.
//!
//! - [`LayerConfig`]: the closed set of layers ([`Convolution`],
//!   [`MaxPooling`], [`Linear`]) with their learned parameters.
//! - [`ModelGraph`]: the model as a DAG of nodes stored in dependency order,
//!   with a **type-state pattern** (`Loaded` → `Validated`). Only a
//!   validated graph can run [`forward`](ModelGraph::forward).
//! - [`codec`]: the MessagePack model format, raw or gzip-framed.
//! - [`ModelLoader`]: reads and writes model files.
//!
//! # Example
//! ```no_run
//! use model_ir::ModelLoader;
//! use std::path::Path;
//! use tensor_core::{Shape, Tensor};
//!
//! let graph = ModelLoader::load(Path::new("./models/lenet.msgpack")).unwrap();
//! println!("{graph}");
//! let input = Tensor::zeros(Shape::cube(1, 28, 28));
//! let output = graph.forward_one(input.view()).unwrap();
//! println!("{:?}", output.to_vec());
//! ```

pub mod codec;
mod error;
pub mod graph;
mod layer;
mod loader;

pub use codec::{decode, decode_gzip, encode, encode_gzip};
pub use error::ModelError;
pub use graph::{ExecutionObserver, GraphNode, InputRef, ModelGraph, NodeReport};
pub use layer::{apply_layer, Convolution, LayerConfig, LayerKind, Linear, MaxPooling};
pub use loader::{Framing, ModelLoader};
