// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model loading from and saving to files.
//!
//! A model file holds the bytes described in [`codec`](crate::codec),
//! either raw or gzip-framed. The file is memory-mapped and decoded in
//! place; the decoded graph owns all its parameter data, so the mapping is
//! dropped before `load` returns.

use crate::graph::{ModelGraph, Validated};
use crate::{codec, ModelError};
use std::path::Path;

/// How model bytes are framed on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Plain MessagePack.
    #[default]
    Raw,
    /// MessagePack inside a single gzip member.
    Gzip,
}

impl Framing {
    /// Picks the framing from the file extension: `.gz` means gzip.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Framing::Gzip,
            _ => Framing::Raw,
        }
    }

    /// Decodes bytes framed this way.
    pub fn decode(self, bytes: &[u8]) -> Result<ModelGraph<Validated>, ModelError> {
        match self {
            Framing::Raw => codec::decode(bytes),
            Framing::Gzip => codec::decode_gzip(bytes),
        }
    }

    /// Encodes a graph with this framing.
    pub fn encode(self, graph: &ModelGraph<Validated>) -> Result<Vec<u8>, ModelError> {
        match self {
            Framing::Raw => codec::encode(graph),
            Framing::Gzip => codec::encode_gzip(graph),
        }
    }
}

impl std::fmt::Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framing::Raw => f.write_str("raw"),
            Framing::Gzip => f.write_str("gzip"),
        }
    }
}

/// Loads models from disk into validated [`ModelGraph`]s.
///
/// # Example
/// ```no_run
/// use model_ir::ModelLoader;
/// use std::path::Path;
///
/// let graph = ModelLoader::load(Path::new("./models/lenet.msgpack.gz")).unwrap();
/// println!("{}", graph.summary());
/// ```
pub struct ModelLoader;

impl ModelLoader {
    /// Loads a model, choosing the framing from the file extension.
    pub fn load(path: &Path) -> Result<ModelGraph<Validated>, ModelError> {
        Self::load_with(path, Framing::from_path(path))
    }

    /// Loads a model with an explicit framing.
    pub fn load_with(path: &Path, framing: Framing) -> Result<ModelGraph<Validated>, ModelError> {
        let file = std::fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(ModelError::malformed(format!(
                "model file '{}' is empty",
                path.display()
            )));
        }

        // Safety: the mapping is read-only and only lives for this call.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        let graph = framing.decode(&mmap)?;

        tracing::info!(
            "loaded model '{}' from {} ({framing}, {} bytes): {} nodes, {} parameters",
            graph.name,
            path.display(),
            mmap.len(),
            graph.num_nodes(),
            graph.num_parameters(),
        );
        Ok(graph)
    }

    /// Encodes a model and writes it to `path`.
    pub fn save(path: &Path, graph: &ModelGraph<Validated>, framing: Framing) -> Result<(), ModelError> {
        let bytes = framing.encode(graph)?;
        std::fs::write(path, &bytes)?;
        tracing::info!(
            "saved model '{}' to {} ({framing}, {} bytes)",
            graph.name,
            path.display(),
            bytes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphNode, InputRef, Linear};
    use tensor_core::{Shape, Tensor};

    fn tiny_model() -> ModelGraph<Validated> {
        let weight = Tensor::from_vec(Shape::matrix(2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let bias = Tensor::from_vec(Shape::vector(2), vec![0.5, -0.5]).unwrap();
        ModelGraph::new(
            "tiny",
            1,
            vec![GraphNode::new("fc", Linear::new(weight, bias).unwrap(), vec![InputRef::External(0)])],
        )
        .validate()
        .unwrap()
    }

    fn temp_path(file: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("model-ir-{}-{file}", std::process::id()))
    }

    #[test]
    fn test_framing_from_path() {
        assert_eq!(Framing::from_path(Path::new("m.msgpack.gz")), Framing::Gzip);
        assert_eq!(Framing::from_path(Path::new("m.GZ")), Framing::Gzip);
        assert_eq!(Framing::from_path(Path::new("m.msgpack")), Framing::Raw);
        assert_eq!(Framing::from_path(Path::new("model")), Framing::Raw);
    }

    #[test]
    fn test_save_and_load_both_framings() {
        let graph = tiny_model();
        for (file, framing) in [("tiny.msgpack", Framing::Raw), ("tiny.msgpack.gz", Framing::Gzip)] {
            let path = temp_path(file);
            ModelLoader::save(&path, &graph, framing).unwrap();
            let loaded = ModelLoader::load(&path).unwrap();
            std::fs::remove_file(&path).unwrap();

            assert_eq!(loaded.name, "tiny");
            assert_eq!(loaded.nodes(), graph.nodes());
        }
    }

    #[test]
    fn test_wrong_framing_is_malformed() {
        let path = temp_path("raw-as-gzip.bin");
        ModelLoader::save(&path, &tiny_model(), Framing::Raw).unwrap();
        let result = ModelLoader::load_with(&path, Framing::Gzip);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ModelError::MalformedModel(_))));
    }

    #[test]
    fn test_missing_file_is_io() {
        let result = ModelLoader::load(Path::new("/nonexistent/model.msgpack"));
        assert!(matches!(result, Err(ModelError::Io(_))));
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let path = temp_path("empty.msgpack");
        std::fs::write(&path, b"").unwrap();
        let result = ModelLoader::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ModelError::MalformedModel(_))));
    }
}
