//! Weight loading helpers with explicit shape checks.
//!
//! Checkpoints come either as PyTorch state dicts (`.pt`) written by the
//! training script or as safetensors exports of the same state dict. Every
//! tensor is fetched unchecked and compared against the shape the
//! architecture expects so that a vocabulary/weights mismatch surfaces as
//! [`Error::ShapeMismatch`] with the offending tensor name.

use std::fs;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{Embedding, Linear, VarBuilder};
use tracing::debug;

use crate::error::{Error, Result};

/// Open a checkpoint as a [`VarBuilder`], picking the reader by extension.
pub fn open_var_builder(path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    debug!("Opening checkpoint {:?} ({extension})", path);

    let vb = match extension.as_str() {
        "safetensors" => {
            let bytes = fs::read(path).map_err(|e| {
                Error::ModelLoadError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            VarBuilder::from_buffered_safetensors(bytes, dtype, device)
        }
        "pt" | "pth" | "bin" => VarBuilder::from_pth(path, dtype, device),
        other => {
            return Err(Error::ModelLoadError(format!(
                "Unsupported checkpoint format '{other}' for {}",
                path.display()
            )))
        }
    };

    vb.map_err(|e| {
        Error::ModelLoadError(format!(
            "Failed to open checkpoint {}: {}",
            path.display(),
            e
        ))
    })
}

/// Fully qualified tensor name under the builder's prefix.
pub fn qualified_name(vb: &VarBuilder, name: &str) -> String {
    let prefix = vb.prefix();
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Dimensions of a stored tensor, without any expectation about them.
pub fn tensor_dims(vb: &VarBuilder, name: &str) -> Result<Vec<usize>> {
    let tensor = fetch(vb, name)?;
    Ok(tensor.dims().to_vec())
}

/// Fetch a tensor and require an exact shape.
pub fn load_tensor(vb: &VarBuilder, expected: &[usize], name: &str) -> Result<Tensor> {
    let tensor = fetch(vb, name)?;
    if tensor.dims() != expected {
        return Err(Error::ShapeMismatch {
            tensor: qualified_name(vb, name),
            expected: format!("{expected:?}"),
            found: format!("{:?}", tensor.dims()),
        });
    }
    Ok(tensor)
}

pub fn load_linear(vb: &VarBuilder, in_dim: usize, out_dim: usize, bias: bool) -> Result<Linear> {
    let weight = load_tensor(vb, &[out_dim, in_dim], "weight")?;
    let bias = if bias {
        Some(load_tensor(vb, &[out_dim], "bias")?)
    } else {
        None
    };
    Ok(Linear::new(weight, bias))
}

pub fn load_embedding(vb: &VarBuilder, vocab_size: usize, dim: usize) -> Result<Embedding> {
    let weight = load_tensor(vb, &[vocab_size, dim], "weight")?;
    Ok(Embedding::new(weight, dim))
}

fn fetch(vb: &VarBuilder, name: &str) -> Result<Tensor> {
    vb.get_unchecked_dtype(name, vb.dtype()).map_err(|e| {
        Error::ModelLoadError(format!(
            "Missing or unreadable tensor {}: {}",
            qualified_name(vb, name),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_checkpoint(dir: &Path) -> std::path::PathBuf {
        let mut tensors = HashMap::new();
        tensors.insert(
            "block.proj.weight".to_string(),
            Tensor::zeros((3, 2), DType::F32, &Device::Cpu).unwrap(),
        );
        tensors.insert(
            "block.proj.bias".to_string(),
            Tensor::zeros(3, DType::F32, &Device::Cpu).unwrap(),
        );
        let path = dir.join("weights.safetensors");
        candle_core::safetensors::save(&tensors, &path).unwrap();
        path
    }

    #[test]
    fn loads_linear_with_matching_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_checkpoint(dir.path());
        let vb = open_var_builder(&path, DType::F32, &Device::Cpu).unwrap();

        assert!(load_linear(&vb.pp("block").pp("proj"), 2, 3, true).is_ok());
        assert_eq!(tensor_dims(&vb.pp("block.proj"), "weight").unwrap(), vec![3, 2]);
    }

    #[test]
    fn reports_shape_mismatch_with_tensor_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_checkpoint(dir.path());
        let vb = open_var_builder(&path, DType::F32, &Device::Cpu).unwrap();

        match load_linear(&vb.pp("block").pp("proj"), 2, 4, true) {
            Err(Error::ShapeMismatch { tensor, .. }) => assert_eq!(tensor, "block.proj.weight"),
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_tensor_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_checkpoint(dir.path());
        let vb = open_var_builder(&path, DType::F32, &Device::Cpu).unwrap();

        assert!(matches!(
            load_tensor(&vb, &[1], "nope"),
            Err(Error::ModelLoadError(_))
        ));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.onnx");
        fs::write(&path, b"not a checkpoint").unwrap();
        assert!(open_var_builder(&path, DType::F32, &Device::Cpu).is_err());
    }
}
