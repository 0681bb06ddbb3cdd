//! Binary persistence for trained models.
//!
//! Layout: 8-byte magic, little-endian `u32` format version, then a bincode payload holding the
//! model kind and the full model state. Floats are written bit-exact, so a reloaded model
//! predicts exactly what the saved one did.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{PipelineError, Result};
use crate::ml::RegressionModel;
use crate::ml::forest::RandomForestModel;

const MAGIC: &[u8; 8] = b"FRGTMDL\0";
/// Envelope version written by [`save_model`].
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4;

/// A model type that can be written to and restored from an artifact file.
pub trait ModelArtifact: RegressionModel + Serialize + DeserializeOwned {
    /// Stable identifier stored in the artifact to reject foreign model types.
    const KIND: &'static str;

    /// Check structural invariants after deserialization.
    fn validate(&self) -> Result<(), String>;
}

impl ModelArtifact for RandomForestModel {
    const KIND: &'static str = "random_forest_regressor";

    fn validate(&self) -> Result<(), String> {
        RandomForestModel::validate(self)
    }
}

/// Where a model was written and how large the file is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub bytes: u64,
}

impl ArtifactInfo {
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Serialize `model` to `path`, replacing any existing file.
pub fn save_model<M: ModelArtifact>(model: &M, path: &Path) -> Result<ArtifactInfo> {
    let payload = bincode::serialize(&(M::KIND, model))
        .map_err(|err| PipelineError::serialization(path, err.to_string()))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&ARTIFACT_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| PipelineError::io(&dir, source))?;
    let mut temp =
        tempfile::NamedTempFile::new_in(&dir).map_err(|source| PipelineError::io(&dir, source))?;
    temp.write_all(&bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|source| PipelineError::io(temp.path(), source))?;
    temp.persist(path)
        .map_err(|err| PipelineError::io(path, err.error))?;

    Ok(ArtifactInfo {
        path: path.to_path_buf(),
        bytes: bytes.len() as u64,
    })
}

/// Restore a model written by [`save_model`].
pub fn load_model<M: ModelArtifact>(path: &Path) -> Result<M> {
    if !path.exists() {
        return Err(PipelineError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| PipelineError::io(path, source))?;
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(PipelineError::serialization(path, "not a model artifact"));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
    let version = u32::from_le_bytes(version);
    if version != ARTIFACT_FORMAT_VERSION {
        return Err(PipelineError::serialization(
            path,
            format!("unsupported format version {version} (expected {ARTIFACT_FORMAT_VERSION})"),
        ));
    }

    let (kind, model): (String, M) = bincode::deserialize(&bytes[HEADER_LEN..])
        .map_err(|err| PipelineError::serialization(path, err.to_string()))?;
    if kind != M::KIND {
        return Err(PipelineError::serialization(
            path,
            format!("artifact holds `{kind}`, expected `{}`", M::KIND),
        ));
    }
    model
        .validate()
        .map_err(|reason| PipelineError::serialization(path, reason))?;
    Ok(model)
}
