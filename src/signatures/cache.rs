//! On-disk cache of correlation matrices
//!
//! A correlation matrix is a pure function of the population and the path
//! set, so it is stored under a SHA3-256 digest of both.

use std::fs;
use std::path::{Path as FsPath, PathBuf};

use sha3::{Digest, Sha3_256};

use super::{CorrelationMatrix, Path, SignatureBuffer};
use crate::error::AttackResult;

#[derive(Debug, Clone)]
pub struct CorrelationCache {
    dir: PathBuf,
}

impl CorrelationCache {
    /// Use `dir` as cache directory, creating it when missing
    pub fn open(dir: &FsPath) -> AttackResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Digest of a population and the paths folded over it
    pub fn key(signatures: &SignatureBuffer, paths: &[Path]) -> String {
        let mut hasher = Sha3_256::new();
        hasher.update((signatures.len() as u64).to_le_bytes());
        hasher.update(signatures.as_bytes());
        for path in paths {
            hasher.update(path.to_string().as_bytes());
            hasher.update([b';']);
        }
        hex::encode(hasher.finalize())
    }

    fn entry(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.corr", key))
    }

    pub fn load(&self, key: &str) -> AttackResult<Option<CorrelationMatrix>> {
        let path = self.entry(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let matrix: CorrelationMatrix = bincode::deserialize(&bytes)?;
        log::debug!("Correlation cache hit {}", key);
        Ok(Some(matrix))
    }

    pub fn store(&self, key: &str, matrix: &CorrelationMatrix) -> AttackResult<()> {
        let bytes = bincode::serialize(matrix)?;
        fs::write(self.entry(key), bytes)?;
        Ok(())
    }
}
