//! Reference corpus and blueprint asset resolution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::MatchError;

/// One reference pair: an empty blueprint template and its filled (annotated)
/// counterpart, addressed by their asset identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub empty_id: String,
    pub filled_id: String,
}

/// Ordered catalog of reference pairs.
///
/// Entry positions are the join key with the vector index: row `i` of the
/// index must describe pair `i` of the corpus. The alignment invariant is
/// enforced when a [`crate::MatchSelector`] is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCorpus {
    entries: Vec<CorpusEntry>,
}

impl ReferenceCorpus {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    /// Load the pairs file: a JSON array of `[empty_id, filled_id]` tuples,
    /// ordered to match the vector index rows.
    pub fn load(path: &Path) -> Result<Self, MatchError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MatchError::CorpusLoad(format!("{}: {e}", path.display())))?;
        let pairs: Vec<(String, String)> = serde_json::from_str(&raw)
            .map_err(|e| MatchError::CorpusLoad(format!("{}: {e}", path.display())))?;
        let entries = pairs
            .into_iter()
            .map(|(empty_id, filled_id)| CorpusEntry { empty_id, filled_id })
            .collect();
        Ok(Self { entries })
    }

    /// Single-pair corpus backing the degraded sentinel match.
    pub fn sentinel() -> Self {
        Self {
            entries: vec![CorpusEntry {
                empty_id: "empty/0000.png".to_string(),
                filled_id: "filled/0000.png".to_string(),
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CorpusEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }
}

/// Read-only lookup of blueprint images by corpus position.
///
/// `Ok(None)` means the backing asset is absent, which callers treat as a
/// recoverable gap; `Err` is reserved for store-level failures.
pub trait AssetStore: Send + Sync {
    fn filled(&self, index: usize) -> Result<Option<Vec<u8>>, MatchError>;
    fn empty(&self, index: usize) -> Result<Option<Vec<u8>>, MatchError>;
}

/// Directory-backed asset store.
///
/// Expects the original cache layout: `{root}/empty/NNNN.png` and
/// `{root}/filled/NNNN.png`, zero-padded to four digits by corpus position.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, kind: &str, index: usize) -> Result<Option<Vec<u8>>, MatchError> {
        let path = self.root.join(kind).join(format!("{index:04}.png"));
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MatchError::Asset(format!("{}: {e}", path.display()))),
        }
    }
}

impl AssetStore for DirAssetStore {
    fn filled(&self, index: usize) -> Result<Option<Vec<u8>>, MatchError> {
        self.read("filled", index)
    }

    fn empty(&self, index: usize) -> Result<Option<Vec<u8>>, MatchError> {
        self.read("empty", index)
    }
}

/// In-memory asset store for tests and ephemeral setups.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetStore {
    filled: Vec<Option<Vec<u8>>>,
    empty: Vec<Option<Vec<u8>>>,
}

impl InMemoryAssetStore {
    pub fn new(empty: Vec<Option<Vec<u8>>>, filled: Vec<Option<Vec<u8>>>) -> Self {
        Self { filled, empty }
    }

    /// Store where every position resolves to the same filled payload.
    pub fn with_filled(filled: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            filled,
            empty: Vec::new(),
        }
    }
}

impl AssetStore for InMemoryAssetStore {
    fn filled(&self, index: usize) -> Result<Option<Vec<u8>>, MatchError> {
        Ok(self.filled.get(index).cloned().flatten())
    }

    fn empty(&self, index: usize) -> Result<Option<Vec<u8>>, MatchError> {
        Ok(self.empty.get(index).cloned().flatten())
    }
}
