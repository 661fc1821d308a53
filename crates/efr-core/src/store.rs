//! Document and house style storage
//!
//! The pipeline only reads from storage: the current house style and the
//! body of one document. [`ReportStore`] is that read interface;
//! [`FsStore`] keeps documents as `<id>.tex` files next to a TOML style
//! file, and [`MemoryStore`] keeps everything in memory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::error::StoreError;
use crate::style::HouseStyle;

/// Read access to stored reports and the shared style
///
/// Both reads return the current committed state. Implementations must be
/// shareable across threads so batch compiles can read concurrently.
pub trait ReportStore: Send + Sync {
    /// The house style; a store without one yields [`HouseStyle::default`]
    fn house_style(&self) -> Result<HouseStyle, StoreError>;

    /// Raw body of one document
    fn document_body(&self, id: &str) -> Result<String, StoreError>;

    /// Ids of all stored documents, sorted
    fn document_ids(&self) -> Result<Vec<String>, StoreError>;
}

/// Check that a document id can be used as a file stem
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Filesystem-backed store
#[derive(Debug, Clone)]
pub struct FsStore {
    documents_dir: PathBuf,
    style_file: PathBuf,
}

impl FsStore {
    pub fn new(documents_dir: impl Into<PathBuf>, style_file: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            style_file: style_file.into(),
        }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    pub fn style_file(&self) -> &Path {
        &self.style_file
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.documents_dir.join(format!("{}.tex", id))
    }

    /// Create or overwrite a document
    pub fn save_document(&self, id: &str, body: &str) -> Result<(), StoreError> {
        validate_id(id)?;
        fs::create_dir_all(&self.documents_dir)?;
        fs::write(self.document_path(id), body)?;
        debug!(id = %id, bytes = body.len(), "Saved document");
        Ok(())
    }

    /// Remove a document
    pub fn delete_document(&self, id: &str) -> Result<(), StoreError> {
        validate_id(id)?;
        match fs::remove_file(self.document_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::DocumentNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the house style after validating it
    pub fn save_house_style(&self, style: &HouseStyle) -> Result<(), StoreError> {
        style
            .validate()
            .map_err(|e| StoreError::InvalidStyle(e.to_string()))?;
        let text = style
            .to_toml_string()
            .map_err(|e| StoreError::InvalidStyle(e.to_string()))?;
        if let Some(parent) = self.style_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.style_file, text)?;
        Ok(())
    }
}

impl ReportStore for FsStore {
    fn house_style(&self) -> Result<HouseStyle, StoreError> {
        match fs::read_to_string(&self.style_file) {
            Ok(text) => {
                HouseStyle::from_toml_str(&text).map_err(|e| StoreError::InvalidStyle(e.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.style_file.display(), "No style file, using default house style");
                Ok(HouseStyle::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn document_body(&self, id: &str) -> Result<String, StoreError> {
        validate_id(id)?;
        match fs::read_to_string(self.document_path(id)) {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::DocumentNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn document_ids(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.documents_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("tex") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, String>>,
    style: RwLock<HouseStyle>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: HouseStyle) -> Self {
        Self {
            documents: RwLock::default(),
            style: RwLock::new(style),
        }
    }

    pub fn insert_document(&self, id: impl Into<String>, body: impl Into<String>) {
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        documents.insert(id.into(), body.into());
    }

    pub fn set_house_style(&self, style: HouseStyle) {
        *self.style.write().unwrap_or_else(|e| e.into_inner()) = style;
    }
}

impl ReportStore for MemoryStore {
    fn house_style(&self) -> Result<HouseStyle, StoreError> {
        Ok(self.style.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn document_body(&self, id: &str) -> Result<String, StoreError> {
        self.documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))
    }

    fn document_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }
}
