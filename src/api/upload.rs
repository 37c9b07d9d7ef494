//! Multipart uploads as an [`UploadSource`]

use std::collections::HashMap;

use axum::extract::Multipart;
use tracing::debug;

use crate::error::{SheetError, SheetResult};
use crate::excel::{UploadSource, UploadedFile};

/// File parts of a multipart form, keyed by field name.
#[derive(Debug, Default)]
pub struct UploadedFiles {
    files: HashMap<String, UploadedFile>,
}

impl UploadedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every part that carries a filename. Plain form fields are skipped.
    pub async fn from_multipart(mut multipart: Multipart) -> SheetResult<Self> {
        let mut files = Self::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| SheetError::Upload(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let Some(filename) = field.file_name().map(str::to_string) else {
                debug!(field = %name, "skipping non-file form field");
                continue;
            };
            let bytes = field
                .bytes()
                .await
                .map_err(|e| SheetError::Upload(e.to_string()))?;
            debug!(field = %name, filename = %filename, bytes = bytes.len(), "file part received");
            files.insert(name, UploadedFile::new(filename, bytes.to_vec()));
        }
        Ok(files)
    }

    pub fn insert(&mut self, key: impl Into<String>, file: UploadedFile) {
        self.files.insert(key.into(), file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl UploadSource for UploadedFiles {
    fn file(&self, key: &str) -> Option<&UploadedFile> {
        self.files.get(key)
    }
}
