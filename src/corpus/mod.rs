//! Knowledge-base corpus loading.
//!
//! The corpus is an ordered list of article bodies read from one column of a
//! CSV file. A document's identity is its row position, so the order here is
//! what every index uses to map scores back to text.


use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{KbError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    documents: Vec<String>,
    source: Option<PathBuf>,
}

impl Corpus {
    /// Read `text_column` of the CSV at `path`, one document per row
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P, text_column: &str) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading knowledge base from {}", path.display());

        if !path.is_file() {
            return Err(KbError::DataLoad(format!(
                "Dataset not found: {}",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| {
                KbError::DataLoad(format!("Failed to open {}: {}", path.display(), e))
            })?;

        let headers = reader
            .headers()
            .map_err(|e| KbError::DataLoad(format!("Failed to read CSV header: {}", e)))?;

        let column = headers
            .iter()
            .position(|header| header.trim() == text_column)
            .ok_or_else(|| {
                KbError::DataLoad(format!(
                    "Column '{}' not found in {} (available: {})",
                    text_column,
                    path.display(),
                    headers.iter().collect::<Vec<_>>().join(", ")
                ))
            })?;

        let mut documents = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                KbError::DataLoad(format!("Malformed row {} in {}: {}", row + 1, path.display(), e))
            })?;
            documents.push(record.get(column).unwrap_or_default().to_string());
        }

        info!(
            "Loaded {} articles from {}",
            documents.len(),
            path.display()
        );

        Ok(Self {
            documents,
            source: Some(path.to_path_buf()),
        })
    }

    #[inline]
    pub fn from_documents<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            documents: documents.into_iter().map(Into::into).collect(),
            source: None,
        }
    }

    #[inline]
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    #[inline]
    pub fn get(&self, document_id: usize) -> Option<&str> {
        self.documents.get(document_id).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// File the corpus was read from, if any
    #[inline]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
