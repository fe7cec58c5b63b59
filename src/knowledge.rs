//! Knowledge-base corpus files.
//!
//! Each category owns one growing text file (`{prefix}_{category}.txt`);
//! every confirmed sighting appends one dated paragraph. The corpus is the
//! document source for the question-answering pipeline, which only reads it.
//!
//! Appends are append-only with no rollback: text written here is never
//! retracted, even if the observation it describes is later deleted by
//! cleanup.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use tokio::sync::Mutex;

use crate::models::{Category, CategoryMode, NewSighting};

/// A corpus file's content together with where it came from.
#[derive(Debug, Clone)]
pub struct CorpusDocument {
    /// Source label, e.g. the corpus file name.
    pub origin: String,
    pub text: String,
}

/// Per-category knowledge-base text files.
pub struct KnowledgeBase {
    dir: PathBuf,
    prefix: String,
    // Serializes appends per category so concurrent writers cannot
    // interleave lines within one file.
    locks: HashMap<Category, Mutex<()>>,
}

impl KnowledgeBase {
    pub fn new(dir: PathBuf, prefix: &str, mode: CategoryMode) -> Self {
        let locks = mode
            .categories()
            .iter()
            .map(|c| (*c, Mutex::new(())))
            .collect();
        Self {
            dir,
            prefix: prefix.to_string(),
            locks,
        }
    }

    /// Path of the corpus file for a category.
    pub fn corpus_path(&self, category: Category) -> PathBuf {
        self.dir
            .join(format!("{}_{}.txt", self.prefix, category.as_str()))
    }

    /// Append one dated paragraph describing a sighting to the category's
    /// corpus file, creating the file if absent.
    pub async fn append_sighting(
        &self,
        category: Category,
        sighting: &NewSighting,
    ) -> anyhow::Result<()> {
        let _guard = match self.locks.get(&category) {
            Some(lock) => lock.lock().await,
            // Category outside the configured mode still gets recorded,
            // just without a dedicated lock entry.
            None => return self.write_entry(category, sighting),
        };
        self.write_entry(category, sighting)
    }

    fn write_entry(&self, category: Category, sighting: &NewSighting) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.corpus_path(category))?;

        let mut entry = format!(
            "\n\nRecent Sighting ({}):\n- {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            sighting.species_name
        );
        if let Some(common) = sighting.common_name.as_deref() {
            if !common.is_empty() {
                entry.push_str(&format!(" ({common})"));
            }
        }
        entry.push_str(&format!("\n  Location: {}", sighting.location_line()));
        if let Some(notes) = sighting.notes.as_deref() {
            if !notes.is_empty() {
                entry.push_str(&format!("\n  Notes: {notes}"));
            }
        }

        file.write_all(entry.as_bytes())?;
        Ok(())
    }

    /// Load every corpus text file in the knowledge directory.
    pub fn load_corpus(&self) -> anyhow::Result<Vec<CorpusDocument>> {
        let mut documents = Vec::new();
        if !self.dir.exists() {
            return Ok(documents);
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        paths.sort();

        for path in paths {
            let text = std::fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                continue;
            }
            let origin = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            documents.push(CorpusDocument { origin, text });
        }

        Ok(documents)
    }
}
