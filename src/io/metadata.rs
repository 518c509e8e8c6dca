use crate::types::{LstResult, YearMetadata};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// In-memory accumulator for the per-year metadata record
///
/// Entries are collected while the render loop runs and flushed exactly once
/// afterwards, so a year that fails mid-render leaves the records of other
/// years untouched. Keys are years as strings; the BTreeMap keeps the
/// persisted record sorted.
#[derive(Debug, Default)]
pub struct MetadataStore {
    entries: BTreeMap<String, YearMetadata>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, year: u16, metadata: YearMetadata) {
        self.entries.insert(year.to_string(), metadata);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, year: u16) -> Option<&YearMetadata> {
        self.entries.get(&year.to_string())
    }

    /// Flush all accumulated entries as a single pretty-printed JSON file
    pub fn write<P: AsRef<Path>>(&self, path: P) -> LstResult<()> {
        log::info!(
            "Writing metadata for {} year(s): {}",
            self.entries.len(),
            path.as_ref().display()
        );
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.entries)?;
        Ok(())
    }
}
