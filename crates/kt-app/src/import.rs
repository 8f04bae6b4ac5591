//! Importable source files.

use std::path::{Path, PathBuf};

use kt_model::SourceFile;

use crate::error::{AppError, AppResult};

/// Files in `folder` whose name ends in `.{extension}`, sorted by file name.
///
/// Subfolders are not descended into.
pub fn list_available_files(folder: &Path, extension: &str) -> AppResult<Vec<SourceFile>> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let entries = std::fs::read_dir(folder).map_err(|source| AppError::FileRead {
        path: folder.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(&suffix) {
            paths.push(entry.path());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths.into_iter().map(SourceFile::new).collect())
}

/// Ordered list of files offered in the source-file picker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCatalog {
    files: Vec<SourceFile>,
}

impl FileCatalog {
    pub fn new(files: Vec<SourceFile>) -> Self {
        let mut catalog = Self::default();
        for file in files {
            catalog.add(file);
        }
        catalog
    }

    pub fn scan(folder: &Path, extension: &str) -> AppResult<Self> {
        Ok(Self::new(list_available_files(folder, extension)?))
    }

    /// Append a file unless it is already listed. Returns true when added.
    pub fn add(&mut self, file: SourceFile) -> bool {
        if self.files.contains(&file) {
            return false;
        }
        self.files.push(file);
        true
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn labels(&self) -> Vec<String> {
        self.files.iter().map(SourceFile::name).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
