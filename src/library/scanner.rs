use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to list {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("no audio files found in {0:?}")]
    Empty(PathBuf),
}

/// Playable files discovered in one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    directory: PathBuf,
    files: Vec<String>,
}

impl Catalog {
    pub fn new(directory: impl Into<PathBuf>, mut files: Vec<String>) -> Self {
        files.sort();
        files.dedup();
        Self {
            directory: directory.into(),
            files,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Full path of a catalog entry
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

/// Scanner for finding audio files in a single directory
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// List `directory` (non-recursively) and keep files whose extension matches one of `extensions`
    pub fn scan<P: AsRef<Path>>(directory: P, extensions: &[String]) -> Result<Catalog, ScanError> {
        let directory = directory.as_ref();
        let wanted: Vec<String> = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        let mut audio_files = Vec::new();

        for entry in WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                // The directory itself could not be read
                Err(source) if source.depth() == 0 => {
                    return Err(ScanError::Io {
                        path: directory.to_path_buf(),
                        source,
                    })
                }
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let matches = path
                .extension()
                .map(|ext| wanted.contains(&ext.to_string_lossy().to_lowercase()))
                .unwrap_or(false);
            if !matches {
                continue;
            }

            match entry.file_name().to_str() {
                Some(name) => audio_files.push(name.to_string()),
                None => warn!("skipping file with non UTF-8 name: {:?}", path),
            }
        }

        if audio_files.is_empty() {
            return Err(ScanError::Empty(directory.to_path_buf()));
        }

        debug!(count = audio_files.len(), ?directory, "scanned catalog");
        Ok(Catalog::new(directory, audio_files))
    }
}
