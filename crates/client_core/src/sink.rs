//! Client-local "save as download" seam.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Where generated decks land on the operator's machine. Production writes
/// into a downloads directory; tests substitute an in-memory recorder.
pub trait DocumentSink: Send + Sync {
    fn save(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf>;
}

/// Writes documents into a fixed directory, creating it on first use.
pub struct DownloadsDirSink {
    dir: PathBuf,
}

impl DownloadsDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for DownloadsDirSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create download dir {}", self.dir.display()))?;
        let path = self.dir.join(file_name);
        fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_creates_the_directory_and_writes_bytes() {
        let dir = std::env::temp_dir().join(format!(
            "pitchpilot-sink-test-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        let sink = DownloadsDirSink::new(&dir);

        let path = sink.save("deck.pdf", b"%PDF").expect("save");
        assert_eq!(fs::read(&path).expect("read"), b"%PDF");
        assert_eq!(path, dir.join("deck.pdf"));

        let _ = fs::remove_dir_all(&dir);
    }
}
