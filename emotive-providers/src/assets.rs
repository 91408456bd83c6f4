//! Pre-recorded audio read from a directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::AudioAssets;

/// Audio files in one directory, looked up by file name (`goaway.mp3`)
#[derive(Debug, Clone)]
pub struct FileAudioAssets {
    dir: PathBuf,
}

impl FileAudioAssets {
    /// Serve files from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory being served
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for FileAudioAssets {
    fn default() -> Self {
        Self::new("extremes")
    }
}

/// Plain file names only
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(|c| c == '/' || c == '\\')
}

#[async_trait]
impl AudioAssets for FileAudioAssets {
    async fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        if !is_safe_key(key) {
            warn!(key, "Rejected audio asset key");
            return None;
        }
        let path = self.dir.join(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Audio asset unavailable");
                None
            }
        }
    }
}
