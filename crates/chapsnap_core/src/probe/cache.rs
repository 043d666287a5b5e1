//! On-disk cache for scene detection output.
//!
//! Scene detection decodes the whole video, so the raw ffprobe JSON is kept
//! either next to the video (sidecar) or in a shared cache directory keyed
//! by a content hash. Entries that fail to read are treated as misses.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};

use super::types::ProbeResult;

/// Where scene detection results are stored.
#[derive(Debug, Clone, Default)]
pub struct SceneCache {
    /// Shared cache directory. `None` stores sidecar files next to the video.
    directory: Option<PathBuf>,
}

impl SceneCache {
    /// Store results next to each video as
    /// `<video>.scene_changes_<threshold>t.json`.
    pub fn sidecar() -> Self {
        Self { directory: None }
    }

    /// Store results in a shared directory under hashed names.
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
        }
    }

    /// Location of the entry for a video and threshold.
    pub fn path_for(&self, video: &Path, threshold: f64) -> ProbeResult<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(dir.join(format!("{}.json", cache_key(video, threshold)?))),
            None => {
                let mut name = video.file_name().unwrap_or_default().to_os_string();
                name.push(format!(".scene_changes_{}t.json", threshold));
                Ok(video.with_file_name(name))
            }
        }
    }

    /// Cached JSON for a video, if present and readable.
    pub fn get(&self, video: &Path, threshold: f64) -> Option<String> {
        let path = match self.path_for(video, threshold) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!("Scene cache key unavailable for {}: {}", video.display(), e);
                return None;
            }
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                tracing::info!("Using cached scene changes: {}", path.display());
                Some(content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Store JSON for a video, replacing any existing entry.
    pub fn put(&self, video: &Path, threshold: f64, json: &str) -> ProbeResult<PathBuf> {
        let path = self.path_for(video, threshold)?;
        atomic_write(&path, json)?;
        tracing::debug!("Cached scene changes: {}", path.display());
        Ok(path)
    }

    /// Remove the entry for a video. Missing entries are not an error.
    pub fn remove(&self, video: &Path, threshold: f64) -> ProbeResult<()> {
        let path = self.path_for(video, threshold)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Hex SHA-256 over the video's canonical path, size, mtime and threshold.
///
/// Any change to the file or the threshold yields a new key.
pub fn cache_key(video: &Path, threshold: f64) -> io::Result<String> {
    let canonical = fs::canonicalize(video)?;
    let meta = fs::metadata(&canonical)?;
    let mtime = meta
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    hasher.update([0]);
    hasher.update(meta.len().to_le_bytes());
    hasher.update(mtime.to_le_bytes());
    hasher.update(threshold.to_bits().to_le_bytes());

    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

/// Write to a temp file in the same directory, then rename into place.
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn video_in(dir: &Path) -> PathBuf {
        let video = dir.join("episode.mkv");
        fs::write(&video, b"not really a video").unwrap();
        video
    }

    #[test]
    fn sidecar_path_appends_to_file_name() {
        let cache = SceneCache::sidecar();
        let path = cache.path_for(Path::new("/v/episode.mkv"), 0.4).unwrap();
        assert_eq!(path, PathBuf::from("/v/episode.mkv.scene_changes_0.4t.json"));
    }

    #[test]
    fn sidecar_round_trip() {
        let dir = tempdir().unwrap();
        let video = video_in(dir.path());
        let cache = SceneCache::sidecar();

        assert!(cache.get(&video, 0.4).is_none());
        cache.put(&video, 0.4, "{\"frames\": []}").unwrap();
        assert_eq!(cache.get(&video, 0.4).as_deref(), Some("{\"frames\": []}"));
        assert!(cache.get(&video, 0.3).is_none());

        cache.remove(&video, 0.4).unwrap();
        assert!(cache.get(&video, 0.4).is_none());
        cache.remove(&video, 0.4).unwrap();
    }

    #[test]
    fn directory_cache_uses_hashed_names() {
        let dir = tempdir().unwrap();
        let video = video_in(dir.path());
        let cache = SceneCache::in_directory(dir.path().join("cache"));

        let path = cache.put(&video, 0.4, "{}").unwrap();
        assert_eq!(path.parent().unwrap(), dir.path().join("cache"));
        let stem = path.file_stem().unwrap().to_string_lossy().to_string();
        assert_eq!(stem.len(), 64);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(cache.get(&video, 0.4).as_deref(), Some("{}"));
    }

    #[test]
    fn key_depends_on_threshold_and_content() {
        let dir = tempdir().unwrap();
        let video = video_in(dir.path());

        let a = cache_key(&video, 0.4).unwrap();
        assert_eq!(a, cache_key(&video, 0.4).unwrap());
        assert_ne!(a, cache_key(&video, 0.5).unwrap());

        fs::write(&video, b"a different and longer payload").unwrap();
        assert_ne!(a, cache_key(&video, 0.4).unwrap());
    }

    #[test]
    fn key_requires_existing_file() {
        assert!(cache_key(Path::new("/no/such/video.mkv"), 0.4).is_err());
    }
}
