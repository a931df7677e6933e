//! Dataset discovery and keyword-based labelling.
//!
//! Files are found per extension, in the configured extension order, and
//! labelled once by looking for keywords in the lowercased file name and full
//! path. Files with no keyword are dealt round-robin: each goes to whichever
//! list is currently shorter, real on a tie, so the two lists stay balanced.

use crate::config::DatasetConfig;
use crate::error::ScanError;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Label assigned to every discovered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Real,
    Fake,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Real => f.write_str("real"),
            Category::Fake => f.write_str("fake"),
        }
    }
}

/// Keyword lists, lowercased once up front.
#[derive(Debug, Clone)]
pub struct Keywords {
    real: Vec<String>,
    fake: Vec<String>,
}

impl Keywords {
    pub fn new<S: AsRef<str>>(real: &[S], fake: &[S]) -> Self {
        let lower = |words: &[S]| {
            words
                .iter()
                .map(|w| w.as_ref().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            real: lower(real),
            fake: lower(fake),
        }
    }

    pub fn from_config(config: &DatasetConfig) -> Self {
        Self::new(&config.real_keywords, &config.fake_keywords)
    }

    /// Keyword match on the file name and the full path, real keywords first.
    pub fn classify(&self, path: &Path) -> Option<Category> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let full = path.to_string_lossy().to_lowercase();

        let hit = |words: &[String]| {
            words
                .iter()
                .any(|w| name.contains(w.as_str()) || full.contains(w.as_str()))
        };

        if hit(&self.real) {
            Some(Category::Real)
        } else if hit(&self.fake) {
            Some(Category::Fake)
        } else {
            None
        }
    }
}

impl Default for Keywords {
    fn default() -> Self {
        Self::from_config(&DatasetConfig::default())
    }
}

/// The two ordered file lists produced by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub real_files: Vec<PathBuf>,
    pub fake_files: Vec<PathBuf>,
}

impl ScanResult {
    /// Label `path` and append it to the matching list. Returns the label used.
    pub fn assign(&mut self, path: PathBuf, keywords: &Keywords) -> Category {
        let category = keywords.classify(&path).unwrap_or_else(|| {
            if self.real_files.len() <= self.fake_files.len() {
                Category::Real
            } else {
                Category::Fake
            }
        });

        match category {
            Category::Real => self.real_files.push(path),
            Category::Fake => self.fake_files.push(path),
        }

        category
    }

    pub fn files(&self, category: Category) -> &[PathBuf] {
        match category {
            Category::Real => &self.real_files,
            Category::Fake => &self.fake_files,
        }
    }

    /// First file of a category, used as that category's example.
    pub fn example(&self, category: Category) -> Option<&Path> {
        self.files(category).first().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.real_files.len() + self.fake_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real_files.is_empty() && self.fake_files.is_empty()
    }
}

/// Recursively collect and label every audio file under `config.root`.
///
/// # Errors
///
/// Returns [`ScanError::RootNotFound`] if the root is not a directory and
/// [`ScanError::NoAudioFiles`] if nothing with a configured extension exists.
pub fn scan(config: &DatasetConfig) -> Result<ScanResult, ScanError> {
    let root = &config.root;
    tracing::info!(root = %root.display(), "Searching for audio files");

    if !root.is_dir() {
        return Err(ScanError::RootNotFound { path: root.clone() });
    }

    let keywords = Keywords::from_config(config);
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    let escaped_root = Pattern::escape(&root.to_string_lossy());

    let mut result = ScanResult::default();
    for ext in &config.extensions {
        let pattern = format!("{}/**/*.{}", escaped_root, ext);
        let paths = glob::glob_with(&pattern, options).map_err(|source| {
            ScanError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            }
        })?;

        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    let category = result.assign(path, &keywords);
                    tracing::debug!(%category, "Labelled audio file");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
            }
        }
    }

    tracing::info!("Found {} real audio files", result.real_files.len());
    tracing::info!("Found {} fake audio files", result.fake_files.len());

    if result.is_empty() {
        return Err(ScanError::NoAudioFiles { path: root.clone() });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();
        path
    }

    fn config_for(root: &Path) -> DatasetConfig {
        DatasetConfig {
            root: root.to_path_buf(),
            ..DatasetConfig::default()
        }
    }

    #[test]
    fn test_classify_literal_keywords() {
        let keywords = Keywords::default();
        assert_eq!(
            keywords.classify(Path::new("data/real_sample.wav")),
            Some(Category::Real)
        );
        assert_eq!(
            keywords.classify(Path::new("data/fake_sample.wav")),
            Some(Category::Fake)
        );
        assert_eq!(keywords.classify(Path::new("data/clip_01.wav")), None);
    }

    #[test]
    fn test_classify_is_case_insensitive_and_uses_folders() {
        let keywords = Keywords::default();
        assert_eq!(
            keywords.classify(Path::new("corpus/SYNTHETIC/take1.mp3")),
            Some(Category::Fake)
        );
        assert_eq!(
            keywords.classify(Path::new("corpus/Genuine/take1.mp3")),
            Some(Category::Real)
        );
    }

    #[test]
    fn test_real_keywords_take_precedence() {
        let keywords = Keywords::default();
        assert_eq!(
            keywords.classify(Path::new("fake/original_voice.wav")),
            Some(Category::Real)
        );
    }

    #[test]
    fn test_unmatched_files_alternate_starting_with_real() {
        let keywords = Keywords::default();
        let mut result = ScanResult::default();

        assert_eq!(result.assign("a.wav".into(), &keywords), Category::Real);
        assert_eq!(result.assign("b.wav".into(), &keywords), Category::Fake);
        assert_eq!(result.assign("c.wav".into(), &keywords), Category::Real);
    }

    #[test]
    fn test_fallback_fills_shorter_list() {
        let keywords = Keywords::default();
        let mut result = ScanResult::default();
        result.assign("real_1.wav".into(), &keywords);
        result.assign("real_2.wav".into(), &keywords);

        assert_eq!(result.assign("x.wav".into(), &keywords), Category::Fake);
        assert_eq!(result.assign("y.wav".into(), &keywords), Category::Fake);
        assert_eq!(result.assign("z.wav".into(), &keywords), Category::Real);
    }

    #[test]
    fn test_scan_labels_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let real = touch(dir.path(), "real_sample.wav");
        let fake = touch(dir.path(), "fake_sample.wav");

        let result = scan(&config_for(dir.path())).unwrap();
        assert_eq!(result.real_files, vec![real]);
        assert_eq!(result.fake_files, vec![fake]);
    }

    #[test]
    fn test_scan_two_unlabelled_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = touch(dir.path(), "a.wav");
        let second = touch(dir.path(), "b.wav");

        let result = scan(&config_for(dir.path())).unwrap();
        assert_eq!(result.real_files, vec![first]);
        assert_eq!(result.fake_files, vec![second]);
    }

    #[test]
    fn test_scan_orders_by_extension_then_path() {
        let dir = tempfile::tempdir().unwrap();
        let flac = touch(dir.path(), "a/clip.flac");
        let wav = touch(dir.path(), "z/clip.WAV");
        let mp3 = touch(dir.path(), "m/clip.mp3");
        touch(dir.path(), "notes.txt");

        let result = scan(&config_for(dir.path())).unwrap();
        // wav, mp3, flac are dealt real, fake, real.
        assert_eq!(result.real_files, vec![wav, flac]);
        assert_eq!(result.fake_files, vec![mp3]);
    }

    #[test]
    fn test_scan_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md");

        let err = scan(&config_for(dir.path())).unwrap_err();
        assert!(matches!(err, ScanError::NoAudioFiles { .. }));
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan(&config_for(&dir.path().join("absent"))).unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound { .. }));
    }

    proptest! {
        #[test]
        fn prop_every_file_lands_in_exactly_one_list(
            names in proptest::collection::vec("[a-z_]{1,12}", 0..40)
        ) {
            let keywords = Keywords::default();
            let mut result = ScanResult::default();
            let paths: Vec<PathBuf> = names
                .iter()
                .enumerate()
                .map(|(i, n)| PathBuf::from(format!("{}_{}.wav", n, i)))
                .collect();

            for path in &paths {
                result.assign(path.clone(), &keywords);
            }

            prop_assert_eq!(result.len(), paths.len());
            for path in &paths {
                let in_real = result.real_files.contains(path);
                let in_fake = result.fake_files.contains(path);
                prop_assert!(in_real != in_fake);
            }
        }
    }
}
