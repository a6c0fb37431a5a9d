// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture with a lyrics directory, a music directory and a config directory
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub lyrics_dir: PathBuf,
    pub music_dir: PathBuf,
    pub config_home: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with empty directories
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let lyrics_dir = temp_dir.path().join("lyrics");
        let music_dir = temp_dir.path().join("music");
        let config_home = temp_dir.path().join("config");
        for dir in [&lyrics_dir, &music_dir, &config_home] {
            fs::create_dir_all(dir).expect("Failed to create fixture directory");
        }

        Self {
            temp_dir,
            lyrics_dir,
            music_dir,
            config_home,
        }
    }

    /// Create a lyric file with given content
    pub fn create_lyric_file(&self, name: &str, content: &str) -> PathBuf {
        let file_path = self.lyrics_dir.join(name);
        fs::write(&file_path, content).expect("Failed to write lyric file");
        file_path
    }

    /// Create an untagged audio file in the music library
    pub fn create_music_file<P: AsRef<Path>>(&self, relative_path: P) -> PathBuf {
        let file_path = self.music_dir.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, b"").expect("Failed to write music file");
        file_path
    }

    /// Profanity cache path the binary uses for this fixture
    pub fn cache_path(&self) -> PathBuf {
        self.config_home.join("verse").join("profanity.cache")
    }

    /// Write the profanity cache directly
    pub fn create_cache(&self, content: &str) -> PathBuf {
        let cache_path = self.cache_path();
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create cache directory");
        }
        fs::write(&cache_path, content).expect("Failed to write cache file");
        cache_path
    }

    /// Read the profanity cache
    pub fn read_cache(&self) -> Result<String, std::io::Error> {
        fs::read_to_string(self.cache_path())
    }
}
