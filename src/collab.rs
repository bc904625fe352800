//! Upload and persistence collaborators. The editor only talks to the traits;
//! the local implementations keep everything on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CollabError;
use crate::model::{ImageInfo, TestPayload};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl UploadResponse {
    pub fn image_info(&self) -> ImageInfo {
        ImageInfo {
            url: self.url.clone(),
            original_width: self.width,
            original_height: self.height,
        }
    }
}

pub trait ImageUploader {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<UploadResponse, CollabError>;
}

/// Copies images into an assets directory after checking they decode.
pub struct LocalUploader {
    root: PathBuf,
}

impl LocalUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn free_path(&self, file_name: &str) -> PathBuf {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("image.png");
        let mut path = self.root.join(name);
        let mut n = 1;
        while path.exists() {
            path = self.root.join(format!("{n}-{name}"));
            n += 1;
        }
        path
    }
}

impl ImageUploader for LocalUploader {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<UploadResponse, CollabError> {
        let decoded = image::load_from_memory(bytes)?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(CollabError::Rejected(format!("{file_name} has no pixels")));
        }
        std::fs::create_dir_all(&self.root)?;
        let path = self.free_path(file_name);
        std::fs::write(&path, bytes)?;
        info!(path = %path.display(), width, height, "image stored");
        Ok(UploadResponse {
            success: true,
            url: path.to_string_lossy().into_owned(),
            width,
            height,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveResponse {
    pub success: bool,
    pub test_id: u64,
}

pub trait TestStore {
    /// Saves under `test_id` when given, otherwise under a new id.
    fn save(&self, payload: &TestPayload, test_id: Option<u64>) -> Result<SaveResponse, CollabError>;
    fn load(&self, test_id: u64) -> Result<TestPayload, CollabError>;
    fn list(&self) -> Result<Vec<u64>, CollabError>;
}

/// One `test-<id>.json` file per saved exercise.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, test_id: u64) -> PathBuf {
        self.root.join(format!("test-{test_id}.json"))
    }
}

fn parse_test_id(path: &Path) -> Option<u64> {
    path.file_name()?
        .to_str()?
        .strip_prefix("test-")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

impl TestStore for JsonFileStore {
    fn save(&self, payload: &TestPayload, test_id: Option<u64>) -> Result<SaveResponse, CollabError> {
        if payload.questions.is_empty() {
            return Err(CollabError::Rejected("exercise has no questions".to_string()));
        }
        if payload.num_blocks != payload.questions.len() {
            return Err(CollabError::Rejected(format!(
                "num_blocks is {} but {} questions were sent",
                payload.num_blocks,
                payload.questions.len()
            )));
        }
        std::fs::create_dir_all(&self.root)?;
        let test_id = match test_id {
            Some(id) => id,
            None => self.list()?.into_iter().max().unwrap_or(0) + 1,
        };
        let json = serde_json::to_string_pretty(payload)?;
        std::fs::write(self.path_for(test_id), json)?;
        info!(test_id, questions = payload.questions.len(), "test saved");
        Ok(SaveResponse {
            success: true,
            test_id,
        })
    }

    fn load(&self, test_id: u64) -> Result<TestPayload, CollabError> {
        let path = self.path_for(test_id);
        if !path.exists() {
            return Err(CollabError::NotFound(test_id));
        }
        let json = std::fs::read_to_string(&path)?;
        let payload: TestPayload = serde_json::from_str(&json)?;
        if payload.num_blocks != payload.questions.len() {
            warn!(
                test_id,
                num_blocks = payload.num_blocks,
                questions = payload.questions.len(),
                "stored block count disagrees with questions"
            );
        }
        Ok(payload)
    }

    fn list(&self) -> Result<Vec<u64>, CollabError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            if let Some(id) = parse_test_id(&entry?.path()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockCoordinates, Question};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn payload(n: u32) -> TestPayload {
        let questions = (1..=n)
            .map(|id| Question {
                question_id: id,
                word: format!("w{id}"),
                block_coordinates: BlockCoordinates {
                    x: 10.0,
                    y: 10.0,
                    width: 40.0,
                    height: 20.0,
                    rel_x: Some(1.0),
                    rel_y: Some(1.0),
                    rel_width: Some(4.0),
                    rel_height: Some(2.0),
                    image_width: 1000,
                    image_height: 1000,
                },
                has_arrow: false,
                arrow: None,
            })
            .collect();
        TestPayload::new("assets/bg.png", questions)
    }

    #[test]
    fn upload_reports_natural_size_and_keeps_names_unique() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = LocalUploader::new(dir.path().join("assets"));
        let bytes = png_bytes(7, 5);
        let first = uploader.upload("/somewhere/diagram.png", &bytes).unwrap();
        assert!(first.success);
        assert_eq!((first.width, first.height), (7, 5));
        assert!(first.url.ends_with("diagram.png"));
        let second = uploader.upload("diagram.png", &bytes).unwrap();
        assert_ne!(first.url, second.url);
        assert_eq!(second.image_info().original_width, 7);
    }

    #[test]
    fn upload_of_garbage_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("assets");
        let uploader = LocalUploader::new(&root);
        let err = uploader.upload("notes.png", b"not an image").unwrap_err();
        assert!(matches!(err, CollabError::Image(_)));
        assert!(!root.exists());
    }

    #[test]
    fn store_allocates_ids_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.list().unwrap().is_empty());
        let a = store.save(&payload(2), None).unwrap();
        let b = store.save(&payload(3), None).unwrap();
        assert_eq!((a.test_id, b.test_id), (1, 2));
        assert_eq!(store.list().unwrap(), vec![1, 2]);
        assert_eq!(store.load(2).unwrap(), payload(3));

        let again = store.save(&payload(1), Some(1)).unwrap();
        assert_eq!(again.test_id, 1);
        assert_eq!(store.load(1).unwrap().num_blocks, 1);
        assert!(matches!(store.load(9), Err(CollabError::NotFound(9))));
    }

    #[test]
    fn store_rejects_inconsistent_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut bad = payload(2);
        bad.num_blocks = 5;
        assert!(matches!(store.save(&bad, None), Err(CollabError::Rejected(_))));
        assert!(matches!(store.save(&payload(0), None), Err(CollabError::Rejected(_))));
        assert!(store.list().unwrap().is_empty());
    }
}
