use crate::image::ValidImage;
use actix_web::web;
use std::io;
use std::path::{Path, PathBuf};

/// Subdirectory of the media root that holds post images.
const POST_IMAGE_DIR: &str = "posts";

/// Public URL prefix that `media_dir` is served under.
pub const MEDIA_URL: &str = "/media";

/// Local directory for uploaded files.
/// Files are content-addressed by their BLAKE3 hash, so re-uploading an image reuses it.
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the media directories if they are missing.
    pub fn init(&self) -> io::Result<()> {
        std::fs::DirBuilder::new()
            .recursive(true)
            .create(self.root.join(POST_IMAGE_DIR))
    }

    /// Writes a post image and returns its path relative to the media root.
    pub async fn save_post_image(&self, image: ValidImage) -> io::Result<String> {
        let hash = blake3::hash(&image.data);
        let relative = format!("{}/{}.{}", POST_IMAGE_DIR, hash.to_hex(), image.extension);
        let path = self.root.join(&relative);

        web::block(move || -> io::Result<()> {
            if path.exists() {
                log::debug!("save_post_image: duplicate upload {:?}", path);
                return Ok(());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &image.data)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))??;

        Ok(relative)
    }
}

/// URL an uploaded file is served at.
pub fn get_file_url(relative: &str) -> String {
    format!("{}/{}", MEDIA_URL, relative)
}
