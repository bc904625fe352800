use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::{Context as _, bail};
use eframe::egui;
use tracing::debug;

use crate::collab::ImageUploader;
use crate::model::ImageInfo;

pub(super) enum ImageJob {
    /// A file picked by the user: upload it, then decode it.
    Upload(PathBuf),
    /// An image already referenced by a saved test: decode it for display.
    Display(ImageInfo),
}

pub(super) struct LoadedImage {
    pub info: ImageInfo,
    pub pixels: egui::ColorImage,
    pub uploaded: bool,
}

/// Decode running on a worker thread. Polled once per frame.
pub(super) struct PendingImage {
    rx: Receiver<anyhow::Result<LoadedImage>>,
    pub label: String,
}

impl PendingImage {
    pub fn spawn(
        job: ImageJob,
        uploader: Arc<dyn ImageUploader + Send + Sync>,
        ctx: egui::Context,
    ) -> Self {
        let label = match &job {
            ImageJob::Upload(path) => path.display().to_string(),
            ImageJob::Display(info) => info.url.clone(),
        };
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = run(job, uploader.as_ref());
            let _ = tx.send(result);
            ctx.request_repaint();
        });
        Self { rx, label }
    }

    pub fn poll(&self) -> Option<anyhow::Result<LoadedImage>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(anyhow::anyhow!("image loader stopped"))),
        }
    }
}

fn run(job: ImageJob, uploader: &dyn ImageUploader) -> anyhow::Result<LoadedImage> {
    match job {
        ImageJob::Upload(path) => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image.png");
            let response = uploader.upload(name, &bytes)?;
            if !response.success {
                bail!("upload of {name} was refused");
            }
            let pixels = decode(&bytes)?;
            debug!(url = %response.url, "upload decoded");
            Ok(LoadedImage {
                info: response.image_info(),
                pixels,
                uploaded: true,
            })
        }
        ImageJob::Display(info) => {
            let bytes = std::fs::read(&info.url).with_context(|| format!("reading {}", info.url))?;
            let pixels = decode(&bytes)?;
            Ok(LoadedImage {
                info,
                pixels,
                uploaded: false,
            })
        }
    }
}

fn decode(bytes: &[u8]) -> anyhow::Result<egui::ColorImage> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
