//! File helpers shared by the CLI, the image-sequence camera and the benches.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Load an image file as RGBA.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage, image::ImageError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Whether `path` has an image extension this crate can load
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Recursively collect image files under `root`, sorted by path.
///
/// Unreadable directories are skipped.
pub fn collect_images<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut stack = vec![root.as_ref().to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if is_image_path(&path) {
                images.push(path);
            }
        }
    }

    images.sort();
    images
}

/// Expand CLI inputs: directories become their sorted image files, anything
/// else is passed through so that missing files are reported per path.
pub fn expand_inputs<P: AsRef<Path>>(inputs: &[P]) -> Vec<PathBuf> {
    inputs
        .iter()
        .flat_map(|input| {
            let input = input.as_ref();
            if input.is_dir() {
                collect_images(input)
            } else {
                vec![input.to_path_buf()]
            }
        })
        .collect()
}

/// Image directory for benches, from `CCCD_DATASET_ROOT`.
pub fn dataset_root_from_env() -> Option<PathBuf> {
    env::var("CCCD_DATASET_ROOT").ok().map(PathBuf::from)
}

/// Cap on dataset size for benches, from `CCCD_BENCH_LIMIT` (0 or unset = all).
pub fn bench_limit_from_env() -> Option<usize> {
    env::var("CCCD_BENCH_LIMIT")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

/// Sorted image paths under `root`, truncated to `limit`.
pub fn dataset_iter<P: AsRef<Path>>(root: P, limit: Option<usize>) -> impl Iterator<Item = PathBuf> {
    let mut images = collect_images(root);
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}
