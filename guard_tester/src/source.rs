use image::DynamicImage;
use proximity_guard::{FrameSource, GuardError, Result};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tif"];

/// Stands in for a camera: yields every image in a directory, sorted by file name.
pub struct DirectorySource {
    pending: VecDeque<PathBuf>,
}

impl DirectorySource {
    /// Fails if the directory cannot be read or holds no frames.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame(path))
            .collect();
        if frames.is_empty() {
            return Err(GuardError::Source(format!(
                "no frames found in {}",
                dir.display()
            )));
        }
        frames.sort();
        Ok(Self {
            pending: frames.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for DirectorySource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let frame = image::open(&path)
            .map_err(|e| GuardError::Source(format!("{}: {e}", path.display())))?;
        Ok(Some(frame))
    }
}

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("guard_tester_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn frames_are_yielded_in_name_order() {
        let dir = scratch_dir("order");
        let frames = [
            ("frame_002.png", 20u8),
            ("frame_001.png", 10),
            ("frame_003.png", 30),
        ];
        for (name, value) in frames {
            GrayImage::from_pixel(4, 4, Luma([value]))
                .save(dir.join(name))
                .unwrap();
        }
        fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let mut source = DirectorySource::open(&dir).unwrap();
        assert_eq!(source.remaining(), 3);

        let mut seen = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            seen.push(frame.to_luma8().get_pixel(0, 0)[0]);
        }
        fs::remove_dir_all(&dir).ok();

        assert_eq!(seen, vec![10, 20, 30]);
    }

    #[test]
    fn empty_directory_is_a_startup_error() {
        let dir = scratch_dir("empty");
        let result = DirectorySource::open(&dir);
        fs::remove_dir_all(&dir).ok();
        assert!(matches!(result, Err(GuardError::Source(_))));
    }

    #[test]
    fn unreadable_frame_is_a_source_error() {
        let dir = scratch_dir("corrupt");
        fs::write(dir.join("frame_001.png"), b"definitely not a png").unwrap();

        let mut source = DirectorySource::open(&dir).unwrap();
        let result = source.next_frame();
        fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(GuardError::Source(_))));
    }
}
