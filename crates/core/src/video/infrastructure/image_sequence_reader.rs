use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::source_metadata::SourceMetadata;
use crate::video::domain::frame_reader::FrameReader;

/// Adapts a single image, or a directory of images, to [`FrameReader`].
///
/// Directory entries are ordered by file name, so numbered exports such as
/// `frame_0001.png` come out in sequence. Images are decoded lazily, one per
/// call to the iterator.
pub struct ImageSequenceReader {
    paths: Vec<PathBuf>,
    opened: bool,
}

impl ImageSequenceReader {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            opened: false,
        }
    }
}

impl Default for ImageSequenceReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `path` has a supported image extension (case-insensitive).
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn decode(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let image = image::open(path)
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?
        .to_rgb8();
    Ok(Frame::from_image(image, index)?)
}

impl FrameReader for ImageSequenceReader {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        let paths = if path.is_dir() {
            list_images(path)?
        } else if is_image(path) {
            vec![path.to_path_buf()]
        } else {
            return Err(format!("not an image or directory: {}", path.display()).into());
        };
        let first = paths
            .first()
            .ok_or_else(|| format!("no images found in {}", path.display()))?;
        let (width, height) = image::image_dimensions(first)?;

        log::debug!("Opened {} with {} frame(s)", path.display(), paths.len());
        let metadata = SourceMetadata {
            width,
            height,
            total_frames: paths.len(),
        };
        self.paths = paths;
        self.opened = true;
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if !self.opened {
            return Box::new(std::iter::once(Err("ImageSequenceReader: not opened".into())));
        }
        Box::new(
            self.paths
                .iter()
                .enumerate()
                .map(|(index, path)| decode(path, index)),
        )
    }

    fn close(&mut self) {
        self.paths.clear();
        self.opened = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn write_image(dir: &Path, name: &str, width: u32, height: u32, value: u8) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([value, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[rstest]
    #[case("frame.png", true)]
    #[case("frame.JPG", true)]
    #[case("frame.webp", true)]
    #[case("clip.mp4", false)]
    #[case("notes", false)]
    fn test_is_image(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image(Path::new(name)), expected);
    }

    #[test]
    fn test_single_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "still.png", 40, 30, 50);
        let mut reader = ImageSequenceReader::new();

        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (40, 30));
        assert!(meta.is_single_image());

        let frames: Vec<_> = reader.frames().collect();
        assert_eq!(frames.len(), 1);
        let frame = frames.into_iter().next().unwrap().unwrap();
        assert_eq!(frame.index(), 0);
        assert_eq!(frame.pixels()[[0, 0, 0]], 50);
        assert_eq!(frame.pixels()[[0, 0, 2]], 200);
    }

    #[test]
    fn test_directory_is_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "frame_002.png", 8, 8, 2);
        write_image(dir.path(), "frame_000.png", 8, 8, 0);
        write_image(dir.path(), "frame_001.png", 8, 8, 1);
        fs::write(dir.path().join("readme.txt"), b"ignored").unwrap();

        let mut reader = ImageSequenceReader::new();
        let meta = reader.open(dir.path()).unwrap();
        assert_eq!(meta.total_frames, 3);

        let frames: Vec<Frame> = reader.frames().map(|f| f.unwrap()).collect();
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.pixels()[[0, 0, 0]], i as u8);
        }
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = ImageSequenceReader::new();
        assert!(reader.open(dir.path()).is_err());
    }

    #[test]
    fn test_nonexistent_path_fails() {
        let mut reader = ImageSequenceReader::new();
        assert!(reader.open(Path::new("/nonexistent/frame.png")).is_err());
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut reader = ImageSequenceReader::new();
        assert!(reader.frames().next().unwrap().is_err());
    }

    #[test]
    fn test_close_resets_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "still.png", 8, 8, 0);
        let mut reader = ImageSequenceReader::new();
        reader.open(&path).unwrap();
        reader.close();
        reader.close();
        assert!(reader.frames().next().unwrap().is_err());
    }
}
