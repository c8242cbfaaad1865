/// Describes a frame source once it has been opened.
///
/// `width`/`height` are those of the first frame; later frames in an image
/// sequence may differ and are handled individually by the detectors.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceMetadata {
    pub width: u32,
    pub height: u32,
    pub total_frames: usize,
}

impl SourceMetadata {
    pub fn is_single_image(&self) -> bool {
        self.total_frames == 1
    }
}
