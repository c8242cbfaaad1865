use std::sync::Arc;

use crate::shared::bounding_box::CropBox;
use crate::shared::constants::BOX_EXPAND_FACTOR;

use super::body_result::BodyResult;

/// Skip counter value that forces a full pass on the next frame.
pub const FORCE_DETECTION: usize = usize::MAX;

/// Per-stream state carried from one frame to the next.
///
/// Holds the crop boxes derived from the previous frame's confidently
/// tracked bodies, the previous frame's results, and how many frames have
/// been served from cache since the last real pass.
#[derive(Debug)]
pub struct RoiCache {
    boxes: Vec<CropBox>,
    bodies: Arc<[BodyResult]>,
    skipped: usize,
}

impl RoiCache {
    pub fn new() -> Self {
        Self {
            boxes: Vec::new(),
            bodies: Arc::from(Vec::new()),
            skipped: FORCE_DETECTION,
        }
    }

    pub fn boxes(&self) -> &[CropBox] {
        &self.boxes
    }

    pub fn bodies(&self) -> &Arc<[BodyResult]> {
        &self.bodies
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn clear_boxes(&mut self) {
        self.boxes.clear();
    }

    /// Counts the incoming frame and, if it is still within the skip
    /// budget, returns the previous results instead of a new pass.
    pub fn try_reuse(&mut self, skip_frame: bool, skip_frames: usize) -> Option<Arc<[BodyResult]>> {
        self.skipped = self.skipped.saturating_add(1);
        if skip_frame && self.skipped <= skip_frames {
            Some(Arc::clone(&self.bodies))
        } else {
            None
        }
    }

    /// Marks the start of a real detection pass.
    pub fn begin_pass(&mut self) {
        self.skipped = 0;
        self.bodies = Arc::from(Vec::new());
    }

    /// Stores a finished pass and seeds next frame's crop boxes from every
    /// trackable body.
    pub fn commit(&mut self, bodies: Vec<BodyResult>) -> Arc<[BodyResult]> {
        self.boxes = bodies
            .iter()
            .filter(|body| body.is_trackable())
            .map(|body| body.bbox_raw.scale(BOX_EXPAND_FACTOR).to_crop_box())
            .collect();
        self.bodies = Arc::from(bodies);
        Arc::clone(&self.bodies)
    }

    /// Drops all state after a failed pass so the next frame starts clean.
    pub fn invalidate(&mut self) {
        self.boxes.clear();
        self.bodies = Arc::from(Vec::new());
        self.skipped = FORCE_DETECTION;
    }
}

impl Default for RoiCache {
    fn default() -> Self {
        Self::new()
    }
}
