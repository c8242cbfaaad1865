use serde::Serialize;

/// Axis-aligned box in pixel space: `x, y` is the top-left corner.
///
/// Serializes as `[x, y, width, height]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(into = "[i32; 4]")]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Axis-aligned box in normalized 0-1 space, same layout as [`BoundingBox`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(into = "[f64; 4]")]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

impl From<NormalizedBox> for [f64; 4] {
    fn from(b: NormalizedBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// Normalized `[y1, x1, y2, x2]` region fed to crop-and-resize.
///
/// Boxes built by [`NormalizedBox::to_crop_box`] are clamped to 0-1; boxes
/// built directly may extend past the frame and sample as zero there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropBox {
    pub y1: f64,
    pub x1: f64,
    pub y2: f64,
    pub x2: f64,
}

impl BoundingBox {
    /// Tight box around pixel points, with its normalized counterpart.
    ///
    /// An empty point set yields zero-sized boxes at the origin.
    pub fn enclosing(points: &[[i32; 2]], frame_width: u32, frame_height: u32) -> (Self, NormalizedBox) {
        let Some(first) = points.first() else {
            return (Self::default(), NormalizedBox::default());
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first[0], first[1], first[0], first[1]);
        for p in &points[1..] {
            min_x = min_x.min(p[0]);
            min_y = min_y.min(p[1]);
            max_x = max_x.max(p[0]);
            max_y = max_y.max(p[1]);
        }
        let bbox = Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        };
        let fw = frame_width.max(1) as f64;
        let fh = frame_height.max(1) as f64;
        let raw = NormalizedBox {
            x: bbox.x as f64 / fw,
            y: bbox.y as f64 / fh,
            width: bbox.width as f64 / fw,
            height: bbox.height as f64 / fh,
        };
        (bbox, raw)
    }
}

impl NormalizedBox {
    /// Grows (or shrinks) the box by `factor` around its center.
    pub fn scale(&self, factor: f64) -> Self {
        let width = self.width * factor;
        let height = self.height * factor;
        Self {
            x: self.x - (width - self.width) / 2.0,
            y: self.y - (height - self.height) / 2.0,
            width,
            height,
        }
    }

    /// Converts to `[y1, x1, y2, x2]`, clamped to the unit square.
    pub fn to_crop_box(&self) -> CropBox {
        CropBox {
            y1: self.y.max(0.0),
            x1: self.x.max(0.0),
            y2: (self.y + self.height).min(1.0),
            x2: (self.x + self.width).min(1.0),
        }
    }

    /// Scales to pixel space, truncating toward zero.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        BoundingBox {
            x: (self.x * frame_width as f64) as i32,
            y: (self.y * frame_height as f64) as i32,
            width: (self.width * frame_width as f64) as i32,
            height: (self.height * frame_height as f64) as i32,
        }
    }
}

impl CropBox {
    /// The whole frame.
    pub const FULL: CropBox = CropBox {
        y1: 0.0,
        x1: 0.0,
        y2: 1.0,
        x2: 1.0,
    };

    /// Maps a point normalized to this crop (`[x, y]`) into frame-normalized space.
    pub fn map_point(&self, local_x: f64, local_y: f64) -> [f64; 2] {
        [
            (self.x2 - self.x1) * local_x + self.x1,
            (self.y2 - self.y1) * local_y + self.y1,
        ]
    }

    pub fn as_normalized(&self) -> NormalizedBox {
        NormalizedBox {
            x: self.x1,
            y: self.y1,
            width: self.x2 - self.x1,
            height: self.y2 - self.y1,
        }
    }
}
