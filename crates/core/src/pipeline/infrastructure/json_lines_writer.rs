use std::io::Write;

use crate::pipeline::result_writer::{FrameDetections, ResultWriter};

/// Writes one compact JSON object per frame, newline separated.
pub struct JsonLinesWriter<W: Write + Send> {
    sink: W,
    written: usize,
}

impl<W: Write + Send> JsonLinesWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write + Send> ResultWriter for JsonLinesWriter<W> {
    fn write(&mut self, detections: &FrameDetections) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer(&mut self.sink, detections)?;
        self.sink.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.sink.flush()?;
        log::debug!("Wrote {} frame record(s)", self.written);
        Ok(())
    }
}
