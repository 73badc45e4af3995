use crate::path::Segment;
use crate::utils::Result;
use csv::{Writer, WriterBuilder};
use std::{fs::File, path::Path};

/// Headerless CSV export of island segments:
/// `chrom,start_index,start,end,span,state`.
pub struct SegmentWriter {
    writer: Writer<File>,
    num_rows: usize,
}

impl SegmentWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        Ok(SegmentWriter {
            writer,
            num_rows: 0,
        })
    }

    pub fn write(&mut self, chrom: &str, segments: &[Segment]) -> Result<()> {
        for segment in segments {
            self.writer
                .write_record([
                    chrom.to_string(),
                    segment.start_index.to_string(),
                    segment.start.to_string(),
                    segment.end.to_string(),
                    segment.span.to_string(),
                    segment.state.name().to_string(),
                ])
                .map_err(|e| format!("Failed to write segment of {}: {}", chrom, e))?;
            self.num_rows += 1;
        }
        Ok(())
    }

    /// Flushes the file and returns the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush segment file: {}", e))?;
        Ok(self.num_rows)
    }
}
