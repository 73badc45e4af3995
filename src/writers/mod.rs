mod segments;
mod tracks;

pub use segments::SegmentWriter;
pub use tracks::{Track, TrackBuffers, TrackWriter};
