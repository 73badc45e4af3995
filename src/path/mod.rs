mod islands;
mod record;
mod runs;
mod segments;
mod state;

pub use islands::{find_islands, IslandParams};
pub use record::{
    parse_bedgraph_record, parse_record, read_bedgraph_records, read_records, StateRecord,
};
pub use runs::{
    segment_records, FlushPolicy, Run, RunHandler, RunSegmenter, SegmenterParams, TdtAccumulator,
    TdtMarks,
};
pub use segments::{assemble_segments, Segment};
pub use state::State;

#[cfg(test)]
pub(crate) use runs::tests as run_tests;
