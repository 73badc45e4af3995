//! Bed-like output tracks.
//!
//! Workers fill a [`TrackBuffers`] per decoded path; the single [`TrackWriter`]
//! appends completed buffers so rows of different chromosomes never interleave.

use crate::path::State;
use crate::utils::Result;
use std::{
    fmt::{Display, Write as FmtWrite},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Bedgraph,
    Tuf,
    Normal,
    Deletion,
    Duplication,
    Gap,
    Tdt,
    Quad,
    Repeats,
    Candidates,
    Nucleotides,
    RepeatsInfo,
}

impl Track {
    pub const ALL: [Track; 12] = [
        Track::Bedgraph,
        Track::Tuf,
        Track::Normal,
        Track::Deletion,
        Track::Duplication,
        Track::Gap,
        Track::Tdt,
        Track::Quad,
        Track::Repeats,
        Track::Candidates,
        Track::Nucleotides,
        Track::RepeatsInfo,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Track::Bedgraph => "viterbi.bedgraph",
            Track::Tuf => "tuf.bed",
            Track::Normal => "normal.bed",
            Track::Deletion => "deletion.bed",
            Track::Duplication => "duplication.bed",
            Track::Gap => "gap.bed",
            Track::Tdt => "tdt.bed",
            Track::Quad => "quad.bed",
            Track::Repeats => "rep.bed",
            Track::Candidates => "gquads.txt",
            Track::Nucleotides => "nucl_out.bed",
            Track::RepeatsInfo => "repeates_info_file.bed",
        }
    }

    /// Track receiving closed runs of a canonical state.
    pub fn for_state(state: State) -> Track {
        match state.canonical() {
            State::Tuf => Track::Tuf,
            State::Deletion => Track::Deletion,
            State::Duplication => Track::Duplication,
            State::Gap => Track::Gap,
            _ => Track::Normal,
        }
    }
}

#[derive(Debug, Default)]
pub struct TrackBuffers {
    buffers: [String; Track::ALL.len()],
}

impl TrackBuffers {
    /// Appends one row; fields are tab-separated.
    pub fn row(&mut self, track: Track, fields: &[&dyn Display]) {
        let buffer = &mut self.buffers[track as usize];
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                buffer.push('\t');
            }
            // writing into a String cannot fail
            let _ = write!(buffer, "{}", field);
        }
        buffer.push('\n');
    }

    pub fn bed(&mut self, track: Track, chrom: &str, start: u64, end: u64) {
        self.row(track, &[&chrom, &start, &end]);
    }

    pub fn get(&self, track: Track) -> &str {
        &self.buffers[track as usize]
    }

    pub fn num_rows(&self, track: Track) -> usize {
        self.get(track).lines().count()
    }
}

pub struct TrackWriter {
    files: Vec<(Track, BufWriter<File>)>,
}

impl TrackWriter {
    /// Creates (truncating) every track file inside `output_dir`.
    pub fn new(output_dir: &Path) -> Result<Self> {
        let mut files = Vec::with_capacity(Track::ALL.len());
        for track in Track::ALL {
            let path = output_dir.join(track.file_name());
            let file = File::create(&path)
                .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
            files.push((track, BufWriter::new(file)));
        }
        Ok(TrackWriter { files })
    }

    pub fn append(&mut self, buffers: &TrackBuffers) -> Result<()> {
        for (track, file) in self.files.iter_mut() {
            file.write_all(buffers.get(*track).as_bytes())
                .map_err(|e| format!("Failed to write {}: {}", track.file_name(), e))?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        for (track, file) in self.files.iter_mut() {
            file.flush()
                .map_err(|e| format!("Failed to write {}: {}", track.file_name(), e))?;
        }
        Ok(())
    }
}
