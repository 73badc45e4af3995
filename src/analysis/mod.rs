mod gc;
pub mod gquad;
mod sampler;
mod sequence;
mod spade;
mod tdt;

pub use gc::gc_percent;
pub use gquad::GQuadResult;
#[cfg(test)]
pub(crate) use sampler::FixedSampler;
pub use sampler::{NormalSampler, RandomSampler};
pub use sequence::{FastaSource, SequenceSource};
pub use spade::{parse_weblogo, read_weblogo, SpadeRunner, Weblogo};
pub use tdt::{TdtParams, TdtProcessor};

use crate::utils::Result;
use std::fmt;

/// Region handed to secondary repeat analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatRegion {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// `TUF`, `Deletion` or `Normal`.
    pub kind: String,
}

impl fmt::Display for RepeatRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatMotif {
    pub consensus: String,
    pub unit_count: usize,
    pub align_unit_seq: String,
    pub unit_seq: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepeatCall {
    NoRepeats,
    /// Enough evidence for a repeat; the motif is missing when no consensus formed.
    Repeat(Option<RepeatMotif>),
}

pub trait RepeatAnalyzer {
    fn analyze(&self, region: &RepeatRegion, seq: &[u8]) -> Result<Vec<RepeatCall>>;

    fn is_enabled(&self) -> bool {
        true
    }
}

pub struct NoRepeatAnalysis;

impl RepeatAnalyzer for NoRepeatAnalysis {
    fn analyze(&self, _region: &RepeatRegion, _seq: &[u8]) -> Result<Vec<RepeatCall>> {
        Ok(Vec::new())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

impl<T: RepeatAnalyzer + ?Sized> RepeatAnalyzer for &T {
    fn analyze(&self, region: &RepeatRegion, seq: &[u8]) -> Result<Vec<RepeatCall>> {
        (**self).analyze(region, seq)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}
