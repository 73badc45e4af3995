use crate::utils::{open_genome_reader, Result};
use rust_htslib::faidx;
use std::{collections::HashMap, path::Path};

/// Reference sequence lookup over 0-based, end-exclusive coordinates.
pub trait SequenceSource {
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>>;
}

pub struct FastaSource {
    reader: faidx::Reader,
}

impl FastaSource {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(FastaSource {
            reader: open_genome_reader(path)?,
        })
    }
}

impl SequenceSource for FastaSource {
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        if end <= start {
            return Ok(Vec::new());
        }
        self.reader
            .fetch_seq_string(chrom, start as usize, end as usize - 1)
            .map(String::into_bytes)
            .map_err(|e| {
                format!(
                    "Error fetching sequence for region {}:{}-{}: {}",
                    chrom, start, end, e
                )
            })
    }
}

/// In-memory contigs, clamped like a FASTA index lookup.
impl SequenceSource for HashMap<String, Vec<u8>> {
    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let contig = self
            .get(chrom)
            .ok_or_else(|| format!("Unknown contig '{}'", chrom))?;
        let end = (end as usize).min(contig.len());
        let start = (start as usize).min(end);
        Ok(contig[start..end].to_vec())
    }
}
