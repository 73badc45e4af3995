//! # tufdel
//! Segmentation of decoded HMM read-depth paths.
//!
//! Each window of a Viterbi-decoded path carries one of the states TUF, Normal,
//! Deletion, Duplication or GAP_STATE. `tufdel segment` merges consecutive windows
//! into runs, writes them as BED tracks and analyses TUF-Deletion-TUF (TDT)
//! candidates against the reference; `tufdel islands` reports TDT islands as
//! coordinate segments.
//!
//! ```bash
//!  ./tufdel segment --viterbi chr1_viterbi.txt \
//!         --genome reference.fasta \
//!         --output-dir tracks
//! ```

pub mod analysis;
pub mod cli;
pub mod commands;
pub mod path;
pub mod utils;
pub mod writers;
