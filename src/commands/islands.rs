use super::{pair_inputs, PathInput};
use crate::cli::IslandsArgs;
use crate::path::{
    assemble_segments, find_islands, read_records, IslandParams, Segment, State, StateRecord,
};
use crate::utils::{open_path_reader, Result};
use crate::writers::SegmentWriter;
use itertools::Itertools;
use rayon::{
    iter::{IntoParallelRefIterator, ParallelIterator},
    ThreadPoolBuilder,
};

/// Segments found on one chromosome of a decoded path.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromSegments {
    pub chrom: String,
    pub segments: Vec<Segment>,
}

pub fn islands(args: IslandsArgs) -> Result<()> {
    let params = IslandParams::new(args.carrier, args.interruption, args.min_subsequence)?;
    let inputs = pair_inputs(&args.viterbi_paths, &args.chroms)?;
    let mut writer = SegmentWriter::new(&args.output_path)?;

    let pool = ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .thread_name(|i| format!("tufdel-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))?;
    let results: Vec<Result<Vec<ChromSegments>>> = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| detect_in_path(input, &params))
            .collect()
    });

    let mut num_failed = 0;
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(per_chrom) => {
                for chrom_segments in per_chrom {
                    log::info!(
                        "{}: {} segments on {}",
                        input.label(),
                        chrom_segments.segments.len(),
                        chrom_segments.chrom
                    );
                    writer.write(&chrom_segments.chrom, &chrom_segments.segments)?;
                }
            }
            Err(e) => {
                log::error!("Island detection on {} failed: {}", input.label(), e);
                num_failed += 1;
            }
        }
    }
    let num_rows = writer.finish()?;
    log::info!(
        "Wrote {} segments to {}",
        num_rows,
        args.output_path.display()
    );

    if num_failed > 0 {
        return Err(format!(
            "{} of {} decoded paths failed",
            num_failed,
            inputs.len()
        ));
    }
    Ok(())
}

fn detect_in_path(input: &PathInput, params: &IslandParams) -> Result<Vec<ChromSegments>> {
    let reader = open_path_reader(&input.path)?;
    let records = read_records(reader, input.chrom.clone())
        .collect::<Result<Vec<_>>>()
        .map_err(|e| format!("{}: {}", input.path.display(), e))?;
    if records.is_empty() {
        log::warn!("No decoded windows in {}", input.label());
    }

    let mut per_chrom = Vec::new();
    for (chrom, group) in &records.iter().chunk_by(|record| record.chrom.clone()) {
        let windows: Vec<&StateRecord> = group.collect();
        per_chrom.push(ChromSegments {
            chrom,
            segments: detect_islands(&windows, params)?,
        });
    }
    Ok(per_chrom)
}

/// Island segments of one chromosome, indexed by the upstream window index.
pub fn detect_islands(windows: &[&StateRecord], params: &IslandParams) -> Result<Vec<Segment>> {
    let path: Vec<State> = windows.iter().map(|w| w.state.canonical()).collect();
    let bounds: Vec<(u64, u64)> = windows.iter().map(|w| (w.start(), w.end())).collect();
    let members = find_islands(&path, params);
    let mut segments = assemble_segments(&members, &bounds)?;
    for segment in segments.iter_mut() {
        segment.start_index = windows[segment.start_index].index;
    }
    Ok(segments)
}
