use super::{pair_inputs, PathInput};
use crate::analysis::{
    FastaSource, NoRepeatAnalysis, RandomSampler, RepeatAnalyzer, SequenceSource, SpadeRunner,
    TdtParams, TdtProcessor,
};
use crate::cli::SegmentArgs;
use crate::path::{read_records, segment_records, FlushPolicy, SegmenterParams};
use crate::utils::{ensure_output_dir, open_path_reader, Result};
use crate::writers::{Track, TrackBuffers, TrackWriter};
use crossbeam_channel::{bounded, Receiver};
use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    ThreadPoolBuilder,
};
use std::{collections::BTreeMap, thread};

const CHANNEL_BUFFER_SIZE: usize = 64;

/// Everything a worker needs to segment one decoded path.
pub struct SegmentContext {
    pub segmenter: SegmenterParams,
    pub tdt: TdtParams,
    pub seed: Option<u64>,
    pub spade: Option<SpadeRunner>,
}

/// Output of one decoded path, held in memory until the writer appends it.
#[derive(Debug)]
pub struct PathSummary {
    pub num_records: usize,
    pub num_runs: usize,
    pub num_candidates: usize,
    pub tracks: TrackBuffers,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SegmentTotals {
    pub num_paths: usize,
    pub num_failed: usize,
    pub num_records: usize,
    pub num_runs: usize,
    pub num_candidates: usize,
}

pub fn segment(args: SegmentArgs) -> Result<()> {
    ensure_output_dir(&args.output_dir)?;
    let inputs = pair_inputs(&args.viterbi_paths, &args.chroms)?;

    let spade = match &args.spade_dir {
        Some(spade_dir) => Some(SpadeRunner::new(
            spade_dir,
            &args.output_dir.join("spade"),
            args.gc_chunk,
            args.keep_spade_output,
        )?),
        None => None,
    };
    let ctx = SegmentContext {
        segmenter: SegmenterParams {
            treat_as_contiguous: !args.strict_contiguity,
            close_trailing_run: args.close_trailing_run,
            flush_policy: if args.strict_tdt_pattern {
                FlushPolicy::TufDelTuf
            } else {
                FlushPolicy::Eligible
            },
            min_normal_len: args.min_normal_len,
            normal_window: args.normal_window,
        },
        tdt: TdtParams {
            max_tdt_deletion: args.max_tdt_deletion,
            gc_chunk: args.gc_chunk,
        },
        seed: args.seed,
        spade,
    };

    let track_writer = TrackWriter::new(&args.output_dir)?;
    let genome_path = args.genome_path.clone();
    let totals = segment_inputs(
        &inputs,
        &ctx,
        || FastaSource::open(&genome_path),
        track_writer,
        args.num_threads,
    )?;

    log::info!(
        "Segmented {} decoded paths: {} windows, {} runs, {} TDT candidates",
        totals.num_paths,
        totals.num_records,
        totals.num_runs,
        totals.num_candidates
    );
    if totals.num_failed > 0 {
        return Err(format!(
            "{} of {} decoded paths failed",
            totals.num_failed,
            totals.num_paths + totals.num_failed
        ));
    }
    Ok(())
}

/// Segments every input on a thread pool and appends the tracks in input order.
///
/// `open_source` is called once per input, on the worker thread.
pub fn segment_inputs<F, G>(
    inputs: &[PathInput],
    ctx: &SegmentContext,
    open_source: G,
    track_writer: TrackWriter,
    num_threads: usize,
) -> Result<SegmentTotals>
where
    F: SequenceSource,
    G: Fn() -> Result<F> + Sync,
{
    let (sender_result, receiver_result) = bounded(CHANNEL_BUFFER_SIZE);
    let labels: Vec<String> = inputs.iter().map(PathInput::label).collect();
    let writer_thread = thread::spawn(move || write_in_order(receiver_result, track_writer, &labels));

    log::debug!("Initializing thread pool with {} threads...", num_threads);
    let pool = initialize_thread_pool(num_threads)?;
    pool.install(|| {
        inputs
            .par_iter()
            .enumerate()
            .for_each_with(sender_result, |s, (index, input)| {
                let outcome = open_source()
                    .and_then(|source| segment_input(index, input, ctx, &source));
                if let Err(e) = s.send((index, outcome)) {
                    log::error!("Failed to send path result to writer thread: {}", e);
                }
            });
    });

    writer_thread
        .join()
        .map_err(|_| "Writer thread panicked".to_string())?
}

fn segment_input<F: SequenceSource>(
    index: usize,
    input: &PathInput,
    ctx: &SegmentContext,
    source: &F,
) -> Result<PathSummary> {
    log::debug!("Segmenting {}", input.label());
    match &ctx.spade {
        Some(spade) => segment_path(index, input, ctx, source, spade),
        None => segment_path(index, input, ctx, source, NoRepeatAnalysis),
    }
}

fn segment_path<F: SequenceSource, A: RepeatAnalyzer>(
    index: usize,
    input: &PathInput,
    ctx: &SegmentContext,
    source: &F,
    analyzer: A,
) -> Result<PathSummary> {
    let reader = open_path_reader(&input.path)?;
    // Each path draws from its own stream so seeded runs do not depend on scheduling
    let mut sampler = RandomSampler::new(ctx.seed.map(|seed| seed.wrapping_add(index as u64)));
    let mut processor = TdtProcessor::new(&ctx.tdt, source, analyzer);
    let num_runs = segment_records(
        read_records(reader, input.chrom.clone()),
        &ctx.segmenter,
        &mut processor,
        &mut sampler,
    )
    .map_err(|e| format!("{}: {}", input.path.display(), e))?;

    let num_candidates = processor.num_candidates();
    let tracks = processor.into_tracks();
    let num_records = tracks.num_rows(Track::Bedgraph);
    if num_records == 0 {
        log::warn!("No decoded windows in {}", input.label());
    }
    Ok(PathSummary {
        num_records,
        num_runs,
        num_candidates,
        tracks,
    })
}

/// Appends results as soon as every earlier input has been written.
fn write_in_order(
    receiver: Receiver<(usize, Result<PathSummary>)>,
    mut track_writer: TrackWriter,
    labels: &[String],
) -> Result<SegmentTotals> {
    let mut totals = SegmentTotals::default();
    let mut pending = BTreeMap::new();
    let mut next = 0;
    for (index, outcome) in &receiver {
        pending.insert(index, outcome);
        while let Some(outcome) = pending.remove(&next) {
            match outcome {
                Ok(summary) => {
                    track_writer.append(&summary.tracks)?;
                    log::info!(
                        "{}: {} windows, {} runs, {} TDT candidates",
                        labels[next],
                        summary.num_records,
                        summary.num_runs,
                        summary.num_candidates
                    );
                    totals.num_paths += 1;
                    totals.num_records += summary.num_records;
                    totals.num_runs += summary.num_runs;
                    totals.num_candidates += summary.num_candidates;
                }
                Err(e) => {
                    log::error!("Segmentation of {} failed: {}", labels[next], e);
                    totals.num_failed += 1;
                }
            }
            next += 1;
        }
    }
    track_writer.finish()?;
    log::trace!("Writer thread finished");
    Ok(totals)
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("tufdel-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}
