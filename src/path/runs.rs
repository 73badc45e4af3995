use super::{State, StateRecord};
use crate::analysis::NormalSampler;
use crate::utils::Result;

/// A maximal block of consecutive windows sharing one canonical state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub chrom: String,
    pub state: State,
    pub start: u64,
    pub end: u64,
}

impl Run {
    fn open(record: &StateRecord, state: State) -> Self {
        Run {
            chrom: record.chrom.clone(),
            state,
            start: record.start(),
            end: record.end(),
        }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives everything the segmenter decides. Implementations own all I/O.
pub trait RunHandler {
    /// Called once per input window, before segmentation, with the raw label.
    fn record(&mut self, record: &StateRecord) -> Result<()>;
    /// Called once per closed run.
    fn run(&mut self, run: &Run) -> Result<()>;
    /// Called with the pending TUF/Deletion runs when a boundary releases them.
    fn flush_tdt(&mut self, entries: &[Run]) -> Result<()>;
    /// Called with a `[start, end)` sub-window drawn from a long Normal run.
    fn sample_normal(&mut self, chrom: &str, start: u64, end: u64) -> Result<()>;
}

/// When a Normal, Duplication or Gap boundary releases the pending runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Normal flushes once a TUF was followed by a Deletion;
    /// Duplication and Gap flush whatever is pending.
    Eligible,
    /// Every boundary requires three consecutive pending runs TUF, Deletion, TUF.
    TufDelTuf,
}

#[derive(Debug, Clone)]
pub struct SegmenterParams {
    /// Extend the open run without checking that windows abut.
    pub treat_as_contiguous: bool,
    /// Close the run still open at end of stream instead of dropping it.
    pub close_trailing_run: bool,
    pub flush_policy: FlushPolicy,
    /// Normal runs longer than this are candidates for sub-window sampling.
    pub min_normal_len: u64,
    pub normal_window: u64,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        SegmenterParams {
            treat_as_contiguous: true,
            close_trailing_run: false,
            flush_policy: FlushPolicy::Eligible,
            min_normal_len: 1000,
            normal_window: 1000,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TdtMarks {
    pub saw_tuf: bool,
    pub saw_deletion: bool,
}

/// Runs waiting for a boundary that decides whether they form TDT candidates.
#[derive(Debug, Default)]
pub struct TdtAccumulator {
    entries: Vec<Run>,
    marks: TdtMarks,
}

impl TdtAccumulator {
    pub fn push_tuf(&mut self, run: &Run) {
        self.marks.saw_tuf = true;
        self.entries.push(run.clone());
    }

    /// Deletions only join once a TUF run opened the accumulator.
    pub fn push_deletion(&mut self, run: &Run) -> bool {
        if !self.marks.saw_tuf {
            return false;
        }
        self.marks.saw_deletion = true;
        self.entries.push(run.clone());
        true
    }

    pub fn marks(&self) -> TdtMarks {
        self.marks
    }

    pub fn entries(&self) -> &[Run] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn has_tdt_pattern(&self) -> bool {
        self.entries.windows(3).any(|w| {
            w[0].state == State::Tuf && w[1].state == State::Deletion && w[2].state == State::Tuf
        })
    }

    fn should_flush(&self, boundary: State, policy: FlushPolicy) -> bool {
        match policy {
            FlushPolicy::TufDelTuf => self.has_tdt_pattern(),
            FlushPolicy::Eligible => match boundary {
                State::NormalI => self.marks.saw_tuf && self.marks.saw_deletion,
                _ => !self.is_empty(),
            },
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.marks = TdtMarks::default();
    }
}

/// Walks a decoded path once, merging consecutive windows into runs.
pub struct RunSegmenter<'a, H: RunHandler, S: NormalSampler> {
    params: &'a SegmenterParams,
    handler: &'a mut H,
    sampler: &'a mut S,
    current: Option<Run>,
    tdt: TdtAccumulator,
    num_runs: usize,
}

impl<'a, H: RunHandler, S: NormalSampler> RunSegmenter<'a, H, S> {
    pub fn new(params: &'a SegmenterParams, handler: &'a mut H, sampler: &'a mut S) -> Self {
        RunSegmenter {
            params,
            handler,
            sampler,
            current: None,
            tdt: TdtAccumulator::default(),
            num_runs: 0,
        }
    }

    pub fn push(&mut self, record: &StateRecord) -> Result<()> {
        self.handler.record(record)?;
        let state = record.state.canonical();

        let continues = match &self.current {
            Some(run) => {
                run.state == state
                    && run.chrom == record.chrom
                    && (self.params.treat_as_contiguous || record.start() == run.end + 1)
            }
            None => false,
        };

        if continues {
            if let Some(run) = self.current.as_mut() {
                run.end = record.end();
            }
            return Ok(());
        }

        if let Some(run) = self.current.take() {
            self.close(run)?;
        }
        self.current = Some(Run::open(record, state));
        Ok(())
    }

    /// Ends the pass and returns the number of closed runs.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(run) = self.current.take() {
            if self.params.close_trailing_run {
                self.close(run)?;
            } else {
                log::debug!(
                    "Dropping trailing {} run {}:{}-{}",
                    run.state,
                    run.chrom,
                    run.start,
                    run.end
                );
            }
        }
        if !self.tdt.is_empty() {
            log::debug!("{} pending TDT runs left unflushed", self.tdt.entries().len());
        }
        Ok(self.num_runs)
    }

    fn close(&mut self, run: Run) -> Result<()> {
        log::trace!("{}\t{}\t{}\t{}", run.chrom, run.start, run.end, run.state);
        self.num_runs += 1;
        match run.state {
            State::Tuf => {
                self.tdt.push_tuf(&run);
                self.handler.run(&run)?;
            }
            State::Deletion => {
                self.handler.run(&run)?;
                self.tdt.push_deletion(&run);
            }
            State::NormalI => {
                self.release_tdt(run.state)?;
                self.handler.run(&run)?;
                self.sample_normal(&run)?;
            }
            State::Duplication | State::Gap => {
                self.release_tdt(run.state)?;
                self.handler.run(&run)?;
            }
            State::TufDup | State::NormalII => {
                return Err(format!(
                    "Run {}:{}-{} has non-canonical state {}",
                    run.chrom, run.start, run.end, run.state
                ))
            }
        }
        Ok(())
    }

    fn release_tdt(&mut self, boundary: State) -> Result<()> {
        if self.tdt.should_flush(boundary, self.params.flush_policy) {
            log::debug!(
                "Processing {} TDT candidate runs at {} boundary",
                self.tdt.entries().len(),
                boundary
            );
            self.handler.flush_tdt(self.tdt.entries())?;
        }
        self.tdt.clear();
        Ok(())
    }

    fn sample_normal(&mut self, run: &Run) -> Result<()> {
        if run.len() <= self.params.min_normal_len || run.len() < self.params.normal_window {
            return Ok(());
        }
        const ACCEPTED_ROLLS: [u32; 5] = [1, 3, 5, 7, 9];
        let roll = self.sampler.roll();
        log::trace!("Normal run {}:{}-{} rolled {}", run.chrom, run.start, run.end, roll);
        if !ACCEPTED_ROLLS.contains(&roll) {
            return Ok(());
        }
        let start = self
            .sampler
            .window_start(run.start, run.end - self.params.normal_window);
        self.handler
            .sample_normal(&run.chrom, start, start + self.params.normal_window)
    }
}

/// Segments a whole record stream; the first format error aborts the pass.
pub fn segment_records<I, H, S>(
    records: I,
    params: &SegmenterParams,
    handler: &mut H,
    sampler: &mut S,
) -> Result<usize>
where
    I: IntoIterator<Item = Result<StateRecord>>,
    H: RunHandler,
    S: NormalSampler,
{
    let mut segmenter = RunSegmenter::new(params, handler, sampler);
    for record in records {
        segmenter.push(&record?)?;
    }
    segmenter.finish()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::FixedSampler;

    #[derive(Default)]
    pub(crate) struct RecordingHandler {
        pub records: usize,
        pub runs: Vec<Run>,
        pub flushes: Vec<Vec<Run>>,
        pub samples: Vec<(String, u64, u64)>,
    }

    impl RunHandler for RecordingHandler {
        fn record(&mut self, _record: &StateRecord) -> Result<()> {
            self.records += 1;
            Ok(())
        }
        fn run(&mut self, run: &Run) -> Result<()> {
            self.runs.push(run.clone());
            Ok(())
        }
        fn flush_tdt(&mut self, entries: &[Run]) -> Result<()> {
            self.flushes.push(entries.to_vec());
            Ok(())
        }
        fn sample_normal(&mut self, chrom: &str, start: u64, end: u64) -> Result<()> {
            self.samples.push((chrom.to_string(), start, end));
            Ok(())
        }
    }

    pub(crate) fn records(chrom: &str, states: &[State], width: u64) -> Vec<StateRecord> {
        states
            .iter()
            .enumerate()
            .map(|(i, &state)| StateRecord {
                chrom: chrom.to_string(),
                index: i,
                range: ((i as u64 * width) as f64, ((i as u64 + 1) * width) as f64),
                observation: (20.0, 20.0),
                state,
            })
            .collect()
    }

    fn segment(
        records: Vec<StateRecord>,
        params: &SegmenterParams,
        sampler: &mut FixedSampler,
    ) -> (RecordingHandler, usize) {
        let mut handler = RecordingHandler::default();
        let n = segment_records(records.into_iter().map(Ok), params, &mut handler, sampler)
            .unwrap();
        (handler, n)
    }

    use State::{Deletion as D, Duplication as Dup, Gap as G, NormalI as N, Tuf as T};

    #[test]
    fn merges_identical_states_and_drops_trailing_run() {
        let recs = records("chr1", &[T, State::TufDup, D, N, State::NormalII, G], 100);
        let (handler, n) = segment(recs, &SegmenterParams::default(), &mut FixedSampler::never());
        assert_eq!(handler.records, 6);
        assert_eq!(n, 3);
        let spans: Vec<_> = handler.runs.iter().map(|r| (r.state, r.start, r.end)).collect();
        assert_eq!(spans, vec![(T, 0, 200), (D, 200, 300), (N, 300, 500)]);
    }

    #[test]
    fn trailing_run_is_closed_on_request() {
        let params = SegmenterParams {
            close_trailing_run: true,
            ..Default::default()
        };
        let recs = records("chr1", &[T, D, T, Dup], 100);
        let (handler, n) = segment(recs, &params, &mut FixedSampler::never());
        assert_eq!(n, 4);
        assert_eq!(handler.runs.last().unwrap().state, Dup);
        // Duplication boundary releases the pending TUF, Deletion, TUF runs
        assert_eq!(handler.flushes.len(), 1);
        assert_eq!(handler.flushes[0].len(), 3);
    }

    #[test]
    fn chromosome_change_closes_run_with_same_state() {
        let mut recs = records("chr1", &[T, T], 100);
        recs.extend(records("chr2", &[T, N], 100));
        let (handler, _) = segment(recs, &SegmenterParams::default(), &mut FixedSampler::never());
        let chroms: Vec<_> = handler.runs.iter().map(|r| r.chrom.as_str()).collect();
        assert_eq!(chroms, vec!["chr1", "chr2"]);
        assert_eq!(handler.runs[0].end, 200);
    }

    #[test]
    fn strict_contiguity_splits_on_position_gaps() {
        let mut recs = records("chr1", &[T, T, T, N], 100);
        // abutting windows follow the end + 1 convention
        recs[1].range = (101.0, 200.0);
        recs[2].range = (500.0, 600.0);
        let params = SegmenterParams {
            treat_as_contiguous: false,
            ..Default::default()
        };
        let (handler, _) = segment(recs, &params, &mut FixedSampler::never());
        let spans: Vec<_> = handler.runs.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(spans, vec![(0, 200), (500, 600)]);
    }

    #[test]
    fn normal_after_tuf_and_deletion_flushes() {
        let recs = records("chr1", &[T, D, D, N, T], 100);
        let (handler, _) = segment(recs, &SegmenterParams::default(), &mut FixedSampler::never());
        assert_eq!(handler.flushes.len(), 1);
        let flushed: Vec<_> = handler.flushes[0].iter().map(|r| r.state).collect();
        assert_eq!(flushed, vec![T, D]);
    }

    #[test]
    fn normal_without_deletion_clears_silently() {
        let recs = records("chr1", &[T, T, N, D, N, T], 100);
        let (handler, _) = segment(recs, &SegmenterParams::default(), &mut FixedSampler::never());
        assert!(handler.flushes.is_empty());
    }

    #[test]
    fn deletion_alone_never_joins_the_accumulator() {
        let recs = records("chr1", &[D, T, G, N], 100);
        let (handler, _) = segment(recs, &SegmenterParams::default(), &mut FixedSampler::never());
        assert_eq!(handler.flushes.len(), 1);
        assert_eq!(handler.flushes[0].len(), 1);
        assert_eq!(handler.flushes[0][0].state, T);
    }

    #[test]
    fn legacy_pattern_policy_requires_tuf_del_tuf() {
        let params = SegmenterParams {
            flush_policy: FlushPolicy::TufDelTuf,
            ..Default::default()
        };
        let recs = records("chr1", &[T, D, N, T, D, T, Dup, T], 100);
        let (handler, _) = segment(recs, &params, &mut FixedSampler::never());
        assert_eq!(handler.flushes.len(), 1);
        let flushed: Vec<_> = handler.flushes[0].iter().map(|r| r.state).collect();
        assert_eq!(flushed, vec![T, D, T]);
    }

    #[test]
    fn long_normal_run_is_sampled_on_accepted_roll() {
        // 15 windows of 100 bases = 1500 bases of Normal-I
        let mut states = vec![N; 15];
        states.push(T);
        let recs = records("chr1", &states, 100);
        let mut sampler = FixedSampler::new(vec![3], vec![250]);
        let (handler, _) = segment(recs, &SegmenterParams::default(), &mut sampler);
        assert_eq!(handler.samples, vec![("chr1".to_string(), 250, 1250)]);
        assert_eq!(sampler.window_bounds(), vec![(0, 500)]);
    }

    #[test]
    fn long_normal_run_is_skipped_on_rejected_roll() {
        let mut states = vec![N; 15];
        states.push(T);
        let recs = records("chr1", &states, 100);
        let (handler, _) = segment(recs, &SegmenterParams::default(), &mut FixedSampler::new(vec![4], vec![]));
        assert!(handler.samples.is_empty());
    }

    #[test]
    fn short_normal_run_never_rolls() {
        let mut states = vec![N; 10];
        states.push(T);
        let recs = records("chr1", &states, 100);
        let mut sampler = FixedSampler::new(vec![1], vec![0]);
        let (handler, _) = segment(recs, &SegmenterParams::default(), &mut sampler);
        assert!(handler.samples.is_empty());
        assert_eq!(sampler.rolls_taken(), 0);
    }

    #[test]
    fn runs_partition_the_input() {
        let states = [T, T, D, N, N, Dup, G, G, T, D, T, N, State::TufDup];
        let recs = records("chr1", &states, 10);
        let params = SegmenterParams {
            close_trailing_run: true,
            ..Default::default()
        };
        let (handler, _) = segment(recs, &params, &mut FixedSampler::never());
        let mut rebuilt = Vec::new();
        for run in &handler.runs {
            for _ in 0..run.len() / 10 {
                rebuilt.push(run.state);
            }
        }
        let canonical: Vec<_> = states.iter().map(|s| s.canonical()).collect();
        assert_eq!(rebuilt, canonical);
        for pair in handler.runs.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn format_error_aborts_the_pass() {
        let mut handler = RecordingHandler::default();
        let recs = records("chr1", &[T, N], 10);
        let input = vec![Ok(recs[0].clone()), Err("bad line".to_string()), Ok(recs[1].clone())];
        let result = segment_records(
            input,
            &SegmenterParams::default(),
            &mut handler,
            &mut FixedSampler::never(),
        );
        assert_eq!(result, Err("bad line".to_string()));
        assert_eq!(handler.records, 1);
    }
}
