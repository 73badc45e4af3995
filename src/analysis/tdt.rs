use super::{gc_percent, gquad, RepeatAnalyzer, RepeatCall, RepeatRegion, SequenceSource};
use crate::path::{Run, RunHandler, State, StateRecord};
use crate::utils::Result;
use crate::writers::{Track, TrackBuffers};

#[derive(Debug, Clone)]
pub struct TdtParams {
    /// Deletions shorter than this are reported in `tdt.bed`.
    pub max_tdt_deletion: u64,
    pub gc_chunk: usize,
}

impl Default for TdtParams {
    fn default() -> Self {
        TdtParams {
            max_tdt_deletion: 2000,
            gc_chunk: 100,
        }
    }
}

/// Writes segmentation results to track buffers and analyses released TDT candidates.
pub struct TdtProcessor<'a, F: SequenceSource, A: RepeatAnalyzer> {
    params: &'a TdtParams,
    source: &'a F,
    analyzer: A,
    tracks: TrackBuffers,
    num_candidates: usize,
}

impl<'a, F: SequenceSource, A: RepeatAnalyzer> TdtProcessor<'a, F, A> {
    pub fn new(params: &'a TdtParams, source: &'a F, analyzer: A) -> Self {
        TdtProcessor {
            params,
            source,
            analyzer,
            tracks: TrackBuffers::default(),
            num_candidates: 0,
        }
    }

    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    pub fn into_tracks(self) -> TrackBuffers {
        self.tracks
    }

    fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let seq = self.source.fetch(chrom, start, end)?;
        if seq.is_empty() {
            return Err(format!("Empty reference sequence for {}:{}-{}", chrom, start, end));
        }
        Ok(seq)
    }

    /// Summary line of the candidate side channel, e.g.
    /// `chr1:100-200_TUF_45_NA_NA\tFalse[]`.
    fn write_candidate(&mut self, region: &RepeatRegion, seq: &[u8], gquad: &gquad::GQuadResult) -> Result<()> {
        let key = format!(
            "{}_{}_{}",
            region,
            region.kind,
            gc_percent(seq, self.params.gc_chunk)?
        );
        self.tracks.row(Track::Candidates, &[&key, gquad]);
        Ok(())
    }

    fn analyze_repeats(&mut self, region: &RepeatRegion, seq: &[u8]) -> Result<()> {
        if !self.analyzer.is_enabled() {
            return Ok(());
        }
        let calls = self
            .analyzer
            .analyze(region, seq)
            .map_err(|e| format!("Repeat analysis of {} failed: {}", region, e))?;
        let (chrom, start, end) = (region.chrom.as_str(), region.start, region.end);
        for call in calls {
            match call {
                RepeatCall::NoRepeats => self.tracks.row(
                    Track::Nucleotides,
                    &[&chrom, &start, &end, &"NO_REPEATS", &region.kind],
                ),
                RepeatCall::Repeat(motif) => {
                    self.tracks.bed(Track::Repeats, chrom, start, end);
                    if let Some(motif) = motif {
                        self.tracks.row(
                            Track::Nucleotides,
                            &[&chrom, &start, &end, &motif.consensus, &region.kind],
                        );
                        self.tracks.row(
                            Track::RepeatsInfo,
                            &[
                                &chrom,
                                &start,
                                &end,
                                &motif.unit_count,
                                &motif.align_unit_seq,
                                &motif.unit_seq,
                            ],
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

impl<F: SequenceSource, A: RepeatAnalyzer> RunHandler for TdtProcessor<'_, F, A> {
    fn record(&mut self, record: &StateRecord) -> Result<()> {
        self.tracks.row(
            Track::Bedgraph,
            &[
                &record.chrom,
                &record.start(),
                &record.end(),
                &record.state.bedgraph_code(),
            ],
        );
        Ok(())
    }

    fn run(&mut self, run: &Run) -> Result<()> {
        self.tracks
            .bed(Track::for_state(run.state), &run.chrom, run.start, run.end);
        Ok(())
    }

    fn flush_tdt(&mut self, entries: &[Run]) -> Result<()> {
        for entry in entries {
            if !matches!(entry.state, State::Tuf | State::Deletion) {
                return Err(format!(
                    "Malformed TDT candidate list: {} run at {}:{}-{}",
                    entry.state, entry.chrom, entry.start, entry.end
                ));
            }
            let region = RepeatRegion {
                chrom: entry.chrom.clone(),
                start: entry.start,
                end: entry.end,
                kind: entry.state.name().to_string(),
            };
            let seq = self.fetch(&entry.chrom, entry.start, entry.end)?;
            self.analyze_repeats(&region, &seq)?;

            if entry.state == State::Deletion && (seq.len() as u64) < self.params.max_tdt_deletion {
                self.tracks.bed(Track::Tdt, &entry.chrom, entry.start, entry.end);
            }

            let gquad = gquad::check(&seq);
            if gquad.found {
                self.tracks.bed(Track::Quad, &entry.chrom, entry.start, entry.end);
            }
            self.write_candidate(&region, &seq, &gquad)?;
            self.num_candidates += 1;
        }
        Ok(())
    }

    fn sample_normal(&mut self, chrom: &str, start: u64, end: u64) -> Result<()> {
        log::debug!("Processing random Normal window {}:{}-{}", chrom, start, end);
        let region = RepeatRegion {
            chrom: chrom.to_string(),
            start,
            end,
            kind: "Normal".to_string(),
        };
        let seq = self.fetch(chrom, start, end)?;
        let gquad = gquad::check(&seq);
        self.write_candidate(&region, &seq, &gquad)?;
        self.analyze_repeats(&region, &seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FixedSampler, NoRepeatAnalysis, RepeatMotif};
    use crate::path::{segment_records, SegmenterParams};
    use crate::path::run_tests::{records, RecordingHandler};
    use crate::path::read_bedgraph_records;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use State::{Deletion as D, NormalI as N, Tuf as T};

    fn genome(len: usize) -> HashMap<String, Vec<u8>> {
        let mut genome = HashMap::new();
        genome.insert("chr1".to_string(), b"ACGT".repeat(len / 4));
        genome
    }

    fn run_pass<A: RepeatAnalyzer>(states: &[State], analyzer: A, sampler: &mut FixedSampler) -> TrackBuffers {
        let source = genome(4000);
        let params = TdtParams::default();
        let mut processor = TdtProcessor::new(&params, &source, analyzer);
        let recs = records("chr1", states, 100);
        segment_records(
            recs.into_iter().map(Ok),
            &SegmenterParams::default(),
            &mut processor,
            sampler,
        )
        .unwrap();
        processor.into_tracks()
    }

    #[test]
    fn tuf_deletion_tuf_reaches_every_track() {
        let tracks = run_pass(&[T, D, T, N, T], NoRepeatAnalysis, &mut FixedSampler::never());
        assert_eq!(tracks.num_rows(Track::Bedgraph), 5);
        assert_eq!(tracks.get(Track::Tuf), "chr1\t0\t100\nchr1\t200\t300\n");
        assert_eq!(tracks.get(Track::Deletion), "chr1\t100\t200\n");
        assert_eq!(tracks.get(Track::Normal), "chr1\t300\t400\n");
        assert_eq!(tracks.get(Track::Tdt), "chr1\t100\t200\n");
        assert_eq!(
            tracks.get(Track::Candidates),
            "chr1:0-100_TUF_50_NA_NA\tFalse[]\n\
             chr1:100-200_Deletion_50_NA_NA\tFalse[]\n\
             chr1:200-300_TUF_50_NA_NA\tFalse[]\n"
        );
        assert_eq!(tracks.num_rows(Track::Quad), 0);
        assert_eq!(tracks.num_rows(Track::Nucleotides), 0);
    }

    #[test]
    fn no_deletion_means_no_tdt_rows() {
        let tracks = run_pass(&[T, T, N, N, T], NoRepeatAnalysis, &mut FixedSampler::never());
        assert_eq!(tracks.num_rows(Track::Tdt), 0);
        assert_eq!(tracks.num_rows(Track::Candidates), 0);
    }

    #[test]
    fn sampled_normal_window_is_summarised() {
        let mut states = vec![N; 15];
        states.push(T);
        let mut sampler = FixedSampler::new(vec![9], vec![100]);
        let tracks = run_pass(&states, NoRepeatAnalysis, &mut sampler);
        assert_eq!(
            tracks.get(Track::Candidates),
            "chr1:100-1100_Normal_50_50_50\tFalse[]\n"
        );
    }

    #[test]
    fn bedgraph_track_resegments_to_the_same_runs() {
        use State::{Duplication as Dup, Gap as G, NormalII, TufDup};
        let states = [T, TufDup, D, T, N, NormalII, Dup, G, G, T, D, D, T, N, T];
        let params = SegmenterParams {
            close_trailing_run: true,
            ..Default::default()
        };
        let source = genome(4000);
        let tdt_params = TdtParams::default();

        let mut processor = TdtProcessor::new(&tdt_params, &source, NoRepeatAnalysis);
        segment_records(
            records("chr1", &states, 100).into_iter().map(Ok),
            &params,
            &mut processor,
            &mut FixedSampler::never(),
        )
        .unwrap();
        let bedgraph = processor.into_tracks().get(Track::Bedgraph).to_string();

        let mut direct = RecordingHandler::default();
        segment_records(
            records("chr1", &states, 100).into_iter().map(Ok),
            &params,
            &mut direct,
            &mut FixedSampler::never(),
        )
        .unwrap();

        let mut reread = RecordingHandler::default();
        segment_records(
            read_bedgraph_records(std::io::Cursor::new(bedgraph)),
            &params,
            &mut reread,
            &mut FixedSampler::never(),
        )
        .unwrap();

        assert_eq!(reread.records, states.len());
        assert_eq!(reread.runs, direct.runs);
        assert_eq!(reread.flushes, direct.flushes);
    }

    struct ScriptedAnalyzer {
        calls: Vec<RepeatCall>,
        seen: RefCell<Vec<String>>,
    }

    impl RepeatAnalyzer for ScriptedAnalyzer {
        fn analyze(&self, region: &RepeatRegion, _seq: &[u8]) -> Result<Vec<RepeatCall>> {
            self.seen.borrow_mut().push(format!("{}_{}", region, region.kind));
            Ok(self.calls.clone())
        }
    }

    #[test]
    fn repeat_calls_are_written_per_candidate() {
        let analyzer = ScriptedAnalyzer {
            calls: vec![
                RepeatCall::Repeat(Some(RepeatMotif {
                    consensus: "ACG".to_string(),
                    unit_count: 3,
                    align_unit_seq: "ACGACG".to_string(),
                    unit_seq: "ACG".to_string(),
                })),
                RepeatCall::NoRepeats,
            ],
            seen: RefCell::new(Vec::new()),
        };
        let tracks = run_pass(&[T, D, N, T], &analyzer, &mut FixedSampler::never());
        assert_eq!(
            *analyzer.seen.borrow(),
            vec!["chr1:0-100_TUF".to_string(), "chr1:100-200_Deletion".to_string()]
        );
        assert_eq!(tracks.get(Track::Repeats), "chr1\t0\t100\nchr1\t100\t200\n");
        assert_eq!(
            tracks.get(Track::Nucleotides),
            "chr1\t0\t100\tACG\tTUF\nchr1\t0\t100\tNO_REPEATS\tTUF\n\
             chr1\t100\t200\tACG\tDeletion\nchr1\t100\t200\tNO_REPEATS\tDeletion\n"
        );
        assert_eq!(tracks.num_rows(Track::RepeatsInfo), 2);
    }

    struct FailingAnalyzer;

    impl RepeatAnalyzer for FailingAnalyzer {
        fn analyze(&self, _region: &RepeatRegion, _seq: &[u8]) -> Result<Vec<RepeatCall>> {
            Err("SPADE exited with status 1".to_string())
        }
    }

    #[test]
    fn collaborator_failure_aborts_the_pass() {
        let source = genome(400);
        let params = TdtParams::default();
        let mut processor = TdtProcessor::new(&params, &source, FailingAnalyzer);
        let recs = records("chr1", &[T, D, N, T], 100);
        let result = segment_records(
            recs.into_iter().map(Ok),
            &SegmenterParams::default(),
            &mut processor,
            &mut FixedSampler::never(),
        );
        assert_eq!(
            result,
            Err("Repeat analysis of chr1:0-100 failed: SPADE exited with status 1".to_string())
        );
    }

    #[test]
    fn fetch_outside_reference_is_an_error() {
        let source = genome(100);
        let params = TdtParams::default();
        let mut processor = TdtProcessor::new(&params, &source, NoRepeatAnalysis);
        let run = Run {
            chrom: "chr1".to_string(),
            state: T,
            start: 200,
            end: 300,
        };
        assert!(processor.flush_tdt(&[run]).is_err());
    }
}
