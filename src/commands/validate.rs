use crate::analysis::NormalSampler;
use crate::cli::ValidateArgs;
use crate::path::{
    read_bedgraph_records, read_records, segment_records, Run, RunHandler, SegmenterParams, State,
    StateRecord,
};
use crate::utils::{open_path_reader, Result};
use std::collections::HashMap;

pub fn validate(args: ValidateArgs) -> Result<()> {
    let reader = open_path_reader(&args.viterbi_path)?;
    let records: Box<dyn Iterator<Item = Result<StateRecord>>> = if args.bedgraph {
        Box::new(read_bedgraph_records(reader))
    } else {
        Box::new(read_records(reader, args.chrom.unwrap_or_default()))
    };
    let report = validate_records(records)?;

    for state in State::ALL {
        let windows = report.windows.get(&state).copied().unwrap_or(0);
        let runs = report.runs.get(&state.canonical()).map_or(0, Vec::len);
        if windows == 0 && !state.is_canonical() {
            continue;
        }
        if state.is_canonical() {
            log::info!("{}: {} windows, {} runs", state, windows, runs);
        } else {
            log::info!("{}: {} windows", state, windows);
        }
    }

    for state in State::ALL.into_iter().filter(|s| s.is_canonical()) {
        let Some(lengths) = report.runs.get(&state) else {
            continue;
        };
        let stats = calculate_stats(lengths);
        log::info!(
            "{} run lengths - Range: [{},{}], Median: {:.2}, Mean: {:.2}, StdDev: {:.2}",
            state,
            stats.min,
            stats.max,
            stats.median,
            stats.mean,
            stats.std_dev
        );
    }
    log::info!("TDT candidate groups: {}", report.num_flushes);

    let total = report.num_records + report.num_errors;
    match report.num_errors {
        0 => log::info!("Validation successful. Windows pass={}", report.num_records),
        _ => log::info!(
            "Validation failed. Windows pass={} ({:.2}%), fail={} ({:.2}%)",
            report.num_records,
            report.num_records as f64 / total as f64 * 100.0,
            report.num_errors,
            report.num_errors as f64 / total as f64 * 100.0
        ),
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub num_records: usize,
    pub num_errors: usize,
    /// Windows per raw state label.
    pub windows: HashMap<State, usize>,
    /// Lengths of closed runs per canonical state, trailing run included.
    pub runs: HashMap<State, Vec<u64>>,
    pub num_flushes: usize,
}

impl RunHandler for ValidationReport {
    fn record(&mut self, record: &StateRecord) -> Result<()> {
        self.num_records += 1;
        *self.windows.entry(record.state).or_insert(0) += 1;
        Ok(())
    }

    fn run(&mut self, run: &Run) -> Result<()> {
        self.runs.entry(run.state).or_default().push(run.len());
        Ok(())
    }

    fn flush_tdt(&mut self, _entries: &[Run]) -> Result<()> {
        self.num_flushes += 1;
        Ok(())
    }

    fn sample_normal(&mut self, _chrom: &str, _start: u64, _end: u64) -> Result<()> {
        Ok(())
    }
}

/// Sampling plays no part in validation.
struct NoSampling;

impl NormalSampler for NoSampling {
    fn roll(&mut self) -> u32 {
        10
    }

    fn window_start(&mut self, low: u64, _high: u64) -> u64 {
        low
    }
}

/// Counts windows and runs; malformed lines are logged and skipped.
pub fn validate_records<I>(records: I) -> Result<ValidationReport>
where
    I: IntoIterator<Item = Result<StateRecord>>,
{
    let mut report = ValidationReport::default();
    let mut num_errors = 0;
    let params = SegmenterParams {
        close_trailing_run: true,
        ..Default::default()
    };
    let records = records.into_iter().filter_map(|result| match result {
        Ok(record) => Some(Ok(record)),
        Err(e) => {
            log::error!("{}", e);
            num_errors += 1;
            None
        }
    });
    segment_records(records, &params, &mut report, &mut NoSampling)?;
    report.num_errors = num_errors;
    Ok(report)
}

fn calculate_stats(data: &[u64]) -> Stats {
    let mut sorted = data.to_vec();
    sorted.sort_unstable();
    let len = sorted.len();
    if len == 0 {
        return Stats::default();
    }
    let median = if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) as f64 / 2.0
    } else {
        sorted[len / 2] as f64
    };
    let sum: u64 = sorted.iter().sum();
    let mean = sum as f64 / len as f64;
    let std_dev = (sorted
        .iter()
        .map(|&x| (x as f64 - mean).powi(2))
        .sum::<f64>()
        / len as f64)
        .sqrt();
    Stats {
        min: sorted[0],
        max: sorted[len - 1],
        mean,
        median,
        std_dev,
    }
}

#[derive(Debug, Default)]
struct Stats {
    min: u64,
    max: u64,
    mean: f64,
    median: f64,
    std_dev: f64,
}
