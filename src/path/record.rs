use super::State;
use crate::utils::Result;
use std::io::BufRead;

/// One decoded window of the Viterbi path.
#[derive(Debug, Clone, PartialEq)]
pub struct StateRecord {
    pub chrom: String,
    pub index: usize,
    /// Window bounds as written upstream; float-valued in older outputs.
    pub range: (f64, f64),
    pub observation: (f64, f64),
    pub state: State,
}

impl StateRecord {
    pub fn start(&self) -> u64 {
        self.range.0 as u64
    }

    pub fn end(&self) -> u64 {
        self.range.1 as u64
    }
}

/// Parses one line of a decoded path file.
///
/// Two shapes are accepted, `chrom:index:(start,end):observation:state` and
/// `_:(start,end):observation:state`. The first field of the short shape is not
/// read; the chromosome comes from `chrom` and the window index from `ordinal`.
/// A single-field line is the path length marker and yields `Ok(None)`.
pub fn parse_record(line: &str, chrom: &str, ordinal: usize) -> Result<Option<StateRecord>> {
    let fields: Vec<&str> = line.trim_end().split(':').collect();
    let (chrom, index, range, observation, state) = match fields[..] {
        [chrom, index, range, observation, state] => {
            let index = index
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("Invalid window index '{}': {}", index, line))?;
            (chrom, index, range, observation, state)
        }
        [_, range, observation, state] => {
            if chrom.is_empty() {
                return Err(format!(
                    "Record without chromosome and no chromosome given (--chrom): {}",
                    line
                ));
            }
            (chrom, ordinal, range, observation, state)
        }
        [_] => return Ok(None),
        _ => {
            return Err(format!(
                "Expected 4 or 5 ':'-separated fields in decoded path record, found {}: {}",
                fields.len(),
                line
            ))
        }
    };

    let range = parse_pair(range)
        .and_then(check_range)
        .map_err(|e| format!("Invalid window range {}: {}", e, line))?;
    let observation =
        parse_pair(observation).map_err(|e| format!("Invalid observation {}: {}", e, line))?;
    let state = state.trim().parse::<State>()?;

    Ok(Some(StateRecord {
        chrom: chrom.to_string(),
        index,
        range,
        observation,
        state,
    }))
}

/// Parses a `(a, b)` tuple of floats.
fn parse_pair(encoding: &str) -> Result<(f64, f64)> {
    let error_msg = || format!("'{}'", encoding);
    let inner = encoding.trim().trim_start_matches('(').trim_end_matches(')');
    let values: Vec<&str> = inner.split(',').map(str::trim).collect();
    match values[..] {
        [a, b] => {
            let a = a.parse::<f64>().map_err(|_| error_msg())?;
            let b = b.parse::<f64>().map_err(|_| error_msg())?;
            Ok((a, b))
        }
        _ => Err(error_msg()),
    }
}

/// Window bounds must be finite and non-negative to truncate into coordinates.
fn check_range(range: (f64, f64)) -> Result<(f64, f64)> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if valid(range.0) && valid(range.1) {
        Ok(range)
    } else {
        Err(format!("'({}, {})' is not a pair of coordinates", range.0, range.1))
    }
}

/// Streams records out of a decoded path file, skipping marker lines.
///
/// Errors carry the 1-based line number; callers abort the pass on the first one.
/// Records without a window index are numbered by their 0-based line, so the
/// first record after the marker line is window 1.
pub fn read_records<R: BufRead>(
    reader: R,
    chrom: String,
) -> impl Iterator<Item = Result<StateRecord>> {
    reader
        .lines()
        .enumerate()
        .filter_map(move |(line_number, result_line)| {
            result_line
                .map_err(|e| e.to_string())
                .and_then(|line| parse_record(&line, &chrom, line_number))
                .map_err(|e| format!("Error at Viterbi line {}: {}", line_number + 1, e))
                .transpose()
        })
}

/// Rebuilds a record from a `chrom\tstart\tend\tcode` line of `viterbi.bedgraph`.
///
/// The observation is not part of the track and is left at zero.
pub fn parse_bedgraph_record(line: &str, index: usize) -> Result<StateRecord> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    let (chrom, start, end, code) = match fields[..] {
        [chrom, start, end, code] => (chrom, start, end, code),
        _ => {
            return Err(format!(
                "Expected 4 tab-separated fields in bedgraph record, found {}: {}",
                fields.len(),
                line
            ))
        }
    };
    let parse_coord = |value: &str| {
        value
            .parse::<u64>()
            .map_err(|_| format!("Invalid coordinate '{}': {}", value, line))
    };
    let state = code
        .parse::<u8>()
        .ok()
        .and_then(State::from_bedgraph_code)
        .ok_or_else(|| format!("Unknown state code '{}': {}", code, line))?;
    Ok(StateRecord {
        chrom: chrom.to_string(),
        index,
        range: (parse_coord(start)? as f64, parse_coord(end)? as f64),
        observation: (0.0, 0.0),
        state,
    })
}

pub fn read_bedgraph_records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<StateRecord>> {
    reader
        .lines()
        .enumerate()
        .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
        .enumerate()
        .map(|(index, (line_number, result_line))| {
            result_line
                .map_err(|e| e.to_string())
                .and_then(|line| parse_bedgraph_record(&line, index))
                .map_err(|e| format!("Error at bedgraph line {}: {}", line_number + 1, e))
        })
}
