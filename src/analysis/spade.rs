use super::{gc_percent, RepeatAnalyzer, RepeatCall, RepeatMotif, RepeatRegion};
use crate::utils::Result;
use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process::Command,
};

const BASES: [char; 4] = ['A', 'C', 'G', 'T'];
/// Weblogo files with this many lines or fewer carry too few observations.
const MIN_WEBLOGO_LINES: usize = 12;

/// Runs SPADE on candidate regions and summarises its `nucl_*/weblogo.txt` output.
#[derive(Debug, Clone)]
pub struct SpadeRunner {
    python: String,
    script: PathBuf,
    work_dir: PathBuf,
    gc_chunk: usize,
    keep_output: bool,
}

impl SpadeRunner {
    pub fn new(spade_dir: &Path, work_dir: &Path, gc_chunk: usize, keep_output: bool) -> Result<Self> {
        let script = spade_dir.join("SPADE.py");
        if !script.exists() {
            return Err(format!("SPADE script not found: {}", script.display()));
        }
        fs::create_dir_all(work_dir)
            .map_err(|e| format!("Failed to create {}: {}", work_dir.display(), e))?;
        Ok(SpadeRunner {
            python: "python3".to_string(),
            script,
            work_dir: work_dir.to_path_buf(),
            gc_chunk,
            keep_output,
        })
    }

    fn run_spade(&self, fasta_path: &Path, out_dir: &Path) -> Result<()> {
        log::debug!("Running SPADE on {}", fasta_path.display());
        let status = Command::new(&self.python)
            .arg(&self.script)
            .arg("-in")
            .arg(fasta_path)
            .arg("-out_dir")
            .arg(format!("{}/", out_dir.display()))
            .status()
            .map_err(|e| format!("Failed to launch SPADE: {}", e))?;
        if !status.success() {
            return Err(format!(
                "SPADE failed on {} with {}",
                fasta_path.display(),
                status
            ));
        }
        Ok(())
    }
}

impl RepeatAnalyzer for SpadeRunner {
    fn analyze(&self, region: &RepeatRegion, seq: &[u8]) -> Result<Vec<RepeatCall>> {
        let folder = format!(
            "{}_{}-{}_{}_{}",
            region.chrom,
            region.start,
            region.end,
            region.kind,
            gc_percent(seq, self.gc_chunk)?
        );
        let out_dir = self.work_dir.join(&folder);
        fs::create_dir_all(&out_dir)
            .map_err(|e| format!("Failed to create {}: {}", out_dir.display(), e))?;

        let fasta_path = self.work_dir.join(format!("{}.fasta", folder));
        let mut fasta = format!(">{}\n", folder).into_bytes();
        fasta.extend_from_slice(seq);
        fasta.push(b'\n');
        fs::write(&fasta_path, fasta)
            .map_err(|e| format!("Failed to write {}: {}", fasta_path.display(), e))?;

        self.run_spade(&fasta_path, &out_dir)?;
        let calls = collect_calls(&out_dir)?;

        if !self.keep_output {
            fs::remove_file(&fasta_path).map_err(|e| e.to_string())?;
            fs::remove_dir_all(&out_dir).map_err(|e| e.to_string())?;
        }
        Ok(calls)
    }
}

fn collect_calls(out_dir: &Path) -> Result<Vec<RepeatCall>> {
    let mut nucl_dirs = Vec::new();
    for entry in fs::read_dir(out_dir).map_err(|e| format!("{}: {}", out_dir.display(), e))? {
        let entry = entry.map_err(|e| e.to_string())?;
        if entry.file_name().to_string_lossy().starts_with("nucl_") {
            nucl_dirs.push(entry.path());
        }
    }
    nucl_dirs.sort();

    if nucl_dirs.is_empty() {
        return Ok(vec![RepeatCall::NoRepeats]);
    }

    let mut calls = Vec::new();
    for dir in nucl_dirs {
        let weblogo_path = dir.join("weblogo.txt");
        if !weblogo_path.exists() {
            continue;
        }
        let weblogo = read_weblogo(&weblogo_path)?;
        if weblogo.line_count <= MIN_WEBLOGO_LINES {
            calls.push(RepeatCall::NoRepeats);
        } else if weblogo.consensus.is_empty() {
            calls.push(RepeatCall::Repeat(None));
        } else {
            let (align_count, align_unit_seq) = read_unit_fasta(&dir.join("align.unit_seq.fasta"))?;
            let (unit_count, unit_seq) = read_unit_fasta(&dir.join("unit_seq.fasta"))?;
            calls.push(RepeatCall::Repeat(Some(RepeatMotif {
                consensus: weblogo.consensus,
                unit_count: align_count.max(unit_count),
                align_unit_seq,
                unit_seq,
            })));
        }
    }
    Ok(calls)
}

#[derive(Debug, PartialEq)]
pub struct Weblogo {
    pub line_count: usize,
    pub consensus: String,
}

/// Builds the consensus from the most frequent base of every profile row.
pub fn read_weblogo(path: &Path) -> Result<Weblogo> {
    let file = fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    parse_weblogo(BufReader::new(file)).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn parse_weblogo<R: BufRead>(reader: R) -> Result<Weblogo> {
    let mut line_count = 0;
    let mut consensus = String::new();
    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        line_count += 1;
        if line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= 5 {
            continue;
        }
        let counts = fields[1..5]
            .iter()
            .map(|c| {
                c.trim()
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid base count '{}' in line {}", c, line_count))
            })
            .collect::<Result<Vec<_>>>()?;
        // first maximum wins on ties
        let (base_index, _) = counts
            .iter()
            .enumerate()
            .fold((0, i64::MIN), |best, (i, &c)| if c > best.1 { (i, c) } else { best });
        let base = BASES.get(base_index).ok_or_else(|| {
            format!("Invalid index for nucleotide. Index {} not in [0,3]", base_index)
        })?;
        consensus.push(*base);
    }
    Ok(Weblogo {
        line_count,
        consensus,
    })
}

/// Returns the number of records and the concatenated, gap-free sequence.
fn read_unit_fasta(path: &Path) -> Result<(usize, String)> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut count = 0;
    let mut seq = String::new();
    for line in content.lines() {
        if line.starts_with('>') {
            count += 1;
        } else {
            seq.extend(line.chars().filter(|&c| c != '-'));
        }
    }
    Ok((count, seq))
}
