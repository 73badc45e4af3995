use crate::path::State;
use crate::utils::Result;
use chrono::Datelike;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="tufdel",
          version=&**FULL_VERSION,
          long_about = None,
          disable_help_subcommand = true,
          after_help = format!("Copyright (C) 2019-{}
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Segment decoded paths into state runs and TDT candidates")]
    Segment(SegmentArgs),
    #[clap(about = "Detect TUF-Deletion-TUF islands and export their segments")]
    Islands(IslandsArgs),
    #[clap(about = "Decoded path validator")]
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("segment")))]
#[command(arg_required_else_help(true))]
pub struct SegmentArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "viterbi")]
    #[clap(help = "Decoded path files (plain or gzipped)")]
    #[clap(value_name = "VITERBI")]
    #[clap(num_args = 1..)]
    #[arg(value_parser = check_file_exists)]
    pub viterbi_paths: Vec<PathBuf>,

    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genome")]
    #[clap(help = "Path to indexed reference genome FASTA")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub genome_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(help = "Directory receiving the output tracks")]
    #[clap(value_name = "OUTPUT_DIR")]
    #[arg(value_parser = check_dir_creatable)]
    pub output_dir: PathBuf,

    #[clap(short = 'c')]
    #[clap(long = "chrom")]
    #[clap(help = "Chromosome of records without one; repeat once per input file")]
    #[clap(value_name = "CHROM")]
    pub chroms: Vec<String>,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Seed for Normal sub-window sampling (OS entropy when omitted)")]
    pub seed: Option<u64>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-normal-len")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Normal runs longer than this may be sampled")]
    #[clap(default_value = "1000")]
    pub min_normal_len: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "normal-window")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Length of the sampled Normal sub-window")]
    #[clap(default_value = "1000")]
    #[arg(value_parser = positive_u64)]
    pub normal_window: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-tdt-deletion")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Flushed deletions shorter than this are written to tdt.bed")]
    #[clap(default_value = "2000")]
    pub max_tdt_deletion: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "gc-chunk")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Chunk size of the GC min/max summary")]
    #[clap(default_value = "100")]
    #[arg(value_parser = positive_usize)]
    pub gc_chunk: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "strict-contiguity")]
    #[clap(help = "Only extend runs over windows starting at end + 1")]
    pub strict_contiguity: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "close-trailing-run")]
    #[clap(help = "Close the run still open at the end of each path")]
    pub close_trailing_run: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "strict-tdt-pattern")]
    #[clap(help = "Flush candidates only after a TUF, Deletion, TUF sequence")]
    pub strict_tdt_pattern: bool,

    #[clap(help_heading("Repeats"))]
    #[clap(long = "spade")]
    #[clap(value_name = "SPADE_DIR")]
    #[clap(help = "Directory containing SPADE.py; enables repeat analysis")]
    #[arg(value_parser = check_dir_exists)]
    pub spade_dir: Option<PathBuf>,

    #[clap(help_heading("Repeats"))]
    #[clap(long = "keep-spade-output")]
    #[clap(help = "Keep SPADE working directories")]
    pub keep_spade_output: bool,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("islands")))]
#[command(arg_required_else_help(true))]
pub struct IslandsArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "viterbi")]
    #[clap(help = "Decoded path files (plain or gzipped)")]
    #[clap(value_name = "VITERBI")]
    #[clap(num_args = 1..)]
    #[arg(value_parser = check_file_exists)]
    pub viterbi_paths: Vec<PathBuf>,

    #[clap(short = 'c')]
    #[clap(long = "chrom")]
    #[clap(help = "Chromosome of records without one; repeat once per input file")]
    #[clap(value_name = "CHROM")]
    pub chroms: Vec<String>,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output CSV file")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: PathBuf,

    #[clap(long = "carrier")]
    #[clap(value_name = "STATE")]
    #[clap(help = "State flanking an island")]
    #[clap(default_value = "TUF")]
    pub carrier: State,

    #[clap(long = "interruption")]
    #[clap(value_name = "STATE")]
    #[clap(help = "State interrupting the carrier")]
    #[clap(default_value = "Deletion")]
    pub interruption: State,

    #[clap(long = "min-subsequence")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Minimum length of the interruption")]
    #[clap(default_value = "1")]
    #[arg(value_parser = positive_usize)]
    pub min_subsequence: usize,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("validate")))]
#[command(arg_required_else_help(true))]
pub struct ValidateArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "viterbi")]
    #[clap(help = "Decoded path file or viterbi.bedgraph track")]
    #[clap(value_name = "VITERBI")]
    #[arg(value_parser = check_file_exists)]
    pub viterbi_path: PathBuf,

    #[clap(short = 'c')]
    #[clap(long = "chrom")]
    #[clap(help = "Chromosome of records without one")]
    #[clap(value_name = "CHROM")]
    pub chrom: Option<String>,

    #[clap(long = "bedgraph")]
    #[clap(help = "Input is a viterbi.bedgraph track")]
    pub bedgraph: bool,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(path.to_path_buf())
}

fn check_dir_creatable(s: &str) -> Result<PathBuf> {
    let path = check_prefix_path(s)?;
    if path.exists() && !path.is_dir() {
        return Err(format!("Not a directory: {}", path.display()));
    }
    Ok(path)
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn positive_usize(s: &str) -> Result<usize> {
    match s.parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(format!("`{}` is not a positive integer", s)),
    }
}

fn positive_u64(s: &str) -> Result<u64> {
    positive_usize(s).map(|value| value as u64)
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}
