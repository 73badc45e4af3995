use super::Result;
use flate2::read::MultiGzDecoder;
use rust_htslib::faidx;
use std::fs::File;
use std::io::{BufReader, Read as ioRead};
use std::path::Path;

fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip")
}

/// Opens a decoded path or bedgraph file, transparently decompressing `.gz` input.
pub fn open_path_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    if !is_gzipped(path) {
        return Ok(BufReader::new(Box::new(file)));
    }
    let gz_decoder = MultiGzDecoder::new(file);
    if gz_decoder.header().is_some() {
        Ok(BufReader::new(Box::new(gz_decoder)))
    } else {
        Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
    }
}

pub fn open_genome_reader(path: &Path) -> Result<faidx::Reader> {
    let mut fai_path = path.as_os_str().to_owned();
    fai_path.push(".fai");
    let fai_path = Path::new(&fai_path);
    if !fai_path.exists() {
        return Err(format!(
            "Reference index file not found: {}. Create it using 'samtools faidx {}'",
            fai_path.display(),
            path.display()
        ));
    }
    faidx::Reader::from_path(path)
        .map_err(|e| format!("Failed to open reference {}: {}", path.display(), e))
}
