use crate::utils::Result;

/// Integer-truncated GC percentage of a non-empty sequence, case-insensitive.
fn gc_content(seq: &[u8]) -> u64 {
    let count = seq
        .iter()
        .filter(|b| matches!(b, b'G' | b'g' | b'C' | b'c'))
        .count();
    (count as f64 / seq.len() as f64 * 100.0) as u64
}

/// GC summary encoded as `avg_min_max`.
///
/// Min and max are taken over consecutive `chunk_size` slices and reported as `NA`
/// when the sequence fits in a single chunk.
pub fn gc_percent(seq: &[u8], chunk_size: usize) -> Result<String> {
    if seq.is_empty() {
        return Err("Cannot compute GC content of an empty sequence".to_string());
    }
    if chunk_size == 0 {
        return Err("GC chunk size must be at least 1".to_string());
    }
    let average = gc_content(seq);
    if seq.len() <= chunk_size {
        return Ok(format!("{}_NA_NA", average));
    }

    let chunks: Vec<u64> = seq.chunks(chunk_size).map(gc_content).collect();
    let min = chunks.iter().min().copied().unwrap_or(average);
    let max = chunks.iter().max().copied().unwrap_or(average);
    Ok(format!("{}_{}_{}", average, min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sequence_has_no_chunk_range() {
        assert_eq!(gc_percent(b"tactgaggtg", 100).unwrap(), "50_NA_NA");
    }

    #[test]
    fn chunk_range_is_reported() {
        assert_eq!(gc_percent(b"tactgaggtg", 2).unwrap(), "50_0_100");
        assert_eq!(gc_percent(&b"tactgaggtg".repeat(11), 100).unwrap(), "50_50_50");
    }

    #[test]
    fn percentages_truncate() {
        assert_eq!(gc_percent(b"GAA", 100).unwrap(), "33_NA_NA");
        let mut seq = vec![b'G'; 29];
        seq.extend(vec![b'A'; 71]);
        // 29 / 100 * 100 falls just below 29 in floating point
        assert_eq!(gc_percent(&seq, 100).unwrap(), "28_NA_NA");
    }

    #[test]
    fn empty_sequence_is_an_error() {
        assert!(gc_percent(b"", 100).is_err());
    }
}
