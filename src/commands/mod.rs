pub mod islands;
pub mod segment;
pub mod validate;

use crate::utils::Result;
use std::path::PathBuf;

/// One decoded path file and the chromosome assigned to its 4-field records.
#[derive(Debug, Clone, PartialEq)]
pub struct PathInput {
    pub path: PathBuf,
    pub chrom: String,
}

impl PathInput {
    pub fn label(&self) -> String {
        if self.chrom.is_empty() {
            self.path.display().to_string()
        } else {
            format!("{} ({})", self.path.display(), self.chrom)
        }
    }
}

/// Pairs input files with `--chrom` values: none, one shared by all files, or one per file.
pub fn pair_inputs(paths: &[PathBuf], chroms: &[String]) -> Result<Vec<PathInput>> {
    let chrom_for = |i: usize| -> Result<String> {
        match chroms.len() {
            0 => Ok(String::new()),
            1 => Ok(chroms[0].clone()),
            n if n == paths.len() => Ok(chroms[i].clone()),
            n => Err(format!(
                "Got {} chromosome names for {} decoded path files",
                n,
                paths.len()
            )),
        }
    };
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            Ok(PathInput {
                path: path.clone(),
                chrom: chrom_for(i)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("path{}.txt", i))).collect()
    }

    #[test]
    fn chromosomes_are_paired_per_file() {
        let inputs = pair_inputs(&paths(2), &["chr1".to_string(), "chr2".to_string()]).unwrap();
        assert_eq!(inputs[1].chrom, "chr2");
        assert_eq!(inputs[1].label(), "path1.txt (chr2)");
    }

    #[test]
    fn single_chromosome_is_shared() {
        let inputs = pair_inputs(&paths(3), &["chrX".to_string()]).unwrap();
        assert!(inputs.iter().all(|input| input.chrom == "chrX"));
        let inputs = pair_inputs(&paths(2), &[]).unwrap();
        assert_eq!(inputs[0].label(), "path0.txt");
    }

    #[test]
    fn mismatched_chromosome_count_is_an_error() {
        let chroms = vec!["chr1".to_string(), "chr2".to_string()];
        assert_eq!(
            pair_inputs(&paths(3), &chroms),
            Err("Got 2 chromosome names for 3 decoded path files".to_string())
        );
    }
}
