use std::{fs, path::Path};

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}

/// Creates `dir` and its parents unless it is already a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(format!("Output path is not a directory: {}", dir.display()));
    }
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create output directory {}: {}", dir.display(), e))
}
