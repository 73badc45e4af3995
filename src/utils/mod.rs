mod readers;
mod util;

pub use readers::{open_genome_reader, open_path_reader};
pub use util::{ensure_output_dir, handle_error_and_exit, Result};
