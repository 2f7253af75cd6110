use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relocate",
    about = "Apply package-relocation rules to a source tree",
    version
)]
pub struct Cli {
    /// Name of the configuration file.
    #[arg(short = 'f', long = "config")]
    pub config: PathBuf,

    /// The local package root prefixed onto both sides of every rule.
    #[arg(short = 'r', long = "root")]
    pub local_root: String,

    /// The directory to start from.
    pub dir: PathBuf,

    /// Max parallelism.
    #[arg(long = "max-parallel", default_value_t = 10)]
    pub max_parallel: usize,
}
