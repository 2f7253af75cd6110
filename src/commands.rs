use crate::cli::Cli;
use crate::driver::{self, RunOptions};

pub fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = RunOptions {
        config: cli.config,
        local_root: cli.local_root,
        dir: cli.dir,
        max_parallel: cli.max_parallel,
    };
    let summary = driver::run(&options)?;

    for path in &summary.rewritten {
        println!("rewrote {}", path.display());
    }
    println!(
        "{} file(s) rewritten, {} unchanged",
        summary.rewritten.len(),
        summary.skipped
    );

    if !summary.failures.is_empty() {
        for failure in &summary.failures {
            eprintln!("{}: {:#}", failure.path.display(), failure.error);
        }
        return Err(format!("{} file(s) failed", summary.failures.len()).into());
    }
    Ok(())
}
