pub mod html;
pub mod json;
pub mod junit;
pub mod output;
pub mod types;

use anyhow::Result;
use std::path::Path;

use output::RunContext;
use types::RunResults;

/// Generate a report in the requested format from a results JSON file.
pub async fn generate_report(
    results_path: &Path,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let results = std::fs::read_to_string(results_path)?;
    let run_results: RunResults = serde_json::from_str(&results)?;

    match format {
        "json" => json::generate(&run_results, output).await,
        "html" => html::generate(&run_results, output).await,
        "junit" => {
            let xml = junit::generate_junit_xml(&run_results)?;
            match output {
                Some(path) => {
                    std::fs::write(path, xml)?;
                    println!("JUnit report saved to: {}", path.display());
                }
                None => println!("{}", xml),
            }
            Ok(())
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

/// Write every end-of-run artifact: HTML into the timestamped run folder,
/// JSON and JUnit into the fixed results directory.
pub fn write_all(results: &RunResults, run: &RunContext) -> Result<()> {
    html::write_report(results, &run.run_dir())?;
    json::write_report(results, &run.results_dir())?;
    junit::write_report(results, &run.results_dir())?;
    Ok(())
}
