use super::types::RunResults;
use anyhow::Result;
use std::path::Path;

/// Generate JSON report
pub async fn generate(results: &RunResults, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;

    if let Some(path) = output {
        std::fs::write(path, json)?;
        println!("JSON report saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

/// Write the machine-readable results file into the results directory.
pub fn write_report(results: &RunResults, results_dir: &Path) -> Result<()> {
    let path = results_dir.join("results.json");
    std::fs::write(&path, serde_json::to_string_pretty(results)?)?;
    println!("    Generated JSON results: {}", path.display());
    Ok(())
}
