//! Plain-text report rendering. Pure: a [`ScanOutcome`] in, a string out.

use crate::scanner::ScanOutcome;

/// Renders the comment body for a scan outcome.
///
/// Completed scans get a count header and, when advisories exist, one line
/// per affected package in the scanner's order. Failed scans get a single
/// explanatory line.
pub fn render_report(outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::Failed { message } => {
            format!("Error occurred while parsing for vulnerabilities: {message}")
        }
        ScanOutcome::Completed(report) => {
            let total = report.metadata.vulnerabilities.total();
            let mut out = format!(
                "## Found {total} vulnerabilities in {} dependencies",
                report.metadata.total_dependencies
            );

            if !report.advisories.is_empty() {
                out.push_str("\n\n## Vulnerable Packages:");
            }
            for advisory in report.advisories.values() {
                out.push('\n');
                out.push_str(&advisory.module_name);
                out.push_str(" -> ");
                out.push_str(&advisory.cves.join(","));
            }
            out
        }
    }
}
