use sb_core::{format_size_warnings, LoadError, SizeWarning, SubmissionReport};

/// Print oversized-prediction warnings to stderr.
pub(crate) fn print_size_warnings(warnings: &[SizeWarning], max_size_mb: f64) {
    for line in format_size_warnings(warnings, max_size_mb) {
        eprintln!("{}", line);
    }
}

/// Print a load/validation failure and return its exit code.
pub(crate) fn report_load_error(err: &LoadError) -> i32 {
    if err.is_validation() {
        eprintln!("Validation failed: {}", err);
    } else {
        eprintln!("Error: {}", err);
    }
    err.exit_code()
}

/// Print the per-run summary followed by one line per failure.
pub(crate) fn print_submission_summary(report: &SubmissionReport, run_id: &str) {
    eprintln!(
        "Submitted {}/{} predictions (run id: {})",
        report.success_count(),
        report.len(),
        run_id
    );
    let failures: Vec<_> = report.failed().collect();
    if failures.is_empty() {
        return;
    }
    eprintln!("{} submissions failed:", failures.len());
    for err in failures {
        eprintln!("  - {}", err);
    }
}
