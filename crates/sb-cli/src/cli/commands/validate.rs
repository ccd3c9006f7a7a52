use sb_core::PredictionLoader;

use super::reporting::{print_size_warnings, report_load_error};
use crate::cli::args::ValidateArgs;
use crate::exit_codes;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let loader = PredictionLoader::new(args.predictions.max_prediction_size_mb);
    let loaded = match loader.load(
        &args.predictions.predictions_path,
        &args.predictions.instance_ids,
    ) {
        Ok(l) => l,
        Err(e) => return Ok(report_load_error(&e)),
    };

    print_size_warnings(&loaded.oversized, loader.max_size_mb());
    eprintln!(
        "{} predictions ready to submit, {} skipped for size",
        loaded.records.len(),
        loaded.oversized.len()
    );
    Ok(exit_codes::SUCCESS)
}
