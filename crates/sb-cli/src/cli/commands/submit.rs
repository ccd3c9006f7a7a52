use sb_core::{stderr_progress_sink, PayloadBase, PredictionLoader, SubmitClient, SubmitConfig};
use tracing::debug;

use super::reporting::{print_size_warnings, print_submission_summary, report_load_error};
use crate::cli::args::SubmitArgs;
use crate::exit_codes;

pub async fn run(args: SubmitArgs) -> anyhow::Result<i32> {
    let config = build_config(&args);

    // 1. Load and validate; nothing goes over the network on failure
    let loader = PredictionLoader::from_config(&config);
    let loaded = match loader.load(
        &args.predictions.predictions_path,
        &args.predictions.instance_ids,
    ) {
        Ok(l) => l,
        Err(e) => return Ok(report_load_error(&e)),
    };
    print_size_warnings(&loaded.oversized, loader.max_size_mb());

    if loaded.is_empty() {
        eprintln!("No predictions to submit");
        return Ok(exit_codes::SUCCESS);
    }

    // 2. Build the client and the shared payload
    let client = match SubmitClient::new(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(e.exit_code());
        }
    };

    let run_id = match &args.run_id {
        Some(id) => id.clone(),
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            eprintln!("No run id provided. Using generated run id: {}", id);
            id
        }
    };
    let base = PayloadBase {
        subset: args.subset,
        split: args.split.clone(),
        run_id: run_id.clone(),
        instance_ids: args.predictions.instance_ids.clone(),
    };

    // 3. Submit
    let total = loaded.records.len();
    debug!(total, workers = client.workers(), url = client.submit_url(), "starting submission");
    let report = client
        .submit_all(loaded.records, &base.to_template(), stderr_progress_sink(total))
        .await;

    // 4. Report
    print_submission_summary(&report, &run_id);
    println!("{}", run_id);

    if report.is_success() {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::SUBMISSION_FAILED)
    }
}

fn build_config(args: &SubmitArgs) -> SubmitConfig {
    let mut config = SubmitConfig::default()
        .with_url(args.api_url.clone())
        .with_max_prediction_size_mb(args.predictions.max_prediction_size_mb);
    if let Some(key) = &args.api_key {
        config = config.with_api_key(key.clone());
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    for (name, value) in &args.headers {
        config = config.with_header(name.clone(), value.clone());
    }
    config.timeout_secs = args.timeout_secs;
    config
}
