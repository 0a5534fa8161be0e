use clap::Parser;
use tracing::{debug, error, trace};

use blobrm_rs::config::Config;
use blobrm_rs::types::error::BlobRmError;
use blobrm_rs::{
    CLIArgs, DeletionPipeline, create_pipeline_cancellation_token, exit_code_from_error,
    is_cancelled_error,
};

mod ctrl_c_handler;
mod tracing_init;

/// blobrm - Fast Azure Blob Storage batch deletion tool.
///
/// This binary is a thin wrapper over the blobrm-rs library.
/// All core functionality is implemented in the library crate.
#[tokio::main]
async fn main() {
    let config = load_config_exit_if_err();

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    std::process::exit(run(config).await);
}

fn load_config_exit_if_err() -> Config {
    match Config::try_from(CLIArgs::parse()) {
        Ok(config) => config,
        Err(error_message) => {
            clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit()
        }
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    match &config.tracing_config {
        Some(tracing_config) => {
            tracing_init::init_tracing(tracing_config);
            true
        }
        None => false,
    }
}

async fn run(config: Config) -> i32 {
    let cancellation_token = create_pipeline_cancellation_token();

    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let start_time = tokio::time::Instant::now();
    debug!("deletion pipeline start.");

    let pipeline = DeletionPipeline::new(config, cancellation_token);
    let result = pipeline.run().await;

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

    match result {
        Ok(summary) => {
            for message in &summary.failure_messages {
                println!("{message}");
            }
            for message in &summary.success_messages {
                println!("{message}");
            }

            debug!(
                duration_sec = duration_sec,
                success_count = summary.success_count,
                failure_count = summary.failure_count,
                "blobrm has been completed."
            );

            if summary.failure_count > 0 {
                let partial = BlobRmError::PartialFailure {
                    succeeded: summary.success_count,
                    failed: summary.failure_count,
                };
                error!("{}", partial);
                return partial.exit_code();
            }

            0
        }
        Err(e) => {
            if is_cancelled_error(&e) {
                debug!("deletion cancelled by user.");
                return exit_code_from_error(&e);
            }
            error!("{:#}", e);
            error!(duration_sec = duration_sec, "blobrm failed.");
            exit_code_from_error(&e)
        }
    }
}
