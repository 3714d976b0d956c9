#![warn(missing_docs)]
//! # vocal-guard-app binary
//!
//! Non-interactive entry point: resolves configuration, opens the per-run
//! log, and prints the runtime gates the interactive shell would start from.

use vocal_guard_app::{AppConfig, RunLogger, app_version, upload_enabled_from_env};

/// CLI entry point.
fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to resolve vocal-guard configuration: {error}");
            std::process::exit(1);
        }
    };

    match RunLogger::new(&config.data_dir) {
        Ok(logger) => {
            logger.info(
                "bootstrap",
                "startup",
                &format!(
                    "version={} api_base={} upload_enabled={}",
                    app_version(),
                    config.api_base_url,
                    upload_enabled_from_env()
                ),
            );
            println!("log_file={}", logger.path().display());
        }
        Err(error) => {
            eprintln!("failed to open run log: {error}");
        }
    }

    println!("vocal-guard-app {}", app_version());
    println!("api_base={} (VOCALGUARD_API_BASE)", config.api_base_url);
    println!("data_dir={} (VOCALGUARD_DATA_DIR)", config.data_dir.display());
    println!(
        "upload_enabled={} (VOCALGUARD_UPLOAD_ENABLED)",
        upload_enabled_from_env()
    );
}
