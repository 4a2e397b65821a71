use issue_intake::{config::IntakeConfig, init_service, init_tracing};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize tracing
    init_tracing();

    // Get config file path from command line or use default
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "config/intake.yaml".to_string());

    // Load configuration
    let config = match IntakeConfig::from_file(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", config_path, e);
            eprintln!("Usage: issue-intake [config_file]");
            process::exit(1);
        }
    };

    // Start the service
    if let Err(e) = init_service(config).await {
        eprintln!("Intake service error: {}", e);
        process::exit(1);
    }
}
