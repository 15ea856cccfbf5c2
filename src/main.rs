//
// main.rs
// Dicom-Convert-rs
//
// Tokio entry point: installs logging, then hands off to the CLI layer.
//

use dicom_convert::cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    cli::run().await
}
