//
// cli.rs
// Dicom-Convert-rs
//
// Defines the CLI surface with Clap: batch conversion by default, plus a `serve` verb for the HTTP service.
//

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::batch::{self, BatchOptions};
use crate::models::OutputFormat;
use crate::web::{self, ServiceConfig};

/// Without a subcommand the tool converts a folder (or an explicit list) of DICOM files.
#[derive(Parser, Debug)]
#[command(name = "dicom-convert")]
#[command(about = "Convert DICOM files to JPG/PNG", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub batch: BatchArgs,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Input directory containing DICOM files
    #[arg(long, default_value = "input_img")]
    pub input: PathBuf,
    /// Output directory for converted images
    #[arg(long, default_value = "output_img")]
    pub output: PathBuf,
    /// Specific DICOM files to convert
    #[arg(long, num_args = 1..)]
    pub files: Option<Vec<PathBuf>>,
    /// Output image format
    #[arg(long, value_enum, default_value_t = OutputFormat::Jpg)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the conversion web service
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
        /// Largest accepted upload, in MiB
        #[arg(long, default_value_t = 256)]
        max_upload_mb: usize,
    },
}

impl From<BatchArgs> for BatchOptions {
    fn from(args: BatchArgs) -> Self {
        BatchOptions {
            input_dir: args.input,
            output_dir: args.output,
            files: args.files,
            format: args.format,
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    // Parse the raw CLI arguments once and dispatch.
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            max_upload_mb,
        }) => {
            let config = ServiceConfig {
                host,
                port,
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            };
            web::start_server(config).await?
        }
        None => {
            let options = BatchOptions::from(cli.batch);
            // Conversion is CPU-bound and sequential; keep it off the async workers.
            tokio::task::spawn_blocking(move || batch::run(&options)).await??;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_defaults_match_folder_layout() {
        let cli = Cli::try_parse_from(["dicom-convert"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.batch.input, PathBuf::from("input_img"));
        assert_eq!(cli.batch.output, PathBuf::from("output_img"));
        assert_eq!(cli.batch.format, OutputFormat::Jpg);
        assert!(cli.batch.files.is_none());
    }

    #[test]
    fn explicit_files_and_png_format() {
        let cli = Cli::try_parse_from([
            "dicom-convert",
            "--files",
            "a.dcm",
            "b.dcm",
            "--format",
            "png",
        ])
        .unwrap();
        assert_eq!(
            cli.batch.files,
            Some(vec![PathBuf::from("a.dcm"), PathBuf::from("b.dcm")])
        );
        assert_eq!(cli.batch.format, OutputFormat::Png);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["dicom-convert", "--format", "bmp"]).is_err());
    }

    #[test]
    fn serve_defaults_to_port_5000_on_all_interfaces() {
        let cli = Cli::try_parse_from(["dicom-convert", "serve"]).unwrap();
        match cli.command {
            Some(Commands::Serve { host, port, .. }) => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 5000);
            }
            None => panic!("expected serve"),
        }
    }
}
