//! Sheetbridge API Server binary
//!
//! HTTP front end for one sheet configuration: upload import and JSON export.

use clap::Parser;
use royalbit_sheetbridge::api::{run_api_server, ServerConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sheetbridge-server")]
#[command(version)]
#[command(author = "RoyalBit Inc. <admin@royalbit.ca>")]
#[command(about = "Sheetbridge API Server - spreadsheet import/export over HTTP")]
#[command(long_about = r#"
Sheetbridge API Server

Serves one sheet configuration (YAML or JSON) over HTTP:
  - POST /api/v1/import    - Import an uploaded spreadsheet (multipart form)
  - POST /api/v1/export    - Export JSON rows as .xlsx/.xls/.csv

Additional endpoints:
  - GET  /health           - Health check
  - GET  /schema           - Configured columns and dictionaries
  - GET  /                 - API documentation

Example usage:
  sheetbridge-server --config users.yaml
  sheetbridge-server --config users.yaml --host 0.0.0.0 --port 3000

  curl -F file=@users.xlsx http://localhost:8080/api/v1/import
"#)]
struct Args {
    /// Sheet configuration file (.yaml, .yml or .json)
    #[arg(short, long, env = "SHEETBRIDGE_CONFIG")]
    config: PathBuf,

    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SHEETBRIDGE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "SHEETBRIDGE_PORT")]
    port: u16,

    /// Maximum accepted request body in bytes
    #[arg(long, default_value_t = royalbit_sheetbridge::api::server::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        config_path: args.config,
        max_upload_bytes: args.max_upload_bytes,
    };

    run_api_server(config).await
}
