use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use influx_provisioner::backend::influxdb::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use influx_provisioner::backend::{InfluxConnectionConfig, InfluxDbClient};
use influx_provisioner::config::{DocumentFormat, ProvisioningConfig};
use influx_provisioner::{logging, provision, AppResult, ProvisioningRequest};

const EXIT_STEP_FAILED: u8 = 1;
const EXIT_INVALID_CONFIG: u8 = 2;
const EXIT_NOT_READY: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "influx-provisioner")]
#[command(about = "Create the InfluxDB admin account, databases and users described in a config file")]
struct Args {
    /// Provisioning document (JSON, or YAML for .yaml/.yml); "-" reads JSON from stdin
    #[arg(short, long, alias = "influx-config-file")]
    config: String,

    /// JSON file with the admin `user` and `password`; overrides the document's `admin`
    #[arg(long = "credentials", alias = "influxdb-credentials")]
    credentials: Option<PathBuf>,

    /// InfluxDB HTTP API host
    #[arg(long, alias = "influxdb-host", default_value = DEFAULT_HOST)]
    host: String,

    /// InfluxDB HTTP API port
    #[arg(short, long, alias = "influxdb-port", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Wait up to this many seconds for InfluxDB to answer /ping before provisioning
    #[arg(long, default_value_t = 0)]
    wait: u64,

    /// Enable debug output (raw requests and responses)
    #[arg(short, long)]
    debug: bool,
}

fn load_request(config: &str, credentials: Option<&Path>) -> AppResult<ProvisioningRequest> {
    let mut loader = ProvisioningConfig::new();
    if let Some(path) = credentials {
        loader = loader.with_admin(ProvisioningConfig::load_admin_credentials(path)?);
    }

    if config == "-" {
        loader.read_reader(std::io::stdin().lock(), DocumentFormat::Json)
    } else {
        loader.read_file(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    logging::init_tracing(args.debug);

    // Nothing touches the network until the document is known to be valid
    let request = match load_request(&args.config, args.credentials.as_deref()) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(EXIT_INVALID_CONFIG);
        }
    };

    let connection = InfluxConnectionConfig::new(args.host, args.port).with_timeout(args.timeout);
    let client = match InfluxDbClient::connect(&connection) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(EXIT_INVALID_CONFIG);
        }
    };

    tracing::info!(
        "Provisioning InfluxDB at {}:{} ({} database(s))",
        connection.host,
        connection.port,
        request.databases.len()
    );

    if args.wait > 0 {
        if let Err(e) = client.wait_until_ready(Duration::from_secs(args.wait)).await {
            tracing::error!("InfluxDB did not become ready within {}s: {}", args.wait, e);
            return ExitCode::from(EXIT_NOT_READY);
        }
    }

    let started_at = Utc::now();
    let result = provision(&request, client).await;
    logging::log_summary(&result, started_at);

    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_STEP_FAILED)
    }
}
