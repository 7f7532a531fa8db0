use color_eyre::eyre::{
    Result,
    eyre,
};
use std::sync::OnceLock;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};
use wallet_gateway::deployment::{
    self,
    DeploymentEnv,
};

mod client;
mod ui;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: wallet-gateway [--polygon | --mumbai | --local] [--rpc-url <url>]\n\
         [--config <path>]\n\
         \n\
         Flags:\n\
           --polygon        Use the Polygon mainnet deployment (default RPC {})\n\
           --mumbai         Use the Polygon Mumbai deployment (default RPC {}, default)\n\
           --local          Use a local node deployment (default RPC {})\n\
           --rpc-url <url>  Wallet node RPC URL; it must hold the signing account\n\
                            (public nodes cannot sign, so pass a local signer for\n\
                            Polygon or Mumbai)\n\
           --config <path>  Load the gateway config from a JSON file instead of .deployments/",
        DeploymentEnv::Polygon.default_rpc_url(),
        DeploymentEnv::Mumbai.default_rpc_url(),
        DeploymentEnv::Local.default_rpc_url(),
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<client::AppConfig> {
    let mut args = std::env::args().skip(1);
    let mut env: Option<DeploymentEnv> = None;
    let mut rpc_url: Option<String> = None;
    let mut config_path: Option<String> = None;

    while let Some(arg) = args.next() {
        let selected = match arg.as_str() {
            "--polygon" => Some(DeploymentEnv::Polygon),
            "--mumbai" => Some(DeploymentEnv::Mumbai),
            "--local" => Some(DeploymentEnv::Local),
            "--rpc-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--rpc-url requires a URL argument"))?;
                if rpc_url.replace(url).is_some() {
                    return Err(eyre!("--rpc-url may only be specified once"));
                }
                None
            }
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--config requires a path argument"))?;
                if config_path.replace(path).is_some() {
                    return Err(eyre!("--config may only be specified once"));
                }
                None
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        };
        if let Some(selected) = selected {
            if env.replace(selected).is_some() {
                return Err(eyre!(
                    "Multiple network flags provided; choose one of --polygon/--mumbai/--local"
                ));
            }
        }
    }

    let env = env.unwrap_or(DeploymentEnv::Mumbai);
    Ok(client::AppConfig {
        env,
        rpc_url: rpc_url.unwrap_or_else(|| env.default_rpc_url().to_string()),
        config_path,
    })
}

/// The terminal belongs to the UI, so logs go to a daily file.
fn init_tracing() {
    let appender = rolling::daily("logs", "wallet-gateway.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    tracing::info!("starting wallet-gateway");
    deployment::ensure_structure()?;
    let app_config = parse_cli_args()?;
    client::run_app(app_config).await
}
