//! CLI entry point for ns-client-audit — find Netskope devices with disabled
//! clients that still show recent traffic.
//!
//! Validates arguments, prompts for the APIv1 token when one was not
//! supplied, then runs the audit pipeline and streams the CSV report to
//! standard output.
//!
//! Exit codes:
//! - 0: success (the report ran to completion, whatever the row verdicts)
//! - 1: runtime error (device listing failed; no rows were emitted)
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use ns_client_audit::audit::{run_audit, AuditOptions};
use ns_client_audit::client::NsClient;
use ns_client_audit::report::CsvStdout;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Netskope tenant host, e.g. example.goskope.com.
    #[arg(long)]
    tenant: String,

    /// Netskope APIv1 token. Prefer the NS_API_TOKEN environment variable
    /// over the flag to keep the token out of process listings and shell
    /// history; omit both to be prompted interactively.
    #[arg(long, env = "NS_API_TOKEN")]
    token: Option<String>,

    /// How far back (in seconds) to look for correlating events.
    #[arg(long, default_value_t = 86_400, value_parser = clap::value_parser!(u64).range(1..))]
    timeperiod: u64,

    /// Number of devices to fetch that are marked "disabled" by Netskope.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..=5000))]
    device_limit: u32,

    /// Emit one row per user on each device instead of one per device,
    /// including devices whose aggregate status is Enabled.
    #[arg(long)]
    all_users: bool,

    /// Per-request timeout in seconds, applied uniformly to every API call.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let token = match args.token {
        Some(token) => token,
        None => match rpassword::prompt_password("Enter Netskope tenant APIv1 token: ") {
            Ok(token) => token,
            Err(e) => {
                eprintln!("Error: could not read token: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    // The banner names everything but the token.
    println!();
    println!("Tenant Name:  {}", args.tenant);
    println!("Time Period:  {}", args.timeperiod);
    println!("Device Limit: {}", args.device_limit);
    println!();
    println!("Getting list of devices with Netskope Client marked as \"disabled\"...");
    println!(
        "Searching for events within the last {} seconds that correlate with each device...",
        args.timeperiod
    );
    println!();

    let client = NsClient::new(
        &args.tenant,
        &token,
        Some(Duration::from_secs(args.timeout)),
    );
    let options = AuditOptions {
        timeperiod: args.timeperiod,
        device_limit: args.device_limit,
        show_all_users: args.all_users,
    };

    match run_audit(&client, &options, &mut CsvStdout).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
