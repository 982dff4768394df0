use smart_attendance::{Config, SweepResult, expire_sessions};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: {bin} expire-sessions

Runs one expiry sweep against the configured database:
  * closes class sessions whose end time has passed, so their QR codes stop accepting attendance
  * deletes lecturer logins past their expiry

Meant for an external scheduler when the in-process sweeper is disabled
(attendance.sweep_interval_seconds = 0). Configuration is read from
Attendance.toml, ATTENDANCE_* variables and DATABASE_URL.";

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if config.logging.json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn report(result: &SweepResult) {
    println!(
        "Closed {} expired class session(s), purged {} expired login(s)",
        result.sessions_expired, result.logins_purged
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let bin = args.first().map(String::as_str).unwrap_or("cron");
    if args.len() != 2 || args[1] != "expire-sessions" {
        eprintln!("{}", USAGE.replace("{bin}", bin));
        return ExitCode::from(2);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match expire_sessions(&config).await {
        Ok(result) => {
            report(&result);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "expiry sweep failed");
            ExitCode::FAILURE
        }
    }
}
