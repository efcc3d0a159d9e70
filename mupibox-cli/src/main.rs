use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use mupibox_appcore::service::{AdminResponse, AdminService};
use mupibox_core::types::ChangeLevel;
use mupibox_runtime::defaults::DEFAULT_SETTINGS_PATH;
use mupibox_runtime::settings::AdminSettings;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(
    name = "mupibox-admin",
    about = "MuPiHAT configuration for the MuPiBox admin interface"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Admin settings file (defaults apply when it does not exist)
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Box config document override
    #[arg(long)]
    config: Option<PathBuf>,

    /// Staging file override (must be on the same filesystem as --config)
    #[arg(long)]
    staging: Option<PathBuf>,

    /// Print a plain-text summary instead of the HTML page
    #[arg(long)]
    text: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a submitted admin form
    Submit {
        /// urlencoded form body; read from stdin when omitted
        #[arg(long)]
        form: Option<String>,
    },

    /// Render the current configuration
    Show,

    /// Re-persist the config and run the effects of a change level
    ApplyLevel {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,
    },

    /// Read battery telemetry from the status endpoint
    Telemetry {
        /// Keep polling on the configured interval
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let mut settings = AdminSettings::load(&args.settings)?;
    if let Some(config) = args.config {
        settings.config_path = config;
    }
    if let Some(staging) = args.staging {
        settings.staging_path = Some(staging);
    }
    let svc = AdminService::new(settings);

    let resp = match args.command {
        Command::Submit { form } => {
            let body = match form {
                Some(body) => body,
                None => read_stdin().await?,
            };
            svc.submit_body(&body).await
        }
        Command::Show => svc.show().await,
        Command::ApplyLevel { level } => {
            let level =
                ChangeLevel::from_code(level).ok_or_else(|| anyhow!("invalid level {level}"))?;
            svc.apply_level(level).await
        }
        Command::Telemetry { watch } => {
            telemetry(&svc, watch).await?;
            return Ok(true);
        }
    };

    print_response(&resp, args.text);
    Ok(resp.is_success())
}

async fn read_stdin() -> anyhow::Result<String> {
    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .context("read form body from stdin")?;
    Ok(body)
}

fn print_response(resp: &AdminResponse, text: bool) {
    if !text {
        print!("{}", resp.html);
        return;
    }
    if let Some(report) = &resp.report {
        let cfg = &report.config;
        println!("hat_active={} selected_battery={}", cfg.hat_active, cfg.selected_battery);
        if let Some(level) = report.level {
            println!("level={level}");
        }
    }
    for line in resp.summary_lines() {
        println!("- {line}");
    }
}

async fn telemetry(svc: &AdminService, watch: bool) -> anyhow::Result<()> {
    let client = svc.telemetry_client()?;
    let print = |sample: mupibox_core::telemetry::BatteryTelemetry| {
        for row in sample.rows() {
            println!("{:<28}{}", row.label, row.value);
        }
        println!();
    };

    if !watch {
        print(client.fetch().await?);
        return Ok(());
    }

    client
        .poll(svc.settings().telemetry_interval(), |sample| {
            print(sample);
            ControlFlow::Continue(())
        })
        .await;
    Ok(())
}
