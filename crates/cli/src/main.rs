use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulse_agents::CompanionAgent;
use pulse_core::{
    service_centers, Clock, DriverProfile, OnboardingRecord, SystemClock, VehicleProfile,
};
use pulse_observability::{init_tracing, AppMetrics};
use pulse_storage::Store;

#[derive(Debug, Parser)]
#[command(name = "pulse")]
#[command(about = "Pulse vehicle-health companion CLI")]
struct Cli {
    /// Onboarding record (JSON). The demo profile is used when absent.
    #[arg(long, env = "PULSE_PROFILE")]
    profile: Option<PathBuf>,

    /// SQLite URL for appointments. In-memory when absent.
    #[arg(long, env = "PULSE_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Schedule,
    Predict {
        /// Rank by risk, then by distance.
        #[arg(long)]
        ranked: bool,
    },
    Chat {
        #[arg(long)]
        session: Option<String>,
    },
    Appointments {
        #[command(subcommand)]
        command: AppointmentsCommand,
    },
    Centers,
}

#[derive(Debug, Subcommand)]
enum AppointmentsCommand {
    List,
    Cancel { id: String },
    Complete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("pulse_cli");
    let cli = Cli::parse();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (vehicle, driver) = load_profiles(cli.profile.as_deref(), clock.current_year())?;
    let agent = build_agent(cli.database_url.as_deref(), vehicle, driver, clock).await?;

    match cli.command {
        Command::Schedule => print_json(&agent.maintenance_schedule())?,
        Command::Predict { ranked } => print_json(&agent.predicted_issues(ranked))?,
        Command::Chat { session } => run_chat(&agent, session).await?,
        Command::Appointments { command } => match command {
            AppointmentsCommand::List => print_json(&agent.appointments().await?)?,
            AppointmentsCommand::Cancel { id } => {
                let updated = agent.cancel_appointment(&id).await?;
                anyhow::ensure!(updated, "no appointment with id {id}");
                println!("cancelled {id}");
            }
            AppointmentsCommand::Complete { id } => {
                let updated = agent.complete_appointment(&id).await?;
                anyhow::ensure!(updated, "no appointment with id {id}");
                println!("completed {id}");
            }
        },
        Command::Centers => print_json(&service_centers())?,
    }

    Ok(())
}

async fn run_chat(agent: &CompanionAgent<Store>, mut session_id: Option<String>) -> Result<()> {
    println!("{}", pulse_agents::OPENING_LINE);
    println!("(type 'exit' to quit)");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        match agent.handle_message(session_id.clone(), message).await {
            Ok(reply) => {
                session_id = Some(reply.session_id);
                println!("\n{}\n", reply.turn.text);
                if let Some(appointment) = reply.appointment {
                    println!("[booked {} / {}]\n", appointment.id, appointment.center);
                }
            }
            Err(err) => eprintln!("\nbooking could not be saved: {err}\n"),
        }
    }

    Ok(())
}

fn load_profiles(
    path: Option<&Path>,
    current_year: i32,
) -> Result<(VehicleProfile, DriverProfile)> {
    let Some(path) = path else {
        return Ok((VehicleProfile::demo(), DriverProfile::default()));
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading profile {}", path.display()))?;
    let record = OnboardingRecord::from_json(&raw)
        .with_context(|| format!("invalid onboarding record in {}", path.display()))?;

    Ok((record.vehicle_profile(current_year), record.driver_profile()))
}

async fn build_agent(
    database_url: Option<&str>,
    vehicle: VehicleProfile,
    driver: DriverProfile,
    clock: Arc<dyn Clock>,
) -> Result<CompanionAgent<Store>> {
    let store = match database_url {
        Some(url) => Store::sqlite(url).await?,
        None => Store::memory(),
    };

    Ok(CompanionAgent::new(
        vehicle,
        driver,
        Arc::new(store),
        clock,
        AppMetrics::shared(),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
