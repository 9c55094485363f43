//! Carebook binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build collaborators from a JSON script (or the built-in demo)
//! 4. Open a booking session and drive it from stdin

mod cli;
mod driver;

use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use carebook_core::config::CarebookConfig;
use carebook_core::types::PatientIdentity;
use carebook_session::{BookingSession, Script, SessionRegistry};

use cli::CliArgs;
use driver::{Command, Transcript};

const DEMO_SCRIPT: &str = include_str!("../../../demos/demo_script.json");

fn print_new_entries(session: &BookingSession, transcript: &mut Transcript) {
    let entries = session.entries();
    for entry in transcript.fresh(&entries) {
        println!("{}\n", driver::render_entry(entry));
    }
}

fn prompt(session: &BookingSession) {
    print!("[{}] > ", session.step());
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = CarebookConfig::load_or_default(&config_file);

    // Tracing. Logs go to stderr so they stay out of the conversation.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Carebook v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Collaborators.
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => {
            tracing::info!("No script given, using the built-in demo");
            Script::from_json(DEMO_SCRIPT)?
        }
    };
    let registry = SessionRegistry::new(script.into_collaborators(), config);

    // Session.
    let patient = PatientIdentity::patient(args.patient_id.clone(), args.name.clone());
    let session = registry.open(patient)?;
    let mut transcript = Transcript::default();

    println!("{}\n", driver::HELP);
    print_new_entries(&session, &mut transcript);
    prompt(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            prompt(&session);
            continue;
        }

        let command = Command::parse(&line);
        match &command {
            Command::Quit => break,
            Command::Help => println!("{}\n", driver::HELP),
            Command::Invalid(reason) => println!("! {}\n", reason),
            Command::Show => {
                transcript.reset();
                print_new_entries(&session, &mut transcript);
            }
            Command::Emergency => match driver::held_emergency_slot(&session.entries()) {
                Some(slot) => println!("Emergency slot held: {}\n", slot),
                None => println!("No emergency slot is being held.\n"),
            },
            _ => {}
        }

        match driver::execute(&session, &command).await {
            Ok(Some(step)) => tracing::debug!(session_id = %session.id(), %step, "Command applied"),
            Ok(None) => {}
            Err(e) => println!("! {}\n", e),
        }
        print_new_entries(&session, &mut transcript);
        prompt(&session);
    }

    println!();
    let closed = registry.close_for_patient(&args.patient_id)?;
    tracing::info!(closed, "Carebook shutting down");
    Ok(())
}
