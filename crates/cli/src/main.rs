use careboard_core::config::{ANALYSIS_TIMEOUT_ENV, PERSONA_DIR_ENV, RECORDS_ENV, REST_ADDR_ENV};
use careboard_core::source::{load_records, save_records};
use careboard_core::{
    ActionTrigger, CommandRegistry, EngineConfig, PersonaIdentity, PersonaRegistry, Session,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "careboard")]
#[command(about = "Careboard persona dashboard CLI")]
struct Cli {
    /// Records file, JSON or YAML (overrides CAREBOARD_RECORDS)
    #[arg(long, global = true)]
    records: Option<String>,
    /// Directory of persona YAML files (overrides CAREBOARD_PERSONA_DIR)
    #[arg(long, global = true)]
    persona_dir: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured personas
    Personas,
    /// Load and validate every persona configuration
    CheckConfig,
    /// Render a persona's dashboard as JSON
    Render {
        /// admin, clinician, waiting-list or management
        persona: PersonaIdentity,
        /// Record to select before rendering
        #[arg(long)]
        select: Option<String>,
    },
    /// Render a persona's sidebar record list as JSON
    Sidebar {
        persona: PersonaIdentity,
        #[arg(long)]
        select: Option<String>,
    },
    /// Trigger a widget action
    Act {
        persona: PersonaIdentity,
        /// Widget the action comes from
        widget_id: String,
        /// Action id as offered by the widget
        action_id: String,
        /// Row the action applies to (table actions)
        #[arg(long)]
        record: Option<String>,
        /// Record to select before triggering
        #[arg(long)]
        select: Option<String>,
        /// Write the updated records back to the records file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("careboard=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env_values(
        cli.records.or_else(|| std::env::var(RECORDS_ENV).ok()),
        cli.persona_dir.or_else(|| std::env::var(PERSONA_DIR_ENV).ok()),
        std::env::var(ANALYSIS_TIMEOUT_ENV).ok(),
        std::env::var(REST_ADDR_ENV).ok(),
    )?;

    match cli.command {
        Some(Commands::Personas) => {
            let registry = config.load_registry(&CommandRegistry::builtin())?;
            for persona in registry.iter() {
                println!(
                    "{}: {} ({}) - {}",
                    persona.persona, persona.meta.display_name, persona.meta.subtitle,
                    persona.meta.description
                );
            }
        }
        Some(Commands::CheckConfig) => match config.load_registry(&CommandRegistry::builtin()) {
            Ok(registry) => {
                for persona in registry.iter() {
                    println!(
                        "{}: {} widgets, {} actions",
                        persona.persona,
                        persona.layout.widgets.len(),
                        persona.actions.len()
                    );
                }
                println!("Persona configuration OK");
            }
            Err(e) => {
                eprintln!("Error in persona configuration: {}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Render { persona, select }) => {
            let (registry, session) = open_session(&config, select.as_deref())?;
            let view = session.render(registry.lookup(persona));
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Some(Commands::Sidebar { persona, select }) => {
            let (registry, session) = open_session(&config, select.as_deref())?;
            let view = session.sidebar(registry.lookup(persona));
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Some(Commands::Act {
            persona,
            widget_id,
            action_id,
            record,
            select,
            write,
        }) => {
            let (registry, mut session) = open_session(&config, select.as_deref())?;
            let trigger = ActionTrigger {
                widget_id,
                action_id,
                record_id: record,
            };
            match session.trigger(registry.lookup(persona), &trigger, chrono::Utc::now()) {
                Ok(resolution) => {
                    println!("{}", serde_json::to_string_pretty(&resolution)?);
                    for notification in session.notifications() {
                        println!("{}", notification.message);
                    }
                    if write {
                        save_records(config.records_path(), session.records())?;
                        println!("Wrote records to {}", config.records_path().display());
                    }
                }
                Err(e) => {
                    eprintln!("Error triggering action: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("Use 'careboard --help' for commands");
        }
    }

    Ok(())
}

fn open_session(
    config: &EngineConfig,
    select: Option<&str>,
) -> Result<(PersonaRegistry, Session), Box<dyn std::error::Error>> {
    let registry = config.load_registry(&CommandRegistry::builtin())?;
    let mut session = Session::new(load_records(config.records_path())?);
    if let Some(record_id) = select {
        session.select(record_id)?;
    }
    Ok((registry, session))
}
