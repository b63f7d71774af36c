//! Dataport CLI - connect integrations, browse and export their records
//!
//! # Main Commands
//!
//! ```bash
//! dataport status --watch           # Connection status, refreshed live
//! dataport connect notion           # Run the OAuth connect flow
//! dataport load hubspot --api-type deals --export ./out
//! dataport serve                    # Start HTTP server (port 3000)
//! ```
//!
//! # Offline Commands
//!
//! ```bash
//! dataport table records.json       # Render a records file as a table
//! dataport export records.json -o records.csv
//! ```

use chrono::Utc;
use clap::{Parser, Subcommand};
use dataport::render::{render_status, render_table};
use dataport::server::{start_server, AppState};
use dataport::{
    export_projection, project, write_csv, Config, Dashboard, DashboardError, HubspotObject, Integration,
    Notification, TerminalLauncher,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dataport")]
#[command(about = "Connect Notion, HubSpot and Airtable accounts, browse and export their records", long_about = None)]
struct Cli {
    /// Integrations backend base URL (overrides DATAPORT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// User id sent with every backend call (overrides DATAPORT_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Organization id sent with every backend call (overrides DATAPORT_ORG)
    #[arg(long, global = true)]
    org: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the connection status of every integration
    Status {
        /// Keep polling and print every change until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },

    /// Connect an integration through its OAuth authorization page
    Connect {
        /// notion, hubspot or airtable
        integration: Integration,
    },

    /// Disconnect an integration
    Disconnect {
        /// notion, hubspot or airtable
        integration: Integration,
    },

    /// Load records from a connected integration
    Load {
        /// notion, hubspot or airtable
        integration: Integration,

        /// Bypass the backend cache
        #[arg(short, long)]
        force: bool,

        /// HubSpot object type: contacts, companies, deals or tickets
        #[arg(long, default_value = "contacts")]
        api_type: HubspotObject,

        /// Page to display (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Also export the records as CSV into this directory
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Print the raw records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Render a JSON records file as a table
    Table {
        /// JSON file: an array of records or {"items": [...]}
        input: PathBuf,

        /// Page to display (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Export a JSON records file as CSV
    Export {
        /// JSON file: an array of records or {"items": [...]}
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match load_config(&cli) {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(user) = &cli.user {
        config.user_id = user.clone();
    }
    if let Some(org) = &cli.org {
        config.org_id = org.clone();
    }
    Ok(config)
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Status { watch } => cmd_status(config, watch).await,
        Commands::Connect { integration } => cmd_connect(config, integration).await,
        Commands::Disconnect { integration } => cmd_disconnect(config, integration).await,
        Commands::Load {
            integration,
            force,
            api_type,
            page,
            export,
            json,
        } => cmd_load(config, integration, force, api_type, page, export.as_deref(), json).await,
        Commands::Table { input, page } => cmd_table(&input, page, config.page_size),
        Commands::Export { input, output } => cmd_export(&input, output.as_deref()),
        Commands::Serve { port } => cmd_serve(config, port).await,
    }
}

/// Prints notifications as they arrive, until finished.
struct Printer {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

fn print_notifications(dashboard: &Dashboard) -> Printer {
    let mut rx = dashboard.notifier().subscribe();
    let (stop, mut stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(notification) => print_notification(&notification),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return,
                },
                _ = &mut stopped => break,
            }
        }
        while let Ok(notification) = rx.try_recv() {
            print_notification(&notification);
        }
    });
    Printer { stop, task }
}

fn print_notification(notification: &Notification) {
    eprintln!("{} {}", notification.severity.emoji(), notification.message);
}

/// Print whatever was already sent, then stop.
async fn finish(printer: Printer) {
    let _ = printer.stop.send(());
    let _ = printer.task.await;
}

async fn cmd_status(config: Config, watch: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = Dashboard::new(config);
    eprintln!("🔌 Backend: {}", dashboard.client().base_url());

    if !watch {
        let report = dashboard.refresh_status().await;
        for (integration, error) in &report.failed {
            eprintln!("⚠️  {}: {}", integration, error);
        }
        print!("{}", render_status(&dashboard.store().snapshot(), Utc::now()));
        return Ok(());
    }

    let mut changes = dashboard.store().subscribe();
    let live = dashboard.start_polling();
    eprintln!("👀 Watching connection status (Ctrl-C to stop)...\n");
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = changes.borrow_and_update().clone();
                println!("{}", render_status(&snapshot, Utc::now()));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    live.stop().await;
    Ok(())
}

async fn cmd_connect(config: Config, integration: Integration) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = Dashboard::new(config);
    let printer = print_notifications(&dashboard);

    let outcome = dashboard.connect(integration, &TerminalLauncher).await;
    dashboard.refresh_status().await;
    finish(printer).await;
    outcome?;

    print!("{}", render_status(&dashboard.store().snapshot(), Utc::now()));
    Ok(())
}

async fn cmd_disconnect(config: Config, integration: Integration) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = Dashboard::new(config);
    let printer = print_notifications(&dashboard);

    let outcome = dashboard.disconnect(integration).await;
    finish(printer).await;
    outcome?;
    Ok(())
}

async fn cmd_load(
    config: Config,
    integration: Integration,
    force: bool,
    api_type: HubspotObject,
    page: usize,
    export_dir: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let page_size = config.page_size;
    let dashboard = Dashboard::new(config);
    let printer = print_notifications(&dashboard);

    dashboard.refresh_status().await;
    dashboard.select_hubspot_object(api_type);
    eprintln!(
        "📥 Loading {}{}...",
        integration,
        if integration == Integration::Hubspot {
            format!(" {}", api_type.label())
        } else {
            String::new()
        }
    );

    let loaded = dashboard.load(integration, force).await;
    let exported = match (&loaded, export_dir) {
        (Ok(_), Some(dir)) => Some(dashboard.export(integration, dir)),
        _ => None,
    };
    finish(printer).await;
    loaded?;

    let view = dashboard.view(integration);
    if let Some(summary) = view.summary() {
        eprintln!("📊 {}", summary);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(view.records())?);
    } else {
        print!("{}", render_table(&view.table(), page.saturating_sub(1), page_size));
    }

    if let Some(exported) = exported {
        let path = exported?;
        eprintln!("💾 Saved to: {}", path.display());
    }
    Ok(())
}

fn read_records(input: &Path) -> Result<Vec<Value>, DashboardError> {
    let content = fs::read_to_string(input)?;
    let body: Value = serde_json::from_str(&content)?;
    dataport::models::normalize_records(body).ok_or_else(|| {
        DashboardError::InvalidRecords(format!(
            "{}: expected an array of records or {{\"items\": [...]}}",
            input.display()
        ))
    })
}

fn cmd_table(input: &Path, page: usize, page_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading: {}", input.display());
    let records = read_records(input)?;
    eprintln!("   {} records", records.len());

    let view = project(&records);
    print!("{}", render_table(&view, page.saturating_sub(1), page_size));
    Ok(())
}

fn cmd_export(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading: {}", input.display());
    let records = read_records(input)?;
    if records.is_empty() {
        return Err(dataport::ExportError::NothingToExport.into());
    }

    let rows = export_projection(&records);
    match output {
        Some(path) => {
            write_csv(&rows, fs::File::create(path)?)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => write_csv(&rows, std::io::stdout().lock())?,
    }
    Ok(())
}

async fn cmd_serve(config: Config, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = Dashboard::new(config);
    let live = dashboard.start_polling();
    start_server(AppState::from_dashboard(&dashboard), port).await?;
    live.stop().await;
    Ok(())
}
