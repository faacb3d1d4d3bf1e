//! Coopgate — flock tracking shell
//!
//! Routes the launch between the local flock dashboard and remote content,
//! then presents the result on the terminal.

mod flock;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use coopgate_core::{DisplayPhase, ShellConfig};
use coopgate_net::{
    AttributionSource, ConnectivityMonitor, FileAttribution, HttpSetupClient, QueryContext,
    SurfacePreview,
};
use coopgate_router::{ConsentDelegate, ConsentOutcome, LaunchRouter, RouterEvent};
use coopgate_store::{CookieStore, FileStore, StateStore};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coopgate", about = "Coopgate — flock tracking shell")]
struct Cli {
    /// Config file (default: coopgate.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route the launch and present the result
    Run {
        /// Attribution JSON dropped by the SDK sidecar
        /// (default: <data dir>/attribution.json)
        #[arg(long)]
        attribution: Option<PathBuf>,
        /// Resolve the consent prompt without asking on the terminal
        #[arg(long)]
        consent: Option<ConsentChoice>,
        /// Inbound push payload (JSON) to ingest before routing
        #[arg(long)]
        push: Option<String>,
    },
    /// Dump the persisted shell state
    State,
    /// Clear the persisted shell state
    Reset,
    /// Show version
    Version,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ConsentChoice {
    Grant,
    Deny,
    Decline,
}

impl From<ConsentChoice> for ConsentOutcome {
    fn from(choice: ConsentChoice) -> Self {
        match choice {
            ConsentChoice::Grant => ConsentOutcome::PermissionGranted,
            ConsentChoice::Deny => ConsentOutcome::PermissionDenied,
            ConsentChoice::Decline => ConsentOutcome::Declined,
        }
    }
}

/// Fixed resolution, for headless runs.
struct AutoConsent(ConsentOutcome);

#[async_trait::async_trait]
impl ConsentDelegate for AutoConsent {
    async fn request(&self) -> ConsentOutcome {
        self.0
    }
}

/// Asks on the terminal, standing in for the pre-permission sheet.
struct TerminalConsent;

#[async_trait::async_trait]
impl ConsentDelegate for TerminalConsent {
    async fn request(&self) -> ConsentOutcome {
        let answer = tokio::task::spawn_blocking(|| {
            println!("Coopgate would like to send you alerts about your flock.");
            print!("Allow notifications? [y/n/later] ");
            std::io::stdout().flush().ok();
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).ok();
            line.trim().to_ascii_lowercase()
        })
        .await
        .unwrap_or_default();
        match answer.as_str() {
            "y" | "yes" => ConsentOutcome::PermissionGranted,
            "l" | "later" => ConsentOutcome::Declined,
            _ => ConsentOutcome::PermissionDenied,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coopgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from("coopgate.toml"));

    match cli.command {
        Some(Commands::Run {
            attribution,
            consent,
            push,
        }) => {
            init_tracing();
            run(&config_path, attribution, consent, push).await?;
        }

        Some(Commands::State) => {
            let config = ShellConfig::load(&config_path);
            let store = FileStore::open(&config.data_dir())?;
            let dump = store.dump()?;
            if dump.is_empty() {
                println!("(no persisted state)");
            }
            for (key, value) in dump {
                println!("{:<20} {}", key, value);
            }
        }

        Some(Commands::Reset) => {
            let config = ShellConfig::load(&config_path);
            let store = FileStore::open(&config.data_dir())?;
            store.clear()?;
            println!("✓ Cleared persisted state");
        }

        Some(Commands::Version) => {
            println!("coopgate v{}", env!("CARGO_PKG_VERSION"));
        }

        // No subcommand = run
        None => {
            init_tracing();
            run(&config_path, None, None, None).await?;
        }
    }

    Ok(())
}

async fn run(
    config_path: &Path,
    attribution: Option<PathBuf>,
    consent: Option<ConsentChoice>,
    push: Option<String>,
) -> anyhow::Result<()> {
    let config = ShellConfig::load(config_path);
    let data_dir = config.data_dir();

    let store: Arc<dyn StateStore> = Arc::new(FileStore::open(&data_dir)?);
    let cookies = Arc::new(CookieStore::open(&data_dir)?);

    if let Some(raw) = push {
        let payload: serde_json::Value =
            serde_json::from_str(&raw).context("push payload is not JSON")?;
        coopgate_net::push::ingest(store.as_ref(), &payload)?;
    }

    let ctx = QueryContext::from_config(&config, install_id(&data_dir)?);
    let setup = Arc::new(HttpSetupClient::new(
        config.endpoint.setup_url.clone(),
        cookies.clone(),
    ));
    let delegate: Arc<dyn ConsentDelegate> = match consent {
        Some(choice) => Arc::new(AutoConsent(choice.into())),
        None => Arc::new(TerminalConsent),
    };

    let handle = LaunchRouter::spawn(store.clone(), setup, delegate, ctx);

    // Reachability transitions feed the router for as long as it runs.
    let cancel = CancellationToken::new();
    let (link_tx, mut link_rx) = mpsc::channel(8);
    tokio::spawn(ConnectivityMonitor::new(&config.probe).run(link_tx, cancel.clone()));
    let link_handle = handle.clone();
    tokio::spawn(async move {
        while let Some(state) = link_rx.recv().await {
            if link_handle.send(RouterEvent::Link(state)).await.is_err() {
                break;
            }
        }
    });

    // One-shot attribution signal.
    let source = FileAttribution::new(
        attribution.unwrap_or_else(|| data_dir.join("attribution.json")),
    );
    let attribution_handle = handle.clone();
    tokio::spawn(async move {
        let payload = source.resolve().await;
        let _ = attribution_handle
            .send(RouterEvent::Attribution(payload))
            .await;
    });

    // Present each phase as it lands; stop at the terminal decision.
    let preview = SurfacePreview::new(cookies, &config.surface)?;
    let mut phases = handle.phases();
    loop {
        let phase = phases.borrow_and_update().clone();
        present(&phase, store.as_ref(), &preview, &data_dir).await;
        if phase.is_terminal() {
            break;
        }
        if phases.changed().await.is_err() {
            break;
        }
    }

    cancel.cancel();
    Ok(())
}

async fn present(
    phase: &DisplayPhase,
    store: &dyn StateStore,
    preview: &SurfacePreview,
    data_dir: &Path,
) {
    match phase {
        DisplayPhase::Hatching => {
            println!("🐣 hatching…");
        }
        DisplayPhase::StrayOffline => {
            println!("📡 You appear to be offline. Waiting for the network to return…");
        }
        DisplayPhase::NestFallback => {
            let today = chrono::Local::now().date_naive();
            let log = flock::FlockLog::load(&data_dir.join("flock.json"));
            print!("{}", log.render(today));
        }
        DisplayPhase::StatsDisplay(dest) => {
            let last_good = store
                .saved_destination()
                .ok()
                .flatten()
                .map(|d| d.url)
                .filter(|url| url != &dest.url);
            match preview.fetch(&dest.url, last_good.as_deref()).await {
                Ok(page) => {
                    if page.fell_back {
                        println!("↩ showing last good page instead");
                    }
                    println!(
                        "🌐 {} (status {}, {} redirects)",
                        page.final_url, page.status, page.redirects
                    );
                }
                Err(e) => {
                    warn!("Preview fetch failed: {}", e);
                    println!("🌐 {} (content unavailable right now)", dest.url);
                }
            }
        }
    }
}

/// Stable per-install identifier, minted on first run.
fn install_id(data_dir: &Path) -> anyhow::Result<String> {
    let path = data_dir.join("install_id");
    if let Ok(id) = std::fs::read_to_string(&path) {
        let id = id.trim().to_string();
        if !id.is_empty() {
            return Ok(id);
        }
    }
    let id = uuid::Uuid::new_v4().to_string();
    std::fs::create_dir_all(data_dir)?;
    std::fs::write(&path, &id)?;
    Ok(id)
}
