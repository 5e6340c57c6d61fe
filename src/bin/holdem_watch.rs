use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::{watch, Notify};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use holdem_client::cards::{format_cards, reveal_hole_cards, HoleCards};
use holdem_client::ledger::{RestLedgerClient, SecretBytes, TableCall};
use holdem_client::poller::TablePoller;
use holdem_client::secret::{
    commit_hash, generate_secret, reveal_payload, FileKeyValueStore, SecretStore,
};
use holdem_client::table::{Address, GateContext, LifecycleLegals, LocalIdentity, TableSnapshot};
use holdem_client::ClientConfig;

const LOG_TARGET: &str = "bin::holdem_watch";

#[derive(Debug, Parser)]
#[command(name = "holdem_watch")]
#[command(about = "Follow a hold'em table and manage the local reveal secret", long_about = None)]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "HOLDEM_LOG_JSON", default_value_t = false, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ClientArgs {
    /// Fullnode REST root, e.g. http://127.0.0.1:8080/v1
    #[arg(long, env = "HOLDEM_NODE_URL")]
    node_url: Option<String>,

    /// Account the table module is published under
    #[arg(long, env = "HOLDEM_MODULE_ADDRESS")]
    module_address: Option<String>,

    #[arg(long, env = "HOLDEM_MODULE_NAME")]
    module_name: Option<String>,

    #[arg(long, env = "HOLDEM_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Prefix of stored secret keys
    #[arg(long, env = "HOLDEM_SECRET_NAMESPACE")]
    secret_namespace: Option<String>,

    /// JSON file holding stored secrets
    #[arg(long, env = "HOLDEM_SECRET_STORE")]
    secret_store: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct Seat {
    /// Table object address
    #[arg(long, env = "HOLDEM_TABLE")]
    table: String,

    /// Local player's account address
    #[arg(long, env = "HOLDEM_PLAYER")]
    player: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll a table and log every snapshot
    Watch {
        #[command(flatten)]
        seat: Seat,
    },
    /// Print the entry-function payload for a lifecycle call, for an external wallet to sign
    Payload {
        #[command(flatten)]
        seat: Seat,
        #[arg(value_enum)]
        call: PayloadCall,
    },
    /// Manage the stored secret for a table and player
    Secret {
        #[command(flatten)]
        seat: Seat,
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PayloadCall {
    Start,
    Commit,
    Reveal,
    SitIn,
    SitOut,
    LeaveAfterHand,
    CancelLeave,
    Leave,
    Timeout,
}

#[derive(Debug, Subcommand)]
enum SecretAction {
    Get,
    Set { value: String },
    Generate,
    Clear,
    /// Show the commit hash of the stored secret
    Hash,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json)?;
    let config = build_config(&cli.client);

    match cli.command {
        Command::Watch { seat } => run_watch(&config, seat).await,
        Command::Payload { seat, call } => print_payload(&config, seat, call),
        Command::Secret { seat, action } => run_secret(&config, seat, action),
    }
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

fn build_config(args: &ClientArgs) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(url) = &args.node_url {
        config.node_url = url.clone();
    }
    if let Some(address) = &args.module_address {
        config.module_address = address.clone();
    }
    if let Some(name) = &args.module_name {
        config.module_name = name.clone();
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(namespace) = &args.secret_namespace {
        config.secret_namespace = namespace.clone();
    }
    if let Some(path) = &args.secret_store {
        config.secret_store_path = path.clone();
    }
    config
}

fn open_secrets(config: &ClientConfig) -> SecretStore {
    SecretStore::with_namespace(
        Arc::new(FileKeyValueStore::new(&config.secret_store_path)),
        config.secret_namespace.clone(),
    )
}

fn require_player(seat: &Seat) -> Result<Address> {
    seat.player
        .as_deref()
        .map(Address::from)
        .ok_or_else(|| anyhow!("--player (or HOLDEM_PLAYER) is required for this command"))
}

async fn run_watch(config: &ClientConfig, seat: Seat) -> Result<()> {
    config.validate().context("invalid client config")?;
    let node_url = config.node_url()?;
    let reader = RestLedgerClient::new(&node_url, config.module()?)
        .context("failed to build ledger client")?;
    let table = Address::new(seat.table);
    let identity = seat
        .player
        .map(LocalIdentity::connected)
        .unwrap_or_default();
    let secrets = open_secrets(config);

    let (publish, mut snapshots) = watch::channel(Arc::new(TableSnapshot::empty(table.clone())));
    let poller = TablePoller::spawn(
        Arc::new(reader),
        table.clone(),
        config.poll_interval(),
        publish,
        Arc::new(Notify::new()),
    )
    .context("failed to start table poller")?;
    info!(target = LOG_TARGET, %table, node = %node_url, "watching table");

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!(target = LOG_TARGET, %table, "poller exited");
                    break;
                }
                let snapshot = Arc::clone(&snapshots.borrow_and_update());
                report(&snapshot, &identity, &secrets);
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                break;
            }
        }
    }

    poller.stop().await;
    Ok(())
}

fn report(snapshot: &TableSnapshot, identity: &LocalIdentity, secrets: &SecretStore) {
    let game = &snapshot.game;
    let acting = game
        .action_on
        .as_ref()
        .map(|on| format!("seat {} ({})", on.seat_index + 1, on.player_address.short()))
        .unwrap_or_else(|| "-".to_string());
    let deadline = game
        .action_on
        .as_ref()
        .and_then(|on| on.deadline_at())
        .map(|at| at.to_string())
        .unwrap_or_else(|| "-".to_string());

    info!(
        target = LOG_TARGET,
        table = %snapshot.table,
        hand = snapshot.state.hand_number,
        phase = game.phase.name(),
        pot = game.pot_size,
        board = %format_cards(&game.community_cards),
        acting = %acting,
        deadline = %deadline,
        paused = snapshot.paused,
        "{}",
        game.phase.description()
    );

    let Some(player) = identity.address.as_ref() else {
        return;
    };
    let secret = secrets.get(&snapshot.table, player);
    let legals = LifecycleLegals::evaluate(&GateContext {
        snapshot,
        identity,
        secret: &secret,
        action_pending: false,
    });
    let hole = match snapshot.seat_of(player) {
        Some(seat) => reveal_hole_cards(game.phase, &snapshot.hole_cards, seat, &secret),
        None => HoleCards::Hidden,
    };
    info!(
        target = LOG_TARGET,
        seat = ?snapshot.seat_of(player),
        hole = %hole,
        your_turn = legals.action_on_local,
        may_start = legals.may_start_hand,
        may_commit = legals.may_commit,
        may_reveal = legals.may_reveal,
        has_secret = !secret.is_empty(),
        "local player"
    );
}

fn print_payload(config: &ClientConfig, seat: Seat, call: PayloadCall) -> Result<()> {
    let module = config.module().context("module address is required")?;
    let table = Address::new(seat.table.clone());
    let secret = || -> Result<String> {
        let player = require_player(&seat)?;
        let secret = open_secrets(config).get(&table, &player);
        if secret.is_empty() {
            return Err(anyhow!("no secret stored for this table and player"));
        }
        Ok(secret)
    };

    let call = match call {
        PayloadCall::Start => TableCall::StartHand,
        PayloadCall::Commit => {
            let hash = commit_hash(&secret()?).ok_or_else(|| anyhow!("empty secret"))?;
            TableCall::SubmitCommit { hash }
        }
        PayloadCall::Reveal => TableCall::RevealSecret {
            secret: SecretBytes::new(reveal_payload(&secret()?)),
        },
        PayloadCall::SitIn => TableCall::SitIn,
        PayloadCall::SitOut => TableCall::SitOut,
        PayloadCall::LeaveAfterHand => TableCall::LeaveAfterHand,
        PayloadCall::CancelLeave => TableCall::CancelLeaveAfterHand,
        PayloadCall::Leave => TableCall::LeaveTable,
        PayloadCall::Timeout => TableCall::HandleTimeout,
    };
    let payload = call.payload(&module, &table);
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to encode payload")?
    );
    Ok(())
}

fn run_secret(config: &ClientConfig, seat: Seat, action: SecretAction) -> Result<()> {
    let player = require_player(&seat)?;
    let table = Address::new(seat.table);
    let secrets = open_secrets(config);

    match action {
        SecretAction::Get => {
            let secret = secrets.get(&table, &player);
            if secret.is_empty() {
                return Err(anyhow!("no secret stored for this table and player"));
            }
            println!("{secret}");
        }
        SecretAction::Set { value } => {
            if !secrets.set(&table, &player, &value) {
                return Err(anyhow!("failed to store secret"));
            }
            info!(target = LOG_TARGET, %table, "secret stored");
        }
        SecretAction::Generate => {
            let secret = generate_secret();
            println!("{secret}");
            if !secrets.set(&table, &player, &secret) {
                return Err(anyhow!("failed to store secret; copy it before it is lost"));
            }
            info!(
                target = LOG_TARGET,
                %table,
                "Generated a new secret. Keep it safe for reveal phase."
            );
        }
        SecretAction::Clear => {
            if !secrets.clear(&table, &player) {
                return Err(anyhow!("failed to clear stored secret"));
            }
            info!(target = LOG_TARGET, %table, "secret cleared");
        }
        SecretAction::Hash => {
            let hash = commit_hash(&secrets.get(&table, &player))
                .ok_or_else(|| anyhow!("no secret stored for this table and player"))?;
            println!("{hash}");
        }
    }
    Ok(())
}
