//! Pioneer Reputation CLI: `prep` command.
//!
//! Provides a command-line interface for checking in, claiming bonuses,
//! merging points, syncing wallet activity, and inspecting scores. State is
//! kept as JSON files under the data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use pioneer_reputation::api::{self, ReputationRequest};
use pioneer_reputation::time::millis_to_rfc3339;
use pioneer_reputation::{
    ActionResult, EngineConfig, JsonFileStore, PioneerId, RulesRegistry, SyncResult,
    UnifiedScore, UnifiedScoreService, UserReputationState, WalletActivityData,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --data-dir")?;
    Ok(PathBuf::from(home).join(".pioneer").join("reputation"))
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {what} in {}", path.display()))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Pioneer Reputation CLI: check in, merge points, sync wallets, and inspect
/// reputation scores.
#[derive(Parser, Debug)]
#[command(
    name = "prep",
    about = "Pioneer Reputation CLI",
    version,
    long_about = "prep: Pioneer Reputation CLI\n\nCheck in daily, claim ad bonuses, merge points, sync wallet activity,\nand inspect unified reputation scores."
)]
struct Cli {
    /// Pioneer uid to act on
    #[arg(long, global = true)]
    uid: Option<String>,

    /// Directory holding state files (default: ~/.pioneer/reputation)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a pioneer's state and unified score
    Get,

    /// Show whether the pioneer can check in now
    Status,

    /// Show recent score events, newest first
    History {
        /// Maximum number of events
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Perform today's check-in
    CheckIn,

    /// Claim the ad bonus for the current check-in
    ClaimAd,

    /// Merge pending check-in points into the reputation score
    Merge {
        /// Points to merge (default: everything pending)
        #[arg(long)]
        points: Option<u64>,
    },

    /// Fold a wallet activity snapshot (JSON file) into the blockchain score
    Sync {
        /// Path to a wallet activity JSON file
        #[arg(long)]
        activity: PathBuf,

        /// Wallet address to record
        #[arg(long)]
        wallet: Option<String>,
    },

    /// Apply a state document (JSON file): wallet address and reputation score
    Save {
        /// Path to a state JSON file
        #[arg(long)]
        state: PathBuf,
    },

    /// Set the reputation score explicitly, recording an audited correction
    Correct {
        /// New reputation score
        #[arg(long)]
        score: u64,

        /// Why the score is being corrected
        #[arg(long)]
        note: String,
    },

    /// List stored pioneers
    List,

    /// List the scoring rule catalog
    Rules,

    /// Show the level table, or the level for one score
    Levels {
        /// Score to place in the table
        #[arg(long)]
        score: Option<i64>,
    },

    /// Run a raw JSON request (e.g. '{"action":"checkIn","uid":"p1"}')
    Request {
        /// Request body
        body: String,
    },
}

impl Commands {
    fn needs_uid(&self) -> bool {
        !matches!(
            self,
            Commands::Save { .. }
                | Commands::List
                | Commands::Rules
                | Commands::Levels { .. }
                | Commands::Request { .. }
        )
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

struct Session {
    service: UnifiedScoreService,
    durable: Arc<JsonFileStore>,
    uid: PioneerId,
    json: bool,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn open_session(cli: &Cli) -> Result<Session> {
    let config = load_config(cli.config.as_deref())?;
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    let durable = Arc::new(
        JsonFileStore::new(data_dir.join("state"))
            .with_context(|| format!("failed to open state directory under {}", data_dir.display()))?,
    );
    let cache = Arc::new(
        JsonFileStore::new(data_dir.join("cache"))
            .with_context(|| format!("failed to open cache directory under {}", data_dir.display()))?,
    );
    log::debug!("using data directory {}", data_dir.display());

    let service = UnifiedScoreService::new(config, durable.clone(), cache)
        .context("invalid engine configuration")?;

    let uid = PioneerId::new(cli.uid.clone().unwrap_or_default());
    if cli.command.needs_uid() && uid.is_blank() {
        return Err(anyhow!("--uid is required for this command"));
    }

    Ok(Session {
        service,
        durable,
        uid,
        json: cli.json,
    })
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Commands that need no storage
    match &cli.command {
        Commands::Rules => return cmd_rules(load_config(cli.config.as_deref())?, cli.json),
        Commands::Levels { score } => {
            return cmd_levels(load_config(cli.config.as_deref())?, *score, cli.json)
        }
        _ => {}
    }

    let ctx = open_session(&cli)?;
    match cli.command {
        Commands::Get => cmd_get(&ctx).await,
        Commands::Status => cmd_status(&ctx).await,
        Commands::History { limit } => cmd_history(&ctx, limit).await,
        Commands::CheckIn => {
            let result = ctx.service.check_in(&ctx.uid).await;
            print_action(&ctx, &result)
        }
        Commands::ClaimAd => {
            let result = ctx.service.claim_ad_bonus(&ctx.uid).await;
            print_action(&ctx, &result)
        }
        Commands::Merge { points } => {
            let result = ctx.service.merge_checkin_points(&ctx.uid, points).await;
            print_action(&ctx, &result)
        }
        Commands::Sync { activity, wallet } => cmd_sync(&ctx, &activity, wallet).await,
        Commands::Save { state } => cmd_save(&ctx, &state).await,
        Commands::Correct { score, note } => {
            let result = ctx.service.correct_score(&ctx.uid, score, &note).await;
            print_action(&ctx, &result)
        }
        Commands::List => cmd_list(&ctx).await,
        Commands::Rules | Commands::Levels { .. } => Ok(()),
        Commands::Request { body } => cmd_request(&ctx, &body).await,
    }
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

fn print_state_summary(state: &UserReputationState) {
    println!("  Streak:        {} (longest {})", state.streak, state.longest_streak);
    println!("  Check-in days: {}", state.total_checkin_days);
    println!(
        "  Points:        {} pending, {} merged, {} blockchain",
        state.daily_checkin_points, state.merged_checkin_points, state.blockchain_score
    );
    println!("  Reputation:    {}", state.reputation_score);
    if let Some(last) = state.last_checkin {
        println!("  Last check-in: {}", millis_to_rfc3339(last));
    }
}

fn print_action(ctx: &Session, result: &ActionResult) -> Result<()> {
    if ctx.json {
        return print_json(result);
    }
    match &result.reason {
        None => println!(
            "{}: {:+} points ({:?})",
            result.action, result.points_earned, result.persistence
        ),
        Some(reason) => println!("{}: refused ({}): {reason}", result.action, reason.code()),
    }
    println!(
        "  Unified score: {} (level {} {}, {}% to next)",
        result.unified.total,
        result.unified.level.level,
        result.unified.level.rank,
        result.unified.level.progress_percent
    );
    print_state_summary(&result.state);
    Ok(())
}

// ── Command implementations ───────────────────────────────────────────────────

/// `prep get --uid UID`
async fn cmd_get(ctx: &Session) -> Result<()> {
    let loaded = ctx
        .service
        .load_state(&ctx.uid)
        .await
        .context("failed to load state")?;
    let unified = UnifiedScore::compose(&loaded.state, &ctx.service.config().levels);

    if ctx.json {
        return print_json(&serde_json::json!({
            "isNew": loaded.is_new,
            "source": loaded.source,
            "state": loaded.state,
            "unified": unified,
        }));
    }

    println!("Pioneer: {}", ctx.uid);
    if loaded.is_new {
        println!("  (no stored state yet)");
    }
    println!(
        "  Unified score: {} / {}",
        unified.total,
        ctx.service.config().levels.cap()
    );
    println!(
        "  Level:         {} {} ({}%, {} to next)",
        unified.level.level,
        unified.level.rank,
        unified.level.progress_percent,
        unified.level.points_to_next
    );
    if let Some(wallet) = &loaded.state.wallet_address {
        println!("  Wallet:        {wallet}");
    }
    print_state_summary(&loaded.state);
    Ok(())
}

/// `prep status --uid UID`
async fn cmd_status(ctx: &Session) -> Result<()> {
    let status = ctx.service.check_in_status(&ctx.uid).await?;
    if ctx.json {
        return print_json(&status);
    }
    if status.can_check_in {
        println!("Check-in open");
    } else {
        println!("Next check-in in {}", status.countdown);
    }
    println!("  Current streak: {}", status.current_streak);
    if let Some(date) = &status.last_checkin_date {
        println!("  Last check-in:  {date}");
    }
    println!(
        "  Ad bonus:       {}",
        if status.ad_bonus_available {
            "available"
        } else {
            "unavailable"
        }
    );
    Ok(())
}

/// `prep history --uid UID [--limit N]`
async fn cmd_history(ctx: &Session, limit: Option<usize>) -> Result<()> {
    let events = ctx.service.history(&ctx.uid, limit).await?;
    if ctx.json {
        return print_json(&events);
    }
    if events.is_empty() {
        println!("No events for {}", ctx.uid);
        return Ok(());
    }
    println!("{:<27} {:<36} {:>8}", "WHEN", "RULE", "POINTS");
    println!("{}", "-".repeat(73));
    for event in &events {
        println!(
            "{:<27} {:<36} {:>+8}",
            millis_to_rfc3339(event.timestamp),
            event.rule_id.as_str(),
            event.points
        );
    }
    Ok(())
}

/// `prep sync --uid UID --activity FILE [--wallet ADDR]`
async fn cmd_sync(ctx: &Session, activity_path: &Path, wallet: Option<String>) -> Result<()> {
    let activity: WalletActivityData = read_json_file(activity_path, "wallet activity")?;
    let result: SyncResult = ctx
        .service
        .sync_blockchain_data(&ctx.uid, wallet, &activity)
        .await;
    if ctx.json {
        return print_json(&result);
    }
    println!(
        "Blockchain score: {} ({} component change(s))",
        result.atomic.adjusted_score, result.events_appended
    );
    for (name, points) in result.atomic.components() {
        println!("  {name:<36} {points:>+6}");
    }
    print_action(ctx, &result.result)
}

/// `prep save --state FILE`
async fn cmd_save(ctx: &Session, state_path: &Path) -> Result<()> {
    let state: UserReputationState = read_json_file(state_path, "state")?;
    let result = ctx.service.save_state(state).await;
    print_action(ctx, &result)
}

/// `prep list`
async fn cmd_list(ctx: &Session) -> Result<()> {
    let uids = ctx.durable.list().await.context("failed to list stored states")?;
    if ctx.json {
        return print_json(&uids);
    }
    if uids.is_empty() {
        println!("No pioneers stored in {}", ctx.durable.base_dir().display());
        return Ok(());
    }
    for uid in uids {
        println!("{uid}");
    }
    Ok(())
}

/// `prep rules`
fn cmd_rules(config: EngineConfig, json: bool) -> Result<()> {
    let registry: RulesRegistry = config.rules();
    if json {
        return print_json(&registry.iter().collect::<Vec<_>>());
    }
    println!(
        "{:<22} {:<11} {:>6} {:>6}  DESCRIPTION",
        "RULE", "CATEGORY", "BASE", "MAX"
    );
    println!("{}", "-".repeat(80));
    for rule in registry.iter() {
        let max = rule
            .max_points
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<22} {:<11} {:>6} {:>6}  {}",
            rule.id.as_str(),
            rule.category.as_tag(),
            rule.base_points,
            max,
            rule.description
        );
    }
    println!("Testnet multiplier: {}", registry.testnet_multiplier());
    Ok(())
}

/// `prep levels [--score N]`
fn cmd_levels(config: EngineConfig, score: Option<i64>, json: bool) -> Result<()> {
    if let Some(score) = score {
        let info = config.levels.level_for(score);
        if json {
            return print_json(&info);
        }
        println!(
            "Score {} → level {} {} ({}%, {} to next)",
            info.score, info.level, info.rank, info.progress_percent, info.points_to_next
        );
        return Ok(());
    }

    if json {
        return print_json(&config.levels);
    }
    println!("{:<6} {:<14} RANGE", "LEVEL", "RANK");
    for t in config.levels.thresholds() {
        println!("{:<6} {:<14} [{}, {})", t.level, t.rank, t.min_score, t.max_score);
    }
    Ok(())
}

/// `prep request BODY`
async fn cmd_request(ctx: &Session, body: &str) -> Result<()> {
    let request: ReputationRequest =
        serde_json::from_str(body).context("request is not a valid reputation request")?;
    let response = api::dispatch(&ctx.service, request).await;
    print_json(&response)
}
