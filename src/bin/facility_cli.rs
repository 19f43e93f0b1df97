use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use facility_registry::{
    auth::Actor,
    config,
    db::{self, DbPool},
    errors::ServiceError,
    services::facilities::{FacilityDetail, FacilityService, UpsertFacilityInput, UpsertResult},
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => handle_migrate(&context).await?,
        Commands::Upsert(args) => handle_upsert(&context, args, cli.json).await?,
        Commands::Show(args) => handle_show(&context, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "facility-cli", about = "Create, merge and inspect facility records", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a facility or merge into the matching one
    Upsert(UpsertArgs),
    /// Print a facility and its capacities
    Show(ShowArgs),
}

#[derive(Args)]
struct UpsertArgs {
    /// JSON file holding the facility payload
    #[arg(long)]
    payload: PathBuf,
    /// ID of the user performing the write
    #[arg(long)]
    actor: Uuid,
    /// Act with superuser privileges
    #[arg(long, action = ArgAction::SetTrue)]
    superuser: bool,
}

#[derive(Args)]
struct ShowArgs {
    id: Uuid,
}

async fn handle_migrate(context: &CliContext) -> Result<()> {
    db::run_migrations(&context.db)
        .await
        .context("failed to run migrations")?;
    println!("Migrations applied");
    Ok(())
}

async fn handle_upsert(context: &CliContext, args: UpsertArgs, json: bool) -> Result<()> {
    let raw = fs::read_to_string(&args.payload)
        .with_context(|| format!("failed to read payload {}", args.payload.display()))?;
    let input: UpsertFacilityInput =
        serde_json::from_str(&raw).context("payload is not a valid facility record")?;
    input.validate_normalized().map_err(ServiceError::from)?;

    let actor = Actor::new(args.actor, args.superuser);
    debug!(actor = %actor.id, superuser = actor.is_superuser, "submitting facility upsert");

    let result = context
        .facility_service()
        .upsert(input, &actor)
        .await
        .context("facility upsert failed")?;

    if json {
        print_json(&result)?;
    } else {
        render_upsert(&result);
    }
    Ok(())
}

async fn handle_show(context: &CliContext, args: ShowArgs, json: bool) -> Result<()> {
    let detail = context
        .facility_service()
        .get_facility(args.id)
        .await
        .with_context(|| format!("failed to load facility {}", args.id))?;

    if json {
        print_json(&detail)?;
    } else {
        render_facility(&detail);
    }
    Ok(())
}

struct CliContext {
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        if config.auto_migrate {
            db::run_migrations(&db_pool)
                .await
                .context("failed to run migrations")?;
        }

        Ok(Self {
            db: Arc::new(db_pool),
        })
    }

    fn facility_service(&self) -> FacilityService {
        FacilityService::new(self.db.clone())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_upsert(result: &UpsertResult) {
    println!("Facility {:?}", result.outcome);
    render_facility(&result.detail);
}

fn render_facility(detail: &FacilityDetail) {
    let facility = &detail.facility;
    println!(
        "- {} ({}) • {} • district {} • oxygen {} • phone {}",
        facility.name,
        facility.id,
        facility.facility_type,
        facility.district_id,
        facility.oxygen_capacity,
        facility.phone_number
    );
    for capacity in &detail.capacity {
        println!(
            "    {}: {}/{}",
            capacity.room_type, capacity.current_usage, capacity.total_capacity
        );
    }
}
