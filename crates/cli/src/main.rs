use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use rescat_api::{CatalogBackend, CatalogClient};
use rescat_engine::{
    BaseInfoLookups, FieldIntake, StepOutcome, Wizard, WizardSession, load_draft, load_raw_fields, load_session,
    mount_and_discover, plan_submission, reconcile, save_draft, submit,
};
use rescat_types::{BackingResource, ResourceType};
use rescat_util::{ConsoleConfig, expand_tilde, load_config, load_config_from_path};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "rescat", version, about = "Resource catalog wizard for the data governance console")]
struct Cli {
    /// Configuration file, defaults to $RESCAT_CONFIG_PATH or the user config directory.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an existing catalog entry into a draft file for editing.
    Load {
        catalog_id: String,
        /// Draft file to write, JSON or YAML by extension.
        #[arg(long)]
        out: PathBuf,
        /// Re-discover the mounted resources' fields into the draft.
        #[arg(long)]
        discover: bool,
    },
    /// Validate every wizard step of a draft.
    Validate { draft: PathBuf },
    /// Merge a raw field list into a draft's information items.
    Reconcile {
        draft: PathBuf,
        /// Field list as JSON or YAML, bare or wrapped in `entries`.
        #[arg(long)]
        fields: PathBuf,
        #[arg(long, value_enum)]
        intake: Option<IntakeArg>,
        /// Write the merged items back into the draft.
        #[arg(long)]
        write: bool,
    },
    /// Show the payload and backend call a submission would use.
    Plan {
        draft: PathBuf,
        /// Plan a staged draft instead of a full submission.
        #[arg(long)]
        stage: bool,
    },
    /// Submit a draft to the backend.
    Submit {
        draft: PathBuf,
        #[arg(long)]
        stage: bool,
    },
    /// Discover the fields of a backing resource.
    Fields {
        #[arg(long)]
        resource: String,
        #[arg(long = "type")]
        resource_type: ResourceType,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IntakeArg {
    Import,
    Modify,
    MappingOnly,
}

impl From<IntakeArg> for FieldIntake {
    fn from(value: IntakeArg) -> Self {
        match value {
            IntakeArg::Import => FieldIntake::Import,
            IntakeArg::Modify => FieldIntake::Modify,
            IntakeArg::MappingOnly => FieldIntake::MappingOnly,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from_path(&expand_tilde(path)),
        None => load_config(),
    }
    .context("failed to load configuration")?;

    match cli.command {
        Command::Load {
            catalog_id,
            out,
            discover,
        } => run_load(&config, &catalog_id, out, discover).await,
        Command::Validate { draft } => run_validate(&config, draft),
        Command::Reconcile {
            draft,
            fields,
            intake,
            write,
        } => run_reconcile(&config, draft, fields, intake.map(FieldIntake::from), write),
        Command::Plan { draft, stage } => run_plan(&config, draft, stage),
        Command::Submit { draft, stage } => run_submit(&config, draft, stage).await,
        Command::Fields {
            resource,
            resource_type,
        } => run_fields(&config, resource, resource_type).await,
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Loads a draft and applies the configured rule switches on top of it.
fn open_session(config: &ConsoleConfig, path: &Path) -> Result<WizardSession> {
    let draft = load_draft(path)?;
    let mut session = WizardSession::from(draft);
    session.government |= config.government_mode;
    session.primary_required |= config.primary_required;
    Ok(session)
}

fn client(config: &ConsoleConfig) -> Result<CatalogClient> {
    CatalogClient::from_env(&config.api_base, config.request_timeout()).context("failed to build API client")
}

/// Runs every step gate in order, stopping at the first blocked step.
fn walk(session: &mut WizardSession, mut wizard: Wizard) -> StepOutcome {
    loop {
        match wizard.next(session, Utc::now()) {
            StepOutcome::Advanced { .. } => continue,
            outcome => return outcome,
        }
    }
}

fn run_validate(config: &ConsoleConfig, path: PathBuf) -> Result<ExitCode> {
    let mut session = open_session(config, &path)?;
    let context = session.validation_context();
    let report = session.table.validate(&context);
    let navigator = report.navigator();
    let outcome = walk(&mut session, Wizard::new());

    print_json(&serde_json::json!({
        "items": report,
        "errors": navigator.locations(),
        "wizard": outcome,
    }))?;
    Ok(if outcome == StepOutcome::Ready {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_load(config: &ConsoleConfig, catalog_id: &str, out: PathBuf, discover: bool) -> Result<ExitCode> {
    let backend = client(config)?;
    let mut session = load_session(&backend, catalog_id, config.government_mode, config.primary_required)
        .await
        .with_context(|| format!("failed to load catalog {catalog_id}"))?;

    if discover {
        let resources = session.mount_resources().to_vec();
        let outcome = mount_and_discover(&mut session, &backend, resources)
            .await
            .context("failed to discover mounted resource fields")?;
        info!(?outcome, "refreshed fields from mounted resources");
    }

    save_draft(&out, &session.to_draft())?;
    info!(path = %out.display(), "wrote draft");
    print_json(&serde_json::json!({
        "catalog_id": session.catalog_id,
        "publish_status": session.publish_status,
        "rows": session.table.len(),
        "mount_resources": session.mount_resources(),
    }))?;
    Ok(ExitCode::SUCCESS)
}

fn run_reconcile(
    config: &ConsoleConfig,
    path: PathBuf,
    fields_path: PathBuf,
    intake: Option<FieldIntake>,
    write: bool,
) -> Result<ExitCode> {
    let mut session = open_session(config, &path)?;
    let fields = load_raw_fields(&fields_path)?;
    let intake = intake.unwrap_or_else(|| session.field_intake());
    let merged = reconcile(&fields, session.table.items(), &session.persisted_columns, intake);
    print_json(&merged)?;

    if write {
        session.table.replace_items(merged.items);
        session.raw_fields = fields;
        save_draft(&path, &session.to_draft())?;
        info!(path = %path.display(), "updated draft");
    }
    Ok(ExitCode::SUCCESS)
}

fn run_plan(config: &ConsoleConfig, path: PathBuf, stage: bool) -> Result<ExitCode> {
    let session = open_session(config, &path)?;
    let plan = if stage {
        Wizard::new().stage(&session)?
    } else {
        plan_submission(&session, false)
    };
    print_json(&plan)?;
    Ok(ExitCode::SUCCESS)
}

async fn run_submit(config: &ConsoleConfig, path: PathBuf, stage: bool) -> Result<ExitCode> {
    let mut session = open_session(config, &path)?;
    let backend = client(config)?;

    let plan = if stage {
        Wizard::new().stage(&session)?
    } else {
        let mut wizard = Wizard::new();
        if let Some(lookups) = fetch_lookups(&backend).await {
            wizard = wizard.with_lookups(lookups);
        }
        let outcome = walk(&mut session, wizard);
        if outcome != StepOutcome::Ready {
            print_json(&outcome)?;
            return Ok(ExitCode::FAILURE);
        }
        plan_submission(&session, false)
    };

    match submit(&backend, &plan).await {
        Ok(receipt) => {
            print_json(&receipt)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            print_json(&error.notice)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Lookup trees for reference checks. Reference checks are skipped when either tree fails to load.
async fn fetch_lookups(backend: &dyn CatalogBackend) -> Option<BaseInfoLookups> {
    match tokio::join!(backend.fetch_grade_labels(), backend.fetch_department_tree()) {
        (Ok(grades), Ok(departments)) => Some(BaseInfoLookups { grades, departments }),
        (Err(error), _) | (_, Err(error)) => {
            warn!(%error, "failed to load lookup trees; skipping reference checks");
            None
        }
    }
}

async fn run_fields(config: &ConsoleConfig, resource_id: String, resource_type: ResourceType) -> Result<ExitCode> {
    let backend = client(config)?;
    if resource_type == ResourceType::File {
        let metadata = backend.fetch_file_metadata(&resource_id).await?;
        print_json(&metadata)?;
        return Ok(ExitCode::SUCCESS);
    }
    let resource = BackingResource::new(resource_id, resource_type, "");
    let fields = backend.fetch_resource_fields(&resource).await?;
    print_json(&fields)?;
    Ok(ExitCode::SUCCESS)
}
