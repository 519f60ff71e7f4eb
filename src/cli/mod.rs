//! Command-line interface for evidra.
//!
//! Provides commands for submitting evidence and new versions, validating
//! pending versions, and inspecting history and criterion statistics.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::core::{
    EventBuffer, EvidenceStore, Journal, JournalLock, JsonlJournal, NewEvidence, NewVersion,
};
use crate::domain::{
    Actor, Attachment, Evidence, EvidenceType, MaturityContribution, Role, ValidationCriteria,
    ValidationInput, ValidationStatus,
};
use crate::intake::collect_attachment;

mod display;

/// evidra - Evidence lifecycle and RSSI validation
#[derive(Parser, Debug)]
#[command(name = "evidra")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Identity recorded on submissions and validations
    #[arg(long = "as", global = true, env = "EVIDRA_ACTOR", default_value = "anonymous")]
    pub actor: String,

    /// Role to act under
    #[arg(long, global = true, value_enum, env = "EVIDRA_ROLE", default_value = "department")]
    pub role: RoleArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a new evidence item (version 1)
    Submit {
        /// Framework criterion the evidence supports
        #[arg(short, long)]
        criterion: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Submitting department
        #[arg(long)]
        department: String,

        #[arg(long = "type", value_enum, default_value = "document")]
        evidence_type: EvidenceTypeArg,

        /// Maturity points (1-5) added to the criterion once approved
        #[arg(long, default_value = "1")]
        contribution: u8,

        /// Action plan item this evidence answers
        #[arg(long)]
        action_plan: Option<String>,

        #[arg(long)]
        change_log: Option<String>,

        /// Files to attach (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// Submit a new version of an existing evidence item
    Revise {
        /// Evidence ID (or unique prefix)
        evidence_id: String,

        /// What changed since the previous version
        #[arg(long)]
        change_log: String,

        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// Validate a pending version (rssi role)
    Validate {
        /// Evidence ID (or unique prefix)
        evidence_id: String,

        /// Version ID, ID prefix, or version number
        version: String,

        #[arg(short, long, value_enum)]
        status: DecisionArg,

        #[arg(long)]
        completeness: u8,

        #[arg(long)]
        relevance: u8,

        #[arg(long)]
        quality: u8,

        #[arg(long)]
        implementation: u8,

        #[arg(long, default_value = "")]
        remarks: String,

        /// Recommendation for the department (repeatable)
        #[arg(long = "recommendation")]
        recommendations: Vec<String>,

        /// Follow-up action (repeatable)
        #[arg(long = "next-action")]
        next_actions: Vec<String>,

        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// Show an evidence item with its latest version
    Show {
        /// Evidence ID (or unique prefix)
        evidence_id: String,
    },

    /// Show the version history of an evidence item, newest first
    History {
        /// Evidence ID (or unique prefix)
        evidence_id: String,
    },

    /// List evidence items
    List {
        /// Only evidence for this criterion
        #[arg(short, long)]
        criterion: Option<String>,

        /// Only evidence for this action plan item
        #[arg(long)]
        action_plan: Option<String>,
    },

    /// List versions awaiting validation
    Pending,

    /// Show counts and maturity gain for a criterion
    Stats {
        criterion_id: String,
    },

    /// Show store-wide counts
    Summary,

    /// Show resolved configuration (debug)
    Config,
}

/// Role for CLI (maps to Role)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Department,
    Rssi,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Department => Role::Department,
            RoleArg::Rssi => Role::Rssi,
        }
    }
}

/// Evidence type for CLI (maps to EvidenceType)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EvidenceTypeArg {
    Document,
    Screenshot,
    Certificate,
    Procedure,
    Other,
}

impl From<EvidenceTypeArg> for EvidenceType {
    fn from(t: EvidenceTypeArg) -> Self {
        match t {
            EvidenceTypeArg::Document => EvidenceType::Document,
            EvidenceTypeArg::Screenshot => EvidenceType::Screenshot,
            EvidenceTypeArg::Certificate => EvidenceType::Certificate,
            EvidenceTypeArg::Procedure => EvidenceType::Procedure,
            EvidenceTypeArg::Other => EvidenceType::Other,
        }
    }
}

/// Validation decision for CLI (maps to ValidationStatus)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DecisionArg {
    Approved,
    Rejected,
    RequiresModification,
}

impl From<DecisionArg> for ValidationStatus {
    fn from(d: DecisionArg) -> Self {
        match d {
            DecisionArg::Approved => ValidationStatus::Approved,
            DecisionArg::Rejected => ValidationStatus::Rejected,
            DecisionArg::RequiresModification => ValidationStatus::RequiresModification,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let actor = Actor::new(self.actor, self.role.into());

        match self.command {
            Commands::Submit {
                criterion,
                title,
                description,
                department,
                evidence_type,
                contribution,
                action_plan,
                change_log,
                attachments,
            } => {
                let contribution = MaturityContribution::new(contribution)?;
                let mut input = NewEvidence::new(
                    criterion,
                    title,
                    department,
                    evidence_type.into(),
                    contribution,
                )
                .with_description(description);
                input.action_plan_id = action_plan;
                input.change_log = change_log;
                input.attachments = collect_attachments(&attachments, &actor).await?;

                submit_evidence(&actor, input).await
            }
            Commands::Revise {
                evidence_id,
                change_log,
                attachments,
            } => {
                let mut input = NewVersion::new(change_log);
                input.attachments = collect_attachments(&attachments, &actor).await?;

                submit_version(&actor, &evidence_id, input).await
            }
            Commands::Validate {
                evidence_id,
                version,
                status,
                completeness,
                relevance,
                quality,
                implementation,
                remarks,
                recommendations,
                next_actions,
                attachments,
            } => {
                let input = ValidationInput {
                    status: status.into(),
                    criteria: ValidationCriteria::new(
                        completeness,
                        relevance,
                        quality,
                        implementation,
                    ),
                    remarks,
                    recommendations,
                    next_actions,
                    validation_attachments: collect_attachments(&attachments, &actor).await?,
                };

                validate_version(&actor, &evidence_id, &version, input).await
            }
            Commands::Show { evidence_id } => {
                let session = Session::read().await?;
                let id = resolve_evidence_id(&session.store, &evidence_id)?;
                display::show_evidence(session.evidence(id)?);
                Ok(())
            }
            Commands::History { evidence_id } => {
                let session = Session::read().await?;
                let id = resolve_evidence_id(&session.store, &evidence_id)?;
                display::show_history(session.evidence(id)?);
                Ok(())
            }
            Commands::List {
                criterion,
                action_plan,
            } => {
                let session = Session::read().await?;
                let items: Vec<&Evidence> = match (criterion.as_deref(), action_plan.as_deref()) {
                    (Some(c), _) => session.store.evidence_for_criterion(c),
                    (None, Some(p)) => session.store.evidence_for_action_plan(p),
                    (None, None) => session.store.evidence(),
                };
                display::list_evidence(&items);
                Ok(())
            }
            Commands::Pending => {
                let session = Session::read().await?;
                display::list_pending(&session.store.pending_validations());
                Ok(())
            }
            Commands::Stats { criterion_id } => {
                let session = Session::read().await?;
                display::show_stats(&session.store.criterion_stats(&criterion_id));
                Ok(())
            }
            Commands::Summary => {
                let session = Session::read().await?;
                display::show_summary(&session.store.summary());
                Ok(())
            }
            Commands::Config => show_config(),
        }
    }
}

/// A loaded store plus the journal it came from.
///
/// Write sessions hold the journal lock from replay until commit, so the
/// pending-status check in `validate_version` runs on current state.
struct Session {
    journal: JsonlJournal,
    store: EvidenceStore,
    buffer: EventBuffer,
    _lock: Option<JournalLock>,
}

impl Session {
    async fn open(lock: bool) -> Result<Self> {
        let config = crate::config::config()?;
        let journal = JsonlJournal::open(&config.journal)
            .await
            .with_context(|| format!("Failed to open journal: {}", config.journal.display()))?;

        let lock = if lock {
            Some(journal.lock().context("Failed to acquire journal lock")?)
        } else {
            None
        };

        let repository = journal
            .load_repository()
            .await
            .with_context(|| format!("Failed to replay journal: {}", journal.path().display()))?;

        let buffer = EventBuffer::new();
        let mut store =
            EvidenceStore::new(repository).with_default_change_log(&config.default_change_log);
        store.subscribe(buffer.clone());

        Ok(Self {
            journal,
            store,
            buffer,
            _lock: lock,
        })
    }

    async fn read() -> Result<Self> {
        Self::open(false).await
    }

    async fn write() -> Result<Self> {
        Self::open(true).await
    }

    fn evidence(&self, id: Uuid) -> Result<&Evidence> {
        self.store
            .get(id)
            .with_context(|| format!("Evidence not found: {}", id))
    }

    /// Persist the events raised since the session opened
    async fn commit(self) -> Result<()> {
        let events = self.buffer.drain();
        self.journal
            .append_all(&events)
            .await
            .context("Failed to append to journal")?;
        Ok(())
    }
}

async fn collect_attachments(paths: &[PathBuf], actor: &Actor) -> Result<Vec<Attachment>> {
    let policy = &crate::config::config()?.attachments;
    let mut attachments = Vec::with_capacity(paths.len());

    for path in paths {
        let attachment = collect_attachment(path, &actor.id, policy)
            .await
            .with_context(|| format!("Failed to attach {}", path.display()))?;
        attachments.push(attachment);
    }

    Ok(attachments)
}

async fn submit_evidence(actor: &Actor, input: NewEvidence) -> Result<()> {
    let mut session = Session::write().await?;
    let evidence = session.store.submit_evidence(actor, input)?;

    println!("Evidence submitted: {}", evidence.id);
    if let Some(latest) = evidence.latest() {
        println!("Version {} ({}) is pending validation", latest.version, latest.id);
    }

    session.commit().await
}

async fn submit_version(actor: &Actor, evidence_ref: &str, input: NewVersion) -> Result<()> {
    let mut session = Session::write().await?;
    let id = resolve_evidence_id(&session.store, evidence_ref)?;
    let version = session.store.submit_new_version(actor, id, input)?;

    println!(
        "Version {} ({}) submitted for evidence {}",
        version.version, version.id, id
    );

    session.commit().await
}

async fn validate_version(
    actor: &Actor,
    evidence_ref: &str,
    version_ref: &str,
    input: ValidationInput,
) -> Result<()> {
    let mut session = Session::write().await?;
    let id = resolve_evidence_id(&session.store, evidence_ref)?;
    let version_id = resolve_version_id(session.evidence(id)?, version_ref)?;

    let version = session.store.validate_version(actor, id, version_id, input)?;
    let score = version
        .rssi_validation
        .as_ref()
        .map(|v| v.overall_score)
        .unwrap_or_default();

    println!(
        "Version {} of evidence {} marked {} (overall score {}/10)",
        version.version, id, version.status, score
    );

    session.commit().await
}

/// Match a full evidence ID or a unique prefix of one
fn resolve_evidence_id(store: &EvidenceStore, reference: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(id);
    }

    let matches: Vec<Uuid> = store
        .evidence()
        .iter()
        .map(|e| e.id)
        .filter(|id| id.to_string().starts_with(reference))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => anyhow::bail!("Evidence not found: {}", reference),
        _ => anyhow::bail!("Ambiguous evidence ID prefix: {}", reference),
    }
}

/// Match a version by number ("2", "v2"), full ID, or unique ID prefix.
///
/// A reference that parses as a number is only ever a version number, never
/// an ID prefix.
fn resolve_version_id(evidence: &Evidence, reference: &str) -> Result<Uuid> {
    let number = reference.strip_prefix('v').unwrap_or(reference);
    if let Ok(number) = number.parse::<u32>() {
        return evidence
            .versions
            .iter()
            .find(|v| v.version == number)
            .map(|v| v.id)
            .with_context(|| format!("Version not found: v{}", number));
    }

    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(id);
    }

    let matches: Vec<Uuid> = evidence
        .versions
        .iter()
        .map(|v| v.id)
        .filter(|id| id.to_string().starts_with(reference))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => anyhow::bail!("Version not found: {}", reference),
        _ => anyhow::bail!("Ambiguous version reference: {}", reference),
    }
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let config = crate::config::config()?;

    println!("evidra configuration");
    println!("{}", "=".repeat(50));
    println!();

    if let Some(ref config_file) = config.config_file {
        println!("Config file: {}", config_file.display());
    } else {
        println!("Config file: (none found, using defaults)");
    }
    println!();

    println!("Paths:");
    println!("  Home:    {}", config.home.display());
    println!("  Journal: {}", config.journal.display());
    println!();

    println!("Evidence:");
    println!("  Default change log: {}", config.default_change_log);
    println!();

    println!("Attachments:");
    println!("  Max size: {} bytes", config.attachments.max_size_bytes);
    println!("  Denylist: {}", config.attachments.denylist_patterns.join(", "));
    println!();

    println!("Environment overrides:");
    if let Ok(home) = std::env::var("EVIDRA_HOME") {
        println!("  EVIDRA_HOME={}", home);
    }
    if let Ok(journal) = std::env::var("EVIDRA_JOURNAL") {
        println!("  EVIDRA_JOURNAL={}", journal);
    }

    Ok(())
}
