// Per-invocation plumbing shared by every command handler: configuration, the
// state store, the lazily built Drive client, and the async runtime.

use std::cell::OnceCell;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use gdoc_core::{
    evaluate, evaluate_detail, pre_flight, probe_conflict, ChangeReport, CommandClass, Decision,
    DocumentState, StateStore, StateUpdate,
};
use tracing::debug;

use crate::auth;
use crate::banner;
use crate::config::{self, GdocConfig};
use crate::drive::DriveClient;
use crate::exit_code::ConflictBlocked;
use crate::output::{self, OutputFormat};
use crate::GlobalArgs;

pub struct Session {
    pub format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    config_dir: PathBuf,
    config: GdocConfig,
    store: StateStore,
    client: OnceCell<DriveClient>,
    runtime: tokio::runtime::Runtime,
}

/// One command's view of a document: the record loaded before it ran and the
/// pre-flight report (absent in quiet mode).
#[derive(Debug)]
pub struct Interaction {
    pub doc_id: String,
    pub state: DocumentState,
    pub report: Option<ChangeReport>,
}

impl Session {
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let config_dir = config::config_dir().ok_or_else(|| {
            anyhow!("cannot determine home directory; set {}", config::CONFIG_DIR_ENV)
        })?;
        let config = GdocConfig::load(&config_dir);
        let store = StateStore::new(config.state_dir(&config_dir));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        debug!(config_dir = %config_dir.display(), state_dir = %store.root().display(), "session ready");

        Ok(Self {
            format: OutputFormat::detect(globals.json),
            quiet: globals.quiet,
            verbose: globals.verbose,
            config_dir,
            config,
            store,
            client: OnceCell::new(),
            runtime,
        })
    }

    /// The Drive client, built on first use so usage errors surface before
    /// credentials are looked up.
    pub fn client(&self) -> Result<&DriveClient> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let token = auth::load_access_token(&self.config_dir)?;
        let client = DriveClient::new(token, &self.config.api)?;
        Ok(self.client.get_or_init(|| client))
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Load the stored record and run pre-flight, printing the banner.
    pub fn begin(&self, doc_id: &str) -> Result<Interaction> {
        let state = self.store.load(doc_id);
        let report = if self.quiet {
            None
        } else {
            let client = self.client()?;
            self.block_on(pre_flight(client, doc_id, &state, false))?
        };
        if let Some(report) = &report {
            let banner = banner::render(report, Utc::now());
            let _ = std::io::stderr().lock().write_all(banner.as_bytes());
        }
        Ok(Interaction { doc_id: doc_id.to_string(), state, report })
    }

    /// Apply the conflict policy for `class`. Blocked writes fail with
    /// [`ConflictBlocked`]; warnings go to stderr.
    pub fn check_conflict(
        &self,
        interaction: &Interaction,
        class: CommandClass,
        force: bool,
    ) -> Result<()> {
        let decision = match &interaction.report {
            Some(report) => evaluate(Some(report), class, force),
            None => self.quiet_decision(interaction, class, force)?,
        };
        match decision {
            Decision::Proceed => Ok(()),
            Decision::ProceedWithWarning(_) => {
                output::print_warning("doc changed since last read");
                Ok(())
            }
            Decision::Blocked(reason) => Err(ConflictBlocked(reason).into()),
        }
    }

    /// Without a report only destructive writes are checked, and only with the
    /// single revision probe. A missing baseline blocks without any remote call.
    fn quiet_decision(
        &self,
        interaction: &Interaction,
        class: CommandClass,
        force: bool,
    ) -> Result<Decision> {
        if force || class != CommandClass::BlockOnConflict {
            return Ok(Decision::Proceed);
        }
        if interaction.state.last_read_version.is_none() {
            return Ok(evaluate_detail(None, class, force));
        }
        let client = self.client()?;
        let detail = self.block_on(probe_conflict(client, &interaction.doc_id, &interaction.state))?;
        Ok(evaluate_detail(Some(detail), class, force))
    }

    /// Persist the outcome of a successful command.
    pub fn finish(&self, interaction: Interaction, update: StateUpdate) -> Result<()> {
        self.store
            .apply_and_save(&interaction.doc_id, interaction.report.as_ref(), &update)
            .with_context(|| format!("failed to save state for {}", interaction.doc_id))?;
        Ok(())
    }
}
