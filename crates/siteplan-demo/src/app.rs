//! One planner run: either a store action (list, delete) or a plan built
//! from options, optionally saved, and rendered.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use siteplan_core::{Catalog, LayoutConfig};
use siteplan_layout::SequenceOutcome;
use siteplan_runtime::{
    DesignId, DesignRecord, DesignStore, FileBackend, PlannerSession, SessionError, StorageError,
};

use crate::cli::{Opts, OutputFormat};
use crate::render;

/// Failures surfaced to the user with exit code 1.
#[derive(Debug)]
pub enum AppError {
    Session(SessionError),
    Storage(StorageError),
    NoSavedDesigns(PathBuf),
    Render(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "{e}"),
            Self::NoSavedDesigns(path) => write!(f, "no saved designs in {}", path.display()),
            Self::Render(e) => write!(f, "failed to render output: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::NoSavedDesigns(_) => None,
            Self::Render(e) => Some(e),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Render(e)
    }
}

/// Layout parameters with command-line overrides applied.
#[must_use]
pub fn layout_config(opts: &Opts) -> LayoutConfig {
    let mut config = LayoutConfig::default();
    if let Some(width) = opts.max_row_width {
        config = config.with_max_row_width(width);
    }
    if opts.col_gap.is_some() || opts.row_gap.is_some() {
        config = config.with_gaps(
            opts.col_gap.unwrap_or(config.col_gap),
            opts.row_gap.unwrap_or(config.row_gap),
        );
    }
    config
}

/// The design store file: `--store`, else the per-user default.
#[must_use]
pub fn store_path(opts: &Opts) -> PathBuf {
    opts.store
        .clone()
        .unwrap_or_else(|| FileBackend::default_location().path().to_path_buf())
}

fn open_store(path: &Path) -> Result<DesignStore, AppError> {
    let store = DesignStore::with_file(path);
    let loaded = store.load()?;
    tracing::debug!(loaded, path = %path.display(), "design store opened");
    Ok(store)
}

/// Build the session described by `opts`.
pub fn build_session(opts: &Opts) -> Result<PlannerSession, AppError> {
    let catalog = Arc::new(Catalog::standard());
    let config = layout_config(opts);

    let start = if let Some(id) = opts.load_id {
        Some(design_by_id(&store_path(opts), id)?)
    } else if opts.load {
        Some(latest_design(&store_path(opts))?)
    } else {
        None
    };
    let mut session = match start {
        Some(record) => {
            tracing::info!(design = %record.name, id = ?record.id, "loaded design");
            PlannerSession::from_design(catalog, config, &record)?
        }
        None => PlannerSession::new(catalog, config)?,
    };

    if opts.manual {
        session.set_auto_pack(false);
    }
    for (id, quantity) in &opts.quantities {
        let stored = session.set_quantity(id, *quantity)?;
        if stored != *quantity {
            tracing::warn!(unit = %id, requested = quantity, stored, "quantity adjusted");
        }
    }
    for operation in &opts.moves {
        if let SequenceOutcome::Unchanged(reason) = session.apply(operation) {
            tracing::warn!(?operation, ?reason, "reorder skipped");
        }
    }
    session.set_scroll_top(opts.scroll_top);
    Ok(session)
}

fn latest_design(path: &Path) -> Result<DesignRecord, AppError> {
    open_store(path)?
        .latest()
        .ok_or_else(|| AppError::NoSavedDesigns(path.to_path_buf()))
}

fn design_by_id(path: &Path, id: DesignId) -> Result<DesignRecord, AppError> {
    open_store(path)?
        .get(id)
        .ok_or_else(|| StorageError::NotFound(id).into())
}

/// Saved designs in the store file at `path`, newest first.
pub fn list_designs(path: &Path) -> Result<Vec<DesignRecord>, AppError> {
    Ok(open_store(path)?.list())
}

/// Remove one design from the store file at `path`.
pub fn delete_design(path: &Path, id: DesignId) -> Result<DesignRecord, AppError> {
    let store = open_store(path)?;
    let removed = store.delete(id)?;
    let _ = store.flush()?;
    tracing::info!(id = id.get(), name = %removed.name, path = %path.display(), "design deleted");
    Ok(removed)
}

/// Append the session as a new design in the store file at `path`.
pub fn save_design(session: &PlannerSession, name: &str, path: &Path) -> Result<DesignId, AppError> {
    let store = open_store(path)?;
    let id = store.save(session.to_design(name))?;
    let _ = store.flush()?;
    tracing::info!(id = id.get(), name, path = %path.display(), "design saved");
    Ok(id)
}

/// Run the planner and return the text to print.
///
/// `--delete` and `--list` act on the store and skip planning; when both
/// are given the listing reflects the deletion.
pub fn run(opts: &Opts) -> Result<String, AppError> {
    if opts.delete.is_some() || opts.list {
        let path = store_path(opts);
        let mut output = String::new();
        if let Some(id) = opts.delete {
            let removed = delete_design(&path, id)?;
            let _ = writeln!(output, "deleted design {id} ({})", removed.name);
        }
        if opts.list {
            output.push_str(&render::design_list(&list_designs(&path)?));
        }
        return Ok(output);
    }

    let session = build_session(opts)?;

    if opts.save {
        let _ = save_design(&session, &opts.name, &store_path(opts))?;
    }

    let output = match opts.format {
        OutputFormat::Summary => render::summary(&session),
        OutputFormat::Breakdown => render::breakdown(&session),
        OutputFormat::Ascii => render::ascii_plan(&session),
        OutputFormat::Json => render::json(&session)?,
    };
    Ok(output)
}
