//! Storing [`AnalysisOptions`] in output containers.
//!
//! The options of a run are written under the fixed key
//! [`AnalysisOptions::KEY`] with overwrite semantics, so a container holds at
//! most one record. Reading picks the first entry declared with the
//! [`AnalysisOptions::CLASS_NAME`] class, whatever its key.

use crate::container::OpenMode;
use crate::workspace::{ContainerHandle, Workspace};
use crate::{Error, Result};
use hitbuilder_core::AnalysisOptions;
use std::path::Path;

/// Container persistence for the run options.
pub trait OptionsPersistence {
    /// Writes the record to `target`, or to the active container when
    /// `target` is `None`.
    ///
    /// A read-only container is reopened for update for the write and
    /// returned to read-only afterwards. The workspace's active container is
    /// the same after the call as before it. On failure one error is logged.
    ///
    /// # Errors
    /// Returns [`Error::NoContainer`] when there is neither a target nor an
    /// active container, [`Error::UnknownHandle`] for a closed target, or
    /// the error from reopening or writing. A failed write takes precedence
    /// over a failure to restore the read-only mode.
    fn write_to_file(&self, workspace: &mut Workspace, target: Option<ContainerHandle>)
        -> Result<()>;

    /// Replaces `self` with the record stored in the container at `path`.
    ///
    /// The container is opened read-only and closed again. On failure one
    /// warning is logged and `self` is left untouched.
    ///
    /// # Errors
    /// Returns an error if the container cannot be opened, holds no options
    /// record, or the record cannot be decoded.
    fn read_from_file(&mut self, workspace: &mut Workspace, path: &Path) -> Result<()>;
}

impl OptionsPersistence for AnalysisOptions {
    fn write_to_file(
        &self,
        workspace: &mut Workspace,
        target: Option<ContainerHandle>,
    ) -> Result<()> {
        let mut ws = workspace.scoped();
        let result = target
            .or(ws.active())
            .ok_or(Error::NoContainer)
            .and_then(|handle| store_options(self, &mut ws, handle));
        if let Err(e) = &result {
            log::error!("{} not written: {e}", AnalysisOptions::CLASS_NAME);
        }
        result
    }

    fn read_from_file(&mut self, workspace: &mut Workspace, path: &Path) -> Result<()> {
        let mut ws = workspace.scoped();
        match load_options(&mut ws, path) {
            Ok(options) => {
                *self = options;
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "failed to read {} from {}: {e}",
                    AnalysisOptions::CLASS_NAME,
                    path.display()
                );
                Err(e)
            }
        }
    }
}

fn load_options(workspace: &mut Workspace, path: &Path) -> Result<AnalysisOptions> {
    let handle = workspace.open(path, OpenMode::Read)?;
    let container = workspace.close(handle)?;

    let entry = container
        .find_class(AnalysisOptions::CLASS_NAME)
        .ok_or_else(|| Error::EntryNotFound {
            class: AnalysisOptions::CLASS_NAME.to_string(),
            path: path.to_path_buf(),
        })?;
    if entry.version > AnalysisOptions::CLASS_VERSION {
        return Err(Error::InvalidFormat(format!(
            "{} version {} is newer than supported version {}",
            entry.class,
            entry.version,
            AnalysisOptions::CLASS_VERSION
        )));
    }

    let options: AnalysisOptions = entry.decode()?;
    options.validate()?;
    Ok(options)
}

fn store_options(
    options: &AnalysisOptions,
    workspace: &mut Workspace,
    handle: ContainerHandle,
) -> Result<()> {
    workspace.cd(handle)?;
    let container = workspace.container_mut(handle)?;
    let previous = container.mode();
    if !previous.is_writable() {
        container.reopen(OpenMode::Update)?;
    }

    log::info!(
        "writing {} to {}",
        AnalysisOptions::CLASS_NAME,
        container.path().display()
    );
    let written = container.write_object(
        AnalysisOptions::KEY,
        AnalysisOptions::CLASS_NAME,
        AnalysisOptions::CLASS_VERSION,
        options,
        true,
    );
    if previous.is_writable() {
        return written;
    }

    log::info!(
        "returning {} to {previous} mode",
        container.path().display()
    );
    let restored = container.reopen(previous);
    match (written, restored) {
        (Err(e), Err(restore)) => {
            log::debug!(
                "could not return {} to {previous} mode: {restore}",
                container.path().display()
            );
            Err(e)
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}
