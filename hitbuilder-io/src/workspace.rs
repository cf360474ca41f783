//! Open containers and the active-container selection.
//!
//! A [`Workspace`] owns every open [`Container`] and tracks which one is
//! active, the default target for writes that name no container. Code that
//! changes the selection temporarily does so through [`Workspace::scoped`],
//! whose guard puts the previous selection back when dropped.

use crate::container::{Container, OpenMode};
use crate::{Error, Result};
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// Identifies an open container within a [`Workspace`].
///
/// Slots of closed containers are reused, so a handle also records the
/// generation of its slot. A handle to a closed container stays invalid
/// after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    slot: usize,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    container: Option<Container>,
}

/// Set of open containers with an active selection.
#[derive(Debug, Default)]
pub struct Workspace {
    slots: Vec<Slot>,
    active: Option<ContainerHandle>,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a container and makes it active.
    ///
    /// # Errors
    /// Returns an error if the container cannot be opened; the active
    /// selection is unchanged in that case.
    pub fn open<P: AsRef<Path>>(&mut self, path: P, mode: OpenMode) -> Result<ContainerHandle> {
        let container = Container::open(path, mode)?;
        let slot = match self.slots.iter().position(|s| s.container.is_none()) {
            Some(free) => free,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let entry = &mut self.slots[slot];
        entry.container = Some(container);
        let handle = ContainerHandle {
            slot,
            generation: entry.generation,
        };
        self.active = Some(handle);
        Ok(handle)
    }

    /// Currently active container, if any.
    #[must_use]
    pub fn active(&self) -> Option<ContainerHandle> {
        self.active
    }

    /// Makes `handle` the active container.
    ///
    /// # Errors
    /// Returns [`Error::UnknownHandle`] if the container is not open.
    pub fn cd(&mut self, handle: ContainerHandle) -> Result<()> {
        self.container(handle)?;
        self.active = Some(handle);
        Ok(())
    }

    /// Closes a container. If it was active, no container is active
    /// afterwards.
    ///
    /// # Errors
    /// Returns [`Error::UnknownHandle`] if the container is not open.
    pub fn close(&mut self, handle: ContainerHandle) -> Result<Container> {
        let slot = self
            .slots
            .get_mut(handle.slot)
            .filter(|s| s.generation == handle.generation)
            .ok_or(Error::UnknownHandle(handle.slot))?;
        let container = slot.container.take().ok_or(Error::UnknownHandle(handle.slot))?;
        slot.generation = slot.generation.wrapping_add(1);
        if self.active == Some(handle) {
            self.active = None;
        }
        Ok(container)
    }

    #[must_use]
    pub fn is_open(&self, handle: ContainerHandle) -> bool {
        self.container(handle).is_ok()
    }

    /// # Errors
    /// Returns [`Error::UnknownHandle`] if the container is not open.
    pub fn container(&self, handle: ContainerHandle) -> Result<&Container> {
        self.slots
            .get(handle.slot)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.container.as_ref())
            .ok_or(Error::UnknownHandle(handle.slot))
    }

    /// # Errors
    /// Returns [`Error::UnknownHandle`] if the container is not open.
    pub fn container_mut(&mut self, handle: ContainerHandle) -> Result<&mut Container> {
        self.slots
            .get_mut(handle.slot)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.container.as_mut())
            .ok_or(Error::UnknownHandle(handle.slot))
    }

    /// Open containers in slot order.
    pub fn open_containers(&self) -> impl Iterator<Item = (ContainerHandle, &Container)> {
        self.slots.iter().enumerate().filter_map(|(slot, s)| {
            s.container.as_ref().map(|c| {
                let handle = ContainerHandle {
                    slot,
                    generation: s.generation,
                };
                (handle, c)
            })
        })
    }

    /// Borrows the workspace, restoring the current active selection when
    /// the guard is dropped.
    pub fn scoped(&mut self) -> ActiveGuard<'_> {
        let saved = self.active;
        ActiveGuard {
            workspace: self,
            saved,
        }
    }
}

/// Restores a workspace's active container on drop.
///
/// If the saved container was closed in the meantime, no container is
/// active afterwards.
pub struct ActiveGuard<'a> {
    workspace: &'a mut Workspace,
    saved: Option<ContainerHandle>,
}

impl Deref for ActiveGuard<'_> {
    type Target = Workspace;

    fn deref(&self) -> &Workspace {
        self.workspace
    }
}

impl DerefMut for ActiveGuard<'_> {
    fn deref_mut(&mut self) -> &mut Workspace {
        self.workspace
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.workspace.active = self.saved.filter(|&h| self.workspace.is_open(h));
    }
}
