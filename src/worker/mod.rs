// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Background creation and refresh of stored views.
//!
//! Tasks are processed one at a time in dispatch order. A task that is still
//! queued is not queued a second time.

use crate::{
    sync::{
        CreateOutcome,
        RefreshOutcome,
        SyncError,
        ViewSynchronizer,
    },
    view::ViewId,
};
use std::{
    collections::HashSet,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
};
use thiserror::Error;
use tokio::{
    sync::mpsc::{
        unbounded_channel,
        UnboundedReceiver,
        UnboundedSender,
    },
    task::JoinHandle,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewTask {
    Create(ViewId),
    Refresh(ViewId),
}

impl ViewTask {
    pub fn id(&self) -> ViewId {
        match self {
            Self::Create(id) | Self::Refresh(id) => *id,
        }
    }
}

/// Worker event enum.
#[derive(Debug)]
pub enum WorkerEvent {
    Task(ViewTask),
    /// Stop after the tasks already queued
    Shutdown,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("View worker is closed")]
    Closed,
}

type Pending = Arc<Mutex<HashSet<ViewTask>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, HashSet<ViewTask>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Used to push tasks to a running [`ViewWorker`].
#[derive(Clone, Debug)]
pub struct ViewWorkerHandle {
    sender: UnboundedSender<WorkerEvent>,
    pending: Pending,
}

impl ViewWorkerHandle {
    /// Queue a task. Returns `false` when the same task is already waiting.
    pub fn dispatch(&self, task: ViewTask) -> Result<bool, WorkerError> {
        let mut pending = lock(&self.pending);
        if !pending.insert(task) {
            log::debug!("{:?} is already queued", task);
            return Ok(false);
        }
        if self.sender.send(WorkerEvent::Task(task)).is_err() {
            pending.remove(&task);
            return Err(WorkerError::Closed);
        }
        Ok(true)
    }

    pub fn create(&self, id: ViewId) -> Result<bool, WorkerError> {
        self.dispatch(ViewTask::Create(id))
    }

    pub fn refresh(&self, id: ViewId) -> Result<bool, WorkerError> {
        self.dispatch(ViewTask::Refresh(id))
    }

    pub fn shutdown(&self) -> Result<(), WorkerError> {
        self.sender.send(WorkerEvent::Shutdown).map_err(|_| WorkerError::Closed)
    }

    /// Number of tasks queued and not yet started.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

/// Runs view tasks against a [`ViewSynchronizer`].
pub struct ViewWorker {
    sync: ViewSynchronizer,
    inbox: UnboundedReceiver<WorkerEvent>,
    pending: Pending,
}

impl ViewWorker {
    pub fn new(sync: ViewSynchronizer) -> (Self, ViewWorkerHandle) {
        let (sender, inbox) = unbounded_channel();
        let pending = Pending::default();
        let handle = ViewWorkerHandle {
            sender,
            pending: pending.clone(),
        };
        (Self { sync, inbox, pending }, handle)
    }

    /// Start the worker on the current tokio runtime.
    pub fn spawn(sync: ViewSynchronizer) -> (JoinHandle<()>, ViewWorkerHandle) {
        let (worker, handle) = Self::new(sync);
        (tokio::spawn(worker.run()), handle)
    }

    pub async fn run(mut self) {
        while let Some(event) = self.inbox.recv().await {
            match event {
                WorkerEvent::Task(task) => {
                    lock(&self.pending).remove(&task);
                    self.handle(task)
                        .await
                        .unwrap_or_else(|e| log::error!("{:?} failed: {}", task, e));
                }
                WorkerEvent::Shutdown => {
                    log::info!("View worker shutting down");
                    self.inbox.close();
                }
            }
        }
    }

    async fn handle(&self, task: ViewTask) -> Result<(), SyncError> {
        match task {
            ViewTask::Create(id) => match self.sync.create_by_id(id).await? {
                Some(CreateOutcome::Created { at }) => log::info!("Created view {} at {}", id, at),
                Some(CreateOutcome::Skipped) | None => (),
            },
            ViewTask::Refresh(id) => match self.sync.refresh_by_id(id).await? {
                Some(RefreshOutcome::Refreshed { at }) => log::info!("Refreshed view {} at {}", id, at),
                Some(outcome) => log::debug!("Refresh of view {} ended with {:?}", id, outcome),
                None => (),
            },
        }
        Ok(())
    }
}
