// Queue Registry
//
// Named queues are FIFO mutual-exclusion gates. Every request admitted to a
// queue takes a ticket; tickets are served strictly in the order they were
// issued and a `watch` channel announces the ticket currently being served.
// A queue is running while any ticket is alive (waiting or in flight).

use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::{QueueName, QueueStatus};
use crate::error::{ManagerError, Result};

/// Registry of named queues, owned by one manager
#[derive(Default)]
pub struct QueueRegistry {
    queues: Mutex<IndexMap<QueueName, Arc<QueueGate>>>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new idle queue
    pub fn create(&self, name: &str) -> Result<()> {
        ensure_name(name)?;
        let mut queues = self.lock();
        if queues.contains_key(name) {
            return Err(ManagerError::AlreadyExists(format!(
                "queue {} already exists",
                name
            )));
        }
        queues.insert(name.to_string(), Arc::new(QueueGate::new(name)));
        info!(queue = %name, "Queue created");
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_running(&self, name: &str) -> Result<bool> {
        Ok(self.gate(name)?.is_running())
    }

    /// Remove a queue. Requests already admitted keep running to completion
    /// but are no longer visible under this name.
    pub fn delete(&self, name: &str) -> Result<()> {
        ensure_name(name)?;
        match self.lock().shift_remove(name) {
            Some(gate) => {
                info!(queue = %name, pending = gate.pending(), "Queue deleted");
                Ok(())
            }
            None => Err(not_found(name)),
        }
    }

    /// Status of every queue, in creation order
    pub fn statuses(&self) -> Vec<QueueStatus> {
        self.lock()
            .values()
            .map(|gate| QueueStatus {
                name: gate.name.clone(),
                running: gate.is_running(),
                pending: gate.pending(),
            })
            .collect()
    }

    pub(crate) fn gate(&self, name: &str) -> Result<Arc<QueueGate>> {
        ensure_name(name)?;
        self.lock().get(name).cloned().ok_or_else(|| not_found(name))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<QueueName, Arc<QueueGate>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ManagerError::InvalidArgument(
            "name must be a non empty string".into(),
        ));
    }
    Ok(())
}

fn not_found(name: &str) -> ManagerError {
    ManagerError::NotFound(format!("queue {} does not exist", name))
}

struct GateState {
    next_ticket: u64,
    pending: usize,
    /// Tickets dropped before their turn; skipped when serving advances
    abandoned: BTreeSet<u64>,
}

/// FIFO gate of a single queue
pub struct QueueGate {
    name: QueueName,
    state: Mutex<GateState>,
    serving: watch::Sender<u64>,
}

impl QueueGate {
    fn new(name: &str) -> Self {
        let (serving, _) = watch::channel(0);
        Self {
            name: name.to_string(),
            state: Mutex::new(GateState {
                next_ticket: 0,
                pending: 0,
                abandoned: BTreeSet::new(),
            }),
            serving,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    pub fn is_running(&self) -> bool {
        self.pending() > 0
    }

    /// Admit one request.
    ///
    /// Exclusive tickets take the next FIFO position; shared tickets only
    /// count towards the running state. Either kind stays pending until
    /// dropped.
    pub fn reserve(self: &Arc<Self>, exclusive: bool) -> QueueTicket {
        let mut state = self.lock();
        state.pending += 1;
        let number = exclusive.then(|| {
            let n = state.next_ticket;
            state.next_ticket += 1;
            n
        });
        debug!(queue = %self.name, ticket = ?number, pending = state.pending, "Queue ticket issued");
        QueueTicket {
            gate: Arc::clone(self),
            number,
        }
    }

    fn release(&self, number: Option<u64>) {
        let mut state = self.lock();
        state.pending = state.pending.saturating_sub(1);

        let Some(number) = number else {
            return;
        };

        let serving = *self.serving.borrow();
        if number == serving {
            let mut next = number + 1;
            while state.abandoned.remove(&next) {
                next += 1;
            }
            self.serving.send_replace(next);
            debug!(queue = %self.name, serving = next, "Queue advanced");
        } else {
            state.abandoned.insert(number);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A request's place in a queue; releases it on drop
pub struct QueueTicket {
    gate: Arc<QueueGate>,
    number: Option<u64>,
}

impl QueueTicket {
    pub fn queue_name(&self) -> &str {
        self.gate.name()
    }

    /// Suspend until every earlier ticket of this queue has been released
    pub async fn wait_turn(&self) {
        let Some(number) = self.number else {
            return;
        };
        let mut rx = self.gate.serving.subscribe();
        // The sender lives in the gate we hold, so the channel cannot close
        let _ = rx.wait_for(|serving| *serving == number).await;
    }
}

impl Drop for QueueTicket {
    fn drop(&mut self) {
        self.gate.release(self.number);
    }
}
