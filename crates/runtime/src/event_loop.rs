//! Dedicated-thread event loop.
//!
//! Receives events from two crossbeam channels with priority via a
//! `try_recv` cascade - timers before commands - and blocks on
//! `crossbeam::select!` when nothing is ready. Timer actions spawn tokio
//! sleep tasks that feed the timer channel; cancellation aborts the task,
//! and a fire that slips through anyway is neutralized by the state check
//! at the top of its handler.

use crossbeam::channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use teleport_core::{Action, Event, Host, StateMachine, TimerId};
use teleport_node::NodeStateMachine;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Manages tokio-based timers for the event loop thread.
///
/// Spawns async sleep tasks via the tokio handle that fire timer events
/// into the crossbeam timer channel.
struct TimerManager {
    tokio_handle: tokio::runtime::Handle,
    timer_tx: Sender<Event>,
    active: HashMap<TimerId, JoinHandle<()>>,
}

impl TimerManager {
    fn new(tokio_handle: tokio::runtime::Handle, timer_tx: Sender<Event>) -> Self {
        Self {
            tokio_handle,
            timer_tx,
            active: HashMap::new(),
        }
    }

    fn set(&mut self, id: TimerId, duration: Duration) {
        // Re-arming an id replaces the pending task.
        if let Some(handle) = self.active.remove(&id) {
            handle.abort();
        }
        let timer_tx = self.timer_tx.clone();
        let handle = self.tokio_handle.spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = timer_tx.send(id.into_event());
        });
        self.active.insert(id, handle);
        debug!(?id, ?duration, "Timer set");
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.active.remove(&id) {
            handle.abort();
            debug!(?id, "Timer cancelled");
        }
    }
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        for (_, handle) in self.active.drain() {
            handle.abort();
        }
    }
}

/// Channels wiring the loop to its service handle and timers.
pub(crate) struct LoopChannels {
    pub timer_tx: Sender<Event>,
    pub timer_rx: Receiver<Event>,
    pub command_rx: Receiver<Event>,
    pub shutdown_rx: Receiver<()>,
}

/// Get wall-clock time as a Duration since UNIX epoch.
///
/// Used to set the state machine's logical clock before each step.
fn wall_clock_duration() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
}

fn execute(action: Action, timers: &mut TimerManager, host: &dyn Host) {
    match action {
        Action::SetTimer { id, duration } => timers.set(id, duration),
        Action::CancelTimer { id } => timers.cancel(id),
        Action::Notify { actor, notice } => host.deliver(actor, notice),
        Action::MoveActor { actor, destination } => host.move_actor(actor, destination),
        Action::Impair { actor, duration } => host.apply_impairment(actor, duration),
    }
}

/// Flush all state on the way out; late timer tasks die with the manager.
fn flush(machine: &mut NodeStateMachine, timers: &mut TimerManager, host: &dyn Host) {
    machine.set_time(wall_clock_duration());
    for action in machine.handle(Event::Shutdown) {
        execute(action, timers, host);
    }
}

/// Run the event loop. Blocks the calling thread until shutdown.
pub(crate) fn run_event_loop(
    mut machine: NodeStateMachine,
    host: Arc<dyn Host>,
    channels: LoopChannels,
    tokio_handle: tokio::runtime::Handle,
) {
    info!("Teleport event loop starting");
    let mut timers = TimerManager::new(tokio_handle, channels.timer_tx.clone());

    'main: loop {
        // ── Shutdown check ──
        if channels.shutdown_rx.try_recv().is_ok() {
            info!("Event loop received shutdown signal");
            break 'main;
        }

        // ── Priority try_recv cascade: timers beat commands ──
        let event = 'recv: {
            if let Ok(e) = channels.timer_rx.try_recv() {
                break 'recv Some(e);
            }
            if let Ok(e) = channels.command_rx.try_recv() {
                break 'recv Some(e);
            }

            // Nothing ready - block until something arrives.
            crossbeam::channel::select! {
                recv(channels.shutdown_rx) -> _ => {
                    info!("Event loop received shutdown signal (select)");
                    break 'main;
                }
                recv(channels.timer_rx) -> e => e.ok(),
                recv(channels.command_rx) -> e => e.ok(),
            }
        };

        // ── Process event ──
        if let Some(event) = event {
            machine.set_time(wall_clock_duration());
            debug!(event = event.type_name(), "Processing event");
            for action in machine.handle(event) {
                execute(action, &mut timers, &*host);
            }
        }
    }

    flush(&mut machine, &mut timers, &*host);
    info!("Event loop exiting");
}
