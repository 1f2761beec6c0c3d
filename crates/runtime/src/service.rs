//! Service lifecycle: spawn the loop thread, hand out a control handle.

use crate::event_loop::{run_event_loop, LoopChannels};
use crossbeam::channel::{bounded, unbounded, Sender};
use std::sync::Arc;
use std::thread;
use teleport_core::{ConfigSource, Event, Host, Presence};
use teleport_node::NodeStateMachine;
use teleport_types::ActorId;
use tracing::warn;

/// Control handle for a running teleport service.
///
/// Commands are fire-and-forget: they enqueue an event for the loop thread
/// and return immediately. Typed feedback comes back through the injected
/// [`Host`]. Dropping the handle shuts the service down.
pub struct ServiceHandle {
    command_tx: Sender<Event>,
    shutdown_tx: Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

/// Spawn the event loop on a dedicated thread.
///
/// `host` doubles as the presence oracle the machine consults and the sink
/// every side effect is executed against. `tokio_handle` is used for timer
/// sleep tasks only; the loop itself never enters the async runtime.
pub fn spawn<H: Host + 'static>(
    config: Arc<dyn ConfigSource>,
    host: Arc<H>,
    tokio_handle: tokio::runtime::Handle,
) -> ServiceHandle {
    let machine = NodeStateMachine::new(config, Arc::clone(&host) as Arc<dyn Presence>);

    let (timer_tx, timer_rx) = unbounded();
    let (command_tx, command_rx) = unbounded();
    let (shutdown_tx, shutdown_rx) = bounded(1);

    let channels = LoopChannels {
        timer_tx,
        timer_rx,
        command_rx,
        shutdown_rx,
    };

    let dyn_host: Arc<dyn Host> = host;
    let join = thread::Builder::new()
        .name("teleport-loop".to_string())
        .spawn(move || run_event_loop(machine, dyn_host, channels, tokio_handle))
        .expect("failed to spawn teleport-loop thread");

    ServiceHandle {
        command_tx,
        shutdown_tx,
        join: Some(join),
    }
}

impl ServiceHandle {
    /// Enqueue an event for the loop thread.
    pub fn submit(&self, event: Event) {
        if self.command_tx.send(event).is_err() {
            warn!("Event submitted after the loop exited");
        }
    }

    /// Best-effort cleanup for an actor that just left.
    pub fn on_disconnect(&self, actor: ActorId) {
        self.submit(Event::ActorDisconnected { actor });
    }

    /// Stop the loop, flushing all pending timers and state first.
    pub fn shutdown(mut self) {
        self.signal_and_join();
    }

    fn signal_and_join(&mut self) {
        // Err means the loop is already gone; join below still reaps it.
        let _ = self.shutdown_tx.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.signal_and_join();
    }
}
