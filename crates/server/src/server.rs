use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};

use cubehack::{BehaviorRegistry, BehaviorScheduler, Simulation, World};

use crate::config::ServerConfig;
use crate::connection::handle_connection;
use crate::events::ServerEvent;
use crate::simulation::run_tick_loop;
use crate::state::{ServerState, Shared};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerStats {
    pub tick: u64,
    pub players: usize,
    pub entities: usize,
    pub connections: usize,
}

pub struct GameServer {
    listener: TcpListener,
    shared: Arc<Shared>,
    simulation: Option<Simulation>,
    events: Receiver<ServerEvent>,
    tick_thread: Option<JoinHandle<()>>,
}

impl GameServer {
    /// Validates `config`, binds the listener and populates the world with
    /// AI entities.
    pub fn new<A: ToSocketAddrs>(bind_addr: A, config: ServerConfig) -> io::Result<Self> {
        config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let listener = TcpListener::bind(bind_addr)?;
        listener.set_nonblocking(true)?;

        let mut world = World::new();
        let mut rng = rand::rng();
        for _ in 0..config.ai_population {
            world.spawn_ai(&mut rng);
        }

        let registry = Arc::new(BehaviorRegistry::from_configs(&config.behaviors));
        log::info!(
            "registered {} behaviors, spawned {} AI entities",
            registry.len(),
            world.entity_count()
        );
        let simulation = Simulation::new(config.physics, BehaviorScheduler::new(registry));

        let (events_tx, events) = unbounded();
        let state = ServerState {
            world,
            ..Default::default()
        };
        let shared = Arc::new(Shared::new(
            state,
            config,
            events_tx,
        ));

        Ok(Self {
            listener,
            shared,
            simulation: Some(simulation),
            events,
            tick_thread: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn drain_events(&self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.events.try_iter()
    }

    pub fn stats(&self) -> ServerStats {
        stats(&self.shared)
    }

    /// Serves clients from background threads.
    pub fn spawn(mut self) -> io::Result<RunningServer> {
        self.start_tick_thread()?;
        let local_addr = self.listener.local_addr()?;
        let shared = Arc::clone(&self.shared);
        let listener = self.listener;
        let accept_thread = thread::Builder::new()
            .name("accept".into())
            .spawn(move || accept_loop(&listener, &shared))?;

        Ok(RunningServer {
            shared: self.shared,
            events: self.events,
            local_addr,
            accept_thread: Some(accept_thread),
            tick_thread: self.tick_thread,
        })
    }

    fn start_tick_thread(&mut self) -> io::Result<()> {
        let Some(simulation) = self.simulation.take() else {
            return Ok(());
        };
        let shared = Arc::clone(&self.shared);
        self.tick_thread = Some(
            thread::Builder::new()
                .name("tick".into())
                .spawn(move || run_tick_loop(shared, simulation))?,
        );
        Ok(())
    }
}

/// Handle to a server running on background threads.
pub struct RunningServer {
    shared: Arc<Shared>,
    events: Receiver<ServerEvent>,
    local_addr: SocketAddr,
    accept_thread: Option<JoinHandle<()>>,
    tick_thread: Option<JoinHandle<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> ServerStats {
        stats(&self.shared)
    }

    pub fn drain_events(&self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.events.try_iter()
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn shutdown(&mut self) {
        shutdown(&self.shared);
        join(&mut self.accept_thread);
        join(&mut self.tick_thread);
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept_loop(listener: &TcpListener, shared: &Arc<Shared>) {
    while shared.is_running() {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = stream.set_nonblocking(false) {
                    log::warn!("{addr}: {e}");
                    continue;
                }
                let client_id = shared.next_client_id();
                let handler_shared = Arc::clone(shared);
                let spawned = thread::Builder::new()
                    .name(format!("client-{client_id}"))
                    .spawn(move || handle_connection(handler_shared, client_id, stream, addr));
                if let Err(e) = spawned {
                    shared.emit(ServerEvent::Error {
                        message: format!("failed to spawn handler for {addr}: {e}"),
                    });
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                shared.emit(ServerEvent::Error {
                    message: format!("accept failed: {e}"),
                });
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}

fn stats(shared: &Shared) -> ServerStats {
    let state = shared.state.lock_normal();
    ServerStats {
        tick: state.world.tick(),
        players: state.world.player_count(),
        entities: state.world.entity_count(),
        connections: state.subscribers.len(),
    }
}

fn shutdown(shared: &Shared) {
    shared.running.store(false, Ordering::SeqCst);
    let subscribers: Vec<_> = shared
        .state
        .lock_normal()
        .subscribers
        .values()
        .cloned()
        .collect();
    for subscriber in subscribers {
        subscriber.shutdown();
    }
}

fn join(handle: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = handle.take()
        && handle.join().is_err()
    {
        log::error!("server thread panicked");
    }
}
