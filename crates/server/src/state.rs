use std::collections::BTreeMap;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::Sender;

use cubehack::{
    BlockLog, ChannelError, EntityId, FramedChannel, MAX_BLOCK_UPDATES_PER_TICK, PriorityMutex,
    ServerMessage, World, WorldUpdate,
};

use crate::config::ServerConfig;
use crate::events::ServerEvent;

pub type ClientId = u64;

/// Outbound half of one client connection.
///
/// The tick thread and the connection's handler both write through the same
/// channel, so it sits behind its own mutex. The extra socket handle lets
/// either side shut the connection down without taking that mutex.
#[derive(Clone)]
pub struct Subscriber {
    pub entity: EntityId,
    /// Block edits already sent, as an index into `ServerState::blocks`.
    block_cursor: usize,
    outbound: Arc<Mutex<FramedChannel<TcpStream>>>,
    socket: Arc<TcpStream>,
}

impl Subscriber {
    pub fn new(entity: EntityId, stream: &TcpStream) -> std::io::Result<Self> {
        Ok(Self {
            entity,
            block_cursor: 0,
            outbound: Arc::new(Mutex::new(FramedChannel::new(stream.try_clone()?))),
            socket: Arc::new(stream.try_clone()?),
        })
    }

    pub fn send(&self, message: &ServerMessage) -> Result<(), ChannelError> {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send_object(message)
    }

    pub fn shutdown(&self) {
        let _ = self.socket.shutdown(Shutdown::Both);
    }

    pub fn block_cursor(&self) -> usize {
        self.block_cursor
    }
}

/// Everything the tick thread and the connection handlers share.
#[derive(Default)]
pub struct ServerState {
    pub world: World,
    pub blocks: BlockLog,
    pub subscribers: BTreeMap<ClientId, Subscriber>,
}

impl ServerState {
    pub fn subscribe(&mut self, client_id: ClientId, subscriber: Subscriber) {
        self.subscribers.insert(client_id, subscriber);
    }

    pub fn unsubscribe(&mut self, client_id: ClientId) -> Option<Subscriber> {
        self.subscribers.remove(&client_id)
    }

    /// One update per subscriber, each leaving out the subscriber's own
    /// entity and carrying the next batch of block edits it has not seen.
    /// Advances every subscriber's block cursor past that batch.
    pub fn updates(&mut self) -> Vec<(Subscriber, WorldUpdate)> {
        let Self {
            world,
            blocks,
            subscribers,
        } = self;
        subscribers
            .values_mut()
            .map(|subscriber| {
                let mut update = world.update_for(Some(subscriber.entity));
                update.blocks = blocks
                    .since(subscriber.block_cursor, MAX_BLOCK_UPDATES_PER_TICK)
                    .to_vec();
                subscriber.block_cursor += update.blocks.len();
                (subscriber.clone(), update)
            })
            .collect()
    }
}

pub(crate) struct Shared {
    pub state: PriorityMutex<ServerState>,
    pub config: ServerConfig,
    pub running: AtomicBool,
    pub events: Sender<ServerEvent>,
    next_client_id: AtomicU64,
}

impl Shared {
    pub fn new(
        state: ServerState,
        config: ServerConfig,
        events: Sender<ServerEvent>,
    ) -> Self {
        Self {
            state: PriorityMutex::new(state),
            config,
            running: AtomicBool::new(true),
            events,
            next_client_id: AtomicU64::new(1),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn next_client_id(&self) -> ClientId {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn emit(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }
}
