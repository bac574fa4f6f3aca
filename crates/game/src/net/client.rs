use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::framing::{ChannelError, FramedChannel};
use super::protocol::{BlockUpdate, ClientMessage, MAGIC_COOKIE, PlayerUpdate, ServerMessage};
use crate::physics::PhysicsValues;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("server denied connection: {reason}")]
    Denied { reason: String },
    #[error("expected welcome, got {0}")]
    UnexpectedMessage(&'static str),
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        Self::Channel(ChannelError::Io(err))
    }
}

/// Blocking connection to a game server, past the handshake.
#[derive(Debug)]
pub struct GameClient {
    channel: FramedChannel<TcpStream>,
    entity_id: u32,
    tick_rate: u32,
    physics: PhysicsValues,
}

impl GameClient {
    /// Connects, sends the cookie, and waits for `Welcome`.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let mut channel = FramedChannel::new(stream);
        channel.write_raw(&MAGIC_COOKIE)?;

        match channel.receive_object::<ServerMessage>()? {
            ServerMessage::Welcome {
                entity_id,
                tick_rate,
                physics,
            } => {
                log::debug!("joined as entity {entity_id} at {tick_rate} Hz");
                Ok(Self {
                    channel,
                    entity_id,
                    tick_rate,
                    physics,
                })
            }
            ServerMessage::ConnectionDenied { reason } => Err(ClientError::Denied { reason }),
            ServerMessage::WorldUpdate(_) => Err(ClientError::UnexpectedMessage("world update")),
            ServerMessage::Pong { .. } => Err(ClientError::UnexpectedMessage("pong")),
        }
    }

    pub fn entity_id(&self) -> u32 {
        self.entity_id
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn physics(&self) -> &PhysicsValues {
        &self.physics
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.channel.get_ref().local_addr()
    }

    pub fn send(&mut self, message: &ClientMessage) -> Result<(), ChannelError> {
        self.channel.send_object(message)
    }

    pub fn send_update(&mut self, update: PlayerUpdate) -> Result<(), ChannelError> {
        self.send(&ClientMessage::PlayerUpdate(update))
    }

    pub fn send_block_updates(&mut self, updates: Vec<BlockUpdate>) -> Result<(), ChannelError> {
        self.send(&ClientMessage::BlockUpdates(updates))
    }

    pub fn receive(&mut self) -> Result<ServerMessage, ChannelError> {
        self.channel.receive_object()
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.channel.get_ref().set_read_timeout(timeout)
    }

    /// Second handle on the same socket, for reading on another thread.
    pub fn try_clone_reader(&self) -> io::Result<FramedChannel<TcpStream>> {
        Ok(FramedChannel::new(self.channel.get_ref().try_clone()?))
    }

    /// Sends `Disconnect` and closes the socket.
    pub fn disconnect(mut self) -> Result<(), ChannelError> {
        self.send(&ClientMessage::Disconnect)?;
        self.channel.get_ref().shutdown(Shutdown::Both)?;
        Ok(())
    }
}
