use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use cubehack::{
    ChannelError, ClientMessage, EntityId, FramedChannel, MAGIC_COOKIE, PositionData,
    ServerMessage, apply_player_update, physics,
};

use crate::events::{DisconnectReason, ServerEvent};
use crate::state::{ClientId, Shared, Subscriber};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs one client connection to completion on the calling thread.
pub(crate) fn handle_connection(
    shared: Arc<Shared>,
    client_id: ClientId,
    stream: TcpStream,
    addr: SocketAddr,
) {
    let write_timeout = Duration::from_millis(shared.config.write_timeout_ms);
    if let Err(e) = stream
        .set_nodelay(true)
        .and_then(|_| stream.set_write_timeout(Some(write_timeout)))
        .and_then(|_| stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)))
    {
        shared.emit(ServerEvent::Error {
            message: format!("failed to configure socket for {addr}: {e}"),
        });
        return;
    }

    let mut reader = FramedChannel::new(stream);
    if let Err(reason) = handshake(&mut reader) {
        log::warn!("{addr}: handshake failed: {reason}");
        shared.emit(ServerEvent::ConnectionDenied { addr, reason });
        close(&reader);
        return;
    }

    let Some(entity) = spawn_player(&shared) else {
        let reason = "server full".to_owned();
        let _ = reader.send_object(&ServerMessage::ConnectionDenied {
            reason: reason.clone(),
        });
        shared.emit(ServerEvent::ConnectionDenied { addr, reason });
        close(&reader);
        return;
    };

    let subscriber = match welcome(&shared, &reader, entity) {
        Ok(subscriber) => subscriber,
        Err(e) => {
            log::warn!("{addr}: failed to welcome client: {e}");
            shared.state.lock_normal().world.despawn(entity);
            shared.emit(ServerEvent::Error {
                message: format!("failed to welcome {addr}: {e}"),
            });
            close(&reader);
            return;
        }
    };

    shared
        .state
        .lock_normal()
        .subscribe(client_id, subscriber.clone());
    shared.emit(ServerEvent::ClientConnected {
        client_id,
        addr,
        entity_id: entity.id(),
    });

    let reason = serve(&shared, &mut reader, &subscriber);

    {
        let mut state = shared.state.lock_normal();
        state.unsubscribe(client_id);
        state.world.despawn(entity);
    }
    shared.emit(ServerEvent::ClientDisconnected { client_id, reason });
    subscriber.shutdown();
}

fn handshake(reader: &mut FramedChannel<TcpStream>) -> Result<(), String> {
    let mut cookie = [0u8; MAGIC_COOKIE.len()];
    reader.read_exact(&mut cookie).map_err(|e| e.to_string())?;
    if cookie != MAGIC_COOKIE {
        return Err("bad handshake cookie".into());
    }
    reader
        .get_ref()
        .set_read_timeout(None)
        .map_err(|e| e.to_string())
}

fn spawn_player(shared: &Shared) -> Option<EntityId> {
    let mut position_data = PositionData::default();
    physics::respawn(&mut rand::rng(), &mut position_data);

    let mut state = shared.state.lock_normal();
    if state.world.player_count() >= shared.config.max_clients {
        return None;
    }
    Some(state.world.spawn_player(position_data))
}

fn welcome(
    shared: &Shared,
    reader: &FramedChannel<TcpStream>,
    entity: EntityId,
) -> Result<Subscriber, ChannelError> {
    let subscriber = Subscriber::new(entity, reader.get_ref())?;
    subscriber.send(&ServerMessage::Welcome {
        entity_id: entity.id(),
        tick_rate: shared.config.tick_rate,
        physics: shared.config.physics,
    })?;
    Ok(subscriber)
}

fn serve(
    shared: &Shared,
    reader: &mut FramedChannel<TcpStream>,
    subscriber: &Subscriber,
) -> DisconnectReason {
    loop {
        let message = match reader.receive_object::<ClientMessage>() {
            Ok(message) => message,
            Err(e) => return disconnect_reason(shared, &e),
        };

        match message {
            ClientMessage::PlayerUpdate(update) => {
                let result = {
                    let mut state = shared.state.lock_normal();
                    apply_player_update(&mut state.world, subscriber.entity, &update)
                };
                if let Err(e) = result {
                    log::warn!("rejected update for {}: {e}", subscriber.entity);
                }
            }
            ClientMessage::BlockUpdates(edits) => {
                log::debug!("{} edited {} blocks", subscriber.entity, edits.len());
                shared.state.lock_normal().blocks.record(&edits);
            }
            ClientMessage::Ping { timestamp_ms } => {
                if let Err(e) = subscriber.send(&ServerMessage::Pong { timestamp_ms }) {
                    return disconnect_reason(shared, &e);
                }
            }
            ClientMessage::Disconnect => return DisconnectReason::Graceful,
        }
    }
}

fn disconnect_reason(shared: &Shared, err: &ChannelError) -> DisconnectReason {
    if !shared.is_running() {
        DisconnectReason::Shutdown
    } else if err.is_disconnect() {
        DisconnectReason::Dropped
    } else {
        log::warn!("dropping connection: {err}");
        DisconnectReason::ProtocolViolation
    }
}

fn close(reader: &FramedChannel<TcpStream>) {
    let _ = reader.get_ref().shutdown(std::net::Shutdown::Both);
}
