use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use cubehack::{
    BlockUpdate, ClientError, ClientMessage, EntityFlags, GameClient, MAGIC_COOKIE,
    MAX_BLOCK_UPDATES_PER_TICK, MAX_ENTITIES_PER_UPDATE, MAX_OBJECT_SIZE, PlayerUpdate,
    ServerMessage,
};
use cubehack_server::{
    DisconnectReason, GameServer, RunningServer, ServerConfig, ServerEvent, ServerStats,
};

const DEADLINE: Duration = Duration::from_secs(5);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start(config: ServerConfig) -> RunningServer {
    init_logging();
    GameServer::new("127.0.0.1:0", config)
        .unwrap()
        .spawn()
        .unwrap()
}

fn wait_for(server: &RunningServer, what: &str, check: impl Fn(&ServerStats) -> bool) {
    let started = Instant::now();
    loop {
        let stats = server.stats();
        if check(&stats) {
            return;
        }
        assert!(started.elapsed() < DEADLINE, "timed out waiting for {what}: {stats:?}");
        thread::sleep(Duration::from_millis(10));
    }
}

fn next_world_update(client: &mut GameClient) -> cubehack::WorldUpdate {
    loop {
        match client.receive().unwrap() {
            ServerMessage::WorldUpdate(update) => return update,
            _ => continue,
        }
    }
}

fn raw_connection(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(DEADLINE)).unwrap();
    stream
}

#[test]
fn client_sees_ai_population_but_not_itself() {
    let server = start(ServerConfig {
        ai_population: 20,
        ..Default::default()
    });

    let mut client = GameClient::connect(server.local_addr()).unwrap();
    client.set_read_timeout(Some(DEADLINE)).unwrap();
    assert_eq!(client.tick_rate(), 100);

    let first = next_world_update(&mut client);
    let second = next_world_update(&mut client);
    assert!(second.tick > first.tick);

    assert_eq!(second.entities.len(), 20);
    assert!(
        second
            .entities
            .iter()
            .all(|e| e.flags().contains(EntityFlags::AI_CONTROLLED))
    );
    assert!(second.entities.iter().all(|e| e.entity_id != client.entity_id()));

    wait_for(&server, "player", |s| s.players == 1 && s.entities == 21);
}

#[test]
fn players_see_each_other_and_updates_apply() {
    let server = start(ServerConfig {
        ai_population: 0,
        ..Default::default()
    });

    let mut mover = GameClient::connect(server.local_addr()).unwrap();
    let mut watcher = GameClient::connect(server.local_addr()).unwrap();
    watcher.set_read_timeout(Some(DEADLINE)).unwrap();
    wait_for(&server, "both players", |s| s.connections == 2);

    mover
        .send_update(PlayerUpdate {
            position: [3.0, 10.0, -4.0],
            velocity: [0.0, 0.0, 0.0],
            h_angle: 45.0,
            v_angle: 0.0,
            is_falling: true,
        })
        .unwrap();

    let started = Instant::now();
    loop {
        let update = next_world_update(&mut watcher);
        let seen = update
            .entities
            .iter()
            .find(|e| e.entity_id == mover.entity_id())
            .map(|e| (e.h_angle, e.position));
        if let Some((h_angle, position)) = seen
            && h_angle == 45.0
        {
            assert_eq!(position[0], 3.0);
            assert_eq!(position[2], -4.0);
            break;
        }
        assert!(started.elapsed() < DEADLINE, "update never became visible");
    }
}

#[test]
fn ping_is_answered() {
    let server = start(ServerConfig::default());
    let mut client = GameClient::connect(server.local_addr()).unwrap();
    client.set_read_timeout(Some(DEADLINE)).unwrap();

    client.send(&ClientMessage::Ping { timestamp_ms: 1234 }).unwrap();
    loop {
        match client.receive().unwrap() {
            ServerMessage::Pong { timestamp_ms } => {
                assert_eq!(timestamp_ms, 1234);
                break;
            }
            ServerMessage::WorldUpdate(_) => continue,
            other => panic!("unexpected message {other:?}"),
        }
    }
}

#[test]
fn disconnect_despawns_player() {
    let server = start(ServerConfig {
        ai_population: 3,
        ..Default::default()
    });

    let client = GameClient::connect(server.local_addr()).unwrap();
    wait_for(&server, "player", |s| s.players == 1);
    client.disconnect().unwrap();
    wait_for(&server, "despawn", |s| {
        s.players == 0 && s.entities == 3 && s.connections == 0
    });

    let reasons: Vec<_> = server
        .drain_events()
        .filter_map(|event| match event {
            ServerEvent::ClientDisconnected { reason, .. } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![DisconnectReason::Graceful]);
}

#[test]
fn bad_cookie_is_dropped_without_affecting_others() {
    let server = start(ServerConfig::default());
    let mut good = GameClient::connect(server.local_addr()).unwrap();
    good.set_read_timeout(Some(DEADLINE)).unwrap();

    let mut bad = raw_connection(server.local_addr());
    bad.write_all(b"NotCubeHack!").unwrap();
    let mut reader = cubehack::FramedChannel::new(bad);
    assert!(
        reader
            .receive_object::<ServerMessage>()
            .unwrap_err()
            .is_disconnect()
    );

    let before = next_world_update(&mut good).tick;
    assert!(next_world_update(&mut good).tick > before);
    assert_eq!(server.stats().players, 1);
}

#[test]
fn oversized_frame_tears_down_only_that_connection() {
    let server = start(ServerConfig {
        ai_population: 2,
        ..Default::default()
    });
    let mut good = GameClient::connect(server.local_addr()).unwrap();
    good.set_read_timeout(Some(DEADLINE)).unwrap();

    let mut rogue = raw_connection(server.local_addr());
    rogue.write_all(&MAGIC_COOKIE).unwrap();
    wait_for(&server, "both players", |s| s.players == 2);

    let length = (MAX_OBJECT_SIZE as u32 + 1).to_le_bytes();
    rogue.write_all(&length).unwrap();
    wait_for(&server, "rogue teardown", |s| s.players == 1 && s.entities == 3);

    let reasons: Vec<_> = server
        .drain_events()
        .filter_map(|event| match event {
            ServerEvent::ClientDisconnected { reason, .. } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![DisconnectReason::ProtocolViolation]);

    let before = next_world_update(&mut good).tick;
    assert!(next_world_update(&mut good).tick > before);
}

#[test]
fn connections_over_max_clients_are_denied() {
    let server = start(ServerConfig {
        max_clients: 1,
        ..Default::default()
    });

    let _first = GameClient::connect(server.local_addr()).unwrap();
    match GameClient::connect(server.local_addr()) {
        Err(ClientError::Denied { reason }) => assert_eq!(reason, "server full"),
        other => panic!("expected denial, got {other:?}"),
    }
    assert_eq!(server.stats().players, 1);
}

#[test]
fn shutdown_closes_client_connections() {
    let mut server = start(ServerConfig::default());
    let mut client = GameClient::connect(server.local_addr()).unwrap();
    client.set_read_timeout(Some(DEADLINE)).unwrap();
    wait_for(&server, "player", |s| s.connections == 1);

    server.shutdown();
    assert!(!server.is_running());

    let err = loop {
        match client.receive() {
            Ok(_) => continue,
            Err(e) => break e,
        }
    };
    assert!(err.is_disconnect(), "unexpected error: {err}");
}

fn edits(range: std::ops::Range<i32>, material: u16) -> Vec<BlockUpdate> {
    range
        .map(|x| BlockUpdate {
            pos: [x, 1, -x],
            material,
        })
        .collect()
}

/// Reads world updates until `count` block edits have arrived.
fn collect_block_edits(client: &mut GameClient, count: usize) -> Vec<Vec<BlockUpdate>> {
    let started = Instant::now();
    let mut batches = Vec::new();
    let mut seen = 0;
    while seen < count {
        let update = next_world_update(client);
        if !update.blocks.is_empty() {
            seen += update.blocks.len();
            batches.push(update.blocks);
        }
        assert!(started.elapsed() < DEADLINE, "only {seen} of {count} edits arrived");
    }
    batches
}

#[test]
fn worlds_too_large_for_one_update_are_rejected() {
    init_logging();
    let err = GameServer::new(
        "127.0.0.1:0",
        ServerConfig {
            ai_population: 600,
            ..Default::default()
        },
    )
    .err()
    .expect("oversized world accepted");
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

#[test]
fn largest_allowed_world_still_reaches_clients() {
    let server = start(ServerConfig {
        max_clients: 1,
        ai_population: MAX_ENTITIES_PER_UPDATE - 1,
        ..Default::default()
    });

    let mut client = GameClient::connect(server.local_addr()).unwrap();
    client.set_read_timeout(Some(DEADLINE)).unwrap();
    let update = next_world_update(&mut client);
    assert_eq!(update.entities.len(), MAX_ENTITIES_PER_UPDATE - 1);

    next_world_update(&mut client);
    assert!(server.drain_events().all(|e| !matches!(
        e,
        ServerEvent::ClientDisconnected { .. } | ServerEvent::Error { .. }
    )));
}

#[test]
fn block_edits_reach_every_client_in_order() {
    let server = start(ServerConfig {
        ai_population: 0,
        ..Default::default()
    });

    let mut builder = GameClient::connect(server.local_addr()).unwrap();
    let mut watcher = GameClient::connect(server.local_addr()).unwrap();
    builder.set_read_timeout(Some(DEADLINE)).unwrap();
    watcher.set_read_timeout(Some(DEADLINE)).unwrap();
    wait_for(&server, "both players", |s| s.connections == 2);

    builder.send_block_updates(edits(0..3, 7)).unwrap();
    builder.send_block_updates(edits(0..1, 0)).unwrap();

    let mut expected = edits(0..3, 7);
    expected.extend(edits(0..1, 0));
    for client in [&mut watcher, &mut builder] {
        let received: Vec<_> = collect_block_edits(client, expected.len())
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(received, expected);
    }
}

#[test]
fn large_edit_bursts_are_paced_across_ticks() {
    let server = start(ServerConfig {
        ai_population: 0,
        ..Default::default()
    });

    let mut client = GameClient::connect(server.local_addr()).unwrap();
    client.set_read_timeout(Some(DEADLINE)).unwrap();
    wait_for(&server, "player", |s| s.connections == 1);

    let burst = edits(0..600, 2);
    client.send_block_updates(burst.clone()).unwrap();

    let batches = collect_block_edits(&mut client, burst.len());
    assert!(batches.len() >= 3, "{} batches", batches.len());
    assert!(batches.iter().all(|b| b.len() <= MAX_BLOCK_UPDATES_PER_TICK));
    assert_eq!(batches.concat(), burst);
}

#[test]
fn late_joiners_replay_earlier_edits() {
    let server = start(ServerConfig {
        ai_population: 0,
        ..Default::default()
    });

    let mut builder = GameClient::connect(server.local_addr()).unwrap();
    builder.set_read_timeout(Some(DEADLINE)).unwrap();
    wait_for(&server, "builder", |s| s.connections == 1);
    builder.send_block_updates(edits(-5..5, 9)).unwrap();
    collect_block_edits(&mut builder, 10);

    let mut late = GameClient::connect(server.local_addr()).unwrap();
    late.set_read_timeout(Some(DEADLINE)).unwrap();
    let replayed = collect_block_edits(&mut late, 10).concat();
    assert_eq!(replayed, edits(-5..5, 9));
}
