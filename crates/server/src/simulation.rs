use std::sync::Arc;

use cubehack::{ChannelError, ServerMessage, Simulation, TickClock};

use crate::events::ServerEvent;
use crate::state::Shared;

/// Tick loop. Simulates under a priority lock, then sends the updates with
/// the lock released.
pub(crate) fn run_tick_loop(shared: Arc<Shared>, mut simulation: Simulation) {
    let mut clock = TickClock::new(shared.config.tick_rate);
    log::info!(
        "tick loop running at {} Hz ({:?} per tick)",
        shared.config.tick_rate,
        clock.period()
    );

    while shared.is_running() {
        let elapsed = clock.wait_next();
        if !shared.is_running() {
            break;
        }

        let updates = {
            let mut state = shared.state.lock_priority();
            simulation.step(&mut state.world, elapsed);
            state.updates()
        };

        for (subscriber, update) in updates {
            match subscriber.send(&ServerMessage::WorldUpdate(update)) {
                Ok(()) => {}
                Err(e @ ChannelError::EncodingTooLarge { .. }) => {
                    log::error!("update for {} does not fit in a frame: {e}", subscriber.entity);
                    shared.emit(ServerEvent::Error {
                        message: format!("dropping {}: {e}", subscriber.entity),
                    });
                    subscriber.shutdown();
                }
                Err(e) => {
                    log::debug!("update to {} failed: {e}", subscriber.entity);
                    subscriber.shutdown();
                }
            }
        }
    }

    log::info!("tick loop stopped");
}
