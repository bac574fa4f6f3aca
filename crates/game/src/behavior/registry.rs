use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Behavior, BehaviorId, RandomWalk, RunAwayFromPlayer, StopNearPlayer};

/// One entry of the behavior list in the server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorConfig {
    RandomWalk(RandomWalk),
    StopNearPlayer(StopNearPlayer),
    RunAwayFromPlayer(RunAwayFromPlayer),
}

impl BehaviorConfig {
    pub fn build(&self) -> Arc<dyn Behavior> {
        match self {
            Self::RandomWalk(b) => Arc::new(b.clone()),
            Self::StopNearPlayer(b) => Arc::new(b.clone()),
            Self::RunAwayFromPlayer(b) => Arc::new(b.clone()),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::RandomWalk(RandomWalk::default()),
            Self::StopNearPlayer(StopNearPlayer::default()),
            Self::RunAwayFromPlayer(RunAwayFromPlayer::default()),
        ]
    }
}

/// Registered behaviors in evaluation order. Earlier entries win ties.
#[derive(Debug, Default, Clone)]
pub struct BehaviorRegistry {
    behaviors: Vec<Arc<dyn Behavior>>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[BehaviorConfig]) -> Self {
        let mut registry = Self::new();
        for config in configs {
            registry.register(config.build());
        }
        registry
    }

    pub fn register(&mut self, behavior: Arc<dyn Behavior>) -> BehaviorId {
        let id = BehaviorId(self.behaviors.len());
        log::debug!("registered behavior {} as {:?}", behavior.name(), id);
        self.behaviors.push(behavior);
        id
    }

    pub fn get(&self, id: BehaviorId) -> Option<&Arc<dyn Behavior>> {
        self.behaviors.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BehaviorId, &Arc<dyn Behavior>)> {
        self.behaviors
            .iter()
            .enumerate()
            .map(|(index, behavior)| (BehaviorId(index), behavior))
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}
