use std::collections::HashMap;

use crate::net::BlockUpdate;

/// Append-only record of block edits, plus the material each edit left
/// behind.
///
/// Readers keep their own cursor into the log and ask for the edits after
/// it, so every reader sees every edit in the order it was recorded.
#[derive(Debug, Default)]
pub struct BlockLog {
    edits: Vec<BlockUpdate>,
    materials: HashMap<[i32; 3], u16>,
}

impl BlockLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, updates: &[BlockUpdate]) {
        self.edits.extend_from_slice(updates);
        for update in updates {
            self.materials.insert(update.pos, update.material);
        }
    }

    /// Total edits recorded; a cursor equal to this is fully caught up.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Up to `limit` edits following `cursor`.
    pub fn since(&self, cursor: usize, limit: usize) -> &[BlockUpdate] {
        let start = cursor.min(self.edits.len());
        let end = start.saturating_add(limit).min(self.edits.len());
        &self.edits[start..end]
    }

    /// Material last written at `pos`, if anyone edited it.
    pub fn material_at(&self, pos: [i32; 3]) -> Option<u16> {
        self.materials.get(&pos).copied()
    }

    pub fn edited_blocks(&self) -> usize {
        self.materials.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(x: i32, material: u16) -> BlockUpdate {
        BlockUpdate {
            pos: [x, 0, 0],
            material,
        }
    }

    #[test]
    fn later_edits_win() {
        let mut log = BlockLog::new();
        log.record(&[edit(1, 3), edit(2, 5)]);
        log.record(&[edit(1, 0)]);

        assert_eq!(log.len(), 3);
        assert_eq!(log.edited_blocks(), 2);
        assert_eq!(log.material_at([1, 0, 0]), Some(0));
        assert_eq!(log.material_at([2, 0, 0]), Some(5));
        assert_eq!(log.material_at([9, 9, 9]), None);
    }

    #[test]
    fn since_returns_bounded_tail() {
        let mut log = BlockLog::new();
        assert!(log.is_empty());
        log.record(&(0..10).map(|x| edit(x, 1)).collect::<Vec<_>>());

        assert_eq!(log.since(0, 4), &[edit(0, 1), edit(1, 1), edit(2, 1), edit(3, 1)]);
        assert_eq!(log.since(8, 4), &[edit(8, 1), edit(9, 1)]);
        assert!(log.since(10, 4).is_empty());
        assert!(log.since(50, usize::MAX).is_empty());
    }
}
