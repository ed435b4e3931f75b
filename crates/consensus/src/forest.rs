//! Levelled forest of proposed blocks.
//!
//! Blocks are indexed by id and by level (= view). Parent relations are
//! lookups through each block's certificate, not owned pointers, so forks
//! and orphans are representable without cycles. Orphans are tolerated:
//! a block may arrive before its parent and is attached implicitly once the
//! parent is inserted.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use trichain_types::{Block, BlockId, View};

/// Errors from forest maintenance.
#[derive(Debug, Error)]
pub enum ForestError {
    #[error("cannot prune to level {level}: lowest retained level is {lowest}")]
    PruneBelowRoot { level: View, lowest: View },
}

/// A forest of blocks indexed by id and by level.
#[derive(Debug, Default)]
pub struct LevelledForest {
    vertices: HashMap<BlockId, Block>,
    by_level: BTreeMap<View, Vec<BlockId>>,
    lowest_level: View,
}

impl LevelledForest {
    pub fn new() -> Self {
        LevelledForest::default()
    }

    /// Insert a block. Idempotent on duplicate id.
    pub fn add_vertex(&mut self, block: Block) {
        if self.vertices.contains_key(&block.id) {
            return;
        }
        self.by_level.entry(block.level()).or_default().push(block.id);
        self.vertices.insert(block.id, block);
    }

    /// Look up a block by id.
    pub fn get_vertex(&self, id: &BlockId) -> Option<&Block> {
        self.vertices.get(id)
    }

    /// Whether a block with this id is retained.
    pub fn contains(&self, id: &BlockId) -> bool {
        self.vertices.contains_key(id)
    }

    /// Iterate over the children of `id`: retained blocks whose certificate
    /// points at it. Order is unspecified but stable within a call.
    pub fn children<'a>(&'a self, id: &'a BlockId) -> impl Iterator<Item = &'a Block> + 'a {
        self.by_level
            .values()
            .flatten()
            .filter_map(move |child| self.vertices.get(child))
            .filter(move |block| block.parent().0 == *id)
    }

    /// Drop every block with level below `level`, along with the level
    /// index entries. Fails if `level` is below the lowest retained level.
    pub fn prune_up_to_level(&mut self, level: View) -> Result<(), ForestError> {
        if level < self.lowest_level {
            return Err(ForestError::PruneBelowRoot {
                level,
                lowest: self.lowest_level,
            });
        }
        let pruned: Vec<View> = self.by_level.range(..level).map(|(l, _)| *l).collect();
        for l in pruned {
            if let Some(ids) = self.by_level.remove(&l) {
                for id in ids {
                    self.vertices.remove(&id);
                }
            }
        }
        self.lowest_level = level;
        Ok(())
    }

    /// The smallest level currently retained.
    pub fn lowest_level(&self) -> View {
        self.lowest_level
    }

    /// Number of retained blocks.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
