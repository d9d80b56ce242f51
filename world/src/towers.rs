//! Authoritative tower state management utilities.

use iso_defence_core::{MobId, PlacementError, TileCoord, TowerId, TowerKind, MAX_TOWERS};

/// Tower stored inside the world.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Tower {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Tile occupied by the tower.
    pub(crate) tile: TileCoord,
    /// Mob the tower currently tracks.
    pub(crate) target: Option<MobId>,
    /// Seconds accumulated toward the next shot.
    pub(crate) time_since_last_shot: f32,
}

/// Fixed pool of tower slots.
#[derive(Debug, Default)]
pub(crate) struct TowerPool {
    slots: [Option<Tower>; MAX_TOWERS],
}

impl TowerPool {
    /// Stores a tower of `kind` on `tile` in the first free slot.
    ///
    /// Path and bounds checks happen before the call; the pool only knows about occupancy.
    pub(crate) fn place(
        &mut self,
        kind: TowerKind,
        tile: TileCoord,
    ) -> Result<TowerId, PlacementError> {
        if self.at(tile).is_some() {
            return Err(PlacementError::Occupied);
        }

        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
            .ok_or(PlacementError::PoolExhausted)?;

        let id = TowerId::new(index as u32);
        *slot = Some(Tower {
            id,
            kind,
            tile,
            target: None,
            time_since_last_shot: kind.stats().seconds_per_shot(),
        });
        Ok(id)
    }

    /// Frees the slot of the tower standing on `tile`.
    pub(crate) fn remove(&mut self, tile: TileCoord) -> Option<Tower> {
        self.slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(tower) if tower.tile == tile))
            .and_then(Option::take)
    }

    pub(crate) fn at(&self, tile: TileCoord) -> Option<&Tower> {
        self.iter().find(|tower| tower.tile == tile)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.slots.iter().flatten()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.slots.iter_mut().flatten()
    }
}
