#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that keeps every tower pointed at a deterministic target.
//!
//! Range is an ellipse around the tower's tile center whose horizontal radius
//! is the tower range scaled by the zoom factor and whose vertical radius is
//! half of that, matching the isometric range indicator. A tower keeps its
//! current target while that mob is alive and inside the ellipse; otherwise it
//! picks the alive mob in range that walked the largest share of the path.

use glam::Vec2;
use iso_defence_core::{
    point_in_ellipse, Command, MobId, MobSnapshot, MobView, TowerSnapshot, TowerView,
};

/// Tower targeting system that reuses a scratch buffer of candidates.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    candidates: Vec<Candidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::AssignTarget` for every tower whose target changes.
    ///
    /// Towers whose current target is still valid produce no command.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        mobs: &MobView,
        zoom: f32,
        out: &mut Vec<Command>,
    ) {
        if towers.is_empty() {
            return;
        }

        self.prepare_candidates(mobs);

        for tower in towers.iter() {
            if let Some(current) = tower.target.and_then(|id| mobs.get(id)) {
                if current.is_alive() && in_range(tower, current.position, zoom) {
                    continue;
                }
            }

            let selected = best_in_range(&self.candidates, tower, zoom);
            if selected != tower.target {
                out.push(Command::AssignTarget {
                    tower: tower.id,
                    target: selected,
                });
            }
        }
    }

    fn prepare_candidates(&mut self, mobs: &MobView) {
        self.candidates.clear();
        self.candidates
            .extend(mobs.alive().map(Candidate::from_snapshot));
    }
}

/// Picks the alive mob inside the tower's range that is closest to the goal.
///
/// Ties on path progress resolve to the lower mob identifier.
#[must_use]
pub fn select_target(tower: &TowerSnapshot, mobs: &MobView, zoom: f32) -> Option<MobId> {
    let candidates: Vec<_> = mobs.alive().map(Candidate::from_snapshot).collect();
    best_in_range(&candidates, tower, zoom)
}

/// Reports whether `point` lies inside the tower's range ellipse at `zoom`.
#[must_use]
pub fn in_range(tower: &TowerSnapshot, point: Vec2, zoom: f32) -> bool {
    let horizontal = tower.kind.stats().range * zoom;
    point_in_ellipse(point, tower.center, horizontal, horizontal / 2.0)
}

fn best_in_range(candidates: &[Candidate], tower: &TowerSnapshot, zoom: f32) -> Option<MobId> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        if !in_range(tower, candidate.position, zoom) {
            continue;
        }
        match best {
            Some(existing) if !candidate.precedes(existing) => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|candidate| candidate.id)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    id: MobId,
    position: Vec2,
    percent_traveled: f32,
}

impl Candidate {
    fn from_snapshot(snapshot: &MobSnapshot) -> Self {
        Self {
            id: snapshot.id,
            position: snapshot.position,
            percent_traveled: snapshot.percent_traveled,
        }
    }

    fn precedes(&self, other: &Self) -> bool {
        if self.percent_traveled != other.percent_traveled {
            return self.percent_traveled > other.percent_traveled;
        }
        self.id < other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_defence_core::{MobKind, MobStatus, TileCoord, TowerId, TowerKind, WaveIndex};

    fn tower(id: u32, kind: TowerKind, center: Vec2, target: Option<u32>) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind,
            tile: TileCoord::new(0, 0),
            center,
            target: target.map(MobId::new),
            time_since_last_shot: 0.0,
        }
    }

    fn mob(id: u32, position: Vec2, percent_traveled: f32, status: MobStatus) -> MobSnapshot {
        MobSnapshot {
            id: MobId::new(id),
            kind: MobKind::Red,
            wave: WaveIndex::new(0),
            status,
            health: 100,
            max_health: 100,
            position,
            target_waypoint: 1,
            time_in_segment: 0.0,
            percent_traveled,
        }
    }

    fn handle(towers: Vec<TowerSnapshot>, mobs: Vec<MobSnapshot>, zoom: f32) -> Vec<Command> {
        let mut system = TowerTargeting::new();
        let mut out = Vec::new();
        system.handle(
            &TowerView::from_snapshots(towers),
            &MobView::from_snapshots(mobs),
            zoom,
            &mut out,
        );
        out
    }

    #[test]
    fn range_is_an_ellipse_half_as_tall_as_wide() {
        let rapid = tower(0, TowerKind::Rapid, Vec2::ZERO, None);
        let range = TowerKind::Rapid.stats().range;

        assert!(in_range(&rapid, Vec2::new(range - 1.0, 0.0), 1.0));
        assert!(in_range(&rapid, Vec2::new(0.0, range / 2.0 - 1.0), 1.0));
        assert!(!in_range(&rapid, Vec2::new(0.0, range / 2.0 + 1.0), 1.0));
        assert!(in_range(&rapid, Vec2::new(0.0, range / 2.0 + 1.0), 2.0));
    }

    #[test]
    fn most_traveled_mob_in_range_wins() {
        let out = handle(
            vec![tower(0, TowerKind::Cannon, Vec2::ZERO, None)],
            vec![
                mob(0, Vec2::new(10.0, 0.0), 20.0, MobStatus::Alive),
                mob(1, Vec2::new(50.0, 10.0), 45.0, MobStatus::Alive),
                mob(2, Vec2::new(900.0, 0.0), 90.0, MobStatus::Alive),
                mob(3, Vec2::new(5.0, 0.0), 99.0, MobStatus::Dead),
            ],
            1.0,
        );
        assert_eq!(
            out,
            vec![Command::AssignTarget {
                tower: TowerId::new(0),
                target: Some(MobId::new(1)),
            }]
        );
    }

    #[test]
    fn equal_progress_prefers_lower_identifier() {
        let snapshot = tower(0, TowerKind::Frost, Vec2::ZERO, None);
        let mobs = MobView::from_snapshots(vec![
            mob(4, Vec2::new(30.0, 0.0), 50.0, MobStatus::Alive),
            mob(2, Vec2::new(-30.0, 0.0), 50.0, MobStatus::Alive),
        ]);
        assert_eq!(select_target(&snapshot, &mobs, 1.0), Some(MobId::new(2)));
        assert_eq!(select_target(&snapshot, &mobs, 1.0), Some(MobId::new(2)));
    }

    #[test]
    fn valid_target_is_kept_even_when_another_mob_leads() {
        let out = handle(
            vec![tower(0, TowerKind::Rapid, Vec2::ZERO, Some(0))],
            vec![
                mob(0, Vec2::new(10.0, 0.0), 10.0, MobStatus::Alive),
                mob(1, Vec2::new(20.0, 0.0), 80.0, MobStatus::Alive),
            ],
            1.0,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn dead_or_escaped_targets_are_replaced_or_cleared() {
        let out = handle(
            vec![
                tower(0, TowerKind::Rapid, Vec2::ZERO, Some(0)),
                tower(1, TowerKind::Rapid, Vec2::new(5_000.0, 0.0), Some(1)),
            ],
            vec![
                mob(0, Vec2::new(10.0, 0.0), 30.0, MobStatus::Dead),
                mob(1, Vec2::new(20.0, 0.0), 60.0, MobStatus::Inactive),
                mob(2, Vec2::new(30.0, 0.0), 40.0, MobStatus::Alive),
            ],
            1.0,
        );
        assert_eq!(
            out,
            vec![
                Command::AssignTarget {
                    tower: TowerId::new(0),
                    target: Some(MobId::new(2)),
                },
                Command::AssignTarget {
                    tower: TowerId::new(1),
                    target: None,
                },
            ]
        );
    }

    #[test]
    fn zooming_out_drops_targets_that_left_the_ellipse() {
        let out = handle(
            vec![tower(0, TowerKind::Frost, Vec2::ZERO, Some(0))],
            vec![mob(0, Vec2::new(200.0, 0.0), 10.0, MobStatus::Alive)],
            0.5,
        );
        assert_eq!(
            out,
            vec![Command::AssignTarget {
                tower: TowerId::new(0),
                target: None,
            }]
        );
    }
}
