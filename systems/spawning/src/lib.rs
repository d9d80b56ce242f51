#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave spawner responsible for emitting wave activation and mob spawn commands.
//!
//! Every wave counts down its own start delay from the moment the scene
//! loads, but waves activate strictly in declaration order: a wave whose
//! delay ran out waits for every earlier wave to activate first. Once active,
//! a wave releases its first mob immediately and one more mob each time the
//! spawn cooldown elapses, carrying any surplus time over to the next spawn.
//!
//! A wave that activates partway through a frame is credited with the rest
//! of that frame, so spawn times do not depend on how time is split into
//! frames.

use std::time::Duration;

use iso_defence_core::{Command, Event, WaveDefinition, WaveIndex, WaveStatus};
use tracing::info;

/// Configuration parameters required to construct the wave spawner.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_cooldown: Duration,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence.
    #[must_use]
    pub const fn new(spawn_cooldown: Duration) -> Self {
        Self { spawn_cooldown }
    }

    /// Interval between two mobs of the same wave.
    #[must_use]
    pub const fn spawn_cooldown(&self) -> Duration {
        self.spawn_cooldown
    }
}

#[derive(Clone, Debug)]
struct WaveTimer {
    status: WaveStatus,
    start_remaining: Duration,
    overdue: Duration,
    mob_count: u32,
    remaining: u32,
    since_spawn: Duration,
}

/// Pure system that tracks wave timers and emits spawn commands.
#[derive(Debug)]
pub struct WaveSpawner {
    spawn_cooldown: Duration,
    waves: Vec<WaveTimer>,
    next_wave: usize,
}

impl WaveSpawner {
    /// Creates a spawner for the provided waves, none of them started.
    #[must_use]
    pub fn new(config: Config, waves: &[WaveDefinition]) -> Self {
        Self {
            spawn_cooldown: config.spawn_cooldown,
            waves: waves
                .iter()
                .map(|wave| WaveTimer {
                    status: WaveStatus::NotStarted,
                    start_remaining: Duration::try_from_secs_f32(wave.start_delay)
                        .unwrap_or(Duration::ZERO),
                    overdue: Duration::ZERO,
                    mob_count: wave.mob_count,
                    remaining: wave.mob_count,
                    since_spawn: Duration::ZERO,
                })
                .collect(),
            next_wave: 0,
        }
    }

    /// Consumes the frame's events to advance wave timers and emit spawn commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        if elapsed.is_zero() {
            return;
        }

        let cooldown = self.spawn_cooldown;
        for (index, wave) in self.waves.iter_mut().enumerate() {
            match wave.status {
                WaveStatus::NotStarted => {
                    let late = elapsed.saturating_sub(wave.start_remaining);
                    wave.overdue = wave.overdue.saturating_add(late);
                    wave.start_remaining = wave.start_remaining.saturating_sub(elapsed);
                }
                WaveStatus::Started => {
                    wave.since_spawn = wave.since_spawn.saturating_add(elapsed);
                    wave.release_due(index, cooldown, out);
                }
                WaveStatus::Ended => {}
            }
        }

        while let Some(wave) = self
            .waves
            .get(self.next_wave)
            .filter(|wave| wave.start_remaining.is_zero())
        {
            let credit = wave.overdue;
            let _ = self.activate_next(credit, out);
        }
    }

    /// Activates the next wave in sequence, ignoring its remaining start delay.
    ///
    /// Returns `None` once every wave has started.
    pub fn start_next_wave(&mut self, out: &mut Vec<Command>) -> Option<WaveIndex> {
        self.activate_next(Duration::ZERO, out)
    }

    /// Starts the next wave as if it had been active for `credit` already.
    fn activate_next(&mut self, credit: Duration, out: &mut Vec<Command>) -> Option<WaveIndex> {
        let index = self.next_wave;
        let cooldown = self.spawn_cooldown;
        let wave = self.waves.get_mut(index)?;
        let id = WaveIndex::new(index as u32);

        wave.status = WaveStatus::Started;
        wave.start_remaining = Duration::ZERO;
        wave.overdue = Duration::ZERO;
        wave.since_spawn = credit;
        out.push(Command::ActivateWave { wave: id });
        info!(wave = id.get(), mobs = wave.mob_count, "starting wave");

        if wave.remaining > 0 {
            wave.remaining -= 1;
            out.push(Command::SpawnMob { wave: id });
        }
        wave.release_due(index, cooldown, out);

        // The following wave cannot have been waiting longer than this one ran.
        if let Some(next) = self.waves.get_mut(index + 1) {
            next.overdue = next.overdue.min(credit);
        }

        self.next_wave += 1;
        Some(id)
    }

    /// Status of the wave, if it exists.
    #[must_use]
    pub fn status(&self, wave: WaveIndex) -> Option<WaveStatus> {
        self.waves.get(wave.index()).map(|timer| timer.status)
    }

    /// Number of mobs the wave still has to release.
    #[must_use]
    pub fn remaining(&self, wave: WaveIndex) -> Option<u32> {
        self.waves.get(wave.index()).map(|timer| timer.remaining)
    }

    /// Number of mobs the wave already released.
    #[must_use]
    pub fn spawned(&self, wave: WaveIndex) -> Option<u32> {
        self.waves
            .get(wave.index())
            .map(|timer| timer.mob_count - timer.remaining)
    }

    /// Seconds left before the wave activates on its own.
    #[must_use]
    pub fn time_until_start(&self, wave: WaveIndex) -> Option<Duration> {
        self.waves
            .get(wave.index())
            .map(|timer| timer.start_remaining)
    }

    /// Wave that activates next, if any remain.
    #[must_use]
    pub fn next_wave(&self) -> Option<WaveIndex> {
        (self.next_wave < self.waves.len()).then(|| WaveIndex::new(self.next_wave as u32))
    }

    /// Reports whether every wave released all of its mobs.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.waves
            .iter()
            .all(|wave| wave.status == WaveStatus::Ended)
    }
}

impl WaveTimer {
    fn release_due(&mut self, index: usize, cooldown: Duration, out: &mut Vec<Command>) {
        while self.remaining > 0 && self.since_spawn >= cooldown {
            self.since_spawn -= cooldown;
            self.remaining -= 1;
            out.push(Command::SpawnMob {
                wave: WaveIndex::new(index as u32),
            });
        }
        self.end_if_exhausted();
    }

    fn end_if_exhausted(&mut self) {
        if self.remaining == 0 {
            self.status = WaveStatus::Ended;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_defence_core::MobKind;

    fn tick(millis: u64) -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }]
    }

    fn spawner(waves: &[WaveDefinition]) -> WaveSpawner {
        WaveSpawner::new(Config::new(Duration::from_millis(400)), waves)
    }

    #[test]
    fn zero_delay_wave_starts_on_first_frame() {
        let mut spawner = spawner(&[WaveDefinition::new(0.0, MobKind::Red, 3)]);
        let mut out = Vec::new();

        spawner.handle(&tick(16), &mut out);

        let wave = WaveIndex::new(0);
        assert_eq!(
            out,
            vec![Command::ActivateWave { wave }, Command::SpawnMob { wave }]
        );
        assert_eq!(spawner.status(wave), Some(WaveStatus::Started));
        assert_eq!(spawner.remaining(wave), Some(2));
    }

    #[test]
    fn frames_without_time_change_nothing() {
        let mut spawner = spawner(&[WaveDefinition::new(0.0, MobKind::Red, 3)]);
        let mut out = Vec::new();
        spawner.handle(&[], &mut out);
        assert!(out.is_empty());
        assert_eq!(spawner.status(WaveIndex::new(0)), Some(WaveStatus::NotStarted));
    }

    #[test]
    fn later_wave_waits_for_earlier_ones() {
        let mut spawner = spawner(&[
            WaveDefinition::new(5.0, MobKind::Red, 1),
            WaveDefinition::new(1.0, MobKind::Blue, 1),
        ]);
        let mut out = Vec::new();

        spawner.handle(&tick(2_000), &mut out);
        assert!(out.is_empty(), "second wave is blocked by the first");

        spawner.handle(&tick(3_000), &mut out);
        assert_eq!(
            out,
            vec![
                Command::ActivateWave {
                    wave: WaveIndex::new(0)
                },
                Command::SpawnMob {
                    wave: WaveIndex::new(0)
                },
                Command::ActivateWave {
                    wave: WaveIndex::new(1)
                },
                Command::SpawnMob {
                    wave: WaveIndex::new(1)
                },
            ]
        );
        assert!(spawner.is_finished());
    }

    #[test]
    fn explicit_start_skips_the_delay_and_reports_exhaustion() {
        let mut spawner = spawner(&[WaveDefinition::new(30.0, MobKind::Red, 2)]);
        let mut out = Vec::new();

        assert_eq!(spawner.start_next_wave(&mut out), Some(WaveIndex::new(0)));
        assert_eq!(spawner.start_next_wave(&mut out), None);
        assert_eq!(spawner.next_wave(), None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn activation_mid_frame_keeps_the_rest_of_the_frame() {
        let mut spawner = spawner(&[WaveDefinition::new(0.1, MobKind::Red, 3)]);
        let mut out = Vec::new();

        spawner.handle(&tick(300), &mut out);
        assert_eq!(spawner.spawned(WaveIndex::new(0)), Some(1));

        spawner.handle(&tick(300), &mut out);
        assert_eq!(
            spawner.spawned(WaveIndex::new(0)),
            Some(2),
            "second mob is due 0.4 s after the 0.1 s activation"
        );
    }

    #[test]
    fn explicit_start_does_not_credit_time_spent_waiting() {
        let mut spawner = spawner(&[
            WaveDefinition::new(10.0, MobKind::Red, 1),
            WaveDefinition::new(1.0, MobKind::Blue, 4),
        ]);
        let mut out = Vec::new();

        spawner.handle(&tick(5_000), &mut out);
        assert!(out.is_empty());
        let _ = spawner.start_next_wave(&mut out);
        out.clear();

        spawner.handle(&tick(100), &mut out);
        assert_eq!(spawner.spawned(WaveIndex::new(1)), Some(1));
    }

    #[test]
    fn empty_wave_ends_on_activation() {
        let mut spawner = spawner(&[WaveDefinition::new(0.0, MobKind::Red, 0)]);
        let mut out = Vec::new();
        spawner.handle(&tick(10), &mut out);
        assert_eq!(
            out,
            vec![Command::ActivateWave {
                wave: WaveIndex::new(0)
            }]
        );
        assert_eq!(spawner.status(WaveIndex::new(0)), Some(WaveStatus::Ended));
    }
}
