//! Single-target spawner for the hunt screen
//!
//! Coordinates are percentages of the screen. Targets always spawn outside the
//! visible area and cross it horizontally; only one target is alive at a time.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

pub const DEFAULT_SPAWN_EVERY_MS: u64 = 950;
pub const MIN_SPAWN_EVERY_MS: u64 = 200;
pub const MAX_SPAWN_EVERY_MS: u64 = 5000;

/// Longest step a single tick may advance, so a stalled host cannot teleport targets
const MAX_STEP_SECS: f64 = 0.05;
/// Vertical band targets fly through
const Y_MIN: f64 = 28.0;
const Y_MAX: f64 = 72.0;
/// Distance outside the screen edge where targets start and end
const EDGE_MARGIN: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Squirrel,
    Rabbit,
    Deer,
    Bear,
    /// Only spawned right after a bear got away
    BearAttack,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Squirrel => "squirrel",
            TargetKind::Rabbit => "rabbit",
            TargetKind::Deer => "deer",
            TargetKind::Bear => "bear",
            TargetKind::BearAttack => "bear_attack",
        }
    }

    /// Sprite path for a target moving left to right (`facing_right`) or back.
    /// The attack sprite has a single facing.
    pub fn sprite(&self, facing_right: bool) -> String {
        match self {
            TargetKind::BearAttack => "assets/targets/bear-attack-target.webp".to_string(),
            kind => format!(
                "assets/targets/{}-{}-facing.webp",
                kind.as_str(),
                if facing_right { "right" } else { "left" }
            ),
        }
    }

    fn size_factor(&self) -> f64 {
        match self {
            TargetKind::BearAttack => 1.2,
            TargetKind::Bear => 1.15,
            TargetKind::Deer => 1.05,
            _ => 1.0,
        }
    }

    fn speed_factor(&self) -> f64 {
        match self {
            TargetKind::BearAttack => 1.25,
            TargetKind::Bear => 0.95,
            _ => 1.0,
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live target. `x`/`y` is the top-left corner, `size` both width and height.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub kind: TargetKind,
    pub from_left: bool,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Percent per second, negative when moving right to left
    pub velocity: f64,
    pub x_end: f64,
}

impl Target {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.size && y >= self.y && y <= self.y + self.size
    }

    pub fn sprite(&self) -> String {
        self.kind.sprite(self.from_left)
    }

    fn passed(&self) -> bool {
        (self.velocity > 0.0 && self.x >= self.x_end) || (self.velocity < 0.0 && self.x <= self.x_end)
    }
}

/// Something the runner did during a tick or a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerEvent {
    Spawned(TargetKind),
    Missed(TargetKind),
    Hit(TargetKind),
}

pub struct TargetRunner {
    rng: StdRng,
    spawn_every_ms: u64,
    spawn_timer_ms: f64,
    target: Option<Target>,
    pending_bear_attack: bool,
    score: u32,
    misses: u32,
}

impl Default for TargetRunner {
    fn default() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl TargetRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic runner for a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            spawn_every_ms: DEFAULT_SPAWN_EVERY_MS,
            spawn_timer_ms: 0.0,
            target: None,
            pending_bear_attack: false,
            score: 0,
            misses: 0,
        }
    }

    /// Milliseconds between a target leaving and the next one spawning
    pub fn set_spawn_every(&mut self, ms: u64) {
        self.spawn_every_ms = ms.clamp(MIN_SPAWN_EVERY_MS, MAX_SPAWN_EVERY_MS);
    }

    pub fn spawn_every(&self) -> u64 {
        self.spawn_every_ms
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    /// Advance the simulation by `elapsed`
    pub fn tick(&mut self, elapsed: Duration) -> Option<RunnerEvent> {
        let dt = elapsed.as_secs_f64().min(MAX_STEP_SECS);

        let Some(target) = self.target.as_mut() else {
            self.spawn_timer_ms += dt * 1000.0;
            if self.spawn_timer_ms >= self.spawn_every_ms as f64 {
                self.spawn_timer_ms = 0.0;
                let kind = self.choose_kind();
                self.spawn(kind);
                return Some(RunnerEvent::Spawned(kind));
            }
            return None;
        };

        self.spawn_timer_ms = 0.0;
        target.x += target.velocity * dt;
        if !target.passed() {
            return None;
        }

        let kind = target.kind;
        self.target = None;
        self.misses += 1;
        if kind == TargetKind::Bear {
            self.pending_bear_attack = true;
        }
        Some(RunnerEvent::Missed(kind))
    }

    /// Shoot at a point; removes the target when it is hit
    pub fn hit(&mut self, x: f64, y: f64) -> Option<RunnerEvent> {
        let kind = self.target.as_ref().filter(|t| t.contains(x, y))?.kind;
        self.target = None;
        self.score += 1;
        Some(RunnerEvent::Hit(kind))
    }

    /// Drop the live target, keeping score and the pending attack
    pub fn clear(&mut self) {
        self.target = None;
        self.spawn_timer_ms = 0.0;
    }

    fn choose_kind(&mut self) -> TargetKind {
        if self.pending_bear_attack {
            self.pending_bear_attack = false;
            return TargetKind::BearAttack;
        }
        match self.rng.random_range(0..98u32) {
            0..40 => TargetKind::Squirrel,
            40..70 => TargetKind::Rabbit,
            70..90 => TargetKind::Deer,
            _ => TargetKind::Bear,
        }
    }

    fn spawn(&mut self, kind: TargetKind) {
        let from_left = self.rng.random_bool(0.5);
        let size = (12.0 + self.rng.random::<f64>() * 6.0) * kind.size_factor();
        let speed = (22.0 + self.rng.random::<f64>() * 18.0) * kind.speed_factor();
        let y = Y_MIN + self.rng.random::<f64>() * (Y_MAX - Y_MIN);

        let left_out = -size - EDGE_MARGIN;
        let right_out = 100.0 + EDGE_MARGIN;
        let (x, x_end) = if from_left { (left_out, right_out) } else { (right_out, left_out) };

        log::debug!("Spawning {} from the {}", kind, if from_left { "left" } else { "right" });
        self.target = Some(Target {
            kind,
            from_left,
            x,
            y,
            size,
            velocity: if from_left { speed } else { -speed },
            x_end,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(50);

    fn run_until(runner: &mut TargetRunner, mut stop: impl FnMut(RunnerEvent) -> bool) -> RunnerEvent {
        for _ in 0..10_000 {
            if let Some(event) = runner.tick(FRAME) {
                if stop(event) {
                    return event;
                }
            }
        }
        panic!("runner never produced the expected event");
    }

    #[test]
    fn test_spawn_rate_is_clamped() {
        let mut runner = TargetRunner::seeded(1);
        assert_eq!(runner.spawn_every(), DEFAULT_SPAWN_EVERY_MS);
        runner.set_spawn_every(10);
        assert_eq!(runner.spawn_every(), MIN_SPAWN_EVERY_MS);
        runner.set_spawn_every(60_000);
        assert_eq!(runner.spawn_every(), MAX_SPAWN_EVERY_MS);
    }

    #[test]
    fn test_spawns_off_screen_inside_band() {
        let mut runner = TargetRunner::seeded(7);
        runner.set_spawn_every(200);
        for _ in 0..3 {
            assert!(runner.tick(FRAME).is_none());
        }
        assert!(matches!(runner.tick(FRAME), Some(RunnerEvent::Spawned(_))));

        let target = runner.target().unwrap();
        assert!(target.x + target.size < 0.0 || target.x > 100.0);
        assert!(target.y >= Y_MIN && target.y <= Y_MAX);
    }

    #[test]
    fn test_one_target_at_a_time() {
        let mut runner = TargetRunner::seeded(3);
        runner.set_spawn_every(200);
        run_until(&mut runner, |e| matches!(e, RunnerEvent::Spawned(_)));

        // No second spawn until the first one leaves
        let next = run_until(&mut runner, |_| true);
        assert!(matches!(next, RunnerEvent::Missed(_)));
        assert!(runner.target().is_none());
        assert_eq!(runner.misses(), 1);
    }

    #[test]
    fn test_missed_bear_triggers_attack() {
        let mut runner = TargetRunner::seeded(11);
        runner.set_spawn_every(200);
        runner.spawn(TargetKind::Bear);

        assert_eq!(run_until(&mut runner, |_| true), RunnerEvent::Missed(TargetKind::Bear));
        assert_eq!(run_until(&mut runner, |_| true), RunnerEvent::Spawned(TargetKind::BearAttack));
    }

    #[test]
    fn test_hit_scores_and_clears() {
        let mut runner = TargetRunner::seeded(5);
        runner.spawn(TargetKind::Deer);
        let (cx, cy) = {
            let t = runner.target().unwrap();
            (t.x + t.size / 2.0, t.y + t.size / 2.0)
        };

        assert_eq!(runner.hit(-50.0, -50.0), None);
        assert_eq!(runner.hit(cx, cy), Some(RunnerEvent::Hit(TargetKind::Deer)));
        assert_eq!(runner.score(), 1);
        assert!(runner.target().is_none());
        assert_eq!(runner.hit(cx, cy), None);
    }

    #[test]
    fn test_regular_spawns_never_attack() {
        let mut runner = TargetRunner::seeded(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let kind = runner.choose_kind();
            assert_ne!(kind, TargetKind::BearAttack);
            seen.insert(kind);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_sprite_paths() {
        assert_eq!(TargetKind::Rabbit.sprite(true), "assets/targets/rabbit-right-facing.webp");
        assert_eq!(TargetKind::Bear.sprite(false), "assets/targets/bear-left-facing.webp");
        assert_eq!(TargetKind::BearAttack.sprite(false), "assets/targets/bear-attack-target.webp");
    }
}
