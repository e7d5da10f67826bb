use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

const SPARKS: [char; 6] = ['*', '+', '✦', '✧', '·', '°'];

/// Spark flying out of the hatching egg
#[derive(Debug, Clone)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl Spark {
    fn new(x: f64, y: f64, rng: &mut impl Rng) -> Self {
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let speed = rng.gen_range(4.0..12.0);
        Self {
            x,
            y,
            // cells are roughly twice as tall as wide
            vel_x: angle.cos() * speed,
            vel_y: angle.sin() * speed / 2.0,
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.0..2.0),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_x *= 0.9;
        self.vel_y = self.vel_y * 0.9 + 3.0 * dt;
        self.age += dt;
        self.age < self.max_age
    }

    /// Remaining life in [0, 1], used for fading.
    pub fn life(&self) -> f64 {
        (1.0 - self.age / self.max_age).clamp(0.0, 1.0)
    }
}

/// One-shot burst played when the session evolves.
#[derive(Debug)]
pub struct TransformEffect {
    pub sparks: Vec<Spark>,
    pub duration: f64,
    pub is_active: bool,
    elapsed: f64,
    plays: u32,
}

impl TransformEffect {
    pub fn new() -> Self {
        Self {
            sparks: Vec::new(),
            duration: 2.0,
            is_active: false,
            elapsed: 0.0,
            plays: 0,
        }
    }

    /// Burst from `(center_x, center_y)`, relative to the companion's area.
    pub fn play(&mut self, center_x: f64, center_y: f64) {
        let mut rng = rand::thread_rng();
        self.sparks = (0..40).map(|_| Spark::new(center_x, center_y, &mut rng)).collect();
        self.elapsed = 0.0;
        self.is_active = true;
        self.plays += 1;
    }

    pub fn plays(&self) -> u32 {
        self.plays
    }

    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.is_active = false;
            self.sparks.clear();
            return;
        }
        self.sparks.retain_mut(|s| s.update(dt));
    }
}

impl Default for TransformEffect {
    fn default() -> Self {
        Self::new()
    }
}

/// Vertical hop of the evolved companion. Restarting always begins a new hop.
#[derive(Debug)]
pub struct Bounce {
    started_at: Option<Instant>,
    duration: Duration,
    restarts: u64,
}

pub const BOUNCE_HEIGHT: u16 = 2;

impl Bounce {
    pub fn new(duration: Duration) -> Self {
        Self {
            started_at: None,
            duration,
            restarts: 0,
        }
    }

    pub fn restart(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.restarts += 1;
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.progress(now).is_some()
    }

    fn progress(&self, now: Instant) -> Option<f64> {
        let started = self.started_at?;
        let elapsed = now.saturating_duration_since(started);
        (elapsed < self.duration).then(|| elapsed.as_secs_f64() / self.duration.as_secs_f64())
    }

    /// Rows the companion is lifted by at `now`.
    pub fn lift(&self, now: Instant) -> u16 {
        match self.progress(now) {
            // parabola peaking halfway through the hop
            Some(p) => (4.0 * p * (1.0 - p) * BOUNCE_HEIGHT as f64).round() as u16,
            None => 0,
        }
    }
}

impl Default for Bounce {
    fn default() -> Self {
        Self::new(Duration::from_millis(600))
    }
}
