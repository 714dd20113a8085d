//! Decorative background effects: a rising particle field tuned per
//! screen, and fireworks on the completion screen.
//!
//! Both are keyed by their input (screen name / active flag / terminal
//! size) and rebuild from scratch when it changes. Coordinates are in
//! terminal cells; speeds in cells per second.

use crossterm::style::Color;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const FRAME_MS: f32 = 1000.0 / 60.0;

// ── Particle field ──

struct FieldStyle {
    /// Particles per terminal cell.
    density: f32,
    speed: f32,
    /// Chance per frame that the field jitters sideways.
    glitch: f32,
    colors: &'static [Color],
}

const CYAN: Color = Color::Rgb { r: 0, g: 255, b: 255 };
const WHITE: Color = Color::Rgb { r: 255, g: 255, b: 255 };
const VIOLET: Color = Color::Rgb { r: 138, g: 43, b: 226 };
const LIME: Color = Color::Rgb { r: 50, g: 205, b: 50 };
const ORANGE: Color = Color::Rgb { r: 255, g: 69, b: 0 };
const YELLOW: Color = Color::Rgb { r: 255, g: 255, b: 0 };

fn style_for(screen: &str) -> FieldStyle {
    match screen {
        "registration" => FieldStyle { density: 0.007, speed: 4.0, glitch: 0.005, colors: &[CYAN, VIOLET] },
        "briefing" => FieldStyle { density: 0.010, speed: 5.0, glitch: 0.01, colors: &[LIME, CYAN] },
        "level1" => FieldStyle { density: 0.013, speed: 7.5, glitch: 0.02, colors: &[ORANGE, CYAN, YELLOW] },
        "level2" => FieldStyle { density: 0.012, speed: 6.0, glitch: 0.015, colors: &[LIME, CYAN, VIOLET] },
        "level3" => FieldStyle { density: 0.017, speed: 10.0, glitch: 0.03, colors: &[CYAN, VIOLET, ORANGE] },
        _ => FieldStyle { density: 0.020, speed: 12.5, glitch: 0.05, colors: &[CYAN, WHITE] },
    }
}

pub struct Particle {
    pub x: f32,
    pub y: f32,
    speed: f32,
    pub color: Color,
    pub trail: usize,
}

pub struct ParticleField {
    key: Option<(String, u16, u16)>,
    particles: Vec<Particle>,
    style: FieldStyle,
    glitch_offset: i32,
    rng: SmallRng,
}

impl ParticleField {
    pub fn new(seed: u64) -> Self {
        ParticleField {
            key: None,
            particles: Vec::new(),
            style: style_for(""),
            glitch_offset: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Rebuild the field if the screen or terminal size changed.
    pub fn sync(&mut self, screen: &str, width: u16, height: u16) {
        let key = (screen.to_string(), width, height);
        if self.key.as_ref() == Some(&key) {
            return;
        }
        self.style = style_for(screen);
        let count = (width as f32 * height as f32 * self.style.density).round() as usize;
        self.particles.clear();
        for _ in 0..count {
            let y = self.rng.gen_range(0.0..height.max(1) as f32);
            let p = self.spawn(width, y);
            self.particles.push(p);
        }
        self.key = Some(key);
    }

    fn spawn(&mut self, width: u16, y: f32) -> Particle {
        let colors = self.style.colors;
        Particle {
            x: self.rng.gen_range(0.0..width.max(1) as f32),
            y,
            speed: self.rng.gen_range(0.5..1.0) * self.style.speed,
            color: colors[self.rng.gen_range(0..colors.len())],
            trail: self.rng.gen_range(2..6),
        }
    }

    pub fn advance(&mut self, dt: u64) {
        let Some((_, width, height)) = self.key.clone() else {
            return;
        };
        let secs = dt as f32 / 1000.0;
        for i in 0..self.particles.len() {
            let p = &mut self.particles[i];
            p.y -= p.speed * secs;
            if p.y < -(p.trail as f32) {
                let below = height as f32 + self.rng.gen_range(0.0..3.0);
                self.particles[i] = self.spawn(width, below);
            }
        }
        let frames = (dt as f32 / FRAME_MS).max(1.0);
        let chance = 1.0 - (1.0 - self.style.glitch).powf(frames);
        self.glitch_offset = if self.rng.gen_bool(chance.clamp(0.0, 1.0) as f64) {
            self.rng.gen_range(-1..=1)
        } else {
            0
        };
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Sideways jitter for this frame, in columns.
    pub fn glitch_offset(&self) -> i32 {
        self.glitch_offset
    }
}

// ── Fireworks ──

struct Rocket {
    x: f32,
    y: f32,
    tx: f32,
    ty: f32,
    hue: f32,
}

pub struct Spark {
    pub x: f32,
    pub y: f32,
    vx: f32,
    vy: f32,
    pub alpha: f32,
    decay: f32,
    pub hue: f32,
}

pub struct Fireworks {
    active: bool,
    rockets: Vec<Rocket>,
    sparks: Vec<Spark>,
    launch_in_ms: f32,
    hue: f32,
    rng: SmallRng,
}

const ROCKET_SPEED: f32 = 30.0;
const SPARKS_PER_BURST: usize = 30;

impl Fireworks {
    pub fn new(seed: u64) -> Self {
        Fireworks {
            active: false,
            rockets: Vec::new(),
            sparks: Vec::new(),
            launch_in_ms: 80.0 * FRAME_MS,
            hue: 120.0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Turning the show on or off starts it over.
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.active = active;
            self.rockets.clear();
            self.sparks.clear();
            self.launch_in_ms = 80.0 * FRAME_MS;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn advance(&mut self, dt: u64, width: u16, height: u16) {
        if !self.active {
            return;
        }
        let secs = dt as f32 / 1000.0;
        let frames = dt as f32 / FRAME_MS;

        let mut bursts = Vec::new();
        self.rockets.retain_mut(|r| {
            let (dx, dy) = (r.tx - r.x, r.ty - r.y);
            let dist = (dx * dx + dy * dy).sqrt();
            let step = ROCKET_SPEED * secs;
            if step >= dist {
                bursts.push((r.tx, r.ty, r.hue));
                false
            } else {
                r.x += dx / dist * step;
                r.y += dy / dist * step;
                true
            }
        });
        for (x, y, hue) in bursts {
            self.burst(x, y, hue);
        }

        self.sparks.retain_mut(|s| {
            s.x += s.vx * secs;
            s.y += s.vy * secs;
            s.alpha -= s.decay * frames;
            s.alpha > s.decay
        });

        self.launch_in_ms -= dt as f32;
        if self.launch_in_ms <= 0.0 {
            self.launch(width, height);
            self.launch_in_ms = self.rng.gen_range(60.0..100.0) * FRAME_MS;
        }
    }

    fn launch(&mut self, width: u16, height: u16) {
        let (w, h) = (width.max(1) as f32, height.max(2) as f32);
        self.rockets.push(Rocket {
            x: w / 2.0,
            y: h,
            tx: self.rng.gen_range(0.0..w),
            ty: self.rng.gen_range(0.0..h / 2.0),
            hue: self.hue,
        });
        self.hue = (self.hue + self.rng.gen_range(10.0..20.0)) % 360.0;
    }

    fn burst(&mut self, x: f32, y: f32, hue: f32) {
        for _ in 0..SPARKS_PER_BURST {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.gen_range(3.0..30.0);
            self.sparks.push(Spark {
                x,
                y,
                vx: angle.cos() * speed,
                // Cells are about twice as tall as they are wide.
                vy: angle.sin() * speed * 0.5,
                alpha: 1.0,
                decay: self.rng.gen_range(0.015..0.03),
                hue,
            });
        }
    }

    /// Rocket heads as (x, y, hue).
    pub fn rockets(&self) -> impl Iterator<Item = (f32, f32, f32)> + '_ {
        self.rockets.iter().map(|r| (r.x, r.y, r.hue))
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }
}

/// HSL (s = l = 0.5) to an RGB terminal color, scaled by `alpha`.
pub fn hue_color(hue: f32, alpha: f32) -> Color {
    let (s, l) = (0.5_f32, 0.5_f32);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = (hue.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let a = alpha.clamp(0.0, 1.0);
    let to_u8 = |v: f32| (((v + m) * a) * 255.0).round() as u8;
    Color::Rgb { r: to_u8(r), g: to_u8(g), b: to_u8(b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_density_follows_screen() {
        let mut f = ParticleField::new(1);
        f.sync("intro", 100, 40);
        assert_eq!(f.particles().len(), 80);
        f.sync("registration", 100, 40);
        assert_eq!(f.particles().len(), 28);
    }

    #[test]
    fn same_key_keeps_particles() {
        let mut f = ParticleField::new(1);
        f.sync("level1", 80, 24);
        f.advance(100);
        let y = f.particles()[0].y;
        f.sync("level1", 80, 24);
        assert_eq!(f.particles()[0].y, y);
    }

    #[test]
    fn particles_rise_and_respawn_on_screen() {
        let mut f = ParticleField::new(7);
        f.sync("level3", 60, 20);
        for _ in 0..200 {
            f.advance(33);
        }
        for p in f.particles() {
            assert!(p.x >= 0.0 && p.x < 60.0);
            assert!(p.y >= -(p.trail as f32) && p.y < 24.0);
        }
    }

    #[test]
    fn fireworks_launch_and_burst() {
        let mut fw = Fireworks::new(3);
        fw.advance(5000, 80, 24);
        assert!(fw.sparks().is_empty());

        fw.set_active(true);
        fw.advance(1400, 80, 24);
        assert_eq!(fw.rockets().count(), 1);
        let burst = (0..100).any(|_| {
            fw.advance(33, 80, 24);
            !fw.sparks().is_empty()
        });
        assert!(burst);

        fw.set_active(false);
        assert!(fw.sparks().is_empty());
        assert_eq!(fw.rockets().count(), 0);
    }

    #[test]
    fn hue_color_primaries() {
        assert_eq!(hue_color(0.0, 1.0), Color::Rgb { r: 191, g: 64, b: 64 });
        assert_eq!(hue_color(120.0, 0.0), Color::Rgb { r: 0, g: 0, b: 0 });
    }
}
