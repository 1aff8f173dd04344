//! Fountain particle simulation.
//!
//! A fixed pool of particles is fed by a rate-limited emitter. Each particle flies
//! a ballistic arc and, when it comes back down through the ground plane, explodes
//! into a handful of smaller fragments. The parent stops moving at that point and
//! its pool slot is released once every fragment has faded out.
//!
//! ```text
//! INACTIVE --emit--> ACTIVE --hits ground--> EXPLODED --all fragments gone--> INACTIVE
//!                      |                                                        ^
//!                      +------------------- lifetime runs out -----------------+
//! ```

use std::{cmp::Reverse, collections::BinaryHeap, f32::consts::TAU, ops::Range};

use cgmath::Vector3;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::data_structures::instance::Instance;

pub const MAX_PARTICLES: usize = 100;
pub const MAX_FRAGMENTS: usize = 8;
pub const MIN_FRAGMENTS: usize = 3;

pub const PARENT_COLOR: [f32; 3] = [0.2, 0.4, 0.9];
pub const FRAGMENT_COLOR: [f32; 3] = [0.8, 0.2, 0.2];

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    /// Euler angles in radians.
    pub rotation: Vector3<f32>,
    pub rotation_speed: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub alpha: f32,
    pub base_alpha: f32,
    pub active: bool,
    pub exploded: bool,
    pub fragments: Vec<Particle>,
}

impl Default for Particle {
    fn default() -> Self {
        let zero = Vector3::new(0.0, 0.0, 0.0);
        Self {
            position: zero,
            velocity: zero,
            rotation: zero,
            rotation_speed: zero,
            scale: Vector3::new(1.0, 1.0, 1.0),
            lifetime: 0.0,
            max_lifetime: 0.0,
            alpha: 1.0,
            base_alpha: 1.0,
            active: false,
            exploded: false,
            fragments: Vec::new(),
        }
    }
}

impl Particle {
    /// Gravity, position and rotation for one step.
    fn integrate(&mut self, gravity: f32, dt: f32) {
        self.velocity.y -= gravity * dt;
        self.position += self.velocity * dt;
        self.rotation += self.rotation_speed * dt;
    }

    fn consume_lifetime(&mut self, dt: f32) {
        self.lifetime = (self.lifetime - dt).max(0.0);
    }

    pub fn instance(&self) -> Instance {
        Instance {
            position: self.position,
            orientation: self.rotation,
            scale: self.scale,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FountainSettings {
    pub emitter: Vector3<f32>,
    pub particle_size: f32,
    pub capacity: usize,
    /// Seconds between emissions; at most one particle is emitted per update.
    pub emission_interval: f32,
    pub gravity: f32,
    /// Height at which falling particles explode.
    pub ground_y: f32,
    pub speed: Range<f32>,
    pub lifetime: Range<f32>,
    pub rotation_speed: Range<f32>,
    /// Launch velocity is `(s cos a * h, s * v, s sin a * h)` for speed `s` and angle `a`.
    pub horizontal_factor: f32,
    pub vertical_factor: f32,
    /// Parents fade over their last second.
    pub fade_window: f32,
    pub fragment_fade_window: f32,
    pub fragment_alpha: f32,
    pub fragment_scale: f32,
}

impl Default for FountainSettings {
    fn default() -> Self {
        Self {
            emitter: Vector3::new(0.0, 0.0, 0.0),
            particle_size: 0.3,
            capacity: MAX_PARTICLES,
            emission_interval: 0.03,
            gravity: 9.8,
            ground_y: 0.01,
            speed: 3.0..6.0,
            lifetime: 3.0..5.0,
            rotation_speed: 1.0..5.0,
            horizontal_factor: 0.5,
            vertical_factor: 2.0,
            fade_window: 1.0,
            fragment_fade_window: 0.5,
            fragment_alpha: 0.8,
            fragment_scale: 0.3,
        }
    }
}

/// What to draw for one live particle or fragment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleDraw {
    pub instance: Instance,
    pub color: [f32; 4],
}

#[derive(Debug)]
pub struct Fountain {
    settings: FountainSettings,
    pool: Vec<Particle>,
    free: BinaryHeap<Reverse<usize>>,
    active_count: usize,
    emission_timer: f32,
    rng: StdRng,
}

impl Fountain {
    pub fn new(settings: FountainSettings, seed: u64) -> Self {
        let capacity = settings.capacity;
        Self {
            settings,
            pool: vec![Particle::default(); capacity],
            free: (0..capacity).map(Reverse).collect(),
            active_count: 0,
            emission_timer: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn emitter(&self) -> Vector3<f32> {
        self.settings.emitter
    }

    pub fn set_emitter(&mut self, position: Vector3<f32>) {
        self.settings.emitter = position;
    }

    pub fn particle_size(&self) -> f32 {
        self.settings.particle_size
    }

    /// Applies to particles emitted from now on.
    pub fn set_particle_size(&mut self, size: f32) {
        self.settings.particle_size = size;
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.pool
    }

    /// Largest number of draws a single frame can produce.
    pub fn max_draws(&self) -> usize {
        self.capacity() * MAX_FRAGMENTS
    }

    fn signed(&mut self, range: Range<f32>) -> f32 {
        let magnitude = self.rng.gen_range(range);
        if self.rng.gen_bool(0.5) {
            magnitude
        } else {
            -magnitude
        }
    }

    fn random_angles(&mut self) -> Vector3<f32> {
        Vector3::new(
            self.rng.gen_range(0.0..TAU),
            self.rng.gen_range(0.0..TAU),
            self.rng.gen_range(0.0..TAU),
        )
    }

    /// Claims the lowest free slot. Does nothing when the pool is exhausted.
    fn emit(&mut self) -> Option<usize> {
        if self.active_count >= self.capacity() {
            return None;
        }
        let Reverse(index) = self.free.pop()?;

        let s = &self.settings;
        let (h, v, size) = (s.horizontal_factor, s.vertical_factor, s.particle_size);
        let (speed_range, lifetime_range, rot_range) =
            (s.speed.clone(), s.lifetime.clone(), s.rotation_speed.clone());
        let emitter = s.emitter;

        let angle = self.rng.gen_range(0.0..TAU);
        let speed = self.rng.gen_range(speed_range);
        let rotation = self.random_angles();
        let rotation_speed = Vector3::new(
            self.signed(rot_range.clone()),
            self.signed(rot_range.clone()),
            self.signed(rot_range),
        );
        let lifetime = self.rng.gen_range(lifetime_range);

        let p = &mut self.pool[index];
        p.active = true;
        p.exploded = false;
        p.fragments.clear();
        p.position = emitter;
        p.velocity = Vector3::new(speed * angle.cos() * h, speed * v, speed * angle.sin() * h);
        p.rotation = rotation;
        p.rotation_speed = rotation_speed;
        p.lifetime = lifetime;
        p.max_lifetime = lifetime;
        p.scale = Vector3::new(size, size, size);
        p.alpha = 1.0;
        p.base_alpha = 1.0;

        self.active_count += 1;
        Some(index)
    }

    /// Splits an active, not yet exploded particle into fragments.
    ///
    /// Returns `false` (and changes nothing) for any other slot.
    pub fn explode(&mut self, index: usize) -> bool {
        match self.pool.get(index) {
            Some(p) if p.active && !p.exploded => {}
            _ => return false,
        }
        let count = self.rng.gen_range(MIN_FRAGMENTS..=MAX_FRAGMENTS);
        let s = self.settings.clone();
        let parent_position = self.pool[index].position;
        let parent_scale = self.pool[index].scale;

        let mut fragments = Vec::with_capacity(count);
        for _ in 0..count {
            let velocity = Vector3::new(
                self.rng.gen_range(-1.0..1.0) * 3.0,
                self.rng.gen_range(0.0..2.0) * 2.0,
                self.rng.gen_range(-1.0..1.0) * 3.0,
            );
            let rotation = self.random_angles();
            let faster = s.rotation_speed.start * 2.0..s.rotation_speed.end * 2.0;
            let rotation_speed = Vector3::new(
                self.signed(faster.clone()),
                self.signed(faster.clone()),
                self.signed(faster),
            );
            let lifetime = self.rng.gen_range(s.lifetime.clone()) * 0.5;
            fragments.push(Particle {
                position: parent_position,
                velocity,
                rotation,
                rotation_speed,
                scale: parent_scale * s.fragment_scale,
                lifetime,
                max_lifetime: lifetime,
                alpha: s.fragment_alpha,
                base_alpha: s.fragment_alpha,
                active: true,
                // fragments never explode again
                exploded: true,
                fragments: Vec::new(),
            });
        }

        let parent = &mut self.pool[index];
        parent.exploded = true;
        parent.fragments = fragments;
        true
    }

    fn release(&mut self, index: usize) {
        let p = &mut self.pool[index];
        p.active = false;
        p.fragments.clear();
        self.free.push(Reverse(index));
        self.active_count -= 1;
    }

    /// Advance the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.emission_timer += dt;
        if self.emission_timer >= self.settings.emission_interval {
            self.emission_timer = 0.0;
            self.emit();
        }

        let FountainSettings {
            gravity,
            ground_y,
            fade_window,
            fragment_fade_window,
            ..
        } = self.settings;

        for i in 0..self.pool.len() {
            if !self.pool[i].active {
                continue;
            }
            self.pool[i].consume_lifetime(dt);

            let p = &self.pool[i];
            if !p.exploded && p.position.y <= ground_y && p.velocity.y < 0.0 {
                self.explode(i);
            }

            let p = &mut self.pool[i];
            if p.exploded {
                for fragment in p.fragments.iter_mut().filter(|f| f.active) {
                    fragment.integrate(gravity, dt);
                    fragment.consume_lifetime(dt);
                    if fragment.lifetime < fragment_fade_window {
                        let f = fragment.lifetime / fragment_fade_window;
                        fragment.scale *= 0.9 + 0.1 * f;
                        fragment.alpha = fragment.base_alpha * f;
                    }
                    if fragment.lifetime <= 0.0 {
                        fragment.active = false;
                    }
                }
                if p.fragments.iter().all(|f| !f.active) {
                    self.release(i);
                }
            } else {
                p.integrate(gravity, dt);
                if p.lifetime < fade_window && p.lifetime > 0.0 {
                    p.alpha = p.base_alpha * p.lifetime / fade_window;
                }
                if p.lifetime <= 0.0 {
                    self.release(i);
                }
            }
        }
    }

    /// Live parents, or for exploded parents their live fragments.
    pub fn draw_list(&self) -> Vec<ParticleDraw> {
        let mut draws = Vec::with_capacity(self.active_count);
        for p in self.pool.iter().filter(|p| p.active) {
            if p.exploded {
                draws.extend(p.fragments.iter().filter(|f| f.active).map(|f| ParticleDraw {
                    instance: f.instance(),
                    color: with_alpha(FRAGMENT_COLOR, f.alpha),
                }));
            } else {
                draws.push(ParticleDraw {
                    instance: p.instance(),
                    color: with_alpha(PARENT_COLOR, p.alpha),
                });
            }
        }
        draws
    }
}

fn with_alpha(rgb: [f32; 3], alpha: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], alpha]
}
