//! Live creature entities: placement and per-frame animation.
//!
//! Placement depends on the creature's kind:
//!
//! - **Sky** floats above the canopy, close to the clearing
//! - **Water** swims on the river's centre line
//! - **Ground** lands anywhere on the forest floor clear of the river banks

use forest_types::{CreatureKind, CreatureRecord, Vec3};
use rand::Rng;

/// Full-size sprite scale.
pub const TARGET_SCALE: f32 = 5.0;

/// Scale added per frame while a creature grows in.
pub const SCALE_IN_STEP: f32 = 0.1;

/// Height of a name tag above its creature.
pub const NAME_TAG_LIFT: f32 = 4.8;

const SKY_SPREAD: f32 = 75.0;
const SKY_MIN_Y: f32 = 22.0;
const SKY_MAX_Y: f32 = 34.0;

const RIVER_HALF_LENGTH: f32 = 175.0;
const RIVER_JITTER: f32 = 4.0;
const RIVER_AMPLITUDE: f32 = 32.0;
const RIVER_FREQUENCY: f32 = 0.02;
const WATER_Y: f32 = 1.5;

const GROUND_SPREAD: f32 = 180.0;
const GROUND_RIVER_CLEARANCE: f32 = 26.0;
const GROUND_Y: f32 = 2.5;
const GROUND_HOP_HEIGHT: f32 = 1.5;
const MAX_PLACEMENT_ROLLS: u32 = 64;

const MAX_PHASE_OFFSET: f32 = 100.0;

/// X coordinate of the river's centre line at depth `z`.
pub fn river_center_x(z: f32) -> f32 {
    (z * RIVER_FREQUENCY).sin() * RIVER_AMPLITUDE
}

/// Pick a spawn position for a creature of `kind`.
pub fn place(kind: CreatureKind, rng: &mut impl Rng) -> Vec3 {
    match kind {
        CreatureKind::Sky => Vec3::new(
            rng.random_range(-SKY_SPREAD..SKY_SPREAD),
            rng.random_range(SKY_MIN_Y..SKY_MAX_Y),
            rng.random_range(-SKY_SPREAD..SKY_SPREAD),
        ),
        CreatureKind::Water => {
            let z = rng.random_range(-RIVER_HALF_LENGTH..RIVER_HALF_LENGTH);
            let x = river_center_x(z) + rng.random_range(-RIVER_JITTER..RIVER_JITTER);
            Vec3::new(x, WATER_Y, z)
        }
        CreatureKind::Ground | CreatureKind::Unknown => place_on_ground(rng),
    }
}

fn place_on_ground(rng: &mut impl Rng) -> Vec3 {
    let mut x = 0.0;
    let mut z = 0.0;
    for _ in 0..MAX_PLACEMENT_ROLLS {
        x = rng.random_range(-GROUND_SPREAD..GROUND_SPREAD);
        z = rng.random_range(-GROUND_SPREAD..GROUND_SPREAD);
        if (x - river_center_x(z)).abs() >= GROUND_RIVER_CLEARANCE {
            return Vec3::new(x, GROUND_Y, z);
        }
    }
    // Out of luck: shove the last roll off the bank on whichever side it was.
    let center = river_center_x(z);
    let side = if x >= center { 1.0 } else { -1.0 };
    Vec3::new(center + side * GROUND_RIVER_CLEARANCE, GROUND_Y, z)
}

/// A creature materialized in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Roster record the entity was built from.
    pub record: CreatureRecord,
    /// Normalized filename, the entity's identity.
    pub key: String,
    /// Name tag text.
    pub display_name: String,
    /// Current position.
    pub position: Vec3,
    /// Horizontal and vertical sprite scale.
    pub scale: (f32, f32),
    /// Sprite roll in radians.
    pub rotation: f32,
    /// Name tag opacity, fades in with the scale.
    pub name_tag_opacity: f32,
    /// Set once the scale-in animation has finished.
    pub fully_spawned: bool,
    phase_offset: f32,
}

impl Entity {
    /// Create an entity at `position`, starting at zero scale.
    pub fn new(record: CreatureRecord, position: Vec3, rng: &mut impl Rng) -> Self {
        let key = record.key();
        let display_name = record.display_name();
        Self {
            record,
            key,
            display_name,
            position,
            scale: (0.0, 0.0),
            rotation: 0.0,
            name_tag_opacity: 0.0,
            fully_spawned: false,
            phase_offset: rng.random_range(0.0..MAX_PHASE_OFFSET),
        }
    }

    /// Placement kind of the entity.
    pub const fn kind(&self) -> CreatureKind {
        self.record.kind
    }

    /// Where the name tag hangs.
    pub fn name_tag_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, NAME_TAG_LIFT, 0.0)
    }

    /// Advance one frame. `now` is seconds since the scene was mounted.
    pub fn animate(&mut self, now: f32) {
        if !self.fully_spawned {
            let grown = (self.scale.0 + SCALE_IN_STEP).min(TARGET_SCALE);
            self.scale = (grown, grown);
            if grown >= TARGET_SCALE {
                self.fully_spawned = true;
            }
        }

        let off = self.phase_offset;
        match self.kind() {
            CreatureKind::Sky => {
                self.position.x += (now + off).cos() * 0.05;
                self.position.y += (now * 2.0 + off).sin() * 0.02;
                let flap = (now * 8.0 + off).sin();
                if self.fully_spawned {
                    self.scale = (
                        TARGET_SCALE * flap.mul_add(0.05, 1.0),
                        TARGET_SCALE * flap.mul_add(-0.08, 1.0),
                    );
                }
                self.rotation = (now + off).cos() * -0.15;
            }
            CreatureKind::Water => {
                self.position.z += (now + off).sin() * 0.04;
                let swim = (now * 3.0 + off).sin();
                if self.fully_spawned {
                    self.scale = (
                        TARGET_SCALE * swim.mul_add(-0.04, 1.0),
                        TARGET_SCALE * swim.mul_add(0.04, 1.0),
                    );
                }
                self.rotation = (now * 2.0 + off).sin() * 0.08;
            }
            CreatureKind::Ground | CreatureKind::Unknown => {
                // 0 on landing, 1 at the top of the hop.
                let hop = (now * 4.0 + off).sin().abs();
                let squash = 1.0 - hop;
                if self.fully_spawned {
                    self.scale = (
                        TARGET_SCALE * squash.mul_add(0.15, hop.mul_add(-0.1, 1.0)),
                        TARGET_SCALE * squash.mul_add(-0.1, hop.mul_add(0.2, 1.0)),
                    );
                }
                self.position.y = hop.mul_add(GROUND_HOP_HEIGHT, GROUND_Y);
                self.rotation = (now * 4.0 + off).sin() * 0.12;
            }
        }

        self.name_tag_opacity = (self.scale.0 / 2.0).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn sky_creatures_float_above_the_clearing() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = place(CreatureKind::Sky, &mut rng);
            assert!(p.x.abs() <= SKY_SPREAD && p.z.abs() <= SKY_SPREAD);
            assert!((SKY_MIN_Y..=SKY_MAX_Y).contains(&p.y));
        }
    }

    #[test]
    fn water_creatures_follow_the_river() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let p = place(CreatureKind::Water, &mut rng);
            assert!((p.x - river_center_x(p.z)).abs() <= RIVER_JITTER + 1e-3);
            assert!(p.z.abs() <= RIVER_HALF_LENGTH);
        }
    }

    #[test]
    fn ground_creatures_keep_off_the_banks() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let p = place(CreatureKind::Ground, &mut rng);
            assert!((p.x - river_center_x(p.z)).abs() >= GROUND_RIVER_CLEARANCE - 1e-3);
            assert!(p.z.abs() <= GROUND_SPREAD);
        }
    }

    #[test]
    fn scale_in_takes_about_fifty_frames() {
        let mut rng = StdRng::seed_from_u64(1);
        let record = CreatureRecord::new("fox.png", CreatureKind::Ground);
        let mut entity = Entity::new(record, Vec3::new(40.0, GROUND_Y, 0.0), &mut rng);
        let mut frames = 0_u32;
        while !entity.fully_spawned && frames < 100 {
            entity.animate(0.0);
            frames = frames.saturating_add(1);
        }
        assert!((49..=51).contains(&frames), "took {frames} frames");
        assert!((entity.name_tag_opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn ground_hop_stays_within_bounce_height() {
        let mut rng = StdRng::seed_from_u64(5);
        let record = CreatureRecord::new("deer.png", CreatureKind::Ground);
        let mut entity = Entity::new(record, Vec3::new(-60.0, GROUND_Y, 10.0), &mut rng);
        let mut now = 0.0_f32;
        for _ in 0..300 {
            now += 0.016;
            entity.animate(now);
            assert!(entity.position.y >= GROUND_Y);
            assert!(entity.position.y <= GROUND_Y + GROUND_HOP_HEIGHT + 1e-4);
        }
    }

    #[test]
    fn entity_identity_is_the_normalized_filename() {
        let mut rng = StdRng::seed_from_u64(9);
        let record = CreatureRecord::new("/static/animations/owl%201.png?t=5", CreatureKind::Sky);
        let entity = Entity::new(record, Vec3::ZERO, &mut rng);
        assert_eq!(entity.key, "owl 1.png");
        assert_eq!(entity.display_name, "owl 1");
    }
}
