use std::collections::HashSet;

use maze_ngin::{
    config::AppConfig,
    lights::{UniformTarget, UniformValue},
    scene::Scene,
};
use rand::{SeedableRng, rngs::StdRng};

#[allow(dead_code)]
pub(crate) fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A scene without GPU meshes.
#[allow(dead_code)]
pub(crate) fn headless_scene(seed: u64) -> Scene<()> {
    Scene::assemble(&AppConfig::default(), &mut seeded(seed), |_, _| ()).unwrap()
}

/// Records every uniform write; names in `unknown` are rejected like an
/// unresolved shader uniform.
#[allow(dead_code)]
#[derive(Default)]
pub(crate) struct RecordingTarget {
    pub writes: Vec<(String, UniformValue)>,
    pub unknown: HashSet<String>,
}

#[allow(dead_code)]
impl RecordingTarget {
    pub fn names(&self) -> Vec<&str> {
        self.writes.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn last(&self, name: &str) -> Option<UniformValue> {
        self.writes.iter().rev().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

impl UniformTarget for RecordingTarget {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        if self.unknown.contains(name) {
            return false;
        }
        self.writes.push((name.to_string(), value));
        true
    }
}
