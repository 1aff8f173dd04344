//! Scene assembly and the simulation half of a frame.
//!
//! [`Scene`] owns everything that changes over time: the object registry, the
//! camera, the light rig and the fountain. It never touches the GPU; the mesh
//! handle type `M` is produced by a caller-supplied factory so the renderer can
//! store GPU meshes while tests use `()`.

use std::f32::consts::TAU;

use cgmath::{Deg, EuclideanSpace, Point3, Vector3};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::camera::{Camera, CameraController, DEFAULT_FOV, FLOOR_EYE_HEIGHT, Projection};
use crate::collision::{self, Aabb};
use crate::config::AppConfig;
use crate::data_structures::instance::Instance;
use crate::data_structures::object::{Material, ObjectId, Registry, SceneObject, TextureId};
use crate::input::{Action, InputState, TintChannel};
use crate::lights::{DirectionalLight, LightMotion, LightRig, PointLight, SpotLight, SunOrbit};
use crate::maze::{self, CellPos, FLOOR_TOP, FLOOR_Y, Maze, MazeError};
use crate::particles::{Fountain, FountainSettings};

/// Texture files, indexed by [`TextureId`].
pub const TEXTURE_FILES: [&str; 2] = ["textures/floor.png", "textures/wall.png"];
pub const FLOOR_TEXTURE: TextureId = TextureId(0);
pub const WALL_TEXTURE: TextureId = TextureId(1);
pub const CRYSTAL_MODEL: &str = "models/crystal.obj";

/// Half-extent of the viewer's collision box.
pub const VIEWER_RADIUS: f32 = 0.2;
/// Degrees of field of view per scroll notch.
pub const ZOOM_PER_NOTCH: f32 = 2.0;

const EXIT_TINT: [f32; 4] = [0.3, 1.0, 0.3, 1.0];
const SUN_DISTANCE: f32 = 20.0;
const SUN_COLOR: [f32; 4] = [1.0, 0.95, 0.7, 1.0];
const LIGHT_HEIGHT: f32 = 2.0;
const MARKER_SIZE: f32 = 0.2;
const MARKER_ALPHA: f32 = 0.6;
const POINT_COLORS: [[f32; 3]; 4] = [
    [1.0, 0.3, 0.3],
    [0.3, 1.0, 0.3],
    [0.3, 0.5, 1.0],
    [1.0, 0.9, 0.3],
];
const CRYSTAL_COUNT: usize = 4;
const CRYSTAL_COLORS: [[f32; 4]; 2] = [[0.4, 0.9, 1.0, 0.5], [1.0, 0.4, 0.9, 0.45]];
/// Radians per second.
const CRYSTAL_SPIN: f32 = 0.8;
/// Tenths of a full channel per key press.
const TINT_STEPS: u8 = 10;

/// Colour multiplied into the crystals, stepped per channel and wrapping to zero past one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tint {
    steps: [u8; 3],
}

impl Default for Tint {
    fn default() -> Self {
        Self {
            steps: [TINT_STEPS; 3],
        }
    }
}

impl Tint {
    pub fn cycle(&mut self, channel: TintChannel) {
        let i = match channel {
            TintChannel::Red => 0,
            TintChannel::Green => 1,
            TintChannel::Blue => 2,
        };
        self.steps[i] = (self.steps[i] + 1) % (TINT_STEPS + 1);
    }

    pub fn rgb(&self) -> [f32; 3] {
        self.steps.map(|s| s as f32 / TINT_STEPS as f32)
    }

    /// Tints the colour part of `base`, keeping its alpha.
    pub fn apply(&self, base: [f32; 4]) -> [f32; 4] {
        let [r, g, b] = self.rgb();
        [base[0] * r, base[1] * g, base[2] * b, base[3]]
    }
}

fn crystal_color(index: usize) -> [f32; 4] {
    CRYSTAL_COLORS[index % CRYSTAL_COLORS.len()]
}

/// Which mesh a scene object is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Cube,
    Crystal,
}

#[derive(Debug)]
pub struct Scene<M> {
    pub maze: Maze,
    pub registry: Registry<M>,
    pub camera: Camera,
    pub projection: Projection,
    pub controller: CameraController,
    pub lights: LightRig,
    pub fountain: Fountain,
    sun_marker: ObjectId,
    point_markers: Vec<ObjectId>,
    crystals: Vec<ObjectId>,
    tint: Tint,
    solids: Vec<Aabb>,
    exit: ObjectId,
    elapsed: f32,
}

impl<M> Scene<M> {
    /// Generates the maze and places every object.
    ///
    /// `mesh` is called once per object; objects never share mesh handles.
    pub fn assemble<R, F>(config: &AppConfig, rng: &mut R, mut mesh: F) -> Result<Self, MazeError>
    where
        R: Rng + ?Sized,
        F: FnMut(MeshKind, &str) -> M,
    {
        let maze = maze::generate(config.maze.width, config.maze.height, config.maze.density_range, rng)?;
        log::info!(
            "generated {}x{} maze, start {:?}, exit {:?}",
            maze.grid.width(),
            maze.grid.height(),
            maze.start,
            maze.exit
        );
        log::debug!("\n{}", maze.grid);

        let mut registry = Registry::new();
        let mut exit = None;
        for ((pos, _), position) in maze.grid.iter().zip(maze.floor_positions()) {
            let mut material = Material::textured(FLOOR_TEXTURE);
            if pos == maze.exit {
                material = material.with_diffuse(EXIT_TINT);
            }
            let id = registry.insert(SceneObject::new(
                "floor",
                mesh(MeshKind::Cube, "floor"),
                Instance::at(position),
                material,
            ));
            if pos == maze.exit {
                exit = Some(id);
            }
        }
        for position in maze.wall_positions() {
            registry.insert(
                SceneObject::new(
                    "wall",
                    mesh(MeshKind::Cube, "wall"),
                    Instance::at(position),
                    Material::textured(WALL_TEXTURE),
                )
                .solid(),
            );
        }
        let exit = exit.ok_or(MazeError::TooSmall {
            width: maze.grid.width(),
            height: maze.grid.height(),
        })?;

        let center = Vector3::new(
            (maze.grid.width() as f32 - 1.0) * 0.5,
            LIGHT_HEIGHT,
            (maze.grid.height() as f32 - 1.0) * 0.5,
        );
        let sun_orbit = SunOrbit::default();
        let mut sun = DirectionalLight::default();
        sun.set_direction(sun_orbit.direction_at(0.0));
        let sun_marker = registry.insert(
            SceneObject::new(
                "sun",
                mesh(MeshKind::Cube, "sun"),
                Instance::at(center - sun.direction() * SUN_DISTANCE).with_scale(Vector3::new(1.5, 1.5, 1.5)),
                Material::colored(SUN_COLOR),
            )
            .unlit(),
        );

        let mut lights = LightRig::new(sun, sun_orbit, SpotLight::default());
        let orbit_radius = (maze.grid.width().min(maze.grid.height()) as f32) * 0.3;
        let mut point_markers = Vec::new();
        for (i, rgb) in POINT_COLORS.iter().enumerate() {
            let color = Vector3::new(rgb[0], rgb[1], rgb[2]);
            let motion = LightMotion::Orbit {
                center,
                radius: orbit_radius,
                angular_speed: 0.3 + 0.1 * i as f32,
                phase: i as f32 * TAU / POINT_COLORS.len() as f32,
            };
            let position = motion.position_at(0.0).unwrap_or(center);
            if lights.add_point(PointLight::at(position).with_color(color), motion).is_none() {
                break;
            }
            let size = Vector3::new(MARKER_SIZE, MARKER_SIZE, MARKER_SIZE);
            point_markers.push(
                registry.insert(
                    SceneObject::new(
                        "light marker",
                        mesh(MeshKind::Cube, "light marker"),
                        Instance::at(position).with_scale(size),
                        Material::colored([rgb[0], rgb[1], rgb[2], MARKER_ALPHA]),
                    )
                    .unlit()
                    .transparent(),
                ),
            );
        }

        let fountain_cell = maze.central_free_cell();
        let emitter = fountain_cell.to_world(FLOOR_TOP);
        let fountain = Fountain::new(
            FountainSettings {
                emitter,
                ground_y: emitter.y + 0.01,
                ..Default::default()
            },
            rng.r#gen(),
        );

        let mut free: Vec<CellPos> = maze
            .grid
            .iter()
            .filter(|(pos, cell)| {
                !cell.is_wall() && *pos != maze.start && *pos != maze.exit && *pos != fountain_cell
            })
            .map(|(pos, _)| pos)
            .collect();
        free.shuffle(rng);
        let crystals = free
            .iter()
            .take(CRYSTAL_COUNT)
            .enumerate()
            .map(|(i, pos)| {
                let mut instance =
                    Instance::at(pos.to_world(FLOOR_TOP + 0.4)).with_scale(Vector3::new(0.4, 0.4, 0.4));
                instance.orientation.y = rng.gen_range(0.0..TAU);
                registry.insert(
                    SceneObject::new(
                        "crystal",
                        mesh(MeshKind::Crystal, "crystal"),
                        instance,
                        Material::colored(crystal_color(i)),
                    )
                    .transparent(),
                )
            })
            .collect();

        let camera = Camera::new(
            Point3::from_vec(maze.start.to_world(FLOOR_EYE_HEIGHT)),
            Deg(-90.0),
            Deg(0.0),
        );
        let projection = Projection::new(
            config.window.width,
            config.window.height,
            Deg(DEFAULT_FOV),
            0.1,
            100.0,
        );
        let solids = registry.solid_bounds();

        let mut scene = Self {
            maze,
            registry,
            camera,
            projection,
            controller: CameraController::default(),
            lights,
            fountain,
            sun_marker,
            point_markers,
            crystals,
            tint: Tint::default(),
            solids,
            exit,
            elapsed: 0.0,
        };
        scene.update_lights();
        log::info!("scene holds {} objects", scene.registry.len());
        Ok(scene)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn exit_tile(&self) -> ObjectId {
        self.exit
    }

    pub fn sun_marker(&self) -> ObjectId {
        self.sun_marker
    }

    pub fn point_markers(&self) -> &[ObjectId] {
        &self.point_markers
    }

    /// Applies scene-level actions, returning the ones the window layer handles.
    pub fn apply_actions(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let mut rest = Vec::new();
        for action in actions {
            match action {
                Action::ToggleFlashlight => {
                    let on = self.lights.spot.toggle();
                    log::info!("flashlight {}", if on { "on" } else { "off" });
                }
                Action::ResetFov => self.projection.reset_fov(),
                Action::CycleTint(channel) => {
                    self.tint.cycle(channel);
                    self.apply_tint();
                }
                other => rest.push(other),
            }
        }
        rest
    }

    /// Advances the simulation by `dt` seconds: camera, collision, lights, particles.
    pub fn update(&mut self, dt: f32, input: &mut InputState) {
        self.elapsed += dt;

        let (dx, dy) = input.mouse.take_delta();
        self.controller.handle_mouse(&mut self.camera, dx, dy);
        let scroll = input.take_scroll();
        if scroll != 0.0 {
            self.projection.zoom(scroll * ZOOM_PER_NOTCH);
        }

        let desired = self.controller.desired_displacement(&self.camera, input, dt);
        let eye = self.camera.eye();
        let moved = collision::resolve_displacement(eye, desired, VIEWER_RADIUS, &self.solids);
        let eye = collision::clamp_to_floor(eye + moved, FLOOR_EYE_HEIGHT);
        self.camera.position = Point3::from_vec(eye);

        self.update_lights();
        self.fountain.update(dt);

        for id in &self.crystals {
            if let Some(crystal) = self.registry.get_mut(*id) {
                crystal.instance.orientation.y = (crystal.instance.orientation.y + CRYSTAL_SPIN * dt) % TAU;
            }
        }
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }

    fn apply_tint(&mut self) {
        for (i, id) in self.crystals.iter().enumerate() {
            if let Some(crystal) = self.registry.get_mut(*id) {
                crystal.material.diffuse = self.tint.apply(crystal_color(i));
            }
        }
    }

    fn update_lights(&mut self) {
        self.lights.update(self.elapsed, self.camera.eye(), self.camera.front());
        let center = self.maze_center();
        if let Some(sun) = self.registry.get_mut(self.sun_marker) {
            sun.instance.position = center - self.lights.sun.direction() * SUN_DISTANCE;
        }
        for (id, light) in self.point_markers.iter().zip(self.lights.points()) {
            if let Some(marker) = self.registry.get_mut(*id) {
                marker.instance.position = light.position;
            }
        }
    }

    fn maze_center(&self) -> Vector3<f32> {
        Vector3::new(
            (self.maze.grid.width() as f32 - 1.0) * 0.5,
            FLOOR_Y,
            (self.maze.grid.height() as f32 - 1.0) * 0.5,
        )
    }
}
