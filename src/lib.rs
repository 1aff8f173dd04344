//! maze-ngin
//!
//! A first-person maze explorer rendered with wgpu. A seeded generator lays out
//! a grid maze of textured floor and wall cubes; a sun, orbiting point lights and
//! a flashlight light it; translucent props and light markers are blended back
//! to front; a particle fountain bursts into fragments when its drops land.
//!
//! High-level modules
//! - `maze`: occupancy grid generation with start and exit cells
//! - `lights`: directional, point and spot lights and their uniform block
//! - `particles`: fixed-capacity fountain simulation
//! - `camera`, `input`, `collision`: first-person movement with wall sliding
//! - `scene`: assembly of all objects and the per-frame simulation update
//! - `render`: opaque/transparent draw ordering
//! - `context`, `pipelines`, `flow`: GPU state, pipelines and the event loop
//! - `config`: settings persisted as JSON
//! - `data_structures`, `resources`: meshes, instances, textures, asset loading
//!

pub mod camera;
pub mod collision;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod input;
pub mod lights;
pub mod maze;
pub mod particles;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

pub use flow::run;
