//! Scene data structures: meshes, instances, textures and the object registry.
//!
//! - `model` holds the vertex layout and GPU mesh buffers
//! - `texture` wraps GPU textures, render targets and mip generation
//! - `instance` holds per-instance transformation and colour data
//! - `object` is the flat registry of placed objects with their materials

pub mod instance;
pub mod model;
pub mod object;
pub mod texture;
