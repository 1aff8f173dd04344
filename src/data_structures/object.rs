//! Flat registry of placed scene objects.
//!
//! Objects are stored by value in a single arena and addressed by [`ObjectId`].
//! The mesh handle is generic so that scene assembly and frame planning can be
//! exercised without a GPU (`Registry<()>`), while the renderer stores
//! [`GpuMesh`](crate::data_structures::model::GpuMesh) handles.

use crate::collision::Aabb;
use crate::data_structures::instance::{Instance, InstanceRaw};

/// Index into the texture table owned by the render context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// RGBA; alpha below one only blends when the object is drawn transparent.
    pub diffuse: [f32; 4],
    /// `None` samples the shared white texture.
    pub texture: Option<TextureId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [1.0; 4],
            texture: None,
        }
    }
}

impl Material {
    pub fn textured(texture: TextureId) -> Self {
        Self {
            texture: Some(texture),
            ..Default::default()
        }
    }

    pub fn colored(diffuse: [f32; 4]) -> Self {
        Self {
            diffuse,
            texture: None,
        }
    }

    pub fn with_diffuse(mut self, diffuse: [f32; 4]) -> Self {
        self.diffuse = diffuse;
        self
    }

    pub fn alpha(&self) -> f32 {
        self.diffuse[3]
    }
}

/// Which shader family an object is drawn with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Shading {
    #[default]
    Lit,
    /// Flat colour, used for light markers.
    Unlit,
}

#[derive(Debug)]
pub struct SceneObject<M> {
    pub name: String,
    pub mesh: M,
    pub instance: Instance,
    pub material: Material,
    pub shading: Shading,
    pub transparent: bool,
    /// Takes part in viewer collision.
    pub solid: bool,
}

impl<M> SceneObject<M> {
    pub fn new(name: impl Into<String>, mesh: M, instance: Instance, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh,
            instance,
            material,
            shading: Shading::Lit,
            transparent: false,
            solid: false,
        }
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn solid(mut self) -> Self {
        self.solid = true;
        self
    }

    pub fn unlit(mut self) -> Self {
        self.shading = Shading::Unlit;
        self
    }

    pub fn to_raw(&self) -> InstanceRaw {
        self.instance.to_raw(self.material.diffuse)
    }

    /// Bounds of the object assuming a unit-cube mesh.
    pub fn bounds(&self) -> Aabb {
        Aabb::of_unit_cube(&self.instance)
    }
}

/// Stable handle to an object in a [`Registry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub struct Registry<M> {
    objects: Vec<SceneObject<M>>,
}

impl<M> Default for Registry<M> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
        }
    }
}

impl<M> Registry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: SceneObject<M>) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject<M>> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject<M>> {
        self.objects.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject<M>)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn solid_bounds(&self) -> Vec<Aabb> {
        self.objects.iter().filter(|o| o.solid).map(SceneObject::bounds).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn ids_are_stable_insertion_indices() {
        let mut registry = Registry::new();
        let a = registry.insert(SceneObject::new("a", (), Instance::new(), Material::default()));
        let b = registry.insert(SceneObject::new("b", (), Instance::new(), Material::default()));
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(registry.get(b).map(|o| o.name.as_str()), Some("b"));
        registry.get_mut(a).unwrap().material.diffuse[3] = 0.5;
        assert_eq!(registry.get(a).unwrap().material.alpha(), 0.5);
    }

    #[test]
    fn only_solid_objects_have_collision_bounds() {
        let mut registry = Registry::new();
        registry.insert(SceneObject::new("floor", (), Instance::new(), Material::default()));
        registry.insert(
            SceneObject::new("wall", (), Instance::at(Vector3::new(2.0, 1.0, 3.0)), Material::default()).solid(),
        );
        let bounds = registry.solid_bounds();
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].min, Vector3::new(1.5, 0.5, 2.5));
        assert_eq!(bounds[0].max, Vector3::new(2.5, 1.5, 3.5));
    }
}
