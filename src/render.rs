//! Per-frame draw ordering.
//!
//! A [`FramePlan`] splits the registry into the opaque batch and the
//! transparent batch, the latter sorted back to front from the viewer. Each
//! entry carries the [`PipelineKind`] it is drawn with so the renderer only
//! switches pipelines when consecutive entries differ.

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::object::{ObjectId, Registry, SceneObject, Shading};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Lit, depth write, no blending.
    Opaque,
    /// Lit, alpha blending, depth test without write.
    Transparent,
    /// Unlit light marker.
    Marker,
    /// Unlit light marker with alpha blending.
    TranslucentMarker,
}

impl PipelineKind {
    pub fn of<M>(object: &SceneObject<M>) -> Self {
        match (object.shading, object.transparent) {
            (Shading::Lit, false) => PipelineKind::Opaque,
            (Shading::Lit, true) => PipelineKind::Transparent,
            (Shading::Unlit, false) => PipelineKind::Marker,
            (Shading::Unlit, true) => PipelineKind::TranslucentMarker,
        }
    }

    pub fn blends(self) -> bool {
        matches!(self, PipelineKind::Transparent | PipelineKind::TranslucentMarker)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub id: ObjectId,
    pub pipeline: PipelineKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePlan {
    pub opaque: Vec<DrawCall>,
    /// Farthest from the viewer first.
    pub transparent: Vec<DrawCall>,
}

impl FramePlan {
    pub fn build<M>(registry: &Registry<M>, eye: Vector3<f32>) -> Self {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for (id, object) in registry.iter() {
            let call = DrawCall {
                id,
                pipeline: PipelineKind::of(object),
            };
            if object.transparent {
                transparent.push((call, (object.instance.position - eye).magnitude()));
            } else {
                opaque.push(call);
            }
        }
        sort_back_to_front(&mut transparent);
        Self {
            opaque,
            transparent: transparent.into_iter().map(|(call, _)| call).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stable sort by descending distance; equal distances keep their order.
pub fn sort_back_to_front<T>(items: &mut [(T, f32)]) {
    items.sort_by(|a, b| b.1.total_cmp(&a.1));
}
