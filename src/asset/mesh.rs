use super::primitive::{BoundingBox, PrimitiveAsset};

#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveAsset>,
    /// Default morph target weights.
    pub weights: Vec<f32>,
}

impl MeshAsset {
    /// Union of the bounds of every primitive.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut primitives = self.primitives.iter();
        let first = primitives.next()?.bounds;
        let (min, max) = primitives.fold((first.min(), first.max()), |(min, max), primitive| {
            (min.min(primitive.bounds.min()), max.max(primitive.bounds.max()))
        });
        Some(BoundingBox::from_min_max(min, max))
    }

    pub fn morph_target_count(&self) -> usize {
        self.primitives
            .iter()
            .map(|primitive| primitive.targets.len())
            .max()
            .unwrap_or(0)
    }
}
