use crate::asset::texture::{NormalTextureInfo, OcclusionTextureInfo, TextureInfo};

/// Define lighting parameters for the material.
#[derive(Debug, Clone)]
pub enum MaterialAssetData {
    /// The standard metallic-roughness model of glTF.
    Pbr {
        base_color_factor: [f32; 4],
        base_color_texture: Option<TextureInfo>,
        metallic_factor: f32,
        roughness_factor: f32,
        metallic_roughness_texture: Option<TextureInfo>,
    },
    /// `KHR_materials_pbrSpecularGlossiness`.
    SpecularGlossiness {
        diffuse_factor: [f32; 4],
        diffuse_texture: Option<TextureInfo>,
        specular_factor: [f32; 3],
        glossiness_factor: f32,
        specular_glossiness_texture: Option<TextureInfo>,
    },
    /// `KHR_materials_unlit`. The simplest lighting model.
    Unlit {
        base_color_factor: [f32; 4],
        base_color_texture: Option<TextureInfo>,
    },
}

impl Default for MaterialAssetData {
    fn default() -> Self {
        MaterialAssetData::Pbr {
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MaterialAlphaMode {
    #[default]
    Opaque,
    // Alpha cutoff
    Mask(f32),
    Blend,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialAsset {
    /// Index of the material in the source document, `None` for the shared
    /// default material.
    pub index: Option<usize>,
    pub name: Option<String>,
    pub data: MaterialAssetData,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: MaterialAlphaMode,
    pub double_sided: bool,
}

impl MaterialAsset {
    pub fn is_unlit(&self) -> bool {
        matches!(self.data, MaterialAssetData::Unlit { .. })
    }
}
