use std::sync::Arc;

use log::warn;

use crate::{
    asset::{
        material::{MaterialAlphaMode, MaterialAsset, MaterialAssetData},
        texture::{
            NormalTextureInfo, OcclusionTextureInfo, TextureAsset, TextureAssetTransform,
            TextureInfo,
        },
    },
    loader::ParseOptions,
};

use super::document::{self, Document, Material};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

pub(crate) struct MaterialTranslator<'a> {
    document: &'a Document,
    textures: &'a [Option<Arc<TextureAsset>>],
    options: &'a ParseOptions,
}

impl<'a> MaterialTranslator<'a> {
    pub(crate) fn new(
        document: &'a Document,
        textures: &'a [Option<Arc<TextureAsset>>],
        options: &'a ParseOptions,
    ) -> Self {
        Self {
            document,
            textures,
            options,
        }
    }

    fn texture(&self, index: usize) -> Option<Arc<TextureAsset>> {
        let texture = self.textures.get(index).cloned().flatten();
        if texture.is_none() {
            warn!("Material references unavailable texture #{}", index);
        }
        texture
    }

    fn texture_info(&self, info: &document::TextureInfo) -> Option<TextureInfo> {
        Some(TextureInfo {
            texture: self.texture(info.index)?,
            tex_coord: info.tex_coord,
            transform: info
                .extensions
                .texture_transform
                .as_ref()
                .map(|transform| TextureAssetTransform {
                    offset: transform.offset.unwrap_or([0.0, 0.0]),
                    rotation: transform.rotation.unwrap_or(0.0),
                    scale: transform.scale.unwrap_or([1.0, 1.0]),
                    tex_coord: transform.tex_coord,
                }),
        })
    }

    fn load_data(&self, material: &Material) -> MaterialAssetData {
        let pbr = material.pbr_metallic_roughness.as_ref();
        let base_color_factor = pbr.and_then(|pbr| pbr.base_color_factor).unwrap_or(WHITE);
        let base_color_texture = pbr
            .and_then(|pbr| pbr.base_color_texture.as_ref())
            .and_then(|info| self.texture_info(info));

        if material.extensions.unlit.is_some() && !self.options.disable_unlit {
            return MaterialAssetData::Unlit {
                base_color_factor,
                base_color_texture,
            };
        }

        if let Some(specular) = &material.extensions.specular_glossiness {
            return MaterialAssetData::SpecularGlossiness {
                diffuse_factor: specular.diffuse_factor.unwrap_or(WHITE),
                diffuse_texture: specular
                    .diffuse_texture
                    .as_ref()
                    .and_then(|info| self.texture_info(info)),
                specular_factor: specular.specular_factor.unwrap_or([1.0, 1.0, 1.0]),
                glossiness_factor: specular.glossiness_factor.unwrap_or(1.0),
                specular_glossiness_texture: specular
                    .specular_glossiness_texture
                    .as_ref()
                    .and_then(|info| self.texture_info(info)),
            };
        }

        MaterialAssetData::Pbr {
            base_color_factor,
            base_color_texture,
            metallic_factor: pbr.and_then(|pbr| pbr.metallic_factor).unwrap_or(1.0),
            roughness_factor: pbr.and_then(|pbr| pbr.roughness_factor).unwrap_or(1.0),
            metallic_roughness_texture: pbr
                .and_then(|pbr| pbr.metallic_roughness_texture.as_ref())
                .and_then(|info| self.texture_info(info)),
        }
    }

    pub(crate) fn load_material(&self, index: usize, material: &Material) -> MaterialAsset {
        let alpha_mode = match material.alpha_mode.as_deref() {
            None | Some("OPAQUE") => MaterialAlphaMode::Opaque,
            Some("MASK") => MaterialAlphaMode::Mask(material.alpha_cutoff.unwrap_or(0.5)),
            Some("BLEND") => MaterialAlphaMode::Blend,
            Some(mode) => {
                warn!("Material #{} has unknown alpha mode {}", index, mode);
                MaterialAlphaMode::Opaque
            }
        };

        MaterialAsset {
            index: Some(index),
            name: material.name.clone(),
            data: self.load_data(material),
            normal_texture: material.normal_texture.as_ref().and_then(|info| {
                Some(NormalTextureInfo {
                    texture: self.texture(info.index)?,
                    tex_coord: info.tex_coord,
                    scale: info.scale.unwrap_or(1.0),
                })
            }),
            occlusion_texture: material.occlusion_texture.as_ref().and_then(|info| {
                Some(OcclusionTextureInfo {
                    texture: self.texture(info.index)?,
                    tex_coord: info.tex_coord,
                    strength: info.strength.unwrap_or(1.0),
                })
            }),
            emissive_texture: material
                .emissive_texture
                .as_ref()
                .and_then(|info| self.texture_info(info)),
            emissive_factor: material.emissive_factor.unwrap_or([0.0, 0.0, 0.0]),
            alpha_mode,
            double_sided: material.double_sided,
        }
    }

    pub(crate) fn load_materials(&self) -> Vec<Arc<MaterialAsset>> {
        self.document
            .materials
            .iter()
            .enumerate()
            .map(|(index, material)| Arc::new(self.load_material(index, material)))
            .collect()
    }
}
