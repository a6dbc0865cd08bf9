use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureAssetFormat {
    Ru8,
    Rgu8,
    Rgbu8,
    Rgbau8,
    Ru16,
    Rgu16,
    Rgbu16,
    Rgbau16,
}

/// A decoded texture image together with the sampler it is used with.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    /// Index of the texture in the source document.
    pub index: usize,
    pub name: Option<String>,
    pub size: (u32, u32),
    pub format: TextureAssetFormat,
    pub data: Vec<u8>,
    pub sampler: SamplerAsset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureMagFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureMinFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureMipmapFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureWrappingMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

impl TextureWrappingMode {
    pub fn repeats(self) -> bool {
        !matches!(self, TextureWrappingMode::ClampToEdge)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerAsset {
    pub mag_filter: TextureMagFilter,
    pub min_filter: TextureMinFilter,
    /// `None` when the minification filter does not sample mipmaps.
    pub mipmap_filter: Option<TextureMipmapFilter>,
    pub wrap_x: TextureWrappingMode,
    pub wrap_y: TextureWrappingMode,
}

impl SamplerAsset {
    /// Whether sampling through this sampler needs power-of-two dimensions on
    /// older graphics APIs.
    pub fn requires_power_of_2(&self) -> bool {
        self.mipmap_filter.is_some() || self.wrap_x.repeats() || self.wrap_y.repeats()
    }
}

/// `KHR_texture_transform` data of a texture reference.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAssetTransform {
    pub offset: [f32; 2],
    pub rotation: f32,
    pub scale: [f32; 2],
    pub tex_coord: Option<usize>,
}

impl Default for TextureAssetTransform {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            rotation: 0.0,
            scale: [1.0, 1.0],
            tex_coord: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextureInfo {
    pub texture: Arc<TextureAsset>,
    pub tex_coord: usize,
    pub transform: Option<TextureAssetTransform>,
}

#[derive(Debug, Clone)]
pub struct NormalTextureInfo {
    pub texture: Arc<TextureAsset>,
    pub tex_coord: usize,
    pub scale: f32,
}

#[derive(Debug, Clone)]
pub struct OcclusionTextureInfo {
    pub texture: Arc<TextureAsset>,
    pub tex_coord: usize,
    pub strength: f32,
}
