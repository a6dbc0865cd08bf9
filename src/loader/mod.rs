use glam::Mat4;

/// glTF 2.0 and GLB loader.
pub mod gltf;

/// Where external resources come from.
pub mod source;

#[inline]
fn pad_color_vec3_to_vec4(color: [f32; 3]) -> [f32; 4] {
    [color[0], color[1], color[2], 1.0]
}

#[inline]
fn chunk_vec2<T: Copy>(data: &[T]) -> Vec<[T; 2]> {
    data.chunks_exact(2).map(|item| [item[0], item[1]]).collect()
}

#[inline]
fn chunk_vec3<T: Copy>(data: &[T]) -> Vec<[T; 3]> {
    data.chunks_exact(3)
        .map(|item| [item[0], item[1], item[2]])
        .collect()
}

#[inline]
fn chunk_vec4<T: Copy>(data: &[T]) -> Vec<[T; 4]> {
    data.chunks_exact(4)
        .map(|item| [item[0], item[1], item[2], item[3]])
        .collect()
}

#[inline]
fn chunk_and_pad_vec3_to_vec4_f32(data: &[f32]) -> Vec<[f32; 4]> {
    data.chunks_exact(3)
        .map(|item| pad_color_vec3_to_vec4([item[0], item[1], item[2]]))
        .collect()
}

#[inline]
fn chunk_mat4(data: &[f32]) -> Vec<Mat4> {
    data.chunks_exact(16).map(Mat4::from_cols_slice).collect()
}

/// What to do when a buffer cannot be fetched or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferPolicy {
    /// Log a warning and continue with an empty buffer.
    #[default]
    Lenient,
    /// Abort the parse.
    Strict,
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub buffer_policy: BufferPolicy,
    /// Resize non power of two textures whose sampler needs mipmaps or
    /// repeat wrapping to the nearest power of two.
    pub resize_npot_textures: bool,
    /// Treat `KHR_materials_unlit` materials as regular PBR materials.
    pub disable_unlit: bool,
    /// Scene to instantiate instead of the document's default scene.
    pub default_scene: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            buffer_policy: BufferPolicy::Lenient,
            resize_npot_textures: false,
            disable_unlit: false,
            default_scene: None,
        }
    }
}
