//! Decode glTF 2.0 models into animatable scene data.
//!
//! The crate is split into three layers. [`asset`] holds the renderable data
//! model (meshes, materials, textures and skins) that the [`loader`] produces
//! from a glTF or GLB file. The loader wires decoded nodes into a
//! [`scene::SceneGraph`], and the [`animation`] engine drives that graph frame
//! by frame through curves, clips and playback sessions.
pub mod animation;
pub mod asset;
/// Model loaders and resource fetching
pub mod loader;
pub mod scene;
