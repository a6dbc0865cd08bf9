use std::{
    fmt::{self, Display, Formatter},
    path::Path,
    rc::Rc,
    sync::Arc,
};

use log::{debug, info};

use crate::{
    animation::{clip::AnimationClip, component::AnimationComponent, tick::TickSource},
    asset::{material::MaterialAsset, mesh::MeshAsset, skin::SkinAsset, texture::TextureAsset},
    scene::{NodeId, SceneGraph},
};

use super::{
    source::{DirectoryFetcher, ResourceFetcher},
    ParseOptions,
};

use animation::AnimationTranslator;
use buffer::{resolve_buffers, resolve_images};
use compression::CompressedMeshDecoder;
use document::Document;
use material::MaterialTranslator;
use mesh::MeshBuilder;
use texture::TextureTranslator;

pub use error::ParseError;

pub mod accessor;
mod animation;
mod buffer;
pub mod compression;
pub mod document;
mod error;
mod hierarchy;
mod material;
mod mesh;
mod node;
pub mod scheme;
mod skin;
pub mod texture;

const GLB_MAGIC: &[u8] = b"glTF";

/// Stages of a parse, in the order they complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ParseState {
    #[default]
    Pending,
    Buffers,
    Images,
    Textures,
    Materials,
    Meshes,
    Nodes,
    Skins,
    Animations,
    Ready,
}

impl ParseState {
    /// Fraction of the stages completed.
    pub fn progress(self) -> f32 {
        self as u8 as f32 / ParseState::Ready as u8 as f32
    }
}

impl Display for ParseState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseState::Pending => "PENDING",
            ParseState::Buffers => "BUFFERS",
            ParseState::Images => "IMAGES",
            ParseState::Textures => "TEXTURES",
            ParseState::Materials => "MATERIALS",
            ParseState::Meshes => "MESHES",
            ParseState::Nodes => "NODES",
            ParseState::Skins => "SKINS",
            ParseState::Animations => "ANIMATIONS",
            ParseState::Ready => "READY",
        };
        f.write_str(name)
    }
}

/// Everything decoded from one glTF asset.
///
/// A model holds no thread-bound data, so it can be parsed on one thread and
/// played on another.
#[derive(Debug)]
pub struct Model {
    pub scene: SceneGraph,
    /// Node the selected glTF scene hangs under.
    pub root: NodeId,
    /// Scene node of every document node, by document index.
    pub nodes: Vec<NodeId>,
    pub meshes: Vec<MeshAsset>,
    pub materials: Vec<Arc<MaterialAsset>>,
    pub default_material: Arc<MaterialAsset>,
    /// Textures by document index, `None` where the image failed to load.
    pub textures: Vec<Option<Arc<TextureAsset>>>,
    pub skins: Vec<SkinAsset>,
    pub clips: Vec<AnimationClip>,
}

impl Model {
    /// An animation component holding a copy of every clip of the model.
    pub fn animation_component(&self, tick: TickSource) -> AnimationComponent {
        let mut component = AnimationComponent::new(tick);
        for clip in &self.clips {
            component.add_clip(Rc::new(clip.clone()));
        }
        component
    }

    /// Stop animations driving this model, then drop its nodes.
    pub fn destroy(mut self, component: Option<&mut AnimationComponent>) {
        if let Some(component) = component {
            component.destroy();
        }
        let removed = self.scene.remove_subtree(self.root);
        debug!("Destroyed model with {} nodes under its root", removed);
    }
}

fn split_container(data: &[u8]) -> Result<(Document, Option<Vec<u8>>), ParseError> {
    if data.starts_with(GLB_MAGIC) {
        let glb = ::gltf::Glb::from_slice(data)?;
        let document = serde_json::from_slice(&glb.json)?;
        Ok((document, glb.bin.map(|bin| bin.into_owned())))
    } else {
        Ok((serde_json::from_slice(data)?, None))
    }
}

/// Staged glTF 2.0 / GLB parser.
///
/// A parser runs once. After a parse, successful or not, it has to be
/// [reset](GltfParser::reset) before it accepts another document.
pub struct GltfParser<F> {
    fetcher: F,
    options: ParseOptions,
    decoder: Option<Arc<dyn CompressedMeshDecoder>>,
    state: ParseState,
    started: bool,
    buffers: Vec<Vec<u8>>,
}

impl<F: ResourceFetcher> GltfParser<F> {
    pub fn new(fetcher: F, options: ParseOptions) -> Self {
        Self {
            fetcher,
            options,
            decoder: None,
            state: ParseState::Pending,
            started: false,
            buffers: Vec::new(),
        }
    }

    pub fn with_mesh_decoder(mut self, decoder: Arc<dyn CompressedMeshDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// The last completed stage.
    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn progress(&self) -> f32 {
        self.state.progress()
    }

    /// Raw buffers of the last parse, kept until [`reset`](Self::reset).
    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    /// Free the buffers of the last parse and accept a new document.
    pub fn reset(&mut self) {
        self.buffers = Vec::new();
        self.state = ParseState::Pending;
        self.started = false;
    }

    fn complete(&mut self, state: ParseState) {
        self.state = state;
        debug!("Completed parse stage {} ({:.0}%)", state, state.progress() * 100.0);
    }

    /// Parse a glTF JSON document or a GLB container.
    pub async fn parse(&mut self, data: &[u8]) -> Result<Model, ParseError> {
        if self.started {
            return Err(ParseError::NotReset(self.state));
        }
        self.started = true;

        let (document, bin) = split_container(data)?;

        let (buffers, images) = futures::join!(
            resolve_buffers(
                &document,
                bin.as_deref(),
                &self.fetcher,
                self.options.buffer_policy
            ),
            resolve_images(&document, &self.fetcher),
        );
        self.buffers = buffers?;
        self.complete(ParseState::Buffers);
        self.complete(ParseState::Images);

        let textures =
            TextureTranslator::new(&document, &self.buffers, &images, &self.options).load_textures();
        self.complete(ParseState::Textures);

        let materials = MaterialTranslator::new(&document, &textures, &self.options).load_materials();
        let default_material = Arc::new(MaterialAsset::default());
        self.complete(ParseState::Materials);

        let meshes = MeshBuilder::new(
            &document,
            &self.buffers,
            self.decoder.as_deref(),
            &materials,
            &default_material,
        )
        .build_meshes();
        self.complete(ParseState::Meshes);

        let mut scene = SceneGraph::new();
        let nodes = node::create_nodes(&document, &mut scene);
        node::link_hierarchy(&document, &mut scene, &nodes)?;
        self.complete(ParseState::Nodes);

        let skins = skin::load_skins(&document, &self.buffers, &nodes)?;
        self.complete(ParseState::Skins);

        let mut clips =
            AnimationTranslator::new(&document, &self.buffers, &scene, &nodes).load_animations()?;
        self.complete(ParseState::Animations);

        hierarchy::attach_meshes(&document, &mut scene, &nodes, &meshes);
        hierarchy::attach_skins(&document, &mut scene, &nodes, &skins);
        let root = hierarchy::build_root(&document, &mut scene, &nodes, self.options.default_scene)?;
        for clip in &mut clips {
            clip.set_root(Some(root));
        }
        self.complete(ParseState::Ready);

        info!(
            "Parsed glTF: {} nodes, {} meshes, {} materials, {} textures, {} skins, {} animations",
            nodes.len(),
            meshes.len(),
            materials.len(),
            textures.iter().flatten().count(),
            skins.len(),
            clips.len()
        );

        Ok(Model {
            scene,
            root,
            nodes,
            meshes,
            materials,
            default_material,
            textures,
            skins,
            clips,
        })
    }

    /// [`parse`](Self::parse) on the current thread.
    pub fn parse_blocking(&mut self, data: &[u8]) -> Result<Model, ParseError> {
        pollster::block_on(self.parse(data))
    }
}

/// Load a `.gltf` or `.glb` file, fetching external resources next to it.
pub fn load_from_path<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Model, ParseError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut parser = GltfParser::new(DirectoryFetcher::new(base), options);
    parser.parse_blocking(&data)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loader::source::MemoryFetcher;

    #[test]
    fn test_progress() {
        assert_eq!(ParseState::Pending.progress(), 0.0);
        assert_eq!(ParseState::Ready.progress(), 1.0);
        assert!(ParseState::Meshes > ParseState::Materials);
        assert_eq!(ParseState::Animations.to_string(), "ANIMATIONS");
    }

    #[test]
    fn test_model_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Model>();
    }

    #[test]
    fn test_parse_requires_reset() {
        let mut parser = GltfParser::new(MemoryFetcher::new(), ParseOptions::default());
        assert!(matches!(
            parser.parse_blocking(b"{not json"),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            parser.parse_blocking(br#"{"asset": {"version": "2.0"}}"#),
            Err(ParseError::NotReset(ParseState::Pending))
        ));
        parser.reset();
        let model = parser
            .parse_blocking(br#"{"asset": {"version": "2.0"}}"#)
            .unwrap();
        assert_eq!(parser.state(), ParseState::Ready);
        assert_eq!(model.scene.len(), 1);
        assert!(model.clips.is_empty());
    }
}
