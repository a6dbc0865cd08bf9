pub mod material;
pub mod mesh;
pub mod node;
pub mod normal;
pub mod primitive;
pub mod skin;
pub mod texture;
