#![allow(dead_code)]

pub mod bsdf;
pub mod bxdf;
pub mod fresnel;
pub mod material;
pub mod texture;

pub use bsdf::Bsdf;
pub use bxdf::{Bxdf, BxdfFlags};
pub use fresnel::{Fresnel, FresnelConductor, FresnelDielectric, FresnelNoOp};
pub use material::{bxdfs_for, Material};
pub use texture::io::{load_texture, TextureIoError};
pub use texture::{AddressMode, Texture};
