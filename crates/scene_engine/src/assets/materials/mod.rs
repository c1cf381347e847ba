//! Material description files
//!
//! A material file is line based text naming the shader program, the
//! textures it samples and its constant parameters. [`MaterialParser`] turns
//! it into a [`MaterialSource`]; the scene layer resolves the named program
//! and textures through the resource caches.

pub mod material_parser;

pub use material_parser::{MaterialParser, MaterialSource, ProgramDecl, TextureDecl};
