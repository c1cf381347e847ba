//! Material file parser
//!
//! ```text
//! # rock surface
//! program: lit lit.vs lit.fs
//! texture: rock_diffuse.dds srgb
//! texture: rock_normal.dds signed norepeat
//! param: 1.0 1.0 1.0 0.5
//! ```
//!
//! Texture names are relative to the texture directory and used as written.

use crate::assets::AssetError;
use crate::render::TextureFlags;

/// Shader program named by a material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDecl {
    /// Program cache name
    pub name: String,
    /// Vertex shader file
    pub vs: String,
    /// Fragment shader file
    pub fs: String,
}

/// Texture slot of a material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDecl {
    /// Texture file relative to the texture directory
    pub file: String,
    /// Sampling flags
    pub flags: TextureFlags,
}

/// Parsed material file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialSource {
    /// Program, if the material names one
    pub program: Option<ProgramDecl>,
    /// Textures in slot order
    pub textures: Vec<TextureDecl>,
    /// Shader constants
    pub params: Vec<[f32; 4]>,
}

/// Material file parser
pub struct MaterialParser;

impl MaterialParser {
    /// Parse material file contents
    pub fn parse(contents: &str) -> Result<MaterialSource, AssetError> {
        let mut source = MaterialSource::default();

        for (line_num, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (command, rest) = line
                .split_once(':')
                .ok_or_else(|| Self::error(line_num, format!("expected '<key>: <value>', got '{line}'")))?;
            let mut tokens = rest.split_whitespace();

            match command.trim() {
                "program" => {
                    let mut next = |what: &str| {
                        tokens
                            .next()
                            .map(str::to_string)
                            .ok_or_else(|| Self::error(line_num, format!("program missing {what}")))
                    };
                    let decl = ProgramDecl {
                        name: next("name")?,
                        vs: next("vertex shader")?,
                        fs: next("fragment shader")?,
                    };
                    if source.program.replace(decl).is_some() {
                        log::warn!("Material line {}: program declared twice", line_num + 1);
                    }
                }
                "texture" => {
                    let file = tokens
                        .next()
                        .ok_or_else(|| Self::error(line_num, "texture missing file name".into()))?
                        .to_string();
                    let mut flags = TextureFlags::empty();
                    for flag in tokens {
                        flags |= match flag {
                            "signed" => TextureFlags::SIGNED,
                            "srgb" => TextureFlags::SRGB,
                            "norepeat" => TextureFlags::NO_REPEAT,
                            other => return Err(Self::error(line_num, format!("unknown texture flag '{other}'"))),
                        };
                    }
                    source.textures.push(TextureDecl { file, flags });
                }
                "param" => {
                    let values = tokens
                        .map(|t| t.parse::<f32>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|e| Self::error(line_num, format!("bad param value: {e}")))?;
                    if values.is_empty() || values.len() > 4 {
                        return Err(Self::error(line_num, format!("param takes 1 to 4 values, got {}", values.len())));
                    }
                    let mut param = [0.0; 4];
                    param[..values.len()].copy_from_slice(&values);
                    source.params.push(param);
                }
                other => {
                    log::debug!("Material line {}: ignoring unknown key '{other}'", line_num + 1);
                }
            }
        }

        Ok(source)
    }

    fn error(line_num: usize, msg: String) -> AssetError {
        AssetError::InvalidData(format!("material line {}: {msg}", line_num + 1))
    }
}
