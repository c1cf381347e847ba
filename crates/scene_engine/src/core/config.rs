//! # Scene Configuration
//!
//! Configuration for the scene layer: where assets live on each platform,
//! the dimensions of the shared texture atlases and the light-probe store,
//! and the size of the background I/O pool.
//!
//! All structures are serde-serializable and implement [`Config`], so they
//! can be loaded from TOML or RON files.
//!
//! ## Platform layouts
//!
//! | Platform | Root          | Texture container |
//! |----------|---------------|-------------------|
//! | Desktop  | `./assets_pc/` | `.dds`           |
//! | Mobile   | `./assets/`    | `.ktx`           |

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// Target platform, selects the asset directory layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Desktop layout with DDS textures
    #[default]
    Desktop,
    /// Mobile layout with KTX textures
    Mobile,
}

/// Asset directory prefixes and the platform texture extension
///
/// Prefixes are joined to file names by plain concatenation, so they keep
/// their trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPaths {
    /// Mesh and animation files
    pub models: String,
    /// Texture files
    pub textures: String,
    /// Material description files
    pub materials: String,
    /// Shader sources
    pub shaders: String,
    /// Texture container extension including the dot
    pub texture_ext: String,
}

impl AssetPaths {
    /// Standard layout for a platform
    pub fn for_platform(platform: Platform) -> Self {
        let (root, ext) = match platform {
            Platform::Desktop => ("./assets_pc/", ".dds"),
            Platform::Mobile => ("./assets/", ".ktx"),
        };
        Self {
            models: format!("{root}models/"),
            textures: format!("{root}textures/"),
            materials: format!("{root}materials/"),
            shaders: format!("{root}shaders/"),
            texture_ext: ext.to_string(),
        }
    }

    /// Same layout rooted somewhere else
    pub fn with_root(root: &str, platform: Platform) -> Self {
        let root = if root.ends_with('/') {
            root.to_string()
        } else {
            format!("{root}/")
        };
        Self {
            models: format!("{root}models/"),
            textures: format!("{root}textures/"),
            materials: format!("{root}materials/"),
            shaders: format!("{root}shaders/"),
            texture_ext: Self::for_platform(platform).texture_ext,
        }
    }

    /// Full path of a model file
    pub fn model(&self, file: &str) -> String {
        format!("{}{file}", self.models)
    }

    /// Full path of a texture file
    pub fn texture(&self, file: &str) -> String {
        format!("{}{file}", self.textures)
    }

    /// Full path of a material file
    pub fn material(&self, file: &str) -> String {
        format!("{}{file}", self.materials)
    }

    /// Full path of a shader file
    pub fn shader(&self, file: &str) -> String {
        format!("{}{file}", self.shaders)
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::for_platform(Platform::default())
    }
}

/// Width and height of a 2D atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasSize {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
}

impl AtlasSize {
    /// Create a new atlas size
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Light-probe store settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Face resolution of mip level 0
    pub resolution: u32,
    /// Number of cube layers
    pub count: u32,
    /// Smallest face resolution that is stored
    pub min_resolution: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            resolution: 512,
            count: 16,
            min_resolution: 16,
        }
    }
}

/// # Scene Manager Configuration
///
/// ```rust
/// use scene_engine::core::config::{SceneConfig, Platform};
///
/// let config = SceneConfig::new(Platform::Mobile)
///     .with_decals_atlas(1024, 512)
///     .with_io_threads(2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Target platform
    pub platform: Platform,
    /// Padding texels replicated around each decal image
    pub decals_border: u32,
    /// Background I/O worker count
    pub io_threads: usize,
    /// Asset locations
    pub paths: AssetPaths,
    /// Decal texture atlas size
    pub decals_atlas: AtlasSize,
    /// Lightmap atlas size
    pub lightmap_atlas: AtlasSize,
    /// Probe store settings
    pub probes: ProbeConfig,
}

impl SceneConfig {
    /// Defaults for the given platform
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            paths: AssetPaths::for_platform(platform),
            ..Self::default()
        }
    }

    /// Override asset paths
    pub fn with_paths(mut self, paths: AssetPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Override the decal atlas size
    pub fn with_decals_atlas(mut self, width: u32, height: u32) -> Self {
        self.decals_atlas = AtlasSize::new(width, height);
        self
    }

    /// Override the lightmap atlas size
    pub fn with_lightmap_atlas(mut self, width: u32, height: u32) -> Self {
        self.lightmap_atlas = AtlasSize::new(width, height);
        self
    }

    /// Override probe store settings
    pub fn with_probes(mut self, resolution: u32, count: u32) -> Self {
        self.probes.resolution = resolution;
        self.probes.count = count;
        self
    }

    /// Override the I/O worker count
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Reject sizes that cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (what, size) in [
            ("decals_atlas", self.decals_atlas),
            ("lightmap_atlas", self.lightmap_atlas),
        ] {
            if size.width == 0 || size.height == 0 {
                return Err(ConfigError::Invalid(format!("{what} has a zero dimension")));
            }
        }
        if self.probes.resolution == 0 || !self.probes.resolution.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "probe resolution {} is not a power of two",
                self.probes.resolution
            )));
        }
        if self.probes.min_resolution == 0 || self.probes.min_resolution > self.probes.resolution {
            return Err(ConfigError::Invalid(
                "probe min_resolution must be in 1..=resolution".to_string(),
            ));
        }
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid("io_threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Desktop,
            paths: AssetPaths::default(),
            decals_atlas: AtlasSize::new(4096, 2048),
            decals_border: 4,
            lightmap_atlas: AtlasSize::new(2048, 1024),
            probes: ProbeConfig::default(),
            io_threads: 2,
        }
    }
}

impl Config for SceneConfig {}
