//! Scene state owned by the scene manager

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::assets::TextureRef;
use crate::core::config::SceneConfig;
use crate::ecs::{EntityId, SceneObject};
use crate::foundation::math::Vec3;
use crate::scene::error::SceneError;
use crate::spatial::{ProbeStorage, TextureAtlas, TextureSplitter};

/// Environment node as written in a scene document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDesc {
    /// Direction the sunlight travels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun_dir: Option<[f32; 3]>,
    /// Sun color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun_col: Option<[f32; 3]>,
    /// Angular size of the sun
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun_softness: Option<f32>,
    /// Cubemap base name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_map: Option<String>,
    /// Cubemap base name for the path tracer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_map_pt: Option<String>,
}

/// Lighting environment of the loaded scene
///
/// `sun_dir` points towards the sun, the opposite of what the document stores.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Unit vector towards the sun
    pub sun_dir: Vec3,
    /// Sun color
    pub sun_col: Vec3,
    /// Angular size of the sun
    pub sun_softness: f32,
    /// Cubemap base name
    pub env_map_name: String,
    /// Path tracer cubemap base name
    pub env_map_name_pt: String,
    /// Loaded cubemap
    pub env_map: Option<TextureRef>,
    /// Direct lighting lightmap
    pub lm_direct: Option<TextureRef>,
    /// Spherical harmonics lightmaps
    pub lm_indir_sh: [Option<TextureRef>; 4],
}

impl Environment {
    /// Read the scalar fields of an `environment` node
    pub fn from_json(node: &JsonValue) -> Result<Self, SceneError> {
        let desc = EnvironmentDesc::deserialize(node)
            .map_err(|e| SceneError::Malformed(format!("environment: {e}")))?;

        let mut env = Self::default();
        if let Some(dir) = desc.sun_dir {
            let dir = Vec3::from(dir);
            env.sun_dir = -dir.try_normalize(f32::EPSILON).unwrap_or(dir);
        }
        if let Some(col) = desc.sun_col {
            env.sun_col = Vec3::from(col);
        }
        if let Some(softness) = desc.sun_softness {
            env.sun_softness = softness;
        }
        env.env_map_name = desc.env_map.unwrap_or_default();
        env.env_map_name_pt = desc.env_map_pt.unwrap_or_default();
        Ok(env)
    }

    /// Document form; empty map names are left out
    pub fn to_desc(&self) -> EnvironmentDesc {
        let non_empty = |s: &String| (!s.is_empty()).then(|| s.clone());
        EnvironmentDesc {
            sun_dir: Some((-self.sun_dir).into()),
            sun_col: Some(self.sun_col.into()),
            sun_softness: Some(self.sun_softness),
            env_map: non_empty(&self.env_map_name),
            env_map_pt: non_empty(&self.env_map_name_pt),
        }
    }
}

/// Everything a loaded scene consists of, apart from component data
pub struct SceneData {
    /// Level name
    pub name: String,
    /// Lighting environment
    pub env: Environment,
    /// Entities in document order
    pub objects: Vec<SceneObject>,
    /// Named entities
    pub name_to_object: HashMap<String, EntityId>,
    /// Lightmap atlas allocator
    pub lm_splitter: TextureSplitter,
    /// Decal texture atlas
    pub decals_atlas: TextureAtlas,
    /// Light probe cubemaps
    pub probe_storage: ProbeStorage,
}

impl SceneData {
    /// Empty scene with allocators sized from `config`
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            name: String::new(),
            env: Environment::default(),
            objects: Vec::new(),
            name_to_object: HashMap::new(),
            lm_splitter: TextureSplitter::new(config.lightmap_atlas.width, config.lightmap_atlas.height),
            decals_atlas: TextureAtlas::new(
                config.decals_atlas.width,
                config.decals_atlas.height,
                config.decals_border,
            ),
            probe_storage: ProbeStorage::new(
                config.probes.resolution,
                config.probes.count,
                config.probes.min_resolution,
            ),
        }
    }

    /// Drop every entity and reset the allocators
    pub fn clear(&mut self) {
        self.name.clear();
        self.env = Environment::default();
        self.objects.clear();
        self.name_to_object.clear();
        self.lm_splitter.clear();
        self.decals_atlas.clear();
        self.probe_storage.clear();
    }

    /// Entity by index
    pub fn object(&self, id: EntityId) -> Option<&SceneObject> {
        self.objects.get(id as usize)
    }

    /// Entity by name
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.name_to_object.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_sun_dir_is_flipped_and_normalized() {
        let env = Environment::from_json(&json!({ "sun_dir": [0.0, -2.0, 0.0], "sun_softness": 0.5 })).unwrap();
        assert_relative_eq!(env.sun_dir, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(env.sun_softness, 0.5);

        let desc = env.to_desc();
        assert_eq!(desc.sun_dir, Some([0.0, -1.0, 0.0]));
        assert!(desc.env_map.is_none());
    }

    #[test]
    fn test_env_map_names_roundtrip() {
        let env = Environment::from_json(&json!({ "env_map": "sky", "env_map_pt": "sky_hdr" })).unwrap();
        let desc = env.to_desc();
        assert_eq!(desc.env_map.as_deref(), Some("sky"));
        assert_eq!(desc.env_map_pt.as_deref(), Some("sky_hdr"));
    }

    #[test]
    fn test_bad_environment_is_malformed() {
        let err = Environment::from_json(&json!({ "sun_dir": "up" })).unwrap_err();
        assert!(matches!(err, SceneError::Malformed(_)));
    }

    #[test]
    fn test_clear_resets_allocators() {
        let mut data = SceneData::new(&SceneConfig::default().with_probes(64, 2));
        let first = data.lm_splitter.allocate([64, 64]).unwrap().1;
        data.probe_storage.allocate().unwrap();
        data.name_to_object.insert("a".into(), 0);

        data.clear();
        assert!(data.find("a").is_none());
        assert_eq!(data.probe_storage.size(), 0);
        assert_eq!(data.lm_splitter.allocate([64, 64]).unwrap().1, first);
    }
}
