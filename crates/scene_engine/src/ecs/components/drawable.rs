//! Drawable component
//!
//! References a mesh by file name. The mesh is resolved through the resource
//! cache when the scene loads; material overrides and skeletal animations
//! listed on the component are applied to that mesh.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::assets::MeshRef;
use crate::ecs::component::SceneComponent;

/// Renderable mesh instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drawable {
    /// Mesh file, relative to the models directory
    pub mesh_file: String,
    /// Cache name of the mesh when it differs from `mesh_file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_name: Option<String>,
    /// Per-group material replacements; any non-string entry keeps the group's material
    #[serde(
        default,
        deserialize_with = "material_slots",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub material_override: Vec<Option<String>>,
    /// Animation files attached to the mesh skeleton
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anims: Vec<String>,

    /// Resolved mesh
    #[serde(skip)]
    pub mesh: Option<MeshRef>,
}

fn material_slots<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Option<String>>, D::Error> {
    let entries = Vec::<JsonValue>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            JsonValue::String(name) => Some(name),
            _ => None,
        })
        .collect())
}

impl Drawable {
    /// Drawable for a mesh file
    pub fn new(mesh_file: impl Into<String>) -> Self {
        Self {
            mesh_file: mesh_file.into(),
            ..Self::default()
        }
    }

    /// Name the mesh is cached under
    pub fn lookup_name(&self) -> &str {
        self.mesh_name.as_deref().unwrap_or(&self.mesh_file)
    }
}

impl SceneComponent for Drawable {
    const NAME: &'static str = "Drawable";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mesh_file_is_required() {
        assert!(serde_json::from_value::<Drawable>(json!({ "mesh_name": "x" })).is_err());
    }

    #[test]
    fn test_overrides_and_lookup_name() {
        let dr: Drawable = serde_json::from_value(json!({
            "mesh_file": "rock.mesh",
            "material_override": [null, "moss.txt"]
        }))
        .unwrap();
        assert_eq!(dr.lookup_name(), "rock.mesh");
        assert_eq!(dr.material_override, vec![None, Some("moss.txt".to_string())]);

        let named = Drawable {
            mesh_name: Some("rock_lod0".into()),
            ..Drawable::new("rock.mesh")
        };
        assert_eq!(named.lookup_name(), "rock_lod0");
    }

    #[test]
    fn test_non_string_overrides_leave_slot_empty() {
        let dr: Drawable = serde_json::from_value(json!({
            "mesh_file": "rock.mesh",
            "material_override": [0, "moss.txt", true, {}]
        }))
        .unwrap();
        assert_eq!(dr.material_override, vec![None, Some("moss.txt".to_string()), None, None]);
    }

    #[test]
    fn test_minimal_round_trip() {
        let value = json!({ "mesh_file": "box.mesh" });
        let dr: Drawable = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&dr).unwrap(), value);
    }
}
