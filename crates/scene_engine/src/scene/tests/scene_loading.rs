//! Loading, saving and clearing scenes

use super::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Decal, Drawable, LightProbe, LightSource, Lightmap, Transform};
    use crate::ecs::{slot, ComponentError, ComponentMask, DefaultCompStorage};
    use crate::foundation::math::{Vec3, AABB};
    use crate::scene::SceneError;
    use crate::spatial::ProbeError;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn single_object_doc() -> serde_json::Value {
        json!({
            "name": "t",
            "objects": [{
                "name": "a",
                "Transform": { "pos": [1.0, 2.0, 3.0] },
                "Drawable": { "mesh_file": "cube" }
            }]
        })
    }

    #[test]
    fn test_load_single_object() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);

        mgr.load_scene(&single_object_doc()).unwrap();
        assert_eq!(mgr.scene_data().name, "t");
        assert_eq!(mgr.entity_count(), 1);
        assert_eq!(mgr.find_entity("a"), Some(0));

        let obj = mgr.object(0).unwrap();
        assert!(obj.component(slot::TRANSFORM).is_some());
        assert!(obj.component(slot::DRAWABLE).is_some());
        assert_eq!(obj.comp_mask, ComponentMask::TRANSFORM | ComponentMask::DRAWABLE);

        let dr = mgr.component::<Drawable>(0, slot::DRAWABLE).unwrap();
        let mesh = dr.mesh.as_ref().unwrap();
        assert!(mgr.resources().meshes().is_ready(mesh));

        let tr = mgr.component::<Transform>(0, slot::TRANSFORM).unwrap();
        assert_relative_eq!(tr.bbox.min, Vec3::repeat(-1.0));
        assert_relative_eq!(tr.bbox.max, Vec3::repeat(1.0));
        assert_relative_eq!(tr.bbox_ws.min, Vec3::new(0.0, 1.0, 2.0));
        assert_relative_eq!(tr.bbox_ws.max, Vec3::new(2.0, 3.0, 4.0));

        assert_eq!(mgr.spatial_index().entity_count(), 1);
        assert_eq!(mgr.spatial_index().query_point(Vec3::new(1.0, 2.0, 3.0)), vec![0]);
        assert_eq!(mgr.pending_texture_loads(), 5);
    }

    #[test]
    fn test_save_then_reload() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);
        mgr.load_scene(&single_object_doc()).unwrap();

        let saved = mgr.save_scene().unwrap();
        assert_eq!(saved["name"], json!("t"));
        let obj = &saved["objects"][0];
        assert_eq!(obj["name"], json!("a"));
        assert_eq!(obj["Transform"]["pos"], json!([1.0, 2.0, 3.0]));
        assert_eq!(obj["Drawable"]["mesh_file"], json!("cube"));

        let text = mgr.save_scene_to_string().unwrap();
        let mut other = manager(SceneConfig::default(), &loader);
        other.load_scene_from_str(&text).unwrap();
        assert_eq!(other.entity_count(), 1);
        assert_eq!(other.find_entity("a"), Some(0));
        assert_eq!(other.save_scene().unwrap(), saved);
    }

    #[test]
    fn test_missing_name_leaves_empty_scene() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);
        mgr.load_scene(&single_object_doc()).unwrap();

        let err = mgr
            .load_scene(&json!({ "objects": [{ "Transform": {} }] }))
            .unwrap_err();
        assert!(matches!(err, SceneError::MissingName));
        assert_eq!(mgr.entity_count(), 0);
        assert!(mgr.scene_data().name.is_empty());
        assert!(mgr.find_entity("a").is_none());
        assert_eq!(mgr.spatial_index().entity_count(), 0);
    }

    #[test]
    fn test_minimal_and_malformed_documents() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);

        mgr.load_scene(&json!({ "name": "empty" })).unwrap();
        assert_eq!(mgr.entity_count(), 0);

        let err = mgr.load_scene(&json!({ "name": "x", "objects": 5 })).unwrap_err();
        assert!(matches!(err, SceneError::Malformed(_)));

        let err = mgr.load_scene(&json!({ "name": "x", "objects": [3] })).unwrap_err();
        assert!(matches!(err, SceneError::Malformed(_)));

        let err = mgr.load_scene_from_str("{ not json").unwrap_err();
        assert!(matches!(err, SceneError::Json(_)));
    }

    #[test]
    fn test_missing_transform_is_fatal() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [
                { "Transform": {} },
                { "Drawable": { "mesh_file": "cube" } }
            ]
        });
        let err = mgr.load_scene(&doc).unwrap_err();
        assert!(matches!(err, SceneError::MissingTransform(1)));
        assert_eq!(mgr.entity_count(), 0);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [{ "name": "a", "Transform": {}, "Sparkles": { "rate": 4 }, "tag": 7 }]
        });
        mgr.load_scene(&doc).unwrap();
        let obj = mgr.object(0).unwrap();
        assert_eq!(obj.comp_mask.slots().collect::<Vec<_>>(), vec![slot::TRANSFORM]);
    }

    #[test]
    fn test_bounds_union_of_mesh_and_light() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [{
                "Transform": {},
                "Drawable": { "mesh_file": "cube" },
                "LightSource": { "radius": 5.0, "dir": [0.0, 0.0, -1.0] }
            }]
        });
        mgr.load_scene(&doc).unwrap();

        let ls = mgr.component::<LightSource>(0, slot::LIGHT_SOURCE).unwrap();
        let mut expected = AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0));
        expected.expand_to_aabb(&ls.object_bounds());

        let tr = mgr.component::<Transform>(0, slot::TRANSFORM).unwrap();
        assert_relative_eq!(tr.bbox.min, expected.min, epsilon = 1e-5);
        assert_relative_eq!(tr.bbox.max, expected.max, epsilon = 1e-5);
        assert!(tr.bbox.max.x >= 5.0 - 1e-4);
    }

    #[test]
    fn test_lightmaps_are_placed_in_atlas() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [
                { "Transform": {}, "Lightmap": { "size": [64, 64] } },
                { "Transform": {}, "Lightmap": { "size": [32, 32] } }
            ]
        });
        mgr.load_scene(&doc).unwrap();

        let first = mgr.component::<Lightmap>(0, slot::LIGHTMAP).unwrap();
        let second = mgr.component::<Lightmap>(1, slot::LIGHTMAP).unwrap();
        assert_eq!(first.pos, [0, 0]);
        assert_ne!(first.pos, second.pos);
        assert_eq!(mgr.scene_data().lm_splitter.allocated_count(), 2);
    }

    #[test]
    fn test_lightmap_too_large_is_fatal() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default().with_lightmap_atlas(256, 256), &loader);

        let doc = json!({
            "name": "t",
            "objects": [{ "Transform": {}, "Lightmap": { "size": [512, 64] } }]
        });
        let err = mgr.load_scene(&doc).unwrap_err();
        assert!(matches!(err, SceneError::LightmapAllocation { width: 512, height: 64 }));
        assert_eq!(mgr.entity_count(), 0);
        assert_eq!(mgr.scene_data().lm_splitter.allocated_count(), 0);
    }

    #[test]
    fn test_probe_capacity_is_enforced() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default().with_probes(32, 2), &loader);

        let probe = json!({ "Transform": {}, "LightProbe": { "radius": 2.0 } });
        let doc = json!({ "name": "t", "objects": [probe.clone(), probe.clone(), probe] });
        let err = mgr.load_scene(&doc).unwrap_err();
        assert!(matches!(
            err,
            SceneError::ProbeStorage(ProbeError::StorageFull { capacity: 2 })
        ));
        assert_eq!(mgr.scene_data().probe_storage.size(), 0);

        let doc = json!({ "name": "t", "objects": [{ "Transform": {}, "LightProbe": {} }] });
        mgr.load_scene(&doc).unwrap();
        let pr = mgr.component::<LightProbe>(0, slot::LIGHT_PROBE).unwrap();
        assert_eq!(pr.layer_index, Some(0));
    }

    #[test]
    fn test_decals_share_atlas_regions() {
        let loader = loader_with_cube();
        loader.insert(paths().texture("stain.png"), png(8, 8, [200, 10, 10, 255]));
        let mut mgr = manager(SceneConfig::default().with_decals_atlas(256, 256), &loader);

        let decal = json!({ "Transform": {}, "Decal": { "dim": [2.0, 2.0, 1.0], "diff": "stain.png" } });
        let missing = json!({ "Transform": {}, "Decal": { "diff": "nowhere.png" } });
        let doc = json!({ "name": "t", "objects": [decal.clone(), decal, missing] });
        mgr.load_scene(&doc).unwrap();

        let atlas = &mgr.scene_data().decals_atlas;
        assert_eq!(atlas.region_count(), 1);
        assert!(atlas.is_finalized());

        let a = mgr.component::<Decal>(0, slot::DECAL).unwrap();
        let b = mgr.component::<Decal>(1, slot::DECAL).unwrap();
        assert_eq!(a.diff_rect, b.diff_rect);
        assert!(a.diff_rect[2] > 0.0);

        let c = mgr.component::<Decal>(2, slot::DECAL).unwrap();
        assert_eq!(c.diff_rect, [0.0; 4]);

        let tr = mgr.component::<Transform>(0, slot::TRANSFORM).unwrap();
        assert!(!tr.bbox.is_empty());
    }

    #[test]
    fn test_failed_decal_texture_is_read_once() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default().with_decals_atlas(256, 256), &loader);

        let missing = json!({ "Transform": {}, "Decal": { "diff": "nowhere.png", "norm": "nowhere.png" } });
        let doc = json!({ "name": "t", "objects": [missing.clone(), missing] });
        mgr.load_scene(&doc).unwrap();

        assert_eq!(loader.sync_reads(&paths().texture("nowhere.png")), 1);
        for id in 0..2 {
            let decal = mgr.component::<Decal>(id, slot::DECAL).unwrap();
            assert_eq!(decal.diff_rect, [0.0; 4]);
            assert_eq!(decal.norm_rect, [0.0; 4]);
        }
        assert_eq!(mgr.scene_data().decals_atlas.region_count(), 0);
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [
                { "name": "twin", "Transform": {} },
                { "name": "twin", "Transform": { "pos": [5.0, 0.0, 0.0] } }
            ]
        });
        mgr.load_scene(&doc).unwrap();
        assert_eq!(mgr.entity_count(), 2);
        assert_eq!(mgr.find_entity("twin"), Some(1));
    }

    #[test]
    fn test_animations_need_a_skeleton() {
        let loader = loader_with_cube();
        loader.insert(paths().model("rig"), cube_mesh(Some(12)));
        loader.insert(
            paths().model("walk"),
            crate::render::AnimDesc { frame_count: 24, fps: 30.0 }.to_bytes(),
        );
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [{ "Transform": {}, "Drawable": { "mesh_file": "rig", "anims": ["walk"] } }]
        });
        mgr.load_scene(&doc).unwrap();
        let dr = mgr.component::<Drawable>(0, slot::DRAWABLE).unwrap();
        let mesh = mgr.resources().meshes().get(dr.mesh.as_ref().unwrap()).unwrap();
        assert_eq!(mesh.skeleton.as_ref().map(|s| s.anims.len()), Some(1));

        let doc = json!({
            "name": "t",
            "objects": [{ "Transform": {}, "Drawable": { "mesh_file": "cube", "anims": ["walk"] } }]
        });
        assert!(matches!(mgr.load_scene(&doc), Err(SceneError::Malformed(_))));
    }

    #[test]
    fn test_material_resolves_program_and_textures() {
        let loader = loader_with_cube();
        let p = paths();
        loader.insert(
            p.material("rock.txt"),
            b"program: lit lit.vs lit.fs\ntexture: rock.dds srgb\nparam: 1 1 1 1\n".to_vec(),
        );
        loader.insert(p.shader("lit.vs"), b"void main() {}".to_vec());
        loader.insert(p.shader("lit.fs"), b"void main() {}".to_vec());
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [{
                "Transform": {},
                "Drawable": { "mesh_file": "cube", "material_override": ["rock.txt"] }
            }]
        });
        mgr.load_scene(&doc).unwrap();

        let res = mgr.resources();
        let material = res.materials().find_by_name("rock.txt").unwrap();
        let material = res.materials().get(&material).unwrap();
        assert_eq!(material.params, vec![[1.0; 4]]);
        assert!(res.programs().is_ready(material.program.as_ref().unwrap()));
        assert_eq!(material.textures.len(), 1);
        assert!(mgr
            .resources()
            .textures()
            .find_by_name(&p.texture("rock.dds"))
            .is_some());
    }

    #[test]
    fn test_non_string_material_override_keeps_mesh_material() {
        let loader = loader_with_cube();
        let p = paths();
        loader.insert(p.model("pair"), grouped_cube_mesh(2));
        loader.insert(p.material("rock.txt"), b"param: 1 1 1 1\n".to_vec());
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [{
                "Transform": {},
                "Drawable": { "mesh_file": "pair", "material_override": [0, "rock.txt"] }
            }]
        });
        mgr.load_scene(&doc).unwrap();

        let dr = mgr.component::<Drawable>(0, slot::DRAWABLE).unwrap();
        assert_eq!(dr.material_override, vec![None, Some("rock.txt".to_string())]);

        let res = mgr.resources();
        assert!(res.materials().find_by_name("rock.txt").is_some());
        let mesh = res.meshes().get(dr.mesh.as_ref().unwrap()).unwrap();
        assert!(mesh.groups[0].material.is_none());
        assert!(mesh.groups[1].material.is_some());
    }

    #[test]
    fn test_remove_component() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);
        let doc = json!({
            "name": "t",
            "objects": [{ "Transform": {}, "LightSource": {} }]
        });
        mgr.load_scene(&doc).unwrap();

        assert!(!mgr.remove_component(0, slot::TRANSFORM).unwrap());
        assert!(mgr.remove_component(0, slot::LIGHT_SOURCE).unwrap());
        assert!(mgr.component::<LightSource>(0, slot::LIGHT_SOURCE).is_none());
        assert!(!mgr.remove_component(0, slot::LIGHT_SOURCE).unwrap());
        assert_eq!(mgr.registry().storage(slot::LIGHT_SOURCE).unwrap().count(), 0);
        assert!(matches!(
            mgr.remove_component(9, slot::LIGHT_SOURCE),
            Err(SceneError::InvalidEntity(9))
        ));
    }

    #[test]
    fn test_registry_is_sealed_by_first_load() {
        #[derive(Default, serde::Serialize, serde::Deserialize)]
        struct Tag {
            label: String,
        }
        impl crate::ecs::SceneComponent for Tag {
            const NAME: &'static str = "Tag";
        }

        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);
        mgr.register_component(20, DefaultCompStorage::<Tag>::boxed(), None)
            .unwrap();

        let doc = json!({ "name": "t", "objects": [{ "Transform": {}, "Tag": { "label": "x" } }] });
        mgr.load_scene(&doc).unwrap();
        assert_eq!(mgr.component::<Tag>(0, 20).unwrap().label, "x");

        let err = mgr
            .register_component(21, DefaultCompStorage::<Transform>::boxed(), None)
            .unwrap_err();
        assert!(matches!(err, SceneError::Component(ComponentError::RegistrySealed(_))));
    }

    #[test]
    fn test_clear_releases_unreferenced_meshes() {
        let loader = loader_with_cube();
        let mut mgr = manager(SceneConfig::default(), &loader);
        mgr.load_scene(&single_object_doc()).unwrap();
        assert_eq!(mgr.resources().meshes().len(), 1);

        mgr.clear_scene();
        assert_eq!(mgr.entity_count(), 0);
        assert_eq!(mgr.resources().meshes().len(), 0);
    }
}
