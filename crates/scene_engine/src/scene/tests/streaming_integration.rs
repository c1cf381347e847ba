//! Background texture and probe streaming through the task queue

use super::*;

/// Probe face file with one payload per level, each filled with its index
fn probe_face(lens: &[usize]) -> Vec<u8> {
    let mut out = vec![0; crate::spatial::probe_storage::PROBE_FILE_HEADER_LEN];
    for (i, &len) in lens.iter().enumerate() {
        out.extend_from_slice(&(len as u32).to_le_bytes());
        out.extend(std::iter::repeat(i as u8).take(len));
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }
    out
}

fn lightmap_path(scene: &str, suffix: &str) -> String {
    paths().texture(&format!("lightmaps/{scene}_lm_{suffix}.dds"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> serde_json::Value {
        json!({ "name": "t", "objects": [{ "name": "a", "Transform": {} }] })
    }

    #[test]
    fn test_lightmaps_stream_in() {
        let loader = loader_with_cube();
        loader.insert(lightmap_path("t", "direct"), dds(16));
        for sh in 0..3 {
            loader.insert(lightmap_path("t", &format!("sh_{sh}")), dds(8));
        }
        let mut mgr = manager(SceneConfig::default(), &loader);

        mgr.load_scene(&doc()).unwrap();
        assert_eq!(loader.parked_paths().len(), 5);
        assert!(loader.parked_paths().contains(&lightmap_path("t", "direct")));

        let env = &mgr.scene_data().env;
        let direct = env.lm_direct.clone().unwrap();
        let missing = env.lm_indir_sh[3].clone().unwrap();
        assert!(!mgr.resources().textures().is_ready(&direct));

        assert_eq!(loader.complete_all(), 4);
        assert_eq!(mgr.process_pending_tasks(), 5);
        assert_eq!(mgr.pending_texture_loads(), 0);
        assert_eq!(mgr.dropped_tasks(), 0);

        let textures = mgr.resources().textures();
        assert_eq!(textures.get(&direct).map(|t| t.width), Some(16));
        assert!(!textures.is_ready(&missing));
        assert_eq!(mgr.process_pending_tasks(), 0);
    }

    #[test]
    fn test_completion_after_clear_is_discarded() {
        let loader = loader_with_cube();
        loader.insert(lightmap_path("t", "direct"), dds(16));
        let mut mgr = manager(SceneConfig::default(), &loader);

        mgr.load_scene(&doc()).unwrap();
        mgr.clear_scene();
        assert_eq!(mgr.pending_texture_loads(), 0);

        loader.complete_all();
        assert_eq!(mgr.process_pending_tasks(), 0);
        assert_eq!(mgr.dropped_tasks(), 5);
        assert_eq!(mgr.entity_count(), 0);
    }

    #[test]
    fn test_queued_tasks_of_cleared_scene_do_not_run() {
        let loader = loader_with_cube();
        loader.insert(lightmap_path("t", "direct"), dds(16));
        let mut mgr = manager(SceneConfig::default(), &loader);

        mgr.load_scene(&doc()).unwrap();
        loader.complete_all();
        mgr.clear_scene();

        assert_eq!(mgr.process_pending_tasks(), 0);
        assert_eq!(mgr.dropped_tasks(), 5);
        mgr.clear_scene();
        assert_eq!(mgr.resources().textures().len(), 0);
    }

    #[test]
    fn test_reload_requests_abandoned_textures_again() {
        let loader = loader_with_cube();
        loader.insert(lightmap_path("t", "direct"), dds(16));
        let mut mgr = manager(SceneConfig::default(), &loader);

        mgr.load_scene(&doc()).unwrap();
        mgr.load_scene(&doc()).unwrap();
        assert_eq!(loader.parked_paths().len(), 10);

        loader.complete_all();
        assert_eq!(mgr.dropped_tasks(), 5);
        assert_eq!(mgr.process_pending_tasks(), 5);

        let direct = mgr.scene_data().env.lm_direct.clone().unwrap();
        assert!(mgr.resources().textures().is_ready(&direct));
        assert_eq!(mgr.find_entity("a"), Some(0));
    }

    #[test]
    fn test_shared_textures_are_requested_once() {
        let loader = loader_with_cube();
        let p = paths();
        loader.insert(p.material("a.txt"), b"texture: shared.dds\n".to_vec());
        loader.insert(p.material("b.txt"), b"texture: shared.dds srgb\n".to_vec());
        loader.insert(p.texture("shared.dds"), dds(4));
        let mut mgr = manager(SceneConfig::default(), &loader);

        let doc = json!({
            "name": "t",
            "objects": [
                { "Transform": {}, "Drawable": { "mesh_file": "cube", "mesh_name": "c1", "material_override": ["a.txt"] } },
                { "Transform": {}, "Drawable": { "mesh_file": "cube", "mesh_name": "c2", "material_override": ["b.txt"] } }
            ]
        });
        mgr.load_scene(&doc).unwrap();

        let shared = p.texture("shared.dds");
        let requests = loader.parked_paths().iter().filter(|path| **path == shared).count();
        assert_eq!(requests, 1);
        assert_eq!(mgr.pending_texture_loads(), 6);

        loader.complete_all();
        mgr.process_pending_tasks();
        let texture = mgr.resources().textures().find_by_name(&shared).unwrap();
        assert!(mgr.resources().textures().is_ready(&texture));
    }

    #[test]
    fn test_probe_faces_stream_level_by_level() {
        let loader = loader_with_cube();
        let p = paths();
        let face = |f: usize| p.texture(&format!("probes_cache/t0_{f}.dds"));
        loader.insert(face(0), probe_face(&[1024, 256]));
        loader.insert(face(1), probe_face(&[1024]));
        loader.insert(face(2), probe_face(&[1024, 99]));
        let mut mgr = manager(SceneConfig::default().with_probes(32, 2), &loader);

        let doc = json!({
            "name": "t",
            "objects": [{ "Transform": {}, "LightProbe": { "radius": 3.0 } }]
        });
        mgr.load_scene(&doc).unwrap();
        assert!(loader.parked_paths().contains(&face(5)));

        loader.complete_all();
        mgr.process_pending_tasks();

        let storage = &mgr.scene_data().probe_storage;
        assert_eq!(storage.loaded_levels(0, 0), 2);
        assert_eq!(storage.level_data(0, 0, 1).map(|d| d[0]), Some(1));
        assert_eq!(storage.loaded_levels(0, 1), 1);
        assert_eq!(storage.loaded_levels(0, 2), 1);
        assert_eq!(storage.loaded_levels(0, 3), 0);
    }
}
