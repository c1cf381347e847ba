//! Resolving scene references into cached resources
//!
//! [`SceneResources`] pairs the resource caches with the asset loader and the
//! platform paths. Meshes, materials, programs, animations and cubemaps are
//! read synchronously the first time they are named; 2D textures go through
//! the streaming bridge and start out as not-ready placeholders.
//!
//! Read and decode failures are logged and leave the handle not ready. None
//! of them abort a scene load.

use std::sync::Arc;

use crate::assets::{
    AnimSeqRef, AssetLoader, LoadStatus, Material, MaterialParser, MaterialRef, MeshRef, ProgramDecl, ProgramRef,
    ResourceContext, TextureRef,
};
use crate::core::config::AssetPaths;
use crate::render::{RenderBackend, TexFilter, TexFormat, TexRepeat, TextureFlags, TextureParams};
use crate::scene::streaming::StreamingBridge;

const CUBE_FACES: [&str; 6] = ["PX", "NX", "PY", "NY", "PZ", "NZ"];

/// Resource caches plus everything needed to fill them
pub struct SceneResources {
    bridge: StreamingBridge,
    ctx: ResourceContext,
    io: Arc<dyn AssetLoader>,
    paths: AssetPaths,
}

impl SceneResources {
    /// Wrap a backend and a loader
    pub fn new(backend: Box<dyn RenderBackend>, io: Arc<dyn AssetLoader>, paths: AssetPaths) -> Self {
        Self {
            bridge: StreamingBridge::new(),
            ctx: ResourceContext::new(backend),
            io,
            paths,
        }
    }

    /// Resource caches
    pub fn context(&self) -> &ResourceContext {
        &self.ctx
    }

    /// Mutable resource caches
    pub fn context_mut(&mut self) -> &mut ResourceContext {
        &mut self.ctx
    }

    /// Asset loader
    pub fn io(&self) -> &Arc<dyn AssetLoader> {
        &self.io
    }

    /// Asset locations
    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// Completion queue
    pub fn bridge(&self) -> &StreamingBridge {
        &self.bridge
    }

    /// Mutable completion queue
    pub fn bridge_mut(&mut self) -> &mut StreamingBridge {
        &mut self.bridge
    }

    fn read(&self, path: &str, what: &str) -> Option<Vec<u8>> {
        match self.io.read_file_sync(path) {
            Ok(data) => Some(data),
            Err(e) => {
                log::error!("Error loading {what} {path}: {e}");
                None
            }
        }
    }

    /// Mesh cached as `lookup`, compiled from `models/<file>` on first use
    pub fn load_mesh(&mut self, lookup: &str, file: &str) -> MeshRef {
        let (mesh, status) = self.ctx.load_mesh(lookup, None);
        if status == LoadStatus::Found {
            return mesh;
        }

        let path = self.paths.model(file);
        if let Some(data) = self.read(&path, "mesh") {
            let (_, status) = self.ctx.load_mesh(lookup, Some(&data));
            if status == LoadStatus::CreatedFromData {
                self.resolve_group_materials(&mesh);
            }
        }
        mesh
    }

    /// Give every triangle group without a material the one its mesh names
    pub fn resolve_group_materials(&mut self, mesh: &MeshRef) {
        let pending: Vec<(usize, String)> = match self.ctx.meshes().get(mesh) {
            Some(m) => m
                .groups
                .iter()
                .enumerate()
                .filter(|(_, g)| g.material.is_none() && !g.material_name.is_empty())
                .map(|(i, g)| (i, g.material_name.clone()))
                .collect(),
            None => return,
        };

        for (group, name) in pending {
            let material = self.load_material(&name);
            self.ctx.set_group_material(mesh, group, material);
        }
    }

    /// Material from `materials/<name>`, with its program and textures
    pub fn load_material(&mut self, name: &str) -> MaterialRef {
        let (material, _) = self.ctx.load_material(name, None);
        if self.ctx.materials().is_ready(&material) {
            return material;
        }

        let path = self.paths.material(name);
        let Some(data) = self.read(&path, "material") else {
            return material;
        };
        let source = match MaterialParser::parse(&String::from_utf8_lossy(&data)) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Error parsing material {name}: {e}");
                return material;
            }
        };

        let resolved = Material {
            program: source.program.as_ref().map(|decl| self.load_program(decl)),
            textures: source
                .textures
                .iter()
                .map(|t| self.load_texture(&t.file, t.flags))
                .collect(),
            params: source.params,
        };
        self.ctx.load_material(name, Some(resolved));
        material
    }

    /// Program compiled from `shaders/<vs>` and `shaders/<fs>`
    pub fn load_program(&mut self, decl: &ProgramDecl) -> ProgramRef {
        let (program, _) = self.ctx.load_program(&decl.name, None);
        if self.ctx.programs().is_ready(&program) {
            return program;
        }

        let vs = self.read(&self.paths.shader(&decl.vs), "vertex shader");
        let fs = self.read(&self.paths.shader(&decl.fs), "fragment shader");
        if let (Some(vs), Some(fs)) = (vs, fs) {
            log::info!("Compiling program {}", decl.name);
            let vs = String::from_utf8_lossy(&vs);
            let fs = String::from_utf8_lossy(&fs);
            let sources = (decl.vs.as_str(), &*vs, decl.fs.as_str(), &*fs);
            self.ctx.load_program(&decl.name, Some(sources));
        }
        program
    }

    /// Texture `textures/<name>`, loaded in the background
    ///
    /// Returns at once. The handle becomes ready when the streamed bytes are
    /// installed by the scene manager's task pump.
    pub fn load_texture(&mut self, name: &str, flags: TextureFlags) -> TextureRef {
        let path = self.paths.texture(name);
        let params = TextureParams::for_file(&path, flags | TextureFlags::USAGE_SCENE);
        let (texture, status) = self.ctx.load_texture_2d(&path, None, &params);

        let request = match status {
            LoadStatus::CreatedDefault => true,
            LoadStatus::Pending => !self.bridge.is_texture_in_flight(&path),
            LoadStatus::Found | LoadStatus::CreatedFromData => false,
        };
        if request {
            self.bridge
                .request_texture(self.io.as_ref(), texture.clone(), params);
        }
        texture
    }

    /// Animation sequence from `models/<name>`
    pub fn load_anim(&mut self, name: &str) -> AnimSeqRef {
        let (anim, status) = self.ctx.load_anim_sequence(name, None);
        if status == LoadStatus::Found {
            return anim;
        }
        if let Some(data) = self.read(&self.paths.model(name), "animation") {
            self.ctx.load_anim_sequence(name, Some(&data));
        }
        anim
    }

    /// Cubemap assembled from six `<env>_<face><ext>` files
    ///
    /// `None` when a face cannot be read or the faces do not form a cube.
    pub fn load_env_cube(&mut self, env: &str) -> Option<TextureRef> {
        let ext = self.paths.texture_ext.clone();
        let name = format!("{env}_*{ext}");
        let params = TextureParams {
            flags: TextureFlags::USAGE_SCENE,
            format: TexFormat::Compressed,
            filter: TexFilter::Bilinear,
            repeat: TexRepeat::ClampToEdge,
        };

        let (cube, status) = self.ctx.load_texture_cube(&name, None, &params);
        if status == LoadStatus::Found {
            return Some(cube);
        }

        let mut faces = Vec::with_capacity(6);
        for face in CUBE_FACES {
            let path = self.paths.texture(&format!("{env}_{face}{ext}"));
            faces.push(self.read(&path, "environment face")?);
        }
        let faces: [&[u8]; 6] = std::array::from_fn(|i| faces[i].as_slice());

        self.ctx.load_texture_cube(&name, Some(faces), &params);
        self.ctx.textures().is_ready(&cube).then_some(cube)
    }
}
