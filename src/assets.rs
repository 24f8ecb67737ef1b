//! Asset fetching and decoding.
//!
//! Loads run off the frame path (a worker thread on native, a `spawn_local`
//! future on the web) and report back through a channel that the frame loop
//! drains once per frame. There is no retry and no cache: a failed asset stays
//! missing for the rest of the session.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use glam::{Mat3, Mat4, Vec3};

use crate::model::{EntityKind, EntityModel, ModelPart};
use crate::utils::{Mesh, Vertex};

/// Error type for asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },

    #[error("Failed to load glTF model: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Model contains no triangle geometry")]
    EmptyModel,
}

/// Textures the arena uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Ground,
    Wall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Model(EntityKind),
    Texture(TextureSlot),
}

/// Decoded RGBA8 image
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug)]
pub enum AssetPayload {
    Model(EntityModel),
    Texture(TextureData),
}

/// Result of one finished load
#[derive(Debug)]
pub struct AssetEvent {
    pub kind: AssetKind,
    pub path: String,
    pub result: Result<AssetPayload, AssetError>,
}

pub struct AssetLoader {
    tx: Sender<AssetEvent>,
    rx: Receiver<AssetEvent>,
}

impl AssetLoader {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    /// Start loading `path` in the background
    pub fn request(&mut self, kind: AssetKind, path: String) {
        tracing::debug!(?kind, %path, "requesting asset");
        spawn_load(kind, path, self.tx.clone());
    }

    /// Finished loads since the last call, in completion order
    pub fn drain(&mut self) -> Vec<AssetEvent> {
        self.rx.try_iter().collect()
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode raw file contents into the payload `kind` expects
pub fn decode(kind: AssetKind, bytes: &[u8]) -> Result<AssetPayload, AssetError> {
    match kind {
        AssetKind::Model(_) => decode_model(bytes).map(AssetPayload::Model),
        AssetKind::Texture(_) => decode_texture(bytes).map(AssetPayload::Texture),
    }
}

pub fn decode_texture(bytes: &[u8]) -> Result<TextureData, AssetError> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok(TextureData { width, height, rgba: img.into_raw() })
}

/// Flatten every triangle primitive of the default scene into one mesh in
/// model space. Material base colour becomes the vertex colour; a base-colour
/// texture embedded in the binary buffer becomes the part's texture.
///
/// Only buffers are resolved. Images are decoded one by one, and a bad image
/// leaves its part untextured instead of failing the model.
pub fn decode_model(bytes: &[u8]) -> Result<EntityModel, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, None, blob)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::EmptyModel)?;

    let mut builder = ModelBuilder::new(&buffers);
    for node in scene.nodes() {
        builder.collect_node(&node, Mat4::IDENTITY);
    }

    if builder.mesh.is_empty() {
        return Err(AssetError::EmptyModel);
    }
    EntityModel::with_parts(builder.mesh, builder.parts, builder.textures).ok_or(AssetError::EmptyModel)
}

struct ModelBuilder<'a> {
    buffers: &'a [gltf::buffer::Data],
    mesh: Mesh,
    parts: Vec<ModelPart>,
    textures: Vec<TextureData>,
    /// glTF image index to decoded texture, `None` if it could not be used
    images: HashMap<usize, Option<usize>>,
}

impl<'a> ModelBuilder<'a> {
    fn new(buffers: &'a [gltf::buffer::Data]) -> Self {
        Self {
            buffers,
            mesh: Mesh::empty(),
            parts: Vec::new(),
            textures: Vec::new(),
            images: HashMap::new(),
        }
    }

    fn collect_node(&mut self, node: &gltf::Node, parent: Mat4) {
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if matches!(primitive.mode(), gltf::mesh::Mode::Triangles) {
                    self.collect_primitive(&primitive, world);
                }
            }
        }

        for child in node.children() {
            self.collect_node(&child, world);
        }
    }

    fn collect_primitive(&mut self, primitive: &gltf::Primitive, world: Mat4) {
        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
        let Some(positions) = reader.read_positions() else {
            return;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|it| it.collect())
            .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|it| it.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);
        let indices: Vec<u32> = match reader.read_indices() {
            Some(it) => it.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let pbr = primitive.material().pbr_metallic_roughness();
        let color = pbr.base_color_factor();

        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let pos = world.transform_point3(Vec3::from(*p));
                let n = normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]);
                let normal = (normal_matrix * Vec3::from(n)).normalize_or_zero();
                Vertex {
                    pos: pos.to_array(),
                    normal: normal.to_array(),
                    color,
                    uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                }
            })
            .collect();

        // drop indices pointing past the vertex data instead of failing the model
        let count = positions.len() as u32;
        let indices: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < count))
            .flatten()
            .copied()
            .collect();
        if indices.is_empty() {
            return;
        }

        // only the first uv set is read
        let texture = pbr
            .base_color_texture()
            .filter(|info| info.tex_coord() == 0)
            .and_then(|info| self.texture_for(&info.texture().source()));

        let start = self.mesh.indices.len() as u32;
        self.mesh.append(Mesh { vertices, indices });
        self.parts.push(ModelPart { indices: start..self.mesh.indices.len() as u32, texture });
    }

    /// Decode an image once, however many primitives use it
    fn texture_for(&mut self, image: &gltf::Image) -> Option<usize> {
        if let Some(slot) = self.images.get(&image.index()) {
            return *slot;
        }
        let slot = match self.image_bytes(image).map(decode_texture) {
            Some(Ok(texture)) => {
                self.textures.push(texture);
                Some(self.textures.len() - 1)
            }
            Some(Err(err)) => {
                tracing::warn!(image = image.index(), %err, "model texture failed to decode");
                None
            }
            None => {
                tracing::warn!(image = image.index(), "model texture is not embedded in a buffer");
                None
            }
        };
        self.images.insert(image.index(), slot);
        slot
    }

    fn image_bytes(&self, image: &gltf::Image) -> Option<&'a [u8]> {
        let buffers: &'a [gltf::buffer::Data] = self.buffers;
        match image.source() {
            gltf::image::Source::View { view, .. } => {
                let data = buffers.get(view.buffer().index())?;
                data.0.get(view.offset()..view.offset() + view.length())
            }
            gltf::image::Source::Uri { .. } => None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_load(kind: AssetKind, path: String, tx: Sender<AssetEvent>) {
    std::thread::spawn(move || {
        let result = std::fs::read(&path)
            .map_err(|e| AssetError::Fetch { path: path.clone(), reason: e.to_string() })
            .and_then(|bytes| decode(kind, &bytes));
        // receiver gone means the app is shutting down
        let _ = tx.send(AssetEvent { kind, path, result });
    });
}

#[cfg(target_arch = "wasm32")]
fn spawn_load(kind: AssetKind, path: String, tx: Sender<AssetEvent>) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = fetch_bytes(&path)
            .await
            .map_err(|reason| AssetError::Fetch { path: path.clone(), reason })
            .and_then(|bytes| decode(kind, &bytes));
        let _ = tx.send(AssetEvent { kind, path, result });
    });
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or("no global `window`")?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("{e:?}"))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| "fetch did not return a Response".to_string())?;
    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(|e| format!("{e:?}"))?)
        .await
        .map_err(|e| format!("{e:?}"))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
