#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use scene_import::{
    data_structures::texture::{TextureHandle, TextureRole},
    resources::texture::{TextureUpload, load_binary},
};
use tempfile::TempDir;

/// A scene directory that disappears with the test.
pub(crate) struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create fixture directory"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture subdirectory");
        }
        fs::write(&path, contents).expect("failed to write fixture");
        path
    }

    /// A 2x2 PNG of one colour.
    pub fn png(&self, name: &str, rgba: [u8; 4]) -> PathBuf {
        let path = self.path(name);
        image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba))
            .save(&path)
            .expect("failed to write png fixture");
        path
    }

    /// Writes `document` as `name` next to the shared `tri.bin` buffer.
    pub fn gltf(&self, name: &str, document: &str) -> PathBuf {
        self.write("tri.bin", triangle_buffer());
        self.write(name, document)
    }
}

/// Records every upload request and never produces a GPU texture.
///
/// Unreadable files fail with the read error so messages look like the real thing.
#[derive(Default)]
pub(crate) struct RecordingUpload {
    pub uploads: Vec<(PathBuf, TextureRole)>,
}

impl TextureUpload for RecordingUpload {
    fn upload(&mut self, path: &Path, role: TextureRole) -> anyhow::Result<TextureHandle> {
        self.uploads.push((path.to_path_buf(), role));
        load_binary(path)?;
        anyhow::bail!("no device available for {}", path.display())
    }
}

pub(crate) const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

pub(crate) const QUAD_OBJ: &str = "\
o quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

/// Two objects, both using `wood.png` spelled differently; `oak` adds a specular map.
pub(crate) const TWO_WOODS_OBJ: &str = "\
mtllib scene.mtl
o first
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
usemtl wood
f 1/1/1 2/2/1 3/3/1
o second
v 0 0 1
v 1 0 1
v 0 1 1
usemtl oak
f 4/1/1 5/2/1 6/3/1
";

pub(crate) const TWO_WOODS_MTL: &str = "\
newmtl wood
map_Kd wood.png

newmtl oak
map_Kd ./textures/../wood.png
map_Ks oak_spec.png
";

/// Mesh 0 `A` is untextured, mesh 1 `B` uses material `wood` with `wood.png`. Both are the
/// same triangle from `tri.bin`.
pub(crate) fn gltf_document(nodes: &str, scenes: &str) -> String {
    r#"{
  "asset": { "version": "2.0" },
  "scenes": @SCENES@,
  "nodes": @NODES@,
  "meshes": [
    { "name": "A", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] },
    { "name": "B", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] }
  ],
  "materials": [
    { "name": "wood", "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }
  ],
  "textures": [{ "source": 0 }],
  "images": [{ "uri": "wood.png" }],
  "buffers": [{ "uri": "tri.bin", "byteLength": 48 }],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 12 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR" }
  ]
}"#
    .replace("@SCENES@", scenes)
    .replace("@NODES@", nodes)
}

fn triangle_buffer() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let indices: [u32; 3] = [0, 1, 2];
    positions
        .iter()
        .flat_map(|f| f.to_le_bytes())
        .chain(indices.iter().flat_map(|i| i.to_le_bytes()))
        .collect()
}

#[cfg(feature = "integration-tests")]
pub(crate) fn headless_device() -> (wgpu::Device, wgpu::Queue) {
    futures::executor::block_on(async {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .expect("no graphics adapter available");
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .expect("failed to create device")
    })
}

#[cfg(feature = "integration-tests")]
pub(crate) const TARGET_SIZE: u32 = 64;

/// Draws `model` into a 64x64 offscreen target with identity transforms and returns the
/// RGBA8 pixels row by row.
#[cfg(feature = "integration-tests")]
pub(crate) fn render_offscreen(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    model: &scene_import::Model,
    shader: &scene_import::ModelShader,
) -> Vec<u8> {
    use scene_import::data_structures::texture::Texture;

    let format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let size = wgpu::Extent3d {
        width: TARGET_SIZE,
        height: TARGET_SIZE,
        depth_or_array_layers: 1,
    };
    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test target"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = Texture::create_depth_texture(device, [TARGET_SIZE, TARGET_SIZE], "test depth");

    // 64 px * 4 bytes is already a multiple of 256
    let bytes_per_row = TARGET_SIZE * 4;
    let output = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("test readback"),
        size: (bytes_per_row * TARGET_SIZE) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("test encoder"),
    });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("test pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        shader.bind(&mut pass);
        model.draw(&mut pass, shader);
    }
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(TARGET_SIZE),
            },
        },
        size,
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = output.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).ok();
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .expect("device lost while waiting for readback");
    rx.recv()
        .expect("map callback dropped")
        .expect("failed to map readback buffer");
    let pixels = slice.get_mapped_range().to_vec();
    output.unmap();
    pixels
}
