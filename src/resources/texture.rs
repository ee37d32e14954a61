use std::path::{Component, Path, PathBuf};

use anyhow::Context;

use crate::data_structures::texture::{Texture, TextureHandle, TextureRole};

/// Layout of texture group 0: one filterable 2D texture and its sampler.
pub fn diffuse_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Model texture_bind_group_layout"),
    })
}

pub fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("could not read {}", path.display()))
}

/**
 * Turns an image file into something a mesh can bind.
 *
 * The importer only talks to this trait, so everything up to the actual upload (traversal,
 * extraction, cache bookkeeping) runs without a GPU when a different implementation is
 * plugged in.
 */
pub trait TextureUpload {
    fn upload(&mut self, path: &Path, role: TextureRole) -> anyhow::Result<TextureHandle>;
}

/// Reads, decodes and uploads images with a wgpu device.
pub struct WgpuTextureUpload<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl<'a> WgpuTextureUpload<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl TextureUpload for WgpuTextureUpload<'_> {
    fn upload(&mut self, path: &Path, role: TextureRole) -> anyhow::Result<TextureHandle> {
        let data = load_binary(path)?;
        let label = path.display().to_string();
        let texture = Texture::from_bytes(self.device, self.queue, &data, &label)
            .with_context(|| format!("could not decode {label}"))?;
        Ok(TextureHandle::new(
            self.device,
            texture,
            &format!("{} {label}", role.type_name()),
        ))
    }
}

/// Joins a material's texture path onto the scene directory and folds it to a canonical
/// spelling, so the cache sees one key per file no matter how the material wrote it.
///
/// Backslashes are treated as separators. `.` is dropped and `..` removes the previous
/// component where there is one. Nothing touches the filesystem.
pub fn resolve_path(directory: &Path, relative: &str) -> PathBuf {
    let relative = relative.replace('\\', "/");
    let relative = Path::new(&relative);
    let joined = if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        directory.join(relative)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
