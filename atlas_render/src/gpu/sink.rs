//! [`GpuSink`] backed by wgpu: atlas texture, cell table buffer and the
//! composite dispatch.

use std::borrow::Cow;
use std::path::Path;

use log::{debug, trace};

use atlas_core::{
    AtlasPixels, AtlasRegion, Cell, CellGrid, GpuSink, MiscSettings, RenderError, RenderWarning,
    WarningKind,
};

use super::context::GpuContext;
use super::pipeline::{self, FLAG_RETRO, UNIFORM_SIZE, uniform_bytes, workgroup_count};

/// Files named by [`MiscSettings`], read from disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShaderResources {
    pub shader_source: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// Read the custom shader and its image. A failure names the file that
/// could not be read; the shader is tried first.
pub fn load_shader_resources(misc: &MiscSettings) -> Result<ShaderResources, RenderWarning> {
    let read_text = |path: &Path| {
        std::fs::read_to_string(path)
            .map_err(|_| RenderWarning::for_path(WarningKind::ShaderLoadFailed, path))
    };
    let read_bytes = |path: &Path| {
        std::fs::read(path)
            .map_err(|_| RenderWarning::for_path(WarningKind::ShaderImageLoadFailed, path))
    };
    Ok(ShaderResources {
        shader_source: misc.custom_shader_path.as_deref().map(read_text).transpose()?,
        image: misc.shader_image_path.as_deref().map(read_bytes).transpose()?,
    })
}

/// Atlas pixels as RGBA8. Coverage masks are replicated into every channel.
pub fn expand_to_rgba(pixels: AtlasPixels<'_>) -> Cow<'_, [u8]> {
    match pixels {
        AtlasPixels::Alpha(data) => Cow::Owned(data.iter().flat_map(|&a| [a; 4]).collect()),
        AtlasPixels::Subpixel(data) | AtlasPixels::Rgba(data) => Cow::Borrowed(data),
    }
}

/// Cell buffer capacity for `cells` cells, never zero.
fn cell_buffer_size(cells: usize) -> u64 {
    (cells.max(1) * Cell::SIZE) as u64
}

fn gpu_error(message: impl Into<String>) -> RenderError {
    RenderError::Gpu(message.into())
}

/// Composites cell tables into an offscreen RGBA8 texture.
pub struct WgpuSink {
    ctx: GpuContext,
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
    atlas: Option<(wgpu::Texture, wgpu::TextureView)>,
    cell_buffer: Option<wgpu::Buffer>,
    output: wgpu::Texture,
    output_view: wgpu::TextureView,
    /// Rebuilt whenever a bound resource is replaced.
    bind_group: Option<wgpu::BindGroup>,
    target_size: (u32, u32),
    cell_size: (u32, u32),
    grid_size: (u16, u16),
    background: u32,
    flags: u32,
    resources: ShaderResources,
    dispatches: u64,
}

impl WgpuSink {
    pub fn new(ctx: GpuContext, target_size: (u32, u32), cell_size: (u32, u32)) -> Self {
        let layout = pipeline::create_bind_group_layout(&ctx.device);
        let pipeline = pipeline::create_composite_pipeline(&ctx.device, &layout);
        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("composite_uniforms"),
            size: UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let (output, output_view) = create_output(&ctx.device, target_size);
        Self {
            ctx,
            layout,
            pipeline,
            uniform_buffer,
            atlas: None,
            cell_buffer: None,
            output,
            output_view,
            bind_group: None,
            target_size,
            cell_size,
            grid_size: (0, 0),
            background: MiscSettings::default().background,
            flags: 0,
            resources: ShaderResources::default(),
            dispatches: 0,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// The composited image.
    pub fn output(&self) -> &wgpu::Texture {
        &self.output
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.target_size
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// Custom shader files loaded by the last successful `apply_misc`.
    pub fn shader_resources(&self) -> &ShaderResources {
        &self.resources
    }

    /// Copy the composited image back as tightly packed RGBA8 rows.
    ///
    /// Blocks until the GPU is done.
    pub fn read_output(&self) -> atlas_core::Result<Vec<u8>> {
        let (width, height) = (self.target_size.0.max(1), self.target_size.1.max(1));
        let row_bytes = width * 4;
        let padded_row = row_bytes.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("composite_readback"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.output,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.ctx
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| gpu_error(format!("readback poll failed: {e}")))?;
        rx.recv()
            .map_err(|e| gpu_error(format!("readback callback dropped: {e}")))?
            .map_err(|e| gpu_error(format!("readback map failed: {e}")))?;

        let mut pixels = Vec::with_capacity(row_bytes as usize * height as usize);
        {
            let mapped = buffer.slice(..).get_mapped_range();
            for row in mapped.chunks_exact(padded_row as usize) {
                pixels.extend_from_slice(&row[..row_bytes as usize]);
            }
        }
        buffer.unmap();
        Ok(pixels)
    }

    /// Recreate the output texture for a new target or cell size.
    pub fn resize(&mut self, target_size: (u32, u32), cell_size: (u32, u32)) {
        self.cell_size = cell_size;
        if target_size != self.target_size {
            let (output, view) = create_output(&self.ctx.device, target_size);
            self.output = output;
            self.output_view = view;
            self.target_size = target_size;
            self.bind_group = None;
            debug!("gpu: output resized to {}x{}", target_size.0, target_size.1);
        }
    }

    fn write_uniforms(&self) {
        let bytes = uniform_bytes(
            self.cell_size,
            self.grid_size,
            self.target_size,
            self.background,
            self.flags,
        );
        self.ctx.queue.write_buffer(&self.uniform_buffer, 0, &bytes);
    }

    /// Make sure the cell buffer holds at least `cells` cells.
    fn reserve_cells(&mut self, cells: usize) {
        let size = cell_buffer_size(cells);
        if self.cell_buffer.as_ref().is_some_and(|b| b.size() >= size) {
            return;
        }
        trace!("gpu: cell buffer grown to {size} bytes");
        self.cell_buffer = Some(self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cell_table"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.bind_group = None;
    }

    fn ensure_bind_group(&mut self) -> atlas_core::Result<()> {
        if self.bind_group.is_none() {
            let (_, atlas_view) = self.atlas.as_ref().ok_or_else(|| gpu_error("no atlas texture"))?;
            let cells = self.cell_buffer.as_ref().ok_or_else(|| gpu_error("no cell table bound"))?;
            self.bind_group = Some(self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("composite_bind_group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: cells.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(atlas_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&self.output_view),
                    },
                ],
            }));
        }
        Ok(())
    }
}

impl GpuSink for WgpuSink {
    fn max_texture_dimension(&self) -> u32 {
        self.ctx.max_texture_dimension()
    }

    fn create_atlas(&mut self, width: u32, height: u32) -> atlas_core::Result<()> {
        let max = self.max_texture_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(gpu_error(format!(
                "atlas of {width}x{height} exceeds the device limit of {max}"
            )));
        }
        let texture = self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph_atlas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.atlas = Some((texture, view));
        self.bind_group = None;
        debug!("gpu: atlas texture {width}x{height}");
        Ok(())
    }

    fn upload_atlas_region(
        &mut self,
        region: AtlasRegion,
        pixels: AtlasPixels<'_>,
    ) -> atlas_core::Result<()> {
        let (texture, _) = self.atlas.as_ref().ok_or_else(|| gpu_error("no atlas texture"))?;
        if region.width == 0 || region.height == 0 {
            return Ok(());
        }
        let expected = region.width as usize * region.height as usize * pixels.bytes_per_pixel();
        if pixels.data().len() != expected {
            return Err(gpu_error(format!(
                "upload of {}x{} expects {expected} bytes, got {}",
                region.width,
                region.height,
                pixels.data().len()
            )));
        }
        let rgba = expand_to_rgba(pixels);
        self.ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * region.width),
                rows_per_image: Some(region.height),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn bind_cell_table(&mut self, cells: &CellGrid) -> atlas_core::Result<()> {
        self.reserve_cells(cells.cells().len());
        self.grid_size = (cells.cols(), cells.rows());
        let buffer = self
            .cell_buffer
            .as_ref()
            .ok_or_else(|| gpu_error("no cell table"))?;
        if !cells.cells().is_empty() {
            self.ctx.queue.write_buffer(buffer, 0, &cells.to_bytes());
        }
        self.write_uniforms();
        Ok(())
    }

    fn dispatch_composite(&mut self) -> atlas_core::Result<()> {
        let (groups_x, groups_y) = workgroup_count(self.target_size);
        self.ensure_bind_group()?;
        let bind_group = self
            .bind_group
            .as_ref()
            .ok_or_else(|| gpu_error("bind group unavailable"))?;
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("composite_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("composite_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.dispatches += 1;
        Ok(())
    }

    fn apply_misc(&mut self, misc: &MiscSettings) -> Result<(), RenderWarning> {
        self.background = misc.background;
        self.flags = if misc.retro_effect { FLAG_RETRO } else { 0 };
        self.write_uniforms();
        match load_shader_resources(misc) {
            Ok(resources) => {
                self.resources = resources;
                Ok(())
            }
            Err(warning) => {
                self.resources = ShaderResources::default();
                Err(warning)
            }
        }
    }

    fn resize_cell_table(&mut self, cols: u16, rows: u16) -> atlas_core::Result<()> {
        self.reserve_cells(usize::from(cols) * usize::from(rows));
        self.grid_size = (cols, rows);
        Ok(())
    }
}

impl std::fmt::Debug for WgpuSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuSink")
            .field("target_size", &self.target_size)
            .field("grid_size", &self.grid_size)
            .field("dispatches", &self.dispatches)
            .finish_non_exhaustive()
    }
}

fn create_output(device: &wgpu::Device, size: (u32, u32)) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("composite_output"),
        size: wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
