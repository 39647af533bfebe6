//! The composite compute pass: WGSL source, bind group layout and pipeline.

/// Uniform block size in bytes.
///
/// Layout:
///   [0..8]   `cell_size`:   vec2<u32>
///   [8..16]  `grid_size`:   vec2<u32>
///   [16..24] `target_size`: vec2<u32>
///   [24..28] background:  u32 (packed RGBA)
///   [28..32] flags:       u32 (bit 0 = retro scanlines)
pub const UNIFORM_SIZE: u64 = 32;

/// Workgroup edge, matching `@workgroup_size` below.
pub const WORKGROUP_SIZE: u32 = 8;

pub const FLAG_RETRO: u32 = 1;

const COMPOSITE_SHADER_SRC: &str = "
struct Uniforms {
    cell_size: vec2<u32>,
    grid_size: vec2<u32>,
    target_size: vec2<u32>,
    background: u32,
    flags: u32,
}

struct Cell {
    background: u32,
    foreground: u32,
    glyph_x: u32,
    glyph_y: u32,
    // i16 x | i16 y << 16, relative to the cell's top-left pixel.
    box_origin: u32,
    // u16 width | u16 height << 16.
    box_size: u32,
}

const NO_GLYPH: u32 = 0xffffffffu;
const RETIRED: u32 = 0xfffffffeu;
const FLAG_RETRO: u32 = 1u;

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var<storage, read> cells: array<Cell>;
@group(0) @binding(2) var atlas: texture_2d<f32>;
@group(0) @binding(3) var output: texture_storage_2d<rgba8unorm, write>;

// Coverage of `cell`'s glyph at `local`, a pixel in that cell's space.
// Zero outside the glyph box.
fn coverage(cell: Cell, local: vec2<i32>) -> vec4<f32> {
    if (cell.glyph_x == NO_GLYPH) {
        return vec4<f32>(0.0);
    }
    let origin = vec2<i32>(
        bitcast<i32>(cell.box_origin << 16u) >> 16u,
        bitcast<i32>(cell.box_origin) >> 16u,
    );
    let size = vec2<i32>(i32(cell.box_size & 0xffffu), i32(cell.box_size >> 16u));
    let p = local - origin;
    if (any(p < vec2<i32>(0)) || any(p >= size)) {
        return vec4<f32>(0.0);
    }
    return textureLoad(atlas, vec2<i32>(i32(cell.glyph_x), i32(cell.glyph_y)) + p, 0);
}

@compute @workgroup_size(8, 8)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x >= uniforms.target_size.x || id.y >= uniforms.target_size.y) {
        return;
    }
    let cell_pos = id.xy / uniforms.cell_size;
    if (cell_pos.x >= uniforms.grid_size.x || cell_pos.y >= uniforms.grid_size.y) {
        textureStore(output, id.xy, unpack4x8unorm(uniforms.background));
        return;
    }

    let row = cell_pos.y * uniforms.grid_size.x;
    let cell = cells[row + cell_pos.x];
    // Drawn by an earlier flush this frame; its atlas texels are gone.
    if (cell.glyph_y == RETIRED) {
        return;
    }

    let local = vec2<i32>(id.xy % uniforms.cell_size);
    let cell_w = i32(uniforms.cell_size.x);
    var color = unpack4x8unorm(cell.background);
    // Glyph boxes may overhang into the neighbouring columns.
    for (var dx = -1; dx <= 1; dx++) {
        let col = i32(cell_pos.x) + dx;
        if (col < 0 || col >= i32(uniforms.grid_size.x)) {
            continue;
        }
        let owner = cells[row + u32(col)];
        let texel = coverage(owner, local - vec2<i32>(dx * cell_w, 0));
        let fg = unpack4x8unorm(owner.foreground);
        color = vec4<f32>(mix(color.rgb, fg.rgb, texel.rgb), max(color.a, texel.a));
    }
    if ((uniforms.flags & FLAG_RETRO) != 0u && (id.y & 1u) == 1u) {
        color = vec4<f32>(color.rgb * 0.8, color.a);
    }
    textureStore(output, id.xy, color);
}
";

/// group(0): uniforms, cell table, atlas texture, output storage texture.
pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("composite_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
        ],
    })
}

pub fn create_composite_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("composite_shader"),
        source: wgpu::ShaderSource::Wgsl(COMPOSITE_SHADER_SRC.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("composite_pipeline_layout"),
        bind_group_layouts: &[layout],
        immediate_size: 0,
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("composite_pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    })
}

/// Workgroups needed to cover `size` pixels.
pub fn workgroup_count(size: (u32, u32)) -> (u32, u32) {
    (
        size.0.div_ceil(WORKGROUP_SIZE),
        size.1.div_ceil(WORKGROUP_SIZE),
    )
}

/// Little-endian uniform block.
pub fn uniform_bytes(
    cell_size: (u32, u32),
    grid_size: (u16, u16),
    target_size: (u32, u32),
    background: u32,
    flags: u32,
) -> [u8; UNIFORM_SIZE as usize] {
    let words = [
        cell_size.0.max(1),
        cell_size.1.max(1),
        u32::from(grid_size.0),
        u32::from(grid_size.1),
        target_size.0,
        target_size.1,
        background,
        flags,
    ];
    let mut out = [0u8; UNIFORM_SIZE as usize];
    for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    out
}
