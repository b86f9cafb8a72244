//! wgpu compute backend.
//!
//! The host uploads the input buffer, CPU-computed line tables, the
//! pattern resources (literal bytes + skip table, or the flat NFA program)
//! and a config word block; the kernel claims output slots with an atomic
//! counter and writes match records with `field_count = 0`. After the
//! blocking readback the host re-sorts by `line_num`, runs the CPU field
//! splitter over each selected line and patches `field_count` back in.
//!
//! Device acquisition happens once per process; any failure marks the
//! backend unavailable and every call reports it so the dispatcher can
//! fall back.

use std::sync::mpsc;
use std::sync::OnceLock;

use wgpu::util::DeviceExt;

use crate::engine::Matcher;
use crate::error::{Error, Result};
use crate::fields::{self, FieldSep};
use crate::options::{Options, MAX_FIELDS, MAX_GPU_BUFFER_SIZE, MAX_RESULTS};
use crate::record::MatchRecord;
use crate::simd;

/// The kernel's fixed-size state bitsets bound the program size.
pub const MAX_NFA_STATES: usize = 256;

const WORKGROUP_SIZE: u32 = 64;

/// Uniform config block; layout mirrors the WGSL `Config` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Config {
    flags: u32,
    pattern_len: u32,
    line_count: u32,
    state_count: u32,
    start_state: u32,
    match_capacity: u32,
    reserved0: u32,
    reserved1: u32,
}

struct GpuEngine {
    device: wgpu::Device,
    queue: wgpu::Queue,
    bind_layout: wgpu::BindGroupLayout,
    literal_pipeline: wgpu::ComputePipeline,
    regex_pipeline: wgpu::ComputePipeline,
}

static ENGINE: OnceLock<Option<GpuEngine>> = OnceLock::new();

fn engine() -> Result<&'static GpuEngine> {
    ENGINE
        .get_or_init(|| GpuEngine::new().ok())
        .as_ref()
        .ok_or_else(|| Error::gpu_unavailable("no suitable compute device"))
}

impl GpuEngine {
    fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            ..Default::default()
        }))
        .ok_or_else(|| Error::gpu_unavailable("no adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("grawk"),
                required_features: wgpu::Features::empty(),
                // Seven storage buffers are bound; the downlevel profile
                // only guarantees four.
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| Error::gpu_unavailable(e.to_string()))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grawk-kernel"),
            source: wgpu::ShaderSource::Wgsl(include_str!("kernel.wgsl").into()),
        });

        let storage_entry = |binding, read_only| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grawk-bindings"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, true),
                storage_entry(4, true),
                storage_entry(5, true),
                storage_entry(6, false),
                storage_entry(7, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grawk-pipeline"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |entry: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: entry,
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let literal_pipeline = make_pipeline("literal_main");
        let regex_pipeline = make_pipeline("regex_main");

        Ok(Self {
            device,
            queue,
            bind_layout,
            literal_pipeline,
            regex_pipeline,
        })
    }
}

/// Run the line scan on the GPU. Falls out with an error for the
/// dispatcher to translate into a CPU retry; only the input size cap is a
/// contract violation the caller may see.
pub fn scan(input: &[u8], matcher: &Matcher, options: &Options) -> Result<crate::engine::ScanResult> {
    if input.len() > MAX_GPU_BUFFER_SIZE {
        return Err(Error::InputTooLarge {
            size: input.len(),
            limit: MAX_GPU_BUFFER_SIZE,
        });
    }

    let engine = engine()?;

    // Line boundary discovery stays on the host.
    let mut line_offsets: Vec<u32> = Vec::new();
    let mut line_lengths: Vec<u32> = Vec::new();
    let mut line_start = 0usize;
    while line_start < input.len() {
        let line_end = simd::find_next_newline(input, line_start);
        line_offsets.push(line_start as u32);
        line_lengths.push((line_end - line_start) as u32);
        line_start = line_end + 1;
    }
    let line_count = line_offsets.len();
    if line_count == 0 {
        return Ok(crate::engine::ScanResult::default());
    }

    // Pattern resources per path.
    let (pipeline, pattern_words, aux_words, pattern_len, state_count, start_state) = match matcher {
        Matcher::Empty => (
            &engine.literal_pipeline,
            vec![0u32; 1],
            vec![0u32; 256],
            0u32,
            0u32,
            0u32,
        ),
        Matcher::Literal(literal) => (
            &engine.literal_pipeline,
            literal.pattern().iter().map(|&b| b as u32).collect(),
            literal.skip_table().iter().map(|&b| b as u32).collect(),
            literal.pattern().len() as u32,
            0u32,
            0u32,
        ),
        Matcher::Regex(program) => {
            if program.state_count() > MAX_NFA_STATES {
                return Err(Error::gpu_dispatch("NFA program exceeds kernel state capacity"));
            }
            let mut words = Vec::with_capacity(program.state_count() * 8);
            for state in &program.states {
                words.extend_from_slice(&[
                    state.kind,
                    state.byte,
                    state.case_insensitive,
                    state.out,
                    state.out2,
                    state.class_offset,
                    state.group,
                    0,
                ]);
            }
            let pool = if program.class_pool.is_empty() {
                vec![0u32; 8]
            } else {
                program.class_pool.clone()
            };
            (
                &engine.regex_pipeline,
                words,
                pool,
                0u32,
                program.state_count() as u32,
                program.start,
            )
        }
    };

    let match_capacity = line_count.min(MAX_RESULTS) as u32;

    let config = Config {
        flags: options.flags(),
        pattern_len,
        line_count: line_count as u32,
        state_count,
        start_state,
        match_capacity,
        reserved0: 0,
        reserved1: 0,
    };

    // Word-align the input for the array<u32> view.
    let mut padded = input.to_vec();
    while padded.len() % 4 != 0 {
        padded.push(0);
    }

    let device = &engine.device;
    let upload = |label: &str, contents: &[u8]| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::STORAGE,
        })
    };

    let config_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("config"),
        contents: bytemuck::bytes_of(&config),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let input_buf = upload("input", &padded);
    let offsets_buf = upload("line-offsets", bytemuck::cast_slice(&line_offsets));
    let lengths_buf = upload("line-lengths", bytemuck::cast_slice(&line_lengths));
    let pattern_buf = upload("pattern", bytemuck::cast_slice(&pattern_words));
    let aux_buf = upload("aux", bytemuck::cast_slice(&aux_words));

    let results_size = (match_capacity as u64) * std::mem::size_of::<MatchRecord>() as u64;
    let results_buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("results"),
        size: results_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let counters_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("counters"),
        contents: bytemuck::cast_slice(&[0u32, 0u32]),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
    });

    let results_staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("results-staging"),
        size: results_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let counters_staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("counters-staging"),
        size: 8,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("grawk-bind"),
        layout: &engine.bind_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: config_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: input_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: offsets_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: lengths_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: pattern_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: aux_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 6,
                resource: results_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 7,
                resource: counters_buf.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("grawk-dispatch"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("grawk-scan"),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups((line_count as u32).div_ceil(WORKGROUP_SIZE), 1, 1);
    }
    encoder.copy_buffer_to_buffer(&results_buf, 0, &results_staging, 0, results_size);
    encoder.copy_buffer_to_buffer(&counters_buf, 0, &counters_staging, 0, 8);
    engine.queue.submit(Some(encoder.finish()));

    // One command buffer per invocation; block on its fence before reading.
    let counters = read_back(device, &counters_staging)?;
    let counter_words: Vec<u32> = bytemuck::pod_collect_to_vec(&counters);
    let raw_count = counter_words[0];
    let stored = raw_count.min(match_capacity) as usize;

    let results = read_back(device, &results_staging)?;
    let all_records: Vec<MatchRecord> = bytemuck::pod_collect_to_vec(&results);
    let mut matches = all_records[..stored].to_vec();

    // Output order across threads is unspecified; restore line order.
    matches.sort_by_key(|m| m.line_num);

    // Field splitting runs on the host, then the counts are patched in.
    let mut result = crate::engine::ScanResult {
        matches,
        fields: Vec::new(),
        truncated: raw_count as usize > match_capacity as usize,
    };
    if options.extract_fields {
        let sep = FieldSep::from_option(options.field_separator.as_deref())?;
        for idx in 0..result.matches.len() {
            let record = result.matches[idx];
            let line = &input[record.line_start as usize..record.line_end as usize];
            let before = result.fields.len();
            let count = fields::split_line(line, idx as u32, &sep, &mut result.fields);
            if result.fields.len() > MAX_FIELDS {
                result.fields.truncate(before);
                result.truncated = true;
                break;
            }
            result.matches[idx].field_count = count;
        }
    }

    Ok(result)
}

fn read_back(device: &wgpu::Device, staging: &wgpu::Buffer) -> Result<Vec<u8>> {
    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|_| Error::gpu_dispatch("map callback dropped"))?
        .map_err(|e| Error::gpu_dispatch(e.to_string()))?;
    let data = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::prepare_matcher;

    // These run only where a compute device is actually present; a missing
    // adapter reports GpuUnavailable and the assertions are skipped.
    fn gpu_scan(input: &[u8], pattern: &[u8], options: &Options) -> Option<crate::engine::ScanResult> {
        let matcher = prepare_matcher(pattern, options).unwrap();
        match scan(input, &matcher, options) {
            Ok(result) => Some(result),
            Err(Error::GpuUnavailable { .. }) => None,
            Err(other) => panic!("gpu scan failed: {other}"),
        }
    }

    #[test]
    fn test_gpu_literal_parity() {
        let input = b"hello world\nerror occurred\nall is well\nerror again\n";
        let options = Options::new();
        let Some(gpu) = gpu_scan(input, b"error", &options) else {
            return;
        };
        let matcher = prepare_matcher(b"error", &options).unwrap();
        let cpu = crate::engine::scan(input, &matcher, &options).unwrap();
        assert_eq!(gpu.matches, cpu.matches);
    }

    #[test]
    fn test_gpu_regex_parity() {
        let input = b"hello world\nhello123\nworld456\n";
        let options = Options::new();
        let Some(gpu) = gpu_scan(input, b"[0-9]+", &options) else {
            return;
        };
        let matcher = prepare_matcher(b"[0-9]+", &options).unwrap();
        let cpu = crate::engine::scan(input, &matcher, &options).unwrap();
        assert_eq!(gpu.matches, cpu.matches);
    }

    #[test]
    fn test_gpu_fields_patched_on_host() {
        let input = b"root:x:0:0\nbin:x:1:1\n";
        let options = Options::new().extract_fields(true).field_separator(&b":"[..]);
        let Some(gpu) = gpu_scan(input, b"", &options) else {
            return;
        };
        assert_eq!(gpu.matches.len(), 2);
        assert_eq!(gpu.fields.len(), 8);
        assert!(gpu.matches.iter().all(|m| m.field_count == 4));
    }

    #[test]
    fn test_input_cap_enforced() {
        let input = vec![0u8; MAX_GPU_BUFFER_SIZE + 1];
        let matcher = prepare_matcher(b"x", &Options::new()).unwrap();
        assert!(matches!(
            scan(&input, &matcher, &Options::new()),
            Err(Error::InputTooLarge { .. })
        ));
    }
}
