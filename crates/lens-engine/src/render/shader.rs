//! Shader program builder.
//!
//! A program is a WGSL vertex stage plus a WGSL fragment stage. Building one
//! compiles each stage (parse + validate), checks its entry point, links the
//! pair by matching the fragment inputs against the vertex outputs, and only
//! then creates the GPU shader modules. Any failure is an error; there is no
//! partially usable program.

use std::fmt;

use naga::{Binding, Handle, Module, Type, TypeInner};

use super::resource::{Owned, ResourceKind};

/// Diagnostics are cut to this many bytes.
pub const MAX_LOG_LEN: usize = 512;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Entry point each stage must define.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }

    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader compilation failed\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("{stage} shader has no `{entry_point}` entry point")]
    MissingEntryPoint {
        stage: ShaderStage,
        entry_point: &'static str,
    },

    #[error("program linking failed\n{log}")]
    Link { log: String },
}

impl ShaderError {
    /// Driver-style diagnostic text for this failure.
    pub fn log(&self) -> String {
        match self {
            ShaderError::Compile { log, .. } | ShaderError::Link { log } => log.clone(),
            other => other.to_string(),
        }
    }
}

/// WGSL source text for both stages.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSources<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

impl ShaderSources<'static> {
    /// Full-screen quad vertex stage + box-blur fragment stage.
    pub fn box_blur() -> Self {
        Self {
            vertex: include_str!("shaders/fullscreen.wgsl"),
            fragment: include_str!("shaders/box_blur.wgsl"),
        }
    }
}

/// One stage that parsed and validated.
#[derive(Debug)]
pub struct CompiledStage {
    stage: ShaderStage,
    module: Module,
}

impl CompiledStage {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry(&self) -> Option<&naga::EntryPoint> {
        let name = self.stage.entry_point();
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.stage == self.stage.naga() && ep.name == name)
    }

    /// User-defined (location-bound) interface of the entry point: the
    /// outputs of a vertex stage or the inputs of a fragment stage.
    fn interface(&self) -> Vec<(u32, TypeInner)> {
        let mut out = Vec::new();
        let Some(ep) = self.entry() else { return out };

        match self.stage {
            ShaderStage::Vertex => {
                if let Some(result) = &ep.function.result {
                    collect_locations(&self.module, result.binding.as_ref(), result.ty, &mut out);
                }
            }
            ShaderStage::Fragment => {
                for arg in &ep.function.arguments {
                    collect_locations(&self.module, arg.binding.as_ref(), arg.ty, &mut out);
                }
            }
        }

        out.sort_by_key(|(loc, _)| *loc);
        out
    }
}

fn collect_locations(
    module: &Module,
    binding: Option<&Binding>,
    ty: Handle<Type>,
    out: &mut Vec<(u32, TypeInner)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.binding.as_ref(), m.ty, out);
                }
            }
        }
    }
}

fn truncate_log(mut log: String) -> String {
    if log.len() > MAX_LOG_LEN {
        let mut cut = MAX_LOG_LEN;
        while !log.is_char_boundary(cut) {
            cut -= 1;
        }
        log.truncate(cut);
    }
    log
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        text.push_str(": ");
        text.push_str(&e.to_string());
        source = e.source();
    }
    text
}

/// Parses and validates one stage, and checks its entry point.
pub fn compile_stage(stage: ShaderStage, source: &str) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        log: truncate_log(e.emit_to_string(source)),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Compile {
        stage,
        log: truncate_log(error_chain(&e)),
    })?;

    let compiled = CompiledStage { stage, module };
    if compiled.entry().is_none() {
        return Err(ShaderError::MissingEntryPoint {
            stage,
            entry_point: stage.entry_point(),
        });
    }

    Ok(compiled)
}

/// Checks that every fragment input is produced by the vertex stage with
/// the same type.
pub fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<(), ShaderError> {
    debug_assert_eq!(vertex.stage, ShaderStage::Vertex);
    debug_assert_eq!(fragment.stage, ShaderStage::Fragment);

    let outputs = vertex.interface();
    let mut problems = Vec::new();

    for (location, ty) in fragment.interface() {
        match outputs.iter().find(|(l, _)| *l == location) {
            None => problems.push(format!(
                "fragment input @location({location}) is not written by the vertex stage"
            )),
            Some((_, out_ty)) if *out_ty != ty => problems.push(format!(
                "@location({location}) type mismatch: vertex writes {out_ty:?}, fragment reads {ty:?}"
            )),
            Some(_) => {}
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ShaderError::Link {
            log: truncate_log(problems.join("\n")),
        })
    }
}

/// Linked vertex + fragment shader modules.
pub struct ShaderProgram {
    vertex: Owned<wgpu::ShaderModule>,
    fragment: Owned<wgpu::ShaderModule>,
}

impl ShaderProgram {
    /// Compiles, links and uploads `sources`.
    ///
    /// Nothing is created on the device unless both stages compiled and
    /// linked; the caller reports the error.
    pub fn build(device: &wgpu::Device, sources: &ShaderSources<'_>) -> Result<Self, ShaderError> {
        let vs = compile_stage(ShaderStage::Vertex, sources.vertex)?;
        let fs = compile_stage(ShaderStage::Fragment, sources.fragment)?;
        link(&vs, &fs)?;

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lens vertex shader"),
            source: wgpu::ShaderSource::Wgsl(sources.vertex.into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lens fragment shader"),
            source: wgpu::ShaderSource::Wgsl(sources.fragment.into()),
        });

        log::debug!("shader program built");

        Ok(Self {
            vertex: Owned::new(ResourceKind::ShaderModule, "vertex shader", vertex),
            fragment: Owned::new(ResourceKind::ShaderModule, "fragment shader", fragment),
        })
    }

    pub fn vertex_module(&self) -> &wgpu::ShaderModule {
        &self.vertex
    }

    pub fn fragment_module(&self) -> &wgpu::ShaderModule {
        &self.fragment
    }
}
