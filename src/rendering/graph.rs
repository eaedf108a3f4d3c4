//! Render graph derived from a `SceneConfig`.
//!
//! The graph is a plain value. Applying a new config derives a new graph and
//! compares pipeline keys to decide which GPU pipelines need rebuilding; the
//! existing pipelines are never patched in place.

use crate::config::{MaterialKind, SceneConfig, ToneMapping};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassDesc {
    Sky { top: [f32; 3], bottom: [f32; 3] },
    Surface { material: MaterialKind, cull: CullMode },
    Orbiters { count: u32, emit_light: bool },
}

/// Pipeline state that can only change by rebuilding a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub surface_cull: CullMode,
}

/// Per-frame values written to the uniform buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    pub material: MaterialKind,
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    pub ambient_intensity: f32,
    pub light_intensity: f32,
    pub surface_color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderGraph {
    pub passes: Vec<PassDesc>,
    pub key: PipelineKey,
    pub frame: FrameSettings,
}

impl RenderGraph {
    pub fn derive(config: &SceneConfig) -> Self {
        let cull = if config.double_sided {
            CullMode::None
        } else {
            CullMode::Back
        };

        let mut passes = vec![
            PassDesc::Sky {
                top: config.sky_top,
                bottom: config.sky_bottom,
            },
            PassDesc::Surface {
                material: config.material,
                cull,
            },
        ];
        if config.orbiter_count > 0 {
            passes.push(PassDesc::Orbiters {
                count: config.orbiter_count,
                emit_light: config.orbiter_lights,
            });
        }

        Self {
            passes,
            key: PipelineKey { surface_cull: cull },
            frame: FrameSettings {
                material: config.material,
                tone_mapping: config.tone_mapping,
                exposure: config.exposure,
                ambient_intensity: config.ambient_intensity,
                light_intensity: config.light_intensity,
                surface_color: config.surface_color,
            },
        }
    }

    /// True when `next` needs different pipelines than `self`.
    pub fn needs_rebuild(&self, next: &RenderGraph) -> bool {
        self.key != next.key
    }

    /// Whether orbiters should light the surface this frame.
    pub fn orbiter_lights(&self) -> bool {
        self.passes
            .iter()
            .any(|p| matches!(p, PassDesc::Orbiters { emit_light: true, .. }))
    }
}
