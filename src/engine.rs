// src/engine.rs

use crate::config::CommonConfig;
use crate::context::{ContextHandle, EffectContext};
use crate::descriptor::Descriptor;
use crate::error::{EffectError, EffectResult};
use crate::parameter::{Specific, SpecificId};

/// Core contract every effect type implements.
///
/// An engine:
/// - owns at most one context at a time
/// - validates parameters against its own capability
/// - does NOT spawn threads
/// - does NOT allocate or block inside `process`
///
/// The trait is object safe so a registry can hand out `Box<dyn EffectEngine>`.
pub trait EffectEngine: Send {
    /// Static descriptor of this effect type. Always available.
    fn descriptor(&self) -> &'static Descriptor;

    fn effect_name(&self) -> &'static str {
        self.descriptor().name()
    }

    /// Create the context. Fails with `AlreadyExists` if one is active.
    fn create_context(
        &mut self,
        status_depth: usize,
        common: &CommonConfig,
    ) -> EffectResult<ContextHandle>;

    /// Handle of the active context. Never creates one.
    fn get_context(&self) -> Option<ContextHandle>;

    /// Destroy the active context. A no-op `Ok` when there is none.
    fn release_context(&mut self) -> EffectResult<()>;

    /// Shared part of the active context (common settings, buffers).
    fn base_context(&self) -> Option<&EffectContext>;

    fn base_context_mut(&mut self) -> Option<&mut EffectContext>;

    /// Replace the common configuration of the active context.
    fn set_common(&mut self, common: &CommonConfig) -> EffectResult<()> {
        self.base_context_mut()
            .ok_or(EffectError::IllegalState("no context"))?
            .set_common(*common)
    }

    /// Validate and store one specific parameter.
    fn set_parameter_specific(&mut self, specific: &Specific) -> EffectResult<()>;

    /// Read back one specific parameter.
    fn get_parameter_specific(&self, id: &SpecificId) -> EffectResult<Specific>;

    /// Transform `samples` interleaved samples from `input` into `output`.
    ///
    /// On error `output` is left untouched. Returns the number of samples
    /// produced.
    fn process(&mut self, input: &[f32], output: &mut [f32], samples: usize)
    -> EffectResult<usize>;

    /// Same as [`EffectEngine::process`], reading and writing one buffer.
    fn process_in_place(&mut self, buffer: &mut [f32], samples: usize) -> EffectResult<usize>;

    /// Clear buffers and DSP state, keeping parameters.
    fn reset(&mut self) -> EffectResult<()>;
}

/// Check the arguments of a processing call against the active context.
///
/// Shared by every engine in the family.
#[inline]
pub fn check_process_args(
    context: Option<&EffectContext>,
    input_len: usize,
    output_len: usize,
    samples: usize,
) -> EffectResult<()> {
    let context = context.ok_or(EffectError::IllegalState("process without a context"))?;
    if samples == 0 {
        return Err(EffectError::InvalidArgument("sample count must be positive"));
    }
    if input_len < samples || output_len < samples {
        return Err(EffectError::InvalidArgument("buffer shorter than sample count"));
    }
    if samples > context.max_block_samples() {
        return Err(EffectError::InvalidArgument("sample count exceeds block size"));
    }
    Ok(())
}
