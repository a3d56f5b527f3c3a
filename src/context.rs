// src/context.rs
//
// Per-instance effect state and the slot that owns it.

use log::debug;

use crate::config::CommonConfig;
use crate::error::{EffectError, EffectResult};
use crate::parameter::{AudioMode, AudioSource};

/// Deepest status queue a context accepts.
pub const MAX_STATUS_DEPTH: usize = 1024;

/// State every effect type carries, whatever its specific parameters.
///
/// All buffers are sized here, at creation or on a common-config change,
/// so the processing path never allocates.
#[derive(Debug)]
pub struct EffectContext {
    status_depth: usize,
    common: CommonConfig,
    /// Scratch space for one block, interleaved
    work_buffer: Vec<f32>,
    volume: (f32, f32),
    audio_mode: AudioMode,
    audio_source: AudioSource,
}

impl EffectContext {
    pub fn new(status_depth: usize, common: CommonConfig) -> EffectResult<Self> {
        if status_depth == 0 {
            return Err(EffectError::InvalidArgument("status depth must be non-zero"));
        }
        if status_depth > MAX_STATUS_DEPTH {
            return Err(EffectError::InvalidArgument("status depth too large"));
        }
        common.validate()?;

        debug!(
            "EffectContext::new: status_depth={}, in={:?}, out={:?}",
            status_depth, common.input, common.output
        );

        Ok(Self {
            status_depth,
            common,
            work_buffer: vec![0.0; common.max_block_samples()],
            volume: (1.0, 1.0),
            audio_mode: AudioMode::default(),
            audio_source: AudioSource::default(),
        })
    }

    #[inline]
    pub fn status_depth(&self) -> usize {
        self.status_depth
    }

    #[inline]
    pub fn common(&self) -> &CommonConfig {
        &self.common
    }

    /// Replace the common configuration, re-sizing the work buffer.
    ///
    /// Configuration path only. A rejected config leaves the context unchanged.
    pub fn set_common(&mut self, common: CommonConfig) -> EffectResult<()> {
        common.validate()?;
        self.work_buffer.resize(common.max_block_samples(), 0.0);
        self.work_buffer.fill(0.0);
        self.common = common;
        Ok(())
    }

    /// Largest sample count a single processing call may carry.
    #[inline]
    pub fn max_block_samples(&self) -> usize {
        self.work_buffer.len()
    }

    #[inline]
    pub fn work_buffer_mut(&mut self) -> &mut [f32] {
        &mut self.work_buffer
    }

    /// Zero the work buffer (on reset).
    pub fn reset_buffer(&mut self) {
        self.work_buffer.fill(0.0);
    }

    #[inline]
    pub fn volume_stereo(&self) -> (f32, f32) {
        self.volume
    }

    pub fn set_volume_stereo(&mut self, left: f32, right: f32) -> EffectResult<()> {
        let legal = |v: f32| (0.0..=1.0).contains(&v);
        if !legal(left) || !legal(right) {
            return Err(EffectError::InvalidArgument("volume must be within 0.0..=1.0"));
        }
        self.volume = (left, right);
        Ok(())
    }

    #[inline]
    pub fn audio_mode(&self) -> AudioMode {
        self.audio_mode
    }

    pub fn set_audio_mode(&mut self, mode: AudioMode) {
        self.audio_mode = mode;
    }

    #[inline]
    pub fn audio_source(&self) -> AudioSource {
        self.audio_source
    }

    pub fn set_audio_source(&mut self, source: AudioSource) {
        self.audio_source = source;
    }
}

// ═══════════════════════════════════════════════════════════════════
// Context slot
// ═══════════════════════════════════════════════════════════════════

/// Opaque handle to the context living in a [`ContextSlot`].
///
/// A handle is only valid for the context it was issued for. Once that
/// context is released, the handle is stale and every lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle {
    generation: u64,
}

/// Single-occupancy owner of an effect's context.
#[derive(Debug)]
pub struct ContextSlot<C> {
    generation: u64,
    context: Option<C>,
}

impl<C> ContextSlot<C> {
    pub const fn new() -> Self {
        Self {
            generation: 0,
            context: None,
        }
    }

    /// Store a new context. Fails if one is already active; the active one is kept.
    pub fn insert(&mut self, context: C) -> EffectResult<ContextHandle> {
        if self.context.is_some() {
            return Err(EffectError::AlreadyExists("context already created"));
        }
        self.generation += 1;
        self.context = Some(context);
        Ok(ContextHandle {
            generation: self.generation,
        })
    }

    /// Handle of the active context, if any.
    pub fn handle(&self) -> Option<ContextHandle> {
        self.context.as_ref().map(|_| ContextHandle {
            generation: self.generation,
        })
    }

    pub fn get(&self, handle: ContextHandle) -> EffectResult<&C> {
        match &self.context {
            Some(ctx) if handle.generation == self.generation => Ok(ctx),
            _ => Err(EffectError::IllegalState("stale context handle")),
        }
    }

    pub fn get_mut(&mut self, handle: ContextHandle) -> EffectResult<&mut C> {
        match &mut self.context {
            Some(ctx) if handle.generation == self.generation => Ok(ctx),
            _ => Err(EffectError::IllegalState("stale context handle")),
        }
    }

    #[inline]
    pub fn active(&self) -> Option<&C> {
        self.context.as_ref()
    }

    #[inline]
    pub fn active_mut(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }

    /// Take the active context out of the slot, invalidating its handle.
    pub fn release(&mut self) -> Option<C> {
        self.context.take()
    }
}

impl<C> Default for ContextSlot<C> {
    fn default() -> Self {
        Self::new()
    }
}
