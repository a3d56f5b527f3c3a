// src/config.rs
//
// Common stream configuration handed to an effect when its context is created.

use crate::error::{EffectError, EffectResult};

// Default audio configuration
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
pub const DEFAULT_FRAME_COUNT: usize = 480;

/// Largest block a context will allocate for, per side.
pub const MAX_FRAME_COUNT: usize = 65_536;

/// Channel layout of one side of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLayout {
    Mono,
    #[default]
    Stereo,
}

impl ChannelLayout {
    #[inline]
    pub fn channel_count(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Decode a raw channel count (C ABI / web binding).
    pub fn from_count(count: u32) -> EffectResult<Self> {
        match count {
            1 => Ok(ChannelLayout::Mono),
            2 => Ok(ChannelLayout::Stereo),
            _ => Err(EffectError::InvalidArgument("unsupported channel count")),
        }
    }
}

/// Configuration of one direction (input or output) of the stream.
///
/// Samples are always 32-bit float, interleaved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    pub channel_layout: ChannelLayout,
    /// Frames per processing block
    pub frame_count: usize,
}

impl AudioConfig {
    pub fn new(sample_rate: u32, channel_layout: ChannelLayout, frame_count: usize) -> Self {
        Self {
            sample_rate,
            channel_layout,
            frame_count,
        }
    }

    /// Interleaved samples in one frame.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.channel_layout.channel_count()
    }

    /// Interleaved samples in one full block.
    #[inline]
    pub fn block_samples(&self) -> usize {
        self.frame_count * self.frame_size()
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, ChannelLayout::Stereo, DEFAULT_FRAME_COUNT)
    }
}

/// Common parameters shared by every effect type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommonConfig {
    /// Audio session the effect is attached to
    pub session: i32,
    /// Host IO handle the effect is attached to
    pub io_handle: i32,
    pub input: AudioConfig,
    pub output: AudioConfig,
}

impl CommonConfig {
    /// Same configuration on both sides of the stream.
    pub fn symmetric(audio: AudioConfig) -> Self {
        Self {
            session: 0,
            io_handle: 0,
            input: audio,
            output: audio,
        }
    }

    pub fn validate(&self) -> EffectResult<()> {
        for side in [&self.input, &self.output] {
            if side.sample_rate == 0 {
                return Err(EffectError::InvalidArgument("sample rate must be non-zero"));
            }
            if side.frame_count == 0 {
                return Err(EffectError::InvalidArgument("frame count must be non-zero"));
            }
            if side.frame_count > MAX_FRAME_COUNT {
                return Err(EffectError::InvalidArgument("frame count too large"));
            }
        }
        Ok(())
    }

    /// Largest number of samples one processing call may carry.
    pub fn max_block_samples(&self) -> usize {
        self.input.block_samples().max(self.output.block_samples())
    }
}
