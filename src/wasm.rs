//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { aecsw_init, WasmConfig, WasmAcousticEchoCanceler } from './aecsw.js';
//!
//! await init();
//! aecsw_init();
//!
//! const aec = new WasmAcousticEchoCanceler(new WasmConfig(), 8);
//! aec.set_echo_delay(20000);
//! aec.start();
//!
//! // In the AudioWorklet
//! aec.process(inputFloat32Array, outputFloat32Array);
//! ```

use wasm_bindgen::prelude::*;

use crate::config::{
    AudioConfig, ChannelLayout, CommonConfig, DEFAULT_FRAME_COUNT, DEFAULT_SAMPLE_RATE,
};
use crate::effects::AcousticEchoCancelerSw;
use crate::error::{EffectError, EffectResult};
use crate::instance::{CommandId, EffectInstance};
use crate::parameter::{AecParam, AecTag, Parameter, ParameterId, Specific, SpecificId};

fn to_js(err: EffectError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn aecsw_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Stream configuration, applied to both input and output.
#[wasm_bindgen]
#[derive(Clone, Copy)]
pub struct WasmConfig {
    /// Sample rate in Hz (e.g., 16000, 48000).
    pub sample_rate: u32,
    /// Interleaved channel count (1 or 2).
    pub channels: u32,
    /// Frames per processing block (128 for an AudioWorklet).
    pub frame_count: u32,
}

#[wasm_bindgen]
impl WasmConfig {
    /// Create a new configuration with default values.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with custom values.
    pub fn with_values(sample_rate: u32, channels: u32, frame_count: u32) -> Self {
        Self {
            sample_rate,
            channels,
            frame_count,
        }
    }
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            frame_count: DEFAULT_FRAME_COUNT as u32,
        }
    }
}

impl WasmConfig {
    fn to_common(self) -> EffectResult<CommonConfig> {
        let layout = ChannelLayout::from_count(self.channels)?;
        Ok(CommonConfig::symmetric(AudioConfig::new(
            self.sample_rate,
            layout,
            self.frame_count as usize,
        )))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Effect
// ═══════════════════════════════════════════════════════════════════════════

/// An opened acoustic echo canceller.
#[wasm_bindgen]
pub struct WasmAcousticEchoCanceler {
    inner: EffectInstance,
}

#[wasm_bindgen]
impl WasmAcousticEchoCanceler {
    #[wasm_bindgen(constructor)]
    pub fn new(config: WasmConfig, status_depth: u32) -> Result<WasmAcousticEchoCanceler, JsValue> {
        let mut inner = EffectInstance::new(Box::new(AcousticEchoCancelerSw::new()));
        let common = config.to_common().map_err(to_js)?;
        // Reports are only consumed by native hosts; the receiver is dropped here.
        inner
            .open(&common, None, status_depth.max(1) as usize)
            .map_err(to_js)?;
        Ok(Self { inner })
    }

    pub fn name(&self) -> String {
        self.inner.descriptor().name().to_string()
    }

    pub fn set_echo_delay(&mut self, delay_us: i32) -> Result<(), JsValue> {
        let specific: Specific = AecParam::EchoDelayUs(delay_us).into();
        self.inner
            .set_parameter(&Parameter::Specific(specific))
            .map_err(to_js)
    }

    pub fn echo_delay(&self) -> Result<i32, JsValue> {
        let id = ParameterId::Specific(SpecificId::AcousticEchoCanceler(AecTag::EchoDelayUs));
        match self.inner.get_parameter(&id).map_err(to_js)? {
            Parameter::Specific(Specific::AcousticEchoCanceler(AecParam::EchoDelayUs(v))) => Ok(v),
            _ => Err(to_js(EffectError::NotFound("echo delay"))),
        }
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.inner.command(CommandId::Start).map_err(to_js)
    }

    pub fn stop(&mut self) -> Result<(), JsValue> {
        self.inner.command(CommandId::Stop).map_err(to_js)
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.inner.command(CommandId::Reset).map_err(to_js)
    }

    /// Process `input` into `output`. Returns the number of samples produced.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> Result<usize, JsValue> {
        let samples = input.len().min(output.len());
        self.inner
            .process_block(input, output, samples)
            .map_err(to_js)
    }
}
