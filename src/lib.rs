// src/lib.rs
//
// Library entry point for FFI consumers (iOS/Swift) and Rust hosts.

mod bridge;
mod config;
mod context;
mod descriptor;
mod effects;
mod engine;
mod error;
mod factory;
mod instance;
mod parameter;

pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;

// Re-export key types for Rust consumers
pub use bridge::{ProcessStatus, StatusReceiver, StatusSender, create_status_channel};
pub use config::{
    AudioConfig, ChannelLayout, CommonConfig, DEFAULT_FRAME_COUNT, DEFAULT_SAMPLE_RATE,
    MAX_FRAME_COUNT,
};
pub use context::{ContextHandle, ContextSlot, EffectContext, MAX_STATUS_DEPTH};
pub use descriptor::{
    AecCapability, Capability, Descriptor, DescriptorCommon, DescriptorId, EffectKind, Flags,
    InsertPosition, ParamRange, SpecificCapability, VolumeControl,
};
pub use effects::{
    AcousticEchoCancelerSw, AecContext, EchoAlgorithm, Passthrough, register_standard_effects,
};
pub use engine::{EffectEngine, check_process_args};
pub use error::{
    EffectError, EffectResult, STATUS_ALREADY_EXISTS, STATUS_ILLEGAL_STATE, STATUS_INTERNAL,
    STATUS_INVALID_ARGUMENT, STATUS_NOT_FOUND, STATUS_OK, status_of,
};
pub use factory::{EffectFactory, EffectRegistry, SimpleEffectFactory};
pub use instance::{CommandId, EffectInstance, State};
pub use parameter::{
    AecParam, AecTag, AudioMode, AudioSource, Parameter, ParameterId, Specific, SpecificId,
    VendorExtension,
};
