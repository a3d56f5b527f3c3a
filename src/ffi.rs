// C-compatible FFI bindings for native hosts.
//
// Safety requirements:
// - All handles must be created by this module and not fabricated
// - Pointers may be NULL; every entry point checks and returns an error status
// - String parameters must be valid null-terminated UTF-8
// - Caller must call the corresponding _destroy function for each _create
//
// Every call returns a status code (`STATUS_OK` or a negative error) unless
// documented otherwise. Panics never cross the boundary.

use std::ffi::{CStr, c_char};
use std::panic::{self, AssertUnwindSafe};

use crate::bridge::StatusReceiver;
use crate::config::{
    AudioConfig, ChannelLayout, CommonConfig, DEFAULT_FRAME_COUNT, DEFAULT_SAMPLE_RATE,
};
use crate::effects::register_standard_effects;
use crate::error::{
    EffectError, EffectResult, STATUS_INTERNAL, STATUS_INVALID_ARGUMENT, STATUS_OK, status_of,
};
use crate::factory::EffectRegistry;
use crate::instance::{CommandId, EffectInstance};
use crate::parameter::{AecParam, AecTag, ParamTag, Specific, SpecificId, VendorExtension};

use log::{debug, error, info};
use uuid::Uuid;

// Logger subsystem identifier
#[cfg(feature = "ios")]
const LOG_SUBSYSTEM: &str = "com.aecsw.engine";

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup before using any other FFI function.
/// Output appears in Console.app and Xcode's debug console.
#[cfg(feature = "ios")]
#[unsafe(no_mangle)]
pub extern "C" fn aecsw_init_logger() {
    oslog::OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(log::LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to the effect registry.
pub struct AecswRegistry {
    inner: EffectRegistry,
}

/// Opaque handle to one effect instance and the host end of its status channel.
pub struct AecswEffect {
    inner: EffectInstance,
    status: Option<StatusReceiver>,
}

// ═══════════════════════════════════════════════════════════════════════════
// FFI Data Types
// ═══════════════════════════════════════════════════════════════════════════

/// Stream configuration, applied to both input and output.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AecswConfig {
    /// Sample rate in Hz (e.g., 16000, 48000).
    pub sample_rate: u32,
    /// Interleaved channel count (1 or 2).
    pub channels: u32,
    /// Frames per processing block.
    pub frame_count: u32,
}

impl Default for AecswConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
            frame_count: DEFAULT_FRAME_COUNT as u32,
        }
    }
}

impl AecswConfig {
    fn to_common(self) -> EffectResult<CommonConfig> {
        let layout = ChannelLayout::from_count(self.channels)?;
        Ok(CommonConfig::symmetric(AudioConfig::new(
            self.sample_rate,
            layout,
            self.frame_count as usize,
        )))
    }
}

/// One processing report from the status channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct AecswStatus {
    pub status: i32,
    pub consumed: u32,
    pub produced: u32,
}

/// Get the default configuration values.
#[unsafe(no_mangle)]
pub extern "C" fn aecsw_default_config() -> AecswConfig {
    AecswConfig::default()
}

// ═══════════════════════════════════════════════════════════════════════════
// Registry Functions
// ═══════════════════════════════════════════════════════════════════════════

/// Create a registry holding every standard effect.
///
/// Returns an opaque pointer that must be freed with `aecsw_registry_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn aecsw_registry_create() -> *mut AecswRegistry {
    let mut registry = EffectRegistry::new();
    register_standard_effects(&mut registry);
    Box::into_raw(Box::new(AecswRegistry { inner: registry }))
}

/// Destroy a registry.
///
/// # Safety
/// `registry` must be a valid pointer returned by `aecsw_registry_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_registry_destroy(registry: *mut AecswRegistry) {
    if !registry.is_null() {
        unsafe { drop(Box::from_raw(registry)) };
    }
}

/// Number of registered effect types.
///
/// # Safety
/// `registry` must be NULL or a valid registry pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_registry_count(registry: *const AecswRegistry) -> u32 {
    if registry.is_null() {
        return 0;
    }
    unsafe { (*registry).inner.len() as u32 }
}

// ═══════════════════════════════════════════════════════════════════════════
// Effect Creation
// ═══════════════════════════════════════════════════════════════════════════

/// Create a closed effect instance by implementation UUID
/// ("xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx").
///
/// Returns NULL if the UUID is malformed or unknown.
///
/// # Safety
/// - `registry` must be a valid registry pointer
/// - `impl_uuid` must be a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_create(
    registry: *const AecswRegistry,
    impl_uuid: *const c_char,
) -> *mut AecswEffect {
    if registry.is_null() || impl_uuid.is_null() {
        return std::ptr::null_mut();
    }
    let registry = unsafe { &(*registry).inner };
    let uuid_str = unsafe { CStr::from_ptr(impl_uuid) };

    let created = uuid_str
        .to_str()
        .map_err(|_| EffectError::InvalidArgument("uuid is not UTF-8"))
        .and_then(|s| {
            Uuid::parse_str(s).map_err(|_| EffectError::InvalidArgument("malformed uuid"))
        })
        .and_then(|uuid| registry.create_effect(&uuid));

    match created {
        Ok(inner) => {
            info!("aecsw_effect_create: {}", inner.descriptor().name());
            Box::into_raw(Box::new(AecswEffect {
                inner,
                status: None,
            }))
        }
        Err(e) => {
            error!("aecsw_effect_create: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Destroy an effect, closing it first if needed.
///
/// # Safety
/// `effect` must be a valid pointer returned by `aecsw_effect_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_destroy(effect: *mut AecswEffect) {
    if !effect.is_null() {
        unsafe { drop(Box::from_raw(effect)) };
    }
}

/// Copy the effect name into `buf` (null-terminated, truncated to fit).
///
/// Returns the full name length in bytes, excluding the terminator.
///
/// # Safety
/// `buf` must be NULL or point to at least `len` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_name(
    effect: *const AecswEffect,
    buf: *mut c_char,
    len: usize,
) -> usize {
    if effect.is_null() {
        return 0;
    }
    let name = unsafe { (*effect).inner.descriptor().name() };
    if !buf.is_null() && len > 0 {
        let n = name.len().min(len - 1);
        unsafe {
            std::ptr::copy_nonoverlapping(name.as_ptr().cast::<c_char>(), buf, n);
            *buf.add(n) = 0;
        }
    }
    name.len()
}

/// Whether the effect type exposes a strength control.
///
/// # Safety
/// `effect` must be NULL or a valid effect pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_strength_supported(effect: *const AecswEffect) -> bool {
    if effect.is_null() {
        return false;
    }
    unsafe { (*effect).inner.descriptor().capability.strength_supported }
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

/// Open the effect with `config` (NULL for defaults).
///
/// # Safety
/// `effect` must be a valid effect pointer; `config` NULL or valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_open(
    effect: *mut AecswEffect,
    config: *const AecswConfig,
    status_depth: u32,
) -> i32 {
    if effect.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let effect = unsafe { &mut *effect };
    let cfg = if config.is_null() {
        AecswConfig::default()
    } else {
        unsafe { std::ptr::read(config) }
    };
    debug!("aecsw_effect_open: {:?}, status_depth={}", cfg, status_depth);

    let result = cfg
        .to_common()
        .and_then(|common| effect.inner.open(&common, None, status_depth as usize));
    match result {
        Ok(rx) => {
            effect.status = Some(rx);
            STATUS_OK
        }
        Err(e) => {
            error!("aecsw_effect_open: {}", e);
            e.status_code()
        }
    }
}

/// Close the effect. Closing a closed effect is a no-op.
///
/// # Safety
/// `effect` must be a valid effect pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_close(effect: *mut AecswEffect) -> i32 {
    if effect.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let effect = unsafe { &mut *effect };
    let result = effect.inner.close();
    if result.is_ok() {
        effect.status = None;
    }
    status_of(&result)
}

/// Send a command: 0 = start, 1 = stop, 2 = reset.
///
/// # Safety
/// `effect` must be a valid effect pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_command(effect: *mut AecswEffect, command: u32) -> i32 {
    if effect.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let Some(command) = CommandId::from_raw(command) else {
        return STATUS_INVALID_ARGUMENT;
    };
    status_of(&unsafe { (*effect).inner.command(command) })
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════════════════════════════════════

fn specific_from_raw(tag: ParamTag, value: i32) -> EffectResult<Specific> {
    let specific = match AecTag::from_raw(tag) {
        Some(AecTag::EchoDelayUs) => AecParam::EchoDelayUs(value).into(),
        Some(AecTag::MobileMode) => match value {
            0 => AecParam::MobileMode(false).into(),
            1 => AecParam::MobileMode(true).into(),
            _ => return Err(EffectError::InvalidArgument("mobile mode must be 0 or 1")),
        },
        None => Specific::Vendor(VendorExtension {
            tag,
            value: value as i64,
        }),
    };
    Ok(specific)
}

fn specific_id_from_raw(tag: ParamTag) -> SpecificId {
    match AecTag::from_raw(tag) {
        Some(tag) => SpecificId::AcousticEchoCanceler(tag),
        None => SpecificId::Vendor(tag),
    }
}

// Vendor payloads are opaque and never leave the crate as a raw value.
fn specific_to_raw(id: SpecificId, specific: Specific) -> EffectResult<i32> {
    match (id, specific) {
        (SpecificId::AcousticEchoCanceler(tag), Specific::AcousticEchoCanceler(param))
            if param.tag() == tag =>
        {
            Ok(match param {
                AecParam::EchoDelayUs(v) => v,
                AecParam::MobileMode(m) => m as i32,
            })
        }
        _ => Err(EffectError::NotFound("no raw value for parameter tag")),
    }
}

/// Set an effect-specific parameter by raw tag. Unknown tags are rejected.
///
/// # Safety
/// `effect` must be a valid effect pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_set_param(
    effect: *mut AecswEffect,
    tag: u32,
    value: i32,
) -> i32 {
    debug!("aecsw_effect_set_param: tag={}, value={}", tag, value);
    if effect.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let effect = unsafe { &mut *effect };
    let result = specific_from_raw(tag, value)
        .and_then(|specific| effect.inner.engine_mut().set_parameter_specific(&specific));
    status_of(&result)
}

/// Read an effect-specific parameter by raw tag into `out_value`.
///
/// # Safety
/// `effect` must be a valid effect pointer and `out_value` writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_get_param(
    effect: *const AecswEffect,
    tag: u32,
    out_value: *mut i32,
) -> i32 {
    if effect.is_null() || out_value.is_null() {
        return STATUS_INVALID_ARGUMENT;
    }
    let effect = unsafe { &*effect };
    let id = specific_id_from_raw(tag);
    let result = effect
        .inner
        .engine()
        .get_parameter_specific(&id)
        .and_then(|specific| specific_to_raw(id, specific));
    match result {
        Ok(value) => {
            unsafe { *out_value = value };
            STATUS_OK
        }
        Err(e) => e.status_code(),
    }
}

/// Convenience wrapper for the echo delay tag.
///
/// # Safety
/// `effect` must be a valid effect pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_set_echo_delay(
    effect: *mut AecswEffect,
    delay_us: i32,
) -> i32 {
    unsafe { aecsw_effect_set_param(effect, crate::parameter::tags::ECHO_DELAY_US, delay_us) }
}

/// Convenience wrapper for the echo delay tag.
///
/// # Safety
/// `effect` must be a valid effect pointer and `out_delay_us` writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_get_echo_delay(
    effect: *const AecswEffect,
    out_delay_us: *mut i32,
) -> i32 {
    unsafe { aecsw_effect_get_param(effect, crate::parameter::tags::ECHO_DELAY_US, out_delay_us) }
}

// ═══════════════════════════════════════════════════════════════════════════
// Processing
// ═══════════════════════════════════════════════════════════════════════════

/// Process `samples` interleaved samples.
///
/// `input == output` processes in place; any other overlap is rejected.
/// Returns the number of samples produced, or a negative status. On error
/// `output` is not written.
///
/// # Safety
/// - `effect` must be a valid effect pointer
/// - `input` and `output` must each address at least `samples` floats
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_process(
    effect: *mut AecswEffect,
    input: *const f32,
    output: *mut f32,
    samples: i32,
) -> i32 {
    if effect.is_null() || input.is_null() || output.is_null() || samples <= 0 {
        return STATUS_INVALID_ARGUMENT;
    }
    let n = samples as usize;
    let in_start = input as usize;
    let out_start = output as usize;
    let bytes = n * std::mem::size_of::<f32>();
    let in_place = in_start == out_start;
    if !in_place && in_start < out_start + bytes && out_start < in_start + bytes {
        return STATUS_INVALID_ARGUMENT;
    }

    let effect = unsafe { &mut *effect };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        if in_place {
            let buffer = unsafe { std::slice::from_raw_parts_mut(output, n) };
            effect.inner.process_block_in_place(buffer, n)
        } else {
            let input = unsafe { std::slice::from_raw_parts(input, n) };
            let output = unsafe { std::slice::from_raw_parts_mut(output, n) };
            effect.inner.process_block(input, output, n)
        }
    }));

    match outcome {
        Ok(Ok(produced)) => produced as i32,
        Ok(Err(e)) => e.status_code(),
        Err(_) => {
            error!("aecsw_effect_process: panic caught");
            STATUS_INTERNAL
        }
    }
}

/// Pop the oldest processing report into `out_status`.
///
/// Returns `true` if a report was written.
///
/// # Safety
/// `effect` must be a valid effect pointer and `out_status` writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_poll_status(
    effect: *const AecswEffect,
    out_status: *mut AecswStatus,
) -> bool {
    if effect.is_null() || out_status.is_null() {
        return false;
    }
    let effect = unsafe { &*effect };
    let Some(status) = effect.status.as_ref().and_then(|rx| rx.try_recv()) else {
        return false;
    };
    unsafe {
        *out_status = AecswStatus {
            status: status.status,
            consumed: status.consumed as u32,
            produced: status.produced as u32,
        };
    }
    true
}

/// Number of reports dropped because the status queue was full.
///
/// Read it from the host thread and log it there; the audio path never logs drops.
///
/// # Safety
/// `effect` must be NULL or a valid effect pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aecsw_effect_dropped_reports(effect: *const AecswEffect) -> u64 {
    if effect.is_null() {
        return 0;
    }
    let effect = unsafe { &*effect };
    effect.status.as_ref().map_or(0, |rx| rx.dropped())
}
