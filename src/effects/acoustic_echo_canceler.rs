// Software acoustic echo canceller.
//
// Carries the echo delay and the buffer transform entry point. The actual
// cancellation runs behind `EchoAlgorithm`; the default one passes the
// capture signal through unchanged.

use log::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::CommonConfig;
use crate::context::{ContextHandle, ContextSlot, EffectContext};
use crate::descriptor::{
    AecCapability, Capability, Descriptor, DescriptorCommon, DescriptorId, EffectKind,
    Flags, InsertPosition, ParamRange, SpecificCapability, VolumeControl,
};
use crate::engine::{EffectEngine, check_process_args};
use crate::error::{EffectError, EffectResult};
use crate::parameter::{AecParam, AecTag, Specific, SpecificId};

// ═══════════════════════════════════════════════════════════════════
// Static tables
// ═══════════════════════════════════════════════════════════════════

pub const EFFECT_NAME: &str = "AcousticEchoCancelerSw";
pub const STRENGTH_SUPPORTED: bool = false;

/// Upper bound on the echo delay: 500 ms.
pub const MAX_ECHO_DELAY_US: i32 = 500_000;

pub const TYPE_UUID: Uuid = Uuid::from_u128(0x7b491460_8d4d_11e0_bd61_0002a5d5c51b);
pub const IMPL_UUID: Uuid = Uuid::from_u128(0xbb392ec0_8d4d_11e0_a896_0002a5d5c51b);

pub const AEC_CAPABILITY: AecCapability = AecCapability {
    echo_delay_us: ParamRange::new(0, MAX_ECHO_DELAY_US),
    support_mobile_mode: false,
};

pub const CAPABILITY: Capability = Capability {
    strength_supported: STRENGTH_SUPPORTED,
    specific: SpecificCapability::AcousticEchoCanceler(AEC_CAPABILITY),
};

pub static DESCRIPTOR: Descriptor = Descriptor {
    common: DescriptorCommon {
        id: DescriptorId {
            type_uuid: TYPE_UUID,
            uuid: IMPL_UUID,
            proxy: None,
        },
        flags: Flags {
            kind: EffectKind::PreProc,
            insert: InsertPosition::First,
            volume: VolumeControl::None,
        },
        name: EFFECT_NAME,
        implementor: "aecsw",
    },
    capability: CAPABILITY,
};

// ═══════════════════════════════════════════════════════════════════
// Algorithm seam
// ═══════════════════════════════════════════════════════════════════

/// The signal processing behind the canceller.
///
/// Implementations must not allocate or block in `process`.
/// `input` and `output` always have the same length.
pub trait EchoAlgorithm: Send {
    /// Called when the context is created or its common config changes.
    fn prepare(&mut self, _common: &CommonConfig) {}

    fn set_echo_delay(&mut self, _delay_us: i32) {}

    fn process(&mut self, input: &[f32], output: &mut [f32]);

    fn reset(&mut self) {}
}

/// Copies capture audio straight through.
#[derive(Debug, Default)]
pub struct Passthrough;

impl EchoAlgorithm for Passthrough {
    #[inline]
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        output.copy_from_slice(input);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Context
// ═══════════════════════════════════════════════════════════════════

pub struct AecContext<A> {
    base: EffectContext,
    echo_delay_us: i32,
    mobile_mode: bool,
    algorithm: A,
}

impl<A: EchoAlgorithm> AecContext<A> {
    pub fn new(status_depth: usize, common: &CommonConfig, mut algorithm: A) -> EffectResult<Self> {
        let base = EffectContext::new(status_depth, *common)?;
        algorithm.prepare(common);
        algorithm.set_echo_delay(0);
        Ok(Self {
            base,
            echo_delay_us: 0,
            mobile_mode: false,
            algorithm,
        })
    }

    #[inline]
    pub fn base(&self) -> &EffectContext {
        &self.base
    }

    pub fn set_echo_delay(&mut self, delay_us: i32) -> EffectResult<()> {
        if !AEC_CAPABILITY.echo_delay_us.contains(delay_us) {
            warn!("set_echo_delay: {} us out of range", delay_us);
            return Err(EffectError::InvalidArgument("echo delay out of range"));
        }
        self.echo_delay_us = delay_us;
        self.algorithm.set_echo_delay(delay_us);
        Ok(())
    }

    #[inline]
    pub fn echo_delay(&self) -> i32 {
        self.echo_delay_us
    }

    pub fn set_mobile_mode(&mut self, mobile_mode: bool) -> EffectResult<()> {
        if mobile_mode && !AEC_CAPABILITY.support_mobile_mode {
            warn!("set_mobile_mode: mobile mode not supported");
            return Err(EffectError::InvalidArgument("mobile mode not supported"));
        }
        self.mobile_mode = mobile_mode;
        Ok(())
    }

    #[inline]
    pub fn mobile_mode(&self) -> bool {
        self.mobile_mode
    }
}

// ═══════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════

pub struct AcousticEchoCancelerSw<A = Passthrough> {
    context: ContextSlot<AecContext<A>>,
}

impl AcousticEchoCancelerSw {
    pub fn new() -> Self {
        Self::with_algorithm()
    }
}

impl Default for AcousticEchoCancelerSw {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: EchoAlgorithm + Default> AcousticEchoCancelerSw<A> {
    /// Canceller running `A` instead of the passthrough algorithm.
    pub fn with_algorithm() -> Self {
        debug!("AcousticEchoCancelerSw::new");
        Self {
            context: ContextSlot::new(),
        }
    }

    /// Typed view of a context. Fails for a stale handle.
    pub fn context(&self, handle: ContextHandle) -> EffectResult<&AecContext<A>> {
        self.context.get(handle)
    }

    fn active_mut(&mut self) -> EffectResult<&mut AecContext<A>> {
        self.context
            .active_mut()
            .ok_or(EffectError::IllegalState("no context"))
    }
}

impl<A: EchoAlgorithm + Default> EffectEngine for AcousticEchoCancelerSw<A> {
    fn descriptor(&self) -> &'static Descriptor {
        &DESCRIPTOR
    }

    fn create_context(
        &mut self,
        status_depth: usize,
        common: &CommonConfig,
    ) -> EffectResult<ContextHandle> {
        if self.context.active().is_some() {
            warn!("create_context: context already created");
            return Err(EffectError::AlreadyExists("context already created"));
        }
        let context = AecContext::new(status_depth, common, A::default())?;
        let handle = self.context.insert(context)?;
        info!("{}: context created (status depth {})", EFFECT_NAME, status_depth);
        Ok(handle)
    }

    fn get_context(&self) -> Option<ContextHandle> {
        self.context.handle()
    }

    fn release_context(&mut self) -> EffectResult<()> {
        if self.context.release().is_some() {
            info!("{}: context released", EFFECT_NAME);
        } else {
            debug!("{}: release_context with no context", EFFECT_NAME);
        }
        Ok(())
    }

    fn base_context(&self) -> Option<&EffectContext> {
        self.context.active().map(|ctx| &ctx.base)
    }

    fn base_context_mut(&mut self) -> Option<&mut EffectContext> {
        self.context.active_mut().map(|ctx| &mut ctx.base)
    }

    fn set_common(&mut self, common: &CommonConfig) -> EffectResult<()> {
        let ctx = self.active_mut()?;
        ctx.base.set_common(*common)?;
        ctx.algorithm.prepare(common);
        Ok(())
    }

    fn set_parameter_specific(&mut self, specific: &Specific) -> EffectResult<()> {
        let Specific::AcousticEchoCanceler(param) = specific else {
            warn!("set_parameter_specific: {:?} not supported", specific);
            return Err(EffectError::InvalidArgument("unsupported parameter tag"));
        };
        let ctx = self.active_mut()?;
        match *param {
            AecParam::EchoDelayUs(delay_us) => ctx.set_echo_delay(delay_us),
            AecParam::MobileMode(mobile_mode) => ctx.set_mobile_mode(mobile_mode),
        }
    }

    fn get_parameter_specific(&self, id: &SpecificId) -> EffectResult<Specific> {
        let SpecificId::AcousticEchoCanceler(tag) = id else {
            warn!("get_parameter_specific: {:?} not supported", id);
            return Err(EffectError::NotFound("unsupported parameter tag"));
        };
        let ctx = self
            .context
            .active()
            .ok_or(EffectError::NotFound("no context"))?;
        let param = match tag {
            AecTag::EchoDelayUs => AecParam::EchoDelayUs(ctx.echo_delay()),
            AecTag::MobileMode => AecParam::MobileMode(ctx.mobile_mode()),
        };
        Ok(Specific::AcousticEchoCanceler(param))
    }

    fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        samples: usize,
    ) -> EffectResult<usize> {
        check_process_args(self.base_context(), input.len(), output.len(), samples)?;
        let ctx = self.active_mut()?;
        ctx.algorithm.process(&input[..samples], &mut output[..samples]);
        trace!("{}: processed {} samples", EFFECT_NAME, samples);
        Ok(samples)
    }

    fn process_in_place(&mut self, buffer: &mut [f32], samples: usize) -> EffectResult<usize> {
        check_process_args(self.base_context(), buffer.len(), buffer.len(), samples)?;
        let ctx = self.active_mut()?;

        // The algorithm reads from the work buffer so it never sees aliased slices.
        let work = &mut ctx.base.work_buffer_mut()[..samples];
        work.copy_from_slice(&buffer[..samples]);
        ctx.algorithm.process(work, &mut buffer[..samples]);
        Ok(samples)
    }

    fn reset(&mut self) -> EffectResult<()> {
        let ctx = self.active_mut()?;
        ctx.base.reset_buffer();
        ctx.algorithm.reset();
        Ok(())
    }
}

impl<A> Drop for AcousticEchoCancelerSw<A> {
    fn drop(&mut self) {
        self.context.release();
        debug!("AcousticEchoCancelerSw dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioConfig, ChannelLayout};

    fn mono_48k(frames: usize) -> CommonConfig {
        CommonConfig::symmetric(AudioConfig::new(48_000, ChannelLayout::Mono, frames))
    }

    fn echo_delay(aec: &AcousticEchoCancelerSw) -> EffectResult<Specific> {
        aec.get_parameter_specific(&AecTag::EchoDelayUs.into())
    }

    /// Records what the engine forwards to the algorithm.
    #[derive(Default)]
    struct Recorder {
        sample_rate: u32,
        delay_us: i32,
        calls: usize,
        last_len: usize,
        resets: usize,
    }

    impl EchoAlgorithm for Recorder {
        fn prepare(&mut self, common: &CommonConfig) {
            self.sample_rate = common.input.sample_rate;
        }

        fn set_echo_delay(&mut self, delay_us: i32) {
            self.delay_us = delay_us;
        }

        fn process(&mut self, input: &[f32], output: &mut [f32]) {
            self.calls += 1;
            self.last_len = input.len();
            for (o, i) in output.iter_mut().zip(input) {
                *o = -*i;
            }
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn test_descriptor_identity() {
        let aec = AcousticEchoCancelerSw::new();
        let desc = aec.descriptor();
        assert_eq!(desc.name(), "AcousticEchoCancelerSw");
        assert_eq!(aec.effect_name(), EFFECT_NAME);
        assert!(!desc.capability.strength_supported);
        assert_eq!(desc.type_uuid().to_string(), "7b491460-8d4d-11e0-bd61-0002a5d5c51b");
        assert_eq!(desc.impl_uuid().to_string(), "bb392ec0-8d4d-11e0-a896-0002a5d5c51b");
        assert_eq!(desc.common.flags.kind, EffectKind::PreProc);
    }

    #[test]
    fn test_descriptor_uuids_parse_back() {
        for uuid in [TYPE_UUID, IMPL_UUID] {
            assert_eq!(Uuid::parse_str(&uuid.to_string()).ok(), Some(uuid));
        }
        assert!(Uuid::parse_str("7b491460-8d4d-11e0-bd61").is_err());
    }

    #[test]
    fn test_echo_delay_round_trip() {
        let mut aec = AcousticEchoCancelerSw::new();
        aec.create_context(8, &mono_48k(480)).unwrap();

        for v in [0, 1, 20_000, 250_000, MAX_ECHO_DELAY_US] {
            aec.set_parameter_specific(&AecParam::EchoDelayUs(v).into()).unwrap();
            assert_eq!(
                echo_delay(&aec),
                Ok(Specific::AcousticEchoCanceler(AecParam::EchoDelayUs(v)))
            );
        }
    }

    #[test]
    fn test_out_of_range_delay_leaves_value() {
        let mut aec = AcousticEchoCancelerSw::new();
        aec.create_context(8, &mono_48k(480)).unwrap();
        aec.set_parameter_specific(&AecParam::EchoDelayUs(1234).into()).unwrap();

        for bad in [-1, i32::MIN, MAX_ECHO_DELAY_US + 1, i32::MAX] {
            let result = aec.set_parameter_specific(&AecParam::EchoDelayUs(bad).into());
            assert!(matches!(result, Err(EffectError::InvalidArgument(_))));
            assert_eq!(
                echo_delay(&aec),
                Ok(Specific::AcousticEchoCanceler(AecParam::EchoDelayUs(1234)))
            );
        }
    }

    #[test]
    fn test_mobile_mode_only_false_is_accepted() {
        let mut aec = AcousticEchoCancelerSw::new();
        aec.create_context(1, &mono_48k(480)).unwrap();
        assert!(aec.set_parameter_specific(&AecParam::MobileMode(false).into()).is_ok());
        assert!(matches!(
            aec.set_parameter_specific(&AecParam::MobileMode(true).into()),
            Err(EffectError::InvalidArgument(_))
        ));
        assert_eq!(
            aec.get_parameter_specific(&AecTag::MobileMode.into()),
            Ok(Specific::AcousticEchoCanceler(AecParam::MobileMode(false)))
        );
    }

    #[test]
    fn test_vendor_tags_rejected() {
        use crate::parameter::VendorExtension;

        let mut aec = AcousticEchoCancelerSw::new();
        aec.create_context(1, &mono_48k(480)).unwrap();
        let vendor = Specific::Vendor(VendorExtension { tag: 7, value: 1 });
        assert!(matches!(
            aec.set_parameter_specific(&vendor),
            Err(EffectError::InvalidArgument(_))
        ));
        assert!(matches!(
            aec.get_parameter_specific(&SpecificId::Vendor(7)),
            Err(EffectError::NotFound(_))
        ));
    }

    #[test]
    fn test_parameters_need_context() {
        let mut aec = AcousticEchoCancelerSw::new();
        assert!(matches!(
            aec.set_parameter_specific(&AecParam::EchoDelayUs(10).into()),
            Err(EffectError::IllegalState(_))
        ));
        assert!(matches!(echo_delay(&aec), Err(EffectError::NotFound(_))));
    }

    #[test]
    fn test_create_twice_keeps_first_context() {
        let mut aec = AcousticEchoCancelerSw::new();
        let first = aec.create_context(8, &mono_48k(480)).unwrap();
        aec.set_parameter_specific(&AecParam::EchoDelayUs(777).into()).unwrap();

        let second = aec.create_context(2, &mono_48k(64));
        assert!(matches!(second, Err(EffectError::AlreadyExists(_))));
        assert_eq!(aec.get_context(), Some(first));

        let ctx = aec.context(first).unwrap();
        assert_eq!(ctx.echo_delay(), 777);
        assert_eq!(ctx.base().status_depth(), 8);
        assert_eq!(ctx.base().max_block_samples(), 480);
    }

    #[test]
    fn test_release_without_context_is_noop() {
        let mut aec = AcousticEchoCancelerSw::new();
        assert_eq!(aec.release_context(), Ok(()));
        assert!(aec.create_context(1, &mono_48k(480)).is_ok());
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut aec = AcousticEchoCancelerSw::new();
        let handle = aec.create_context(1, &mono_48k(480)).unwrap();
        aec.release_context().unwrap();
        assert!(matches!(aec.context(handle), Err(EffectError::IllegalState(_))));
        assert_eq!(aec.get_context(), None);
    }

    #[test]
    fn test_process_zero_samples_leaves_output() {
        let mut aec = AcousticEchoCancelerSw::new();
        aec.create_context(1, &mono_48k(480)).unwrap();
        let input = [1.0_f32; 16];
        let mut output = [7.0_f32; 16];
        assert!(matches!(
            aec.process(&input, &mut output, 0),
            Err(EffectError::InvalidArgument(_))
        ));
        assert!(output.iter().all(|&s| s == 7.0));
    }

    #[test]
    fn test_process_without_context_fails() {
        let mut aec = AcousticEchoCancelerSw::new();
        let input = [1.0_f32; 4];
        let mut output = [0.0_f32; 4];
        assert!(matches!(
            aec.process(&input, &mut output, 4),
            Err(EffectError::IllegalState(_))
        ));
    }

    #[test]
    fn test_process_touches_exactly_n_samples() {
        const N: usize = 100;
        const FENCE: f32 = -99.0;

        let mut aec = AcousticEchoCancelerSw::new();
        aec.create_context(1, &mono_48k(480)).unwrap();

        // Sentinel values past N in both buffers.
        let mut input = vec![FENCE; N + 8];
        for (i, s) in input[..N].iter_mut().enumerate() {
            *s = i as f32;
        }
        let mut output = vec![FENCE; N + 8];

        assert_eq!(aec.process(&input, &mut output, N), Ok(N));
        assert_eq!(&output[..N], &input[..N]);
        assert!(output[N..].iter().all(|&s| s == FENCE));
        assert!(input[N..].iter().all(|&s| s == FENCE));
    }

    #[test]
    fn test_process_rejects_short_buffers_untouched() {
        let mut aec = AcousticEchoCancelerSw::new();
        aec.create_context(1, &mono_48k(480)).unwrap();
        let input = [1.0_f32; 8];
        let mut output = [3.0_f32; 4];
        assert!(aec.process(&input, &mut output, 8).is_err());
        assert!(output.iter().all(|&s| s == 3.0));
        // More than one block
        let big = vec![0.0_f32; 481];
        let mut out = vec![0.0_f32; 481];
        assert!(aec.process(&big, &mut out, 481).is_err());
    }

    #[test]
    fn test_context_survives_processing_error() {
        let mut aec = AcousticEchoCancelerSw::new();
        aec.create_context(1, &mono_48k(480)).unwrap();
        let input = [0.5_f32; 4];
        let mut output = [0.0_f32; 4];
        assert!(aec.process(&input, &mut output, 0).is_err());
        assert_eq!(aec.process(&input, &mut output, 4), Ok(4));
        assert_eq!(output, [0.5; 4]);
    }

    #[test]
    fn test_algorithm_receives_delay_and_exact_slices() {
        let mut aec = AcousticEchoCancelerSw::<Recorder>::with_algorithm();
        let handle = aec.create_context(1, &mono_48k(64)).unwrap();
        aec.set_parameter_specific(&AecParam::EchoDelayUs(20_000).into()).unwrap();

        let input = [0.25_f32; 64];
        let mut output = [0.0_f32; 64];
        assert_eq!(aec.process(&input, &mut output, 10), Ok(10));

        let ctx = aec.context(handle).unwrap();
        assert_eq!(ctx.algorithm.delay_us, 20_000);
        assert_eq!(ctx.algorithm.calls, 1);
        assert_eq!(ctx.algorithm.last_len, 10);
        assert_eq!(&output[..10], &[-0.25; 10]);
        assert_eq!(&output[10..], &[0.0; 54]);
    }

    #[test]
    fn test_process_in_place_uses_work_buffer() {
        let mut aec = AcousticEchoCancelerSw::<Recorder>::with_algorithm();
        aec.create_context(1, &mono_48k(64)).unwrap();

        let mut buffer = [1.0_f32, 2.0, 3.0, 4.0, 9.0];
        assert_eq!(aec.process_in_place(&mut buffer, 4), Ok(4));
        assert_eq!(buffer, [-1.0, -2.0, -3.0, -4.0, 9.0]);
    }

    #[test]
    fn test_set_common_prepares_algorithm() {
        let mut aec = AcousticEchoCancelerSw::<Recorder>::with_algorithm();
        let handle = aec.create_context(1, &mono_48k(64)).unwrap();
        assert_eq!(aec.context(handle).unwrap().algorithm.sample_rate, 48_000);

        let cfg = CommonConfig::symmetric(AudioConfig::new(16_000, ChannelLayout::Stereo, 160));
        aec.set_common(&cfg).unwrap();
        let ctx = aec.context(handle).unwrap();
        assert_eq!(ctx.algorithm.sample_rate, 16_000);
        assert_eq!(ctx.base().max_block_samples(), 320);
    }

    #[test]
    fn test_reset_reaches_algorithm() {
        let mut aec = AcousticEchoCancelerSw::<Recorder>::with_algorithm();
        assert!(matches!(aec.reset(), Err(EffectError::IllegalState(_))));
        let handle = aec.create_context(1, &mono_48k(64)).unwrap();
        aec.reset().unwrap();
        assert_eq!(aec.context(handle).unwrap().algorithm.resets, 1);
    }
}
