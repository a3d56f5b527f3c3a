// src/parameter.rs
//
// Tagged parameter values exchanged between the host and an effect.

use crate::config::CommonConfig;

/// Raw parameter tag used across the C ABI.
pub type ParamTag = u32;

pub mod tags {
    use super::ParamTag;

    // Acoustic echo canceller
    pub const ECHO_DELAY_US: ParamTag = 0;
    pub const MOBILE_MODE: ParamTag = 1;
}

/// Host audio mode, forwarded to effects that care about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioMode {
    #[default]
    Normal,
    Ringtone,
    InCall,
    InCommunication,
}

/// Capture source the effect is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioSource {
    #[default]
    Default,
    Mic,
    VoiceCommunication,
    VoiceRecognition,
}

// ═══════════════════════════════════════════════════════════════════
// Effect specific parameters
// ═══════════════════════════════════════════════════════════════════

/// Acoustic echo canceller parameter tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AecTag {
    EchoDelayUs,
    MobileMode,
}

impl AecTag {
    pub fn from_raw(tag: ParamTag) -> Option<Self> {
        match tag {
            tags::ECHO_DELAY_US => Some(AecTag::EchoDelayUs),
            tags::MOBILE_MODE => Some(AecTag::MobileMode),
            _ => None,
        }
    }
}

/// Acoustic echo canceller parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AecParam {
    /// Estimated acoustic round-trip delay, in microseconds
    EchoDelayUs(i32),
    MobileMode(bool),
}

impl AecParam {
    pub fn tag(&self) -> AecTag {
        match self {
            AecParam::EchoDelayUs(_) => AecTag::EchoDelayUs,
            AecParam::MobileMode(_) => AecTag::MobileMode,
        }
    }
}

/// Opaque vendor extension payload. No software effect understands one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorExtension {
    pub tag: ParamTag,
    pub value: i64,
}

/// A specific (effect-type owned) parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specific {
    AcousticEchoCanceler(AecParam),
    Vendor(VendorExtension),
}

/// Identifies which specific parameter a read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificId {
    AcousticEchoCanceler(AecTag),
    Vendor(ParamTag),
}

// ═══════════════════════════════════════════════════════════════════
// Full parameter union
// ═══════════════════════════════════════════════════════════════════

/// Any parameter an effect instance accepts.
///
/// Everything except `Specific` is stored on the shared base context and
/// handled identically for every effect type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    Common(CommonConfig),
    VolumeStereo { left: f32, right: f32 },
    AudioMode(AudioMode),
    AudioSource(AudioSource),
    Specific(Specific),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterId {
    Common,
    VolumeStereo,
    AudioMode,
    AudioSource,
    Specific(SpecificId),
}

impl From<Specific> for Parameter {
    fn from(specific: Specific) -> Self {
        Parameter::Specific(specific)
    }
}

impl From<AecParam> for Specific {
    fn from(param: AecParam) -> Self {
        Specific::AcousticEchoCanceler(param)
    }
}

impl From<AecTag> for SpecificId {
    fn from(tag: AecTag) -> Self {
        SpecificId::AcousticEchoCanceler(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_tags_map_to_aec_tags() {
        assert_eq!(AecTag::from_raw(tags::ECHO_DELAY_US), Some(AecTag::EchoDelayUs));
        assert_eq!(AecTag::from_raw(tags::MOBILE_MODE), Some(AecTag::MobileMode));
        assert_eq!(AecTag::from_raw(99), None);
    }

    #[test]
    fn test_param_reports_its_tag() {
        assert_eq!(AecParam::EchoDelayUs(5).tag(), AecTag::EchoDelayUs);
        assert_eq!(AecParam::MobileMode(false).tag(), AecTag::MobileMode);
    }
}
