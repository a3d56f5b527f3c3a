// src/descriptor.rs
//
// Static identity and capability data for effect types.
//
// Every value here is built in a `static` and only ever read. Instances of the
// same effect type share one descriptor by reference.

use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════
// Flags
// ═══════════════════════════════════════════════════════════════════

/// Where the effect sits in the host's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Insert,
    Auxiliary,
    Replace,
    /// Runs on the capture path before the client sees the audio
    PreProc,
    PostProc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Any,
    First,
    Last,
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeControl {
    None,
    Ctrl,
    Ind,
    Monitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub kind: EffectKind,
    pub insert: InsertPosition,
    pub volume: VolumeControl,
}

// ═══════════════════════════════════════════════════════════════════
// Capability
// ═══════════════════════════════════════════════════════════════════

/// Inclusive range of legal values for an integer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRange {
    pub min: i32,
    pub max: i32,
}

impl ParamRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Whether `value` is legal. Out-of-range values are rejected, never clamped.
    #[inline]
    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// What the acoustic echo canceller accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AecCapability {
    /// Legal echo delay, in microseconds
    pub echo_delay_us: ParamRange,
    pub support_mobile_mode: bool,
}

/// Effect-type specific part of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificCapability {
    AcousticEchoCanceler(AecCapability),
    /// The effect type has no specific parameters.
    Generic,
}

/// Immutable description of what an effect type supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// Whether a "strength" control is exposed
    pub strength_supported: bool,
    pub specific: SpecificCapability,
}

// ═══════════════════════════════════════════════════════════════════
// Descriptor
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorId {
    /// Effect type (e.g. "acoustic echo canceller")
    pub type_uuid: Uuid,
    /// This implementation of the type
    pub uuid: Uuid,
    pub proxy: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorCommon {
    pub id: DescriptorId,
    pub flags: Flags,
    pub name: &'static str,
    pub implementor: &'static str,
}

/// Identity plus capability of one effect type, queryable without an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub common: DescriptorCommon,
    pub capability: Capability,
}

impl Descriptor {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.common.name
    }

    #[inline]
    pub fn type_uuid(&self) -> &Uuid {
        &self.common.id.type_uuid
    }

    #[inline]
    pub fn impl_uuid(&self) -> &Uuid {
        &self.common.id.uuid
    }
}
