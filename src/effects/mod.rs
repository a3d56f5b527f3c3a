// src/effects/mod.rs
//
// Effect types shipped with the crate.

mod acoustic_echo_canceler;

pub use acoustic_echo_canceler::*;

use crate::factory::{EffectRegistry, SimpleEffectFactory};

/// Populate the registry with all standard effect types.
pub fn register_standard_effects(registry: &mut EffectRegistry) {
    registry.register(SimpleEffectFactory::new(&DESCRIPTOR, || {
        Box::new(AcousticEchoCancelerSw::new())
    }));
}
