// src/factory.rs

use log::{debug, warn};
use uuid::Uuid;

use crate::descriptor::Descriptor;
use crate::engine::EffectEngine;
use crate::error::{EffectError, EffectResult};
use crate::instance::EffectInstance;

/// A factory capable of creating fresh effect engines of one type.
pub trait EffectFactory: Send + Sync {
    /// Descriptor of the effect type this factory builds
    fn descriptor(&self) -> &'static Descriptor;

    /// Create one engine instance
    fn create(&self) -> Box<dyn EffectEngine>;
}

/// Convenience factory for engines built by a plain closure
pub struct SimpleEffectFactory<F>
where
    F: Fn() -> Box<dyn EffectEngine> + Send + Sync,
{
    descriptor: &'static Descriptor,
    create_fn: F,
}

impl<F> SimpleEffectFactory<F>
where
    F: Fn() -> Box<dyn EffectEngine> + Send + Sync,
{
    pub fn new(descriptor: &'static Descriptor, create_fn: F) -> Self {
        Self {
            descriptor,
            create_fn,
        }
    }
}

impl<F> EffectFactory for SimpleEffectFactory<F>
where
    F: Fn() -> Box<dyn EffectEngine> + Send + Sync,
{
    fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    fn create(&self) -> Box<dyn EffectEngine> {
        (self.create_fn)()
    }
}

/// Every effect type the host can instantiate, keyed by implementation UUID.
#[derive(Default)]
pub struct EffectRegistry {
    factories: Vec<Box<dyn EffectFactory>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory. A second factory for the same implementation UUID
    /// replaces the first.
    pub fn register(&mut self, factory: impl EffectFactory + 'static) {
        let uuid = *factory.descriptor().impl_uuid();
        if let Some(pos) = self
            .factories
            .iter()
            .position(|f| f.descriptor().impl_uuid() == &uuid)
        {
            warn!("EffectRegistry: replacing factory for {}", uuid);
            self.factories.remove(pos);
        }
        debug!("EffectRegistry: registered {} ({})", factory.descriptor().name(), uuid);
        self.factories.push(Box::new(factory));
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Descriptor> + '_ {
        self.factories.iter().map(|f| f.descriptor())
    }

    /// Descriptors matching the given type and implementation UUIDs.
    /// `None` matches anything.
    pub fn query_effects(
        &self,
        type_uuid: Option<&Uuid>,
        impl_uuid: Option<&Uuid>,
    ) -> Vec<&'static Descriptor> {
        self.iter()
            .filter(|d| type_uuid.is_none_or(|t| d.type_uuid() == t))
            .filter(|d| impl_uuid.is_none_or(|u| d.impl_uuid() == u))
            .collect()
    }

    /// Create a closed instance of the implementation `impl_uuid`.
    pub fn create_effect(&self, impl_uuid: &Uuid) -> EffectResult<EffectInstance> {
        let factory = self
            .factories
            .iter()
            .find(|f| f.descriptor().impl_uuid() == impl_uuid)
            .ok_or(EffectError::NotFound("unknown effect implementation"))?;
        Ok(EffectInstance::new(factory.create()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommonConfig;
    use crate::context::{ContextHandle, ContextSlot, EffectContext};
    use crate::descriptor::{
        Capability, DescriptorCommon, DescriptorId, EffectKind, Flags, InsertPosition,
        SpecificCapability, VolumeControl,
    };
    use crate::effects::{self, register_standard_effects};
    use crate::engine::check_process_args;
    use crate::instance::State;
    use crate::parameter::{Specific, SpecificId};

    const TEST_TYPE: Uuid = Uuid::from_u128(1);
    const TEST_IMPL: Uuid = Uuid::from_u128(2);

    static TEST_DESCRIPTOR: Descriptor = Descriptor {
        common: DescriptorCommon {
            id: DescriptorId {
                type_uuid: TEST_TYPE,
                uuid: TEST_IMPL,
                proxy: None,
            },
            flags: Flags {
                kind: EffectKind::Insert,
                insert: InsertPosition::Any,
                volume: VolumeControl::None,
            },
            name: "Silence",
            implementor: "test",
        },
        capability: Capability {
            strength_supported: true,
            specific: SpecificCapability::Generic,
        },
    };

    // Effect with no specific parameters that outputs silence
    #[derive(Default)]
    struct SilenceEffect {
        context: ContextSlot<EffectContext>,
    }

    impl EffectEngine for SilenceEffect {
        fn descriptor(&self) -> &'static Descriptor {
            &TEST_DESCRIPTOR
        }

        fn create_context(
            &mut self,
            status_depth: usize,
            common: &CommonConfig,
        ) -> EffectResult<ContextHandle> {
            self.context.insert(EffectContext::new(status_depth, *common)?)
        }

        fn get_context(&self) -> Option<ContextHandle> {
            self.context.handle()
        }

        fn release_context(&mut self) -> EffectResult<()> {
            self.context.release();
            Ok(())
        }

        fn base_context(&self) -> Option<&EffectContext> {
            self.context.active()
        }

        fn base_context_mut(&mut self) -> Option<&mut EffectContext> {
            self.context.active_mut()
        }

        fn set_parameter_specific(&mut self, _: &Specific) -> EffectResult<()> {
            Err(EffectError::InvalidArgument("no specific parameters"))
        }

        fn get_parameter_specific(&self, _: &SpecificId) -> EffectResult<Specific> {
            Err(EffectError::NotFound("no specific parameters"))
        }

        fn process(
            &mut self,
            input: &[f32],
            output: &mut [f32],
            samples: usize,
        ) -> EffectResult<usize> {
            check_process_args(self.base_context(), input.len(), output.len(), samples)?;
            output[..samples].fill(0.0);
            Ok(samples)
        }

        fn process_in_place(&mut self, buffer: &mut [f32], samples: usize) -> EffectResult<usize> {
            check_process_args(self.base_context(), buffer.len(), buffer.len(), samples)?;
            buffer[..samples].fill(0.0);
            Ok(samples)
        }

        fn reset(&mut self) -> EffectResult<()> {
            Ok(())
        }
    }

    fn registry() -> EffectRegistry {
        let mut registry = EffectRegistry::new();
        register_standard_effects(&mut registry);
        registry.register(SimpleEffectFactory::new(&TEST_DESCRIPTOR, || {
            Box::new(SilenceEffect::default())
        }));
        registry
    }

    #[test]
    fn test_query_by_type_and_impl() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.query_effects(None, None).len(), 2);

        let aec = registry.query_effects(Some(&effects::TYPE_UUID), None);
        assert_eq!(aec.len(), 1);
        assert_eq!(aec[0].name(), effects::EFFECT_NAME);

        let silence = registry.query_effects(None, Some(&TEST_IMPL));
        assert_eq!(silence.len(), 1);
        assert_eq!(silence[0].name(), "Silence");

        assert!(registry.query_effects(Some(&TEST_TYPE), Some(&effects::IMPL_UUID)).is_empty());
    }

    #[test]
    fn test_create_effect() {
        let registry = registry();
        let effect = registry.create_effect(&effects::IMPL_UUID).unwrap();
        assert_eq!(effect.state(), State::Init);
        assert_eq!(effect.descriptor().name(), effects::EFFECT_NAME);

        assert!(matches!(
            registry.create_effect(&Uuid::from_u128(99)),
            Err(EffectError::NotFound(_))
        ));
    }

    #[test]
    fn test_register_replaces_same_impl() {
        let mut registry = registry();
        registry.register(SimpleEffectFactory::new(&TEST_DESCRIPTOR, || {
            Box::new(SilenceEffect::default())
        }));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_family_member_shares_lifecycle() {
        let registry = registry();
        let mut effect = registry.create_effect(&TEST_IMPL).unwrap();
        effect.open(&CommonConfig::default(), None, 1).unwrap();
        effect.command(crate::instance::CommandId::Start).unwrap();

        let input = [1.0_f32; 4];
        let mut output = [1.0_f32; 4];
        assert_eq!(effect.process_block(&input, &mut output, 4), Ok(4));
        assert_eq!(output, [0.0; 4]);
        assert!(effect.descriptor().capability.strength_supported);
    }
}
