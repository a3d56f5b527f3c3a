// src/main.rs
//
// Runs one acoustic echo canceller through its whole lifecycle and prints
// what the host would see.

use aecsw::{
    AecParam, AecTag, AudioConfig, ChannelLayout, CommandId, CommonConfig, EffectRegistry,
    Parameter, ParameterId, SpecificId, register_standard_effects,
};

const STATUS_DEPTH: usize = 8;
const BLOCK: usize = 480;

fn main() {
    let mut registry = EffectRegistry::new();
    register_standard_effects(&mut registry);

    for desc in registry.iter() {
        println!(
            "{} type={} impl={} strength_supported={}",
            desc.name(),
            desc.type_uuid(),
            desc.impl_uuid(),
            desc.capability.strength_supported
        );
    }

    let Some(desc) = registry.iter().next() else {
        println!("no effects registered");
        return;
    };

    let mut effect = match registry.create_effect(desc.impl_uuid()) {
        Ok(effect) => effect,
        Err(e) => {
            println!("create failed: {}", e);
            return;
        }
    };

    let common = CommonConfig::symmetric(AudioConfig::new(48_000, ChannelLayout::Mono, BLOCK));
    let status = match effect.open(&common, None, STATUS_DEPTH) {
        Ok(rx) => rx,
        Err(e) => {
            println!("open failed: {}", e);
            return;
        }
    };

    let delay = Parameter::Specific(AecParam::EchoDelayUs(20_000).into());
    println!("set echo delay: {:?}", effect.set_parameter(&delay));
    let bad = Parameter::Specific(AecParam::EchoDelayUs(-1).into());
    println!("set bad echo delay: {:?}", effect.set_parameter(&bad));

    let id = ParameterId::Specific(SpecificId::AcousticEchoCanceler(AecTag::EchoDelayUs));
    println!("get echo delay: {:?}", effect.get_parameter(&id));

    if let Err(e) = effect.command(CommandId::Start) {
        println!("start failed: {}", e);
        return;
    }

    let input: Vec<f32> = (0..BLOCK)
        .map(|i| (i as f32 * 0.05).sin() * 0.5)
        .collect();
    let mut output = vec![0.0; BLOCK];
    for _ in 0..4 {
        if let Err(e) = effect.process_block(&input, &mut output, BLOCK) {
            println!("process failed: {}", e);
        }
    }
    println!("process with zero samples: {:?}", effect.process_block(&input, &mut output, 0));

    for report in status.drain() {
        println!("status: {:?}", report);
    }
    println!("dropped reports: {}", status.dropped());

    println!("close: {:?}", effect.close());
    println!("context after close: {:?}", effect.engine().get_context());
}
