// src/instance.rs
//
// Host-facing wrapper around one effect engine: open/close, commands,
// the full parameter union, and status reporting for each processed block.

use log::{debug, info, warn};

use crate::bridge::{ProcessStatus, StatusReceiver, StatusSender, create_status_channel};
use crate::config::CommonConfig;
use crate::context::EffectContext;
use crate::descriptor::Descriptor;
use crate::engine::EffectEngine;
use crate::error::{EffectError, EffectResult};
use crate::parameter::{Parameter, ParameterId, Specific};

/// Lifecycle state of an effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No context. Only `open` is legal.
    Init,
    /// Context exists, processing is stopped.
    Idle,
    /// Blocks may be processed.
    Processing,
}

/// Host commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Start,
    Stop,
    /// Clear buffers and DSP state, then stop.
    Reset,
}

impl CommandId {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(CommandId::Start),
            1 => Some(CommandId::Stop),
            2 => Some(CommandId::Reset),
            _ => None,
        }
    }
}

/// One effect instance as the host sees it.
pub struct EffectInstance {
    engine: Box<dyn EffectEngine>,
    state: State,
    status: Option<StatusSender>,
}

impl EffectInstance {
    pub fn new(engine: Box<dyn EffectEngine>) -> Self {
        Self {
            engine,
            state: State::Init,
            status: None,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &'static Descriptor {
        self.engine.descriptor()
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    pub fn engine(&self) -> &dyn EffectEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn EffectEngine {
        self.engine.as_mut()
    }

    /// Create the context and the status channel.
    ///
    /// An optional specific parameter is applied right away. If it is
    /// rejected the context is released again and the instance stays closed.
    pub fn open(
        &mut self,
        common: &CommonConfig,
        specific: Option<&Specific>,
        status_depth: usize,
    ) -> EffectResult<StatusReceiver> {
        if self.state != State::Init {
            warn!("{}: open while already open", self.engine.effect_name());
            return Err(EffectError::AlreadyExists("effect already open"));
        }

        self.engine.create_context(status_depth, common)?;
        if let Some(specific) = specific {
            if let Err(e) = self.engine.set_parameter_specific(specific) {
                self.engine.release_context()?;
                return Err(e);
            }
        }

        let (tx, rx) = create_status_channel(status_depth);
        self.status = Some(tx);
        self.state = State::Idle;
        info!("{}: opened", self.engine.effect_name());
        Ok(rx)
    }

    /// Stop processing and release the context. A no-op when already closed.
    pub fn close(&mut self) -> EffectResult<()> {
        if self.state == State::Init {
            debug!("{}: close while closed", self.engine.effect_name());
            return Ok(());
        }
        self.engine.release_context()?;
        self.status = None;
        self.state = State::Init;
        info!("{}: closed", self.engine.effect_name());
        Ok(())
    }

    pub fn command(&mut self, command: CommandId) -> EffectResult<()> {
        if self.state == State::Init {
            return Err(EffectError::IllegalState("command on a closed effect"));
        }
        match command {
            CommandId::Start => self.state = State::Processing,
            CommandId::Stop => self.state = State::Idle,
            CommandId::Reset => {
                self.engine.reset()?;
                self.state = State::Idle;
            }
        }
        debug!("{}: {:?} -> {:?}", self.engine.effect_name(), command, self.state);
        Ok(())
    }

    fn base_mut(&mut self) -> EffectResult<&mut EffectContext> {
        self.engine
            .base_context_mut()
            .ok_or(EffectError::IllegalState("no context"))
    }

    pub fn set_parameter(&mut self, parameter: &Parameter) -> EffectResult<()> {
        match parameter {
            Parameter::Common(common) => self.engine.set_common(common),
            Parameter::VolumeStereo { left, right } => {
                self.base_mut()?.set_volume_stereo(*left, *right)
            }
            Parameter::AudioMode(mode) => {
                self.base_mut()?.set_audio_mode(*mode);
                Ok(())
            }
            Parameter::AudioSource(source) => {
                self.base_mut()?.set_audio_source(*source);
                Ok(())
            }
            Parameter::Specific(specific) => self.engine.set_parameter_specific(specific),
        }
    }

    pub fn get_parameter(&self, id: &ParameterId) -> EffectResult<Parameter> {
        let base = || {
            self.engine
                .base_context()
                .ok_or(EffectError::NotFound("no context"))
        };
        let parameter = match id {
            ParameterId::Common => Parameter::Common(*base()?.common()),
            ParameterId::VolumeStereo => {
                let (left, right) = base()?.volume_stereo();
                Parameter::VolumeStereo { left, right }
            }
            ParameterId::AudioMode => Parameter::AudioMode(base()?.audio_mode()),
            ParameterId::AudioSource => Parameter::AudioSource(base()?.audio_source()),
            ParameterId::Specific(specific) => {
                Parameter::Specific(self.engine.get_parameter_specific(specific)?)
            }
        };
        Ok(parameter)
    }

    /// Process one block and report the outcome on the status channel.
    ///
    /// Only legal while started. Never blocks or logs: a full status queue
    /// drops the report and bumps the receiver's dropped count.
    pub fn process_block(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        samples: usize,
    ) -> EffectResult<usize> {
        let result = match self.state {
            State::Processing => self.engine.process(input, output, samples),
            _ => Err(EffectError::IllegalState("effect not started")),
        };
        self.report(&result);
        result
    }

    /// In-place variant of [`EffectInstance::process_block`].
    pub fn process_block_in_place(
        &mut self,
        buffer: &mut [f32],
        samples: usize,
    ) -> EffectResult<usize> {
        let result = match self.state {
            State::Processing => self.engine.process_in_place(buffer, samples),
            _ => Err(EffectError::IllegalState("effect not started")),
        };
        self.report(&result);
        result
    }

    #[inline]
    fn report(&self, result: &EffectResult<usize>) {
        let status = match result {
            Ok(samples) => ProcessStatus::ok(*samples),
            Err(e) => ProcessStatus::failed(e),
        };
        if let Some(tx) = &self.status {
            tx.try_report(status);
        }
    }
}

impl Drop for EffectInstance {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("close on drop failed: {}", e);
        }
    }
}
