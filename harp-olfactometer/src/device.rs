//! Cliente do Olfactometer sobre um [`Transport`]

use harp_core::prelude::*;
use harp_core::core_registers::DeviceName;
use harp_core::core_registers;

use crate::error::{OlfactometerError, OlfactometerResult};
use crate::odor_mix::ConfigureOdorMix;
use crate::registers::*;
use crate::types::*;

/// Identificador Harp do Olfactometer
pub const WHO_AM_I: u16 = 1140;

/// Olfactometer conectado
#[derive(Debug)]
pub struct Olfactometer<T: Transport> {
    device: Device<T>,
}

impl<T: Transport> Olfactometer<T> {
    /// Abre o dispositivo e confere o WhoAmI
    pub fn open(transport: T) -> OlfactometerResult<Self> {
        let mut device = Device::new(transport);
        let who_am_i = device.who_am_i()?;
        if who_am_i != WHO_AM_I {
            tracing::error!(who_am_i, "not an Olfactometer");
            return Err(OlfactometerError::UnexpectedDevice {
                expected: WHO_AM_I,
                actual: who_am_i,
            });
        }
        tracing::info!(who_am_i, "olfactometer opened");
        Ok(Self { device })
    }

    pub fn device(&mut self) -> &mut Device<T> {
        &mut self.device
    }

    pub fn into_inner(self) -> T {
        self.device.into_inner()
    }

    pub fn read<R: Register>(&mut self) -> OlfactometerResult<R::Payload> {
        Ok(self.device.read::<R>()?)
    }

    pub fn write<R: Register>(&mut self, value: &R::Payload) -> OlfactometerResult<()> {
        Ok(self.device.write::<R>(value)?)
    }

    pub fn device_name(&mut self) -> OlfactometerResult<String> {
        let raw = self.read::<DeviceName>()?;
        Ok(core_registers::device_name(&raw))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FLUXO
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn enable_flow(&mut self, enable: bool) -> OlfactometerResult<()> {
        self.write::<EnableFlow>(&EnableFlag::from(enable))
    }

    pub fn flow_enabled(&mut self) -> OlfactometerResult<bool> {
        Ok(self.read::<EnableFlow>()?.into())
    }

    /// Fluxo alvo de um canal (0..=4)
    ///
    /// Valores acima de [`Self::max_target_flow`] são saturados pelo firmware.
    pub fn set_target_flow(&mut self, channel: usize, flow: f32) -> OlfactometerResult<()> {
        match channel {
            0 => self.write::<Channel0TargetFlow>(&flow),
            1 => self.write::<Channel1TargetFlow>(&flow),
            2 => self.write::<Channel2TargetFlow>(&flow),
            3 => self.write::<Channel3TargetFlow>(&flow),
            4 => self.write::<Channel4TargetFlow>(&flow),
            other => Err(OlfactometerError::InvalidChannel(other)),
        }
    }

    /// Fluxo alvo máximo de um canal; no canal 3 segue a faixa lida de [`Channel3Range`]
    pub fn max_target_flow(&mut self, channel: usize) -> OlfactometerResult<f32> {
        match channel {
            0..=2 => Ok(MAX_ODOR_FLOW),
            3 => Ok(self.read::<Channel3Range>()?.max_target_flow()),
            4 => Ok(MAX_CARRIER_FLOW),
            other => Err(OlfactometerError::InvalidChannel(other)),
        }
    }

    /// Fluxo real de um canal (0..=4)
    pub fn actual_flow(&mut self, channel: usize) -> OlfactometerResult<f32> {
        match channel {
            0 => self.read::<Channel0ActualFlow>(),
            1 => self.read::<Channel1ActualFlow>(),
            2 => self.read::<Channel2ActualFlow>(),
            3 => self.read::<Channel3ActualFlow>(),
            4 => self.read::<Channel4ActualFlow>(),
            other => Err(OlfactometerError::InvalidChannel(other)),
        }
    }

    pub fn set_channels_target_flow(&mut self, flows: &ChannelsTargetFlowPayload) -> OlfactometerResult<()> {
        self.write::<ChannelsTargetFlow>(flows)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VÁLVULAS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn set_odor_valves(&mut self, valves: OdorValves) -> OlfactometerResult<()> {
        self.write::<OdorValveState>(&valves)
    }

    pub fn set_end_valves(&mut self, valves: EndValves) -> OlfactometerResult<()> {
        self.write::<EndValveState>(&valves)
    }

    pub fn valve_state(&mut self) -> OlfactometerResult<Valves> {
        self.read::<ValveState>()
    }

    pub fn set_events(&mut self, events: OlfactometerEvents) -> OlfactometerResult<()> {
        self.write::<EnableEvents>(&events)
    }

    /// Envia a mistura de odores (fluxos alvo e depois válvulas)
    pub fn configure_odor_mix(&mut self, mix: &ConfigureOdorMix) -> OlfactometerResult<()> {
        let _span =
            tracing::info_span!("configure_odor_mix", target_odor_flow = mix.target_odor_flow()).entered();
        let messages = mix.messages()?;
        self.device.send_all(&messages)?;
        Ok(())
    }

    /// Envia a concentração de um único canal
    pub fn configure_channel(
        &mut self,
        mix: &ConfigureOdorMix,
        index: usize,
        concentration: f64,
    ) -> OlfactometerResult<()> {
        let messages = mix.channel_messages(index, concentration)?;
        self.device.send_all(&messages)?;
        Ok(())
    }

    /// Eventos recebidos fora das respostas, já decodificados
    pub fn drain_events(&mut self) -> Vec<HarpResult<OlfactometerPayload>> {
        self.device
            .drain_events()
            .map(|msg| OlfactometerPayload::decode(&msg))
            .collect()
    }
}
