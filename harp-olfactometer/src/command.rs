//! Composição de escritas
//!
//! Acumula escritas tipadas numa sequência ordenada, validando cada valor
//! no momento em que é adicionado.

use harp_core::message::{HarpMessage, MessageType};
use harp_core::register::Register;
use harp_core::transport::{Device, Transport};

use crate::error::OlfactometerResult;
use crate::odor_mix::ConfigureOdorMix;

#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    messages: Vec<HarpMessage>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona uma escrita em `R`
    pub fn write<R: Register>(mut self, value: &R::Payload) -> OlfactometerResult<Self> {
        R::validate(value)?;
        self.messages.push(R::from_payload(MessageType::Write, value)?);
        Ok(self)
    }

    /// Adiciona as mensagens de uma mistura de odores
    pub fn odor_mix(mut self, mix: &ConfigureOdorMix) -> OlfactometerResult<Self> {
        self.messages.extend(mix.messages()?);
        Ok(self)
    }

    /// Adiciona uma mensagem já montada
    pub fn message(mut self, message: HarpMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[HarpMessage] {
        &self.messages
    }

    pub fn build(self) -> Vec<HarpMessage> {
        self.messages
    }

    /// Envia tudo ao dispositivo, em ordem, parando no primeiro erro
    pub fn send<T: Transport>(self, device: &mut Device<T>) -> OlfactometerResult<()> {
        tracing::debug!(count = self.messages.len(), "sending command batch");
        device.send_all(&self.messages)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{EnableFlow, EndValveState, OdorValveState, PulseValve0};
    use crate::types::{EnableFlag, EndValves, OdorValves};
    use harp_core::transport::LoopbackTransport;

    #[test]
    fn keeps_order() {
        let messages = CommandBuilder::new()
            .write::<EnableFlow>(&EnableFlag::Enable)
            .and_then(|b| b.write::<EndValveState>(&EndValves::END_VALVE0))
            .unwrap()
            .build();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].address(), 32);
        assert_eq!(messages[1].address(), 91);
    }

    #[test]
    fn rejects_invalid_value() {
        assert!(CommandBuilder::new().write::<PulseValve0>(&0).is_err());
    }

    #[test]
    fn sends_to_device() {
        let mut device = Device::new(LoopbackTransport::new());
        CommandBuilder::new()
            .write::<OdorValveState>(&OdorValves::VALVE1)
            .and_then(|b| b.odor_mix(&ConfigureOdorMix::new()))
            .unwrap()
            .send(&mut device)
            .unwrap();

        let transport = device.into_inner();
        assert_eq!(transport.sent().len(), 3);
        // a mistura vazia fecha as válvulas
        let valves = transport.register::<OdorValveState>().unwrap().unwrap();
        assert!(valves.is_empty());
    }
}
