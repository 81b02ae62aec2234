//! Transporte de mensagens e cliente de dispositivo
//!
//! O transporte serial real vive fora deste crate; aqui ficam o trait,
//! o cliente síncrono request/reply e um banco de registradores em memória.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core_registers::WhoAmI;
use crate::error::{HarpError, HarpResult};
use crate::message::{HarpMessage, MessageType, PayloadType, Timestamp};
use crate::register::{Register, RegisterPayload, Timestamped};

/// Número máximo de mensagens não relacionadas aceitas enquanto se espera uma resposta
pub const DEFAULT_MAX_PENDING: usize = 64;

/// Trait de transporte (síncrono)
pub trait Transport {
    /// Envia mensagem ao dispositivo
    fn send(&mut self, message: &HarpMessage) -> HarpResult<()>;

    /// Próxima mensagem recebida (`None` quando não há mais nada)
    fn recv(&mut self) -> HarpResult<Option<HarpMessage>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLIENTE
// ═══════════════════════════════════════════════════════════════════════════════

/// Cliente request/reply de um dispositivo Harp
#[derive(Debug)]
pub struct Device<T: Transport> {
    transport: T,
    events: VecDeque<HarpMessage>,
    max_pending: usize,
}

impl<T: Transport> Device<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            events: VecDeque::new(),
            max_pending: DEFAULT_MAX_PENDING,
        }
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Envia um comando e espera a resposta correspondente
    ///
    /// Mensagens de outros registradores recebidas no caminho ficam
    /// guardadas e podem ser lidas com [`Device::drain_events`].
    pub fn command(&mut self, request: &HarpMessage) -> HarpResult<HarpMessage> {
        tracing::debug!(%request, "harp command");
        self.transport.send(request)?;

        for _ in 0..=self.max_pending {
            let Some(reply) = self.transport.recv()? else {
                break;
            };

            if reply.address() == request.address()
                && reply.message_type() == request.message_type()
            {
                if reply.is_error() {
                    tracing::warn!(address = reply.address(), "device rejected command");
                    return Err(HarpError::DeviceError {
                        address: reply.address(),
                        message_type: reply.message_type().to_string(),
                    });
                }
                tracing::trace!(%reply, "harp reply");
                return Ok(reply);
            }

            self.events.push_back(reply);
        }

        Err(HarpError::NoReply(request.address()))
    }

    /// Lê um registrador
    pub fn read<R: Register>(&mut self) -> HarpResult<R::Payload> {
        let reply = self.command(&R::read_command())?;
        R::get_payload(&reply)
    }

    /// Lê um registrador com o timestamp da resposta
    pub fn read_timestamped<R: Register>(&mut self) -> HarpResult<Timestamped<R::Payload>> {
        let reply = self.command(&R::read_command())?;
        R::get_timestamped_payload(&reply)
    }

    /// Escreve um registrador após validar o valor
    pub fn write<R: Register>(&mut self, value: &R::Payload) -> HarpResult<()> {
        R::validate(value)?;
        let request = R::from_payload(MessageType::Write, value)?;
        self.command(&request)?;
        Ok(())
    }

    /// Envia uma sequência de escritas já montadas, em ordem
    pub fn send_all<'a>(&mut self, messages: impl IntoIterator<Item = &'a HarpMessage>) -> HarpResult<()> {
        for msg in messages {
            self.command(msg)?;
        }
        Ok(())
    }

    /// Identificador do dispositivo
    pub fn who_am_i(&mut self) -> HarpResult<u16> {
        self.read::<WhoAmI>()
    }

    /// Eventos recebidos fora de uma resposta
    pub fn drain_events(&mut self) -> impl Iterator<Item = HarpMessage> + '_ {
        self.events.drain(..)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOOPBACK
// ═══════════════════════════════════════════════════════════════════════════════

/// Banco de registradores em memória que responde como um dispositivo
///
/// Escritas guardam o payload e ecoam uma resposta com timestamp; leituras
/// devolvem o valor guardado ou uma resposta de erro.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    registers: HashMap<u8, (PayloadType, Vec<u8>)>,
    rejected: HashSet<u8>,
    outbox: VecDeque<HarpMessage>,
    sent: Vec<HarpMessage>,
    clock_ticks: u64,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define o valor inicial de um registrador
    pub fn with_register<R: Register>(mut self, value: &R::Payload) -> Self {
        self.registers.insert(
            R::ADDRESS,
            (<R::Payload as RegisterPayload>::PAYLOAD_TYPE, value.encode()),
        );
        self
    }

    /// Escritas nesse endereço passam a responder com erro
    pub fn reject_writes(mut self, address: u8) -> Self {
        self.rejected.insert(address);
        self
    }

    /// Injeta um evento espontâneo
    pub fn push_event(&mut self, event: HarpMessage) {
        self.outbox.push_back(event);
    }

    /// Mensagens recebidas do host
    pub fn sent(&self) -> &[HarpMessage] {
        &self.sent
    }

    /// Payload atual de um registrador
    pub fn register<R: Register>(&self) -> Option<HarpResult<R::Payload>> {
        self.registers
            .get(&R::ADDRESS)
            .map(|(_, bytes)| R::Payload::decode(bytes))
    }

    fn tick(&mut self) -> Timestamp {
        // 1 ms por mensagem
        self.clock_ticks += 31;
        let seconds = (self.clock_ticks / 31_250) as u32;
        let ticks = (self.clock_ticks % 31_250) as u16;
        Timestamp::new(seconds, ticks)
    }

    fn reply(
        &mut self,
        message_type: MessageType,
        address: u8,
        payload_type: PayloadType,
        payload: &[u8],
    ) -> HarpResult<HarpMessage> {
        let ts = self.tick();
        HarpMessage::with_timestamp(message_type, address, payload_type, ts, payload)
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, message: &HarpMessage) -> HarpResult<()> {
        self.sent.push(message.clone());
        let address = message.address();

        let reply = match message.message_type() {
            MessageType::Read => match self.registers.get(&address).cloned() {
                Some((payload_type, bytes)) if payload_type == message.payload_type() => {
                    self.reply(MessageType::Read, address, payload_type, &bytes)?
                }
                _ => self
                    .reply(MessageType::Read, address, message.payload_type(), &[])?
                    .into_error(),
            },
            MessageType::Write => {
                if self.rejected.contains(&address) {
                    self.reply(MessageType::Write, address, message.payload_type(), message.payload())?
                        .into_error()
                } else {
                    self.registers
                        .insert(address, (message.payload_type(), message.payload().to_vec()));
                    self.reply(MessageType::Write, address, message.payload_type(), message.payload())?
                }
            }
            MessageType::Event => return Ok(()),
        };

        self.outbox.push_back(reply);
        Ok(())
    }

    fn recv(&mut self) -> HarpResult<Option<HarpMessage>> {
        Ok(self.outbox.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_registers::{SerialNumber, TimestampSeconds};

    #[test]
    fn who_am_i_from_loopback() {
        let transport = LoopbackTransport::new().with_register::<WhoAmI>(&1140);
        let mut device = Device::new(transport);
        assert_eq!(device.who_am_i().unwrap(), 1140);
    }

    #[test]
    fn write_then_read() {
        let mut device = Device::new(LoopbackTransport::new());
        device.write::<SerialNumber>(&42).unwrap();
        assert_eq!(device.read::<SerialNumber>().unwrap(), 42);
        let ts = device.read_timestamped::<SerialNumber>().unwrap();
        assert!(ts.seconds > 0.0);
    }

    #[test]
    fn unknown_register_is_device_error() {
        let mut device = Device::new(LoopbackTransport::new());
        assert!(matches!(
            device.read::<SerialNumber>(),
            Err(HarpError::DeviceError { address: 13, .. })
        ));
    }

    #[test]
    fn rejected_write_is_device_error() {
        let transport = LoopbackTransport::new().reject_writes(SerialNumber::ADDRESS);
        let mut device = Device::new(transport);
        assert!(device.write::<SerialNumber>(&1).is_err());
    }

    #[test]
    fn events_are_kept_aside() {
        let mut transport = LoopbackTransport::new().with_register::<WhoAmI>(&1140);
        transport.push_event(TimestampSeconds::from_payload(MessageType::Event, &9).unwrap());
        let mut device = Device::new(transport);

        assert_eq!(device.who_am_i().unwrap(), 1140);
        let events: Vec<_> = device.drain_events().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].address(), TimestampSeconds::ADDRESS);
    }

    #[test]
    fn missing_reply() {
        struct Silent;
        impl Transport for Silent {
            fn send(&mut self, _message: &HarpMessage) -> HarpResult<()> {
                Ok(())
            }
            fn recv(&mut self) -> HarpResult<Option<HarpMessage>> {
                Ok(None)
            }
        }

        let mut device = Device::new(Silent);
        assert_eq!(device.who_am_i(), Err(HarpError::NoReply(0)));
    }
}
