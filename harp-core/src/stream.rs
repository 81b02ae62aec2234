//! # Streams de mensagens
//!
//! Operadores sobre sequências de [`HarpMessage`] que expõem registradores
//! como fluxos de eventos tipados.
//!
//! ```
//! use harp_core::prelude::*;
//! use harp_core::core_registers::TimestampSeconds;
//!
//! let events = vec![
//!     TimestampSeconds::from_payload(MessageType::Event, &1).unwrap(),
//!     TimestampSeconds::from_payload(MessageType::Event, &2).unwrap(),
//! ];
//!
//! let seconds: Vec<u32> = events
//!     .into_iter()
//!     .parse_register::<TimestampSeconds>()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(seconds, vec![1, 2]);
//! ```

use std::marker::PhantomData;

use crate::error::HarpResult;
use crate::message::{HarpMessage, MessageType};
use crate::register::{Register, Timestamped};

/// Mantém apenas mensagens de um registrador
pub struct FilterRegister<I, R> {
    inner: I,
    _register: PhantomData<R>,
}

impl<I, R> Iterator for FilterRegister<I, R>
where
    I: Iterator<Item = HarpMessage>,
    R: Register,
{
    type Item = HarpMessage;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find(|msg| msg.address() == R::ADDRESS)
    }
}

/// Mantém apenas mensagens de um tipo
pub struct FilterMessageType<I> {
    inner: I,
    message_type: MessageType,
}

impl<I> Iterator for FilterMessageType<I>
where
    I: Iterator<Item = HarpMessage>,
{
    type Item = HarpMessage;

    fn next(&mut self) -> Option<Self::Item> {
        let wanted = self.message_type;
        self.inner.by_ref().find(|msg| msg.message_type() == wanted)
    }
}

/// Decodifica o payload das mensagens de um registrador
pub struct ParseRegister<I, R> {
    inner: I,
    _register: PhantomData<R>,
}

impl<I, R> Iterator for ParseRegister<I, R>
where
    I: Iterator<Item = HarpMessage>,
    R: Register,
{
    type Item = HarpResult<R::Payload>;

    fn next(&mut self) -> Option<Self::Item> {
        let msg = self.inner.by_ref().find(|msg| msg.address() == R::ADDRESS)?;
        Some(R::get_payload(&msg))
    }
}

/// Decodifica payload e timestamp das mensagens de um registrador
pub struct ParseTimestamped<I, R> {
    inner: I,
    _register: PhantomData<R>,
}

impl<I, R> Iterator for ParseTimestamped<I, R>
where
    I: Iterator<Item = HarpMessage>,
    R: Register,
{
    type Item = HarpResult<Timestamped<R::Payload>>;

    fn next(&mut self) -> Option<Self::Item> {
        let msg = self.inner.by_ref().find(|msg| msg.address() == R::ADDRESS)?;
        Some(R::get_timestamped_payload(&msg))
    }
}

/// Operadores de stream sobre iteradores de mensagens
pub trait MessageStreamExt: Iterator<Item = HarpMessage> + Sized {
    fn filter_register<R: Register>(self) -> FilterRegister<Self, R> {
        FilterRegister {
            inner: self,
            _register: PhantomData,
        }
    }

    fn filter_message_type(self, message_type: MessageType) -> FilterMessageType<Self> {
        FilterMessageType {
            inner: self,
            message_type,
        }
    }

    /// Apenas eventos emitidos pelo dispositivo, sem respostas de erro
    fn events(self) -> std::iter::Filter<FilterMessageType<Self>, fn(&HarpMessage) -> bool> {
        self.filter_message_type(MessageType::Event)
            .filter(is_not_error as fn(&HarpMessage) -> bool)
    }

    fn parse_register<R: Register>(self) -> ParseRegister<Self, R> {
        ParseRegister {
            inner: self,
            _register: PhantomData,
        }
    }

    fn parse_timestamped<R: Register>(self) -> ParseTimestamped<Self, R> {
        ParseTimestamped {
            inner: self,
            _register: PhantomData,
        }
    }
}

impl<I: Iterator<Item = HarpMessage>> MessageStreamExt for I {}

fn is_not_error(msg: &HarpMessage) -> bool {
    !msg.is_error()
}

/// Converte uma sequência de payloads em mensagens de um registrador
pub fn format_register<R, I>(
    payloads: I,
    message_type: MessageType,
) -> impl Iterator<Item = HarpResult<HarpMessage>>
where
    R: Register,
    I: IntoIterator<Item = R::Payload>,
{
    payloads
        .into_iter()
        .map(move |value| R::from_payload(message_type, &value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_registers::{SerialNumber, TimestampSeconds};
    use crate::message::PayloadType;

    fn sample() -> Vec<HarpMessage> {
        vec![
            TimestampSeconds::from_timestamped_payload(1.0, MessageType::Event, &1).unwrap(),
            SerialNumber::from_payload(MessageType::Write, &77).unwrap(),
            TimestampSeconds::from_timestamped_payload(2.0, MessageType::Event, &2).unwrap(),
            HarpMessage::new(MessageType::Event, 8, PayloadType::U32, &[0; 4])
                .unwrap()
                .into_error(),
        ]
    }

    #[test]
    fn filter_by_register() {
        let count = sample().into_iter().filter_register::<SerialNumber>().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn events_skip_errors() {
        assert_eq!(sample().into_iter().events().count(), 2);
    }

    #[test]
    fn parse_timestamped_values() {
        let values: Vec<_> = sample()
            .into_iter()
            .events()
            .parse_timestamped::<TimestampSeconds>()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].value, 2);
        assert!((values[1].seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn format_then_parse() {
        let msgs: Vec<_> = format_register::<SerialNumber, _>([1u16, 2, 3], MessageType::Write)
            .map(|r| r.unwrap())
            .collect();
        let back: Vec<u16> = msgs
            .into_iter()
            .parse_register::<SerialNumber>()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
