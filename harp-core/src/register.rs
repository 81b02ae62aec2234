//! # Registradores
//!
//! Cada registrador de um dispositivo Harp é um tipo que implementa
//! [`Register`]: endereço, tipo de payload e codec tipado.
//!
//! ```
//! use harp_core::register::{Register, Access};
//! use harp_core::message::MessageType;
//!
//! harp_core::register! {
//!     /// Duração do pulso (ms)
//!     pub struct PulseDuration: u16 = 71, WRITE;
//! }
//!
//! let msg = PulseDuration::from_payload(MessageType::Write, &500).unwrap();
//! assert_eq!(PulseDuration::get_payload(&msg).unwrap(), 500);
//! assert_eq!(PulseDuration::ACCESS, Access::WRITE);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HarpError, HarpResult};
use crate::message::{HarpCommand, HarpMessage, MessageType, PayloadType, Timestamp};
use crate::payload::{self, PayloadValue};

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLOAD TIPADO
// ═══════════════════════════════════════════════════════════════════════════════

/// Valor que ocupa o payload de um registrador
pub trait RegisterPayload: Sized {
    /// Tipo de elemento no fio
    const PAYLOAD_TYPE: PayloadType;
    /// Número de elementos
    const LENGTH: usize;

    fn encode(&self) -> Vec<u8>;

    fn decode(payload: &[u8]) -> HarpResult<Self>;
}

macro_rules! scalar_payload {
    ($($ty:ty),*) => {
        $(
            impl RegisterPayload for $ty {
                const PAYLOAD_TYPE: PayloadType = <$ty as PayloadValue>::PAYLOAD_TYPE;
                const LENGTH: usize = 1;

                #[inline]
                fn encode(&self) -> Vec<u8> {
                    payload::encode_value(*self)
                }

                #[inline]
                fn decode(payload: &[u8]) -> HarpResult<Self> {
                    payload::decode_value(payload)
                }
            }
        )*
    };
}

scalar_payload!(u8, i8, u16, i16, u32, i32, u64, i64, f32);

impl<T: PayloadValue + Default, const N: usize> RegisterPayload for [T; N] {
    const PAYLOAD_TYPE: PayloadType = T::PAYLOAD_TYPE;
    const LENGTH: usize = N;

    fn encode(&self) -> Vec<u8> {
        payload::encode_array(self)
    }

    fn decode(payload: &[u8]) -> HarpResult<Self> {
        payload::decode_fixed(payload)
    }
}

/// Payload com timestamp do dispositivo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timestamped<T> {
    /// Segundos desde o reset do relógio do dispositivo
    pub seconds: f64,
    pub value: T,
}

impl<T> Timestamped<T> {
    pub fn new(seconds: f64, value: T) -> Self {
        Self { seconds, value }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timestamped<U> {
        Timestamped {
            seconds: self.seconds,
            value: f(self.value),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACESSO
// ═══════════════════════════════════════════════════════════════════════════════

/// Modo de acesso de um registrador (todo registrador pode ser lido)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Access {
    pub write: bool,
    pub event: bool,
}

impl Access {
    pub const READ: Access = Access { write: false, event: false };
    pub const WRITE: Access = Access { write: true, event: false };
    pub const EVENT: Access = Access { write: false, event: true };
    pub const WRITE_EVENT: Access = Access { write: true, event: true };
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("R")?;
        if self.write {
            f.write_str("W")?;
        }
        if self.event {
            f.write_str("E")?;
        }
        Ok(())
    }
}

/// Descritor de registrador em tempo de execução
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterInfo {
    pub name: &'static str,
    pub address: u8,
    pub payload_type: PayloadType,
    pub length: usize,
    pub access: Access,
}

impl fmt::Display for RegisterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3} {:<32} {}", self.address, self.name, self.payload_type)?;
        if self.length > 1 {
            write!(f, "[{}]", self.length)?;
        }
        write!(f, " {}", self.access)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRAIT REGISTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Registrador de um dispositivo Harp
pub trait Register {
    const ADDRESS: u8;
    const NAME: &'static str;
    const ACCESS: Access;

    type Payload: RegisterPayload;

    /// Limites aplicados antes de uma escrita
    fn validate(_value: &Self::Payload) -> HarpResult<()> {
        Ok(())
    }

    fn info() -> RegisterInfo {
        RegisterInfo {
            name: Self::NAME,
            address: Self::ADDRESS,
            payload_type: <Self::Payload as RegisterPayload>::PAYLOAD_TYPE,
            length: <Self::Payload as RegisterPayload>::LENGTH,
            access: Self::ACCESS,
        }
    }

    /// Confere endereço e tipo de payload
    fn check(message: &HarpMessage) -> HarpResult<()> {
        if message.address() != Self::ADDRESS {
            return Err(HarpError::AddressMismatch {
                expected: Self::ADDRESS,
                actual: message.address(),
            });
        }
        let expected = <Self::Payload as RegisterPayload>::PAYLOAD_TYPE;
        if message.payload_type() != expected {
            return Err(HarpError::PayloadTypeMismatch {
                address: Self::ADDRESS,
                expected: expected.to_string(),
                actual: message.payload_type().to_string(),
            });
        }
        Ok(())
    }

    /// Payload tipado da mensagem
    fn get_payload(message: &HarpMessage) -> HarpResult<Self::Payload> {
        Self::check(message)?;
        Self::Payload::decode(message.payload())
    }

    /// Payload tipado com timestamp
    fn get_timestamped_payload(message: &HarpMessage) -> HarpResult<Timestamped<Self::Payload>> {
        let timestamp = message.timestamp().ok_or_else(|| {
            HarpError::InvalidValue(format!("message for {} has no timestamp", Self::NAME))
        })?;
        let value = Self::get_payload(message)?;
        Ok(Timestamped::new(timestamp.as_seconds(), value))
    }

    /// Mensagem com o payload dado
    fn from_payload(message_type: MessageType, value: &Self::Payload) -> HarpResult<HarpMessage> {
        HarpMessage::new(
            message_type,
            Self::ADDRESS,
            <Self::Payload as RegisterPayload>::PAYLOAD_TYPE,
            &value.encode(),
        )
    }

    /// Mensagem com payload e timestamp
    fn from_timestamped_payload(
        seconds: f64,
        message_type: MessageType,
        value: &Self::Payload,
    ) -> HarpResult<HarpMessage> {
        HarpMessage::with_timestamp(
            message_type,
            Self::ADDRESS,
            <Self::Payload as RegisterPayload>::PAYLOAD_TYPE,
            Timestamp::from_seconds(seconds),
            &value.encode(),
        )
    }

    /// Pedido de leitura
    fn read_command() -> HarpMessage {
        HarpCommand::read(Self::ADDRESS, <Self::Payload as RegisterPayload>::PAYLOAD_TYPE)
    }
}

/// Declara um registrador
///
/// `validate = caminho` liga uma função `fn(&Payload) -> HarpResult<()>`
/// chamada antes de escritas.
#[macro_export]
macro_rules! register {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $payload:ty = $addr:expr, $access:ident $(, validate = $validate:path)?;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::register::Register for $name {
            const ADDRESS: u8 = $addr;
            const NAME: &'static str = stringify!($name);
            const ACCESS: $crate::register::Access = $crate::register::Access::$access;

            type Payload = $payload;

            $(
                fn validate(value: &Self::Payload) -> $crate::error::HarpResult<()> {
                    $validate(value)
                }
            )?
        }
    };
}
