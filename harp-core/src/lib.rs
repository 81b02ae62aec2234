//! # harp-core — Protocolo Harp
//!
//! Modelo de mensagens do protocolo Harp (frames binários de registrador),
//! codec de payload e descritores tipados de registrador.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          Device<T: Transport>               │
//! │   read::<R>(), write::<R>(), command()      │
//! └─────────────────────────────────────────────┘
//!                      ↓
//! ┌──────────────┐  ┌──────────────────────────┐
//! │  Register    │  │  MessageStreamExt        │
//! │  (endereço,  │  │  filter / parse / format │
//! │   payload)   │  │                          │
//! └──────────────┘  └──────────────────────────┘
//!                      ↓
//! ┌─────────────────────────────────────────────┐
//! │   HarpMessage  ←→  bytes (FrameDecoder)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```rust
//! use harp_core::prelude::*;
//! use harp_core::core_registers::WhoAmI;
//!
//! # fn main() -> Result<(), HarpError> {
//! let transport = LoopbackTransport::new().with_register::<WhoAmI>(&1140);
//! let mut device = Device::new(transport);
//! assert_eq!(device.who_am_i()?, 1140);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod message;
pub mod payload;
pub mod register;
pub mod core_registers;
pub mod stream;
pub mod transport;
pub mod prelude;

pub use error::{HarpError, HarpResult};
pub use message::{FrameDecoder, HarpCommand, HarpMessage, MessageType, PayloadType, Timestamp};
pub use register::{Access, Register, RegisterInfo, RegisterPayload, Timestamped};
pub use stream::MessageStreamExt;
pub use transport::{Device, LoopbackTransport, Transport};

#[cfg(test)]
mod tests;
