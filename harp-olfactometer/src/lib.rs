//! # harp-olfactometer — Olfactometer Harp
//!
//! Registradores, cliente de dispositivo e mistura de odores do
//! Olfactometer (WhoAmI 1140), sobre o protocolo de [`harp_core`].
//!
//! ## Arquitetura
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   ConfigureOdorMix        CommandBuilder     │
//! │   % por canal → fluxos    escritas em lote   │
//! └──────────────────────────────────────────────┘
//!                      ↓
//! ┌──────────────────────────────────────────────┐
//! │   Olfactometer<T: Transport>                 │
//! │   open (WhoAmI), fluxo, válvulas, eventos    │
//! └──────────────────────────────────────────────┘
//!                      ↓
//! ┌──────────────────────────────────────────────┐
//! │   registers (32..=93)  +  types (flags/enums)│
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```rust
//! use harp_core::prelude::*;
//! use harp_core::core_registers::WhoAmI;
//! use harp_olfactometer::prelude::*;
//!
//! # fn main() -> Result<(), OlfactometerError> {
//! let transport = LoopbackTransport::new().with_register::<WhoAmI>(&WHO_AM_I);
//! let mut olfactometer = Olfactometer::open(transport)?;
//!
//! let mix = ConfigureOdorMix::new().with_percentage(0, 0.2)?;
//! olfactometer.configure_odor_mix(&mix)?;
//!
//! let transport = olfactometer.into_inner();
//! let flows = transport.register::<ChannelsTargetFlow>().unwrap()?;
//! assert_eq!(flows.channel0, 20.0);
//! assert_eq!(flows.channel4, 80.0);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod types;
pub mod registers;
pub mod device;
pub mod odor_mix;
pub mod command;
pub mod config;
pub mod eeprom;

pub use error::{OlfactometerError, OlfactometerResult};
pub use device::{Olfactometer, WHO_AM_I};
pub use odor_mix::{ConfigureOdorMix, OdorMixFlows};
pub use command::CommandBuilder;
pub use config::OdorMixConfig;
pub use eeprom::{CalibrationTable, EepromImage};
pub use registers::{OlfactometerPayload, REGISTERS, register_info};

pub mod prelude {
    pub use crate::command::CommandBuilder;
    pub use crate::config::OdorMixConfig;
    pub use crate::device::{Olfactometer, WHO_AM_I};
    pub use crate::error::{OlfactometerError, OlfactometerResult};
    pub use crate::odor_mix::{ConfigureOdorMix, OdorMixFlows};
    pub use crate::registers::*;
    pub use crate::types::*;
}

#[cfg(test)]
mod tests;
