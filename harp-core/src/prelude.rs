//! Imports comuns

pub use crate::error::{HarpError, HarpResult};
pub use crate::message::{HarpCommand, HarpMessage, MessageType, PayloadType, Timestamp};
pub use crate::register::{Access, Register, RegisterInfo, RegisterPayload, Timestamped};
pub use crate::stream::{format_register, MessageStreamExt};
pub use crate::transport::{Device, LoopbackTransport, Transport};
