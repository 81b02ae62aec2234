//! Tipos de payload do Olfactometer
//!
//! Máscaras de bits e configurações enumeradas, todas `U8` no fio.

use harp_core::error::{HarpError, HarpResult};
use harp_core::message::PayloadType;
use harp_core::payload;
use harp_core::register::RegisterPayload;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Declara uma máscara de bits `u8`
///
/// Bits desconhecidos são preservados na decodificação.
macro_rules! flags {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* const $flag:ident = $bit:expr; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u8);

        impl $name {
            pub const EMPTY: Self = Self(0);
            $( $(#[$fmeta])* pub const $flag: Self = Self($bit); )*
            pub const ALL: Self = Self(0 $( | $bit )*);

            const NAMES: &'static [(&'static str, u8)] = &[ $( (stringify!($flag), $bit) ),* ];

            #[inline]
            pub const fn from_bits(bits: u8) -> Self {
                Self(bits)
            }

            #[inline]
            pub const fn bits(self) -> u8 {
                self.0
            }

            #[inline]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            #[inline]
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }

            /// Valor com o bit `flag` quando `on`
            #[inline]
            pub const fn when(flag: Self, on: bool) -> Self {
                if on { flag } else { Self::EMPTY }
            }

            /// Busca uma flag pelo nome (sem distinguir maiúsculas)
            pub fn from_name(name: &str) -> Option<Self> {
                Self::NAMES
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                    .map(|(_, bit)| Self(*bit))
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                Self(!self.0 & Self::ALL.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut first = true;
                let mut rest = self.0;
                for (name, bit) in Self::NAMES {
                    if self.0 & bit != 0 {
                        if !first {
                            f.write_str(" | ")?;
                        }
                        f.write_str(name)?;
                        first = false;
                        rest &= !bit;
                    }
                }
                if rest != 0 {
                    if !first {
                        f.write_str(" | ")?;
                    }
                    write!(f, "0x{:02X}", rest)?;
                    first = false;
                }
                if first {
                    f.write_str("EMPTY")?;
                }
                Ok(())
            }
        }

        impl RegisterPayload for $name {
            const PAYLOAD_TYPE: PayloadType = PayloadType::U8;
            const LENGTH: usize = 1;

            fn encode(&self) -> Vec<u8> {
                vec![self.0]
            }

            fn decode(bytes: &[u8]) -> HarpResult<Self> {
                payload::decode_value::<u8>(bytes).map(Self)
            }
        }
    };
}

/// Declara uma configuração enumerada `u8`
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $code, )*
        }

        impl $name {
            pub fn from_byte(b: u8) -> Option<Self> {
                match b {
                    $( $code => Some(Self::$variant), )*
                    _ => None,
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                [$( (stringify!($variant), Self::$variant) ),*]
                    .into_iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let name = match self {
                    $( Self::$variant => stringify!($variant), )*
                };
                f.write_str(name)
            }
        }

        impl RegisterPayload for $name {
            const PAYLOAD_TYPE: PayloadType = PayloadType::U8;
            const LENGTH: usize = 1;

            fn encode(&self) -> Vec<u8> {
                vec![*self as u8]
            }

            fn decode(bytes: &[u8]) -> HarpResult<Self> {
                let b = payload::decode_value::<u8>(bytes)?;
                Self::from_byte(b).ok_or_else(|| {
                    HarpError::InvalidValue(format!("{} is not a valid {}", b, stringify!($name)))
                })
            }
        }
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMERAÇÕES
// ═══════════════════════════════════════════════════════════════════════════════

code_enum! {
    /// Liga/desliga genérico
    pub enum EnableFlag {
        Disable = 0,
        Enable = 1,
    }
}

code_enum! {
    /// Nível lógico de uma entrada digital
    pub enum DigitalState {
        Low = 0,
        High = 1,
    }
}

code_enum! {
    /// Função da saída digital DO0
    pub enum DO0SyncConfig {
        /// Controlada por software
        None = 0,
        /// Espelha o bit START do fluxo
        Start = 1,
    }
}

code_enum! {
    /// Função da saída digital DO1
    pub enum DO1SyncConfig {
        None = 0,
        Start = 1,
    }
}

code_enum! {
    /// Função da entrada digital DI0
    pub enum DI0TriggerConfig {
        /// Entrada digital comum
        Sync = 0,
        /// Borda de subida liga o fluxo, borda de descida desliga
        RiseStartFallStop = 1,
        /// Alterna as end valves nas bordas
        ValveToggle = 2,
    }
}

code_enum! {
    /// Saída que espelha o estado de uma válvula
    pub enum MimicOutputs {
        None = 0,
        DO0 = 1,
        DO1 = 2,
    }
}

code_enum! {
    /// Faixa de fluxo do canal 3 (ml/min)
    pub enum Channel3RangeConfig {
        FlowRate100 = 0,
        FlowRate1000 = 1,
    }
}

impl Channel3RangeConfig {
    /// Fluxo máximo aceito pelo firmware nessa faixa
    pub fn max_target_flow(self) -> f32 {
        match self {
            Self::FlowRate100 => 110.0,
            Self::FlowRate1000 => 1100.0,
        }
    }
}

impl From<bool> for EnableFlag {
    fn from(on: bool) -> Self {
        if on { Self::Enable } else { Self::Disable }
    }
}

impl From<EnableFlag> for bool {
    fn from(flag: EnableFlag) -> Self {
        flag == EnableFlag::Enable
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MÁSCARAS
// ═══════════════════════════════════════════════════════════════════════════════

flags! {
    /// Saídas digitais
    pub struct DigitalOutputs {
        const DO0 = 0x01;
        const DO1 = 0x02;
    }
}

flags! {
    /// Todas as válvulas do dispositivo
    pub struct Valves {
        const VALVE0 = 0x01;
        const VALVE1 = 0x02;
        const VALVE2 = 0x04;
        const VALVE3 = 0x08;
        const END_VALVE0 = 0x10;
        const END_VALVE1 = 0x20;
        const VALVE_DUMMY = 0x40;
    }
}

flags! {
    /// Válvulas de odor (canais 0..=3)
    pub struct OdorValves {
        const VALVE0 = 0x01;
        const VALVE1 = 0x02;
        const VALVE2 = 0x04;
        const VALVE3 = 0x08;
    }
}

flags! {
    /// End valves e válvula dummy
    pub struct EndValves {
        const END_VALVE0 = 0x10;
        const END_VALVE1 = 0x20;
        const VALVE_DUMMY = 0x40;
    }
}

flags! {
    /// Eventos habilitados
    pub struct OlfactometerEvents {
        /// Leituras analógicas dos fluxômetros
        const FLOWMETER = 0x01;
        /// Mudanças em DI0
        const DI0_TRIGGER = 0x02;
        /// Fluxo real dos canais
        const CHANNEL_ACTUAL_FLOW = 0x04;
    }
}

impl OdorValves {
    /// Válvula de odor do canal `index` (0..=3)
    pub fn channel(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::VALVE0),
            1 => Some(Self::VALVE1),
            2 => Some(Self::VALVE2),
            3 => Some(Self::VALVE3),
            _ => None,
        }
    }
}

impl From<OdorValves> for Valves {
    fn from(v: OdorValves) -> Self {
        Valves::from_bits(v.bits())
    }
}

impl From<EndValves> for Valves {
    fn from(v: EndValves) -> Self {
        Valves::from_bits(v.bits())
    }
}
