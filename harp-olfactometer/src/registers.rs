//! # Catálogo de registradores do Olfactometer
//!
//! Endereços 32..=93, acima dos registradores comuns do protocolo.
//! Cada registrador é um tipo declarado com [`harp_core::register!`];
//! valores que o firmware recusa são conferidos antes do envio.
//!
//! ```
//! use harp_core::prelude::*;
//! use harp_olfactometer::registers::{Channel0TargetFlow, register_info};
//!
//! assert_eq!(Channel0TargetFlow::ADDRESS, 42);
//! assert!(Channel0TargetFlow::validate(&111.0).is_ok());
//! assert!(Channel0TargetFlow::validate(&f32::NAN).is_err());
//! assert_eq!(register_info(92).unwrap().name, "ChannelsTargetFlow");
//! ```

use std::fmt;

use harp_core::error::{HarpError, HarpResult};
use harp_core::message::{HarpMessage, MessageType, PayloadType};
use harp_core::payload;
use harp_core::register;
use harp_core::register::{Register, RegisterInfo, RegisterPayload};
use serde::{Deserialize, Serialize};

use crate::types::*;

// ═══════════════════════════════════════════════════════════════════════════════
// LIMITES
// ═══════════════════════════════════════════════════════════════════════════════

/// Fluxo máximo dos canais 0..=2 (ml/min); o firmware satura acima disso
pub const MAX_ODOR_FLOW: f32 = 110.0;
/// Fluxo máximo do canal 4 (carrier) e do canal 3 na faixa de 1000
pub const MAX_CARRIER_FLOW: f32 = 1100.0;
pub const MIN_FREQUENCY: u16 = 100;
pub const MAX_FREQUENCY: u16 = 10_000;
pub const MIN_DUTY_CYCLE: f32 = 0.1;
pub const MAX_DUTY_CYCLE: f32 = 99.9;

// acima do máximo o firmware satura; só valores não finitos são recusados
fn target_flow(value: &f32) -> HarpResult<()> {
    if !value.is_finite() {
        return Err(HarpError::InvalidValue(format!("target flow {value} is not finite")));
    }
    Ok(())
}

fn pulse_duration(value: &u16) -> HarpResult<()> {
    if *value < 1 {
        return Err(HarpError::InvalidValue("pulse duration must be at least 1 ms".into()));
    }
    Ok(())
}

fn frequency(value: &u16) -> HarpResult<()> {
    if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(value) {
        return Err(HarpError::InvalidValue(format!(
            "frequency {value} Hz outside {MIN_FREQUENCY}..={MAX_FREQUENCY}"
        )));
    }
    Ok(())
}

fn duty_cycle(value: &f32) -> HarpResult<()> {
    if !(*value > MIN_DUTY_CYCLE && *value < MAX_DUTY_CYCLE) {
        return Err(HarpError::InvalidValue(format!(
            "duty cycle {value} outside ({MIN_DUTY_CYCLE}, {MAX_DUTY_CYCLE})"
        )));
    }
    Ok(())
}

fn channels_target_flow(value: &ChannelsTargetFlowPayload) -> HarpResult<()> {
    value.to_array().iter().try_for_each(target_flow)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLOAD COMPOSTO
// ═══════════════════════════════════════════════════════════════════════════════

/// Fluxo alvo dos cinco canais numa só escrita (canal 4 é o carrier)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelsTargetFlowPayload {
    pub channel0: f32,
    pub channel1: f32,
    pub channel2: f32,
    pub channel3: f32,
    pub channel4: f32,
}

impl ChannelsTargetFlowPayload {
    pub fn from_array(flows: [f32; 5]) -> Self {
        let [channel0, channel1, channel2, channel3, channel4] = flows;
        Self {
            channel0,
            channel1,
            channel2,
            channel3,
            channel4,
        }
    }

    pub fn to_array(&self) -> [f32; 5] {
        [
            self.channel0,
            self.channel1,
            self.channel2,
            self.channel3,
            self.channel4,
        ]
    }
}

impl fmt::Display for ChannelsTargetFlowPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_array())
    }
}

impl RegisterPayload for ChannelsTargetFlowPayload {
    const PAYLOAD_TYPE: PayloadType = PayloadType::Float;
    const LENGTH: usize = 5;

    fn encode(&self) -> Vec<u8> {
        payload::encode_array(&self.to_array())
    }

    fn decode(bytes: &[u8]) -> HarpResult<Self> {
        payload::decode_fixed::<f32, 5>(bytes).map(Self::from_array)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRADORES
// ═══════════════════════════════════════════════════════════════════════════════

register! {
    /// Liga/desliga o controle de fluxo
    pub struct EnableFlow: EnableFlag = 32, WRITE_EVENT;
}

register! {
    /// Leituras brutas dos cinco fluxômetros
    pub struct Flowmeter: [i16; 5] = 33, EVENT;
}

register! {
    pub struct DI0State: DigitalState = 34, EVENT;
}

register! {
    /// Curva de calibração do canal 0 (11 pontos)
    pub struct Channel0UserCalibration: [u16; 11] = 35, WRITE;
}

register! {
    pub struct Channel1UserCalibration: [u16; 11] = 36, WRITE;
}

register! {
    pub struct Channel2UserCalibration: [u16; 11] = 37, WRITE;
}

register! {
    pub struct Channel3UserCalibration: [u16; 11] = 38, WRITE;
}

register! {
    pub struct Channel4UserCalibration: [u16; 11] = 39, WRITE;
}

register! {
    /// Calibração do canal 3 na faixa alternativa
    pub struct Channel3UserCalibrationAux: [u16; 11] = 40, WRITE;
}

register! {
    /// Usa as curvas de usuário em vez das de fábrica
    pub struct UserCalibrationEnable: EnableFlag = 41, WRITE;
}

register! {
    /// Fluxo alvo do canal 0 (ml/min)
    pub struct Channel0TargetFlow: f32 = 42, WRITE, validate = target_flow;
}

register! {
    pub struct Channel1TargetFlow: f32 = 43, WRITE, validate = target_flow;
}

register! {
    pub struct Channel2TargetFlow: f32 = 44, WRITE, validate = target_flow;
}

register! {
    /// Saturação depende de [`Channel3Range`]
    pub struct Channel3TargetFlow: f32 = 45, WRITE, validate = target_flow;
}

register! {
    pub struct Channel4TargetFlow: f32 = 46, WRITE, validate = target_flow;
}

register! {
    /// Fluxo medido no canal 0 (ml/min)
    pub struct Channel0ActualFlow: f32 = 47, EVENT;
}

register! {
    pub struct Channel1ActualFlow: f32 = 48, EVENT;
}

register! {
    pub struct Channel2ActualFlow: f32 = 49, EVENT;
}

register! {
    pub struct Channel3ActualFlow: f32 = 50, EVENT;
}

register! {
    pub struct Channel4ActualFlow: f32 = 51, EVENT;
}

register! {
    /// Frequência do PWM da válvula proporcional (Hz)
    pub struct Channel0Frequency: u16 = 52, WRITE, validate = frequency;
}

register! {
    pub struct Channel1Frequency: u16 = 53, WRITE, validate = frequency;
}

register! {
    pub struct Channel2Frequency: u16 = 54, WRITE, validate = frequency;
}

register! {
    pub struct Channel3Frequency: u16 = 55, WRITE, validate = frequency;
}

register! {
    pub struct Channel4Frequency: u16 = 56, WRITE, validate = frequency;
}

register! {
    /// Duty cycle do PWM (%)
    pub struct Channel0DutyCycle: f32 = 57, WRITE, validate = duty_cycle;
}

register! {
    pub struct Channel1DutyCycle: f32 = 58, WRITE, validate = duty_cycle;
}

register! {
    pub struct Channel2DutyCycle: f32 = 59, WRITE, validate = duty_cycle;
}

register! {
    pub struct Channel3DutyCycle: f32 = 60, WRITE, validate = duty_cycle;
}

register! {
    pub struct Channel4DutyCycle: f32 = 61, WRITE, validate = duty_cycle;
}

register! {
    pub struct DigitalOutputSet: DigitalOutputs = 62, WRITE;
}

register! {
    pub struct DigitalOutputClear: DigitalOutputs = 63, WRITE;
}

register! {
    pub struct DigitalOutputToggle: DigitalOutputs = 64, WRITE;
}

register! {
    pub struct DigitalOutputState: DigitalOutputs = 65, WRITE;
}

register! {
    /// Válvulas que desligam sozinhas após o pulso configurado
    pub struct EnableValvePulse: Valves = 66, WRITE;
}

register! {
    pub struct ValveSet: Valves = 67, WRITE;
}

register! {
    pub struct ValveClear: Valves = 68, WRITE;
}

register! {
    pub struct ValveToggle: Valves = 69, WRITE;
}

register! {
    pub struct ValveState: Valves = 70, WRITE;
}

register! {
    /// Duração do pulso da válvula 0 (ms)
    pub struct PulseValve0: u16 = 71, WRITE, validate = pulse_duration;
}

register! {
    pub struct PulseValve1: u16 = 72, WRITE, validate = pulse_duration;
}

register! {
    pub struct PulseValve2: u16 = 73, WRITE, validate = pulse_duration;
}

register! {
    pub struct PulseValve3: u16 = 74, WRITE, validate = pulse_duration;
}

register! {
    pub struct PulseEndValve0: u16 = 75, WRITE, validate = pulse_duration;
}

register! {
    pub struct PulseEndValve1: u16 = 76, WRITE, validate = pulse_duration;
}

register! {
    pub struct PulseDummyValve: u16 = 77, WRITE, validate = pulse_duration;
}

register! {
    pub struct DO0Sync: DO0SyncConfig = 78, WRITE;
}

register! {
    pub struct DO1Sync: DO1SyncConfig = 79, WRITE;
}

register! {
    pub struct DI0Trigger: DI0TriggerConfig = 80, WRITE;
}

register! {
    pub struct MimicValve0: MimicOutputs = 81, WRITE;
}

register! {
    pub struct MimicValve1: MimicOutputs = 82, WRITE;
}

register! {
    pub struct MimicValve2: MimicOutputs = 83, WRITE;
}

register! {
    pub struct MimicValve3: MimicOutputs = 84, WRITE;
}

register! {
    pub struct MimicEndValve0: MimicOutputs = 85, WRITE;
}

register! {
    pub struct MimicEndValve1: MimicOutputs = 86, WRITE;
}

register! {
    pub struct MimicDummyValve: MimicOutputs = 87, WRITE;
}

register! {
    /// Válvulas passam a obedecer ao conector externo
    pub struct EnableValveExternalControl: EnableFlag = 88, WRITE;
}

register! {
    pub struct Channel3Range: Channel3RangeConfig = 89, WRITE;
}

register! {
    /// Estado das quatro válvulas de odor
    pub struct OdorValveState: OdorValves = 90, WRITE;
}

register! {
    pub struct EndValveState: EndValves = 91, WRITE;
}

register! {
    /// Fluxo alvo de todos os canais
    pub struct ChannelsTargetFlow: ChannelsTargetFlowPayload = 92, WRITE, validate = channels_target_flow;
}

register! {
    pub struct EnableEvents: OlfactometerEvents = 93, WRITE;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CATÁLOGO
// ═══════════════════════════════════════════════════════════════════════════════

// valor de um payload; `"{:?}"` para os arrays
macro_rules! write_value {
    ($f:ident, $value:expr) => {
        write!($f, "{}", $value)
    };
    ($f:ident, $value:expr, $fmt:literal) => {
        write!($f, $fmt, $value)
    };
}

macro_rules! catalog {
    ($($reg:ident $(: $fmt:literal)?),* $(,)?) => {
        /// Todos os registradores específicos do Olfactometer, em ordem de endereço
        pub const REGISTERS: &[RegisterInfo] = &[
            $(
                RegisterInfo {
                    name: <$reg as Register>::NAME,
                    address: <$reg as Register>::ADDRESS,
                    payload_type: <<$reg as Register>::Payload as RegisterPayload>::PAYLOAD_TYPE,
                    length: <<$reg as Register>::Payload as RegisterPayload>::LENGTH,
                    access: <$reg as Register>::ACCESS,
                },
            )*
        ];

        /// Payload decodificado de qualquer registrador do catálogo
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum OlfactometerPayload {
            $( $reg(<$reg as Register>::Payload), )*
        }

        impl OlfactometerPayload {
            /// Decodifica pelo endereço da mensagem
            pub fn decode(message: &HarpMessage) -> HarpResult<Self> {
                let address = message.address();
                $(
                    if address == <$reg as Register>::ADDRESS {
                        return <$reg as Register>::get_payload(message).map(Self::$reg);
                    }
                )*
                Err(HarpError::InvalidValue(format!(
                    "no Olfactometer register at address {address}"
                )))
            }

            pub fn address(&self) -> u8 {
                match self {
                    $( Self::$reg(_) => <$reg as Register>::ADDRESS, )*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$reg(_) => <$reg as Register>::NAME, )*
                }
            }

            /// Mensagem do tipo dado com este payload
            pub fn to_message(&self, message_type: MessageType) -> HarpResult<HarpMessage> {
                match self {
                    $( Self::$reg(value) => <$reg as Register>::from_payload(message_type, value), )*
                }
            }
        }

        impl fmt::Display for OlfactometerPayload {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} = ", self.name())?;
                match self {
                    $( Self::$reg(value) => write_value!(f, value $(, $fmt)?), )*
                }
            }
        }
    };
}

catalog! {
    EnableFlow,
    Flowmeter: "{:?}",
    DI0State,
    Channel0UserCalibration: "{:?}",
    Channel1UserCalibration: "{:?}",
    Channel2UserCalibration: "{:?}",
    Channel3UserCalibration: "{:?}",
    Channel4UserCalibration: "{:?}",
    Channel3UserCalibrationAux: "{:?}",
    UserCalibrationEnable,
    Channel0TargetFlow,
    Channel1TargetFlow,
    Channel2TargetFlow,
    Channel3TargetFlow,
    Channel4TargetFlow,
    Channel0ActualFlow,
    Channel1ActualFlow,
    Channel2ActualFlow,
    Channel3ActualFlow,
    Channel4ActualFlow,
    Channel0Frequency,
    Channel1Frequency,
    Channel2Frequency,
    Channel3Frequency,
    Channel4Frequency,
    Channel0DutyCycle,
    Channel1DutyCycle,
    Channel2DutyCycle,
    Channel3DutyCycle,
    Channel4DutyCycle,
    DigitalOutputSet,
    DigitalOutputClear,
    DigitalOutputToggle,
    DigitalOutputState,
    EnableValvePulse,
    ValveSet,
    ValveClear,
    ValveToggle,
    ValveState,
    PulseValve0,
    PulseValve1,
    PulseValve2,
    PulseValve3,
    PulseEndValve0,
    PulseEndValve1,
    PulseDummyValve,
    DO0Sync,
    DO1Sync,
    DI0Trigger,
    MimicValve0,
    MimicValve1,
    MimicValve2,
    MimicValve3,
    MimicEndValve0,
    MimicEndValve1,
    MimicDummyValve,
    EnableValveExternalControl,
    Channel3Range,
    OdorValveState,
    EndValveState,
    ChannelsTargetFlow,
    EnableEvents,
}

/// Descritor de um registrador pelo endereço
pub fn register_info(address: u8) -> Option<&'static RegisterInfo> {
    REGISTERS.iter().find(|info| info.address == address)
}

/// Descritor de um registrador pelo nome (sem distinguir maiúsculas)
pub fn register_by_name(name: &str) -> Option<&'static RegisterInfo> {
    REGISTERS.iter().find(|info| info.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_ordered_and_complete() {
        assert_eq!(REGISTERS.len(), 62);
        assert_eq!(REGISTERS.first().unwrap().address, 32);
        assert_eq!(REGISTERS.last().unwrap().address, 93);
        for (i, info) in REGISTERS.iter().enumerate() {
            assert_eq!(info.address as usize, 32 + i, "{}", info.name);
        }
    }

    #[test]
    fn lookup_by_address_and_name() {
        let info = register_info(33).unwrap();
        assert_eq!(info.name, "Flowmeter");
        assert_eq!(info.payload_type, PayloadType::S16);
        assert_eq!(info.length, 5);
        assert_eq!(register_by_name("odorvalvestate").unwrap().address, 90);
        assert!(register_info(94).is_none());
    }

    #[test]
    fn channels_target_flow_wire_layout() {
        let value = ChannelsTargetFlowPayload::from_array([10.0, 0.0, 0.0, 100.0, 90.0]);
        let msg = ChannelsTargetFlow::from_payload(MessageType::Write, &value).unwrap();
        assert_eq!(msg.payload_type(), PayloadType::Float);
        assert_eq!(msg.payload().len(), 20);
        assert_eq!(&msg.payload()[..4], &10.0f32.to_le_bytes());
        assert_eq!(ChannelsTargetFlow::get_payload(&msg).unwrap(), value);
    }

    #[test]
    fn target_flow_is_left_to_firmware_saturation() {
        assert!(Channel0TargetFlow::validate(&110.5).is_ok());
        assert!(Channel2TargetFlow::validate(&-1.0).is_ok());
        assert!(Channel4TargetFlow::validate(&1500.0).is_ok());
        assert!(Channel4TargetFlow::validate(&f32::NAN).is_err());

        let oversubscribed = ChannelsTargetFlowPayload::from_array([120.0, 50.0, 50.0, 50.0, -170.0]);
        assert!(ChannelsTargetFlow::validate(&oversubscribed).is_ok());
        let broken = ChannelsTargetFlowPayload::from_array([0.0, 0.0, f32::INFINITY, 0.0, 0.0]);
        assert!(ChannelsTargetFlow::validate(&broken).is_err());
    }

    #[test]
    fn pwm_limits() {
        assert!(Channel1Frequency::validate(&99).is_err());
        assert!(Channel1Frequency::validate(&100).is_ok());
        assert!(Channel1Frequency::validate(&10_001).is_err());
        assert!(Channel3DutyCycle::validate(&0.1).is_err());
        assert!(Channel3DutyCycle::validate(&50.0).is_ok());
        assert!(Channel3DutyCycle::validate(&99.9).is_err());
        assert!(PulseValve2::validate(&0).is_err());
    }

    #[test]
    fn decode_any_register() {
        let msg = OdorValveState::from_payload(MessageType::Write, &OdorValves::VALVE2).unwrap();
        let decoded = OlfactometerPayload::decode(&msg).unwrap();
        assert_eq!(decoded, OlfactometerPayload::OdorValveState(OdorValves::VALVE2));
        assert_eq!(decoded.address(), 90);
        assert_eq!(decoded.to_string(), "OdorValveState = VALVE2");
        assert_eq!(decoded.to_message(MessageType::Write).unwrap(), msg);
    }

    #[test]
    fn decode_display_scalars() {
        let msg = Channel1ActualFlow::from_payload(MessageType::Event, &12.5).unwrap();
        let decoded = OlfactometerPayload::decode(&msg).unwrap();
        assert_eq!(decoded.to_string(), "Channel1ActualFlow = 12.5");

        let msg = Flowmeter::from_payload(MessageType::Event, &[1, -2, 3, 4, 5]).unwrap();
        let decoded = OlfactometerPayload::decode(&msg).unwrap();
        assert_eq!(decoded.to_string(), "Flowmeter = [1, -2, 3, 4, 5]");

        let msg = DI0Trigger::from_payload(MessageType::Write, &DI0TriggerConfig::Sync).unwrap();
        let decoded = OlfactometerPayload::decode(&msg).unwrap();
        assert_eq!(decoded.to_string(), "DI0Trigger = Sync");

        let flows = ChannelsTargetFlowPayload::from_array([10.0, 0.0, 0.0, 0.0, 90.0]);
        let decoded = OlfactometerPayload::ChannelsTargetFlow(flows);
        assert_eq!(decoded.to_string(), "ChannelsTargetFlow = [10.0, 0.0, 0.0, 0.0, 90.0]");
    }

    #[test]
    fn decode_unknown_address() {
        let msg = HarpMessage::new(MessageType::Event, 120, PayloadType::U8, &[0]).unwrap();
        assert!(OlfactometerPayload::decode(&msg).is_err());
    }

    #[test]
    fn decode_bad_enum_code() {
        let msg = HarpMessage::new(MessageType::Write, 80, PayloadType::U8, &[7]).unwrap();
        assert!(OlfactometerPayload::decode(&msg).is_err());
    }
}
