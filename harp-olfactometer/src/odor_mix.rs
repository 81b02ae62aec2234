//! # Mistura de odores
//!
//! Converte porcentagens por canal em duas escritas: fluxo alvo dos cinco
//! canais ([`ChannelsTargetFlow`]) e estado das válvulas de odor
//! ([`OdorValveState`]), nessa ordem.
//!
//! ```text
//! flow[i]  = trunc(target_odor_flow * pct[i])        i = 0..=3
//! carrier  = target_odor_flow - Σ flow[i]
//! payload  = [flow0, flow1, flow2, flow3 | target (carrier), carrier]
//! ```
//!
//! No modo carrier o canal 3 recebe o fluxo alvo inteiro, não entra na soma
//! e sua válvula fica aberta. Misturas acima do fluxo alvo resultam em
//! carrier negativo, enviado como está.
//!
//! ```
//! use harp_olfactometer::odor_mix::ConfigureOdorMix;
//!
//! let mut mix = ConfigureOdorMix::new();
//! mix.set_percentage(0, 0.25).unwrap();
//! let flows = mix.flows();
//! assert_eq!(flows.channels, [25, 0, 0, 0]);
//! assert_eq!(flows.carrier, 75);
//! ```

use harp_core::message::{HarpMessage, MessageType};
use harp_core::register::Register;

use crate::config::{DEFAULT_TARGET_ODOR_FLOW, DEFAULT_TARGET_TOTAL_FLOW, OdorMixConfig};
use crate::error::{OlfactometerError, OlfactometerResult};
use crate::registers::{ChannelsTargetFlow, ChannelsTargetFlowPayload, OdorValveState};
use crate::types::OdorValves;

/// Número de canais de odor
pub const ODOR_CHANNELS: usize = 4;

/// Fluxos inteiros calculados para uma mistura
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OdorMixFlows {
    /// Fluxo de cada canal de odor que entra na soma
    pub channels: [i64; ODOR_CHANNELS],
    /// Fluxo restante no canal 4
    pub carrier: i64,
}

/// Gerador das mensagens de mistura de odores
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigureOdorMix {
    percentages: [f32; ODOR_CHANNELS],
    channel3_as_carrier: bool,
    target_odor_flow: i32,
    target_total_flow: i32,
}

impl Default for ConfigureOdorMix {
    fn default() -> Self {
        Self {
            percentages: [0.0; ODOR_CHANNELS],
            channel3_as_carrier: false,
            target_odor_flow: DEFAULT_TARGET_ODOR_FLOW,
            target_total_flow: DEFAULT_TARGET_TOTAL_FLOW,
        }
    }
}

impl ConfigureOdorMix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &OdorMixConfig) -> OlfactometerResult<Self> {
        let mut mix = Self::new();
        mix.target_odor_flow = config.target_odor_flow;
        mix.target_total_flow = config.target_total_flow;
        mix.set_channel3_as_carrier(config.channel3_as_carrier);
        let last = if config.channel3_as_carrier { 3 } else { ODOR_CHANNELS };
        for (channel, &value) in config.percentages.iter().enumerate().take(last) {
            mix.set_percentage(channel, value)?;
        }
        Ok(mix)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PARÂMETROS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn percentage(&self, channel: usize) -> Option<f32> {
        self.percentages.get(channel).copied()
    }

    pub fn percentages(&self) -> [f32; ODOR_CHANNELS] {
        self.percentages
    }

    /// Define a porcentagem de um canal (0..=3), em [0, 1]
    pub fn set_percentage(&mut self, channel: usize, value: f32) -> OlfactometerResult<()> {
        check_channel(channel, self.channel3_as_carrier)?;
        check_percentage(channel, f64::from(value))?;
        self.percentages[channel] = value;
        Ok(())
    }

    pub fn with_percentage(mut self, channel: usize, value: f32) -> OlfactometerResult<Self> {
        self.set_percentage(channel, value)?;
        Ok(self)
    }

    pub fn channel3_as_carrier(&self) -> bool {
        self.channel3_as_carrier
    }

    /// Liga/desliga o modo carrier do canal 3
    ///
    /// Ligado, a porcentagem do canal 3 vira NaN; desligado, volta a zero.
    pub fn set_channel3_as_carrier(&mut self, carrier: bool) {
        self.channel3_as_carrier = carrier;
        self.percentages[3] = if carrier { f32::NAN } else { 0.0 };
    }

    pub fn with_channel3_as_carrier(mut self, carrier: bool) -> Self {
        self.set_channel3_as_carrier(carrier);
        self
    }

    pub fn target_odor_flow(&self) -> i32 {
        self.target_odor_flow
    }

    pub fn set_target_odor_flow(&mut self, flow: i32) {
        self.target_odor_flow = flow;
    }

    pub fn with_target_odor_flow(mut self, flow: i32) -> Self {
        self.target_odor_flow = flow;
        self
    }

    pub fn target_total_flow(&self) -> i32 {
        self.target_total_flow
    }

    pub fn set_target_total_flow(&mut self, flow: i32) {
        self.target_total_flow = flow;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CÁLCULO
    // ═══════════════════════════════════════════════════════════════════════════

    /// Fluxos da mistura atual
    pub fn flows(&self) -> OdorMixFlows {
        self.compute(|channel| channel_flow(self.target_odor_flow, self.percentages[channel]))
    }

    fn compute(&self, flow_of: impl Fn(usize) -> i64) -> OdorMixFlows {
        let mut channels = [0i64; ODOR_CHANNELS];
        for (channel, flow) in channels.iter_mut().enumerate() {
            *flow = flow_of(channel);
        }
        if self.channel3_as_carrier {
            channels[3] = 0;
        }
        let carrier = i64::from(self.target_odor_flow) - channels.iter().sum::<i64>();
        OdorMixFlows { channels, carrier }
    }

    /// Payload de [`ChannelsTargetFlow`] para os fluxos dados
    pub fn target_flow_payload(&self, flows: &OdorMixFlows) -> ChannelsTargetFlowPayload {
        let channel3 = if self.channel3_as_carrier {
            i64::from(self.target_odor_flow)
        } else {
            flows.channels[3]
        };
        ChannelsTargetFlowPayload {
            channel0: flows.channels[0] as f32,
            channel1: flows.channels[1] as f32,
            channel2: flows.channels[2] as f32,
            channel3: channel3 as f32,
            channel4: flows.carrier as f32,
        }
    }

    /// Válvulas de odor abertas para os fluxos dados
    pub fn odor_valves(&self, flows: &OdorMixFlows) -> OdorValves {
        let mut valves = OdorValves::EMPTY;
        for (channel, &flow) in flows.channels.iter().enumerate() {
            let flow = if channel == 3 && self.channel3_as_carrier {
                i64::from(self.target_odor_flow)
            } else {
                flow
            };
            if let Some(valve) = OdorValves::channel(channel) {
                valves |= OdorValves::when(valve, flow > 0);
            }
        }
        valves
    }

    fn build(&self, flows: OdorMixFlows) -> OlfactometerResult<Vec<HarpMessage>> {
        let payload = self.target_flow_payload(&flows);
        let valves = self.odor_valves(&flows);
        tracing::debug!(
            channels = ?flows.channels,
            carrier = flows.carrier,
            %valves,
            "odor mix"
        );

        Ok(vec![
            ChannelsTargetFlow::from_payload(MessageType::Write, &payload)?,
            OdorValveState::from_payload(MessageType::Write, &valves)?,
        ])
    }

    /// Mensagens da mistura completa: fluxo alvo e depois válvulas
    pub fn messages(&self) -> OlfactometerResult<Vec<HarpMessage>> {
        self.build(self.flows())
    }

    /// Mensagens com apenas um canal ativo na concentração dada
    pub fn channel_messages(&self, index: usize, concentration: f64) -> OlfactometerResult<Vec<HarpMessage>> {
        check_channel(index, self.channel3_as_carrier)?;
        check_percentage(index, concentration)?;
        let flow = (f64::from(self.target_odor_flow) * concentration) as i64;
        self.build(self.compute(|channel| if channel == index { flow } else { 0 }))
    }

    /// Repete o par de mensagens a cada evento de entrada
    pub fn generate_for<E>(
        &self,
        events: impl IntoIterator<Item = E>,
    ) -> impl Iterator<Item = OlfactometerResult<HarpMessage>> {
        events.into_iter().flat_map(move |_| flatten(self.messages()))
    }

    /// Uma mistura de canal único por par (canal, concentração)
    pub fn generate_channels(
        &self,
        pairs: impl IntoIterator<Item = (usize, f64)>,
    ) -> impl Iterator<Item = OlfactometerResult<HarpMessage>> {
        pairs
            .into_iter()
            .flat_map(move |(index, concentration)| flatten(self.channel_messages(index, concentration)))
    }
}

fn channel_flow(target: i32, percentage: f32) -> i64 {
    // truncamento em precisão simples; NaN vira 0
    (target as f32 * percentage) as i64
}

fn check_channel(channel: usize, channel3_as_carrier: bool) -> OlfactometerResult<()> {
    if channel >= ODOR_CHANNELS {
        return Err(OlfactometerError::InvalidChannel(channel));
    }
    if channel == 3 && channel3_as_carrier {
        return Err(OlfactometerError::ChannelIsCarrier);
    }
    Ok(())
}

fn check_percentage(channel: usize, value: f64) -> OlfactometerResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(OlfactometerError::InvalidPercentage { channel, value });
    }
    Ok(())
}

fn flatten(result: OlfactometerResult<Vec<HarpMessage>>) -> Vec<OlfactometerResult<HarpMessage>> {
    match result {
        Ok(messages) => messages.into_iter().map(Ok).collect(),
        Err(err) => vec![Err(err)],
    }
}
