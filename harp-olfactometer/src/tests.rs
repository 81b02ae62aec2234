//! Testes do módulo harp-olfactometer

use super::*;
use harp_core::core_registers::WhoAmI;
use harp_core::prelude::*;
use harp_core::FrameDecoder;
use crate::registers::*;
use crate::types::*;

fn loopback() -> LoopbackTransport {
    LoopbackTransport::new()
        .with_register::<WhoAmI>(&WHO_AM_I)
        .with_register::<EnableFlow>(&EnableFlag::Disable)
}

// ═══════════════════════════════════════════════════════════════════════════════
// MISTURA NO DISPOSITIVO
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_configure_odor_mix_on_device() {
    let mut olfactometer = Olfactometer::open(loopback()).unwrap();
    let mix = ConfigureOdorMix::new()
        .with_channel3_as_carrier(true)
        .with_percentage(1, 0.4)
        .unwrap();
    olfactometer.configure_odor_mix(&mix).unwrap();

    let transport = olfactometer.into_inner();
    let sent: Vec<u8> = transport.sent().iter().map(|m| m.address()).collect();
    assert_eq!(sent, vec![WhoAmI::ADDRESS, ChannelsTargetFlow::ADDRESS, OdorValveState::ADDRESS]);

    let flows = transport.register::<ChannelsTargetFlow>().unwrap().unwrap();
    assert_eq!(flows.to_array(), [0.0, 40.0, 0.0, 100.0, 60.0]);
    let valves = transport.register::<OdorValveState>().unwrap().unwrap();
    assert_eq!(valves, OdorValves::VALVE1 | OdorValves::VALVE3);
}

#[test]
fn test_oversubscribed_mix_reaches_device() {
    let mut olfactometer = Olfactometer::open(loopback()).unwrap();
    let mut mix = ConfigureOdorMix::new();
    for channel in 0..4 {
        mix.set_percentage(channel, 0.5).unwrap();
    }
    olfactometer.configure_odor_mix(&mix).unwrap();

    let transport = olfactometer.into_inner();
    let flows = transport.register::<ChannelsTargetFlow>().unwrap().unwrap();
    assert_eq!(flows.to_array(), [50.0, 50.0, 50.0, 50.0, -100.0]);
}

#[test]
fn test_rejected_write_surfaces_device_error() {
    let transport = loopback().reject_writes(OdorValveState::ADDRESS);
    let mut olfactometer = Olfactometer::open(transport).unwrap();
    let err = olfactometer
        .configure_odor_mix(&ConfigureOdorMix::new())
        .unwrap_err();
    assert!(matches!(
        err,
        OlfactometerError::Harp(HarpError::DeviceError { address: 90, .. })
    ));
}

#[test]
fn test_configure_channel_on_device() {
    let mut olfactometer = Olfactometer::open(loopback()).unwrap();
    let mix = ConfigureOdorMix::new();
    olfactometer.configure_channel(&mix, 0, 0.75).unwrap();
    assert!(olfactometer.configure_channel(&mix, 9, 0.5).is_err());

    let transport = olfactometer.into_inner();
    let flows = transport.register::<ChannelsTargetFlow>().unwrap().unwrap();
    assert_eq!(flows.channel0, 75.0);
    assert_eq!(flows.channel4, 25.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTOS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_events_collected_during_commands() {
    let mut transport = loopback();
    transport.push_event(
        Channel2ActualFlow::from_timestamped_payload(0.5, MessageType::Event, &42.0).unwrap(),
    );
    transport.push_event(
        DI0State::from_timestamped_payload(0.6, MessageType::Event, &DigitalState::High).unwrap(),
    );

    let mut olfactometer = Olfactometer::open(transport).unwrap();
    let events: Vec<_> = olfactometer
        .drain_events()
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(
        events,
        vec![
            OlfactometerPayload::Channel2ActualFlow(42.0),
            OlfactometerPayload::DI0State(DigitalState::High),
        ]
    );
}

#[test]
fn test_flowmeter_stream_from_wire() {
    let mut wire = Vec::new();
    for i in 0..4i16 {
        let msg = Flowmeter::from_timestamped_payload(
            f64::from(i) * 0.01,
            MessageType::Event,
            &[i, i + 1, i + 2, i + 3, i + 4],
        )
        .unwrap();
        wire.extend_from_slice(&msg.to_bytes());
        let flow = Channel0ActualFlow::from_timestamped_payload(0.0, MessageType::Event, &1.0).unwrap();
        wire.extend_from_slice(&flow.to_bytes());
    }

    let mut decoder = FrameDecoder::new();
    decoder.extend(&wire);
    let readings: Vec<_> = std::iter::from_fn(|| decoder.next_frame())
        .map(|r| r.unwrap())
        .events()
        .parse_timestamped::<Flowmeter>()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(readings.len(), 4);
    assert_eq!(readings[3].value, [3, 4, 5, 6, 7]);
    assert!((readings[2].seconds - 0.02).abs() < 1e-4);
}

#[test]
fn test_every_catalog_entry_decodes_its_own_message() {
    for info in REGISTERS {
        let size = info.payload_type.element_size() * info.length;
        // 0 é válido para todos os enums e flags
        let msg = HarpMessage::new(MessageType::Write, info.address, info.payload_type, &vec![0; size]).unwrap();
        let decoded = OlfactometerPayload::decode(&msg).unwrap();
        assert_eq!(decoded.address(), info.address);
        assert_eq!(decoded.name(), info.name);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURAÇÃO
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mix_from_json_config() {
    let config = OdorMixConfig::from_json(
        r#"{ "target_odor_flow": 60, "percentages": [0.5, 0.25, 0.0, 0.0] }"#,
    )
    .unwrap();
    let mix = ConfigureOdorMix::from_config(&config).unwrap();
    assert_eq!(mix.flows(), OdorMixFlows { channels: [30, 15, 0, 0], carrier: 15 });
}

#[test]
fn test_builder_with_mix_and_events() {
    let mut olfactometer = Olfactometer::open(loopback()).unwrap();
    CommandBuilder::new()
        .write::<EnableEvents>(&(OlfactometerEvents::FLOWMETER | OlfactometerEvents::CHANNEL_ACTUAL_FLOW))
        .and_then(|b| b.odor_mix(&ConfigureOdorMix::new().with_percentage(2, 0.1)?))
        .and_then(|b| b.write::<EnableFlow>(&EnableFlag::Enable))
        .unwrap()
        .send(olfactometer.device())
        .unwrap();

    assert!(olfactometer.flow_enabled().unwrap());
    let events = olfactometer.read::<EnableEvents>().unwrap();
    assert_eq!(events.bits(), 0x05);
}
