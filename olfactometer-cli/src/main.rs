//! Olfactometer - command-line tools
//! Odor mix messages, frame decoding, register catalog and EEPROM images

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::*;
use harp_core::prelude::*;
use harp_core::core_registers::WhoAmI;
use harp_core::FrameDecoder;
use harp_olfactometer::prelude::*;
use harp_olfactometer::{CalibrationTable, EepromImage, register_info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "olfactometer")]
#[command(author = "Silvano Neto <dev@silvanoneto.com>")]
#[command(version = "2026.1.16")]
#[command(about = "Harp Olfactometer tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the odor mix writes for all four channels
    Mix {
        #[command(flatten)]
        mix: MixArgs,

        /// Channel percentages in [0, 1], comma separated (channel 0 first)
        #[arg(short, long, value_delimiter = ',', num_args = 1..=4)]
        percentages: Vec<f32>,
    },

    /// Compute the odor mix writes with a single active channel
    Channel {
        #[command(flatten)]
        mix: MixArgs,

        /// Odor channel (0..=3)
        #[arg(value_name = "INDEX")]
        index: usize,

        /// Concentration in [0, 1]
        #[arg(value_name = "CONCENTRATION")]
        concentration: f64,
    },

    /// Decode Harp frames from hex bytes
    Decode {
        /// Hex bytes, whitespace allowed (e.g. "02 08 5C FF 44 ...")
        #[arg(value_name = "HEX", required = true, num_args = 1..)]
        hex: Vec<String>,
    },

    /// List the Olfactometer registers
    Registers {
        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Show only this address
        #[arg(short, long)]
        address: Option<u8>,
    },

    /// Generate the calibration EEPROM image (Intel HEX) from a CSV table
    Eeprom {
        /// Calibration CSV file
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// Device serial number
        #[arg(short, long)]
        serial: u16,

        /// Calibration temperature (°C)
        #[arg(short, long)]
        temperature: u8,

        /// Output .hex file (stdout when omitted)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct MixArgs {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Odor flow shared by the odor channels (ml/min)
    #[arg(long)]
    target_odor_flow: Option<i32>,

    /// Total output flow (ml/min)
    #[arg(long)]
    target_total_flow: Option<i32>,

    /// Use channel 3 as carrier
    #[arg(long)]
    carrier: bool,

    /// Send the writes to an in-memory device and show its replies
    #[arg(long)]
    simulate: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("OLFACTOMETER_LOG")
                .unwrap_or_else(|_| "olfactometer=info,harp_olfactometer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Mix { mix, percentages } => mix_command(&mix, &percentages),
        Commands::Channel {
            mix,
            index,
            concentration,
        } => channel_command(&mix, index, concentration),
        Commands::Decode { hex } => decode_command(&hex.join(" ")),
        Commands::Registers { json, address } => registers_command(json, address),
        Commands::Eeprom {
            input,
            serial,
            temperature,
            output,
        } => eeprom_command(&input, serial, temperature, output.as_ref()),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

// ============================================================================
// Odor mix
// ============================================================================

fn load_config(args: &MixArgs) -> anyhow::Result<OdorMixConfig> {
    let mut config = match &args.config {
        Some(path) => OdorMixConfig::from_json_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => OdorMixConfig::from_env()?,
    };
    if let Some(flow) = args.target_odor_flow {
        config.target_odor_flow = flow;
    }
    if let Some(flow) = args.target_total_flow {
        config.target_total_flow = flow;
    }
    if args.carrier {
        config.channel3_as_carrier = true;
    }
    Ok(config)
}

fn mix_command(args: &MixArgs, percentages: &[f32]) -> anyhow::Result<()> {
    let mut config = load_config(args)?;
    for (slot, value) in config.percentages.iter_mut().zip(percentages) {
        *slot = *value;
    }
    let mix = ConfigureOdorMix::from_config(&config)?;
    let flows = mix.flows();

    println!(
        "{} odor flow {} ml/min, total {} ml/min{}",
        "Mix".green().bold(),
        mix.target_odor_flow(),
        mix.target_total_flow(),
        if mix.channel3_as_carrier() { ", channel 3 as carrier" } else { "" }
    );
    println!("  channels {:?}  carrier {}", flows.channels, flows.carrier);

    emit(args, &mix.messages()?)
}

fn channel_command(args: &MixArgs, index: usize, concentration: f64) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let mix = ConfigureOdorMix::from_config(&config)?;
    let messages = mix.channel_messages(index, concentration)?;

    println!(
        "{} channel {} at {}",
        "Channel".green().bold(),
        index.to_string().cyan(),
        concentration
    );
    emit(args, &messages)
}

fn emit(args: &MixArgs, messages: &[HarpMessage]) -> anyhow::Result<()> {
    for msg in messages {
        print_message(msg);
    }

    if args.simulate {
        let transport = LoopbackTransport::new().with_register::<WhoAmI>(&WHO_AM_I);
        let mut olfactometer = Olfactometer::open(transport)?;
        olfactometer.device().send_all(messages)?;

        println!("{}", "Device state:".bold());
        for msg in messages {
            let request = HarpCommand::read(msg.address(), msg.payload_type());
            let reply = olfactometer.device().command(&request)?;
            let state = OlfactometerPayload::decode(&reply)?;
            println!("  {} {}", "->".dimmed(), state);
        }
    }
    Ok(())
}

fn print_message(msg: &HarpMessage) {
    let decoded = OlfactometerPayload::decode(msg)
        .map(|p| p.to_string())
        .unwrap_or_else(|_| msg.to_string());
    println!("  {}", decoded.cyan());
    println!("    {}", hex_string(&msg.to_bytes()).dimmed());
}

// ============================================================================
// Frames and registers
// ============================================================================

fn parse_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let digits = digits.trim_start_matches("0x");
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        bail!("invalid hex digit {:?}", bad);
    }
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits");
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair)?;
            u8::from_str_radix(pair, 16).with_context(|| format!("invalid hex byte {:?}", pair))
        })
        .collect()
}

fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_command(text: &str) -> anyhow::Result<()> {
    let bytes = parse_hex(text)?;
    let mut decoder = FrameDecoder::new();
    decoder.extend(&bytes);

    let mut count = 0;
    while let Some(frame) = decoder.next_frame() {
        let msg = frame?;
        count += 1;
        println!("{} {}", "Frame".green().bold(), msg);
        match register_info(msg.address()) {
            Some(_) => match OlfactometerPayload::decode(&msg) {
                Ok(payload) => println!("  {}", payload.to_string().cyan()),
                Err(e) => println!("  {} {}", "warning:".yellow().bold(), e),
            },
            None => println!("  {}", "(core or unknown register)".dimmed()),
        }
    }

    if decoder.discarded() > 0 {
        println!("{} {} bytes discarded", "warning:".yellow().bold(), decoder.discarded());
    }
    if decoder.pending() > 0 {
        println!("{} {} trailing bytes", "warning:".yellow().bold(), decoder.pending());
    }
    if count == 0 {
        bail!("no complete frame found");
    }
    Ok(())
}

fn registers_command(json: bool, address: Option<u8>) -> anyhow::Result<()> {
    let selected: Vec<&RegisterInfo> = match address {
        Some(addr) => vec![register_info(addr).with_context(|| format!("no register at address {}", addr))?],
        None => REGISTERS.iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    println!("{}", "Olfactometer registers".bold());
    for info in selected {
        println!("  {}", info);
    }
    Ok(())
}

// ============================================================================
// EEPROM
// ============================================================================

fn eeprom_command(input: &PathBuf, serial: u16, temperature: u8, output: Option<&PathBuf>) -> anyhow::Result<()> {
    let table = CalibrationTable::from_csv_file(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let image = EepromImage::generate(&table, serial, temperature)?;

    match output {
        Some(path) => {
            image.save(path)?;
            eprintln!("{} {}", "   Created".green().bold(), path.display().to_string().cyan());
        }
        None => print!("{}", image.to_intel_hex()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("01 04 20ff 01 25").unwrap(), vec![1, 4, 0x20, 0xFF, 1, 0x25]);
        assert!(parse_hex("0").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("aé1").is_err());
        assert_eq!(parse_hex("0x0A ff").unwrap(), vec![0x0A, 0xFF]);
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(hex_string(&[0x01, 0xAB]), "01 AB");
    }

    #[test]
    fn cli_parses_mix() {
        let cli = Cli::try_parse_from([
            "olfactometer",
            "mix",
            "--percentages",
            "0.1,0.2",
            "--carrier",
        ])
        .unwrap();
        match cli.command {
            Commands::Mix { mix, percentages } => {
                assert!(mix.carrier);
                assert_eq!(percentages, vec![0.1, 0.2]);
            }
            _ => panic!("expected mix"),
        }
    }

    #[test]
    fn cli_parses_channel() {
        let cli = Cli::try_parse_from(["olfactometer", "channel", "2", "0.29"]).unwrap();
        match cli.command {
            Commands::Channel { index, concentration, .. } => {
                assert_eq!(index, 2);
                assert_eq!(concentration, 0.29f64);
            }
            _ => panic!("expected channel"),
        }
    }
}
