//! uartctl - Host tool for the serial link
//!
//! Commands:
//! - `uartctl baud <rate>...` - UBRR divisors, U2X mode and rate error
//! - `uartctl frame <body>` - Frame a spindle command with its LRC
//! - `uartctl verify <frame>` - Check a received frame
//! - `uartctl loopback <text>` - Push text through a simulated port

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use spindle_link::{encode_frame, send_frame, verify_frame, FRAME_OVERHEAD};
use uart_driver::sim::SimUsart;
use uart_driver::{BaudSetting, RxEvent, SerialPort, SerialWrite, UartConfig, DEFAULT_CPU_HZ};

#[derive(Parser)]
#[command(name = "uartctl")]
#[command(version)]
#[command(about = "USART baud planning, spindle framing and loopback", long_about = None)]
struct Cli {
    /// CPU clock in Hz
    #[arg(long, global = true, default_value_t = DEFAULT_CPU_HZ)]
    cpu_hz: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the divisor for one or more baud rates
    Baud {
        /// Baud rates
        #[arg(required = true)]
        rates: Vec<u32>,
    },

    /// Frame a command body such as ":01030101"
    Frame {
        body: String,
    },

    /// Verify a frame; the trailing CR LF is optional
    Verify {
        frame: String,
    },

    /// Feed text into a simulated receive path and echo it back out
    Loopback {
        text: String,

        /// Baud rate to open the port at
        #[arg(short, long, default_value_t = 115_200)]
        baud: u32,

        /// Send this command frame before echoing
        #[arg(long)]
        command: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Baud { rates } => show_baud(cli.cpu_hz, &rates),
        Commands::Frame { body } => show_frame(&body)?,
        Commands::Verify { frame } => check_frame(&frame)?,
        Commands::Loopback {
            text,
            baud,
            command,
        } => loopback(cli.cpu_hz, baud, &text, command.as_deref())?,
    }

    Ok(())
}

fn show_baud(cpu_hz: u32, rates: &[u32]) {
    println!("{} clock: {} Hz", "⚙".cyan(), cpu_hz);
    println!("{:>10}  {:>7}  {:>4}  {:>10}  {:>7}", "baud", "divisor", "u2x", "actual", "error");

    for &baud in rates {
        match BaudSetting::compute(cpu_hz, baud) {
            Ok(setting) => {
                let error = setting.error_permille(cpu_hz);
                let error_text = format!("{:+.1}%", error as f64 / 10.0);
                let error_text = if error.abs() > 20 {
                    error_text.yellow()
                } else {
                    error_text.normal()
                };
                println!(
                    "{:>10}  {:>7}  {:>4}  {:>10}  {:>7}",
                    baud,
                    setting.divisor,
                    if setting.double_speed { "yes" } else { "no" },
                    setting.actual_baud(cpu_hz),
                    error_text
                );
            }
            Err(e) => println!("{:>10}  {}", baud, e.to_string().red()),
        }
    }
}

fn show_frame(body: &str) -> anyhow::Result<()> {
    let mut out = vec![0u8; body.len() + FRAME_OVERHEAD];
    let len = encode_frame(body.as_bytes(), &mut out)
        .with_context(|| format!("Cannot frame '{}'", body))?;

    println!("{} {}", "✓".green(), escape(&out[..len]));
    println!("  lrc: {}", String::from_utf8_lossy(&out[len - 4..len - 2]).bold());
    Ok(())
}

fn check_frame(frame: &str) -> anyhow::Result<()> {
    let mut bytes = frame.as_bytes().to_vec();
    if !bytes.ends_with(b"\r\n") {
        bytes.extend_from_slice(b"\r\n");
    }

    match verify_frame(&bytes) {
        Ok(body) => {
            println!("{} valid, body {}", "✓".green(), escape(body));
            Ok(())
        }
        Err(e) => anyhow::bail!("{} {}", "✗".red(), e),
    }
}

fn loopback(cpu_hz: u32, baud: u32, text: &str, command: Option<&str>) -> anyhow::Result<()> {
    let sim = SimUsart::new();
    let mut port: SerialPort<&SimUsart> = SerialPort::new(&sim, UartConfig::new(cpu_hz));
    let config = port.config();
    let (mut uart, mut rx) = port.split();

    let setting = uart
        .begin(baud)
        .with_context(|| format!("Cannot open port at {} baud", baud))?;
    log::info!(
        "port open at {} baud (divisor {}, u2x {}, clock {} Hz)",
        baud,
        setting.divisor,
        setting.double_speed,
        config.cpu_hz
    );

    if let Some(body) = command {
        send_frame(&mut uart, body.as_bytes()).with_context(|| format!("Cannot send '{}'", body))?;
    }

    let mut dropped = 0usize;
    for &byte in text.as_bytes() {
        sim.inject(byte);
        if let RxEvent::Dropped(_) = rx.on_interrupt() {
            dropped += 1;
        }
    }

    let received = uart.available();
    while let Some(byte) = uart.read() {
        uart.write_byte(byte);
    }
    uart.end();

    let wire: Vec<u8> = sim.transmitted().collect();
    println!("{} received {} byte(s), dropped {}", "⇄".cyan(), received, dropped);
    println!("  tx: {}", escape(&wire));
    Ok(())
}

fn escape(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_control_bytes() {
        assert_eq!(escape(b":01FA\r\n"), ":01FA\\r\\n");
    }

    #[test]
    fn test_cli_parses_loopback() {
        let cli = Cli::try_parse_from(["uartctl", "--cpu-hz", "20000000", "loopback", "hi", "-b", "9600"])
            .unwrap();
        assert_eq!(cli.cpu_hz, 20_000_000);
        assert!(matches!(cli.command, Commands::Loopback { baud: 9600, .. }));
    }
}
