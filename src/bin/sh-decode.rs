use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use superh_rs::{classify, decode, lift, render, ControlFlowInfo, IlOp, Token};

#[derive(Parser, Debug)]
#[command(author, version, about = "Decode a single SuperH instruction from hex bytes")]
struct Opts {
    /// Instruction bytes in memory order, e.g. `0c60` or `0c 60`
    #[arg(value_name = "HEX")]
    hex: String,
    /// Address the instruction is decoded at (hex or dec)
    #[arg(short, long, default_value = "0x5000", value_parser = parse_u32)]
    addr: u32,
    /// Also print the lifted IL
    #[arg(long)]
    il: bool,
    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    anyhow::ensure!(digits.len() % 2 == 0, "odd number of hex digits");
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).with_context(|| format!("bad hex byte at {i}")))
        .collect()
}

#[derive(Debug, Serialize)]
struct Report {
    addr: u32,
    text: String,
    tokens: Vec<Token>,
    info: ControlFlowInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    il: Option<Vec<IlOp>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let bytes = parse_hex_bytes(&opts.hex)?;
    anyhow::ensure!(bytes.len() >= 2, "need at least two bytes");

    let Some(d) = decode(&bytes, opts.addr) else {
        anyhow::bail!("no instruction matches {} at {:#010x}", opts.hex, opts.addr);
    };
    let (tokens, text) = render(&d);
    let report = Report {
        addr: opts.addr,
        text,
        tokens,
        info: classify(&d),
        il: opts.il.then(|| lift(&d)),
    };

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:#010x}: {}", report.addr, report.text);
    println!("  length : {}", report.info.length);
    println!("  delay  : {}", report.info.delay_slot);
    for e in &report.info.edges {
        match e.target {
            Some(t) => println!("  edge   : {:?} -> {t:#010x}", e.kind),
            None => println!("  edge   : {:?}", e.kind),
        }
    }
    if let Some(il) = &report.il {
        for op in il {
            println!("  il     : {op:?}");
        }
    }
    Ok(())
}
