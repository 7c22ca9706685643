use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use std::fmt::Write as _;
use std::path::Path;

use superh_disasm::{edges, is_mapped, load_raw_bin, sweep, Image, Line};

#[derive(Parser, Debug)]
#[command(author, version, about = "SuperH disassembler CLI", long_about = None)]
struct Cli {
    /// Load address for the binary in target address space (hex or dec)
    #[arg(long, default_value = "0", value_parser = parse_u32)]
    base: u32,
    /// Skip N bytes at start of file before loading
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Input binary path
    #[arg(value_name = "BINFILE")]
    input: String,
    /// Limit bytes loaded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded segments (a single segment for raw .bin)
    Sections,
    /// Disassemble a range [start, end)
    Range {
        /// Start address (hex or dec), defaults to the segment base
        start: Option<String>,
        /// End address (hex or dec, exclusive), defaults to the segment end
        end: Option<String>,
        /// Show instruction bytes
        #[arg(long)]
        show_bytes: bool,
        /// Show lifted IL under each instruction
        #[arg(long)]
        il: bool,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// List per-instruction control-flow edges in a range
    Edges {
        start: Option<String>,
        end: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn resolve_range(img: &Image, start: Option<String>, end: Option<String>) -> Result<(u32, u32)> {
    let seg = img.segments.first();
    let start = match start {
        Some(s) => parse_u32(&s)?,
        None => seg.map_or(0, |s| s.base),
    };
    let end = match end {
        Some(e) => parse_u32(&e)?,
        None => seg.map_or(0, |s| s.end()),
    };
    anyhow::ensure!(end >= start, "end must be >= start");
    anyhow::ensure!(start == end || is_mapped(img, start), "start {start:#010x} is not in any loaded segment");
    Ok((start, end))
}

fn emit(out: Option<String>, buf: String) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, buf)?,
        None => print!("{buf}"),
    }
    Ok(())
}

fn render_listing(lines: &[Line], show_bytes: bool) -> String {
    let mut buf = String::new();
    for l in lines {
        let _ = write!(buf, "{:#010x}: ", l.addr);
        if show_bytes {
            for b in &l.bytes {
                let _ = write!(buf, "{b:02x} ");
            }
            // pad 16-bit lines to line up with 32-bit ones
            for _ in l.bytes.len()..4 {
                buf.push_str("   ");
            }
            buf.push_str("  ");
        }
        let _ = writeln!(buf, "{}", l.text);
        if let Some(il) = &l.il {
            for op in il {
                let _ = writeln!(buf, "            {op:?}");
            }
        }
    }
    buf
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let img = load_raw_bin(Path::new(&cli.input), cli.base, cli.skip, cli.len)?;

    match cli.cmd {
        Command::Sections => {
            println!("{:<10} {:<12} {:<12} {:<6} {:<6}", "name", "start", "end", "perms", "kind");
            for s in &img.segments {
                println!("{:<10} {:#010x}   {:#010x}   {:<6} {:<6}", s.name, s.base, s.end(), s.perms, s.kind);
            }
        }
        Command::Range { start, end, show_bytes, il, format, out } => {
            let (start, end) = resolve_range(&img, start, end)?;
            let lines = sweep(&img, start, end, il);
            let buf = match format {
                OutputFormat::Text => render_listing(&lines, show_bytes),
                OutputFormat::Json => serde_json::to_string_pretty(&lines)? + "\n",
            };
            emit(out, buf)?;
        }
        Command::Edges { start, end, format, out } => {
            let (start, end) = resolve_range(&img, start, end)?;
            let lines = sweep(&img, start, end, false);
            let edges = edges(&lines);
            let buf = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&edges)? + "\n",
                OutputFormat::Text => {
                    let mut buf = String::new();
                    for e in &edges {
                        let to = e.to.map_or_else(|| "?".to_string(), |t| format!("{t:#010x}"));
                        let delay = if e.delay_slot { " (delayed)" } else { "" };
                        let _ = writeln!(buf, "{:#010x} -> {to} {:?}{delay}", e.from, e.kind);
                    }
                    buf
                }
            };
            emit(out, buf)?;
        }
    }

    Ok(())
}
