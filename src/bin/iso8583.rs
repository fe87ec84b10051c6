//! `iso8583` — CLI surface over the codec: `parse`, `build`, `validate`,
//! `generate`. A thin collaborator, not where the domain complexity
//! lives (see `spec.md` §1); it only calls the library's public
//! operations and the schema registry.
//!
//! Exit codes: 0 success, 1 parse failure, 2 validation failure,
//! 3 build failure, 4 I/O / file-not-found.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use iso8583_codec::{
    build, parse, validate, BuildError, FieldDefinition, FieldValue, Message, MessageBuilder,
    Network, Version,
};
use serde_json::Value as Json;

#[derive(Parser)]
#[command(name = "iso8583")]
#[command(about = "Parse, build, and validate ISO 8583 financial messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a wire message into a structured view.
    Parse(ParseArgs),
    /// Build a wire message from a JSON field map.
    Build(BuildArgs),
    /// Validate a wire message or a JSON field map, reporting every diagnostic.
    Validate(ValidateArgs),
    /// Emit one of a small set of canonical sample messages.
    Generate(GenerateArgs),
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Raw,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum NetworkArg {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Jcb,
    Unionpay,
}

impl From<NetworkArg> for Network {
    fn from(n: NetworkArg) -> Network {
        match n {
            NetworkArg::Visa => Network::Visa,
            NetworkArg::Mastercard => Network::Mastercard,
            NetworkArg::Amex => Network::Amex,
            NetworkArg::Discover => Network::Discover,
            NetworkArg::Jcb => Network::Jcb,
            NetworkArg::Unionpay => Network::Unionpay,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum VersionArg {
    #[value(name = "1987")]
    V1987,
    #[value(name = "1993")]
    V1993,
    #[value(name = "2003")]
    V2003,
}

impl From<VersionArg> for Version {
    fn from(v: VersionArg) -> Version {
        match v {
            VersionArg::V1987 => Version::V1987,
            VersionArg::V1993 => Version::V1993,
            VersionArg::V2003 => Version::V2003,
        }
    }
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Wire message text, or "-" to read from stdin.
    input: String,
    #[arg(long, value_enum)]
    network: Option<NetworkArg>,
    #[arg(long, value_enum, default_value = "1987")]
    version: VersionArg,
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Path to a JSON field map, or "-" for stdin.
    input: PathBuf,
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Wire message text, JSON field map path, or "-" for stdin.
    input: String,
    #[arg(long, value_enum)]
    network: Option<NetworkArg>,
    #[arg(long, value_enum, default_value = "1987")]
    version: VersionArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Template {
    /// S1: minimal authorization request.
    Auth,
    /// A reversal advice for the auth template.
    Reversal,
    /// A network management (echo) message.
    NetworkMgmt,
}

#[derive(clap::Args)]
struct GenerateArgs {
    template: Template,
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

/// I/O helpers route through `anyhow` (as `decode_pcap`'s own `main` does):
/// a read failure is an I/O error (exit code 4), distinct from the
/// parse/build/validate failures the rest of the CLI reports directly.
fn read_input(arg: &str) -> anyhow::Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        Ok(buf.trim().to_string())
    } else {
        Ok(arg.trim().to_string())
    }
}

fn read_file_or_stdin(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
    }
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err(format!("odd-length hex value {hex:?}"));
    }
    let chars: Vec<char> = hex.chars().collect();
    let mut out = Vec::with_capacity(chars.len() / 2);
    for pair in chars.chunks(2) {
        let hi = pair[0].to_digit(16).ok_or_else(|| format!("invalid hex in {hex:?}"))?;
        let lo = pair[1].to_digit(16).ok_or_else(|| format!("invalid hex in {hex:?}"))?;
        out.push(((hi << 4) | lo) as u8);
    }
    Ok(out)
}

fn field_value_to_json(value: &FieldValue) -> Json {
    match value {
        FieldValue::Text(s) => Json::String(s.clone()),
        FieldValue::Binary(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            Json::String(hex)
        }
    }
}

fn json_to_field_value(field: u8, def: &FieldDefinition, value: &Json) -> Result<FieldValue, String> {
    let Some(s) = value.as_str() else {
        return Err(format!("field {field}: expected a JSON string value"));
    };
    if def.data_type == iso8583_codec::DataType::Binary {
        let mut bytes = Vec::with_capacity(s.len() / 2);
        let chars: Vec<char> = s.chars().collect();
        if chars.len() % 2 != 0 {
            return Err(format!("field {field}: odd-length hex value {s:?}"));
        }
        for pair in chars.chunks(2) {
            let hi = pair[0].to_digit(16).ok_or_else(|| format!("field {field}: invalid hex {s:?}"))?;
            let lo = pair[1].to_digit(16).ok_or_else(|| format!("field {field}: invalid hex {s:?}"))?;
            bytes.push(((hi << 4) | lo) as u8);
        }
        Ok(FieldValue::Binary(bytes))
    } else {
        Ok(FieldValue::Text(s.to_string()))
    }
}

fn message_to_json(message: &Message) -> Json {
    let mut fields = serde_json::Map::new();
    let mut numbers: Vec<u8> = message.fields.keys().copied().collect();
    numbers.sort_unstable();
    for n in numbers {
        fields.insert(n.to_string(), field_value_to_json(message.field(n).unwrap()));
    }
    let mut emv = serde_json::Map::new();
    for (tag, value) in message.emv_entries() {
        let hex: String = value.iter().map(|b| format!("{b:02X}")).collect();
        emv.insert(tag.clone(), Json::String(hex));
    }
    let mut top = serde_json::Map::new();
    top.insert("mti".to_string(), Json::String(message.mti.clone()));
    top.insert("bitmap".to_string(), Json::String(message.bitmap.clone()));
    top.insert("version".to_string(), Json::String(message.version.to_string()));
    top.insert(
        "network".to_string(),
        message.network.map(|n| Json::String(n.to_string())).unwrap_or(Json::Null),
    );
    top.insert("fields".to_string(), Json::Object(fields));
    if !emv.is_empty() {
        top.insert("emv".to_string(), Json::Object(emv));
    }
    Json::Object(top)
}

fn print_table(message: &Message) {
    println!("MTI:     {}", message.mti);
    println!("Bitmap:  {}", message.bitmap);
    println!("Version: {}", message.version);
    println!(
        "Network: {}",
        message.network.map(|n| n.to_string()).unwrap_or_else(|| "(undetected)".to_string())
    );
    let mut numbers: Vec<u8> = message.fields.keys().copied().collect();
    numbers.sort_unstable();
    println!("Fields:");
    for n in numbers {
        let value = message.field(n).unwrap();
        let rendered = match value {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Binary(b) => b.iter().map(|byte| format!("{byte:02X}")).collect::<String>(),
        };
        println!("  {n:>3}  {rendered}");
    }
    if !message.emv_entries().is_empty() {
        println!("EMV (field 55):");
        for (tag, value) in message.emv_entries() {
            let hex: String = value.iter().map(|b| format!("{b:02X}")).collect();
            println!("  {tag}  {hex}");
        }
    }
}

fn print_message(message: &Message, format: OutputFormat, wire: Option<&[u8]>) {
    match format {
        OutputFormat::Table => print_table(message),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&message_to_json(message)).unwrap()),
        OutputFormat::Raw => match wire {
            Some(bytes) => println!("{}", String::from_utf8_lossy(bytes)),
            None => println!("{}", String::from_utf8_lossy(&message.raw)),
        },
    }
}

fn run_parse(args: ParseArgs) -> anyhow::Result<ExitCode> {
    let text = read_input(&args.input)?;
    let network = args.network.map(Network::from);
    Ok(match parse(text.as_bytes(), args.version.into(), network) {
        Ok(message) => {
            print_message(&message, args.format, Some(text.as_bytes()));
            ExitCode::from(0)
        }
        Err(err) => {
            eprintln!("parse error: {err}");
            ExitCode::from(1)
        }
    })
}

fn draft_from_json(doc: &Json) -> Result<Message, String> {
    let mti = doc.get("mti").and_then(Json::as_str).ok_or("missing \"mti\" string field")?;
    let version = match doc.get("version").and_then(Json::as_str) {
        Some("1993") => Version::V1993,
        Some("2003") => Version::V2003,
        _ => Version::V1987,
    };
    let network = match doc.get("network").and_then(Json::as_str) {
        Some("VISA") => Some(Network::Visa),
        Some("MASTERCARD") => Some(Network::Mastercard),
        Some("AMEX") => Some(Network::Amex),
        Some("DISCOVER") => Some(Network::Discover),
        Some("JCB") => Some(Network::Jcb),
        Some("UNIONPAY") => Some(Network::Unionpay),
        _ => None,
    };

    let mut builder = MessageBuilder::new(mti);
    builder = builder.version(version);
    if let Some(network) = network {
        builder = builder.network(network);
    }

    if let Some(Json::Object(fields)) = doc.get("fields") {
        let mut entries: Vec<(u8, &Json)> = Vec::new();
        for (k, v) in fields {
            let n: u8 = k.parse().map_err(|_| format!("invalid field number {k:?}"))?;
            entries.push((n, v));
        }
        entries.sort_by_key(|(n, _)| *n);
        for (n, v) in entries {
            let def = iso8583_codec::definition_of(n, version, network)
                .ok_or_else(|| format!("field {n} has no schema definition"))?;
            let value = json_to_field_value(n, &def, v)?;
            builder = builder.field(n, value);
        }
    }

    if let Some(Json::Object(emv)) = doc.get("emv") {
        let mut entries: Vec<iso8583_codec::TlvEntry> = Vec::new();
        for (tag, v) in emv {
            let hex = v.as_str().ok_or_else(|| format!("emv tag {tag}: expected hex string"))?;
            entries.push((tag.clone(), decode_hex(hex).map_err(|e| format!("emv tag {tag}: {e}"))?));
        }
        builder = builder.emv(entries);
    }

    builder.build().map_err(|diags| {
        diags.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("; ")
    })
}

fn run_build(args: BuildArgs) -> anyhow::Result<ExitCode> {
    let text = read_file_or_stdin(&args.input)?;
    let doc: Json = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("build error: invalid JSON: {e}");
            return Ok(ExitCode::from(3));
        }
    };
    let message = match draft_from_json(&doc) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("build error: {e}");
            return Ok(ExitCode::from(3));
        }
    };
    Ok(match build(&message) {
        Ok(wire) => {
            print_message(&message, args.format, Some(&wire));
            ExitCode::from(0)
        }
        Err(BuildError { diagnostics }) => {
            for d in &diagnostics {
                eprintln!("build error: {d}");
            }
            ExitCode::from(3)
        }
    })
}

fn run_validate(args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let text = read_input(&args.input)?;

    let message = if text.trim_start().starts_with('{') {
        let doc: Json = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("validate error: invalid JSON: {e}");
                return Ok(ExitCode::from(1));
            }
        };
        // Build a draft without enforcing validity so every rule still runs below.
        match bare_message_from_json(&doc, args.version.into(), args.network.map(Network::from)) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("validate error: {e}");
                return Ok(ExitCode::from(1));
            }
        }
    } else {
        let network = args.network.map(Network::from);
        match parse(text.as_bytes(), args.version.into(), network) {
            Ok(m) => m,
            Err(err) => {
                eprintln!("parse error: {err}");
                return Ok(ExitCode::from(1));
            }
        }
    };

    let diagnostics = validate(&message);
    Ok(if diagnostics.is_empty() {
        println!("OK: no diagnostics");
        ExitCode::from(0)
    } else {
        for d in &diagnostics {
            println!("{d}");
        }
        ExitCode::from(2)
    })
}

/// Like [`draft_from_json`] but does not reject an invalid draft — used by
/// `validate` so an invalid message still produces the full diagnostic list
/// instead of only the first `BuildError`.
fn bare_message_from_json(doc: &Json, version: Version, network: Option<Network>) -> Result<Message, String> {
    let mti = doc.get("mti").and_then(Json::as_str).unwrap_or("0000");
    let mut message = Message::new(mti, version);
    message.network = network;
    message.network_supplied = network.is_some();
    if let Some(Json::Object(fields)) = doc.get("fields") {
        for (k, v) in fields {
            let n: u8 = k.parse().map_err(|_| format!("invalid field number {k:?}"))?;
            let def = iso8583_codec::definition_of(n, version, network);
            let value = match def {
                Some(def) => json_to_field_value(n, &def, v)?,
                None => FieldValue::Text(v.as_str().unwrap_or_default().to_string()),
            };
            message.set_field(n, value);
        }
    }
    Ok(message)
}

fn canonical_fields() -> BTreeMap<u8, FieldValue> {
    let mut m = BTreeMap::new();
    m.insert(2, FieldValue::Text("4111111111111111".to_string()));
    m.insert(3, FieldValue::Text("000000".to_string()));
    m.insert(4, FieldValue::Text("000000001000".to_string()));
    m.insert(11, FieldValue::Text("123456".to_string()));
    m.insert(14, FieldValue::Text("2512".to_string()));
    m.insert(22, FieldValue::Text("012".to_string()));
    m.insert(24, FieldValue::Text("200".to_string()));
    m.insert(25, FieldValue::Text("00".to_string()));
    m.insert(41, FieldValue::Text("TERM0001".to_string()));
    m.insert(42, FieldValue::Text("MERCHANT123456 ".to_string()));
    m
}

fn run_generate(args: GenerateArgs) -> anyhow::Result<ExitCode> {
    let (mti, extra): (&str, Vec<(u8, FieldValue)>) = match args.template {
        Template::Auth => ("0100", vec![]),
        Template::Reversal => ("0400", vec![(90, FieldValue::Text("0100000001123456".to_string()))]),
        Template::NetworkMgmt => ("0800", vec![(70, FieldValue::Text("001".to_string()))]),
    };
    let mut builder = MessageBuilder::new(mti).network(Network::Visa);
    for (n, v) in canonical_fields() {
        builder = builder.field(n, v);
    }
    for (n, v) in extra {
        builder = builder.field(n, v);
    }
    Ok(match builder.build() {
        Ok(message) => match build(&message) {
            Ok(wire) => {
                print_message(&message, args.format, Some(&wire));
                ExitCode::from(0)
            }
            Err(BuildError { diagnostics }) => {
                for d in &diagnostics {
                    eprintln!("build error: {d}");
                }
                ExitCode::from(3)
            }
        },
        Err(diagnostics) => {
            for d in &diagnostics {
                eprintln!("build error: {d}");
            }
            ExitCode::from(3)
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.cmd {
        Commands::Parse(args) => run_parse(args),
        Commands::Build(args) => run_build(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Generate(args) => run_generate(args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(4)
        }
    }
}
