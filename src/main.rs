use combsim::*;
use combsim::literal::parse_literal;

use clap::Parser;
use log::*;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    filename: String,

    /// Sets an input, eg. `--set a=8'h3F`. Inputs that are not set are zero.
    #[arg(long = "set", value_name = "NAME=LITERAL", value_parser = parse_binding)]
    set: Vec<(String, String)>,

    /// The module to simulate. Defaults to the first module in the file.
    #[arg(long)]
    top: Option<String>,

    /// How to print values: bin, dec, or hex.
    #[arg(long, default_value = "dec")]
    radix: Radix,

    #[arg(long, default_value_t = false)]
    json: bool,

    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn parse_binding(s: &str) -> Result<(String, String), String> {
    let (name, literal) = s.split_once('=').ok_or_else(|| format!("Expected NAME=LITERAL but found `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Missing input name in `{s}`"));
    }
    parse_literal(literal).map_err(|e| e.to_string())?;
    Ok((name.to_string(), literal.trim().to_string()))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let builder = CstBuilder::new();
    let mut diagnostics = Diagnostics::new();

    let module = match load_module_from_file(&builder, &args.filename, args.top.as_deref(), &mut diagnostics) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("{}: {e}", args.filename);
            std::process::exit(1);
        },
    };

    let inputs = bind_inputs(&module, &args.set)?;
    let env = match simulate(&module, &inputs, &mut diagnostics) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("{}: {e}", args.filename);
            std::process::exit(1);
        },
    };

    if args.json {
        print_json(&module, &env, &diagnostics, args.radix)?;
    } else {
        print_text(&module, &env, args.radix);
        let warnings = diagnostics.warnings().count();
        if warnings > 0 {
            eprintln!("{warnings} warning(s)");
        }
    }
    Ok(())
}

/// Unsized decimal literals take the width of the input they are bound to.
fn bind_inputs(module: &Module, bindings: &[(String, String)]) -> anyhow::Result<Env> {
    let mut env = Env::new();
    for (name, literal) in bindings {
        let mut value = parse_literal(literal)?;
        if let Some(input) = module.input(name) {
            if !literal.contains('\'') && value.width() <= input.width {
                debug!("Extending {name} = {literal} to width {}", input.width);
                value = value.resize(input.width);
            }
        }
        env.insert(name.clone(), value);
    }
    Ok(env)
}

fn render(value: &Value, radix: Radix) -> String {
    match radix {
        Radix::Binary => format!("{value:b}"),
        Radix::Decimal => format!("{value}"),
        Radix::Hex => format!("{value:x}"),
    }
}

fn print_text(module: &Module, env: &Env, radix: Radix) {
    println!("module {}", module.name);
    for input in &module.inputs {
        if let Some(value) = env.get(&input.name) {
            println!("  input  {} = {}", input.name, render(value, radix));
        }
    }
    for wire in &module.wires {
        if let Some(value) = env.get(&wire.name) {
            let marker = if module.is_output(&wire.name) { "output" } else { "wire  " };
            println!("  {marker} {} = {}", wire.name, render(value, radix));
        }
    }
    for output in &module.outputs {
        if !env.contains_key(output) {
            println!("  output {output} is undefined");
        }
    }
}

fn print_json(module: &Module, env: &Env, diagnostics: &Diagnostics, radix: Radix) -> anyhow::Result<()> {
    let inputs: serde_json::Map<String, serde_json::Value> = module
        .inputs
        .iter()
        .filter_map(|input| env.get(&input.name).map(|value| (input.name.clone(), json!(render(value, radix)))))
        .collect();

    let wires: Vec<serde_json::Value> = module
        .wires
        .iter()
        .map(|wire| {
            json!({
                "name": wire.name,
                "width": wire.width,
                "expr": wire.value.to_string(),
                "deps": wire.deps,
                "value": env.get(&wire.name).map(|value| render(value, radix)),
            })
        })
        .collect();

    let diagnostics: Vec<serde_json::Value> = diagnostics
        .iter()
        .map(|diagnostic| {
            json!({
                "severity": diagnostic.severity.to_string(),
                "message": diagnostic.message,
                "loc": diagnostic.loc.as_ref().map(|loc| loc.to_string()),
            })
        })
        .collect();

    let output = json!({
        "module": module.name,
        "inputs": inputs,
        "wires": wires,
        "outputs": module.outputs,
        "diagnostics": diagnostics,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_logging(debug: bool) {
    use chrono::{DateTime, Utc};

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let now: DateTime<Utc> = Utc::now();
            out.finish(format_args!(
                "[{} {} {}] {}",
                now.format("%Y-%m-%dT%H:%M:%S%.fZ"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let level = std::env::var("LEVEL").unwrap_or_default();

    if debug || level == "DEBUG" {
        dispatch = dispatch.level(log::LevelFilter::Debug);
    } else {
        dispatch = dispatch.level(log::LevelFilter::Warn);
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Could not initialize logging: {e}");
    }
}
