use bdui_bindings::{transpile, Engine, IterationFrame, Scope};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::Level;

/// Resolve bindings, apply patches and try out expressions from the shell.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a reference (`${a.b}`, `text ${expr}`, `a.b`) against a context
    Resolve {
        reference: String,
        /// Context document (JSON)
        #[arg(long, default_value = "{}")]
        context: String,
        /// The binding's own fallback value (JSON, or a bare string)
        #[arg(long)]
        value: Option<String>,
        /// Caller fallback (JSON, or a bare string)
        #[arg(long)]
        fallback: Option<String>,
        /// Iteration stack, outermost first (JSON array of frames)
        #[arg(long)]
        frames: Option<String>,
    },
    /// Apply a patch and print the next context
    Patch {
        #[arg(long)]
        context: String,
        #[arg(long)]
        patch: String,
        /// Context that bindings inside the patch resolve against
        #[arg(long)]
        source: Option<String>,
        /// Print the step trace along with the result
        #[arg(long)]
        trace: bool,
    },
    /// Rewrite a Python-flavoured expression into its JavaScript form
    Transpile { expr: String },
    /// Evaluate an expression against a scope object
    Eval {
        expr: String,
        #[arg(long, default_value = "{}")]
        scope: String,
    },
}

fn parse_json(label: &str, raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid {label} JSON: {e}");
            std::process::exit(1);
        }
    }
}

// Fallbacks accept bare strings for convenience.
fn parse_lenient(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_value(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("Cannot render result: {e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let engine = Engine::default();

    match args.command {
        Command::Resolve { reference, context, value, fallback, frames } => {
            let context = parse_json("context", &context);
            let mut binding = serde_json::json!({ "reference": reference });
            if let Some(v) = value.as_deref() {
                binding["value"] = parse_lenient(v);
            }
            let fallback = fallback.as_deref().map(parse_lenient);
            let frames: Vec<IterationFrame> = match frames {
                Some(raw) => match serde_json::from_value(parse_json("frames", &raw)) {
                    Ok(f) => f,
                    Err(e) => {
                        eprintln!("Invalid frames: {e}");
                        std::process::exit(1);
                    }
                },
                None => Vec::new(),
            };
            match engine.resolve(&binding, &context, fallback.as_ref(), &frames) {
                Some(out) => print_value(&out),
                None => println!("undefined"),
            }
        }
        Command::Patch { context, patch, source, trace } => {
            let context = parse_json("context", &context);
            let patch = parse_json("patch", &patch);
            let source = source.as_deref().map(|s| parse_json("source", s));
            if trace {
                let (next, steps) = engine.apply_patch_traced(&context, &patch, source.as_ref());
                print_value(&serde_json::json!({ "context": next, "trace": steps }));
            } else {
                print_value(&engine.apply_patch(&context, &patch, source.as_ref()));
            }
        }
        Command::Transpile { expr } => println!("{}", transpile(&expr)),
        Command::Eval { expr, scope } => {
            let scope_value = parse_json("scope", &scope);
            let scope = Scope::new(&scope_value);
            match engine.try_evaluate(&expr, &scope) {
                Ok(Some(out)) => print_value(&out),
                Ok(None) => println!("undefined"),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
