//! spug command-line renderer.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;

use spug::{Context, Template, TemplateOptions, Value};

static TRACING_INIT: Once = Once::new();

/// Set up logging when `RUST_LOG` is set. `SPUG_LOG_TREE` switches to an
/// indented span tree.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        if std::env::var_os("SPUG_LOG_TREE").is_some() {
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}

#[derive(Default)]
struct Args {
    options: TemplateOptions,
    raw: bool,
    data: Option<PathBuf>,
    dump_tokens: bool,
    dump_chunks: bool,
    template: PathBuf,
}

fn print_usage() {
    eprintln!("Usage: spug [options] <template>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --pretty          Indent block tags");
    eprintln!("  --raw             Do not escape `=` output");
    eprintln!("  --stop-on-error   Abort at the first evaluation error");
    eprintln!("  --data <file>     JSON object whose keys become template variables");
    eprintln!("  --dump-tokens     Print the token tree and exit");
    eprintln!("  --dump-chunks     Print the compiled chunk tree and exit");
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut template = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--pretty" => parsed.options.pretty = true,
            "--raw" => parsed.raw = true,
            "--stop-on-error" => parsed.options.stop_on_error = true,
            "--dump-tokens" => parsed.dump_tokens = true,
            "--dump-chunks" => parsed.dump_chunks = true,
            "--data" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    return Err("missing file after --data".to_owned());
                };
                parsed.data = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option '{flag}'")),
            path if template.is_none() => template = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument '{extra}'")),
        }
        i += 1;
    }
    parsed.template = template.ok_or_else(|| "missing template path".to_owned())?;
    Ok(parsed)
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {e}", path.display()))
}

fn load_data(path: Option<&Path>) -> Result<Value, String> {
    let Some(path) = path else {
        return Ok(Value::empty_dict());
    };
    let json: serde_json::Value = serde_json::from_str(&read(path)?)
        .map_err(|e| format!("invalid JSON in '{}': {e}", path.display()))?;
    let data = Value::from(json);
    if !data.is_dict() {
        return Err(format!("'{}' must hold a JSON object", path.display()));
    }
    Ok(data)
}

/// Resolve an include target next to the including template; a target
/// without an extension also tries `.pug`.
fn include_path(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if path.extension().is_none() && !path.exists() {
        return path.with_extension("pug");
    }
    path
}

fn run(args: &Args) -> Result<(), String> {
    let source = read(&args.template)?;

    if args.dump_tokens {
        let tokens = spug_lexer::lex(&source).map_err(|e| e.to_string())?;
        print!("{}", tokens.describe());
        return Ok(());
    }

    let template = Template::compile_with(&source, &args.options, &mut |message| {
        eprintln!("{message}");
    })
    .map_err(|_| format!("failed to compile '{}'", args.template.display()))?;

    if args.dump_chunks {
        print!("{}", template.describe());
        return Ok(());
    }

    let data = load_data(args.data.as_deref())?;
    let mut ctx = Context::new();
    ctx.load_defaults();
    ctx.set_escape_output(!args.raw);
    ctx.set_error_callback(|message| eprintln!("{message}"));
    if let Value::Dict(entries) = &data {
        for (name, value) in entries {
            ctx.set_ref(name, value);
        }
    }

    let dir = args
        .template
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let options = args.options;
    ctx.set_include_callback(move |name, ctx, out, _| {
        let path = include_path(&dir, name);
        let Ok(source) = fs::read_to_string(&path) else {
            return false;
        };
        match Template::compile_with(&source, &options, &mut |message| eprintln!("{message}")) {
            Ok(included) => included.run(ctx, out).is_ok(),
            Err(_) => false,
        }
    });

    let output = template.render(&mut ctx).map_err(|e| e.to_string())?;
    print!("{output}");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
