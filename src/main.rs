use std::{env, process::ExitCode};

use keyscript::{
    bytecode::{Program, disassemble},
    runtime::{
        collation::CaseSense,
        config::RuntimeConfig,
        engine::Engine,
        error::{ErrorSink, RuntimeError},
        leak_detector,
    },
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KEYSCRIPT_LOG";

/// Prints uncaught errors regardless of the log filter.
struct StderrSink;

impl ErrorSink for StderrSink {
    fn report(&self, error: &RuntimeError) {
        eprintln!("{}", error.render());
    }
}

fn main() -> ExitCode {
    let mut args: Vec<String> = env::args().collect();
    let verbose = take_flag(&mut args, "--verbose");
    let leak_detector = take_flag(&mut args, "--leak-detector");
    let trace = take_flag(&mut args, "--trace");
    let config_path = match take_option(&mut args, "--config") {
        Ok(value) => value,
        Err(message) => return usage_error(&message),
    };
    let case_sense = match take_option(&mut args, "--case-sense") {
        Ok(value) => value,
        Err(message) => return usage_error(&message),
    };
    let max_depth = match take_option(&mut args, "--max-depth") {
        Ok(value) => value,
        Err(message) => return usage_error(&message),
    };

    init_logging(verbose, trace);

    let mut config = match config_path {
        Some(path) => match RuntimeConfig::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error: {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        },
        None => RuntimeConfig::default(),
    };
    if let Some(mode) = case_sense {
        match CaseSense::parse(&mode) {
            Some(mode) => config = config.with_case_sense(mode),
            None => {
                return usage_error("--case-sense expects on, off, locale or logical.");
            }
        }
    }
    if let Some(depth) = max_depth {
        match depth.parse::<usize>() {
            Ok(depth) if depth > 0 => config = config.with_max_call_depth(depth),
            _ => return usage_error("--max-depth expects a positive integer."),
        }
    }
    if trace {
        config = config.with_trace(true);
    }

    if args.len() < 2 {
        print_help();
        return ExitCode::SUCCESS;
    }

    let status = match args[1].as_str() {
        "-h" | "--help" | "help" => {
            print_help();
            ExitCode::SUCCESS
        }
        "run" => match args.get(2) {
            Some(path) => run_file(path, config),
            None => usage_error("Usage: keyscript run <program.json>"),
        },
        "disasm" => match args.get(2) {
            Some(path) => disasm_file(path),
            None => usage_error("Usage: keyscript disasm <program.json>"),
        },
        other => usage_error(&format!("unknown command `{}`", other)),
    };

    if leak_detector {
        print_leak_stats();
    }
    status
}

fn print_help() {
    println!(
        "\
KeyScript runtime

Usage:
  keyscript run <program.json>
  keyscript disasm <program.json>

Flags:
  --case-sense=<mode>   String comparison mode: on, off, locale, logical (default: off)
  --max-depth=<n>       Call depth limit (default: 256)
  --config=<file>       Load runtime settings from a JSON file
  --trace               Log every executed instruction
  --leak-detector       Print object allocation stats after the run
  --verbose             Raise the default log level to debug
  -h, --help            Show this help message

Logging is filtered by the {} environment variable.
",
        LOG_ENV
    );
}

fn init_logging(verbose: bool, trace: bool) {
    let default_level = if trace {
        "keyscript=trace"
    } else if verbose {
        "keyscript=debug"
    } else {
        "keyscript=warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_file(path: &str, config: RuntimeConfig) -> ExitCode {
    let program = match Program::from_file(path) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("Error: {}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let engine = Engine::with_sink(config, Box::new(StderrSink));
    if let Err(err) = engine.load(&program) {
        eprintln!("Error: {}: {}", path, err);
        return ExitCode::FAILURE;
    }

    let status = match engine.run_main() {
        Ok(value) => {
            let text = value.to_str();
            if !text.is_empty() {
                println!("{}", text);
            }
            ExitCode::SUCCESS
        }
        // Already printed by the sink.
        Err(_) => ExitCode::FAILURE,
    };
    engine.shutdown();
    status
}

fn disasm_file(path: &str) -> ExitCode {
    let program = match Program::from_file(path) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("Error: {}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    for function in &program.functions {
        println!("func {}:", function.name);
        for expression in &function.body {
            println!("  ; line {}", expression.line);
            print!("{}", disassemble(&expression.code));
        }
    }
    if !program.main.is_empty() {
        println!("main:");
    }
    for expression in &program.main {
        println!("  ; line {}", expression.line);
        print!("{}", disassemble(&expression.code));
    }
    ExitCode::SUCCESS
}

fn print_leak_stats() {
    let stats = leak_detector::snapshot();
    println!(
        "\nLeak stats:\n  objects created: {}\n  objects freed: {}\n  live objects: {}\n  finalizers run: {}\n  finalizers skipped: {}\n  resurrections: {}",
        stats.objects_created,
        stats.objects_freed,
        stats.live_objects(),
        stats.finalizers_run,
        stats.finalizers_skipped,
        stats.resurrections
    );
}

fn usage_error(message: &str) -> ExitCode {
    eprintln!("Error: {}", message);
    ExitCode::from(2)
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let present = args.iter().any(|arg| arg == flag);
    if present {
        args.retain(|arg| arg != flag);
    }
    present
}

/// Removes `--name=value` or `--name value` from `args`. The last
/// occurrence wins.
fn take_option(args: &mut Vec<String>, name: &str) -> Result<Option<String>, String> {
    let prefix = format!("{}=", name);
    let mut value = None;
    let mut i = 0;
    while i < args.len() {
        if let Some(inline) = args[i].strip_prefix(&prefix) {
            value = Some(inline.to_string());
            args.remove(i);
            continue;
        }
        if args[i] == name {
            if i + 1 >= args.len() {
                return Err(format!("{} expects a value.", name));
            }
            value = Some(args.remove(i + 1));
            args.remove(i);
            continue;
        }
        i += 1;
    }
    Ok(value)
}
