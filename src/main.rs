//! vecscript - runs vector object code against host globals.
//!
//! Usage: `vecscript run <object.json> [--globals FILE] [--trace]`

use std::{collections::BTreeMap, fs, path::PathBuf, process};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vecscript::{
    bytecode::{data_type::DataType, object_code::ObjectCode},
    runtime::{
        config::VmConfig,
        container::Container,
        host::{FunctionTable, VariableTable},
        virtual_machine::VirtualMachine,
    },
};

#[derive(Parser, Debug)]
#[command(name = "vecscript")]
#[command(about = "Execute, list and inspect vecscript object code")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run object code and print the result and written-back globals
    Run {
        /// Object code JSON file
        object: PathBuf,

        /// Trace every executed instruction
        #[arg(long)]
        trace: bool,

        /// VM configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host globals JSON file: `{"name": {"type", "value", "constant"}}`
        #[arg(long)]
        globals: Option<PathBuf>,

        /// Abort after this many instructions
        #[arg(long)]
        max_instructions: Option<u64>,

        /// Log the disassembly before running
        #[arg(long)]
        dump: bool,
    },
    /// Print the instruction listing
    Disasm {
        /// Object code JSON file
        object: PathBuf,
    },
    /// Print partition sizes and the fingerprint
    Info {
        /// Object code JSON file
        object: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct GlobalSpec {
    #[serde(rename = "type")]
    data_type: DataType,
    value: serde_json::Value,
    #[serde(default)]
    constant: bool,
}

fn main() {
    let cli = Cli::parse();
    let trace = matches!(cli.command, Command::Run { trace: true, .. });
    init_logging(trace);

    match cli.command {
        Command::Run {
            object,
            trace,
            config,
            globals,
            max_instructions,
            dump,
        } => {
            let object_code = load_object_code(&object);
            let mut config = match config {
                Some(path) => VmConfig::from_json_file(&path)
                    .unwrap_or_else(|e| fail(&format!("Failed to load config: {}", e))),
                None => VmConfig::default(),
            };
            if trace {
                config = config.with_trace(true);
            }
            if max_instructions.is_some() {
                config = config.with_max_instructions(max_instructions);
            }
            config.dump_object_code |= dump;

            let mut variables = match globals {
                Some(path) => load_globals(&path),
                None => VariableTable::new(),
            };
            let mut functions = FunctionTable::with_builtins();
            let mut vm = VirtualMachine::new(config);

            info!("Running {}", object.display());
            let result = vm
                .execute(&object_code, &mut variables, &mut functions)
                .unwrap_or_else(|e| fail(&format!("error[{}]: {}", e.code().code, e)));

            let stats = vm.stats();
            info!(
                executed = stats.executed_instructions,
                allocations = stats.buffer_allocations,
                reuses = stats.buffer_reuses,
                "Run complete"
            );

            let output = serde_json::json!({
                "result": result.as_ref().map_or(serde_json::Value::Null, Container::to_json),
                "globals": variables.to_json(),
            });
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{}", text),
                Err(e) => fail(&format!("Failed to encode output: {}", e)),
            }
        }
        Command::Disasm { object } => {
            print!("{}", load_object_code(&object).disassemble());
        }
        Command::Info { object } => {
            let object_code = load_object_code(&object);
            let fingerprint = object_code
                .fingerprint_hex()
                .unwrap_or_else(|e| fail(&format!("Failed to fingerprint: {}", e)));
            println!("instructions: {}", object_code.instructions.len());
            println!("constants:    {}", object_code.constants.len());
            println!("registers:    {}", object_code.registers);
            println!("locals:       {}", object_code.locals);
            println!("globals:      {}", object_code.globals.len());
            println!("fingerprint:  {}", fingerprint);
        }
    }
}

fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("info,vecscript::vm=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_object_code(path: &PathBuf) -> ObjectCode {
    ObjectCode::from_json_file(path)
        .unwrap_or_else(|e| fail(&format!("Failed to load object code: {}", e)))
}

fn load_globals(path: &PathBuf) -> VariableTable {
    let source = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(&format!("Error reading '{}': {}", path.display(), e)));
    let specs: BTreeMap<String, GlobalSpec> = serde_json::from_str(&source)
        .unwrap_or_else(|e| fail(&format!("Invalid globals file '{}': {}", path.display(), e)));

    let mut variables = VariableTable::new();
    for (name, spec) in specs {
        let container = Container::from_json(&spec.value, spec.data_type)
            .unwrap_or_else(|e| fail(&format!("Global `{}`: {}", name, e)));
        variables.register(name, container, spec.constant);
    }
    variables
}

fn fail(message: &str) -> ! {
    error!("{}", message);
    process::exit(1);
}
