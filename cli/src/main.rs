use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ferrule::{
    Address, BytecodeChunk, BytecodeExecutable, CodegenError, CompileOptions, Error, NativeCompiler,
    Target, parse_program, render_error,
};
use ferrule_core::parser::parse_tree;
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Ferrule - parse assembly source and compile stack bytecode to native code
#[derive(Parser, Debug)]
#[command(name = "ferrule")]
#[command(about = "Ferrule front end and native compiler", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a source file and print its AST
    Parse {
        /// Source file to parse
        file: PathBuf,

        /// Print the concrete parse tree before lowering (for debugging)
        #[arg(long)]
        debug_cst: bool,
    },

    /// Compile a bytecode file into an object file
    Compile {
        /// Bytecode executable (postcard container, or a raw chunk with --raw)
        file: PathBuf,

        /// Object file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Treat the input as the byte encoding of a single chunk
        #[arg(long)]
        raw: bool,

        /// Target triple (defaults to the host)
        #[arg(long)]
        target: Option<String>,

        /// Print the IR of each function (for debugging)
        #[arg(long)]
        print_ir: bool,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_parse(file: &Path, debug_cst: bool) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", file.display()))?;

    if debug_cst {
        // Syntax errors are reported by the full parse below.
        if let Ok(tree) = parse_tree(&source) {
            println!("=== Parse Tree ===");
            println!("{}", tree);
            println!();
        }
    }

    match parse_program(&source) {
        Ok(program) => {
            println!("{:#?}", program);
            Ok(())
        }
        Err(e) => {
            render_error(&e);
            std::process::exit(1);
        }
    }
}

fn load_executable(file: &Path, raw: bool) -> Result<BytecodeExecutable> {
    let bytes = std::fs::read(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", file.display()))?;

    let executable = if raw {
        let chunk = BytecodeChunk::decode(&bytes).map_err(Error::from).into_diagnostic()?;
        let mut executable = BytecodeExecutable::new();
        executable.push(chunk, Address(0));
        executable
    } else {
        BytecodeExecutable::from_bytes(&bytes)
            .map_err(Error::from)
            .into_diagnostic()?
    };
    debug!(chunks = executable.len(), "loaded executable");
    Ok(executable)
}

fn compile_executable(
    executable: &BytecodeExecutable,
    output: &Path,
    options: &CompileOptions,
) -> Result<(), CodegenError> {
    let mut compiler = NativeCompiler::new(executable, options)?;
    compiler.generate()?;
    for function in compiler.emitted() {
        println!("; {} @ {:#x}", function.name, function.address.0);
        println!("{}", function.ir.display());
    }
    compiler.write_object(output)
}

fn run_compile(
    file: &Path,
    output: &Path,
    raw: bool,
    target: Option<String>,
    print_ir: bool,
) -> Result<()> {
    let executable = load_executable(file, raw)?;
    let options = CompileOptions {
        target: target.map(Target::Triple).unwrap_or_default(),
        retain_ir: print_ir,
        ..CompileOptions::default()
    };

    match compile_executable(&executable, output, &options) {
        Ok(()) => {
            info!(output = %output.display(), "compiled");
            Ok(())
        }
        Err(err) if err.is_internal() => Err::<(), _>(Error::from(err))
            .into_diagnostic()
            .wrap_err("internal compiler error"),
        Err(err) => Err::<(), _>(Error::from(err)).into_diagnostic(),
    }
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    match args.command {
        Command::Parse { file, debug_cst } => run_parse(&file, debug_cst),
        Command::Compile {
            file,
            output,
            raw,
            target,
            print_ir,
        } => run_compile(&file, &output, raw, target, print_ir),
    }
}
