// ABOUTME: Command-line entry point: file mode, usage, and the interactive loop

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use simpl::interpret;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "simpl")]
#[command(version)]
#[command(about = "Interpreter for SIMPL, a small statically-typed functional language")]
struct CliArgs {
    /// Source file to run
    #[arg(value_name = "FILE")]
    source: Option<PathBuf>,

    /// Start an interactive session instead of running a file
    #[arg(short, long)]
    interactive: bool,
}

/// Inference and evaluation recurse over program structure, so deeply
/// recursive programs need far more than the default main-thread stack.
const INTERPRETER_STACK_BYTES: usize = 64 * 1024 * 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(path) = args.source {
        let source = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        println!("{}", run_on_deep_stack(source)?);
        return Ok(());
    }

    if args.interactive {
        return repl();
    }

    println!("usage: simpl <source-file>");
    Ok(())
}

/// Run one program on a dedicated thread with a large stack, returning
/// the line to print: the value's display form or a diagnostic category.
fn run_on_deep_stack(source: String) -> Result<String, Box<dyn std::error::Error>> {
    let handle = std::thread::Builder::new()
        .name("interpreter".to_string())
        .stack_size(INTERPRETER_STACK_BYTES)
        .spawn(move || render(&source))?;
    match handle.join() {
        Ok(line) => Ok(line),
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

fn render(source: &str) -> String {
    match interpret(source) {
        Ok(value) => value.to_string(),
        Err(fault) => fault.to_string(),
    }
}

/// Interactive loop. Every line is an independent program; faults are
/// reported by category and the session keeps going.
fn repl() -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;
    let history_file = ".simpl_history";
    let _ = rl.load_history(history_file);

    println!("SIMPL interpreter (Ctrl-D to exit)");

    loop {
        match rl.readline("simpl> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                println!("{}", render(&line));
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
