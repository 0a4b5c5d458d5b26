use std::io::{self, BufRead};

use clap::{Parser, ValueEnum};
use jiffy::{
    parse, read_entry, tokens, BasicMemoryManager, Interpreter, MemoryManager, Program, StackMemoryManager,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Memory {
    /// One record shared by every invocation
    Shared,
    /// A fresh record per invocation
    Stack,
}

/// Run a Jiffy program.
#[derive(Debug, Parser)]
#[command(name = "jiffy")]
struct Cli {
    /// A .jif file, or program text starting with `fun`. Prompted for when absent.
    source: Option<String>,

    /// Print the token trace and the parse tree before running
    #[arg(short, long)]
    detail: bool,

    /// Activation-record provider
    #[arg(short, long, value_enum, default_value_t = Memory::Shared)]
    memory: Memory,
}

fn prompt() -> anyhow::Result<String> {
    println!("Enter program, or program filename, to INTERPRET: ");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(|c: char| c == '\n' || c == '\r').to_owned())
}

fn print_details(source: &str, program: &Program) -> anyhow::Result<()> {
    for (index, token) in tokens(source)?.iter().enumerate() {
        println!("token {} is {}", index + 1, token);
    }
    println!("{}", program.parse_tree());
    println!("------------INTERPRETER OUTPUT------------------");
    Ok(())
}

fn execute<M: MemoryManager>(program: &Program, memory: M) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    Interpreter::new(program, memory, stdin.lock(), stdout.lock()).run()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let entry = match cli.source {
        Some(entry) => entry,
        None => prompt()?,
    };
    let source = read_entry(&entry)?;
    let program = parse(&source)?;

    if cli.detail {
        print_details(&source, &program)?;
    }

    match cli.memory {
        Memory::Shared => execute(&program, BasicMemoryManager::new()),
        Memory::Stack => execute(&program, StackMemoryManager::new()),
    }
}
