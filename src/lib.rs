mod ast;
mod error;
mod interpreter;
mod lexer;
mod memory;
mod parser;
mod source;
mod value;

#[cfg(test)]
mod test_utils;

use std::io::{BufRead, Write};

pub use ast::{Comparator, Label, Node, Operator, ParseTree};
pub use error::{ErrorKind, EvaluationResult, JiffyError, LexResult, ParseResult};
pub use interpreter::{Completion, Interpreter, ENTRY_POINT};
pub use lexer::{strip_comments, tokens, Keyword, Lexer, Token, TokenKind};
pub use memory::{ActivationRecord, BasicMemoryManager, MemoryManager, StackMemoryManager};
pub use parser::{parse, Program};
pub use source::{classify, load_program, read_entry, Entry, SourceError};
pub use value::{parse_number, render_number, Value, NONE_LITERAL};

/// Parses `source` and runs its `main`, reading from `input` and writing to
/// `output`. Returns what `main` returned.
pub fn run_program<M, I, O>(source: &str, memory: M, input: I, output: O) -> EvaluationResult<Value>
where
    M: MemoryManager,
    I: BufRead,
    O: Write,
{
    let program = parse(source)?;
    Interpreter::new(&program, memory, input, output).run()
}
