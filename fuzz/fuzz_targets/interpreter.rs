#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Deeper trees are cut off so the recursive parser and evaluator stay within
// the native stack.
const MAX_DEPTH: usize = 24;

#[derive(Arbitrary, Debug)]
enum JiffyOperator {
    Add, Sub, Mul, Div,
    Rem, Pow, Max,
}

impl fmt::Display for JiffyOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            JiffyOperator::Add => "+",
            JiffyOperator::Sub => "-",
            JiffyOperator::Mul => "*",
            JiffyOperator::Div => "/",
            JiffyOperator::Rem => "%",
            JiffyOperator::Pow => "^",
            JiffyOperator::Max => "$",
        })
    }
}

#[derive(Arbitrary, Debug)]
enum JiffyExpression {
    Number(u16),
    Text(String),
    Variable(bool),
    Binary(Box<JiffyExpression>, JiffyOperator, Box<JiffyExpression>),
    Parenthesized(Box<JiffyExpression>),
    Call(Vec<JiffyExpression>),
}

impl JiffyExpression {
    fn render(&self, depth: usize) -> String {
        if depth > MAX_DEPTH { return "1".to_owned(); }

        match self {
            Self::Number(number) => number.to_string(),
            // Quotes, comment markers and newlines would end the literal early.
            Self::Text(text) => format!("\"{}\"", text.replace(['"', '#', '\n'], "")),
            Self::Variable(true) => "x".to_owned(),
            Self::Variable(false) => "undefined".to_owned(),
            Self::Binary(left, operator, right) => format!("{} {} {}", left.render(depth + 1), operator, right.render(depth + 1)),
            Self::Parenthesized(inner) => format!("({})", inner.render(depth + 1)),
            Self::Call(arguments) => format!("identity({})", arguments.iter().map(|argument| argument.render(depth + 1)).join(", ")),
        }
    }
}

fuzz_target!(|statements: Vec<JiffyExpression>| {
    let body = statements.iter()
        .map(|expression| format!("x = {}; write(x)", expression.render(0)))
        .join(";\n");
    let source = format!("fun identity(value) {{ return value }}\nfun main() {{ x = 0;\n{} }}", body);

    let mut output = Vec::new();
    let _ = jiffy::run_program(&source, jiffy::BasicMemoryManager::new(), "".as_bytes(), &mut output);
});
