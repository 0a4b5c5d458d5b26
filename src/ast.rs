use core::fmt;

use crate::value::render_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
    Maximum,
}

impl Operator {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Some(match symbol {
            '+' => Self::Add,
            '-' => Self::Subtract,
            '*' => Self::Multiply,
            '/' => Self::Divide,
            '%' => Self::Remainder,
            '^' => Self::Power,
            '$' => Self::Maximum,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::Remainder => '%',
            Self::Power => '^',
            Self::Maximum => '$',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    Greater,
    Less,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::Greater => ">",
            Self::Less => "<",
        }
    }
}

/// What a node stands for. Statement and operator labels fix the meaning of
/// the children, leaf labels carry their literal or name.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    Program,
    Function(String),
    Block,
    StatementList,
    Assign,
    Write,
    Read,
    While,
    If,
    Return,
    Call(String),
    Operator(Operator),
    Comparison(Comparator),
    Number(f64),
    /// Text literal, delimiting quotes included.
    Text(String),
    Identifier(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program => write!(f, "program"),
            Self::Function(name) => write!(f, "fun {}()", name),
            Self::Block => write!(f, "block"),
            Self::StatementList => write!(f, "stmnt_list"),
            Self::Assign => write!(f, "="),
            Self::Write => write!(f, "write"),
            Self::Read => write!(f, "read"),
            Self::While => write!(f, "while"),
            Self::If => write!(f, "if"),
            Self::Return => write!(f, "return"),
            Self::Call(name) => write!(f, "{}()", name),
            Self::Operator(operator) => write!(f, "{}", operator.symbol()),
            Self::Comparison(comparator) => write!(f, "{}", comparator.symbol()),
            Self::Number(number) => write!(f, "{}", render_number(*number)),
            Self::Text(text) | Self::Identifier(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub label: Label,
    pub children: Vec<Node>,
    pub line: usize,
}

impl Node {
    pub fn leaf(label: Label, line: usize) -> Self {
        Self { label, children: Vec::new(), line }
    }

    pub fn with_children(label: Label, children: Vec<Node>, line: usize) -> Self {
        Self { label, children, line }
    }

    pub fn binary(label: Label, left: Node, right: Node, line: usize) -> Self {
        Self::with_children(label, vec![left, right], line)
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Left operand, condition, assignment target or sole operand.
    pub fn first(&self) -> Option<&Node> {
        self.children.first()
    }

    /// Right operand or body.
    pub fn second(&self) -> Option<&Node> {
        self.children.get(1)
    }
}

/// Diagnostic rendering of a parse tree, rotated a quarter turn: the rightmost
/// child is printed first and each parent sits next to its middle child.
pub struct ParseTree<'a>(pub Option<&'a Node>);

const SPACER: usize = 5;

fn pretty_print(node: &Node, offset: usize, out: &mut String) {
    let label = node.label.to_string();

    if node.is_leaf() {
        out.push('\n');
        out.push_str(&" ".repeat(offset));
        out.push_str(&label);
        return;
    }

    let middle = node.children.len() / 2;
    for (index, child) in node.children.iter().enumerate().rev() {
        pretty_print(child, offset + SPACER + label.chars().count() - 1, out);

        if index == middle {
            out.push('\n');
            out.push_str(&" ".repeat(offset));
            out.push_str(&label);
            out.push_str(&".".repeat(SPACER - 1));
            out.push('|');
        }
    }
}

impl<'a> fmt::Display for ParseTree<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(root) => {
                let mut out = String::new();
                pretty_print(root, 0, &mut out);
                f.write_str(&out)
            }
            None => write!(f, "No tree"),
        }
    }
}
