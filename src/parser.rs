use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::{
    ast::{Comparator, Label, Node, Operator, ParseTree},
    error::{JiffyError, ParseResult},
    lexer::{Keyword, Lexer, TokenKind},
    value::NONE_LITERAL,
};

/// A parsed program: the tree rooted at `program` and the function table
/// mapping each declared name to its declaration node.
#[derive(Debug, Clone)]
pub struct Program {
    tree: Node,
    functions: HashMap<String, usize>,
}

impl Program {
    pub fn root(&self) -> &Node {
        &self.tree
    }

    pub fn function(&self, name: &str) -> Option<&Node> {
        self.functions.get(name).and_then(|&index| self.tree.children.get(index))
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).sorted().collect()
    }

    pub fn parse_tree(&self) -> ParseTree<'_> {
        ParseTree(Some(&self.tree))
    }
}

pub fn parse(source: &str) -> ParseResult<Program> {
    let mut parser = Parser {
        lexer: Lexer::new(source)?,
        block_resume: false,
        functions: HashMap::new(),
    };

    let tree = parser.parse_program()?;
    if parser.current() != &TokenKind::End {
        return Err(JiffyError::TrailingInput { line: parser.line() });
    }

    Ok(Program { tree, functions: parser.functions })
}

struct Parser {
    lexer: Lexer,
    // Set whenever a block closes. The next statement-list continuation may
    // then start a statement without a `;`.
    block_resume: bool,
    functions: HashMap<String, usize>,
}

impl Parser {
    fn current(&self) -> &TokenKind {
        &self.lexer.current().kind
    }

    fn line(&self) -> usize {
        self.lexer.current().line
    }

    fn advance(&mut self) -> ParseResult<()> {
        self.lexer.advance()
    }

    fn at_symbol(&self, symbol: char) -> bool {
        self.current() == &TokenKind::Symbol(symbol)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.current() == &TokenKind::Keyword(keyword)
    }

    fn unexpected(&self, expected: impl Into<String>) -> JiffyError {
        JiffyError::UnexpectedToken {
            expected: expected.into(),
            found: self.current().describe(),
            line: self.line(),
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> ParseResult<()> {
        if !self.at_symbol(symbol) { return Err(self.unexpected(symbol)); }
        self.advance()
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<()> {
        if !self.at_keyword(keyword) { return Err(self.unexpected(TokenKind::Keyword(keyword).describe())); }
        self.advance()
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        let name = match self.current() {
            TokenKind::Identifier(name) => name.clone(),
            _ => return Err(self.unexpected("IDENTIFIER")),
        };
        self.advance()?;
        Ok(name)
    }

    fn identifier_leaf(&mut self) -> ParseResult<Node> {
        let line = self.line();
        Ok(Node::leaf(Label::Identifier(self.expect_identifier()?), line))
    }

    fn parse_program(&mut self) -> ParseResult<Node> {
        let mut program = Node::leaf(Label::Program, self.line());

        while self.at_keyword(Keyword::Fun) {
            let (name, declaration) = self.parse_function_declaration()?;
            self.functions.insert(name, program.children.len());
            program.push(declaration);
        }

        Ok(program)
    }

    fn parse_function_declaration(&mut self) -> ParseResult<(String, Node)> {
        let line = self.line();
        self.expect_keyword(Keyword::Fun)?;
        let name = self.expect_identifier()?;
        let mut declaration = Node::leaf(Label::Function(name.clone()), line);

        self.expect_symbol('(')?;
        if let TokenKind::Identifier(_) = self.current() {
            declaration.push(self.identifier_leaf()?);
            while self.at_symbol(',') {
                self.advance()?;
                declaration.push(self.identifier_leaf()?);
            }
        }
        self.expect_symbol(')')?;

        declaration.push(self.parse_block_with_return()?);
        debug!("parsed function {} with {} parameter(s)", name, declaration.children.len() - 1);

        Ok((name, declaration))
    }

    fn parse_block(&mut self) -> ParseResult<Node> {
        let line = self.line();
        self.expect_symbol('{')?;
        let statements = self.parse_statement_list()?;
        self.expect_symbol('}')?;
        self.block_resume = true;

        Ok(Node::with_children(Label::Block, vec![statements], line))
    }

    // A function body always ends in `return "None"` so every call yields a value.
    fn parse_block_with_return(&mut self) -> ParseResult<Node> {
        let mut block = self.parse_block()?;
        let line = self.line();

        if let Some(statements) = block.children.first_mut() {
            let sentinel = Node::leaf(Label::Text(NONE_LITERAL.to_owned()), line);
            statements.push(Node::with_children(Label::Return, vec![sentinel], line));
        }

        Ok(block)
    }

    fn parse_statement_list(&mut self) -> ParseResult<Node> {
        let mut list = Node::leaf(Label::StatementList, self.line());
        list.children.extend(self.parse_statement()?);

        loop {
            if self.at_symbol(';') {
                self.advance()?;
                list.children.extend(self.parse_statement()?);
            } else if self.block_resume {
                self.block_resume = false;
                list.children.extend(self.parse_statement()?);
            } else {
                return Ok(list);
            }
        }
    }

    /// `None` when the current token starts no statement: an empty statement.
    fn parse_statement(&mut self) -> ParseResult<Option<Node>> {
        let statement = match self.current() {
            TokenKind::Identifier(_) => self.parse_assignment()?,
            TokenKind::Keyword(Keyword::Write) => self.parse_write()?,
            TokenKind::Keyword(Keyword::Read) => self.parse_read()?,
            TokenKind::Keyword(Keyword::While) => self.parse_while()?,
            TokenKind::Keyword(Keyword::If) => self.parse_if_else()?,
            TokenKind::Keyword(Keyword::Return) => self.parse_return()?,
            TokenKind::Symbol('{') => self.parse_block()?,
            _ => return Ok(None),
        };

        Ok(Some(statement))
    }

    fn parse_assignment(&mut self) -> ParseResult<Node> {
        let line = self.line();
        let target = self.identifier_leaf()?;

        if !self.at_symbol('=') {
            return Err(JiffyError::MalformedAssignment { line: self.line() });
        }
        self.advance()?;

        Ok(Node::binary(Label::Assign, target, self.parse_expression()?, line))
    }

    fn parse_write(&mut self) -> ParseResult<Node> {
        let line = self.line();
        self.expect_keyword(Keyword::Write)?;
        self.expect_symbol('(')?;
        let operand = self.parse_expression()?;
        self.expect_symbol(')')?;

        Ok(Node::with_children(Label::Write, vec![operand], line))
    }

    fn parse_read(&mut self) -> ParseResult<Node> {
        let line = self.line();
        self.expect_keyword(Keyword::Read)?;
        self.expect_symbol('(')?;
        let target = self.identifier_leaf()?;
        self.expect_symbol(')')?;

        Ok(Node::with_children(Label::Read, vec![target], line))
    }

    fn parse_while(&mut self) -> ParseResult<Node> {
        let line = self.line();
        self.expect_keyword(Keyword::While)?;
        self.expect_symbol('(')?;
        let condition = self.parse_boolean_expression()?;
        self.expect_symbol(')')?;

        Ok(Node::binary(Label::While, condition, self.parse_block()?, line))
    }

    fn parse_if_else(&mut self) -> ParseResult<Node> {
        let line = self.line();
        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        let condition = self.parse_boolean_expression()?;
        self.expect_symbol(')')?;

        let mut statement = Node::binary(Label::If, condition, self.parse_block()?, line);
        if self.at_keyword(Keyword::Else) {
            self.advance()?;
            statement.push(self.parse_block()?);
        }

        Ok(statement)
    }

    fn parse_return(&mut self) -> ParseResult<Node> {
        let line = self.line();
        self.expect_keyword(Keyword::Return)?;

        Ok(Node::with_children(Label::Return, vec![self.parse_expression()?], line))
    }

    fn parse_boolean_expression(&mut self) -> ParseResult<Node> {
        let left = self.parse_expression()?;
        let line = self.line();

        let comparator = match self.current() {
            TokenKind::Symbol('>') => Comparator::Greater,
            TokenKind::Symbol('<') => Comparator::Less,
            TokenKind::Symbol('?') => Comparator::Equal,
            TokenKind::Symbol('=') => {
                self.advance()?;
                if !self.at_symbol('=') { return Err(self.unexpected('=')); }
                Comparator::Equal
            }
            _ => return Ok(left),
        };
        self.advance()?;

        Ok(Node::binary(Label::Comparison(comparator), left, self.parse_expression()?, line))
    }

    fn operator_in(&self, symbols: &[char]) -> Option<Operator> {
        match self.current() {
            TokenKind::Symbol(symbol) if symbols.contains(symbol) => Operator::from_symbol(*symbol),
            _ => None,
        }
    }

    fn parse_left_associative(
        &mut self,
        symbols: &[char],
        operand: fn(&mut Self) -> ParseResult<Node>,
    ) -> ParseResult<Node> {
        let mut result = operand(self)?;

        while let Some(operator) = self.operator_in(symbols) {
            let line = self.line();
            self.advance()?;
            result = Node::binary(Label::Operator(operator), result, operand(self)?, line);
        }

        Ok(result)
    }

    fn parse_expression(&mut self) -> ParseResult<Node> {
        self.parse_left_associative(&['$'], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> ParseResult<Node> {
        self.parse_left_associative(&['+', '-'], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Node> {
        self.parse_left_associative(&['*', '/', '%'], Self::parse_power)
    }

    fn parse_power(&mut self) -> ParseResult<Node> {
        let base = self.parse_root()?;
        if !self.at_symbol('^') { return Ok(base); }

        let line = self.line();
        self.advance()?;
        Ok(Node::binary(Label::Operator(Operator::Power), base, self.parse_power()?, line))
    }

    fn parse_root(&mut self) -> ParseResult<Node> {
        let line = self.line();

        let node = match self.current() {
            TokenKind::Symbol('(') => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect_symbol(')')?;
                return Ok(inner);
            }
            TokenKind::Number(number) => Node::leaf(Label::Number(*number), line),
            TokenKind::Text(text) => Node::leaf(Label::Text(text.clone()), line),
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                return if self.at_symbol('(') {
                    self.parse_call(name, line)
                } else {
                    Ok(Node::leaf(Label::Identifier(name), line))
                };
            }
            other => return Err(JiffyError::ExpectedOperand { found: other.describe(), line }),
        };

        self.advance()?;
        Ok(node)
    }

    fn parse_call(&mut self, name: String, line: usize) -> ParseResult<Node> {
        let mut call = Node::leaf(Label::Call(name), line);
        self.expect_symbol('(')?;

        if !self.at_symbol(')') {
            call.push(self.parse_expression()?);
            while self.at_symbol(',') {
                self.advance()?;
                call.push(self.parse_expression()?);
            }
        }
        self.expect_symbol(')')?;

        Ok(call)
    }
}
