use std::{
    io::{BufRead, Write},
    rc::Rc,
};

use itertools::Itertools;
use log::debug;

use crate::{
    ast::{Comparator, Label, Node, Operator},
    error::{EvaluationResult, JiffyError},
    memory::{ActivationRecord, MemoryManager},
    parser::Program,
    value::{parse_number, Value},
};

pub const ENTRY_POINT: &str = "main";

/// How evaluating a node finished. `Return` carries a function result up
/// through every enclosing block, list, loop and conditional.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal,
    Value(Value),
    Return(Value),
}

fn identifier(node: &Node) -> &str {
    match &node.label {
        Label::Identifier(name) => name,
        other => unreachable!("parser only places identifiers here, found {}", other),
    }
}

fn operand(node: &Node) -> &Node {
    match node.first() {
        Some(first) => first,
        None => unreachable!("{} always has an operand", node.label),
    }
}

fn operands(node: &Node) -> (&Node, &Node) {
    match node.children.as_slice() {
        [first, second, ..] => (first, second),
        _ => unreachable!("{} always has two children", node.label),
    }
}

/// Tree-walking evaluator. Holds everything a run needs: the parsed program,
/// the activation-record provider, the bindings currently in effect and the
/// streams `read` and `write` use.
pub struct Interpreter<'p, M, I, O> {
    program: &'p Program,
    memory: M,
    record: Rc<ActivationRecord>,
    input: I,
    output: O,
}

impl<'p, M: MemoryManager, I: BufRead, O: Write> Interpreter<'p, M, I, O> {
    pub fn new(program: &'p Program, memory: M, input: I, output: O) -> Self {
        Self {
            program,
            memory,
            record: ActivationRecord::new(),
            input,
            output,
        }
    }

    /// Invokes `main` with no arguments.
    pub fn run(&mut self) -> EvaluationResult<Value> {
        let line = self.program.function(ENTRY_POINT).ok_or(JiffyError::MissingMain)?.line;
        let value = self.invoke(ENTRY_POINT, Vec::new(), line)?;
        self.output.flush().map_err(|err| JiffyError::Io { message: err.to_string(), line })?;
        Ok(value)
    }

    pub fn into_output(self) -> O {
        self.output
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    fn invoke(&mut self, name: &str, arguments: Vec<Value>, line: usize) -> EvaluationResult<Value> {
        let program = self.program;
        let function = program.function(name)
            .ok_or_else(|| JiffyError::UndefinedFunction { name: name.to_owned(), line })?;

        let Some((body, parameters)) = function.children.split_last() else {
            return Ok(Value::none());
        };
        if parameters.len() != arguments.len() {
            return Err(JiffyError::ParameterCount {
                name: name.to_owned(),
                expected: parameters.len(),
                found: arguments.len(),
                line,
            });
        }

        debug!("calling {}({})", name, arguments.iter().join(", "));
        self.record = self.memory.activation_record(name);
        for (parameter, argument) in parameters.iter().zip(arguments) {
            self.record.insert(identifier(parameter), argument);
        }

        match self.evaluate(body)? {
            Completion::Return(value) => Ok(value),
            _ => {
                self.record = self.memory.restore_activation_record();
                Ok(Value::none())
            }
        }
    }

    pub fn evaluate(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        let value = match &node.label {
            Label::Block => return self.evaluate_block(node),
            Label::StatementList => return self.evaluate_statement_list(node),
            Label::Assign => return self.evaluate_assignment(node),
            Label::Write => return self.evaluate_write(node),
            Label::Read => return self.evaluate_read(node),
            Label::While => return self.evaluate_while(node),
            Label::If => return self.evaluate_if(node),
            Label::Return => return self.evaluate_return(node),
            Label::Program | Label::Function(_) => return Ok(Completion::Normal),

            Label::Call(name) => self.evaluate_call(name, node)?,
            Label::Operator(operator) => self.evaluate_operator(*operator, node)?,
            Label::Comparison(_) => Value::Number(if self.evaluate_condition(node)? { 1.0 } else { 0.0 }),
            Label::Number(number) => Value::Number(*number),
            Label::Text(text) => Value::Text(text.clone()),
            // `Infinity` and `NaN` lex as words but read as numbers.
            Label::Identifier(name) => match parse_number(name) {
                Some(number) => Value::Number(number),
                None => self.record.get(name)
                    .ok_or_else(|| JiffyError::UndefinedVariable { name: name.clone(), line: node.line })?,
            },
        };

        Ok(Completion::Value(value))
    }

    fn evaluate_value(&mut self, node: &'p Node) -> EvaluationResult<Value> {
        match self.evaluate(node)? {
            Completion::Value(value) | Completion::Return(value) => Ok(value),
            Completion::Normal => unreachable!("{} is not an expression", node.label),
        }
    }

    fn evaluate_number(&mut self, node: &'p Node, operator: &str) -> EvaluationResult<f64> {
        let value = self.evaluate_value(node)?;
        value.as_number().ok_or_else(|| JiffyError::NonNumericOperand {
            operator: operator.to_owned(),
            operand: value.observed(),
            line: node.line,
        })
    }

    fn evaluate_block(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        match node.first() {
            Some(statements) => self.evaluate(statements),
            None => Ok(Completion::Normal),
        }
    }

    fn evaluate_statement_list(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        for statement in &node.children {
            if let Completion::Return(value) = self.evaluate(statement)? {
                return Ok(Completion::Return(value));
            }
        }
        Ok(Completion::Normal)
    }

    fn evaluate_assignment(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        let (target, expression) = operands(node);
        let value = self.evaluate_value(expression)?;
        self.record.insert(identifier(target), value);
        Ok(Completion::Normal)
    }

    fn evaluate_write(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        let value = self.evaluate_value(operand(node))?;
        writeln!(self.output, "{}", value.observed())
            .map_err(|err| JiffyError::Io { message: err.to_string(), line: node.line })?;
        Ok(Completion::Normal)
    }

    fn evaluate_read(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        let name = identifier(operand(node));
        let mut line = String::new();

        let read = self.input.read_line(&mut line)
            .map_err(|err| JiffyError::Io { message: err.to_string(), line: node.line })?;
        if read == 0 {
            return Err(JiffyError::InputExhausted { name: name.to_owned(), line: node.line });
        }

        let line = line.strip_suffix('\n').unwrap_or(&line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        self.record.insert(name, Value::from_text(line));
        Ok(Completion::Normal)
    }

    // Conditions are comparisons; a bare expression holds when it is non-zero.
    fn evaluate_condition(&mut self, node: &'p Node) -> EvaluationResult<bool> {
        let Label::Comparison(comparator) = &node.label else {
            return Ok(self.evaluate_number(node, "condition")? != 0.0);
        };

        let (left, right) = operands(node);
        let left = self.evaluate_number(left, comparator.symbol())?;
        let right = self.evaluate_number(right, comparator.symbol())?;

        Ok(match comparator {
            Comparator::Equal => left == right,
            Comparator::Greater => left > right,
            Comparator::Less => left < right,
        })
    }

    fn evaluate_while(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        let (condition, body) = operands(node);

        while self.evaluate_condition(condition)? {
            if let Completion::Return(value) = self.evaluate(body)? {
                return Ok(Completion::Return(value));
            }
        }
        Ok(Completion::Normal)
    }

    fn evaluate_if(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        let (condition, consequence) = operands(node);

        if self.evaluate_condition(condition)? {
            self.evaluate(consequence)
        } else if let Some(alternative) = node.children.get(2) {
            self.evaluate(alternative)
        } else {
            Ok(Completion::Normal)
        }
    }

    fn evaluate_return(&mut self, node: &'p Node) -> EvaluationResult<Completion> {
        let value = self.evaluate_value(operand(node))?;
        self.record = self.memory.restore_activation_record();
        debug!("returning {}", value);
        Ok(Completion::Return(value))
    }

    fn evaluate_call(&mut self, name: &str, node: &'p Node) -> EvaluationResult<Value> {
        let arguments = node.children.iter()
            .map(|argument| self.evaluate_value(argument))
            .collect::<EvaluationResult<Vec<Value>>>()?;

        self.invoke(name, arguments, node.line)
    }

    fn evaluate_operator(&mut self, operator: Operator, node: &'p Node) -> EvaluationResult<Value> {
        let (left, right) = operands(node);

        if operator == Operator::Add {
            let left = self.evaluate_value(left)?;
            let right = self.evaluate_value(right)?;
            return Ok(left.add(&right));
        }

        let symbol = operator.symbol().to_string();
        let left = self.evaluate_number(left, &symbol)?;
        let right = self.evaluate_number(right, &symbol)?;

        Ok(Value::Number(match operator {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => left / right,
            Operator::Remainder => left % right,
            Operator::Power => left.powf(right),
            Operator::Maximum => if left > right { left } else { right },
        }))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use crate::{
        error::ErrorKind,
        memory::{BasicMemoryManager, StackMemoryManager},
        run_program,
        test_utils::{all_fixtures, load_fixture},
    };

    use super::*;

    fn run_with(source: &str, memory: impl MemoryManager, input: &str) -> EvaluationResult<Vec<String>> {
        let mut output = Vec::new();
        run_program(source, memory, input.as_bytes(), &mut output)?;
        Ok(String::from_utf8_lossy(&output).lines().map(str::to_owned).collect())
    }

    fn run(source: &str) -> EvaluationResult<Vec<String>> {
        run_with(source, BasicMemoryManager::new(), "")
    }

    fn write_expression(expression: &str) -> EvaluationResult<String> {
        let lines = run(&format!("fun main() {{ write({}) }}", expression))?;
        Ok(lines.join("\n"))
    }

    #[test]
    fn arithmetic_scenarios() -> anyhow::Result<()> {
        let scenarios = [
            ("(2+3)*(4-6)", "-10"),
            ("2^3", "8"),
            ("2^3^2", "512"),
            ("2+3^2^2", "83"),
            ("2^3/2*2", "8"),
            ("2+3/2^2$3/2*4+2^3", "14"),
            ("2^(2^2$3^1)", "16"),
            ("2^1^2$3^1", "3"),
            ("7 % 4", "3"),
            ("5 / 2", "2.5"),
            ("4 / 2", "2"),
            ("3 $ 9 $ 1", "9"),
        ];

        for (expression, expected) in scenarios {
            assert_eq!(write_expression(expression)?, expected, "evaluating {}", expression);
        }
        Ok(())
    }

    #[test]
    fn division_by_zero_is_not_a_crash() -> anyhow::Result<()> {
        assert_eq!(write_expression("1 / 0")?, "Infinity");
        assert_eq!(write_expression("0 - 1 / 0")?, "-Infinity");
        assert_eq!(write_expression("0 % 0")?, "NaN");
        Ok(())
    }

    #[test]
    fn plus_concatenates_text() -> anyhow::Result<()> {
        assert_eq!(write_expression(r#""hello, " + "world""#)?, "hello, world");
        assert_eq!(write_expression(r#""a" + 1 + 2"#)?, "a12");
        assert_eq!(write_expression(r#"1 + 2 + "a""#)?, "3a");
        assert_eq!(write_expression(r#"("1" + "2") + 1"#)?, "13");
        Ok(())
    }

    #[test]
    fn function_without_return_yields_none() -> anyhow::Result<()> {
        let output = run("fun f() { x = 1 }\nfun main() { write(f()) }")?;
        assert_eq!(output, vec!["None"]);
        Ok(())
    }

    #[test]
    fn return_unwinds_nested_statements() -> anyhow::Result<()> {
        let source = r#"
            fun find(limit) {
                i = 0;
                while (i < limit) {
                    if (i ? 3) { { return i * 10 } } else { write(i) };
                    i = i + 1
                }
            }
            fun main() { write(find(10)); write(find(2)) }
        "#;

        assert_eq!(run(source)?, vec!["0", "1", "2", "30", "0", "1", "None"]);
        Ok(())
    }

    #[test]
    fn shared_record_leaks_callee_writes() -> anyhow::Result<()> {
        let source = "fun f(n) { x = n; return 0 }\nfun main() { x = 1; y = f(5); write(x) }";

        assert_eq!(run_with(source, BasicMemoryManager::new(), "")?, vec!["5"]);
        assert_eq!(run_with(source, StackMemoryManager::new(), "")?, vec!["1"]);
        Ok(())
    }

    #[test]
    fn recursion_depends_on_the_memory_manager() -> anyhow::Result<()> {
        let left_first = r#"
            fun fact(n) { if (n < 2) { return 1 }; return n * fact(n - 1) }
            fun main() { write(fact(5)) }
        "#;
        let call_first = r#"
            fun fact(n) { if (n < 2) { return 1 }; return fact(n - 1) * n }
            fun main() { write(fact(5)) }
        "#;

        assert_eq!(run_with(left_first, BasicMemoryManager::new(), "")?, vec!["120"]);
        assert_eq!(run_with(call_first, BasicMemoryManager::new(), "")?, vec!["1"]);
        assert_eq!(run_with(call_first, StackMemoryManager::new(), "")?, vec!["120"]);
        Ok(())
    }

    #[test]
    fn read_binds_input_lines() -> anyhow::Result<()> {
        let source = "fun main() { read(a); read(b); write(a + 1); write(b); write(b + a) }";
        let output = run_with(source, BasicMemoryManager::new(), "5.0\r\nhello there\n")?;

        assert_eq!(output, vec!["6", "hello there", "hello there5"]);
        Ok(())
    }

    #[test]
    fn read_past_end_of_input() {
        let result = run_with("fun main() { read(a) }", BasicMemoryManager::new(), "");
        assert_eq!(result, Err(JiffyError::InputExhausted { name: "a".to_owned(), line: 1 }));
    }

    #[test]
    fn conditions() -> anyhow::Result<()> {
        let source = r#"
            fun main() {
                if (2 > 1) { write("gt") };
                if (1 > 2) { write("wrong") } else { write("not gt") };
                if (2 == 2.0) { write("eq") };
                if (0) { write("wrong") };
                if (3 - 1) { write("nonzero") }
            }
        "#;

        assert_eq!(run(source)?, vec!["gt", "not gt", "eq", "nonzero"]);
        Ok(())
    }

    #[test]
    fn parameter_count_mismatch() {
        let result = run("fun f(a, b) { return a }\nfun main() { write(f(1)) }");
        assert_eq!(result, Err(JiffyError::ParameterCount {
            name: "f".to_owned(),
            expected: 2,
            found: 1,
            line: 2,
        }));
    }

    #[test]
    fn undefined_names() {
        let result = run("fun main() {\n write(y) }");
        let error = result.expect_err("y is never bound");
        assert_eq!(error, JiffyError::UndefinedVariable { name: "y".to_owned(), line: 2 });
        assert_eq!(error.kind(), ErrorKind::Runtime);

        let result = run("fun main() { x = g() }");
        assert_eq!(result, Err(JiffyError::UndefinedFunction { name: "g".to_owned(), line: 1 }));
    }

    #[test]
    fn special_number_words_are_numbers() -> anyhow::Result<()> {
        assert_eq!(write_expression("Infinity")?, "Infinity");
        assert_eq!(write_expression("0 - Infinity")?, "-Infinity");
        assert_eq!(write_expression("NaN")?, "NaN");
        assert_eq!(run("fun main() { Infinity = 3; write(Infinity) }")?, vec!["Infinity"]);
        Ok(())
    }

    #[test]
    fn failing_output_reports_the_main_declaration_line() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
        }

        let result = run_program("\n\nfun main() { return 1 }", BasicMemoryManager::new(), "".as_bytes(), Closed);
        let error = result.expect_err("flushing a closed stream fails");
        assert_eq!(error.name(), "Io");
        assert_eq!(error.line(), Some(3));

        let result = run_program("fun main() {\n write(1) }", BasicMemoryManager::new(), "".as_bytes(), Closed);
        assert_eq!(result.expect_err("writing to a closed stream fails").line(), Some(2));
    }

    #[test]
    fn main_is_required() {
        assert_eq!(run("fun start() { write(1) }"), Err(JiffyError::MissingMain));
        assert_eq!(run(""), Err(JiffyError::MissingMain));
    }

    #[test]
    fn arithmetic_needs_numbers() {
        let result = run(r#"fun main() { write("a" * 2) }"#);
        assert_eq!(result, Err(JiffyError::NonNumericOperand {
            operator: "*".to_owned(),
            operand: "a".to_owned(),
            line: 1,
        }));
    }

    #[test]
    fn main_result_is_returned() -> anyhow::Result<()> {
        let program = crate::parse("fun main() { return 2 * 21 }")?;
        let mut interpreter = Interpreter::new(&program, StackMemoryManager::new(), "".as_bytes(), Vec::new());

        assert_eq!(interpreter.run()?, Value::Number(42.0));
        assert_eq!(interpreter.memory().depth(), 0);
        assert!(interpreter.into_output().is_empty());
        Ok(())
    }

    #[test]
    fn evaluate_fixtures() -> anyhow::Result<()> {
        for name in all_fixtures()? {
            let fixture = load_fixture(&name)?;
            let result = run_with(&fixture.source, BasicMemoryManager::new(), &fixture.input);

            match (&result, &fixture.expected) {
                (Ok(output), Ok(expected)) => assert_eq!(output, expected, "fixture {}", name),
                (Err(error), Err(expected)) => assert_eq!(error.name(), expected.as_str(), "fixture {}: {}", name, error),
                _ => bail!("fixture {}: got {:?}, expected {:?}", name, result, fixture.expected),
            }
        }
        Ok(())
    }
}
