//! Integer calculator: one `A OP B` expression per call, or a line-based
//! loop over standard input.

use std::io::{self, BufRead, Write};

pub const USAGE: &str = "\
Simple Calculator
Usage: sysmon calc <num1> <op> <num2>
Operations: + - x / m(mod)
Examples:
  sysmon calc 10 + 5
  sysmon calc 20 - 8
  sysmon calc 6 x 7
  sysmon calc 100 / 4

Note: Use 'x' for multiply (the shell treats * specially)
Run without arguments for an interactive session.
";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Op {
    /// Only the first character of the operator token counts.
    pub fn parse(token: &str) -> Option<Op> {
        match token.chars().next()? {
            '+' => Some(Op::Add),
            '-' => Some(Op::Sub),
            'x' | 'X' | '*' => Some(Op::Mul),
            '/' => Some(Op::Div),
            '%' | 'm' => Some(Op::Mod),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "x",
            Op::Div => "/",
            Op::Mod => "mod",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    #[error("Error: Division by zero!")]
    DivisionByZero,
    #[error("Error: Result overflows")]
    Overflow,
    #[error("Unknown operator: {0}\nSupported: + - x / m(mod)")]
    UnknownOperator(String),
    #[error("Error: Not a number: {0}")]
    InvalidNumber(String),
    #[error("Usage: <num1> <op> <num2>")]
    WrongArity,
}

pub fn evaluate(a: i32, op: Op, b: i32) -> Result<i32, CalcError> {
    let result = match op {
        Op::Add => a.checked_add(b),
        Op::Sub => a.checked_sub(b),
        Op::Mul => a.checked_mul(b),
        Op::Div | Op::Mod if b == 0 => return Err(CalcError::DivisionByZero),
        Op::Div => a.checked_div(b),
        Op::Mod => a.checked_rem(b),
    };
    result.ok_or(CalcError::Overflow)
}

fn operand(token: &str) -> Result<i32, CalcError> {
    token
        .parse()
        .map_err(|_| CalcError::InvalidNumber(token.to_string()))
}

/// Evaluates `[A, OP, B]` and formats it as `A OP B = R`.
pub fn calc_line<S: AsRef<str>>(args: &[S]) -> Result<String, CalcError> {
    let [a, op, b] = args else {
        return Err(CalcError::WrongArity);
    };
    let (a, op_token, b) = (a.as_ref(), op.as_ref(), b.as_ref());
    let a = operand(a)?;
    let b = operand(b)?;
    let op = Op::parse(op_token).ok_or_else(|| CalcError::UnknownOperator(op_token.to_string()))?;
    let result = evaluate(a, op, b)?;
    Ok(format!("{a} {} {b} = {result}", op.symbol()))
}

/// Output of a one-shot invocation. Malformed input yields the usage text.
pub fn run_args<S: AsRef<str>>(args: &[S]) -> String {
    match calc_line(args) {
        Ok(line) => format!("{line}\n"),
        Err(CalcError::WrongArity | CalcError::InvalidNumber(_)) => USAGE.to_string(),
        Err(err) => format!("{err}\n"),
    }
}

/// Reads `A OP B` lines until `q`, `quit` or end of input.
pub fn repl(input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    writeln!(output, "Calculator: enter <num1> <op> <num2>, q to quit")?;
    write!(output, "calc> ")?;
    output.flush()?;
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line == "q" || line == "quit" {
            break;
        }
        if !line.is_empty() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match calc_line(&tokens) {
                Ok(result) => writeln!(output, "{result}")?,
                Err(err) => writeln!(output, "{err}")?,
            }
        }
        write!(output, "calc> ")?;
        output.flush()?;
    }
    writeln!(output)
}
