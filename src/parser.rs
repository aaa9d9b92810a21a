use std::iter::Enumerate;
use std::str::Lines;

use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{
        complete::{alpha1, digit1, space1},
        is_digit,
    },
    combinator::{all_consuming, map, map_res, value, verify},
    sequence::tuple,
    IResult,
};

use crate::ast::{Command::*, *};
use crate::error::ParseError;

const OPCODES: [&str; 17] = [
    "push", "pop", "add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not", "label", "goto",
    "if-goto", "function", "call", "return",
];

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn segment(input: &str) -> IResult<&str, Segment> {
    map_res(alpha1, |seg: &str| seg.parse::<Segment>())(input)
}

fn push(input: &str) -> IResult<&str, Command> {
    map(
        tuple((tag("push"), space1, segment, space1, integer)),
        |(_, _, segment, _, arg)| Push(segment, arg),
    )(input)
}

#[test]
fn test_push() {
    assert_eq!(push("push  pointer  32"), Ok(("", Push(Segment::Pointer, 32))));
}

// `pop constant` is syntactically fine; the generator rejects it.
fn pop(input: &str) -> IResult<&str, Command> {
    map(
        tuple((tag("pop"), space1, segment, space1, integer)),
        |(_, _, segment, _, arg)| Pop(segment, arg),
    )(input)
}

fn prim(input: &str) -> IResult<&str, Command> {
    map_res(alpha1, |prim: &str| prim.parse::<ArithmeticOp>().map(Arithmetic))(input)
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Arithmetic(ArithmeticOp::Neg))));
    assert!(prim("push").is_err());
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("label"), tag("goto"), tag("if-goto"))),
            space1,
            symbol,
        )),
        |(op, _, sym)| match op {
            "label" => Label(sym),
            "goto" => Goto(sym),
            _ => IfGoto(sym),
        },
    )(input)
}

fn function(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("function"), tag("call"))),
            space1,
            symbol,
            space1,
            integer,
        )),
        |(op, _, name, _, count)| match op {
            "function" => Function(name, count),
            _ => Call(name, count),
        },
    )(input)
}

#[test]
fn test_function() {
    assert_eq!(
        function("function Main.fib 2"),
        Ok(("", Function("Main.fib".to_string(), 2)))
    );
    assert_eq!(
        function("call Math.multiply\t2"),
        Ok(("", Call("Math.multiply".to_string(), 2)))
    );
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((
        push,
        pop,
        branching,
        function,
        value(Return, tag("return")),
        prim,
    ))(input)
}

/// True when `name` is usable as a label or function name.
pub fn is_symbol(name: &str) -> bool {
    all_consuming(symbol)(name).is_ok()
}

fn parse_line(line: usize, text: &str) -> Result<Command, ParseError> {
    let malformed = |reason| ParseError::MalformedCommand {
        line,
        text: text.to_string(),
        reason,
    };

    // The opcode must be a whole token; `returnx` is not `return`.
    let opcode = text.split_whitespace().next().unwrap_or(text);
    if !OPCODES.contains(&opcode) {
        return Err(malformed("unrecognized opcode"));
    }

    match command(text) {
        Ok(("", command)) => Ok(command),
        Ok(_) => Err(malformed("unexpected trailing input")),
        Err(_) => Err(malformed("missing or invalid operands")),
    }
}

/// Lazily parses VM source text, one command per meaningful line.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'a> {
    source: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser { source }
    }

    /// Starts a fresh pass over the source.
    pub fn commands(&self) -> Commands<'a> {
        Commands {
            lines: self.source.lines().enumerate(),
        }
    }
}

pub struct Commands<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Iterator for Commands<'a> {
    type Item = Result<SourceCommand, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, line) in self.lines.by_ref() {
            let line = line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim();
            if line.is_empty() {
                continue;
            }

            let line_no = index + 1;
            return Some(parse_line(line_no, line).map(|command| SourceCommand {
                line: line_no,
                command,
            }));
        }
        None
    }
}

/// Parses a whole unit eagerly, stopping at the first malformed line.
pub fn parse(input: &str) -> Result<Vec<Command>, ParseError> {
    Parser::new(input)
        .commands()
        .map(|res| res.map(|sc| sc.command))
        .collect()
}
