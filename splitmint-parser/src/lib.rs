#![warn(clippy::uninlined_format_args)]

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till, take_until, take_while1},
    character::complete::{char, digit1, multispace1},
    combinator::{map_res, opt, recognize},
    multi::{many0, many1},
    sequence::{delimited, preceded},
};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    Equal,
    Exact,
    Percent,
}

/// How an expense is divided. Declared values are kept as written; they are
/// interpreted (tolerantly) when the split is computed.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitSpec<'a> {
    /// Empty means every group member.
    Equal(Vec<&'a str>),
    Exact(Vec<(&'a str, &'a str)>),
    Percent(Vec<(&'a str, &'a str)>),
}

impl<'a> SplitSpec<'a> {
    pub fn kind(&self) -> SplitKind {
        match self {
            SplitSpec::Equal(_) => SplitKind::Equal,
            SplitSpec::Exact(_) => SplitKind::Exact,
            SplitSpec::Percent(_) => SplitKind::Percent,
        }
    }

    /// Named participants in written order.
    pub fn participants(&self) -> Vec<&'a str> {
        match self {
            SplitSpec::Equal(names) => names.clone(),
            SplitSpec::Exact(values) | SplitSpec::Percent(values) => {
                values.iter().map(|(name, _)| *name).collect()
            }
        }
    }

    pub fn declared(&self) -> &[(&'a str, &'a str)] {
        match self {
            SplitSpec::Equal(_) => &[],
            SplitSpec::Exact(values) | SplitSpec::Percent(values) => values,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEntry<'a> {
    pub payer: &'a str,
    pub amount: Decimal,
    pub description: Option<&'a str>,
    pub split: SplitSpec<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Balances,
    Settle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'a> {
    Members(Vec<&'a str>),
    Budget { member: &'a str, amount: Decimal },
    Expense(ExpenseEntry<'a>),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementWithLine<'a> {
    pub line: usize,
    pub statement: Statement<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program<'a> {
    pub statements: Vec<StatementWithLine<'a>>,
}

impl Program<'_> {
    pub fn has_commands(&self) -> bool {
        self.statements
            .iter()
            .any(|stmt| matches!(stmt.statement, Statement::Command(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at line {line}: {detail}")]
    SyntaxError { line: usize, detail: String },
    #[error("Syntax error at line {line}: unparsed input '{rest}'")]
    UnparsedInput { line: usize, rest: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::SyntaxError { line, .. } | ParseError::UnparsedInput { line, .. } => *line,
        }
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)
}

fn sp(input: &str) -> IResult<&str, &str> {
    fn comment(input: &str) -> IResult<&str, &str> {
        delimited(tag("/*"), take_until("*/"), tag("*/")).parse(input)
    }

    fn line_comment(input: &str) -> IResult<&str, &str> {
        recognize((tag("//"), take_till(|c| c == '\n'))).parse(input)
    }

    recognize(many0(alt((multispace1, comment, line_comment)))).parse(input)
}

// 12, 12.5, -3.07, $90.00
fn amount(input: &str) -> IResult<&str, Decimal> {
    preceded(
        opt(char('$')),
        map_res(
            recognize((opt(char('-')), digit1, opt((char('.'), digit1)))),
            Decimal::from_str,
        ),
    )
    .parse(input)
}

fn description(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c| c == '"'), char('"')).parse(input)
}

// Anything up to whitespace or a comment; validated later.
fn raw_value(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != '/')(input)
}

// alice=60
fn assignment(input: &str) -> IResult<&str, (&str, &str)> {
    (identifier, sp, char('='), sp, raw_value)
        .map(|(name, _, _, _, value)| (name, value))
        .parse(input)
}

fn split_spec(input: &str) -> IResult<&str, SplitSpec<'_>> {
    alt((
        preceded(tag_no_case("equal"), many0(preceded(sp, identifier))).map(SplitSpec::Equal),
        preceded(tag_no_case("exact"), many1(preceded(sp, assignment))).map(SplitSpec::Exact),
        preceded(tag_no_case("percent"), many1(preceded(sp, assignment))).map(SplitSpec::Percent),
    ))
    .parse(input)
}

// MEMBERS := alice bob carol
fn members(input: &str) -> IResult<&str, Vec<&str>> {
    (
        tag_no_case("MEMBERS"),
        sp,
        tag(":="),
        many1(preceded(sp, identifier)),
    )
        .map(|(_, _, _, names)| names)
        .parse(input)
}

// BUDGET alice 500.00
fn budget(input: &str) -> IResult<&str, Statement<'_>> {
    (tag_no_case("BUDGET"), sp, identifier, sp, amount)
        .map(|(_, _, member, _, amount)| Statement::Budget { member, amount })
        .parse(input)
}

// alice paid 90.00 "Dinner" split equal bob carol
fn expense(input: &str) -> IResult<&str, ExpenseEntry<'_>> {
    (
        identifier, // payer
        sp,
        tag_no_case("paid"),
        sp,
        amount,
        sp,
        opt((description, sp)),
        tag_no_case("split"),
        sp,
        split_spec,
    )
        .map(
            |(payer, _, _, _, amount, _, description, _, _, split)| ExpenseEntry {
                payer,
                amount,
                description: description.map(|(text, _)| text),
                split,
            },
        )
        .parse(input)
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((
        tag_no_case("!balances").map(|_| Command::Balances),
        tag_no_case("!settle").map(|_| Command::Settle),
    ))
    .parse(input)
}

fn statement(input: &str) -> IResult<&str, Statement<'_>> {
    alt((
        members.map(Statement::Members),
        budget,
        command.map(Statement::Command),
        expense.map(Statement::Expense),
    ))
    .parse(input)
}

fn statement_with_sp(input: &str) -> IResult<&str, Statement<'_>> {
    (sp, statement, sp).map(|(_, stmt, _)| stmt).parse(input)
}

fn syntax_error_detail(err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let near = e.input.trim();
            if near.is_empty() {
                "unexpected end of line".to_string()
            } else {
                format!("unexpected input near '{near}'")
            }
        }
    }
}

/// Parses a ledger, one statement per line.
pub fn parse_program(input: &str) -> Result<Program<'_>, ParseError> {
    let mut statements = Vec::new();

    for (idx, line) in input.lines().enumerate() {
        let (rest, _) = sp(line).map_err(|e| ParseError::SyntaxError {
            line: idx + 1,
            detail: syntax_error_detail(e),
        })?;
        if rest.trim().is_empty() {
            continue;
        }
        match statement_with_sp(rest) {
            Ok((rest, stmt)) => {
                if !rest.trim().is_empty() {
                    return Err(ParseError::UnparsedInput {
                        line: idx + 1,
                        rest: rest.trim().to_string(),
                    });
                }
                statements.push(StatementWithLine {
                    line: idx + 1,
                    statement: stmt,
                });
            }
            Err(e) => {
                return Err(ParseError::SyntaxError {
                    line: idx + 1,
                    detail: syntax_error_detail(e),
                });
            }
        }
    }

    Ok(Program { statements })
}
