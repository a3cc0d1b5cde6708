//! Shared helpers for integration tests
//!
//! `evaluate` computes a planned cell the way a spreadsheet would, for the
//! subset of formula syntax the generator emits: numbers, cell references,
//! `+ - * /`, parentheses, unary minus, `POWER(a, b)` and `SUM(range)`.

#![allow(dead_code)]

use bizmodel_core::FixedClock;
use bizmodel_render::{CellRef, CellValue, SheetPlan};
use chrono::NaiveDate;

pub fn clock() -> FixedClock {
    FixedClock::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
}

pub fn formula_at<'a>(sheet: &'a SheetPlan, address: &str) -> &'a str {
    sheet
        .cell(address)
        .and_then(|c| c.value.as_formula())
        .unwrap_or_else(|| panic!("no formula at {address}"))
}

pub fn text_at<'a>(sheet: &'a SheetPlan, address: &str) -> Option<&'a str> {
    sheet.cell(address).and_then(|c| c.value.as_text())
}

/// Evaluate the cell at `address`; text and missing cells count as 0
pub fn evaluate(sheet: &SheetPlan, address: &str) -> f64 {
    let cell = CellRef::parse(address).unwrap_or_else(|| panic!("bad address {address}"));
    evaluate_cell(sheet, cell, 0)
}

fn evaluate_cell(sheet: &SheetPlan, cell: CellRef, depth: usize) -> f64 {
    assert!(depth < 512, "formula chain too deep at {cell}");
    match sheet.cell_at(cell.row, cell.col).map(|spec| &spec.value) {
        Some(CellValue::Number(n)) => *n,
        Some(CellValue::Formula(f)) => {
            let body = f.strip_prefix('=').unwrap_or(f);
            let tokens = tokenize(body);
            let mut parser = Parser {
                sheet,
                tokens: &tokens,
                pos: 0,
                depth,
            };
            let value = parser.expr();
            assert_eq!(parser.pos, tokens.len(), "trailing tokens in {f}");
            value
        }
        _ => 0.0,
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Cell(CellRef),
    Function(String),
    Op(char),
}

fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::Number(text.parse().unwrap()));
        } else if c.is_ascii_uppercase() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_uppercase() {
                i += 1;
            }
            let letters: String = chars[start..i].iter().collect();
            let digits_start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i > digits_start {
                let digits: String = chars[digits_start..i].iter().collect();
                let cell = CellRef::parse(&format!("{letters}{digits}"))
                    .unwrap_or_else(|| panic!("bad reference {letters}{digits}"));
                tokens.push(Token::Cell(cell));
            } else {
                tokens.push(Token::Function(letters));
            }
        } else {
            tokens.push(Token::Op(c));
            i += 1;
        }
    }
    tokens
}

struct Parser<'a> {
    sheet: &'a SheetPlan,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, op: char) {
        assert_eq!(self.next(), Token::Op(op));
    }

    fn expr(&mut self) -> f64 {
        let mut value = self.term();
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term();
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        value
    }

    fn term(&mut self) -> f64 {
        let mut value = self.factor();
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.factor();
            value = if op == '*' { value * rhs } else { value / rhs };
        }
        value
    }

    fn factor(&mut self) -> f64 {
        match self.next() {
            Token::Number(n) => n,
            Token::Cell(cell) => evaluate_cell(self.sheet, cell, self.depth + 1),
            Token::Op('-') => -self.factor(),
            Token::Op('(') => {
                let value = self.expr();
                self.expect(')');
                value
            }
            Token::Function(name) => self.call(&name),
            other => panic!("unexpected token {other:?}"),
        }
    }

    fn call(&mut self, name: &str) -> f64 {
        self.expect('(');
        let value = match name {
            "POWER" => {
                let base = self.expr();
                self.expect(',');
                let exponent = self.expr();
                base.powf(exponent)
            }
            "SUM" => {
                let Token::Cell(start) = self.next() else {
                    panic!("SUM expects a range")
                };
                self.expect(':');
                let Token::Cell(end) = self.next() else {
                    panic!("SUM expects a range")
                };
                let mut total = 0.0;
                for row in start.row..=end.row {
                    for col in start.col..=end.col {
                        let cell = CellRef::new(row, col).unwrap();
                        total += evaluate_cell(self.sheet, cell, self.depth + 1);
                    }
                }
                total
            }
            other => panic!("unsupported function {other}"),
        };
        self.expect(')');
        value
    }
}
