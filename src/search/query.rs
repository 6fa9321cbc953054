// Tokenizer and precedence-climbing parser for filter queries.
//
// Precedence, loosest first: OR (`,` or `;`), AND (`&`), NOT (leading `!`),
// atom. There is no grouping. An empty operand matches everything.

use std::collections::HashSet;

use super::predicate::Predicate;
use crate::record::CreatureRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Or,
    And,
    Not,
    Text(String),
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    // a `!` only negates when nothing but whitespace precedes it in its operand
    let mut at_operand_start = true;

    let flush = |text: &mut String, tokens: &mut Vec<Token>| {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            tokens.push(Token::Text(trimmed.to_string()));
        }
        text.clear();
    };

    for c in input.chars() {
        match c {
            ',' | ';' => {
                flush(&mut text, &mut tokens);
                tokens.push(Token::Or);
                at_operand_start = true;
            }
            '&' => {
                flush(&mut text, &mut tokens);
                tokens.push(Token::And);
                at_operand_start = true;
            }
            '!' if at_operand_start => tokens.push(Token::Not),
            c if c.is_whitespace() && at_operand_start => {}
            c => {
                at_operand_start = false;
                text.push(c);
            }
        }
    }
    flush(&mut text, &mut tokens);
    tokens
}

/// Parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    All,
    Or(Vec<Query>),
    And(Vec<Query>),
    Not(Box<Query>),
    Atom(Predicate),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, want: &Token) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Query {
        let mut parts = vec![self.parse_and()];
        while self.eat(&Token::Or) {
            parts.push(self.parse_and());
        }
        if parts.len() == 1 {
            parts.swap_remove(0)
        } else {
            Query::Or(parts)
        }
    }

    fn parse_and(&mut self) -> Query {
        let mut parts = vec![self.parse_unary()];
        while self.eat(&Token::And) {
            parts.push(self.parse_unary());
        }
        if parts.len() == 1 {
            parts.swap_remove(0)
        } else {
            Query::And(parts)
        }
    }

    fn parse_unary(&mut self) -> Query {
        if self.eat(&Token::Not) {
            return Query::Not(Box::new(self.parse_unary()));
        }
        match self.peek() {
            Some(Token::Text(text)) => {
                let atom = Predicate::parse(text);
                self.pos += 1;
                Query::Atom(atom)
            }
            _ => Query::All,
        }
    }
}

impl Query {
    /// Parses query text. Matching is case-insensitive.
    pub fn parse(input: &str) -> Self {
        let mut parser = Parser {
            tokens: tokenize(&input.trim().to_lowercase()),
            pos: 0,
        };
        parser.parse_or()
    }

    /// Indices of the records in `input` that satisfy the query.
    pub fn evaluate(&self, records: &[CreatureRecord], input: &[usize]) -> Vec<usize> {
        match self {
            Query::All => input.to_vec(),
            Query::Atom(predicate) => input
                .iter()
                .copied()
                .filter(|&i| predicate.matches(&records[i]))
                .collect(),
            Query::Not(inner) => {
                let excluded: HashSet<usize> =
                    inner.evaluate(records, input).into_iter().collect();
                input
                    .iter()
                    .copied()
                    .filter(|i| !excluded.contains(i))
                    .collect()
            }
            Query::And(parts) => parts
                .iter()
                .fold(input.to_vec(), |narrowed, part| part.evaluate(records, &narrowed)),
            Query::Or(parts) => {
                let mut seen = HashSet::new();
                let mut out = Vec::new();
                for part in parts {
                    for i in part.evaluate(records, input) {
                        if seen.insert(i) {
                            out.push(i);
                        }
                    }
                }
                out
            }
        }
    }
}
