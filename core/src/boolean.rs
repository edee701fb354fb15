//! Boolean retrieval: query tokenizer, recursive-descent parser and
//! set-algebra evaluator over the inverted index.
//!
//! Grammar, highest to lowest binding:
//!
//! ```text
//! atom     := TERM | '(' or_expr ')'
//! not_expr := 'NOT' not_expr | atom
//! and_expr := not_expr ('AND' not_expr)*
//! or_expr  := and_expr ('OR' and_expr)*
//! ```
//!
//! Keywords are case-insensitive. Every non-keyword token is
//! lemmatized with the same normalizer used at index-build time.

use crate::index::InvertedIndex;
use crate::normalize::Lemmatizer;
use crate::DocId;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

/// A rejected query. No partial result set is ever produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected a term or parenthesized group")]
    ExpectedAtom,
    #[error("unmatched parenthesis")]
    UnmatchedParen,
    #[error("unexpected input after the end of the query")]
    TrailingTokens,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAst {
    Term(String),
    Not(Box<QueryAst>),
    And(Box<QueryAst>, Box<QueryAst>),
    Or(Box<QueryAst>, Box<QueryAst>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Not,
    Word(String),
}

lazy_static! {
    static ref QUERY_TOKEN: Regex = Regex::new(r"[()]|\w+").expect("valid regex");
}

fn tokenize(query: &str, lemmatizer: &Lemmatizer) -> Vec<Token> {
    QUERY_TOKEN
        .find_iter(query)
        .map(|m| match m.as_str() {
            "(" => Token::Open,
            ")" => Token::Close,
            w if w.eq_ignore_ascii_case("AND") => Token::And,
            w if w.eq_ignore_ascii_case("OR") => Token::Or,
            w if w.eq_ignore_ascii_case("NOT") => Token::Not,
            w => Token::Word(lemmatizer.lemmatize(w)),
        })
        .collect()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn parse_or(&mut self) -> Result<QueryAst, ParseError> {
        let mut node = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            let rhs = self.parse_and()?;
            node = QueryAst::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<QueryAst, ParseError> {
        let mut node = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.bump();
            let rhs = self.parse_not()?;
            node = QueryAst::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    // NOT binds to the single following operand, possibly another NOT.
    fn parse_not(&mut self) -> Result<QueryAst, ParseError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.bump();
            let operand = self.parse_not()?;
            return Ok(QueryAst::Not(Box::new(operand)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<QueryAst, ParseError> {
        match self.peek() {
            Some(Token::Open) => {
                self.bump();
                let inner = self.parse_or()?;
                if !matches!(self.peek(), Some(Token::Close)) {
                    return Err(ParseError::UnmatchedParen);
                }
                self.bump();
                Ok(inner)
            }
            Some(Token::Word(w)) => {
                let node = QueryAst::Term(w.clone());
                self.bump();
                Ok(node)
            }
            Some(Token::Close) => Err(ParseError::UnmatchedParen),
            Some(Token::And) | Some(Token::Or) | Some(Token::Not) | None => {
                Err(ParseError::ExpectedAtom)
            }
        }
    }
}

/// Parse a raw query string into its AST, lemmatizing term tokens so
/// they are comparable to posting-list keys.
pub fn parse(query: &str, lemmatizer: &Lemmatizer) -> Result<QueryAst, ParseError> {
    let tokens = tokenize(query, lemmatizer);
    let mut parser = Parser { tokens, pos: 0 };
    let ast = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::TrailingTokens);
    }
    Ok(ast)
}

/// Evaluate an AST against the index. An unknown term resolves to the
/// empty set; `NOT` complements against the universal document set.
pub fn eval(ast: &QueryAst, index: &InvertedIndex) -> BTreeSet<DocId> {
    match ast {
        QueryAst::Term(t) => index.postings(t).cloned().unwrap_or_default(),
        QueryAst::Not(x) => index.universe() - &eval(x, index),
        QueryAst::And(l, r) => &eval(l, index) & &eval(r, index),
        QueryAst::Or(l, r) => &eval(l, index) | &eval(r, index),
    }
}

/// Full boolean retrieval: parse then evaluate. The result set is
/// duplicate-free; an empty set is a successful outcome, distinct from
/// a parse failure.
pub fn search(
    query: &str,
    index: &InvertedIndex,
    lemmatizer: &Lemmatizer,
) -> Result<BTreeSet<DocId>, ParseError> {
    let ast = parse(query, lemmatizer)?;
    Ok(eval(&ast, index))
}
