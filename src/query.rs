//! Queries are ordered lists of clauses, each compiled into an [`Expression`]
//! and evaluated in turn against a [`QueryState`]:
//!
//! | clause              | expression  |
//! |---------------------|-------------|
//! | `sentence`          | assert      |
//! | `not sentence`      | negation    |
//! | `op lhs rhs`        | comparison, `op` one of `eq neq lt gt lte gte` |
//!
//! Evaluation stops at the first clause that fails. A failed query is an
//! ordinary outcome, reported as a [`QueryResult`] with `success == false`.
use std::collections::BTreeMap;
use std::slice;

use serde::Serialize;
use tracing::debug;

use crate::construct::{Database, Unfired};
use crate::datatype::Value;
use crate::error::{ArborError, Result};
use crate::sentence::Sentence;
use crate::unify::{unify_all, Variables};

/// A binding row as handed to and from callers.
pub type Row = BTreeMap<String, Value>;

// ------------- Comparator -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl Comparator {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "lt" => Some(Self::Lt),
            "gt" => Some(Self::Gt),
            "lte" => Some(Self::Lte),
            "gte" => Some(Self::Gte),
            _ => None,
        }
    }
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Lte => "lte",
            Self::Gte => "gte",
        }
    }
    /// Equality never fails; orderings fail with a type error for pairs that
    /// have no order.
    pub fn compare(&self, lhs: &Value, rhs: &Value) -> Result<bool> {
        match self {
            Self::Eq => Ok(lhs.equal_to(rhs)),
            Self::Neq => Ok(lhs.not_equal_to(rhs)),
            Self::Lt => lhs.less_than(rhs),
            Self::Gt => lhs.greater_than(rhs),
            Self::Lte => lhs.less_than_or_equal(rhs),
            Self::Gte => lhs.greater_than_or_equal(rhs),
        }
    }
}

// ------------- QueryState -------------
/// What flows from one clause to the next.
#[derive(Debug, Clone)]
pub struct QueryState {
    success: bool,
    bindings: Vec<Variables>,
    // private to this run, so every prefix fires at most once per run
    unfired: Unfired,
}

impl QueryState {
    pub fn new(database: &Database) -> Self {
        Self::with_bindings(database, Vec::new())
    }
    pub fn with_bindings(database: &Database, bindings: Vec<Variables>) -> Self {
        Self {
            success: true,
            bindings,
            unfired: database.unfired(),
        }
    }
    pub fn success(&self) -> bool {
        self.success
    }
    pub fn bindings(&self) -> &[Variables] {
        &self.bindings
    }
    fn fail(mut self) -> Self {
        self.success = false;
        self.bindings.clear();
        self
    }
    // keeps the surviving rows, or fails when none survived
    fn narrow(mut self, surviving: Vec<Variables>) -> Self {
        if surviving.is_empty() {
            return self.fail();
        }
        self.bindings = surviving;
        self
    }
    pub fn into_result(self) -> QueryResult {
        if !self.success {
            return QueryResult::failed();
        }
        let bindings = self
            .bindings
            .into_iter()
            .map(|row| row.into_iter().collect())
            .collect();
        QueryResult {
            success: true,
            bindings,
        }
    }
}

// ------------- Expression -------------
#[derive(Debug, Clone)]
pub enum Expression {
    Assert(Sentence),
    Not(Sentence),
    Compare {
        op: Comparator,
        lhs: Value,
        rhs: Value,
    },
}

impl Expression {
    pub fn parse(clause: &str) -> Result<Self> {
        let parts: Vec<&str> = clause.split_whitespace().collect();
        match parts.as_slice() {
            [sentence] => Ok(Self::Assert(Sentence::parse(sentence)?)),
            ["not", sentence] => Ok(Self::Not(Sentence::parse(sentence)?)),
            [op, lhs, rhs] => {
                let op = Comparator::parse(op).ok_or_else(|| {
                    ArborError::syntax(format!("Unrecognized comparison operator in '{}'", clause))
                })?;
                Ok(Self::Compare {
                    op,
                    lhs: Self::operand(lhs)?,
                    rhs: Self::operand(rhs)?,
                })
            }
            _ => Err(ArborError::syntax(format!(
                "Unrecognized query expression '{}'",
                clause
            ))),
        }
    }
    fn operand(text: &str) -> Result<Value> {
        let sentence = Sentence::parse(text)?;
        match sentence.tokens() {
            [token] => Ok(token.value().clone()),
            _ => Err(ArborError::syntax(format!(
                "Comparator expression may only be single variables, symbols, or constants. {} has too many parts",
                text
            ))),
        }
    }

    pub fn evaluate(&self, database: &mut Database, state: QueryState) -> Result<QueryState> {
        match self {
            Self::Assert(sentence) => assert(database, sentence, state),
            Self::Not(sentence) => negate(database, sentence, state),
            Self::Compare { op, lhs, rhs } => compare(*op, lhs, rhs, state),
        }
    }
}

fn assert(database: &mut Database, sentence: &Sentence, mut state: QueryState) -> Result<QueryState> {
    if !sentence.has_variables() {
        let holds = database.assert_sentence(sentence, &mut state.unfired)?;
        return Ok(if holds { state } else { state.fail() });
    }
    let candidates = unify_all(
        database,
        &state.bindings,
        slice::from_ref(sentence),
        &mut state.unfired,
    )?;
    // re-walk each bound path, which also checks cardinality along the way
    let mut surviving = Vec::new();
    for row in candidates {
        let bound = sentence.bind(&row);
        if !bound.has_variables() && database.assert_sentence(&bound, &mut state.unfired)? {
            surviving.push(row);
        }
    }
    Ok(state.narrow(surviving))
}

fn negate(database: &mut Database, sentence: &Sentence, mut state: QueryState) -> Result<QueryState> {
    if !sentence.has_variables() {
        let holds = database.assert_sentence(sentence, &mut state.unfired)?;
        return Ok(if holds { state.fail() } else { state });
    }
    if state.bindings.is_empty() {
        let satisfiable = unify_all(database, &[], slice::from_ref(sentence), &mut state.unfired)?;
        return Ok(if satisfiable.is_empty() { state } else { state.fail() });
    }
    let mut surviving = Vec::new();
    for row in std::mem::take(&mut state.bindings) {
        let bound = sentence.bind(&row);
        let holds = if bound.has_variables() {
            // whatever is still free is unified from scratch
            let scoped = unify_all(database, &[], slice::from_ref(&bound), &mut state.unfired)?;
            !scoped.is_empty()
        } else {
            database.assert_sentence(&bound, &mut state.unfired)?
        };
        if !holds {
            surviving.push(row);
        }
    }
    Ok(state.narrow(surviving))
}

fn substitute(operand: &Value, row: &Variables) -> Value {
    match operand {
        Value::Variable(name) => row.get(name).cloned().unwrap_or_else(|| operand.clone()),
        _ => operand.clone(),
    }
}

fn compare(op: Comparator, lhs: &Value, rhs: &Value, mut state: QueryState) -> Result<QueryState> {
    // no rows to keep, so nothing can survive
    if state.bindings.is_empty() {
        return Ok(state.fail());
    }
    let mut surviving = Vec::new();
    for row in std::mem::take(&mut state.bindings) {
        if op.compare(&substitute(lhs, &row), &substitute(rhs, &row))? {
            surviving.push(row);
        }
    }
    Ok(state.narrow(surviving))
}

// ------------- Query -------------
/// An immutable list of clauses. Adding a clause yields a new query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_clauses<I, S>(clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clauses: clauses.into_iter().map(Into::into).collect(),
        }
    }
    pub fn clause(&self, clause: impl Into<String>) -> Query {
        let mut clauses = self.clauses.clone();
        clauses.push(clause.into());
        Self { clauses }
    }
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }
    /// Every clause is compiled before anything runs, so a syntax error
    /// never leaves a query half evaluated.
    pub fn compile(&self) -> Result<Vec<Expression>> {
        self.clauses.iter().map(|c| Expression::parse(c)).collect()
    }
    pub fn run(&self, database: &mut Database) -> Result<QueryResult> {
        self.run_with_bindings(database, Vec::new())
    }
    /// Runs with variables pre-seeded from `bindings`, one candidate
    /// solution per row.
    pub fn run_with_bindings(&self, database: &mut Database, bindings: Vec<Row>) -> Result<QueryResult> {
        let expressions = self.compile()?;
        let seeded = bindings
            .into_iter()
            .map(|row| row.into_iter().collect::<Variables>())
            .collect();
        let mut state = QueryState::with_bindings(database, seeded);
        for (clause, expression) in self.clauses.iter().zip(expressions.iter()) {
            state = expression.evaluate(database, state)?;
            debug!(clause = %clause, success = state.success, rows = state.bindings.len(), "evaluated");
            if !state.success {
                break;
            }
        }
        Ok(state.into_result())
    }
}

// ------------- QueryResult -------------
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub success: bool,
    pub bindings: Vec<Row>,
}

impl QueryResult {
    pub fn failed() -> Self {
        Self {
            success: false,
            bindings: Vec::new(),
        }
    }
    /// Keeps only the named variables in every row.
    pub fn select(&self, variables: &[&str]) -> QueryResult {
        let bindings = self
            .bindings
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(name, _)| variables.contains(&name.as_str()))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .collect();
        QueryResult {
            success: self.success,
            bindings,
        }
    }
}
