//! Unification of sentence patterns against the fact tree, and the natural
//! join of the resulting binding rows across several sentences.
use std::collections::HashMap;

use tracing::trace;

use crate::construct::{Database, NodeId, OtherHasher, Unfired};
use crate::datatype::Value;
use crate::error::Result;
use crate::sentence::{Sentence, Token};

/// One candidate solution: variable name to bound value.
pub type Variables = HashMap<String, Value, OtherHasher>;

// a partially matched sentence: what has been bound so far and where we are
struct Context {
    bindings: Variables,
    subtree: NodeId,
}

enum Step<'t> {
    Literal(String),
    Bind(&'t str),
}

fn step<'t>(token: &'t Token, bindings: &Variables) -> Step<'t> {
    match token.value() {
        // a variable seen earlier in the same sentence must match what it
        // was bound to there
        Value::Variable(name) => match bindings.get(name) {
            Some(bound) => Step::Literal(bound.symbol()),
            None => Step::Bind(name),
        },
        value => Step::Literal(value.symbol()),
    }
}

/// Breadth-first expansion of a single sentence from the root. Every
/// surviving context yields its bindings; rows without any variable are
/// dropped, so a ground sentence yields nothing even when it matches.
///
/// Before the children of a context are expanded, listeners registered for
/// the path leading to it are fired, so facts they insert are visible to the
/// expansion that follows.
pub fn unify(database: &mut Database, sentence: &Sentence, unfired: &mut Unfired) -> Result<Vec<Variables>> {
    let mut unified = vec![Context {
        bindings: Variables::default(),
        subtree: database.tree().root(),
    }];
    for token in sentence.tokens() {
        let mut next = Vec::new();
        for context in unified {
            database.fire_before_access_at(context.subtree, unfired)?;
            let tree = database.tree();
            match step(token, &context.bindings) {
                Step::Literal(symbol) => {
                    if let Some(child) = tree.child(context.subtree, &symbol) {
                        next.push(Context {
                            bindings: context.bindings,
                            subtree: child,
                        });
                    }
                }
                Step::Bind(name) => {
                    for child in tree.children(context.subtree) {
                        let Some(node) = tree.node(child) else { continue };
                        let mut bindings = context.bindings.clone();
                        bindings.insert(name.to_owned(), node.get_value());
                        next.push(Context {
                            bindings,
                            subtree: child,
                        });
                    }
                }
            }
        }
        trace!(token = %token.symbol(), contexts = next.len(), "expanded");
        unified = next;
    }
    Ok(unified
        .into_iter()
        .map(|context| context.bindings)
        .filter(|bindings| !bindings.is_empty())
        .collect())
}

/// Left-to-right natural join of the rows each sentence unifies to,
/// starting from `bindings`. An empty starting set means "unconstrained".
pub fn unify_all(
    database: &mut Database,
    bindings: &[Variables],
    sentences: &[Sentence],
    unfired: &mut Unfired,
) -> Result<Vec<Variables>> {
    let mut possible = bindings.to_vec();
    for sentence in sentences {
        let fresh = unify(database, sentence, unfired)?;
        possible = if possible.is_empty() {
            fresh
        } else {
            join(&possible, &fresh)
        };
        possible.retain(|row| !row.is_empty());
        trace!(sentence = %sentence, rows = possible.len(), "joined");
    }
    Ok(possible)
}

/// Every pair of rows that agrees on the variables they share, merged.
pub fn join(old: &[Variables], new: &[Variables]) -> Vec<Variables> {
    let mut joined = Vec::new();
    for old_row in old {
        for new_row in new {
            let compatible = new_row
                .iter()
                .all(|(name, value)| old_row.get(name).is_none_or(|old| old.equal_to(value)));
            if !compatible {
                continue;
            }
            let mut merged = old_row.clone();
            for (name, value) in new_row {
                merged
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
            joined.push(merged);
        }
    }
    joined
}
