// other structures use HashSet or HashMap with a fast hasher
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::collections::{BTreeMap, HashMap, HashSet};

// listeners are shared between the registry and the run that fires them
use std::sync::Arc;

use tracing::debug;

// our own stuff that we need
use crate::datatype::{Cardinality, Value};
use crate::error::{ArborError, Result};
use crate::sentence::{Sentence, Token};

// ------------- NodeId -------------
pub type NodeId = u64;

pub type NodeHasher = BuildHasherDefault<SeaHasher>;
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub const ROOT: NodeId = 0;
pub const ROOT_SYMBOL: &str = "root";

#[derive(Debug)]
pub struct NodeIdGenerator {
    lower_bound: NodeId,
}

impl NodeIdGenerator {
    pub fn new() -> Self {
        Self { lower_bound: ROOT }
    }
    // Ids are never reused. A listener may remove nodes while a unification
    // still holds their ids, and those must resolve to nothing afterwards.
    pub fn generate(&mut self) -> NodeId {
        self.lower_bound += 1;
        self.lower_bound
    }
}

impl Default for NodeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Node -------------
#[derive(Debug)]
pub struct Node {
    value: Value,
    cardinality: Cardinality,
    children: HashMap<String, NodeId, OtherHasher>,
    // only used to rebuild paths, the tree owns every node
    parent: Option<NodeId>,
}

impl Node {
    pub fn new(value: Value, cardinality: Cardinality) -> Self {
        Self {
            value,
            cardinality,
            children: HashMap::default(),
            parent: None,
        }
    }
    pub fn from_token(token: &Token) -> Self {
        Self::new(token.value().clone(), token.cardinality())
    }
    pub fn value(&self) -> &Value {
        &self.value
    }
    pub fn get_value(&self) -> Value {
        self.value.clone()
    }
    pub fn symbol(&self) -> String {
        self.value.symbol()
    }
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
    pub fn has_child(&self, symbol: &str) -> bool {
        self.children.contains_key(symbol)
    }
    pub fn get_child(&self, symbol: &str) -> Option<NodeId> {
        self.children.get(symbol).copied()
    }
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
    /// Same value and cardinality, but no children and no parent.
    pub fn copy(&self) -> Node {
        Node::new(self.value.clone(), self.cardinality)
    }
    pub fn equal_to(&self, other: &Node) -> bool {
        self.value.equal_to(&other.value)
    }
    pub fn not_equal_to(&self, other: &Node) -> bool {
        self.value.not_equal_to(&other.value)
    }
    pub fn less_than(&self, other: &Node) -> Result<bool> {
        self.value.less_than(&other.value)
    }
    pub fn less_than_or_equal(&self, other: &Node) -> Result<bool> {
        self.value.less_than_or_equal(&other.value)
    }
    pub fn greater_than(&self, other: &Node) -> Result<bool> {
        self.value.greater_than(&other.value)
    }
    pub fn greater_than_or_equal(&self, other: &Node) -> Result<bool> {
        self.value.greater_than_or_equal(&other.value)
    }
}

// ------------- Tree -------------
/// Owning arena of nodes. Children are referenced by id and a parent link is
/// a plain id lookup.
#[derive(Debug)]
pub struct Tree {
    nodes: HashMap<NodeId, Node, NodeHasher>,
    generator: NodeIdGenerator,
}

impl Tree {
    pub fn new() -> Self {
        let mut nodes = HashMap::<NodeId, Node, NodeHasher>::default();
        nodes.insert(
            ROOT,
            Node::new(Value::Symbol(ROOT_SYMBOL.to_owned()), Cardinality::Many),
        );
        Self {
            nodes,
            generator: NodeIdGenerator::new(),
        }
    }
    pub fn root(&self) -> NodeId {
        ROOT
    }
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }
    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    /// True when nothing but the root is left.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
    pub fn child(&self, id: NodeId, symbol: &str) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.get_child(symbol))
    }
    pub fn has_child(&self, id: NodeId, symbol: &str) -> bool {
        self.child(id, symbol).is_some()
    }
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|node| node.children.values().copied().collect())
            .unwrap_or_default()
    }
    pub fn add_child(&mut self, parent: NodeId, mut child: Node) -> Result<NodeId> {
        let symbol = child.symbol();
        let parent_node = self.nodes.get(&parent).ok_or_else(|| {
            ArborError::Structure(format!("Cannot add {} under a removed node", symbol))
        })?;
        match parent_node.cardinality {
            Cardinality::None => {
                return Err(ArborError::Structure(format!(
                    "Cannot add {} to node {} with cardinality None",
                    symbol,
                    parent_node.symbol()
                )));
            }
            Cardinality::One if parent_node.child_count() >= 1 => {
                return Err(ArborError::Structure(format!(
                    "Cannot add {} as additional child to node {} with cardinality One",
                    symbol,
                    parent_node.symbol()
                )));
            }
            _ => (),
        }
        if parent_node.has_child(&symbol) {
            return Err(ArborError::Structure(format!(
                "Node {} already has a child {}",
                parent_node.symbol(),
                symbol
            )));
        }
        let id = self.generator.generate();
        child.parent = Some(parent);
        self.nodes.insert(id, child);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.insert(symbol, id);
        }
        Ok(id)
    }
    /// Removes the named child and its whole subtree.
    pub fn remove_child(&mut self, parent: NodeId, symbol: &str) -> bool {
        let removed = self
            .nodes
            .get_mut(&parent)
            .and_then(|node| node.children.remove(symbol));
        match removed {
            Some(child) => {
                self.release(child);
                true
            }
            None => false,
        }
    }
    pub fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = match self.nodes.get_mut(&id) {
            Some(node) => node.children.drain().map(|(_, child)| child).collect(),
            None => return,
        };
        for child in children {
            self.release(child);
        }
    }
    fn release(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                pending.extend(node.children.into_values());
            }
        }
    }
    fn lineage(&self, id: NodeId) -> Vec<&Node> {
        let mut lineage = Vec::new();
        let mut current = self.nodes.get(&id);
        while let Some(node) = current {
            // the synthetic root is never part of a path
            let Some(parent) = node.parent else { break };
            lineage.push(node);
            current = self.nodes.get(&parent);
        }
        lineage.reverse();
        lineage
    }
    /// The path leading to a node, with `!` after every parent of
    /// cardinality One and `.` otherwise. Empty for the root.
    pub fn path(&self, id: NodeId) -> String {
        let lineage = self.lineage(id);
        let mut path = String::new();
        for (i, node) in lineage.iter().enumerate() {
            if i > 0 {
                path.push(lineage[i - 1].cardinality.separator());
            }
            path += &node.symbol();
        }
        path
    }
    /// The path leading to a node as a sentence, `None` for the root or a
    /// removed node.
    pub fn sentence(&self, id: NodeId) -> Option<Sentence> {
        let lineage = self.lineage(id);
        let last = lineage.len().checked_sub(1)?;
        let tokens = lineage
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let cardinality = if i == last {
                    Cardinality::Many
                } else {
                    node.cardinality
                };
                Token::new(node.value.clone(), cardinality)
            })
            .collect();
        Some(Sentence::from_tokens(tokens))
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Before access -------------
/// Invoked before a matching part of the tree is read, typically to
/// materialize derived facts. Listeners may mutate the database.
///
/// During unification a prefix fires when the path it names is expanded,
/// that is before its children are read. A listener that materializes
/// `astrid.mood!happy` is registered on `astrid`, not on `astrid.mood`.
pub type Listener = Arc<dyn Fn(&mut Database) -> Result<()> + Send + Sync>;

/// Registered prefixes that have not yet fired during one query run.
pub type Unfired = HashSet<String, OtherHasher>;

struct BeforeAccess {
    prefix: Sentence,
    listeners: Vec<Listener>,
}

// ------------- Database -------------
/// The fact tree plus the before-access listener registry.
///
/// Callers serialize access themselves; nothing in here locks.
pub struct Database {
    tree: Tree,
    before_access: BTreeMap<String, BeforeAccess>,
}

impl Database {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            before_access: BTreeMap::new(),
        }
    }
    pub fn tree(&self) -> &Tree {
        &self.tree
    }
    pub fn has_variables(path: &str) -> Result<bool> {
        Ok(Sentence::parse(path)?.has_variables())
    }

    pub fn insert(&mut self, path: &str) -> Result<()> {
        self.insert_sentence(&Sentence::parse(path)?)
    }
    /// Inserting is idempotent for identical paths and overwrites the single
    /// value held under a parent of cardinality One.
    pub fn insert_sentence(&mut self, sentence: &Sentence) -> Result<()> {
        sentence.ensure_ground()?;
        debug!(sentence = %sentence, "insert");
        let mut subtree = self.tree.root();
        for token in sentence.tokens() {
            let symbol = token.symbol();
            subtree = match self.tree.child(subtree, &symbol) {
                Some(existing) => {
                    let existing_cardinality = self
                        .tree
                        .node(existing)
                        .map(Node::cardinality)
                        .unwrap_or(token.cardinality());
                    if existing_cardinality != token.cardinality() {
                        return Err(ArborError::Cardinality {
                            symbol,
                            sentence: sentence.to_string(),
                        });
                    }
                    existing
                }
                None => {
                    let holds_one = self
                        .tree
                        .node(subtree)
                        .is_some_and(|node| node.cardinality() == Cardinality::One);
                    if holds_one {
                        self.tree.clear_children(subtree);
                    }
                    self.tree.add_child(subtree, Node::from_token(token))?
                }
            };
        }
        Ok(())
    }

    /// Checks a ground sentence against the tree, firing any due
    /// before-access listeners once for this call.
    pub fn assert(&mut self, path: &str) -> Result<bool> {
        let sentence = Sentence::parse(path)?;
        let mut unfired = self.unfired();
        self.assert_sentence(&sentence, &mut unfired)
    }
    pub fn assert_sentence(&mut self, sentence: &Sentence, unfired: &mut Unfired) -> Result<bool> {
        sentence.ensure_ground()?;
        self.fire_before_access(sentence, unfired)?;
        let mut current = self.tree.root();
        let last = sentence.len().saturating_sub(1);
        for (i, token) in sentence.tokens().iter().enumerate() {
            let Some(child) = self.tree.child(current, &token.symbol()) else {
                return Ok(false);
            };
            // the cardinality of the final node is never checked
            if i == last {
                return Ok(true);
            }
            current = child;
            match self.tree.node(current) {
                Some(node) if node.cardinality() == token.cardinality() => (),
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    pub fn delete(&mut self, path: &str) -> Result<bool> {
        self.delete_sentence(&Sentence::parse(path)?)
    }
    /// Removes the last token of the sentence and everything beneath it.
    /// Deleting something that is not there is a no-op.
    pub fn delete_sentence(&mut self, sentence: &Sentence) -> Result<bool> {
        sentence.ensure_ground()?;
        let Some((last, leading)) = sentence.tokens().split_last() else {
            return Ok(false);
        };
        let mut current = self.tree.root();
        for token in leading {
            match self.tree.child(current, &token.symbol()) {
                Some(child) => current = child,
                None => return Ok(false),
            }
        }
        let removed = self.tree.remove_child(current, &last.symbol());
        debug!(sentence = %sentence, removed, "delete");
        Ok(removed)
    }

    pub fn clear(&mut self) {
        debug!(nodes = self.tree.len() - 1, "clear");
        let root = self.tree.root();
        self.tree.clear_children(root);
    }

    pub fn add_before_access_listener(&mut self, prefix: &str, listener: Listener) -> Result<()> {
        let sentence = Sentence::parse(prefix)?;
        self.before_access
            .entry(prefix.to_owned())
            .or_insert_with(|| BeforeAccess {
                prefix: sentence,
                listeners: Vec::new(),
            })
            .listeners
            .push(listener);
        Ok(())
    }
    /// Listeners are identified by the `Arc` they were registered with.
    pub fn remove_before_access_listener(&mut self, prefix: &str, listener: &Listener) -> bool {
        let Some(entry) = self.before_access.get_mut(prefix) else {
            return false;
        };
        let before = entry.listeners.len();
        entry.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        let removed = entry.listeners.len() < before;
        if entry.listeners.is_empty() {
            self.before_access.remove(prefix);
        }
        removed
    }
    pub fn remove_all_before_access_listeners(&mut self, prefix: &str) -> bool {
        self.before_access.remove(prefix).is_some()
    }
    /// Snapshot of every registered prefix, taken when a query run starts.
    pub fn unfired(&self) -> Unfired {
        self.before_access.keys().cloned().collect()
    }

    /// Fires, at most once per `unfired` set, the listeners of every
    /// registered prefix that `sentence` starts with.
    pub fn fire_before_access(&mut self, sentence: &Sentence, unfired: &mut Unfired) -> Result<()> {
        if unfired.is_empty() {
            return Ok(());
        }
        let due: Vec<String> = self
            .before_access
            .iter()
            .filter(|(key, entry)| unfired.contains(*key) && sentence.starts_with(&entry.prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for prefix in due {
            unfired.remove(&prefix);
            let listeners = match self.before_access.get(&prefix) {
                Some(entry) => entry.listeners.clone(),
                None => continue,
            };
            debug!(prefix = %prefix, listeners = listeners.len(), trigger = %sentence, "before access");
            for listener in listeners {
                listener(self)?;
            }
        }
        Ok(())
    }
    /// As [`Database::fire_before_access`], for the path leading to a node.
    pub fn fire_before_access_at(&mut self, id: NodeId, unfired: &mut Unfired) -> Result<()> {
        if unfired.is_empty() {
            return Ok(());
        }
        match self.tree.sentence(id) {
            Some(sentence) => self.fire_before_access(&sentence, unfired),
            None => Ok(()),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
