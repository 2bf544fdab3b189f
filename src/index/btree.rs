//! In-memory B+Tree
//!
//! ## Design
//! - **Arena**: nodes live in one `Vec` and refer to each other by `NodeId`,
//!   so the leaf sibling chain is plain indices instead of shared pointers
//! - **Proactive splitting**: a full child is split before the insert
//!   descends into it, so the recursive step always lands on a non-full node
//! - **Upsert**: inserting an existing key replaces its value in place
//! - No deletion; callers rebuild the tree when rows disappear
//!
//! ```text
//!              [30]
//!            /      \
//!     [10 | 20]    [30 | 40]      internal: len(children) == len(keys) + 1
//!     /   |   \     /   |   \
//!   L0 -> L1 -> L2 -> L3 -> L4    leaves: one ascending singly-linked chain
//! ```
use crate::error::{MiniSqlError, Result};
use tracing::trace;

/// Smallest supported order
pub const MIN_ORDER: usize = 3;

/// Arena slot of a node
pub type NodeId = usize;

#[derive(Debug, Clone)]
enum NodeKind<V> {
    Leaf {
        values: Vec<V>,
        next: Option<NodeId>,
    },
    Internal {
        children: Vec<NodeId>,
    },
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    keys: Vec<K>,
    kind: NodeKind<V>,
}

impl<K, V> Node<K, V> {
    fn new_leaf() -> Self {
        Self {
            keys: Vec::new(),
            kind: NodeKind::Leaf {
                values: Vec::new(),
                next: None,
            },
        }
    }

    fn new_internal(children: Vec<NodeId>) -> Self {
        Self {
            keys: Vec::new(),
            kind: NodeKind::Internal { children },
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// B+Tree statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BTreeStats {
    pub total_keys: usize,
    pub leaf_nodes: usize,
    pub internal_nodes: usize,
    pub tree_height: usize,
}

/// Order-`m` B+Tree mapping ordered keys to values
#[derive(Debug, Clone)]
pub struct BPlusTree<K, V> {
    order: usize,
    nodes: Vec<Node<K, V>>,
    root: NodeId,
    len: usize,
    height: usize,
}

/// First-key-greater rule: index of the child that may hold `key`
fn child_index<K: Ord>(keys: &[K], key: &K) -> usize {
    keys.partition_point(|k| k <= key)
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Create an empty tree. `order` is the max number of children per
    /// internal node; a node holds at most `order - 1` keys.
    pub fn new(order: usize) -> Result<Self> {
        if order < MIN_ORDER {
            return Err(MiniSqlError::Index(format!(
                "B+Tree order must be >= {}, got {}",
                MIN_ORDER, order
            )));
        }
        Ok(Self {
            order,
            nodes: vec![Node::new_leaf()],
            root: 0,
            len: 0,
            height: 1,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, counting the leaf level
    pub fn height(&self) -> usize {
        self.height
    }

    /// Point lookup
    pub fn search(&self, key: &K) -> Option<&V> {
        let node = &self.nodes[self.find_leaf(key)];
        let pos = node.keys.binary_search(key).ok()?;
        match &node.kind {
            NodeKind::Leaf { values, .. } => values.get(pos),
            NodeKind::Internal { .. } => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Insert or replace. Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.is_full(self.root) {
            let old_root = self.root;
            let new_root = self.alloc(Node::new_internal(vec![old_root]));
            self.root = new_root;
            self.height += 1;
            self.split_child(new_root, 0);
            trace!(height = self.height, "b+tree root grew");
        }

        let mut current = self.root;
        loop {
            let (mut idx, child) = match &self.nodes[current].kind {
                NodeKind::Leaf { .. } => break,
                NodeKind::Internal { children } => {
                    let idx = child_index(&self.nodes[current].keys, &key);
                    (idx, children[idx])
                }
            };

            if self.is_full(child) {
                self.split_child(current, idx);
                if key >= self.nodes[current].keys[idx] {
                    idx += 1;
                }
                current = self.child_at(current, idx);
            } else {
                current = child;
            }
        }

        let leaf = &mut self.nodes[current];
        let NodeKind::Leaf { values, .. } = &mut leaf.kind else {
            unreachable!("descent always ends on a leaf");
        };
        match leaf.keys.binary_search(&key) {
            Ok(pos) => Some(std::mem::replace(&mut values[pos], value)),
            Err(pos) => {
                leaf.keys.insert(pos, key);
                values.insert(pos, value);
                self.len += 1;
                None
            }
        }
    }

    /// All entries in ascending key order, following the leaf chain
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            leaf: Some(self.leftmost_leaf()),
            pos: 0,
        }
    }

    /// Entries with `start <= key <= end`, in ascending order
    pub fn range<'a>(&'a self, start: &K, end: &'a K) -> impl Iterator<Item = (&'a K, &'a V)> + 'a {
        let leaf = self.find_leaf(start);
        let pos = self.nodes[leaf].keys.partition_point(|k| k < start);
        Iter {
            tree: self,
            leaf: Some(leaf),
            pos,
        }
        .take_while(move |(k, _)| *k <= end)
    }

    pub fn first_key(&self) -> Option<&K> {
        self.iter().next().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&K> {
        let mut current = self.root;
        loop {
            match &self.nodes[current].kind {
                NodeKind::Leaf { .. } => return self.nodes[current].keys.last(),
                NodeKind::Internal { children } => current = *children.last()?,
            }
        }
    }

    pub fn stats(&self) -> BTreeStats {
        let leaf_nodes = self.nodes.iter().filter(|n| n.is_leaf()).count();
        BTreeStats {
            total_keys: self.len,
            leaf_nodes,
            internal_nodes: self.nodes.len() - leaf_nodes,
            tree_height: self.height,
        }
    }

    /// Check structural invariants: key bounds, fan-out, uniform depth and
    /// an ascending leaf chain covering every key.
    pub fn validate(&self) -> Result<()> {
        let mut leaf_depth = None;
        self.validate_node(self.root, None, None, 1, &mut leaf_depth)?;

        let mut count = 0;
        let mut prev: Option<&K> = None;
        for (key, _) in self.iter() {
            if prev.is_some_and(|p| p >= key) {
                return Err(MiniSqlError::Index("leaf chain is not strictly ascending".into()));
            }
            prev = Some(key);
            count += 1;
        }
        if count != self.len {
            return Err(MiniSqlError::Index(format!(
                "leaf chain holds {} keys, expected {}",
                count, self.len
            )));
        }
        Ok(())
    }

    fn validate_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<()> {
        let node = &self.nodes[id];
        if node.keys.len() > self.order - 1 {
            return Err(MiniSqlError::Index(format!("node {} overflows", id)));
        }
        if node.keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MiniSqlError::Index(format!("node {} keys out of order", id)));
        }
        let in_bounds = node.keys.iter().all(|k| {
            lower.map_or(true, |lo| k >= lo) && upper.map_or(true, |hi| k < hi)
        });
        if !in_bounds {
            return Err(MiniSqlError::Index(format!("node {} violates separator bounds", id)));
        }

        match &node.kind {
            NodeKind::Leaf { values, .. } => {
                if values.len() != node.keys.len() {
                    return Err(MiniSqlError::Index(format!("leaf {} key/value mismatch", id)));
                }
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(d) if d != depth => {
                        return Err(MiniSqlError::Index("leaves at different depths".into()));
                    }
                    Some(_) => {}
                }
                if depth != self.height {
                    return Err(MiniSqlError::Index("height counter out of sync".into()));
                }
            }
            NodeKind::Internal { children } => {
                if children.len() != node.keys.len() + 1 {
                    return Err(MiniSqlError::Index(format!("internal {} fan-out mismatch", id)));
                }
                for (i, &child) in children.iter().enumerate() {
                    let lo = if i == 0 { lower } else { Some(&node.keys[i - 1]) };
                    let hi = if i == node.keys.len() { upper } else { Some(&node.keys[i]) };
                    self.validate_node(child, lo, hi, depth + 1, leaf_depth)?;
                }
            }
        }
        Ok(())
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn is_full(&self, id: NodeId) -> bool {
        self.nodes[id].keys.len() >= self.order - 1
    }

    fn child_at(&self, id: NodeId, idx: usize) -> NodeId {
        match &self.nodes[id].kind {
            NodeKind::Internal { children } => children[idx],
            NodeKind::Leaf { .. } => unreachable!("leaf {} has no children", id),
        }
    }

    fn find_leaf(&self, key: &K) -> NodeId {
        let mut current = self.root;
        loop {
            match &self.nodes[current].kind {
                NodeKind::Leaf { .. } => return current,
                NodeKind::Internal { children } => {
                    current = children[child_index(&self.nodes[current].keys, key)];
                }
            }
        }
    }

    fn leftmost_leaf(&self) -> NodeId {
        let mut current = self.root;
        while let NodeKind::Internal { children } = &self.nodes[current].kind {
            current = children[0];
        }
        current
    }

    /// Split the full child at `index` of internal node `parent`.
    ///
    /// Leaf: upper half moves to a new right sibling whose first key is
    /// copied up. Internal: the middle key moves up and is removed.
    fn split_child(&mut self, parent: NodeId, index: usize) {
        let child = self.child_at(parent, index);
        let mid = (self.order - 1) / 2;
        let new_id = self.nodes.len();

        let node = &mut self.nodes[child];
        let (separator, sibling) = match &mut node.kind {
            NodeKind::Leaf { values, next } => {
                let right_keys = node.keys.split_off(mid);
                let right_values = values.split_off(mid);
                let separator = right_keys[0].clone();
                let sibling = Node {
                    keys: right_keys,
                    kind: NodeKind::Leaf {
                        values: right_values,
                        next: *next,
                    },
                };
                *next = Some(new_id);
                (separator, sibling)
            }
            NodeKind::Internal { children } => {
                let right_keys = node.keys.split_off(mid + 1);
                let separator = match node.keys.pop() {
                    Some(k) => k,
                    None => unreachable!("full internal node has a middle key"),
                };
                let right_children = children.split_off(mid + 1);
                let sibling = Node {
                    keys: right_keys,
                    kind: NodeKind::Internal {
                        children: right_children,
                    },
                };
                (separator, sibling)
            }
        };
        let leaf_split = sibling.is_leaf();
        self.alloc(sibling);

        let parent_node = &mut self.nodes[parent];
        parent_node.keys.insert(index, separator);
        if let NodeKind::Internal { children } = &mut parent_node.kind {
            children.insert(index + 1, new_id);
        }
        trace!(parent, child, sibling = new_id, leaf_split, "b+tree node split");
    }
}

/// Ascending iterator over the leaf chain
pub struct Iter<'a, K, V> {
    tree: &'a BPlusTree<K, V>,
    leaf: Option<NodeId>,
    pos: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let node = &tree.nodes[self.leaf?];
            let NodeKind::Leaf { values, next } = &node.kind else {
                return None;
            };
            if self.pos < node.keys.len() {
                let item = (&node.keys[self.pos], &values[self.pos]);
                self.pos += 1;
                return Some(item);
            }
            self.leaf = *next;
            self.pos = 0;
        }
    }
}
