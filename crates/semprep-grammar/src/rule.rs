//! Production rules and per-instance action spaces.
//!
//! An [`ActionSpace`] is the dense, zero-based index assignment over one
//! world's rule enumeration. It is an arena (ordered array) plus a reverse
//! map, built fresh per instance; two instances with overlapping rule strings
//! still get independent index assignments.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::world::World;

/// Separator between the two sides of a production rule string.
pub const RULE_ARROW: &str = " -> ";

/// One grammar rewrite, written `LHS -> RHS`.
///
/// `is_global` tags provenance: global rules (fixed operators, types) are
/// reusable across instances; instance-specific rules are derived from one
/// instance's entities. The tag never filters the rule set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductionRule {
    pub rule: String,
    pub is_global: bool,
}

impl ProductionRule {
    /// Left-hand symbol, or the whole string if there is no arrow.
    pub fn lhs(&self) -> &str {
        match self.rule.split_once(RULE_ARROW) {
            Some((lhs, _)) => lhs,
            None => &self.rule,
        }
    }

    /// Right-hand side, or `""` if there is no arrow.
    pub fn rhs(&self) -> &str {
        match self.rule.split_once(RULE_ARROW) {
            Some((_, rhs)) => rhs,
            None => "",
        }
    }
}

/// One derivation of a logical form, as indices into one instance's
/// [`ActionSpace`]. Order encodes the top-down derivation.
pub type ActionSequence = Vec<usize>;

/// The full rule set of one instance, in the world's enumeration order,
/// with a reverse map from rule string to index.
///
/// Invariants:
/// - indices are dense and zero-based: `rules[i]` has index `i`;
/// - enumeration order is preserved exactly (no sorting, no dedup);
/// - if the world emits the same rule string twice, both occurrences are
///   enumerable by position but the reverse map keeps only the *later*
///   index. Grammars are expected not to do this; the behavior is pinned
///   rather than rejected because index fields reference raw positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpace {
    rules: Vec<ProductionRule>,
    index: HashMap<String, usize>,
}

impl ActionSpace {
    /// Enumerate `world.all_possible_actions()` and assign indices in that
    /// exact order, classifying each rule via the world's entity predicate.
    pub fn build<W: World>(world: &W) -> Self {
        let mut rules = Vec::new();
        let mut index = HashMap::new();
        for (i, rule) in world.all_possible_actions().into_iter().enumerate() {
            let rhs = match rule.split_once(RULE_ARROW) {
                Some((_, rhs)) => rhs,
                None => "",
            };
            let is_global = !world.is_instance_specific_entity(rhs);
            index.insert(rule.clone(), i);
            rules.push(ProductionRule { rule, is_global });
        }
        ActionSpace { rules, index }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule at `index`, in enumeration order.
    pub fn rule(&self, index: usize) -> Option<&ProductionRule> {
        self.rules.get(index)
    }

    pub fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    /// Reverse lookup: rule string to its (possibly shadowed) index.
    pub fn index_of(&self, rule: &str) -> Option<usize> {
        self.index.get(rule).copied()
    }
}
