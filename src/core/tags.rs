//! # Tags
//!
//! The "current" set of tags that file-paths are associated with, its
//! push/pop stack, and the run-wide condition used to filter file-paths on
//! their tags.

use lazy_static::lazy_static;
use regex::Regex;
use std::{cell::RefCell, collections::BTreeSet, fmt, rc::Rc, str::FromStr};
use thiserror::Error;

lazy_static! {
    static ref TAGS_SEPARATOR_RE: Regex = Regex::new(r"[\s,]+").unwrap();
}

/// A set of tags. Ordered, so that rendering is deterministic.
pub type TagSet = BTreeSet<String>;

/// A handle to a `Tags` object.
///
/// Handles are cloned when an included file shares the tags of the
/// including file, so that mutations are seen on both sides.
pub type SharedTags = Rc<RefCell<Tags>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagsError {
    #[error("Pop of tags from empty stack.")]
    EmptyStack,
}

/// Splits a string of tags separated by whitespace and/or commas.
/// Empty tags are dropped.
pub fn parse_tags_list(string: &str) -> Vec<String> {
    TAGS_SEPARATOR_RE
        .split(string)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// The current tags plus a stack of previously pushed sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    current: TagSet,
    /// Top of the stack is the last element.
    stack: Vec<TagSet>,
}

impl Tags {
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn new_shared() -> SharedTags {
        Rc::new(RefCell::new(Self::new_empty()))
    }

    pub fn current(&self) -> &TagSet {
        &self.current
    }

    /// The stack, most recently pushed set first.
    pub fn stack_from_top(&self) -> Vec<TagSet> {
        self.stack.iter().rev().cloned().collect()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn set<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.current = tags.into_iter().map(Into::into).collect();
    }

    pub fn add<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.current.extend(tags.into_iter().map(Into::into));
    }

    /// Removes the given tags. An empty list removes every tag.
    pub fn remove(&mut self, tags: &[String]) {
        if tags.is_empty() {
            self.clear();
        } else {
            self.current.retain(|tag| !tags.contains(tag));
        }
    }

    pub fn clear(&mut self) {
        self.current.clear();
    }

    /// Saves a copy of the current set. The current set is unaffected.
    pub fn push(&mut self) {
        self.stack.push(self.current.clone());
    }

    /// Replaces the current set with the most recently pushed one.
    /// Leaves everything untouched if the stack is empty.
    pub fn pop(&mut self) -> Result<(), TagsError> {
        let top = self.stack.pop().ok_or(TagsError::EmptyStack)?;
        self.current = top;
        Ok(())
    }
}

// --- CONDITION ---

/// A binary operator `<file tags> OP <filter tags>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperator {
    ContainsAnyOf,
    ContainsNoneOf,
    ProperSubset,
    Subset,
    Equals,
    ProperSuperset,
    Superset,
    Unequals,
}

impl SetOperator {
    pub const ALL: [Self; 8] = [
        Self::ContainsAnyOf,
        Self::ContainsNoneOf,
        Self::ProperSubset,
        Self::Subset,
        Self::Equals,
        Self::ProperSuperset,
        Self::Superset,
        Self::Unequals,
    ];

    pub const DEFAULT: Self = Self::ContainsAnyOf;

    pub fn name(self) -> &'static str {
        match self {
            Self::ContainsAnyOf => "contains-any-of",
            Self::ContainsNoneOf => "contains-none-of",
            Self::ProperSubset => "proper-subset",
            Self::Subset => "subset",
            Self::Equals => "equals",
            Self::ProperSuperset => "proper-superset",
            Self::Superset => "superset",
            Self::Unequals => "unequals",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::ContainsAnyOf => &["any-of"],
            Self::ContainsNoneOf => &["none-of"],
            _ => &[],
        }
    }

    /// Finds an operator by its name or one of its aliases.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name || op.aliases().contains(&name))
    }

    pub fn apply(self, left: &TagSet, right: &TagSet) -> bool {
        match self {
            Self::ContainsAnyOf => !left.is_disjoint(right),
            Self::ContainsNoneOf => left.is_disjoint(right),
            Self::ProperSubset => left.len() < right.len() && left.is_subset(right),
            Self::Subset => left.is_subset(right),
            Self::Equals => left == right,
            Self::ProperSuperset => left.len() > right.len() && left.is_superset(right),
            Self::Superset => left.is_superset(right),
            Self::Unequals => left != right,
        }
    }

    /// Help text listing every operator together with its aliases.
    pub fn all_names_for_help_text() -> String {
        let mut operators = Self::ALL.to_vec();
        operators.sort_by_key(|op| op.name());
        operators
            .iter()
            .map(|op| match op.aliases() {
                [] => op.name().to_string(),
                aliases => format!("{} (alias: {})", op.name(), aliases.join(", ")),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SetOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| {
            format!(
                "unknown operator '{}'. Operators are: {}",
                s,
                Self::all_names_for_help_text()
            )
        })
    }
}

/// The run-wide tags filter. Fixed once the command line has been parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagsCondition {
    /// Every set of tags satisfies the condition.
    #[default]
    Unconditional,
    Compare {
        operator: SetOperator,
        negated: bool,
        operand: TagSet,
    },
}

impl TagsCondition {
    pub fn new(operator: SetOperator, negated: bool, operand: TagSet) -> Self {
        Self::Compare {
            operator,
            negated,
            operand,
        }
    }

    pub fn is_satisfied_by(&self, tags: &TagSet) -> bool {
        match self {
            Self::Unconditional => true,
            Self::Compare {
                operator,
                negated,
                operand,
            } => operator.apply(tags, operand) != *negated,
        }
    }
}

/// How an INCLUDE hands the tags of the including file to the included one.
///
/// - `export`: the included file starts with the tags of the including file.
/// - `import`: modifications made by the included file are seen by the
///   including file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagsIncludePolicy {
    pub export: bool,
    pub import: bool,
}

impl Default for TagsIncludePolicy {
    fn default() -> Self {
        Self {
            export: true,
            import: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(tags: &[&str]) -> TagSet {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_parse_tags_list_splits_on_whitespace_and_commas() {
        assert_eq!(parse_tags_list(" a, b,,c\td "), vec!["a", "b", "c", "d"]);
        assert!(parse_tags_list(" , ").is_empty());
    }

    #[test]
    fn test_add_remove_and_clear() {
        let mut tags = Tags::new_empty();
        tags.add(["a", "b", "c"]);
        tags.remove(&["b".to_string()]);
        assert_eq!(tags.current(), &set(&["a", "c"]));

        tags.remove(&[]);
        assert!(tags.current().is_empty());
    }

    #[test]
    fn test_push_keeps_current_and_pop_restores() {
        let mut tags = Tags::new_empty();
        tags.set(["x"]);
        tags.push();
        assert_eq!(tags.current(), &set(&["x"]));

        tags.add(["y"]);
        tags.pop().unwrap();
        assert_eq!(tags.current(), &set(&["x"]));
        assert_eq!(tags.stack_depth(), 0);
    }

    #[test]
    fn test_pop_of_empty_stack_fails_without_mutation() {
        let mut tags = Tags::new_empty();
        tags.set(["keep"]);

        assert_eq!(tags.pop(), Err(TagsError::EmptyStack));
        assert_eq!(tags.current(), &set(&["keep"]));
    }

    #[test]
    fn test_stack_is_listed_from_top() {
        let mut tags = Tags::new_empty();
        tags.set(["first"]);
        tags.push();
        tags.set(["second"]);
        tags.push();

        assert_eq!(tags.stack_from_top(), vec![set(&["second"]), set(&["first"])]);
    }

    #[test]
    fn test_operator_lookup_by_name_and_alias() {
        assert_eq!(SetOperator::lookup("any-of"), Some(SetOperator::ContainsAnyOf));
        assert_eq!(SetOperator::lookup("none-of"), Some(SetOperator::ContainsNoneOf));
        assert_eq!(SetOperator::lookup("proper-superset"), Some(SetOperator::ProperSuperset));
        assert_eq!(SetOperator::lookup("bogus"), None);
        assert!("bogus".parse::<SetOperator>().is_err());
    }

    #[test]
    fn test_operators_on_concrete_sets() {
        let ab = set(&["a", "b"]);
        let a = set(&["a"]);
        let c = set(&["c"]);

        assert!(SetOperator::ContainsAnyOf.apply(&ab, &a));
        assert!(!SetOperator::ContainsAnyOf.apply(&ab, &c));
        assert!(SetOperator::ContainsNoneOf.apply(&ab, &c));
        assert!(SetOperator::ProperSubset.apply(&a, &ab));
        assert!(!SetOperator::ProperSubset.apply(&ab, &ab));
        assert!(SetOperator::Subset.apply(&ab, &ab));
        assert!(SetOperator::ProperSuperset.apply(&ab, &a));
        assert!(SetOperator::Superset.apply(&ab, &ab));
        assert!(SetOperator::Equals.apply(&ab, &ab));
        assert!(SetOperator::Unequals.apply(&ab, &a));
    }

    #[test]
    fn test_unconditional_is_always_satisfied() {
        assert!(TagsCondition::Unconditional.is_satisfied_by(&TagSet::new()));
        assert!(TagsCondition::default().is_satisfied_by(&set(&["a"])));
    }

    fn tag_set_strategy() -> impl Strategy<Value = TagSet> {
        proptest::collection::btree_set("[a-e]", 0..5)
    }

    proptest! {
        #[test]
        fn prop_negated_operator_is_complement(left in tag_set_strategy(), right in tag_set_strategy()) {
            for operator in SetOperator::ALL {
                let plain = TagsCondition::new(operator, false, right.clone());
                let negated = TagsCondition::new(operator, true, right.clone());
                prop_assert_eq!(plain.is_satisfied_by(&left), !negated.is_satisfied_by(&left));
            }
        }

        #[test]
        fn prop_pop_discards_mutations_made_after_push(
            before in tag_set_strategy(),
            added in tag_set_strategy(),
            removed in proptest::collection::vec("[a-e]", 0..3),
            replaced in tag_set_strategy(),
        ) {
            let mut tags = Tags::new_empty();
            tags.set(before.clone());
            tags.push();
            tags.add(added);
            tags.remove(&removed);
            tags.set(replaced);
            prop_assert!(tags.pop().is_ok());
            prop_assert_eq!(tags.current(), &before);
        }
    }
}
