//! Name-indexed view over one extraction pass.

use std::collections::HashMap;
use std::mem;

use crate::Directive;

/// Directives sharing one command name.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEntry {
    /// The name occurs once.
    Single(Directive),
    /// The name occurs more than once, in extraction order.
    Many(Vec<Directive>),
}

impl GroupEntry {
    /// Iterate occurrences in extraction order.
    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        match self {
            Self::Single(directive) => std::slice::from_ref(directive).iter(),
            Self::Many(directives) => directives.iter(),
        }
    }

    /// The first occurrence.
    #[must_use]
    pub fn first(&self) -> &Directive {
        match self {
            Self::Single(directive) => directive,
            // A list is only created from two or more occurrences.
            Self::Many(directives) => &directives[0],
        }
    }

    /// Number of occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(directives) => directives.len(),
        }
    }

    /// Always `false`; an entry holds at least one occurrence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The occurrence at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Directive> {
        self.iter().nth(index)
    }

    /// The occurrence, when the name occurs exactly once.
    #[must_use]
    pub fn as_single(&self) -> Option<&Directive> {
        match self {
            Self::Single(directive) => Some(directive),
            Self::Many(_) => None,
        }
    }

    /// All occurrences, when the name is repeated.
    #[must_use]
    pub fn as_many(&self) -> Option<&[Directive]> {
        match self {
            Self::Single(_) => None,
            Self::Many(directives) => Some(directives),
        }
    }

    fn push(&mut self, directive: Directive) {
        match self {
            Self::Single(existing) => {
                let existing = mem::replace(existing, directive.clone());
                *self = Self::Many(vec![existing, directive]);
            }
            Self::Many(directives) => directives.push(directive),
        }
    }
}

impl<'a> IntoIterator for &'a GroupEntry {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Directives keyed by camel-case command name.
///
/// A name seen once maps to [`GroupEntry::Single`]; a repeated name maps to
/// [`GroupEntry::Many`], whose elements are also reachable as `name.$index`
/// through [`get_alias`](Self::get_alias).
///
/// # Example
///
/// ```
/// use quill_directive::{CommandRegistry, DirectiveParser};
///
/// let parser = DirectiveParser::new(CommandRegistry::new());
/// let group = parser.parse_group("@foo:: 1; @foo:: 2; @bar:: 3;").unwrap();
///
/// assert_eq!(group.get("foo").map(|e| e.len()), Some(2));
/// assert!(group.get("bar").and_then(|e| e.as_single()).is_some());
/// assert_eq!(group.get_alias("foo.$1").map(|d| d.content()), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveGroup {
    directives: Vec<Directive>,
    entries: HashMap<String, GroupEntry>,
    names: Vec<String>,
}

impl DirectiveGroup {
    /// Group `directives` in one pass, keeping their order.
    #[must_use]
    pub fn new(directives: Vec<Directive>) -> Self {
        let mut entries: HashMap<String, GroupEntry> = HashMap::with_capacity(directives.len());
        let mut names = Vec::new();

        for directive in &directives {
            match entries.get_mut(directive.command()) {
                Some(entry) => entry.push(directive.clone()),
                None => {
                    names.push(directive.command().to_owned());
                    entries.insert(
                        directive.command().to_owned(),
                        GroupEntry::Single(directive.clone()),
                    );
                }
            }
        }

        Self {
            directives,
            entries,
            names,
        }
    }

    /// Entry for the camel-case command `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GroupEntry> {
        self.entries.get(name)
    }

    /// Look up an indexed alias such as `foo.$1`.
    ///
    /// Aliases exist only for names with more than one occurrence.
    #[must_use]
    pub fn get_alias(&self, key: &str) -> Option<&Directive> {
        let (name, index) = key.rsplit_once(".$")?;
        let index = index.parse::<usize>().ok()?;
        self.entries.get(name)?.as_many()?.get(index)
    }

    /// Alias keys of every repeated name, in first-occurrence order.
    #[must_use]
    pub fn aliases(&self) -> Vec<String> {
        self.names
            .iter()
            .filter_map(|name| Some((name, self.entries.get(name)?.as_many()?.len())))
            .flat_map(|(name, len)| (0..len).map(move |i| alias(name, i)))
            .collect()
    }

    /// All directives in extraction order.
    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.directives.iter()
    }

    /// Distinct command names in first-occurrence order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Total number of directives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Whether the extraction found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

impl<'a> IntoIterator for &'a DirectiveGroup {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Alias key for occurrence `index` of `name`.
#[must_use]
pub fn alias(name: &str, index: usize) -> String {
    format!("{name}.${index}")
}

/// Group `directives` by command name.
#[must_use]
pub fn group(directives: Vec<Directive>) -> DirectiveGroup {
    DirectiveGroup::new(directives)
}
