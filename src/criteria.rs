//! Query Criteria
//!
//! The two strategies filter on different things and keep separate types:
//!
//! - [`StructuralCriteria`] (indexed strategy): optional predicates over the
//!   keyspace name, the id and the decoded value, combined with AND. A
//!   missing predicate accepts everything.
//! - [`TextualCriteria`] (scan strategy): a key prefix and a value substring
//!   matched against the raw engine key and the raw stored bytes as text.

type TextPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Conjunction of independently optional predicates over decoded entries
pub struct StructuralCriteria<T> {
    keyspace: Option<TextPredicate>,
    id: Option<TextPredicate>,
    value: Option<Box<dyn Fn(&T) -> bool + Send + Sync>>,
}

impl<T> StructuralCriteria<T> {
    /// Criteria that match every entry
    pub fn new() -> Self {
        Self {
            keyspace: None,
            id: None,
            value: None,
        }
    }

    pub fn keyspace(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.keyspace = Some(Box::new(f));
        self
    }

    pub fn id(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.id = Some(Box::new(f));
        self
    }

    pub fn value(mut self, f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.value = Some(Box::new(f));
        self
    }

    pub fn matches(&self, keyspace: &str, id: &str, value: &T) -> bool {
        self.keyspace.as_ref().map_or(true, |f| f(keyspace))
            && self.id.as_ref().map_or(true, |f| f(id))
            && self.value.as_ref().map_or(true, |f| f(value))
    }
}

impl<T> Default for StructuralCriteria<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for StructuralCriteria<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralCriteria")
            .field("keyspace", &self.keyspace.is_some())
            .field("id", &self.id.is_some())
            .field("value", &self.value.is_some())
            .finish()
    }
}

/// Key-prefix plus value-substring match on raw engine text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextualCriteria {
    pub key_prefix: String,
    pub value_contains: String,
}

impl TextualCriteria {
    pub fn new(key_prefix: impl Into<String>, value_contains: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            value_contains: value_contains.into(),
        }
    }

    /// Non-UTF-8 bytes are compared in their lossy string form
    pub fn matches(&self, key: &[u8], value: &[u8]) -> bool {
        String::from_utf8_lossy(key).starts_with(self.key_prefix.as_str())
            && String::from_utf8_lossy(value).contains(self.value_contains.as_str())
    }
}
