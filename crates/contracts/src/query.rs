//! Query - immutable request payload shared by all replica workers
//!
//! Uses Arc<str> internally so every worker can hold its own handle
//! without copying the query text.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Query text submitted once per dispatch call.
///
/// Cloning only increments a reference count, so the dispatcher hands one
/// clone to each replica worker.
///
/// # Examples
/// ```
/// use contracts::Query;
///
/// let query: Query = "SELECT * FROM users".into();
/// let for_worker = query.clone();
/// assert_eq!(query, for_worker);
/// assert_eq!(query.as_str(), "SELECT * FROM users");
/// ```
#[derive(Clone, Default)]
pub struct Query(Arc<str>);

impl Query {
    /// Create a new Query from a string slice.
    #[inline]
    pub fn new(text: &str) -> Self {
        Self(Arc::from(text))
    }

    /// Get the query text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the query text in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the query text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Query {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Query {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Query {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for Query {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&Query> for Query {
    #[inline]
    fn from(q: &Query) -> Self {
        q.clone()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query({:?})", self.0)
    }
}

impl PartialEq for Query {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Query {}

impl PartialEq<str> for Query {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for Query {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for Query {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
