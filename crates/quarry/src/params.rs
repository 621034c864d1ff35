//! Named parameter map.

use crate::value::Value;

/// An ordered map from placeholder name to bound [`Value`].
///
/// Insertion order is kept because `insert`/`update` render their column lists
/// from the attribute keys. Setting an existing key replaces its value in place
/// (the key keeps its original position). A leading `:` on a key is stripped,
/// so `":id"` and `"id"` name the same parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

fn normalize_key(key: impl Into<String>) -> String {
    let key = key.into();
    match key.strip_prefix(':') {
        Some(stripped) => stripped.to_string(),
        None => key,
    }
}

impl Params {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `key`, replacing any previous binding.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = normalize_key(key);
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Chainable form of [`Params::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = key.strip_prefix(':').unwrap_or(key);
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Merge `other` into this map; values from `other` win on key collision.
    pub fn merge(&mut self, other: &Params) -> &mut Self {
        for (key, value) in &other.entries {
            self.set(key.as_str(), value.clone());
        }
        self
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

impl<K, V> Extend<(K, V)> for Params
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build a [`Params`] map inline.
///
/// ```ignore
/// use quarry::params;
///
/// let attrs = params! { "name" => "alice", "age" => 30 };
/// let none = params! {};
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::Params::new();
        $( params.set($key, $value); )+
        params
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_binding_overwrites_in_place() {
        let mut p = Params::new();
        p.set("a", 1).set("b", 2).set("a", 3);
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(p.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn colon_prefix_is_stripped() {
        let p = Params::new().with(":id", 9);
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(p.get(":id"), Some(&Value::Int(9)));
        assert!(p.contains_key("id"));
    }

    #[test]
    fn merge_prefers_incoming_values() {
        let mut base = crate::params! { "id" => 1, "name" => "old" };
        base.merge(&crate::params! { "name" => "new", "age" => 5 });
        assert_eq!(base.keys().collect::<Vec<_>>(), vec!["id", "name", "age"]);
        assert_eq!(base.get("name"), Some(&Value::from("new")));
    }

    #[test]
    fn collects_from_pairs() {
        let p: Params = vec![("x", 1_i64), ("y", 2)].into_iter().collect();
        assert_eq!(p.len(), 2);
        assert!(crate::params! {}.is_empty());
    }
}
