//! Ordered header list.
//!
//! HTTP allows the same field name to appear several times and the order of those
//! occurrences carries meaning (think repeated `set-cookie`). [`Headers`] therefore keeps a
//! flat list of `(name, value)` pairs in arrival order instead of a map. Lookups are linear
//! scans, which is cheap for the handful of fields a message usually carries.
//!
//! Names are compared byte for byte: the reader stores every parsed name in lowercase, so
//! callers are expected to look headers up with lowercase names as well.

use std::fmt;

/// Well known header names, in the lowercase form the reader stores them.
pub mod names {
    pub const CONTENT_LENGTH: &str = "content-length";
    pub const TRANSFER_ENCODING: &str = "transfer-encoding";
    pub const TRAILER: &str = "trailer";
    pub const CONTENT_ENCODING: &str = "content-encoding";
    pub const HOST: &str = "host";
    pub const X_REAL_IP: &str = "x-real-ip";
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    pairs: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { pairs: Vec::with_capacity(capacity) }
    }

    /// Appends a pair, keeping any existing pair with the same name.
    pub fn add<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Rewrites the value of the first pair named `name`, or appends a new pair.
    pub fn set<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        let name = name.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.into(),
            None => self.pairs.push((name, value.into())),
        }
    }

    /// Removes every pair named `name`.
    pub fn delete(&mut self, name: &str) {
        self.pairs.retain(|(n, _)| n != name);
    }

    /// First value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs.iter().filter(|(n, _)| n == name).map(|(_, v)| v.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<Vec<(String, String)>> for Headers {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self { pairs: iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect() }
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}
