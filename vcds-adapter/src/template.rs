//! Template variable interpolation.
//!
//! The host owns the real interpolation engine; the adapter only needs
//! `replace`. [`VariableMap`] covers hosts that just have a fixed set of
//! `name -> value` pairs.

use std::collections::BTreeMap;
use std::fmt::Debug;

/// String substitution capability provided by the host.
pub trait TemplateSrv: Send + Sync + Debug {
    /// Substitute template variables in `input`.
    fn replace(&self, input: &str) -> String;
}

/// A fixed set of variables, referenced as `$name` or `${name}`.
///
/// Unknown variables are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
    vars: BTreeMap<String, String>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl TemplateSrv for VariableMap {
    fn replace(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            let (name, consumed) = match after.strip_prefix('{') {
                Some(braced) => match braced.find('}') {
                    Some(end) => (&braced[..end], end + 2),
                    None => ("", 0),
                },
                None => {
                    let end = after
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .unwrap_or(after.len());
                    (&after[..end], end)
                }
            };

            match self.vars.get(name) {
                Some(value) if !name.is_empty() => {
                    out.push_str(value);
                    rest = &after[consumed..];
                }
                _ => {
                    out.push('$');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}
