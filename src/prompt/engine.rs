//! Template variables and `{KEY}` placeholder rendering

use std::collections::BTreeMap;
use std::fmt;

/// Value bound to a template variable
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Text(String),
    Number(i64),
    /// Present in the set but without a value; renders as the empty string
    Unset,
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Unset => Ok(()),
        }
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for VariableValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for VariableValue {
    fn from(n: u32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<usize> for VariableValue {
    fn from(n: usize) -> Self {
        Self::Number(n as i64)
    }
}

impl<T: Into<VariableValue>> From<Option<T>> for VariableValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Unset, Into::into)
    }
}

/// Named values substituted into prompt templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateVariables {
    values: BTreeMap<String, VariableValue>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<VariableValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Substitute every `{NAME}` whose name is bound in this set.
    ///
    /// Unknown tokens are emitted verbatim so that a later pass with a larger
    /// set can fill them. Substituted values are never rescanned.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            if let Some(end) = after.find(['{', '}']) {
                if after.as_bytes()[end] == b'}' {
                    if let Some(value) = self.values.get(&after[..end]) {
                        out.push_str(&value.to_string());
                        rest = &after[end + 1..];
                        continue;
                    }
                }
            }

            out.push('{');
            rest = after;
        }

        out.push_str(rest);
        out
    }
}

impl<K: Into<String>, V: Into<VariableValue>> Extend<(K, V)> for TemplateVariables {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

/// Render `template` against `variables`
pub fn render_template(template: &str, variables: &TemplateVariables) -> String {
    variables.render(template)
}
