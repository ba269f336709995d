//! # Process-wide configuration store.
//!
//! Parameters are declared once with [`ConfigStore::set_defaults`] (grouped in
//! sections, each with a default and a description) and then read or assigned
//! by name. Reads are frequent and concurrent, writes are rare and mostly
//! happen at startup, so the store sits behind a single `RwLock`.
//!
//! ## Rules
//! - Unknown names are errors on both read and write, never silently created.
//! - An assignment must match the default's type; strings are parsed.
//! - [`ConfigStore::clear`] drops assignments, defaults stay.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::Value;
use crate::error::ConfigError;

/// Declaration of one parameter.
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub default: Value,
    pub desc: String,
}

impl Definition {
    pub fn new(name: impl Into<String>, default: impl Into<Value>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            desc: desc.into(),
        }
    }
}

#[derive(Debug)]
struct Param {
    section: String,
    default: Value,
    desc: String,
    value: Option<Value>,
}

impl Param {
    fn current(&self) -> &Value {
        self.value.as_ref().unwrap_or(&self.default)
    }
}

#[derive(Debug, Default)]
struct Inner {
    params: BTreeMap<String, Param>,
    sections: Vec<String>,
}

/// Thread-safe parameter store.
#[derive(Debug, Default)]
pub struct ConfigStore {
    inner: RwLock<Inner>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares parameters in `section`.
    ///
    /// Fails without declaring anything if one of the names already exists.
    pub fn set_defaults<I>(&self, section: &str, defs: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = Definition>,
    {
        let defs: Vec<Definition> = defs.into_iter().collect();
        let mut inner = self.inner.write();

        if let Some(dup) = defs.iter().find_map(|d| inner.params.get(&d.name).map(|p| (d, p))) {
            return Err(ConfigError::DuplicateParameter {
                name: dup.0.name.clone(),
                section: dup.1.section.clone(),
            });
        }

        if !inner.sections.iter().any(|s| s == section) {
            inner.sections.push(section.to_string());
        }
        for def in defs {
            inner.params.insert(
                def.name,
                Param {
                    section: section.to_string(),
                    default: def.default,
                    desc: def.desc,
                    value: None,
                },
            );
        }
        Ok(())
    }

    /// Current value (assignment, or default).
    pub fn get(&self, name: &str) -> Result<Value, ConfigError> {
        let inner = self.inner.read();
        inner
            .params
            .get(name)
            .map(|p| p.current().clone())
            .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))
    }

    /// Assigns a value, checked against the default's type.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let value = value.into();
        let mut inner = self.inner.write();
        let param = inner
            .params
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))?;

        let got = value.type_name();
        let is_str = matches!(value, Value::Str(_));
        let rendered = value.to_string();
        match value.coerce_like(&param.default) {
            Some(v) => {
                param.value = Some(v);
                Ok(())
            }
            None if is_str => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: rendered,
            }),
            None => Err(ConfigError::TypeMismatch {
                name: name.to_string(),
                expected: param.default.type_name(),
                got,
            }),
        }
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().params.contains_key(name)
    }

    /// Drops every assignment; defaults remain.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        for p in inner.params.values_mut() {
            p.value = None;
        }
    }

    /// Snapshot of all parameters, sorted by name.
    pub fn iter(&self) -> Vec<(String, Value)> {
        let inner = self.inner.read();
        inner
            .params
            .iter()
            .map(|(k, p)| (k.clone(), p.current().clone()))
            .collect()
    }

    /// Renders a parameter query as output lines.
    ///
    /// - `"all"`: every parameter as `name = value`, sorted, with empty
    ///   strings shown as `""`;
    /// - a comma-separated list: those parameters as `name = value`, sorted;
    /// - a single name: just its value.
    pub fn print(&self, query: &str) -> Result<Vec<String>, ConfigError> {
        self.print_with(query, |name| self.get(name))
    }

    /// Like [`print`](Self::print), resolving listed names through `lookup`
    /// so callers can answer for parameters the store does not hold.
    pub fn print_with(
        &self,
        query: &str,
        lookup: impl Fn(&str) -> Result<Value, ConfigError>,
    ) -> Result<Vec<String>, ConfigError> {
        let query = query.trim();
        if query == "all" {
            return Ok(self
                .iter()
                .into_iter()
                .map(|(name, v)| format!("{name} = {}", v.inspect()))
                .collect());
        }
        if query.contains(',') {
            let mut names: Vec<&str> = query
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            names.sort_unstable();
            return names
                .into_iter()
                .map(|n| lookup(n).map(|v| format!("{n} = {v}")))
                .collect();
        }
        Ok(vec![lookup(query)?.to_string()])
    }

    /// Renders every section as a commented configuration file.
    pub fn to_config(&self) -> String {
        let inner = self.inner.read();
        let mut out = String::new();
        for section in &inner.sections {
            out.push_str(&format!("[{section}]\n"));
            for (name, p) in inner.params.iter().filter(|(_, p)| &p.section == section) {
                for line in p.desc.lines() {
                    out.push_str(&format!("    # {line}\n"));
                }
                out.push_str(&format!("    {name} = {}\n\n", p.current().inspect()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConfigStore {
        let store = ConfigStore::new();
        store
            .set_defaults(
                "main",
                [
                    Definition::new("trace", false, "Print backtraces"),
                    Definition::new("runinterval", 1800_i64, "Seconds between runs"),
                    Definition::new("configprint", "", "Print parameters"),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn get_returns_default_then_assignment() {
        let s = store();
        assert_eq!(s.get("runinterval").unwrap(), Value::Int(1800));
        s.set("runinterval", 60_i64).unwrap();
        assert_eq!(s.get("runinterval").unwrap(), Value::Int(60));
        s.clear();
        assert_eq!(s.get("runinterval").unwrap(), Value::Int(1800));
    }

    #[test]
    fn unknown_names_are_errors() {
        let s = store();
        assert_eq!(
            s.get("nosuch"),
            Err(ConfigError::UnknownParameter("nosuch".into()))
        );
        assert!(matches!(
            s.set("nosuch", true),
            Err(ConfigError::UnknownParameter(_))
        ));
    }

    #[test]
    fn assignments_are_type_checked() {
        let s = store();
        assert!(matches!(
            s.set("trace", 3_i64),
            Err(ConfigError::TypeMismatch { expected: "bool", got: "integer", .. })
        ));
        assert!(matches!(
            s.set("runinterval", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        s.set("trace", "true").unwrap();
        assert_eq!(s.get("trace").unwrap(), Value::Bool(true));
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let s = store();
        let err = s
            .set_defaults("agent", [Definition::new("trace", true, "again")])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateParameter {
                name: "trace".into(),
                section: "main".into()
            }
        );
    }

    #[test]
    fn print_handles_all_list_and_single() {
        let s = store();
        assert_eq!(
            s.print("all").unwrap(),
            vec!["configprint = \"\"", "runinterval = 1800", "trace = false"]
        );
        assert_eq!(
            s.print("trace , runinterval").unwrap(),
            vec!["runinterval = 1800", "trace = false"]
        );
        assert_eq!(s.print("runinterval").unwrap(), vec!["1800"]);
        assert!(s.print("trace,nosuch").is_err());
    }

    #[test]
    fn to_config_groups_by_section() {
        let s = store();
        let text = s.to_config();
        assert!(text.starts_with("[main]\n"));
        assert!(text.contains("    # Seconds between runs\n    runinterval = 1800\n"));
    }
}
