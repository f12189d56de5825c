//! The canonical Run Record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Field, Protocol, RunNumber};

/// One planned simulation run extracted from a sheet row.
///
/// Descriptive fields are free-form strings; an absent value is the empty
/// string. `p` and `l` are the raw symbolic tags of the row and are never
/// substituted with numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(rename = "number_of_runs")]
    pub run_number: RunNumber,
    #[serde(default)]
    pub fields: BTreeMap<Field, String>,
    #[serde(default)]
    pub p: String,
    #[serde(default)]
    pub l: String,
}

impl RunRecord {
    pub fn new(run_number: RunNumber) -> Self {
        Self {
            run_number,
            fields: BTreeMap::new(),
            p: String::new(),
            l: String::new(),
        }
    }

    pub fn with_field(mut self, field: Field, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn with_tags(mut self, p: impl Into<String>, l: impl Into<String>) -> Self {
        self.p = p.into();
        self.l = l.into();
        self
    }

    pub fn field(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Result folder of this run, named after its symbolic tags.
    pub fn folder_name(&self) -> String {
        format!("{}_{}", self.p, self.l)
    }

    pub fn job(&self) -> &str {
        self.field(Field::Job)
    }

    pub fn tydex_name(&self) -> &str {
        self.field(Field::TydexName)
    }

    pub fn template_tydex(&self) -> &str {
        self.field(Field::TemplateTydex)
    }

    pub fn has_template(&self) -> bool {
        !self.template_tydex().trim().is_empty()
    }

    pub fn label(&self, protocol: Protocol) -> &str {
        self.field(protocol.label_field())
    }
}
