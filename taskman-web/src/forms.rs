//! Submitted HTML forms
//!
//! Forms are read as raw `(name, value)` pairs so that repeated fields
//! (`label_ids=1&label_ids=2`) survive. Field names match the model fields.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use taskman_shared::filter::coerce_id;
use taskman_shared::services::tasks::TaskDraft;
use taskman_shared::services::users::{ProfileUpdate, Registration};

/// The fields of one submitted form
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for FormData {
    fn from(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }
}

impl FormData {
    /// Last value submitted under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Optional text; blank counts as absent
    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn id(&self, name: &str) -> Option<i64> {
        coerce_id(self.get(name))
    }

    /// Every id under `name`, whether repeated or comma-joined
    ///
    /// Pieces that are not positive integers are skipped.
    pub fn ids(&self, name: &str) -> BTreeSet<i64> {
        self.fields
            .iter()
            .filter(|(field, _)| field == name)
            .flat_map(|(_, value)| value.split(','))
            .filter_map(|piece| coerce_id(Some(piece)))
            .collect()
    }

    /// Values to echo back into a re-rendered form; passwords are left out
    pub fn echo(&self) -> FormValues {
        let mut values = FormValues::default();
        for (field, value) in &self.fields {
            if field != "password" {
                values.fields.insert(field.clone(), value.clone());
            }
        }
        values
    }

    pub fn registration(&self) -> Registration {
        Registration {
            first_name: self.text("first_name"),
            last_name: self.text("last_name"),
            email: self.text("email"),
            password: self.text("password"),
        }
    }

    pub fn profile_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.text("first_name"),
            last_name: self.text("last_name"),
            email: self.text("email"),
            password: self.text("password"),
        }
    }

    pub fn task_draft(&self) -> TaskDraft {
        TaskDraft {
            name: self.text("name"),
            description: self.optional_text("description"),
            status_id: self.id("status_id"),
            executor_id: self.id("executor_id"),
            label_ids: self.ids("label_ids"),
        }
    }
}

/// Field values shown in a form, keyed by field name
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FormValues {
    fields: BTreeMap<String, String>,
}

impl FormValues {
    pub fn with(mut self, field: &str, value: impl ToString) -> Self {
        self.fields.insert(field.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_label_ids_repeated_or_joined() {
        let data = form(&[("label_ids", "1"), ("label_ids", "3,2"), ("label_ids", "x"), ("label_ids", "")]);
        assert_eq!(data.ids("label_ids"), BTreeSet::from([1, 2, 3]));
        assert!(form(&[]).ids("label_ids").is_empty());
    }

    #[test]
    fn test_task_draft() {
        let draft = form(&[
            ("name", "Write docs"),
            ("description", "  "),
            ("status_id", "2"),
            ("executor_id", ""),
            ("label_ids", "5"),
        ])
        .task_draft();

        assert_eq!(draft.name, "Write docs");
        assert_eq!(draft.description, None);
        assert_eq!(draft.status_id, Some(2));
        assert_eq!(draft.executor_id, None);
        assert_eq!(draft.label_ids, BTreeSet::from([5]));
    }

    #[test]
    fn test_echo_skips_password() {
        let values = form(&[("email", "a@b.c"), ("password", "secret")]).echo();
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, serde_json::json!({ "email": "a@b.c" }));
    }
}
