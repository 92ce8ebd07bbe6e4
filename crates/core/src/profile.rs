//! Declared profile - the applicant's self-reported onboarding form

use serde::{Deserialize, Serialize};

/// Applicant's self-reported data
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeclaredProfile {
    pub name: String,
    /// Date of birth as typed, expected `YYYY-MM-DD`
    pub dob: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl DeclaredProfile {
    pub fn new(name: impl Into<String>, dob: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dob: dob.into(),
            address: address.into(),
            email: None,
            phone: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Value of a declared field by its extraction field name
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(self.name.as_str()),
            "dob" => Some(self.dob.as_str()),
            "address" => Some(self.address.as_str()),
            "email" => self.email.as_deref(),
            "phone" => self.phone.as_deref(),
            _ => None,
        }
    }

    /// All declared fields in form order, optional ones only when given
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let mut entries = vec![
            ("name", self.name.as_str()),
            ("dob", self.dob.as_str()),
            ("address", self.address.as_str()),
        ];
        if let Some(email) = &self.email {
            entries.push(("email", email.as_str()));
        }
        if let Some(phone) = &self.phone {
            entries.push(("phone", phone.as_str()));
        }
        entries
    }
}
