// src/core/identity/types.rs
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::utils::error::AttendanceError;

pub const MAX_DISPLAY_NAME_LEN: usize = 128;

/// Opaque identity key. Ordering is UUID byte order, which matches the
/// lexicographic order of the lowercase hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(Uuid);

impl IdentityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for IdentityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for IdentityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template is empty")]
    Empty,
    #[error("template has {len} features, at least {min} required")]
    TooShort { len: usize, min: usize },
    #[error("template feature at index {index} is not a finite number")]
    NonFinite { index: usize },
}

impl From<TemplateError> for AttendanceError {
    fn from(error: TemplateError) -> Self {
        AttendanceError::MalformedInput(error.to_string())
    }
}

/// Biometric feature vector. `Debug` only prints the length so templates
/// never end up in logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(Vec<f32>);

impl Template {
    pub fn new(features: Vec<f32>) -> Self {
        Self(features)
    }

    pub fn features(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self, min_len: usize) -> Result<(), TemplateError> {
        if self.0.is_empty() {
            return Err(TemplateError::Empty);
        }
        if self.0.len() < min_len {
            return Err(TemplateError::TooShort { len: self.0.len(), min: min_len });
        }
        if let Some(index) = self.0.iter().position(|value| !value.is_finite()) {
            return Err(TemplateError::NonFinite { index });
        }
        Ok(())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").field("len", &self.0.len()).finish()
    }
}

impl From<Vec<f32>> for Template {
    fn from(features: Vec<f32>) -> Self {
        Self(features)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub display_name: String,
    pub template: Template,
    pub enrolled_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(display_name: impl Into<String>, template: Template) -> Self {
        Self {
            id: IdentityId::new(),
            display_name: display_name.into(),
            template,
            enrolled_at: Utc::now(),
        }
    }
}

/// Key used by the duplicate-name policy.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
