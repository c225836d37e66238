// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Field paths and field errors reported by admission validation.
//!
//! Validators never stop at the first violation. They collect every
//! [`FieldError`] into an [`ErrorList`] so that a user sees all problems of a
//! submitted object at once.
//!
//! # Example
//!
//! ```rust
//! use kubevirt_worker::validation::{ErrorList, FieldError, FieldPath};
//!
//! let workers = FieldPath::new("spec").child("provider").child("workers");
//! let mut errors = ErrorList::new();
//! errors.push(FieldError::required(&workers.index(0).child("zones"), "at least one zone is required"));
//!
//! assert_eq!(
//!     errors.to_string(),
//!     "spec.provider.workers[0].zones: Required value: at least one zone is required"
//! );
//! ```

use std::fmt;

/// Dotted path to a field, e.g. `spec.provider.workers[0].zones`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Starts a path at a root field.
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    /// Descends into a named child field.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{name}", self.0))
    }

    /// Descends into a list element.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    /// Descends into a map entry.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{key}]", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a field violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldErrorKind {
    /// A required field is missing or empty
    Required,
    /// A field has a value that is not acceptable
    Invalid,
    /// A value that must be unique appears more than once
    Duplicate,
    /// A field may not be set or changed
    Forbidden,
    /// A value is not one of the supported values
    NotSupported,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FieldErrorKind::Required => "Required value",
            FieldErrorKind::Invalid => "Invalid value",
            FieldErrorKind::Duplicate => "Duplicate value",
            FieldErrorKind::Forbidden => "Forbidden",
            FieldErrorKind::NotSupported => "Unsupported value",
        };
        f.write_str(text)
    }
}

/// A single field violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub path: FieldPath,

    /// The offending value, when there is one worth showing
    pub value: Option<String>,

    pub detail: String,
}

impl FieldError {
    #[must_use]
    pub fn required(path: &FieldPath, detail: &str) -> Self {
        Self::new(FieldErrorKind::Required, path, None, detail)
    }

    #[must_use]
    pub fn invalid(path: &FieldPath, value: &str, detail: &str) -> Self {
        Self::new(FieldErrorKind::Invalid, path, Some(value), detail)
    }

    #[must_use]
    pub fn duplicate(path: &FieldPath, value: &str) -> Self {
        Self::new(FieldErrorKind::Duplicate, path, Some(value), "")
    }

    #[must_use]
    pub fn forbidden(path: &FieldPath, detail: &str) -> Self {
        Self::new(FieldErrorKind::Forbidden, path, None, detail)
    }

    /// A value outside `supported`; the detail lists the supported values.
    #[must_use]
    pub fn not_supported(path: &FieldPath, value: &str, supported: &[&str]) -> Self {
        let quoted: Vec<String> = supported.iter().map(|s| format!("\"{s}\"")).collect();
        let detail = format!("supported values: {}", quoted.join(", "));
        Self::new(FieldErrorKind::NotSupported, path, Some(value), &detail)
    }

    fn new(kind: FieldErrorKind, path: &FieldPath, value: Option<&str>, detail: &str) -> Self {
        Self {
            kind,
            path: path.clone(),
            value: value.map(str::to_string),
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)?;
        if let Some(value) = &self.value {
            write!(f, ": \"{value}\"")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// All field violations found in one object.
///
/// Displays a single error as-is and several errors as `[first, second, ...]`.
#[derive(thiserror::Error, Clone, Debug, Default, PartialEq, Eq)]
#[error("{}", render(.0))]
pub struct ErrorList(Vec<FieldError>);

fn render(errors: &[FieldError]) -> String {
    match errors {
        [single] => single.to_string(),
        many => {
            let parts: Vec<String> = many.iter().map(ToString::to_string).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

impl ErrorList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Appends all errors of another list.
    pub fn append(&mut self, mut other: ErrorList) {
        self.0.append(&mut other.0);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Returns `Ok(())` for an empty list and the list itself otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` if it holds at least one violation.
    pub fn into_result(self) -> Result<(), ErrorList> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldError>> for ErrorList {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ErrorList {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[path = "field_tests.rs"]
mod field_tests;
