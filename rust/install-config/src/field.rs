//! Structured validation errors that point at the offending field of a configuration document.

use std::fmt::{self, Display};

use snafu::Snafu;

/// Path to a field in a configuration document, rendered as `compute[0].platform.openstack`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Child(String),
    Index(usize),
    Key(String),
}

impl FieldPath {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Child(root.into())],
        }
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        self.with(Segment::Child(name.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(Segment::Index(index))
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.with(Segment::Key(key.into()))
    }

    fn with(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Child(name) if i == 0 => f.write_str(name)?,
                Segment::Child(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ErrorType {
    #[strum(serialize = "Required value")]
    Required,
    #[strum(serialize = "Invalid value")]
    Invalid,
    #[strum(serialize = "Not found")]
    NotFound,
    #[strum(serialize = "Unsupported value")]
    NotSupported,
}

/// A single validation failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub kind: ErrorType,
    pub path: FieldPath,
    pub value: Option<String>,
    pub detail: Option<String>,
}

impl FieldError {
    pub fn new(
        kind: ErrorType,
        path: FieldPath,
        value: Option<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            kind,
            path,
            value,
            detail,
        }
    }

    pub fn required(path: FieldPath, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Required, path, None, Some(detail.into()))
    }

    pub fn invalid(path: FieldPath, value: impl Display, detail: impl Into<String>) -> Self {
        Self::new(
            ErrorType::Invalid,
            path,
            Some(value.to_string()),
            Some(detail.into()),
        )
    }

    pub fn not_found(path: FieldPath, value: impl Display) -> Self {
        Self::new(ErrorType::NotFound, path, Some(value.to_string()), None)
    }

    pub fn not_supported<S: AsRef<str>>(
        path: FieldPath,
        value: impl Display,
        supported: &[S],
    ) -> Self {
        let detail = if supported.is_empty() {
            "no supported values".to_owned()
        } else {
            let quoted = supported
                .iter()
                .map(|s| format!("{:?}", s.as_ref()))
                .collect::<Vec<_>>();
            format!("supported values: {}", quoted.join(", "))
        };
        Self::new(
            ErrorType::NotSupported,
            path,
            Some(value.to_string()),
            Some(detail),
        )
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)?;
        if let Some(value) = &self.value {
            write!(f, ": {value:?}")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldError {}

/// Ordered collection of [`FieldError`]s, gathered before anything is reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<FieldError>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Combines all errors into one, or returns `Ok` if there are none.
    pub fn into_aggregate(self) -> Result<(), AggregateError> {
        if self.is_empty() {
            Ok(())
        } else {
            AggregateSnafu { errors: self.0 }.fail()
        }
    }
}

impl From<Vec<FieldError>> for ErrorList {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl From<FieldError> for ErrorList {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

impl FromIterator<FieldError> for ErrorList {
    fn from_iter<T: IntoIterator<Item = FieldError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<FieldError> for ErrorList {
    fn extend<T: IntoIterator<Item = FieldError>>(&mut self, iter: T) {
        self.0.extend(iter)
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
        self.iter()
    }
}

/// Every [`FieldError`] found in one validation pass.
#[derive(Debug, Snafu)]
#[snafu(display("{}", format_errors(errors)))]
pub struct AggregateError {
    errors: Vec<FieldError>,
}

impl AggregateError {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }
}

fn format_errors(errors: &[FieldError]) -> String {
    match errors {
        [error] => error.to_string(),
        errors => format!(
            "[{}]",
            errors
                .iter()
                .map(FieldError::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        let compute = FieldPath::new("compute");
        assert_eq!(compute.to_string(), "compute");
        assert_eq!(
            compute.index(2).child("platform").child("openstack").to_string(),
            "compute[2].platform.openstack"
        );
        assert_eq!(
            FieldPath::new("metadata")
                .child("labels")
                .key("app")
                .to_string(),
            "metadata.labels[app]"
        );
        // The base path is not modified
        assert_eq!(compute.to_string(), "compute");
    }

    #[test]
    fn test_error_rendering() {
        let path = FieldPath::new("platform").child("openstack");
        assert_eq!(
            FieldError::required(path.child("cloud"), "cloud is required").to_string(),
            "platform.openstack.cloud: Required value: cloud is required"
        );
        assert_eq!(
            FieldError::not_found(path.child("externalNetwork"), "public").to_string(),
            r#"platform.openstack.externalNetwork: Not found: "public""#
        );
        assert_eq!(
            FieldError::invalid(path.child("computeFlavor"), "m1.tiny", "too small").to_string(),
            r#"platform.openstack.computeFlavor: Invalid value: "m1.tiny": too small"#
        );
        assert_eq!(
            FieldError::not_supported(path.child("zones").index(0), "az9", &["az1"]).to_string(),
            r#"platform.openstack.zones[0]: Unsupported value: "az9": supported values: "az1""#
        );
    }

    #[test]
    fn test_empty_list_is_ok() {
        assert!(ErrorList::new().into_aggregate().is_ok());
    }

    #[test]
    fn test_aggregate_rendering() {
        let single = ErrorList::from(FieldError::not_found(FieldPath::new("a"), "x"))
            .into_aggregate()
            .unwrap_err();
        assert_eq!(single.to_string(), r#"a: Not found: "x""#);

        let multiple = [
            FieldError::not_found(FieldPath::new("a"), "x"),
            FieldError::required(FieldPath::new("b"), "b is required"),
        ]
        .into_iter()
        .collect::<ErrorList>()
        .into_aggregate()
        .unwrap_err();
        assert_eq!(multiple.errors().len(), 2);
        assert_eq!(
            multiple.to_string(),
            r#"[a: Not found: "x", b: Required value: b is required]"#
        );
    }
}
