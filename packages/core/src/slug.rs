//! Naming of resources created by `POST`.
//!
//! A [`Slug`] is the client's suggested path segment (from the `Slug`
//! header) or a generated UUIDv7 token. [`child_iri`] resolves it against
//! the container the request was sent to.

use oxiri::Iri;

/// The IRI of a container or child could not be built.
#[derive(Debug, thiserror::Error)]
#[error("invalid IRI {iri:?}: {reason}")]
pub struct IriError {
    pub iri: String,
    pub reason: String,
}

/// A single, percent-encoded path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug(String);

impl Slug {
    /// Build a slug from the `Slug` header value.
    ///
    /// The value is percent-decoded, then re-encoded so it stays one path
    /// segment. Absent, blank, `.` and `..` values fall back to
    /// [`Slug::generate`].
    pub fn from_header(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::generate();
        };
        let decoded = urlencoding::decode(raw)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        let decoded = decoded.trim();
        if decoded.is_empty() || decoded == "." || decoded == ".." {
            return Self::generate();
        }
        Slug(urlencoding::encode(decoded).into_owned())
    }

    /// A fresh, time-ordered unique token.
    pub fn generate() -> Self {
        Slug(uuid::Uuid::now_v7().simple().to_string())
    }

    /// Append `.ext` unless the slug already ends with it.
    pub fn with_extension(self, ext: Option<&str>) -> Self {
        let Some(ext) = ext.map(|e| e.trim_start_matches('.')).filter(|e| !e.is_empty()) else {
            return self;
        };
        let suffix = format!(".{}", ext.to_ascii_lowercase());
        if self.0.to_ascii_lowercase().ends_with(&suffix) {
            self
        } else {
            Slug(format!("{}.{ext}", self.0))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The segment to use when the new resource is itself a container.
    pub fn container_segment(&self) -> String {
        format!("{}/", self.0)
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `iri` without query or fragment and with a trailing `/`, so relative
/// resolution stays inside it.
pub fn container_iri(iri: &str) -> String {
    let iri = iri.split('#').next().unwrap_or(iri);
    let iri = iri.split('?').next().unwrap_or(iri);
    if iri.ends_with('/') {
        iri.to_string()
    } else {
        format!("{iri}/")
    }
}

/// Resolve `segment` as a relative reference against the container `container`.
pub fn child_iri(container: &str, segment: &str) -> Result<String, IriError> {
    let base = container_iri(container);
    let parsed = Iri::parse(base.as_str()).map_err(|e| IriError {
        iri: base.clone(),
        reason: e.to_string(),
    })?;
    let child = parsed.resolve(segment).map_err(|e| IriError {
        iri: format!("{base}{segment}"),
        reason: e.to_string(),
    })?;
    Ok(child.into_inner())
}
