//! Error types for sketch translation
//!
//! Every failure in the crate is reported through the single [`Error`] enum.
//! Messages carry an error code so that callers can group failures without
//! string matching on the prose.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors
//! - **E2xxx**: Document encoding errors (XML structure, attributes)
//! - **E3xxx**: Structural model errors (identifiers, references, ordering)
//! - **E4xxx**: Fidelity gaps between formats
//! - **E5xxx**: Geometric degeneracy
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error
//! - `E1002`: ZIP archive format error
//! - `E1003`: Missing required file in archive
//! - `E2001`: XML parsing error
//! - `E2003`: Invalid XML structure
//! - `E3001`: Structural error (missing/duplicate identifier, invalid reference)
//! - `E3003`: Feature dependency order violated
//! - `E4001`: Unsupported path command
//! - `E4002`: Unsupported constraint
//! - `E4003`: Unsupported relation
//! - `E5001`: Degenerate vector
//! - `E5002`: Degenerate geometry

use std::io;
use thiserror::Error;

/// Result type for sketch translation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Additional context for errors
///
/// Provides optional supplementary information to help with debugging:
/// - The document or archive entry being processed
/// - The element (XML tag or path command) in play
/// - A hint for resolving the problem
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// The document or archive entry where the error occurred
    pub file: Option<String>,

    /// The element being processed when the error occurred
    pub element: Option<String>,

    /// A helpful hint for resolving the error
    pub hint: Option<String>,
}

impl ErrorContext {
    /// Create a new empty error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file location
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the element
    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Set the hint
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if let Some(ref file) = self.file {
            parts.push(format!("File: {}", file));
        }
        if let Some(ref element) = self.element {
            parts.push(format!("Element: {}", element));
        }
        if let Some(ref hint) = self.hint {
            parts.push(format!("Hint: {}", hint));
        }

        if !parts.is_empty() {
            write!(f, "\n{}", parts.join("\n"))
        } else {
            Ok(())
        }
    }
}

/// Errors that can occur while building, checking or translating sketches
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading or writing a document
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted or truncated document archive
    /// - Unsupported compression method
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Missing required entry in a document archive
    ///
    /// **Error Code**: E1003
    ///
    /// **Suggestions**:
    /// - Ensure the archive contains a `Document.xml` entry
    #[error("[E1003] Missing required file: {0}")]
    MissingFile(String),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - Malformed XML syntax
    /// - Invalid character encoding
    /// - Unclosed tags
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Malformed attribute syntax
    /// - Duplicate attribute
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Missing required XML elements or attributes
    /// - Invalid element nesting
    /// - DOCTYPE declarations (rejected to avoid entity expansion)
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// Document does not follow the expected format
    ///
    /// **Error Code**: E2004
    ///
    /// **Common Causes**:
    /// - Wrong root element
    /// - Document written by an unrelated application
    #[error("[E2004] Invalid document format: {0}")]
    InvalidFormat(String),

    /// XML writing error
    ///
    /// **Error Code**: E2005
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// Structural error in the model
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - An identifier referenced by a constraint or feature does not exist
    /// - Two entities share the same identifier
    /// - A constraint reference is not valid for the target geometry kind
    ///   (for example an endpoint reference on a circle)
    /// - A constraint is given the wrong number or kind of operands
    ///
    /// **Suggestions**:
    /// - Add geometry to the sketch before constraining it
    /// - Check which references are valid with `constraint::valid_references`
    #[error("[E3001] Structural error: {0}")]
    Structural(String),

    /// Parse error for numeric values
    ///
    /// **Error Code**: E3002
    ///
    /// **Suggestions**:
    /// - Verify numeric values use proper format (e.g., "1.5" not "1,5")
    #[error("[E3002] Parse error: {0}")]
    ParseError(String),

    /// A feature references a feature that does not precede it
    ///
    /// **Error Code**: E3003
    ///
    /// **Common Causes**:
    /// - An extrusion appended before the sketch it extrudes
    /// - A profile reference pointing at a feature that is not a sketch
    ///
    /// **Suggestions**:
    /// - Append features in dependency order
    #[error("[E3003] Dependency order violated: feature '{feature}' references '{missing}' which does not precede it")]
    DependencyOrder {
        /// The feature being added
        feature: String,
        /// The referenced feature that was not found earlier in the container
        missing: String,
    },

    /// A parameter is outside the valid range for its entity
    ///
    /// **Error Code**: E3004
    ///
    /// **Common Causes**:
    /// - Non-positive radius or axis length
    /// - Non-finite coordinates
    /// - Orientation quaternion without unit norm
    /// - Value constraint with a negative or non-finite magnitude
    #[error("[E3004] Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Path text uses a command or token this translator does not understand
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Curve commands (C, S, Q, T) that have no sketch counterpart
    /// - Malformed numbers
    /// - Missing arguments for a command
    #[error("[E4001] Unsupported path command at position {position}: '{token}'")]
    UnsupportedPathCommand {
        /// Byte offset of the offending token in the path text
        position: usize,
        /// The offending token
        token: String,
    },

    /// A constraint kind has no counterpart in the target vocabulary
    ///
    /// **Error Code**: E4002
    #[error("[E4002] Unsupported constraint: {0}")]
    UnsupportedConstraint(String),

    /// A spatial relation is not defined for the given pair of entity kinds
    ///
    /// **Error Code**: E4003
    #[error("[E4003] Unsupported relation '{relation}' between {first} and {second}")]
    UnsupportedRelation {
        /// The relation that was requested
        relation: &'static str,
        /// Kind of the first entity
        first: String,
        /// Kind of the second entity
        second: String,
    },

    /// A vector has (near) zero length where a direction is required
    ///
    /// **Error Code**: E5001
    #[error("[E5001] Degenerate vector: {0}")]
    DegenerateVector(String),

    /// A geometric conversion has no unique answer
    ///
    /// **Error Code**: E5002
    ///
    /// **Common Causes**:
    /// - Arc whose start and end points coincide
    /// - Zero radius or axis length
    /// - Zero-length segment
    #[error("[E5002] Degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(format!("Failed to parse integer: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error for a missing required attribute
    ///
    /// # Example
    /// ```ignore
    /// Error::missing_attribute("Constrain", "Type")
    /// ```
    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::InvalidXml(format!(
            "Element '<{}>' is missing required attribute '{}'",
            element, attribute
        ))
    }

    /// Create a ParseError with context about what was being parsed
    ///
    /// # Arguments
    /// * `field_name` - The name of the field being parsed (e.g., "StartX")
    /// * `value` - The value that failed to parse
    /// * `expected_type` - The expected type (e.g., "floating-point number")
    pub fn parse_error_with_context(field_name: &str, value: &str, expected_type: &str) -> Self {
        Error::ParseError(format!(
            "Failed to parse '{}': expected {}, got '{}'",
            field_name, expected_type, value
        ))
    }

    /// Create a Structural error for an identifier that is already in use
    pub fn duplicate_id(what: &str, id: impl std::fmt::Display) -> Self {
        Error::Structural(format!("Duplicate {} identifier {}", what, id))
    }

    /// Create a Structural error for an identifier that cannot be found
    pub fn missing_id(what: &str, id: impl std::fmt::Display) -> Self {
        Error::Structural(format!("No {} with identifier {}", what, id))
    }

    /// Create an XmlWrite error
    pub fn xml_write(message: String) -> Self {
        Error::XmlWrite(message)
    }

    /// Create an UnsupportedRelation error for a kind pair
    pub fn unsupported_relation(
        relation: &'static str,
        first: impl std::fmt::Display,
        second: impl std::fmt::Display,
    ) -> Self {
        Error::UnsupportedRelation {
            relation,
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Attach an [`ErrorContext`] to the message of a string-carrying error
    ///
    /// Variants without a free-form message are returned unchanged.
    pub fn with_context(self, context: &ErrorContext) -> Self {
        match self {
            Error::InvalidXml(msg) => Error::InvalidXml(format!("{}{}", msg, context)),
            Error::InvalidFormat(msg) => Error::InvalidFormat(format!("{}{}", msg, context)),
            Error::ParseError(msg) => Error::ParseError(format!("{}{}", msg, context)),
            Error::Structural(msg) => Error::Structural(format!("{}{}", msg, context)),
            Error::InvalidGeometry(msg) => Error::InvalidGeometry(format!("{}{}", msg, context)),
            Error::DegenerateGeometry(msg) => {
                Error::DegenerateGeometry(format!("{}{}", msg, context))
            }
            other => other,
        }
    }

    /// Whether this error belongs to the structural family
    ///
    /// Structural errors are always fatal to the operation that raised them.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Structural(_) | Error::DependencyOrder { .. })
    }

    /// Whether this error is a geometric degeneracy
    ///
    /// Degenerate entities can be skipped by a best-effort translation.
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            Error::DegenerateGeometry(_) | Error::DegenerateVector(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let err = Error::Structural("bad".to_string());
        assert!(err.to_string().starts_with("[E3001]"));

        let err = Error::UnsupportedPathCommand {
            position: 4,
            token: "Q".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "[E4001] Unsupported path command at position 4: 'Q'"
        );

        let err = Error::unsupported_relation("tangent", "Point", "Point");
        assert!(err.to_string().contains("tangent"));
        assert!(err.to_string().starts_with("[E4003]"));
    }

    #[test]
    fn test_structural_family() {
        assert!(Error::Structural("x".into()).is_structural());
        assert!(
            Error::DependencyOrder {
                feature: "Pad".into(),
                missing: "Sketch".into()
            }
            .is_structural()
        );
        assert!(!Error::DegenerateGeometry("x".into()).is_structural());
        assert!(Error::DegenerateVector("x".into()).is_degenerate());
    }

    #[test]
    fn test_context_is_appended() {
        let ctx = ErrorContext::new()
            .file("Document.xml")
            .element("Constrain")
            .hint("check the Type attribute");
        let err = Error::InvalidXml("broken".into()).with_context(&ctx);
        let msg = err.to_string();
        assert!(msg.contains("File: Document.xml"));
        assert!(msg.contains("Element: Constrain"));
        assert!(msg.contains("Hint: check the Type attribute"));
    }

    #[test]
    fn test_parse_float_conversion() {
        let err: Error = "abc".parse::<f64>().unwrap_err().into();
        assert!(matches!(err, Error::ParseError(_)));
    }
}
