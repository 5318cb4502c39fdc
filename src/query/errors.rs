//! Query error types
//!
//! Error codes:
//! - BOX_QUERY_TYPE_MISMATCH (REJECT)
//! - BOX_QUERY_AMBIGUOUS_PROPERTY (REJECT)
//! - BOX_QUERY_NON_UNIQUE_RESULT (REJECT)
//! - BOX_QUERY_UNKNOWN_PROPERTY (REJECT)
//! - BOX_QUERY_UNKNOWN_ALIAS (REJECT)
//! - BOX_QUERY_OPERAND_COUNT (REJECT)
//! - BOX_QUERY_INVALID (REJECT)
//! - BOX_AGGREGATE_OVERFLOW (ERROR)

use std::fmt;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected, nothing executed
    Reject,
    /// Execution ran but could not produce a result
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Query-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Literal type incompatible with the property or condition
    TypeMismatch,
    /// Rebind target matches more than one condition
    AmbiguousProperty,
    /// `find_unique` found more than one match
    NonUniqueResult,
    /// Property not part of the query's entity, or not in the plan
    UnknownProperty,
    /// No condition carries the alias
    UnknownAlias,
    /// Operand shape differs from the condition's
    OperandCountMismatch,
    /// Malformed builder sequence
    InvalidQuery,
    /// Integer sum does not fit in i64
    AggregateOverflow,
}

impl QueryErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::TypeMismatch => "BOX_QUERY_TYPE_MISMATCH",
            QueryErrorCode::AmbiguousProperty => "BOX_QUERY_AMBIGUOUS_PROPERTY",
            QueryErrorCode::NonUniqueResult => "BOX_QUERY_NON_UNIQUE_RESULT",
            QueryErrorCode::UnknownProperty => "BOX_QUERY_UNKNOWN_PROPERTY",
            QueryErrorCode::UnknownAlias => "BOX_QUERY_UNKNOWN_ALIAS",
            QueryErrorCode::OperandCountMismatch => "BOX_QUERY_OPERAND_COUNT",
            QueryErrorCode::InvalidQuery => "BOX_QUERY_INVALID",
            QueryErrorCode::AggregateOverflow => "BOX_AGGREGATE_OVERFLOW",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            QueryErrorCode::AggregateOverflow => Severity::Error,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error with context
#[derive(Debug, Clone, PartialEq)]
pub struct QueryError {
    code: QueryErrorCode,
    message: String,
    /// Property or alias the error refers to
    target: Option<String>,
}

impl QueryError {
    fn new(code: QueryErrorCode, message: String, target: Option<String>) -> Self {
        Self {
            code,
            message,
            target,
        }
    }

    pub fn type_mismatch(property: &str, detail: impl Into<String>) -> Self {
        Self::new(
            QueryErrorCode::TypeMismatch,
            format!("Property '{}': {}", property, detail.into()),
            Some(property.to_string()),
        )
    }

    pub fn ambiguous_property(property: &str, matches: usize) -> Self {
        Self::new(
            QueryErrorCode::AmbiguousProperty,
            format!(
                "Property '{}' is used by {} conditions; rebind by alias instead",
                property, matches
            ),
            Some(property.to_string()),
        )
    }

    pub fn non_unique_result(matches: usize) -> Self {
        Self::new(
            QueryErrorCode::NonUniqueResult,
            format!("Expected at most one result, found {}", matches),
            None,
        )
    }

    pub fn unknown_property(entity: &str, property: &str) -> Self {
        Self::new(
            QueryErrorCode::UnknownProperty,
            format!("Property '{}' is not usable in a query on '{}'", property, entity),
            Some(property.to_string()),
        )
    }

    /// Rebind target property has no condition in the plan
    pub fn property_not_in_plan(property: &str) -> Self {
        Self::new(
            QueryErrorCode::UnknownProperty,
            format!("No condition on property '{}'", property),
            Some(property.to_string()),
        )
    }

    pub fn unknown_alias(alias: &str) -> Self {
        Self::new(
            QueryErrorCode::UnknownAlias,
            format!("No condition with alias '{}'", alias),
            Some(alias.to_string()),
        )
    }

    pub fn operand_count(target: &str, expected: &str, found: &str) -> Self {
        Self::new(
            QueryErrorCode::OperandCountMismatch,
            format!(
                "Condition on '{}' takes {}, got {}",
                target, expected, found
            ),
            Some(target.to_string()),
        )
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::InvalidQuery, reason.into(), None)
    }

    pub fn aggregate_overflow(property: &str) -> Self {
        Self::new(
            QueryErrorCode::AggregateOverflow,
            format!("Sum of '{}' overflows a 64-bit integer", property),
            Some(property.to_string()),
        )
    }

    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Property or alias named by the error
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for QueryError {}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
