//! Output schema descriptors.
//!
//! The events table exists in two layouts. Each layout is described by a fixed
//! [`SchemaDescriptor`]: the repeated groups it carries and the scalar columns
//! it copies. A source header is checked against the descriptor before any
//! row is read.
//!
//! | Variant    | Groups                                              | Id column  |
//! |------------|-----------------------------------------------------|------------|
//! | `standard` | user_data, session_data, event_data, consent_data   | `event_id` |
//! | `compact`  | event_data, consent_data                            | `user_id`  |

use std::collections::HashSet;
use std::fmt;

use crate::error::{TransformError, TransformResult};
use crate::models::RecordKey;

// =============================================================================
// Variant
// =============================================================================

/// Table layout selected for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SchemaVariant {
    /// Four groups plus `event_id`.
    #[default]
    Standard,
    /// `event_data` and `consent_data` plus `user_id`.
    Compact,
}

impl SchemaVariant {
    pub fn descriptor(self) -> &'static SchemaDescriptor {
        match self {
            SchemaVariant::Standard => &STANDARD,
            SchemaVariant::Compact => &COMPACT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVariant::Standard => "standard",
            SchemaVariant::Compact => "compact",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Groups
// =============================================================================

/// Repeated name/value group, fed by `<group>.<field>` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    UserData,
    SessionData,
    EventData,
    ConsentData,
}

impl Group {
    pub fn name(self) -> &'static str {
        match self {
            Group::UserData => "user_data",
            Group::SessionData => "session_data",
            Group::EventData => "event_data",
            Group::ConsentData => "consent_data",
        }
    }

    /// Field name of `column` if it belongs to this group: everything after
    /// the first `.`.
    pub fn field_name(self, column: &str) -> Option<&str> {
        column.strip_prefix(self.name())?.strip_prefix('.')
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// A top-level column copied verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarField {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> ScalarField {
    ScalarField { name, required: true }
}

const fn optional(name: &'static str) -> ScalarField {
    ScalarField { name, required: false }
}

/// Fixed shape of one table layout.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub variant: SchemaVariant,
    pub groups: &'static [Group],
    pub scalars: &'static [ScalarField],
    /// Scalar holding the per-row identifier ([`RecordKey`]).
    pub key_column: &'static str,
}

static STANDARD: SchemaDescriptor = SchemaDescriptor {
    variant: SchemaVariant::Standard,
    groups: &[Group::UserData, Group::SessionData, Group::EventData, Group::ConsentData],
    scalars: &[
        required("event_date"),
        optional("event_datetime"),
        required("event_timestamp"),
        optional("content_length"),
        required("client_id"),
        required("session_id"),
        required("event_name"),
        required("event_id"),
    ],
    key_column: "event_id",
};

static COMPACT: SchemaDescriptor = SchemaDescriptor {
    variant: SchemaVariant::Compact,
    groups: &[Group::EventData, Group::ConsentData],
    scalars: &[
        required("event_date"),
        optional("event_datetime"),
        required("event_timestamp"),
        optional("content_length"),
        required("client_id"),
        required("user_id"),
        required("session_id"),
        required("event_name"),
    ],
    key_column: "user_id",
};

impl SchemaDescriptor {
    pub fn has_group(&self, group: Group) -> bool {
        self.groups.contains(&group)
    }

    pub fn record_key(&self, value: Option<String>) -> RecordKey {
        match self.variant {
            SchemaVariant::Standard => RecordKey::EventId(value),
            SchemaVariant::Compact => RecordKey::UserId(value),
        }
    }

    /// Accept a header column that is either a scalar of this layout or a
    /// `<group>.<field>` column of one of its groups.
    pub fn check_column(&self, column: &str) -> TransformResult<()> {
        if self.scalars.iter().any(|s| s.name == column) {
            return Ok(());
        }

        for &group in self.groups {
            if let Some(field) = group.field_name(column) {
                if field.is_empty() {
                    return Err(TransformError::EmptyFieldName(column.to_string()));
                }
                return Ok(());
            }
        }

        Err(TransformError::UnknownColumn {
            column: column.to_string(),
            variant: self.variant.to_string(),
        })
    }

    /// Check a header against this layout.
    ///
    /// Fails on the first unrecognized or duplicate column, then on the first
    /// required scalar the header lacks.
    pub fn validate_header(&self, headers: &[String]) -> TransformResult<()> {
        if headers.is_empty() {
            return Err(TransformError::NoHeaders);
        }

        let mut seen = HashSet::new();
        for column in headers {
            if !seen.insert(column.as_str()) {
                return Err(TransformError::DuplicateColumn(column.clone()));
            }
            self.check_column(column)?;
        }

        if let Some(missing) = self
            .scalars
            .iter()
            .find(|s| s.required && !seen.contains(s.name))
        {
            return Err(TransformError::MissingColumn(missing.name.to_string()));
        }

        Ok(())
    }
}
