//! Filesystem entry attributes as a loosely-typed map
//!
//! Hosts report different sets of attributes. Rather than fixing a schema,
//! attributes are a map from [`AttributeKey`] to a tagged [`AttributeValue`];
//! keys the host cannot report are simply absent.

use std::collections::BTreeMap;
use std::fs::{FileType, Metadata};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attributes of one filesystem entry.
pub type Attributes = BTreeMap<AttributeKey, AttributeValue>;

/// Names of the attributes a host may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    /// Entry kind, one of the `TYPE_*` strings
    Type,
    /// Size in bytes
    Size,
    ModificationDate,
    CreationDate,
    AccessDate,
    /// POSIX permission bits
    Permissions,
    ReadOnly,
    OwnerAccountId,
    GroupOwnerAccountId,
    /// Hard link count
    ReferenceCount,
    /// Inode number
    SystemFileNumber,
    DeviceId,
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Integer(u64),
    Timestamp(DateTime<Utc>),
    String(String),
    Boolean(bool),
}

pub const TYPE_FILE: &str = "file";
pub const TYPE_DIRECTORY: &str = "directory";
pub const TYPE_SYMLINK: &str = "symlink";
pub const TYPE_OTHER: &str = "other";

impl AttributeValue {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<SystemTime> for AttributeValue {
    fn from(v: SystemTime) -> Self {
        Self::Timestamp(v.into())
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// The `Type` attribute string for a host file type.
pub fn type_name(file_type: FileType) -> &'static str {
    if file_type.is_symlink() {
        TYPE_SYMLINK
    } else if file_type.is_dir() {
        TYPE_DIRECTORY
    } else if file_type.is_file() {
        TYPE_FILE
    } else {
        TYPE_OTHER
    }
}

/// Build the attribute map from host metadata.
///
/// Pass metadata from `symlink_metadata` so links describe themselves.
pub fn from_metadata(metadata: &Metadata) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(AttributeKey::Type, type_name(metadata.file_type()).into());
    attributes.insert(AttributeKey::Size, metadata.len().into());
    attributes.insert(
        AttributeKey::ReadOnly,
        metadata.permissions().readonly().into(),
    );

    if let Ok(modified) = metadata.modified() {
        attributes.insert(AttributeKey::ModificationDate, modified.into());
    }
    if let Ok(created) = metadata.created() {
        attributes.insert(AttributeKey::CreationDate, created.into());
    }
    if let Ok(accessed) = metadata.accessed() {
        attributes.insert(AttributeKey::AccessDate, accessed.into());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        attributes.insert(
            AttributeKey::Permissions,
            u64::from(metadata.mode() & 0o7777).into(),
        );
        attributes.insert(AttributeKey::OwnerAccountId, u64::from(metadata.uid()).into());
        attributes.insert(
            AttributeKey::GroupOwnerAccountId,
            u64::from(metadata.gid()).into(),
        );
        attributes.insert(AttributeKey::ReferenceCount, metadata.nlink().into());
        attributes.insert(AttributeKey::SystemFileNumber, metadata.ino().into());
        attributes.insert(AttributeKey::DeviceId, metadata.dev().into());
    }

    attributes
}
