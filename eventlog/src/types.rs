//! Handles, read flags, and record field enumerations.

use serde::{Deserialize, Serialize};

/// Opaque reference to the native resource behind a source.
///
/// Native integrations carry the OS handle value here; file and memory
/// sources use [`SourceHandle::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceHandle(pub u64);

impl SourceHandle {
    /// Handle value for sources without a native resource.
    pub const NONE: SourceHandle = SourceHandle(0);

    /// Whether this handle refers to a native resource.
    pub fn is_native(&self) -> bool {
        self.0 != 0
    }
}

/// Read positioning flags, combined bitwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFlags(pub u32);

impl ReadFlags {
    /// Read records in storage order from the current position.
    pub const SEQUENTIAL: ReadFlags = ReadFlags(0x0001);
    /// Start the read at an explicit record position.
    pub const SEEK: ReadFlags = ReadFlags(0x0002);
    /// Read forward from the position.
    pub const FORWARDS: ReadFlags = ReadFlags(0x0004);
    /// Read backward from the position.
    pub const BACKWARDS: ReadFlags = ReadFlags(0x0008);

    /// Whether all bits of `other` are set in `self`.
    pub fn contains(&self, other: ReadFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ReadFlags {
    type Output = ReadFlags;

    fn bitor(self, rhs: ReadFlags) -> ReadFlags {
        ReadFlags(self.0 | rhs.0)
    }
}

/// Severity class of a decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Success,
    Error,
    Warning,
    Information,
    AuditSuccess,
    AuditFailure,
    /// A value outside the defined set, preserved as-is.
    Unknown(u16),
}

impl EventType {
    /// Map the raw header field to an event type.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0x0000 => Self::Success,
            0x0001 => Self::Error,
            0x0002 => Self::Warning,
            0x0004 => Self::Information,
            0x0008 => Self::AuditSuccess,
            0x0010 => Self::AuditFailure,
            other => Self::Unknown(other),
        }
    }

    /// The raw header value for this event type.
    pub fn as_raw(&self) -> u16 {
        match self {
            Self::Success => 0x0000,
            Self::Error => 0x0001,
            Self::Warning => 0x0002,
            Self::Information => 0x0004,
            Self::AuditSuccess => 0x0008,
            Self::AuditFailure => 0x0010,
            Self::Unknown(other) => *other,
        }
    }
}

/// Kind of account a record's security identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidNameUse {
    User,
    Group,
    Domain,
    Alias,
    WellKnownGroup,
    DeletedAccount,
    Invalid,
    Unknown,
    Computer,
    Label,
    LogonSession,
}

impl SidNameUse {
    /// Map a raw SID_NAME_USE value (1-based) to the enum.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::User),
            2 => Some(Self::Group),
            3 => Some(Self::Domain),
            4 => Some(Self::Alias),
            5 => Some(Self::WellKnownGroup),
            6 => Some(Self::DeletedAccount),
            7 => Some(Self::Invalid),
            8 => Some(Self::Unknown),
            9 => Some(Self::Computer),
            10 => Some(Self::Label),
            11 => Some(Self::LogonSession),
            _ => None,
        }
    }
}
