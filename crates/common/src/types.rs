use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a newtype over an `i32` primary key.
///
/// The bookstore schema uses plain integer keys for every table except order
/// history, so the wrappers only exist to stop one table's key being passed
/// where another's is expected.
macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wraps a raw key value.
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            /// Returns the raw key value.
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

int_id!(
    /// Primary key of a customer. Assigned as `max(existing) + 1` on create.
    CustomerId
);

impl CustomerId {
    /// Returns the id that follows this one.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

int_id!(
    /// Primary key of an order.
    OrderId
);

int_id!(
    /// Primary key of an order line.
    LineId
);

int_id!(
    /// Primary key of a book.
    BookId
);

int_id!(
    /// Primary key of an order status in the status catalog.
    StatusId
);

int_id!(
    /// Primary key of an address.
    AddressId
);

int_id!(
    /// Primary key of a country.
    CountryId
);

/// Unique identifier for an order history entry.
///
/// Generated from a random 128-bit UUID so two entries never share an id,
/// even when created concurrently by separate processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(Uuid);

impl HistoryId {
    /// Creates a new random history ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a history ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for HistoryId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<HistoryId> for Uuid {
    fn from(id: HistoryId) -> Self {
        id.0
    }
}
