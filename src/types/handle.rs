//! DXF entity handles
//!
//! Handles are hexadecimal identifiers unique within one exported drawing.

use std::fmt;

/// A unique identifier for an exported DXF record
///
/// Handle 0 is reserved for the drawing root and never assigned to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Handle(u64);

impl Handle {
    /// The null/root handle (0)
    pub const NULL: Handle = Handle(0);

    /// Create a new handle from a u64 value
    #[inline]
    pub const fn new(value: u64) -> Self {
        Handle(value)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Check if this is the null handle
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Handle(value)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

impl fmt::UpperHex for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// Monotonic handle allocator for one export
///
/// Every call to [`HandleSeed::next`] yields a handle never returned before by
/// the same seed, so a drawing written through one seed has unique handles.
#[derive(Debug, Clone)]
pub struct HandleSeed {
    next: u64,
}

impl HandleSeed {
    /// Start allocating at `first`
    pub fn starting_at(first: u64) -> Self {
        Self { next: first.max(1) }
    }

    /// Allocate the next handle
    pub fn next(&mut self) -> Handle {
        let handle = Handle(self.next);
        self.next += 1;
        handle
    }

    /// The handle the next allocation would return (`$HANDSEED`)
    pub fn peek(&self) -> Handle {
        Handle(self.next)
    }
}

impl Default for HandleSeed {
    fn default() -> Self {
        Self::starting_at(0x20)
    }
}
