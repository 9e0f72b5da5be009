use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
#[error("call stack capacity exceeded, pushing of address {address_not_pushed:X} failed")]
pub struct CallStackFullError {
    pub address_not_pushed: u16,
}

/// The bounded stack of subroutine return addresses.
///
/// Pushing beyond capacity fails instead of growing; the historical machine
/// had sixteen slots and exceeding them is a fatal fault, not a resize.
#[derive(Debug, PartialEq, Eq)]
pub struct CallStack(Vec<u16>);

impl CallStack {
    /// Nesting depth of the original interpreter.
    pub const CAPACITY: usize = 16;

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.0.pop()
    }

    pub fn push(&mut self, address: u16) -> Result<(), CallStackFullError> {
        if self.0.len() < Self::CAPACITY {
            self.0.push(address);
            Ok(())
        } else {
            Err(CallStackFullError {
                address_not_pushed: address,
            })
        }
    }
}

impl From<Vec<u16>> for CallStack {
    fn from(vec: Vec<u16>) -> Self {
        Self(vec)
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self(Vec::with_capacity(Self::CAPACITY))
    }
}
