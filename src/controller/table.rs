//! Table Plumbing
//!
//! Pieces shared by the account and post managers: row action dispatch,
//! refetch ordering, the edit modal and the confirmation prompt.

use std::cell::Cell;

/// Interactive yes/no prompt guarding destructive actions
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Action bound to one rendered row, keyed by the row's id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction<Id> {
    Edit(Id),
    Delete(Id),
}

impl<Id: Copy> RowAction<Id> {
    /// Both actions of the row for `id`, in display order
    pub fn for_row(id: Id) -> [RowAction<Id>; 2] {
        [RowAction::Edit(id), RowAction::Delete(id)]
    }

    pub fn id(&self) -> Id {
        match self {
            RowAction::Edit(id) | RowAction::Delete(id) => *id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RowAction::Edit(_) => "Edit",
            RowAction::Delete(_) => "Delete",
        }
    }
}

/// Issue order of a list refetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListTicket(u64);

/// Orders overlapping refetches so that only the newest response renders.
///
/// Every refetch takes a ticket before its request goes out; a completion
/// is applied only when its ticket is newer than the last applied one.
#[derive(Debug, Default)]
pub struct ListSequencer {
    issued: Cell<u64>,
    applied: Cell<u64>,
}

impl ListSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> ListTicket {
        let next = self.issued.get() + 1;
        self.issued.set(next);
        ListTicket(next)
    }

    /// Claim the table for `ticket`. False means a newer listing already rendered.
    pub fn accept(&self, ticket: ListTicket) -> bool {
        if ticket.0 > self.applied.get() {
            self.applied.set(ticket.0);
            true
        } else {
            false
        }
    }

    /// Number of refetches started so far
    pub fn issued(&self) -> u64 {
        self.issued.get()
    }
}

/// Edit modal holding the buffer for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal<Id, B> {
    Closed,
    Open { id: Id, buffer: B },
}

impl<Id, B> Default for Modal<Id, B> {
    fn default() -> Self {
        Modal::Closed
    }
}

impl<Id: Copy, B> Modal<Id, B> {
    pub fn is_open(&self) -> bool {
        matches!(self, Modal::Open { .. })
    }

    pub fn editing(&self) -> Option<Id> {
        match self {
            Modal::Open { id, .. } => Some(*id),
            Modal::Closed => None,
        }
    }

    pub fn buffer(&self) -> Option<&B> {
        match self {
            Modal::Open { buffer, .. } => Some(buffer),
            Modal::Closed => None,
        }
    }
}
