//! Account Manager
//!
//! Table, add form and edit modal for `/api/accounts`. Every successful
//! mutation triggers exactly one list refetch.

use std::cell::RefCell;

use crate::api::{Account, AccountForm, AccountId, AccountStore, ApiResult};

use super::table::{Confirm, ListSequencer, ListTicket, Modal, RowAction};

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub id: AccountId,
    pub username: String,
    pub posting_enabled: bool,
    pub actions: [RowAction<AccountId>; 2],
}

impl AccountRow {
    fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            posting_enabled: account.post_flag,
            actions: RowAction::for_row(account.id),
        }
    }

    pub fn flag_label(&self) -> &'static str {
        if self.posting_enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    }
}

pub struct AccountManager<S, C> {
    store: S,
    confirm: C,
    sequencer: ListSequencer,
    rows: RefCell<Vec<AccountRow>>,
    form: RefCell<AccountForm>,
    modal: RefCell<Modal<AccountId, AccountForm>>,
}

impl<S: AccountStore, C: Confirm> AccountManager<S, C> {
    pub fn new(store: S, confirm: C) -> Self {
        Self {
            store,
            confirm,
            sequencer: ListSequencer::new(),
            rows: RefCell::new(Vec::new()),
            form: RefCell::new(AccountForm::default()),
            modal: RefCell::new(Modal::Closed),
        }
    }

    pub fn rows(&self) -> Vec<AccountRow> {
        self.rows.borrow().clone()
    }

    /// Add-form contents; kept after a failed create
    pub fn form(&self) -> AccountForm {
        self.form.borrow().clone()
    }

    pub fn modal(&self) -> Modal<AccountId, AccountForm> {
        self.modal.borrow().clone()
    }

    pub fn close_modal(&self) {
        self.modal.replace(Modal::Closed);
    }

    /// Number of list requests issued so far
    pub fn list_requests(&self) -> u64 {
        self.sequencer.issued()
    }

    /// Fetch all accounts and replace the table
    pub async fn list(&self) -> ApiResult<()> {
        let ticket = self.sequencer.begin();
        match self.store.list_accounts().await {
            Ok(accounts) => {
                self.apply_listing(ticket, &accounts);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load accounts");
                Err(e)
            }
        }
    }

    /// Render a listing unless a newer one already rendered
    pub fn apply_listing(&self, ticket: ListTicket, accounts: &[Account]) -> bool {
        if !self.sequencer.accept(ticket) {
            tracing::debug!(?ticket, "Discarding stale account listing");
            return false;
        }
        self.rows
            .replace(accounts.iter().map(AccountRow::from_account).collect());
        true
    }

    pub async fn create(&self, form: AccountForm) -> ApiResult<()> {
        self.form.replace(form.clone());

        match self.store.create_account(&form).await {
            Ok(response) => {
                tracing::info!(account_id = ?response.id, username = %form.username, "Account created");
                self.form.replace(AccountForm::default());
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create account");
                Err(e)
            }
        }
    }

    /// Load one account into the edit modal
    pub async fn edit(&self, id: AccountId) -> ApiResult<()> {
        match self.store.get_account(id).await {
            Ok(account) => {
                self.modal.replace(Modal::Open {
                    id,
                    buffer: AccountForm::from_account(&account),
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(account_id = id, error = %e, "Failed to load account");
                Err(e)
            }
        }
    }

    pub async fn save(&self, id: AccountId, form: AccountForm) -> ApiResult<()> {
        if self.modal.borrow().editing() == Some(id) {
            self.modal.replace(Modal::Open {
                id,
                buffer: form.clone(),
            });
        }

        match self.store.update_account(id, &form).await {
            Ok(_) => {
                tracing::info!(account_id = id, "Account updated");
                self.close_modal();
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(account_id = id, error = %e, "Failed to update account");
                Err(e)
            }
        }
    }

    /// Delete after confirmation. `Ok(false)` when the user declined.
    pub async fn remove(&self, id: AccountId) -> ApiResult<bool> {
        if !self
            .confirm
            .confirm("Are you sure you want to delete this account?")
        {
            tracing::debug!(account_id = id, "Account deletion cancelled");
            return Ok(false);
        }

        match self.store.delete_account(id).await {
            Ok(_) => {
                tracing::info!(account_id = id, "Account deleted");
                self.refresh().await;
                Ok(true)
            }
            Err(e) => {
                tracing::error!(account_id = id, error = %e, "Failed to delete account");
                Err(e)
            }
        }
    }

    /// Route a row button to its operation
    pub async fn dispatch(&self, action: RowAction<AccountId>) -> ApiResult<()> {
        match action {
            RowAction::Edit(id) => self.edit(id).await,
            RowAction::Delete(id) => self.remove(id).await.map(|_| ()),
        }
    }

    /// Post-mutation refetch. The mutation already succeeded, so a failed
    /// listing is only logged.
    async fn refresh(&self) {
        if let Err(e) = self.list().await {
            tracing::warn!(error = %e, "Account list refresh failed after mutation");
        }
    }
}
