use crate::domain::{Account, ChainConfig};

/// In-memory record of known accounts and current selection. Created empty
/// on mount, discarded on teardown; only the selected id outlives it, in
/// storage.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub accounts: Vec<Account>,
    pub selected: Option<String>,
    pub connected: bool,
    pub fetching: bool,
}

impl Session {
    pub fn selected_account(&self) -> Option<&Account> {
        let id = self.selected.as_deref()?;
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn reset(&mut self) {
        *self = Session::default();
    }
}

/// Keeps only accounts whose currency has a chain config.
pub fn filter_by_chains(accounts: Vec<Account>, chains: &[ChainConfig]) -> Vec<Account> {
    accounts
        .into_iter()
        .filter(|a| chains.iter().any(|c| c.currency == a.currency))
        .collect()
}

/// Initial selection priority: explicit initial id, then persisted id, then
/// the first listed account. Ids that match no account are skipped.
pub fn resolve_selection(
    accounts: &[Account],
    initial: Option<&str>,
    persisted: Option<&str>,
) -> Option<String> {
    for candidate in [initial, persisted].into_iter().flatten() {
        if accounts.iter().any(|a| a.id == candidate) {
            return Some(candidate.to_owned());
        }
    }
    accounts.first().map(|a| a.id.clone())
}
