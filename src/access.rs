use crate::config::AppEnv;
use crate::state::AccessLists;

/// Wallet adapter state as seen by the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub connected: bool,
    /// Base58 public key
    pub public_key: Option<String>,
}

impl WalletState {
    pub fn connected(public_key: impl Into<String>) -> Self {
        Self {
            connected: true,
            public_key: Some(public_key.into()),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Wallet from `WALLET_PUBKEY`; connected iff the variable is set and non-empty.
    pub fn from_env() -> Self {
        Self::from_var(std::env::var("WALLET_PUBKEY").ok().as_deref())
    }

    pub fn from_var(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(key) if !key.is_empty() => Self::connected(key),
            _ => Self::disconnected(),
        }
    }
}

/// Dialog the viewer should be shown when access is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    WalletConnect,
    GeoBlock,
    Whitelist,
    Blacklist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessVerdict {
    pub is_blocked: bool,
    pub modal: Option<Modal>,
}

impl AccessVerdict {
    pub fn allowed() -> Self {
        Self {
            is_blocked: false,
            modal: None,
        }
    }

    pub fn blocked(modal: Modal) -> Self {
        Self {
            is_blocked: true,
            modal: Some(modal),
        }
    }
}

/// Decide whether the board may be shown.
///
/// Rules in order, first match wins:
/// 1. no connected wallet -> wallet connect
/// 2. geo blocked -> geo block
/// 3. not whitelisted -> whitelist
/// 4. blacklisted -> blacklist
///
/// Rules 2-4 are skipped in the dev environment.
pub fn evaluate_access(
    wallet: &WalletState,
    geo_blocked: bool,
    lists: &AccessLists,
    env: &AppEnv,
) -> AccessVerdict {
    let key = match (&wallet.public_key, wallet.connected) {
        (Some(key), true) => key,
        _ => return AccessVerdict::blocked(Modal::WalletConnect),
    };

    if env.is_dev() {
        return AccessVerdict::allowed();
    }

    if geo_blocked {
        return AccessVerdict::blocked(Modal::GeoBlock);
    }

    if !lists.is_whitelisted(key) {
        return AccessVerdict::blocked(Modal::Whitelist);
    }

    if lists.is_blacklisted(key) {
        return AccessVerdict::blocked(Modal::Blacklist);
    }

    AccessVerdict::allowed()
}
