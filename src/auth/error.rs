//! Faults raised by the authentication core.
//!
//! Credential rejections are not errors; they travel as
//! [`RejectReason`](super::strategy::RejectReason) inside an outcome. Anything
//! here is an infrastructure fault and must never be shown to a user as
//! "wrong password".

use super::password::HashError;
use super::session::SessionError;
use super::store::StoreError;
use super::strategy::{RegistryError, StrategyKind};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{0} strategy received credentials of another kind")]
    CredentialKind(StrategyKind),

    #[error("user vanished after a duplicate {0} insert")]
    LostRace(super::store::UniqueKey),
}
