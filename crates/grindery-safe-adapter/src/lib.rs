/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Grindery Safe adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    AuthPhase,
    AuthSession,
    AuthStateMachine,
    AuthorizationCode,
    EvmWalletSigner,
    MockWalletSigner,
    SessionConfig,
    SessionContext,
    SessionHandle,
    WalletSigner,
};

// Re-export commonly used types from http
pub use http::{
    AuthError,
    ClientConfig,
    Result,
    SessionApiClient,
};

// Re-export all types
pub use types::*;
