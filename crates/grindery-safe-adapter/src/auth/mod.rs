/*
[INPUT]:  Wallet identity, wallet signer, and engine responses
[OUTPUT]: Auth tokens, session context, and auth errors
[POS]:    Auth layer - session bootstrap against the Grindery engine
[UPDATE]: When auth flow or signature methods change
*/

pub mod code;
pub mod context;
pub mod evm_wallet;
pub mod machine;
pub mod session;
pub mod wallet;

pub use code::AuthorizationCode;
pub use context::{AuthFailure, AuthPhase, FailureStage, RegistrationState, SessionContext};
pub use evm_wallet::EvmWalletSigner;
pub use machine::{AuthEvent, AuthStateMachine, Effect};
pub use session::{AuthSession, SessionConfig, SessionHandle};
pub use wallet::{MockWalletSigner, WalletSigner};
