// Security Primitives
//
// Both modules gate every warehouse-facing operation in the executor:
// the vault protects stored credentials, the whitelist makes sure no
// attacker-controlled string ever reaches a generated statement.

pub mod vault;
pub mod whitelist;

// Re-exports
pub use vault::{Credential, CredentialVault, VaultError};
pub use whitelist::{IdentifierError, TableName};
