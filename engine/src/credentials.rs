//! Credential verification
//!
//! Accounts store passwords in plain text and login compares them exactly.
//! Both steps go through [`CredentialHandleImpl`] so a hashing verifier can
//! replace [`PlaintextVerifier`] without touching the HTTP layer.

use sdk::context::CredentialHandleImpl;

/// Stores passwords as given and compares them byte for byte
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextVerifier;

impl CredentialHandleImpl for PlaintextVerifier {
    fn protect(&self, password: &str) -> String {
        password.to_string()
    }

    fn verify(&self, supplied: &str, stored: &str) -> bool {
        supplied == stored
    }
}
