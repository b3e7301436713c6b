//! Digital signature (TTE) sub-flow.
//!
//! Signing is a three step exchange: the signer enters a passkey, the passkey
//! is verified, and the signature is confirmed. Only a confirmed session hands
//! its passkey to [`Engine::complete_signature`](crate::engine::Engine::complete_signature);
//! abandoning a session at any earlier step leaves the RFC untouched.

use thiserror::Error;

use crate::error::ValidationError;

pub const DEFAULT_MIN_PASSKEY_LEN: usize = 6;

pub fn validate_passkey(passkey: &str, min_len: usize) -> Result<(), ValidationError> {
    if passkey.is_empty() {
        return Err(ValidationError::MissingPasskey);
    }
    if passkey.chars().count() < min_len {
        return Err(ValidationError::PasskeyTooShort { min: min_len });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStep {
    AwaitingPasskey,
    Verifying,
    Confirmed,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Signature step out of order: expected {expected:?}, session is at {actual:?}")]
    OutOfOrder {
        expected: SignatureStep,
        actual: SignatureStep,
    },
}

#[derive(Debug)]
pub struct SignatureSession {
    rfc_id: String,
    step: SignatureStep,
    passkey: Option<String>,
    min_passkey_len: usize,
}

impl SignatureSession {
    pub fn new(rfc_id: impl Into<String>, min_passkey_len: usize) -> Self {
        Self {
            rfc_id: rfc_id.into(),
            step: SignatureStep::AwaitingPasskey,
            passkey: None,
            min_passkey_len,
        }
    }

    pub fn rfc_id(&self) -> &str {
        &self.rfc_id
    }

    pub fn step(&self) -> SignatureStep {
        self.step
    }

    /// Step 1. A rejected passkey keeps the session waiting for another try.
    pub fn enter_passkey(&mut self, passkey: &str) -> Result<(), SignatureError> {
        self.expect(SignatureStep::AwaitingPasskey)?;
        validate_passkey(passkey, self.min_passkey_len)?;
        self.passkey = Some(passkey.to_string());
        self.step = SignatureStep::Verifying;
        Ok(())
    }

    /// Step 2 finished.
    pub fn verified(&mut self) -> Result<(), SignatureError> {
        self.expect(SignatureStep::Verifying)?;
        self.step = SignatureStep::Confirmed;
        Ok(())
    }

    /// Step 3: release the passkey of a confirmed session.
    pub fn into_passkey(self) -> Result<String, SignatureError> {
        self.expect(SignatureStep::Confirmed)?;
        self.passkey.ok_or(SignatureError::OutOfOrder {
            expected: SignatureStep::Verifying,
            actual: SignatureStep::Confirmed,
        })
    }

    fn expect(&self, expected: SignatureStep) -> Result<(), SignatureError> {
        if self.step != expected {
            return Err(SignatureError::OutOfOrder {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }
}
