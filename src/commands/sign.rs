use anyhow::{bail, Context, Result};
use inquire::{InquireError, Password, PasswordDisplayMode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rfcdesk::models::Actor;
use rfcdesk::signature::SignatureSession;

use super::Desk;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const CANCELLED: &str = "Signature cancelled; nothing was recorded";

pub struct Delays {
    pub verification: Duration,
    pub confirmation: Duration,
}

/// Prompt for the passkey with masked input.
pub fn read_passkey() -> Result<String> {
    passkey_answer(
        Password::new("Passkey:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt(),
    )
}

fn passkey_answer(answer: std::result::Result<String, InquireError>) -> Result<String> {
    match answer {
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            bail!(CANCELLED)
        }
        other => other.context("Failed to read passkey"),
    }
}

/// Walk the passkey, verification and confirmation steps, then apply the
/// signature. An interrupt during either wait leaves the RFC untouched.
pub fn run(
    desk: &mut Desk,
    id: &str,
    actor: &Actor,
    passkey: &str,
    delays: &Delays,
    interrupted: &AtomicBool,
) -> Result<()> {
    let before = desk.get_rfc(id)?.version;

    let mut session = SignatureSession::new(id, desk.policy().min_passkey_len);
    session.enter_passkey(passkey)?;

    println!("Verifying passkey...");
    wait(delays.verification, interrupted)?;
    session.verified()?;

    println!("Passkey verified, confirming signature...");
    wait(delays.confirmation, interrupted)?;
    let passkey = session.into_passkey()?;

    let rfc = desk.complete_signature(id, actor, &passkey)?;
    if rfc.version == before {
        println!("{} is already signed", rfc.id);
    } else {
        println!("{} digitally signed by {}", rfc.id, actor.name);
    }
    Ok(())
}

fn wait(delay: Duration, interrupted: &AtomicBool) -> Result<()> {
    let deadline = Instant::now() + delay;
    loop {
        if interrupted.load(Ordering::Relaxed) {
            bail!(CANCELLED);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{assigned, client, director, pic, setup_test_desk};
    use rfcdesk::error::EngineError;
    use rfcdesk::models::Role;

    fn instant() -> Delays {
        Delays {
            verification: Duration::ZERO,
            confirmation: Duration::ZERO,
        }
    }

    #[test]
    fn test_sign_completes_signature() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "integrasi");
        let flag = AtomicBool::new(false);

        run(&mut desk, &id, &director(), "secret-42", &instant(), &flag).unwrap();

        let rfc = desk.get_rfc(&id).unwrap();
        assert!(rfc.signed);
        assert!(!rfc.needs_signature);
        let tte = rfc.timeline.iter().find(|s| s.label == "TTE Required").unwrap();
        assert!(tte.completed);
    }

    #[test]
    fn test_sign_twice_is_noop() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "integrasi");
        let flag = AtomicBool::new(false);

        run(&mut desk, &id, &client(), "secret-42", &instant(), &flag).unwrap();
        let version = desk.get_rfc(&id).unwrap().version;
        run(&mut desk, &id, &client(), "secret-42", &instant(), &flag).unwrap();
        assert_eq!(desk.get_rfc(&id).unwrap().version, version);
    }

    #[test]
    fn test_short_passkey_fails() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "integrasi");
        let flag = AtomicBool::new(false);

        let result = run(&mut desk, &id, &director(), "123", &instant(), &flag);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Passkey must be at least 6 characters"));
        assert!(!desk.get_rfc(&id).unwrap().signed);
    }

    #[test]
    fn test_interrupt_cancels() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "integrasi");
        let flag = AtomicBool::new(true);
        let delays = Delays {
            verification: Duration::from_secs(5),
            confirmation: Duration::from_secs(5),
        };

        let result = run(&mut desk, &id, &director(), "secret-42", &delays, &flag);
        assert!(result.unwrap_err().to_string().contains("cancelled"));
        assert!(desk.get_rfc(&id).unwrap().signature_pending());
    }

    #[test]
    fn test_sign_not_needed() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "fitur_baru");
        let flag = AtomicBool::new(false);

        let err = run(&mut desk, &id, &director(), "secret-42", &instant(), &flag).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_signed_rfc_still_checks_role() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "integrasi");
        let flag = AtomicBool::new(false);
        run(&mut desk, &id, &director(), "secret-42", &instant(), &flag).unwrap();
        let version = desk.get_rfc(&id).unwrap().version;

        let err = run(&mut desk, &id, &pic(), "secret-42", &instant(), &flag).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::Forbidden { role: Role::Pic, .. })
        ));
        assert_eq!(desk.get_rfc(&id).unwrap().version, version);
    }

    #[test]
    fn test_sign_wrong_role() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "integrasi");
        let flag = AtomicBool::new(false);

        let result = run(&mut desk, &id, &pic(), "secret-42", &instant(), &flag);
        assert!(result.unwrap_err().to_string().contains("PIC may not sign"));
        assert!(desk.get_rfc(&id).unwrap().signature_pending());
    }

    #[test]
    fn test_passkey_answer() {
        assert_eq!(passkey_answer(Ok("secret-42".to_string())).unwrap(), "secret-42");

        let err = passkey_answer(Err(InquireError::OperationCanceled)).unwrap_err();
        assert_eq!(err.to_string(), CANCELLED);
        let err = passkey_answer(Err(InquireError::OperationInterrupted)).unwrap_err();
        assert_eq!(err.to_string(), CANCELLED);

        let err = passkey_answer(Err(InquireError::NotTTY)).unwrap_err();
        assert!(err.to_string().contains("Failed to read passkey"));
    }

    #[test]
    fn test_wait_zero_returns() {
        let flag = AtomicBool::new(false);
        assert!(wait(Duration::ZERO, &flag).is_ok());
    }
}
