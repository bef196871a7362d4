/// Approval code generation and the in-process attempt store
///
/// Codes are short-lived, single-use, and bound to the employee and
/// session half they were requested for. The store keeps consumed
/// attempts around (marked verified) until a submission redeems them,
/// so a replayed verification is told the code was already used instead
/// of being handed a fresh mismatch.
use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset};
use rand::Rng;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::{GateError, GateState, SessionLabel};

/// Inclusive range of issued codes. Every code is exactly six digits;
/// leading zeros never occur.
const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Generate a uniformly distributed six-digit approval code
pub fn generate_approval_code() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(CODE_MIN..=CODE_MAX).to_string()
}

/// One outstanding (or consumed, not yet redeemed) approval attempt
#[derive(Debug, Clone)]
pub struct ApprovalAttempt {
    pub id: Uuid,
    pub employee_id: i64,
    pub session: SessionLabel,
    pub code: String,
    pub created_at: DateTime<FixedOffset>,
    pub expires_at: DateTime<FixedOffset>,
    pub state: GateState,
}

/// Thread-safe store of approval attempts, keyed by attempt id.
/// All state transitions happen under a single lock so a code can
/// never be consumed twice.
pub struct CodeStore {
    attempts: Mutex<HashMap<Uuid, ApprovalAttempt>>,
}

impl CodeStore {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record a freshly issued code. Any earlier attempt by the same
    /// employee for the same session is discarded; only the newest code
    /// counts.
    pub fn insert(
        &self,
        employee_id: i64,
        session: SessionLabel,
        code: String,
        now: DateTime<FixedOffset>,
        ttl: Duration,
    ) -> ApprovalAttempt {
        let attempt = ApprovalAttempt {
            id: Uuid::new_v4(),
            employee_id,
            session,
            code,
            created_at: now,
            expires_at: now + ttl,
            state: GateState::CodeRequested,
        };

        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        attempts.retain(|_, a| !(a.employee_id == employee_id && a.session == session));
        attempts.insert(attempt.id, attempt.clone());
        attempt
    }

    /// Compare a candidate against the stored code and consume it on
    /// match. Check and invalidation happen atomically under the store
    /// lock. A mismatch leaves the code valid for another try.
    pub fn verify_and_consume(
        &self,
        attempt_id: Uuid,
        employee_id: i64,
        candidate: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<(), GateError> {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());

        let attempt = match attempts.get_mut(&attempt_id) {
            Some(a) if a.employee_id == employee_id => a,
            _ => return Err(GateError::NoCodePending),
        };

        if attempt.state == GateState::CodeVerified {
            return Err(GateError::InvalidTransition(
                "approval code already consumed".to_string(),
            ));
        }

        if now >= attempt.expires_at {
            attempts.remove(&attempt_id);
            return Err(GateError::CodeExpired);
        }

        let matches: bool = attempt
            .code
            .as_bytes()
            .ct_eq(candidate.as_bytes())
            .into();
        if matches {
            attempt.state = GateState::CodeVerified;
            Ok(())
        } else {
            attempt.state = GateState::CodeRejected;
            Err(GateError::CodeMismatch)
        }
    }

    /// Redeem a verified attempt for submission. Removes and returns it
    /// only when it belongs to the employee, targets the session, and
    /// has actually been verified; otherwise the store is untouched.
    pub fn take_verified(
        &self,
        attempt_id: Uuid,
        employee_id: i64,
        session: SessionLabel,
    ) -> Result<ApprovalAttempt, GateError> {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());

        let verified = match attempts.get(&attempt_id) {
            Some(a) if a.employee_id == employee_id && a.session == session => {
                a.state == GateState::CodeVerified
            }
            _ => return Err(GateError::NoCodePending),
        };

        if !verified {
            return Err(GateError::InvalidTransition(
                "approval code not verified yet".to_string(),
            ));
        }

        attempts.remove(&attempt_id).ok_or(GateError::NoCodePending)
    }

    /// Drop every attempt past its expiry, whatever its state.
    /// Returns the number purged.
    pub fn purge_expired(&self, now: DateTime<FixedOffset>) -> usize {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let before = attempts.len();
        attempts.retain(|_, a| now < a.expires_at);
        before - attempts.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(330 * 60)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 3, h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..1000 {
            let code = generate_approval_code();
            assert_eq!(code.len(), 6, "code {} is not six digits", code);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0', "code {} has a leading zero", code);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(generate_approval_code());
        }
        // 200 draws from 900k values collide rarely; identical draws
        // every time would mean a broken generator
        assert!(seen.len() > 150);
    }

    #[test]
    fn test_verify_consumes_on_match() {
        let store = CodeStore::new();
        let attempt = store.insert(
            1,
            SessionLabel::FirstHalf,
            "123456".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );

        store
            .verify_and_consume(attempt.id, 1, "123456", ist(15, 5))
            .unwrap();

        // Second verification of the same code reports it consumed
        let err = store
            .verify_and_consume(attempt.id, 1, "123456", ist(15, 6))
            .unwrap_err();
        assert!(matches!(err, GateError::InvalidTransition(_)));
    }

    #[test]
    fn test_mismatch_keeps_code_valid() {
        let store = CodeStore::new();
        let attempt = store.insert(
            1,
            SessionLabel::FirstHalf,
            "123456".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );

        let err = store
            .verify_and_consume(attempt.id, 1, "654321", ist(15, 1))
            .unwrap_err();
        assert!(matches!(err, GateError::CodeMismatch));

        // The correct code still works after a wrong guess
        store
            .verify_and_consume(attempt.id, 1, "123456", ist(15, 2))
            .unwrap();
    }

    #[test]
    fn test_expired_code_is_rejected_and_dropped() {
        let store = CodeStore::new();
        let attempt = store.insert(
            1,
            SessionLabel::FirstHalf,
            "123456".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );

        // Exactly at expiry the code is no longer valid
        let err = store
            .verify_and_consume(attempt.id, 1, "123456", ist(15, 15))
            .unwrap_err();
        assert!(matches!(err, GateError::CodeExpired));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_new_request_replaces_outstanding_code() {
        let store = CodeStore::new();
        let first = store.insert(
            1,
            SessionLabel::FirstHalf,
            "111111".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );
        let second = store.insert(
            1,
            SessionLabel::FirstHalf,
            "222222".to_string(),
            ist(15, 1),
            Duration::minutes(15),
        );

        assert_eq!(store.len(), 1);
        let err = store
            .verify_and_consume(first.id, 1, "111111", ist(15, 2))
            .unwrap_err();
        assert!(matches!(err, GateError::NoCodePending));
        store
            .verify_and_consume(second.id, 1, "222222", ist(15, 2))
            .unwrap();
    }

    #[test]
    fn test_requests_for_other_sessions_coexist() {
        let store = CodeStore::new();
        store.insert(
            1,
            SessionLabel::FirstHalf,
            "111111".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );
        store.insert(
            1,
            SessionLabel::SecondHalf,
            "222222".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_verify_checks_ownership() {
        let store = CodeStore::new();
        let attempt = store.insert(
            1,
            SessionLabel::FirstHalf,
            "123456".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );

        let err = store
            .verify_and_consume(attempt.id, 2, "123456", ist(15, 1))
            .unwrap_err();
        assert!(matches!(err, GateError::NoCodePending));
    }

    #[test]
    fn test_take_verified_requires_verification() {
        let store = CodeStore::new();
        let attempt = store.insert(
            1,
            SessionLabel::FirstHalf,
            "123456".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );

        let err = store
            .take_verified(attempt.id, 1, SessionLabel::FirstHalf)
            .unwrap_err();
        assert!(matches!(err, GateError::InvalidTransition(_)));

        store
            .verify_and_consume(attempt.id, 1, "123456", ist(15, 1))
            .unwrap();

        // Wrong session does not redeem, and leaves the attempt intact
        let err = store
            .take_verified(attempt.id, 1, SessionLabel::SecondHalf)
            .unwrap_err();
        assert!(matches!(err, GateError::NoCodePending));

        let redeemed = store
            .take_verified(attempt.id, 1, SessionLabel::FirstHalf)
            .unwrap();
        assert_eq!(redeemed.code, "123456");
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_purge_expired_sweeps_all_states() {
        let store = CodeStore::new();
        let kept = store.insert(
            1,
            SessionLabel::FirstHalf,
            "111111".to_string(),
            ist(15, 10),
            Duration::minutes(15),
        );
        store.insert(
            2,
            SessionLabel::FirstHalf,
            "222222".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );
        let verified = store.insert(
            3,
            SessionLabel::SecondHalf,
            "333333".to_string(),
            ist(15, 0),
            Duration::minutes(15),
        );
        store
            .verify_and_consume(verified.id, 3, "333333", ist(15, 1))
            .unwrap();

        let purged = store.purge_expired(ist(15, 15));
        assert_eq!(purged, 2);
        assert_eq!(store.len(), 1);
        store
            .verify_and_consume(kept.id, 1, "111111", ist(15, 16))
            .unwrap();
    }
}
