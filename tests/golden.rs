//! Golden tests for record token issuance.
//!
//! These pin the issuance contract: claim shape, fixed expiry window, error
//! ordering, record binding, and that the secret never leaks.

use std::io;
use std::sync::{Arc, Mutex};

use crm_record_token::{
    ErrorKind, FixedClock, IssueError, IssuerConfig, SignedToken, SigningSecret, TokenIssuer,
    TokenVerifier, VerificationError, VerificationMode, TOKEN_TTL_SECS,
};
use proptest::prelude::*;
use tracing_subscriber::fmt::MakeWriter;

/// Secret used by the worked example.
const EXAMPLE_SECRET: &str = "s3cr3t";

/// Secret built from characters that never occur in base64url, JSON claims or
/// log framing, so any leaked fragment is unambiguous.
const DISTINCT_SECRET: &str = "Zq9!vK2#mW7$pL4^xR8&nB3*";

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn issuer_at(secret: &str, now: i64) -> (TokenIssuer, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(now));
    let issuer = TokenIssuer::with_clock(IssuerConfig::new(secret), clock.clone());
    (issuer, clock)
}

fn verifier(secret: &str) -> TokenVerifier {
    TokenVerifier::new(VerificationMode::local_secret(SigningSecret::new(secret).unwrap()))
}

/// True when `haystack` contains any `window`-length fragment of `secret`.
fn leaks_fragment(haystack: &str, secret: &str, window: usize) -> bool {
    let chars: Vec<char> = secret.chars().collect();
    chars
        .windows(window)
        .map(|w| w.iter().collect::<String>())
        .any(|fragment| haystack.contains(&fragment))
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WORKED EXAMPLE
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_worked_example_claims_and_expiry() {
    let (issuer, _) = issuer_at(EXAMPLE_SECRET, 1000);
    let issued = issuer.issue("deal-123").unwrap();

    assert_eq!(issued.claims.record_id.as_str(), "deal-123");
    assert_eq!(issued.claims.issued_at, 1000);
    assert_eq!(issued.claims.expires_at, 4600);

    let verifier = verifier(EXAMPLE_SECRET);

    let accepted = verifier.verify_at(&issued.token, "deal-123", 4599).unwrap();
    assert_eq!(accepted.claims, issued.claims);

    assert_eq!(
        verifier.verify_at(&issued.token, "deal-123", 4601),
        Err(VerificationError::Expired { expired_at: 4600 })
    );
}

#[test]
fn test_token_decodes_to_expected_json() {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let (issuer, _) = issuer_at(EXAMPLE_SECRET, 1000);
    let token = issuer.issue("deal-123").unwrap().token;

    let payload = token.as_str().split('.').nth(1).unwrap();
    let claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

    assert_eq!(
        claims,
        serde_json::json!({"recordId": "deal-123", "iat": 1000, "exp": 4600})
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// ERROR TAXONOMY
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unset_secret_fails_every_call() {
    let issuer = TokenIssuer::new(IssuerConfig::unconfigured());

    for record in ["deal-123", "contact-9", "x"] {
        let err = issuer.issue(record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }
}

#[test]
fn test_empty_secret_counts_as_unset() {
    let issuer = TokenIssuer::new(IssuerConfig::new(""));
    assert_eq!(issuer.issue("deal-123"), Err(IssueError::Configuration));
}

#[test]
fn test_empty_or_absent_record_is_invalid_input() {
    let (issuer, _) = issuer_at(EXAMPLE_SECRET, 1000);

    assert_eq!(issuer.issue("").unwrap_err().kind(), ErrorKind::InvalidInputError);
    assert_eq!(
        issuer.issue_optional(None).unwrap_err().kind(),
        ErrorKind::InvalidInputError
    );
}

#[test]
fn test_error_kinds_distinguish_caller_from_service() {
    let (issuer, _) = issuer_at(EXAMPLE_SECRET, 1000);
    let unconfigured = TokenIssuer::new(IssuerConfig::unconfigured());

    assert!(issuer.issue("").unwrap_err().kind().is_caller_error());
    assert!(!unconfigured.issue("deal-123").unwrap_err().kind().is_caller_error());
}

// ─────────────────────────────────────────────────────────────────────────────
// BINDING AND EXPIRY
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_no_cross_record_replay() {
    let (issuer, _) = issuer_at(EXAMPLE_SECRET, 1000);
    let token_a = issuer.issue("A").unwrap().token;

    let verifier = verifier(EXAMPLE_SECRET);
    assert!(verifier.verify_at(&token_a, "A", 1001).is_ok());
    assert_eq!(
        verifier.verify_at(&token_a, "B", 1001),
        Err(VerificationError::RecordMismatch)
    );
}

#[test]
fn test_simulated_clock_advance_expires_token() {
    let (issuer, clock) = issuer_at(EXAMPLE_SECRET, 1_700_000_000);
    let issued = issuer.issue("deal-123").unwrap();

    let verifier = TokenVerifier::with_clock(
        VerificationMode::local_secret(SigningSecret::new(EXAMPLE_SECRET).unwrap()),
        clock.clone(),
    );
    assert!(verifier.verify(&issued.token, "deal-123").is_ok());

    clock.advance(TOKEN_TTL_SECS + 1);
    assert!(matches!(
        verifier.verify(&issued.token, "deal-123"),
        Err(VerificationError::Expired { .. })
    ));
}

#[test]
fn test_both_tokens_valid_until_own_expiry() {
    let (issuer, clock) = issuer_at(EXAMPLE_SECRET, 1000);
    let first = issuer.issue("deal-123").unwrap();
    clock.advance(600);
    let second = issuer.issue("deal-123").unwrap();

    assert_ne!(first.token, second.token);

    let verifier = verifier(EXAMPLE_SECRET);
    // Between the two expiries only the later token is valid
    assert!(verifier.verify_at(&first.token, "deal-123", 4601).is_err());
    assert!(verifier.verify_at(&second.token, "deal-123", 4601).is_ok());
}

#[test]
fn test_concurrent_issuance() {
    let (issuer, _) = issuer_at(EXAMPLE_SECRET, 1000);
    let issuer = Arc::new(issuer);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let issuer = Arc::clone(&issuer);
            std::thread::spawn(move || {
                (0..50)
                    .map(|i| {
                        let record = format!("deal-{}-{}", t, i);
                        let issued = issuer.issue(&record).unwrap();
                        (record, issued.token)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let verifier = verifier(EXAMPLE_SECRET);
    for handle in handles {
        for (record, token) in handle.join().unwrap() {
            let result = verifier.verify_at(&token, &record, 1001).unwrap();
            assert_eq!(result.claims.expires_at, 4600);
        }
    }
}

#[test]
fn test_wrong_secret_rejected() {
    let (issuer, _) = issuer_at(EXAMPLE_SECRET, 1000);
    let token = issuer.issue("deal-123").unwrap().token;

    assert_eq!(
        verifier("another-secret").verify_at(&token, "deal-123", 1001),
        Err(VerificationError::SignatureMismatch)
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// SECRET HYGIENE
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_secret_never_in_outputs_or_logs() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();

    let mut outputs: Vec<String> = Vec::new();

    tracing::subscriber::with_default(subscriber, || {
        let (issuer, _) = issuer_at(DISTINCT_SECRET, 1000);

        let issued = issuer.issue("deal-123").unwrap();
        outputs.push(issued.token.to_string());
        outputs.push(format!("{:?}", issued));
        outputs.push(format!("{:?}", issuer));

        let err = issuer.issue("").unwrap_err();
        outputs.push(err.to_string());
        outputs.push(format!("{:?}", err));

        let tampered = SignedToken::from_string(format!("{}A", issued.token));
        let verify_err = verifier(DISTINCT_SECRET)
            .verify_at(&tampered, "deal-123", 1001)
            .unwrap_err();
        outputs.push(verify_err.to_string());
    });

    outputs.push(logs.contents());

    for output in &outputs {
        assert!(
            !leaks_fragment(output, DISTINCT_SECRET, 4),
            "secret fragment leaked into: {}",
            output
        );
    }
    assert!(logs.contents().contains("deal-123"), "issuance should be logged");
}

// ─────────────────────────────────────────────────────────────────────────────
// PROPERTIES
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_any_nonempty_record_issues_one_hour_token(
        record in ".{1,64}",
        now in 0i64..4_000_000_000,
    ) {
        let (issuer, _) = issuer_at(EXAMPLE_SECRET, now);
        let issued = issuer.issue(&record).unwrap();

        prop_assert_eq!(issued.claims.expires_at - issued.claims.issued_at, 3600);
        prop_assert_eq!(issued.claims.record_id.as_str(), record.as_str());

        let verified = verifier(EXAMPLE_SECRET).verify_at(&issued.token, &record, now).unwrap();
        prop_assert_eq!(verified.claims, issued.claims);
    }

    #[test]
    fn prop_token_never_verifies_for_other_record(
        a in "[a-z0-9-]{1,16}",
        b in "[a-z0-9-]{1,16}",
    ) {
        prop_assume!(a != b);
        let (issuer, _) = issuer_at(EXAMPLE_SECRET, 1000);
        let token = issuer.issue(&a).unwrap().token;

        prop_assert_eq!(
            verifier(EXAMPLE_SECRET).verify_at(&token, &b, 1001),
            Err(VerificationError::RecordMismatch)
        );
    }
}
