//! Integration tests for the squelch controller.
//!
//! All tests run on a `ManualClock` so suppression windows are deterministic.

use std::sync::Arc;
use std::time::Duration;

use logging::{Admission, Clock, ManualClock, SquelchController, SquelchPolicy, fingerprint};

fn controller(
    threshold: usize,
    growth_factor: u32,
) -> (SquelchController<Arc<ManualClock>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let policy = SquelchPolicy {
        threshold,
        growth_factor,
        ..SquelchPolicy::default()
    };
    (SquelchController::with_clock(policy, Arc::clone(&clock)), clock)
}

// ============================================================================
// Burst Suppression
// ============================================================================

/// Verifies a burst of ten identical messages admits three and drops seven.
#[test]
fn burst_admits_threshold_then_suppresses() {
    let (squelch, _clock) = controller(3, 2);
    let fp = fingerprint("connection refused");

    let outcomes: Vec<Admission> = (0..10).map(|_| squelch.admit(fp)).collect();
    let admitted = outcomes.iter().filter(|a| a.is_admitted()).count();

    assert_eq!(admitted, 3);
    assert!(outcomes[..3].iter().all(Admission::is_admitted));
    assert!(outcomes[3..].iter().all(|a| *a == Admission::Suppressed));
    assert_eq!(squelch.state().suppressed, 7);
}

/// Verifies suppression windows widen with every denial.
#[test]
fn windows_widen_progressively() {
    let (squelch, clock) = controller(3, 2);
    let fp = fingerprint("retrying");
    for _ in 0..3 {
        squelch.admit(fp);
    }

    let mut previous = Duration::ZERO;
    let start = clock.now();
    for _ in 0..7 {
        assert_eq!(squelch.admit(fp), Admission::Suppressed);
        let window = squelch.state().next_allowed.unwrap() - start;
        assert!(window >= previous);
        previous = window;
    }
    assert_eq!(previous, Duration::from_secs(60));
}

/// Verifies a distinct message is admitted at once and reports the run.
#[test]
fn distinct_message_resets_admission() {
    let (squelch, _clock) = controller(3, 2);
    let fp = fingerprint("connection refused");
    for _ in 0..10 {
        squelch.admit(fp);
    }

    assert_eq!(
        squelch.admit(fingerprint("connected")),
        Admission::Admit {
            squelched: Some(7)
        }
    );
    assert!(squelch.admit(fp).is_admitted());
}

/// Verifies waiting out the window re-admits the same message once.
#[test]
fn elapsed_window_readmits_with_marker() {
    let (squelch, clock) = controller(3, 2);
    let fp = fingerprint("tick");
    for _ in 0..4 {
        squelch.admit(fp);
    }
    clock.advance(Duration::from_secs(2));

    assert_eq!(
        squelch.admit(fp),
        Admission::Admit {
            squelched: Some(1)
        }
    );
    assert_eq!(squelch.admit(fp), Admission::Admit { squelched: None });
}
