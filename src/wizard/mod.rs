//! Wizard - the guided boost form as a state machine.
//!
//! | From | Event | Guard | To |
//! |------|-------|-------|----|
//! | amount | `submit_amount` | amount ≥ minimum (and ≤ balance if known) | address |
//! | address | `submit_destination` | destination not blank | confirmation |
//! | address | `back` | - | amount |
//! | confirmation | `confirm` | - | success, after one submission |
//! | confirmation | `back` | - | address |
//! | success | `reset` | - | amount, inputs cleared |
//!
//! Any other event returns [`BoostError::InvalidTransition`] and leaves the
//! state as it was. Only `confirm` reaches the network.

mod validate;

pub use validate::{btc_string, parse_btc, validate_destination, AmountRules};

use crate::agent::{AuthenticatedActor, Receipt};
use crate::errors::{BoostError, BoostResult};
use async_trait::async_trait;
use bitcoin::Amount;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Service fee shown on the confirmation step, in basis points.
pub const BOOST_FEE_BPS: u64 = 50;
/// Expected time from deposit to ckBTC delivery.
pub const ESTIMATED_DELIVERY: Duration = Duration::from_secs(5 * 60);

/// The write the wizard performs on `confirm`.
#[async_trait]
pub trait BoostSubmitter: Send + Sync {
    async fn submit_boost(&self, amount: Amount, destination: &str) -> BoostResult<Receipt>;
}

#[async_trait]
impl BoostSubmitter for AuthenticatedActor {
    async fn submit_boost(&self, amount: Amount, destination: &str) -> BoostResult<Receipt> {
        AuthenticatedActor::submit_boost(self, amount, destination).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Amount,
    Address,
    Confirmation,
    Success,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Amount => "amount",
            Step::Address => "address",
            Step::Confirmation => "confirmation",
            Step::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub step: Step,
    /// As typed by the user.
    pub amount: String,
    pub destination: String,
    /// Last validation or submission error, cleared on the next transition.
    pub error: Option<String>,
    /// A submission is outstanding.
    pub in_progress: bool,
    /// Present only in `Step::Success`.
    pub receipt: Option<Receipt>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: Step::Amount,
            amount: String::new(),
            destination: String::new(),
            error: None,
            in_progress: false,
            receipt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Submitted(Receipt),
    /// Another confirm was already in flight.
    Ignored,
}

/// Figures for the confirmation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostQuote {
    pub amount: Amount,
    pub fee: Amount,
    pub receive: Amount,
    pub estimated_delivery: Duration,
}

impl BoostQuote {
    pub fn for_amount(amount: Amount) -> Self {
        let sats = amount.to_sat();
        // fee <= amount, so the narrowing cannot fail.
        let fee = u64::try_from(u128::from(sats) * u128::from(BOOST_FEE_BPS) / 10_000).unwrap_or(sats);
        let fee = Amount::from_sat(fee);
        let receive = amount.checked_sub(fee).unwrap_or(Amount::ZERO);
        Self { amount, fee, receive, estimated_delivery: ESTIMATED_DELIVERY }
    }
}

pub struct BoostWizard {
    submitter: Arc<dyn BoostSubmitter>,
    rules: Mutex<AmountRules>,
    submit_timeout: Option<Duration>,
    state: Mutex<WizardState>,
}

impl BoostWizard {
    pub fn new(submitter: Arc<dyn BoostSubmitter>, minimum: Amount) -> Self {
        Self {
            submitter,
            rules: Mutex::new(AmountRules::new(minimum)),
            submit_timeout: None,
            state: Mutex::new(WizardState::default()),
        }
    }

    /// Give up on a submission after `timeout` and stay on confirmation.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = Some(timeout);
        self
    }

    pub fn state(&self) -> WizardState {
        self.lock_state().clone()
    }

    pub fn step(&self) -> Step {
        self.lock_state().step
    }

    pub fn rules(&self) -> AmountRules {
        *self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Known spendable balance; amounts above it fail validation.
    pub fn set_available_balance(&self, available: Option<Amount>) {
        self.rules.lock().unwrap_or_else(PoisonError::into_inner).available = available;
    }

    pub fn submit_amount(&self, input: &str) -> BoostResult<Amount> {
        let rules = self.rules();
        let mut state = self.lock_state();
        expect_step(&state, Step::Amount, "submit an amount")?;
        state.amount = input.to_string();
        match rules.validate(input) {
            Ok(amount) => {
                state.error = None;
                state.step = Step::Address;
                Ok(amount)
            }
            Err(e) => {
                tracing::debug!(input, reason = %e, "amount rejected");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn submit_destination(&self, input: &str) -> BoostResult<()> {
        let mut state = self.lock_state();
        expect_step(&state, Step::Address, "submit a destination")?;
        state.destination = input.to_string();
        match validate_destination(input) {
            Ok(_) => {
                state.error = None;
                state.step = Step::Confirmation;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(reason = %e, "destination rejected");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn back(&self) -> BoostResult<Step> {
        let mut state = self.lock_state();
        let previous = match state.step {
            Step::Address => Step::Amount,
            Step::Confirmation if !state.in_progress => Step::Address,
            _ => return Err(invalid_transition(&state, "go back")),
        };
        state.step = previous;
        state.error = None;
        Ok(previous)
    }

    /// Quote for the amount under confirmation.
    pub fn quote(&self) -> Option<BoostQuote> {
        let state = self.lock_state();
        if state.step != Step::Confirmation {
            return None;
        }
        parse_btc(&state.amount).ok().map(BoostQuote::for_amount)
    }

    /// Submit the boost. Re-entrant calls while one is pending are ignored.
    ///
    /// Dropping the returned future releases the wizard: it stays on
    /// confirmation with an error and can be confirmed again.
    pub async fn confirm(&self) -> BoostResult<ConfirmOutcome> {
        let (amount, destination) = {
            let mut state = self.lock_state();
            expect_step(&state, Step::Confirmation, "confirm")?;
            if state.in_progress {
                tracing::debug!("confirm ignored, submission already in flight");
                return Ok(ConfirmOutcome::Ignored);
            }
            let amount = parse_btc(&state.amount)?;
            let destination = validate_destination(&state.destination)?.to_string();
            state.in_progress = true;
            state.error = None;
            (amount, destination)
        };

        let mut in_flight = InFlight { state: Some(&self.state) };
        let submission = self.submitter.submit_boost(amount, &destination);
        let result = match self.submit_timeout {
            Some(limit) => match tokio::time::timeout(limit, submission).await {
                Ok(result) => result,
                Err(_) => Err(BoostError::Timeout(limit)),
            },
            None => submission.await,
        };
        in_flight.state = None;

        let mut state = self.lock_state();
        state.in_progress = false;
        match result {
            Ok(receipt) => {
                tracing::info!(boost_id = receipt.boost_id, "boost confirmed");
                state.step = Step::Success;
                state.receipt = Some(receipt.clone());
                Ok(ConfirmOutcome::Submitted(receipt))
            }
            Err(e) => {
                tracing::warn!(error = %e, "boost submission failed");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Start over after a successful boost.
    pub fn reset(&self) -> BoostResult<()> {
        let mut state = self.lock_state();
        expect_step(&state, Step::Success, "reset")?;
        *state = WizardState::default();
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, WizardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears `in_progress` if a `confirm` future is dropped before it settles.
struct InFlight<'a> {
    state: Option<&'a Mutex<WizardState>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            tracing::warn!("boost confirmation cancelled, submission outcome unknown");
            state.in_progress = false;
            state.error = Some("Submission was cancelled".to_string());
        }
    }
}

fn expect_step(state: &WizardState, step: Step, event: &'static str) -> BoostResult<()> {
    if state.step == step {
        Ok(())
    } else {
        Err(invalid_transition(state, event))
    }
}

fn invalid_transition(state: &WizardState, event: &'static str) -> BoostError {
    BoostError::InvalidTransition { step: state.step.as_str(), event }
}
