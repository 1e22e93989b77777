//! Named scenario vectors.
//!
//! Each scenario is a list of operations on a fresh [`AccountFixture`] where
//! the holder already holds key 1, with the outcome each one must have and,
//! optionally, the native allowance key 1 must have afterwards.

use anyhow::{bail, ensure, Context};

use keyward::AccountError;
use keyward_core::{AuthError, Call, KeyId};
use keyward_perms::SessionRequest;

use crate::fixtures::AccountFixture;
use crate::generators::destination;

/// The key scenarios operate on.
pub const SCENARIO_KEY: KeyId = KeyId(1);

/// Who performs an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The root key holder.
    Admin,
    /// The holder of key 1.
    Holder,
}

/// An operation. Destinations are indices into the pooled destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Create the session for key 1.
    CreateSession {
        by: Actor,
        destinations: &'static [u64],
        native_allowance: u128,
    },
    /// Execute a value transfer. The admin uses root, the holder key 1.
    Execute {
        by: Actor,
        destination: u64,
        value: u128,
    },
}

/// How an operation ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Unauthorized,
    UnauthorizedDestination,
    InsufficientAllowance,
    ExistingSession,
    BadInput,
    /// Failed for a reason other than authorization.
    Failed,
}

impl Outcome {
    /// Classify a result.
    pub fn of<T>(result: &Result<T, AccountError>) -> Self {
        let Err(e) = result else {
            return Outcome::Ok;
        };
        match e.auth() {
            Some(AuthError::Unauthorized { .. }) => Outcome::Unauthorized,
            Some(AuthError::UnauthorizedDestination { .. }) => Outcome::UnauthorizedDestination,
            Some(AuthError::InsufficientAllowance { .. }) => Outcome::InsufficientAllowance,
            Some(AuthError::ExistingSession(_)) => Outcome::ExistingSession,
            Some(AuthError::BadInput(_)) => Outcome::BadInput,
            None => Outcome::Failed,
        }
    }
}

/// One operation and what must come of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expect {
    pub op: Op,
    pub outcome: Outcome,
    /// Native allowance of key 1 afterwards.
    pub allowance_after: Option<u128>,
}

/// A named scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Human-readable name.
    pub name: &'static str,
    /// Operations, in order.
    pub steps: Vec<Expect>,
}

fn expect(op: Op, outcome: Outcome, allowance_after: Option<u128>) -> Expect {
    Expect {
        op,
        outcome,
        allowance_after,
    }
}

/// Get all scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    use Actor::*;

    vec![
        Scenario {
            name: "A: key holder with an unrestricted session executes anywhere",
            steps: vec![
                expect(
                    Op::CreateSession {
                        by: Admin,
                        destinations: &[],
                        native_allowance: 0,
                    },
                    Outcome::Ok,
                    Some(0),
                ),
                expect(
                    Op::Execute {
                        by: Holder,
                        destination: 4,
                        value: 0,
                    },
                    Outcome::Ok,
                    Some(0),
                ),
            ],
        },
        Scenario {
            name: "A: root executes anywhere without a session",
            steps: vec![expect(
                Op::Execute {
                    by: Admin,
                    destination: 5,
                    value: 10,
                },
                Outcome::Ok,
                None,
            )],
        },
        Scenario {
            name: "A: key holder without a session is refused",
            steps: vec![expect(
                Op::Execute {
                    by: Holder,
                    destination: 1,
                    value: 0,
                },
                Outcome::Unauthorized,
                None,
            )],
        },
        Scenario {
            name: "B: allowance is spent down and overdraft refused",
            steps: vec![
                expect(
                    Op::CreateSession {
                        by: Admin,
                        destinations: &[1],
                        native_allowance: 100,
                    },
                    Outcome::Ok,
                    Some(100),
                ),
                expect(
                    Op::Execute {
                        by: Holder,
                        destination: 1,
                        value: 40,
                    },
                    Outcome::Ok,
                    Some(60),
                ),
                expect(
                    Op::Execute {
                        by: Holder,
                        destination: 1,
                        value: 70,
                    },
                    Outcome::InsufficientAllowance,
                    Some(60),
                ),
            ],
        },
        Scenario {
            name: "C: destination outside the allow-list is refused",
            steps: vec![
                expect(
                    Op::CreateSession {
                        by: Admin,
                        destinations: &[1],
                        native_allowance: 100,
                    },
                    Outcome::Ok,
                    Some(100),
                ),
                expect(
                    Op::Execute {
                        by: Holder,
                        destination: 2,
                        value: 0,
                    },
                    Outcome::UnauthorizedDestination,
                    Some(100),
                ),
            ],
        },
        Scenario {
            name: "D: a session is created once",
            steps: vec![
                expect(
                    Op::CreateSession {
                        by: Admin,
                        destinations: &[],
                        native_allowance: 50,
                    },
                    Outcome::Ok,
                    Some(50),
                ),
                expect(
                    Op::CreateSession {
                        by: Admin,
                        destinations: &[],
                        native_allowance: 50,
                    },
                    Outcome::ExistingSession,
                    Some(50),
                ),
            ],
        },
        Scenario {
            name: "only root creates sessions",
            steps: vec![expect(
                Op::CreateSession {
                    by: Holder,
                    destinations: &[],
                    native_allowance: 50,
                },
                Outcome::Unauthorized,
                None,
            )],
        },
    ]
}

/// Replay one scenario on a fresh fixture.
pub fn run_scenario(scenario: &Scenario) -> anyhow::Result<()> {
    let mut fixture = AccountFixture::new();
    fixture.grant_key(SCENARIO_KEY);

    for (i, step) in scenario.steps.iter().enumerate() {
        let outcome = match &step.op {
            Op::CreateSession {
                by,
                destinations,
                native_allowance,
            } => {
                let request = SessionRequest::new(*native_allowance)
                    .destinations(destinations.iter().copied().map(destination));
                let caller = actor_address(&fixture, *by);
                let account = fixture.account;
                Outcome::of(&fixture.chain.create_session(&account, &caller, SCENARIO_KEY, &request))
            }
            Op::Execute {
                by,
                destination: to,
                value,
            } => {
                let call = Call::transfer(destination(*to), *value);
                let result = match by {
                    Actor::Admin => fixture.execute_as_root(call),
                    Actor::Holder => fixture.execute(SCENARIO_KEY, call),
                };
                Outcome::of(&result)
            }
        };

        ensure!(
            outcome == step.outcome,
            "step {} ({:?}): expected {:?}, got {:?}",
            i,
            step.op,
            step.outcome,
            outcome
        );

        match (step.allowance_after, fixture.session(SCENARIO_KEY)) {
            (None, _) => {}
            (Some(want), Some(session)) => ensure!(
                session.native_allowance() == want,
                "step {}: allowance {} expected {}",
                i,
                session.native_allowance(),
                want
            ),
            (Some(want), None) => bail!("step {}: expected allowance {} but no session", i, want),
        }
    }
    Ok(())
}

fn actor_address(fixture: &AccountFixture, actor: Actor) -> keyward_core::Address {
    match actor {
        Actor::Admin => fixture.admin,
        Actor::Holder => fixture.holder,
    }
}

/// Replay every scenario, stopping at the first failure.
pub fn verify_all_scenarios() -> anyhow::Result<()> {
    for scenario in all_scenarios() {
        run_scenario(&scenario).with_context(|| format!("scenario '{}'", scenario.name))?;
    }
    Ok(())
}
