//! Scripted contracts: callees that follow a fixed list of steps.
//!
//! Enough to model the callees that matter to an account: ones that re-enter
//! it, ones that fail, and ones that swallow a nested failure.

use bytes::Bytes;

use keyward_core::Call;

/// One step of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Dispatch `call` from the contract. With `catch`, a failure of the call
    /// is swallowed and the script goes on; otherwise it fails the contract.
    Call { call: Call, catch: bool },
    /// Fail with this reason.
    Revert(String),
    /// Stop and return this output.
    Return(Bytes),
}

/// A contract's behavior, run in order each time it is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// A script that does nothing and succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch `call`; its failure fails the contract.
    pub fn call(mut self, call: Call) -> Self {
        self.steps.push(Step::Call { call, catch: false });
        self
    }

    /// Dispatch `call`; its failure is swallowed.
    pub fn try_call(mut self, call: Call) -> Self {
        self.steps.push(Step::Call { call, catch: true });
        self
    }

    /// Fail.
    pub fn revert(mut self, reason: impl Into<String>) -> Self {
        self.steps.push(Step::Revert(reason.into()));
        self
    }

    /// Return `output`.
    pub fn returning(mut self, output: impl Into<Bytes>) -> Self {
        self.steps.push(Step::Return(output.into()));
        self
    }

    /// The steps, in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
