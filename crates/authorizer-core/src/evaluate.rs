//! Condition evaluation.
//!
//! Conditions are positionally aligned with the packed arguments of a call:
//! condition `i` constrains argument `i`, and every condition must hold. An
//! empty condition list always passes. A condition with no argument to
//! check is an arity mismatch, which fails closed.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::types::Word;

/// How the number of arguments must relate to the number of conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArityPolicy {
    /// Conditions constrain the leading arguments. Extra trailing
    /// arguments are unconstrained; missing arguments fail.
    #[default]
    Prefix,
    /// Argument and condition counts must be equal.
    Exact,
}

/// The outcome of evaluating a condition list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Every condition held.
    Pass,
    /// The condition at `position` did not hold.
    Failed { position: usize },
    /// The argument count is incompatible with the condition count.
    ArityMismatch { expected: usize, actual: usize },
}

impl Evaluation {
    /// Whether the evaluation allows the call.
    pub fn is_pass(&self) -> bool {
        matches!(self, Evaluation::Pass)
    }
}

/// Evaluate with the default [`ArityPolicy`].
pub fn evaluate(conditions: &[Condition], args: &[Word]) -> bool {
    evaluate_with(ArityPolicy::default(), conditions, args).is_pass()
}

/// Evaluate conditions against packed arguments.
pub fn evaluate_with(policy: ArityPolicy, conditions: &[Condition], args: &[Word]) -> Evaluation {
    if conditions.is_empty() {
        return Evaluation::Pass;
    }

    let arity_ok = match policy {
        ArityPolicy::Prefix => args.len() >= conditions.len(),
        ArityPolicy::Exact => args.len() == conditions.len(),
    };
    if !arity_ok {
        return Evaluation::ArityMismatch {
            expected: conditions.len(),
            actual: args.len(),
        };
    }

    conditions
        .iter()
        .zip(args)
        .position(|(condition, arg)| !condition.matches(arg))
        .map_or(Evaluation::Pass, |position| Evaluation::Failed { position })
}
