use crate::model::{Taint, TaintEffect, Toleration, TolerationOperator};

/* ============================= MATCHING ============================= */

/// Returns true if a pod carrying `tolerations` may run on a node with `taints`.
///
/// Every taint must be covered by at least one toleration. An untainted node
/// admits every pod.
pub fn matches(taints: &[Taint], tolerations: &[Toleration]) -> bool {
    if taints.is_empty() {
        return true;
    }
    if tolerations.is_empty() {
        return false;
    }

    taints
        .iter()
        .all(|taint| tolerations.iter().any(|tol| tolerates(tol, taint)))
}

/// Returns true if a single toleration covers a single taint.
pub fn tolerates(toleration: &Toleration, taint: &Taint) -> bool {
    if !toleration.key.is_empty() && toleration.key != taint.key {
        return false;
    }

    let value_ok = match &toleration.operator {
        TolerationOperator::Exists => true,
        TolerationOperator::Equal => toleration.value == taint.value,
        TolerationOperator::Other(_) => false,
    };
    if !value_ok {
        return false;
    }

    match &toleration.effect {
        None => true,
        Some(effect) => effects_equal(effect, &taint.effect),
    }
}

fn effects_equal(a: &TaintEffect, b: &TaintEffect) -> bool {
    match (a, b) {
        (TaintEffect::Other(_), _) | (_, TaintEffect::Other(_)) => false,
        _ => a == b,
    }
}

/* ============================= TESTS ============================= */
