use std::fmt::Debug;

use crate::error::{PipelineError, Result};

use super::Stage;

/// Orders `stages` so every stage runs after the stages producing its inputs.
pub fn stage_order(stages: &[Stage]) -> Result<Vec<Stage>> {
    topological_order(stages, |stage, other| {
        stage.requires().contains(&other.output())
    })
}

/// Kahn's algorithm over `nodes`, where `depends_on(a, b)` means `a` must
/// follow `b`. Among ready nodes the earliest in input order goes first, so
/// the input order is kept whenever dependencies allow.
pub fn topological_order<N, F>(nodes: &[N], depends_on: F) -> Result<Vec<N>>
where
    N: Copy + Debug,
    F: Fn(&N, &N) -> bool,
{
    let n = nodes.len();
    let mut in_degree = vec![0usize; n];
    // forward[j] lists the nodes that depend on node j
    let mut forward: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, node) in nodes.iter().enumerate() {
        for (j, other) in nodes.iter().enumerate() {
            if i != j && depends_on(node, other) {
                forward[j].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut emitted = vec![false; n];
    let mut result = Vec::with_capacity(n);

    while let Some(next) = (0..n).find(|&i| !emitted[i] && in_degree[i] == 0) {
        emitted[next] = true;
        result.push(nodes[next]);
        for &dependent in &forward[next] {
            in_degree[dependent] -= 1;
        }
    }

    if result.len() != n {
        let stuck: Vec<String> = (0..n)
            .filter(|&i| !emitted[i])
            .map(|i| format!("{:?}", nodes[i]))
            .collect();
        return Err(PipelineError::Plan(format!(
            "circular dependency detected involving: {}",
            stuck.join(", ")
        )));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_order_is_kept() {
        assert_eq!(stage_order(&Stage::ALL).unwrap(), Stage::ALL.to_vec());
    }

    #[test]
    fn test_reversed_input_is_reordered() {
        let mut reversed = Stage::ALL.to_vec();
        reversed.reverse();
        let order = stage_order(&reversed).unwrap();

        let pos = |s: Stage| order.iter().position(|o| *o == s).unwrap();
        assert!(pos(Stage::SupplierMetrics) < pos(Stage::SupplierPivot));
        assert!(pos(Stage::SupplierMetrics) < pos(Stage::UnionMetrics));
        assert!(pos(Stage::CustomerSupplierMetrics) < pos(Stage::UnionMetrics));
    }

    #[test]
    fn test_cycle_detected() {
        let err = topological_order(&[1, 2, 3], |a, b| (*a, *b) == (1, 2) || (*a, *b) == (2, 1))
            .unwrap_err();
        assert!(err.to_string().contains("circular dependency"));
        assert!(err.to_string().contains('1'));
    }
}
