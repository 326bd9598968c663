use std::collections::VecDeque;

use indexmap::IndexMap;
use log::debug;

use super::implication::ImplicationTable;
use super::lit::{Lit, Var};
use super::targets;
use super::vars::VarStore;
use crate::circuit::aig::{Aig, AigLit, Node};
use crate::circuit::CircuitError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roots {
    /// The conjunction of targets folded to a constant; no search needed.
    Const(bool),
    /// Distinct literals that must all be made true.
    Lits(Vec<Lit>),
}

#[derive(Debug, Clone)]
pub struct Encoding {
    pub roots: Roots,
    pub const_var: Option<Var>,
    /// Primary inputs and depth-boundary nodes, by node id, in allocation order.
    pub leaves: IndexMap<u32, Var>,
    pub expanded: usize,
}

/// Allocates one variable per node in the union of the cones of `outputs`,
/// fanins before the gates that use them, and fills the fanin shortcuts and
/// implication table for every expanded and node.
///
/// An and node is expanded when its shortest distance from the nearest
/// target is below `depth`; deeper and nodes become free boundary leaves.
pub fn encode(
    aig: &Aig,
    outputs: &[AigLit],
    depth: Option<u32>,
    vars: &mut VarStore,
    implications: &mut ImplicationTable,
) -> Result<Encoding, CircuitError> {
    let nodes = aig.nodes()?;
    for output in outputs {
        if output.id as usize >= nodes.len() {
            return Err(CircuitError::NodeOutOfRange {
                id: output.id,
                max_id: aig.max_id,
            });
        }
        if nodes[output.id as usize].is_none() {
            return Err(CircuitError::UndefinedNode(output.id));
        }
    }

    let mut wanted = Vec::with_capacity(outputs.len());
    for &output in outputs {
        if output == AigLit::FALSE || wanted.contains(&!output) {
            return Ok(constant(false));
        }
        if !output.is_const() && !wanted.contains(&output) {
            wanted.push(output);
        }
    }
    if wanted.is_empty() {
        return Ok(constant(true));
    }

    let root_ids = wanted.iter().map(|t| t.id).collect::<Vec<_>>();
    let expand = expanded_nodes(&nodes, &root_ids, depth);
    let refs = aig.fanout_counts();
    let mut var_of = vec![None::<Var>; nodes.len()];
    let mut leaves = IndexMap::new();
    let mut const_var = None;
    let mut expanded = 0;

    // (node, fanins already allocated)
    let mut stack = root_ids.iter().rev().map(|&id| (id, false)).collect::<Vec<_>>();
    while let Some((id, ready)) = stack.pop() {
        let pos = id as usize;
        if var_of[pos].is_some() {
            continue;
        }
        match nodes[pos] {
            Some(Node::And(a, b)) if expand[pos] => {
                if !ready {
                    stack.push((id, true));
                    stack.push((b.id, false));
                    stack.push((a.id, false));
                    continue;
                }
                let (Some(va), Some(vb)) = (var_of[a.id as usize], var_of[b.id as usize]) else {
                    unreachable!("fanins of node {id} are allocated first");
                };
                let x = vars.add_var(id, refs[pos]);
                let f0 = Lit::new(va, a.neg);
                let f1 = Lit::new(vb, b.neg);
                vars.set_fanins(x, f0, f1);
                var_of[pos] = Some(x);
                expanded += 1;
            }
            Some(Node::Const) => {
                let v = vars.add_var(id, refs[pos]);
                var_of[pos] = Some(v);
                const_var = Some(v);
            }
            Some(_) => {
                let v = vars.add_var(id, refs[pos]);
                var_of[pos] = Some(v);
                leaves.insert(id, v);
            }
            None => return Err(CircuitError::UndefinedNode(id)),
        }
    }

    implications.reserve_vars(vars.len());
    for index in 0..vars.len() {
        let x = Var::new(index as u32);
        if let Some((f0, f1)) = vars.fanins(x) {
            add_and_implications(implications, x.lit(true), f0, f1);
        }
    }

    let mut roots = Vec::with_capacity(wanted.len());
    for target in &wanted {
        let Some(var) = var_of[target.id as usize] else {
            unreachable!("target node {} is always allocated", target.id);
        };
        roots.push(Lit::new(var, target.neg));
    }
    debug!(
        target: targets::ENCODE,
        "encoded {} targets: {} vars, {} expanded ands, {} leaves, {} implications",
        roots.len(),
        vars.len(),
        expanded,
        leaves.len(),
        implications.entries()
    );
    Ok(Encoding {
        roots: Roots::Lits(roots),
        const_var,
        leaves,
        expanded,
    })
}

fn constant(value: bool) -> Encoding {
    Encoding {
        roots: Roots::Const(value),
        const_var: None,
        leaves: IndexMap::new(),
        expanded: 0,
    }
}

/// The part of `x <-> f0 & f1` not covered by the fanin shortcuts.
fn add_and_implications(table: &mut ImplicationTable, x: Lit, f0: Lit, f1: Lit) {
    table.add(!f0, !x, !x);
    table.add(!f1, !x, !x);
    table.add(!x, !f0, !f1);
    table.add(f0, x, !f1);
    table.add(f1, x, !f0);
}

fn expanded_nodes(nodes: &[Option<Node>], roots: &[u32], depth: Option<u32>) -> Vec<bool> {
    let mut dist = vec![None::<u32>; nodes.len()];
    let mut expand = vec![false; nodes.len()];
    let mut queue = VecDeque::new();
    for &root in roots {
        if dist[root as usize].is_none() {
            dist[root as usize] = Some(0);
            queue.push_back(root);
        }
    }
    while let Some(id) = queue.pop_front() {
        let pos = id as usize;
        let d = dist[pos].unwrap_or(0);
        let Some(Node::And(a, b)) = nodes[pos] else {
            continue;
        };
        if depth.is_some_and(|limit| d >= limit) {
            continue;
        }
        expand[pos] = true;
        for fanin in [a.id, b.id] {
            if dist[fanin as usize].is_none() {
                dist[fanin as usize] = Some(d + 1);
                queue.push_back(fanin);
            }
        }
    }
    expand
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::aig::AigBuilder;

    fn run(aig: &Aig, out: AigLit, depth: Option<u32>) -> (Encoding, VarStore, ImplicationTable) {
        let mut vars = VarStore::new();
        let mut imps = ImplicationTable::new();
        let enc = encode(aig, &[out], depth, &mut vars, &mut imps).expect("encode");
        (enc, vars, imps)
    }

    #[test]
    fn shared_nodes_get_one_variable_fanins_first() {
        let mut b = AigBuilder::new();
        let x = b.input();
        let y = b.input();
        let g = b.and(x, y);
        let h = b.and(g, !x);
        let aig = b.finish(vec![h]);

        let (enc, vars, imps) = run(&aig, h, None);
        assert_eq!(vars.len(), 4);
        let order = (0..4).map(|i| vars.node(Var::new(i))).collect::<Vec<_>>();
        assert_eq!(order, vec![x.id, y.id, g.id, h.id]);
        assert_eq!(enc.leaves.keys().copied().collect::<Vec<_>>(), vec![x.id, y.id]);
        assert_eq!(enc.expanded, 2);
        assert_eq!(imps.entries(), 10);
        assert_eq!(enc.roots, Roots::Lits(vec![Var::new(3).lit(true)]));
        assert_eq!(
            vars.fanins(Var::new(3)),
            Some((Var::new(2).lit(true), Var::new(0).lit(false)))
        );
    }

    #[test]
    fn encoding_twice_gives_same_numbering() {
        let mut b = AigBuilder::new();
        let ins = (0..4).map(|_| b.input()).collect::<Vec<_>>();
        let p = b.xor(ins[0], ins[1]);
        let q = b.xor(ins[2], ins[3]);
        let r = b.and(p, !q);
        let aig = b.finish(vec![r]);

        let mut vars = VarStore::new();
        let mut imps = ImplicationTable::new();
        encode(&aig, &[r], None, &mut vars, &mut imps).expect("first");
        let first = (0..vars.len())
            .map(|i| (vars.node(Var::new(i as u32)), vars.fanins(Var::new(i as u32))))
            .collect::<Vec<_>>();
        vars.reset();
        imps.reset();
        encode(&aig, &[r], None, &mut vars, &mut imps).expect("second");
        let second = (0..vars.len())
            .map(|i| (vars.node(Var::new(i as u32)), vars.fanins(Var::new(i as u32))))
            .collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn depth_bound_turns_deep_ands_into_leaves() {
        let mut b = AigBuilder::new();
        let x = b.input();
        let y = b.input();
        let g1 = b.and(x, y);
        let g2 = b.and(g1, y);
        let g3 = b.and(g2, x);
        let aig = b.finish(vec![g3]);

        let (enc, vars, _) = run(&aig, g3, Some(1));
        // only g3 is expanded; g2 is a boundary leaf, x is reached at distance 1
        assert_eq!(enc.expanded, 1);
        assert_eq!(vars.len(), 3);
        assert!(enc.leaves.contains_key(&g2.id));
        assert!(enc.leaves.contains_key(&x.id));
        assert!(!enc.leaves.contains_key(&g1.id));

        let (enc, _, _) = run(&aig, g3, Some(0));
        assert_eq!(enc.expanded, 0);
        assert_eq!(enc.leaves.len(), 1);
    }

    #[test]
    fn constant_fanin_gets_its_own_variable() {
        let mut b = AigBuilder::new();
        let x = b.input();
        let g = b.and(x, AigLit::TRUE);
        let aig = b.finish(vec![g]);
        let (enc, vars, _) = run(&aig, g, None);
        let c = enc.const_var.expect("const var");
        assert_eq!(vars.node(c), 0);
        assert!(!enc.leaves.contains_key(&0));
    }

    #[test]
    fn constant_and_bad_outputs() {
        let mut b = AigBuilder::new();
        let _ = b.input();
        let aig = b.finish(vec![]);
        let (enc, vars, _) = run(&aig, AigLit::TRUE, None);
        assert_eq!(enc.roots, Roots::Const(true));
        assert!(vars.is_empty());

        let mut vars = VarStore::new();
        let mut imps = ImplicationTable::new();
        let err = encode(&aig, &[AigLit::new(9, false)], None, &mut vars, &mut imps);
        assert_eq!(err.map(|e| e.roots), Err(CircuitError::NodeOutOfRange { id: 9, max_id: 1 }));
    }

    #[test]
    fn several_targets_share_one_numbering() {
        let mut b = AigBuilder::new();
        let x = b.input();
        let y = b.input();
        let z = b.input();
        let g = b.and(x, y);
        let h = b.and(y, z);
        let aig = b.finish(vec![g, h]);

        let mut vars = VarStore::new();
        let mut imps = ImplicationTable::new();
        let enc = encode(&aig, &[g, !h, AigLit::TRUE, g], None, &mut vars, &mut imps)
            .expect("encode");
        // x y g, then z h; y is shared
        assert_eq!(vars.len(), 5);
        assert_eq!(enc.expanded, 2);
        assert_eq!(
            enc.leaves.keys().copied().collect::<Vec<_>>(),
            vec![x.id, y.id, z.id]
        );
        assert_eq!(
            enc.roots,
            Roots::Lits(vec![Var::new(2).lit(true), Var::new(4).lit(false)])
        );
    }

    #[test]
    fn constant_folding_of_target_sets() {
        let mut b = AigBuilder::new();
        let x = b.input();
        let g = b.and(x, x);
        let aig = b.finish(vec![g]);

        let (enc, vars, _) = run(&aig, AigLit::FALSE, None);
        assert_eq!(enc.roots, Roots::Const(false));
        assert!(vars.is_empty());

        let fold = |set: &[AigLit]| {
            let mut vars = VarStore::new();
            let mut imps = ImplicationTable::new();
            encode(&aig, set, None, &mut vars, &mut imps).expect("encode").roots
        };
        assert_eq!(fold(&[g, AigLit::FALSE]), Roots::Const(false));
        assert_eq!(fold(&[g, x, !g]), Roots::Const(false));
        assert_eq!(fold(&[AigLit::TRUE, AigLit::TRUE]), Roots::Const(true));
        assert_eq!(fold(&[]), Roots::Const(true));
        assert!(matches!(fold(&[AigLit::TRUE, x]), Roots::Lits(r) if r.len() == 1));
    }
}
