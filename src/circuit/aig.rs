use std::ops::Not;

use super::CircuitError;

/// Edge into an AIG node. Node 0 is the constant false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AigLit {
    pub id: u32,
    pub neg: bool,
}

impl AigLit {
    pub const FALSE: AigLit = AigLit { id: 0, neg: false };
    pub const TRUE: AigLit = AigLit { id: 0, neg: true };

    pub fn new(id: u32, neg: bool) -> Self {
        Self { id, neg }
    }

    pub fn is_const(self) -> bool {
        self.id == 0
    }

    pub fn negate_if(self, flip: bool) -> Self {
        Self {
            id: self.id,
            neg: self.neg ^ flip,
        }
    }
}

impl Not for AigLit {
    type Output = AigLit;

    fn not(self) -> AigLit {
        self.negate_if(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndGate {
    pub id: u32,
    pub a: AigLit,
    pub b: AigLit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Const,
    Input,
    And(AigLit, AigLit),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aig {
    pub max_id: u32,
    pub inputs: Vec<u32>,
    pub outputs: Vec<AigLit>,
    pub ands: Vec<AndGate>,
}

impl Aig {
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_ands(&self) -> usize {
        self.ands.len()
    }

    pub fn input_ids(&self) -> &[u32] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[AigLit] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Result<AigLit, CircuitError> {
        self.outputs
            .get(index)
            .copied()
            .ok_or(CircuitError::OutputOutOfRange {
                index,
                outputs: self.outputs.len(),
            })
    }

    pub fn nodes(&self) -> Result<Vec<Option<Node>>, CircuitError> {
        let mut nodes = vec![None::<Node>; self.max_id as usize + 1];
        nodes[0] = Some(Node::Const);

        for &id in &self.inputs {
            self.check_id(id)?;
            if id == 0 || nodes[id as usize].is_some() {
                return Err(CircuitError::Redefined(id));
            }
            nodes[id as usize] = Some(Node::Input);
        }

        for gate in &self.ands {
            self.check_id(gate.id)?;
            if gate.id == 0 || nodes[gate.id as usize].is_some() {
                return Err(CircuitError::Redefined(gate.id));
            }
            for fanin in [gate.a, gate.b] {
                self.check_id(fanin.id)?;
                if nodes[fanin.id as usize].is_none() {
                    return Err(CircuitError::NotTopological {
                        gate: gate.id,
                        fanin: fanin.id,
                    });
                }
            }
            nodes[gate.id as usize] = Some(Node::And(gate.a, gate.b));
        }

        for &out in &self.outputs {
            self.check_id(out.id)?;
            if nodes[out.id as usize].is_none() {
                return Err(CircuitError::UndefinedNode(out.id));
            }
        }
        Ok(nodes)
    }

    pub fn fanout_counts(&self) -> Vec<u32> {
        let mut refs = vec![0u32; self.max_id as usize + 1];
        for gate in &self.ands {
            for fanin in [gate.a, gate.b] {
                if let Some(r) = refs.get_mut(fanin.id as usize) {
                    *r += 1;
                }
            }
        }
        for out in &self.outputs {
            if let Some(r) = refs.get_mut(out.id as usize) {
                *r += 1;
            }
        }
        refs
    }

    pub fn eval(&self, input_bits: &[bool]) -> Vec<bool> {
        let values = self.simulate(input_bits);
        self.outputs
            .iter()
            .map(|&lit| lit_value(lit, &values))
            .collect()
    }

    pub fn eval_lit(&self, lit: AigLit, input_bits: &[bool]) -> bool {
        let values = self.simulate(input_bits);
        lit_value(lit, &values)
    }

    pub fn simulate(&self, input_bits: &[bool]) -> Vec<bool> {
        assert_eq!(
            input_bits.len(),
            self.inputs.len(),
            "input_bits length must match number of inputs"
        );

        let mut values = vec![false; self.max_id as usize + 1];
        for (idx, &id) in self.inputs.iter().enumerate() {
            values[id as usize] = input_bits[idx];
        }
        for gate in &self.ands {
            let av = lit_value(gate.a, &values);
            let bv = lit_value(gate.b, &values);
            values[gate.id as usize] = av & bv;
        }
        values
    }

    /// Primary inputs in the transitive fanin of `root`, in input order.
    pub fn cone_inputs(&self, root: AigLit) -> Result<Vec<u32>, CircuitError> {
        let nodes = self.nodes()?;
        self.check_id(root.id)?;
        let mut in_cone = vec![false; nodes.len()];
        let mut stack = vec![root.id];
        while let Some(id) = stack.pop() {
            let pos = id as usize;
            if in_cone[pos] {
                continue;
            }
            in_cone[pos] = true;
            if let Some(Node::And(a, b)) = nodes[pos] {
                stack.push(a.id);
                stack.push(b.id);
            }
        }
        Ok(self
            .inputs
            .iter()
            .copied()
            .filter(|&id| in_cone[id as usize])
            .collect())
    }

    fn check_id(&self, id: u32) -> Result<(), CircuitError> {
        if id > self.max_id {
            return Err(CircuitError::NodeOutOfRange {
                id,
                max_id: self.max_id,
            });
        }
        Ok(())
    }
}

pub fn lit_value(lit: AigLit, values: &[bool]) -> bool {
    let base = if lit.id == 0 {
        false
    } else {
        values[lit.id as usize]
    };
    base ^ lit.neg
}

#[derive(Debug)]
pub struct AigBuilder {
    next_id: u32,
    inputs: Vec<u32>,
    ands: Vec<AndGate>,
}

impl Default for AigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AigBuilder {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            inputs: Vec::new(),
            ands: Vec::new(),
        }
    }

    pub fn input(&mut self) -> AigLit {
        let id = self.alloc_id();
        self.inputs.push(id);
        AigLit::new(id, false)
    }

    /// Builds an and node without folding constants or duplicates, so
    /// test circuits keep exactly the shape they were written with.
    pub fn and(&mut self, a: AigLit, b: AigLit) -> AigLit {
        let id = self.alloc_id();
        self.ands.push(AndGate { id, a, b });
        AigLit::new(id, false)
    }

    pub fn or(&mut self, a: AigLit, b: AigLit) -> AigLit {
        !self.and(!a, !b)
    }

    pub fn xor(&mut self, a: AigLit, b: AigLit) -> AigLit {
        let l = self.and(a, !b);
        let r = self.and(!a, b);
        self.or(l, r)
    }

    pub fn xnor(&mut self, a: AigLit, b: AigLit) -> AigLit {
        !self.xor(a, b)
    }

    /// Miter of two signals: true iff they differ.
    pub fn miter(&mut self, a: AigLit, b: AigLit) -> AigLit {
        self.xor(a, b)
    }

    pub fn finish(self, outputs: Vec<AigLit>) -> Aig {
        Aig {
            max_id: self.next_id.saturating_sub(1),
            inputs: self.inputs,
            outputs,
            ands: self.ands,
        }
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_counts_include_outputs() {
        let mut b = AigBuilder::new();
        let x = b.input();
        let y = b.input();
        let g = b.and(x, !y);
        let h = b.and(g, x);
        let aig = b.finish(vec![h, !g]);

        let refs = aig.fanout_counts();
        assert_eq!(refs[x.id as usize], 2);
        assert_eq!(refs[y.id as usize], 1);
        assert_eq!(refs[g.id as usize], 2);
        assert_eq!(refs[h.id as usize], 1);
    }

    #[test]
    fn nodes_rejects_forward_reference() {
        let aig = Aig {
            max_id: 3,
            inputs: vec![1],
            outputs: vec![AigLit::new(3, false)],
            ands: vec![
                AndGate {
                    id: 3,
                    a: AigLit::new(1, false),
                    b: AigLit::new(2, false),
                },
                AndGate {
                    id: 2,
                    a: AigLit::new(1, false),
                    b: AigLit::new(1, true),
                },
            ],
        };
        assert_eq!(
            aig.nodes(),
            Err(CircuitError::NotTopological { gate: 3, fanin: 2 })
        );
    }

    #[test]
    fn cone_inputs_skip_unrelated_logic() {
        let mut b = AigBuilder::new();
        let x = b.input();
        let y = b.input();
        let z = b.input();
        let g = b.and(x, z);
        let _unused = b.and(y, z);
        let aig = b.finish(vec![g]);
        assert_eq!(aig.cone_inputs(g), Ok(vec![x.id, z.id]));
    }
}
