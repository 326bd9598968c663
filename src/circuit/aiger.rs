use std::fmt::Write as _;
use std::io::BufRead;

use anyhow::{Context, Result, bail};

use super::aig::{Aig, AigLit, AndGate};

pub fn parse_aag_str(s: &str) -> Result<Aig> {
    parse_aag_reader(std::io::Cursor::new(s.as_bytes()))
}

/// Reads a combinational ASCII AIGER file. Symbol tables and comments
/// after the and section are ignored.
pub fn parse_aag_reader<R: BufRead>(r: R) -> Result<Aig> {
    let lines = r
        .lines()
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read aag input")?;

    let Some(header_line) = lines.first() else {
        bail!("empty input");
    };
    let header = header_line.split_whitespace().collect::<Vec<_>>();
    if header.len() != 6 || header[0] != "aag" {
        bail!("invalid header, expected: aag M I L O A");
    }

    let max_id = parse_u32_token(header[1], "M")?;
    let num_inputs = parse_u32_token(header[2], "I")? as usize;
    let num_latches = parse_u32_token(header[3], "L")?;
    let num_outputs = parse_u32_token(header[4], "O")? as usize;
    let num_ands = parse_u32_token(header[5], "A")? as usize;

    if num_latches != 0 {
        bail!("only combinational aag is supported (L must be 0)");
    }
    // every id up to M is an input or an and gate
    let defined = num_inputs as u64 + num_ands as u64;
    if u64::from(max_id) > defined {
        bail!("header M={} exceeds I + L + A = {}", max_id, defined);
    }

    let needed = 1 + num_inputs + num_outputs + num_ands;
    if lines.len() < needed {
        bail!(
            "truncated aag: expected at least {} lines, found {}",
            needed,
            lines.len()
        );
    }

    let mut body = lines.iter().enumerate().skip(1);
    let mut next_line = || {
        body.next()
            .map(|(idx, text)| (idx + 1, text.as_str()))
            .ok_or_else(|| anyhow::anyhow!("unexpected end of aag input"))
    };

    let mut inputs = Vec::with_capacity(num_inputs);
    for _ in 0..num_inputs {
        let (line_no, text) = next_line()?;
        let lit = parse_single_lit(text, line_no, "input")?;
        if lit == 0 || lit % 2 == 1 {
            bail!("invalid input literal on line {}: must be even and nonzero", line_no);
        }
        inputs.push(lit / 2);
    }

    let mut outputs = Vec::with_capacity(num_outputs);
    for _ in 0..num_outputs {
        let (line_no, text) = next_line()?;
        outputs.push(decode_lit(parse_single_lit(text, line_no, "output")?));
    }

    let mut ands = Vec::with_capacity(num_ands);
    for _ in 0..num_ands {
        let (line_no, text) = next_line()?;
        let parts = text.split_whitespace().collect::<Vec<_>>();
        if parts.len() != 3 {
            bail!("invalid and line {}: expected three literals", line_no);
        }
        let lhs = parse_u32_token(parts[0], "and lhs")?;
        if lhs == 0 || lhs % 2 == 1 {
            bail!("invalid and lhs on line {}: must be even and nonzero", line_no);
        }
        let id = lhs / 2;
        let a = decode_lit(parse_u32_token(parts[1], "and rhs0")?);
        let b = decode_lit(parse_u32_token(parts[2], "and rhs1")?);
        if id <= a.id || id <= b.id {
            bail!(
                "and gate on line {} violates topo order: id {} depends on {} and {}",
                line_no,
                id,
                a.id,
                b.id
            );
        }
        ands.push(AndGate { id, a, b });
    }

    let aig = Aig {
        max_id,
        inputs,
        outputs,
        ands,
    };
    aig.nodes().context("aag structure check failed")?;
    Ok(aig)
}

pub fn write_aag(aig: &Aig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "aag {} {} 0 {} {}",
        aig.max_id,
        aig.inputs.len(),
        aig.outputs.len(),
        aig.ands.len()
    );
    for &id in &aig.inputs {
        let _ = writeln!(out, "{}", 2 * id);
    }
    for &lit in &aig.outputs {
        let _ = writeln!(out, "{}", encode_lit(lit));
    }
    for gate in &aig.ands {
        let _ = writeln!(
            out,
            "{} {} {}",
            2 * gate.id,
            encode_lit(gate.a),
            encode_lit(gate.b)
        );
    }
    out
}

fn parse_single_lit(line: &str, line_no: usize, kind: &str) -> Result<u32> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() != 1 {
        bail!(
            "invalid {} line {}: expected one literal, got {} fields",
            kind,
            line_no,
            parts.len()
        );
    }
    parse_u32_token(parts[0], kind)
}

fn parse_u32_token(token: &str, what: &str) -> Result<u32> {
    token
        .parse::<u32>()
        .with_context(|| format!("invalid {} value: {}", what, token))
}

fn decode_lit(lit: u32) -> AigLit {
    AigLit::new(lit / 2, lit % 2 == 1)
}

fn encode_lit(lit: AigLit) -> u32 {
    2 * lit.id + lit.neg as u32
}
