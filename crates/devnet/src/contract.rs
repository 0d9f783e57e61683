//! Hand-assembled runtime bytecode for the devnet calculator contract.
//!
//! The contract exposes the eight functions of the calculator interface. Arithmetic is
//! checked the way Solidity 0.8 checks it: overflow and underflow revert with
//! `Panic(0x11)`, a zero divisor with `Panic(0x12)`. `calculatePower` wraps.
//! `calculateSquareRoot` is the only writer: it stores its result in [`LAST_RESULT_SLOT`]
//! and bumps [`CALCULATIONS_SLOT`].

use crate::Error;
use abacus_core::abi::PANIC_SELECTOR;
use abacus_core::operation;
use std::collections::HashMap;

/// Storage slot holding the owner address.
pub const OWNER_SLOT: u8 = 0;
/// Storage slot holding the scientific calculator address.
pub const SCIENTIFIC_SLOT: u8 = 1;
/// Storage slot holding the last square root computed by a transaction.
pub const LAST_RESULT_SLOT: u8 = 2;
/// Storage slot counting square root transactions.
pub const CALCULATIONS_SLOT: u8 = 3;

/// The subset of EVM opcodes the calculator runtime uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    ADD = 0x01,
    MUL = 0x02,
    SUB = 0x03,
    DIV = 0x04,
    EXP = 0x0a,
    LT = 0x10,
    EQ = 0x14,
    ISZERO = 0x15,
    AND = 0x16,
    SHR = 0x1c,
    CALLDATALOAD = 0x35,
    CALLDATASIZE = 0x36,
    POP = 0x50,
    MSTORE = 0x52,
    SLOAD = 0x54,
    SSTORE = 0x55,
    JUMP = 0x56,
    JUMPI = 0x57,
    JUMPDEST = 0x5b,
    PUSH1 = 0x60,
    PUSH2 = 0x61,
    PUSH4 = 0x63,
    PUSH32 = 0x7f,
    DUP1 = 0x80,
    DUP2 = 0x81,
    DUP3 = 0x82,
    DUP4 = 0x83,
    SWAP1 = 0x90,
    RETURN = 0xf3,
    REVERT = 0xfd,
}

/// A single-pass assembler with named jump targets.
///
/// Every label reference is emitted as a `PUSH2` placeholder and patched in
/// [`Assembler::assemble`].
#[derive(Debug, Default)]
pub struct Assembler {
    code: Vec<u8>,
    labels: HashMap<&'static str, usize>,
    fixups: Vec<(usize, &'static str)>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(&mut self, op: Opcode) -> &mut Self {
        self.code.push(op as u8);
        self
    }

    pub fn ops(&mut self, ops: &[Opcode]) -> &mut Self {
        for op in ops {
            self.op(*op);
        }
        self
    }

    pub fn push1(&mut self, value: u8) -> &mut Self {
        self.op(Opcode::PUSH1);
        self.code.push(value);
        self
    }

    pub fn push4(&mut self, value: [u8; 4]) -> &mut Self {
        self.op(Opcode::PUSH4);
        self.code.extend_from_slice(&value);
        self
    }

    pub fn push32(&mut self, value: [u8; 32]) -> &mut Self {
        self.op(Opcode::PUSH32);
        self.code.extend_from_slice(&value);
        self
    }

    /// Pushes the offset of `label`, resolved at assembly time.
    pub fn push_label(&mut self, label: &'static str) -> &mut Self {
        self.op(Opcode::PUSH2);
        self.fixups.push((self.code.len(), label));
        self.code.extend_from_slice(&[0, 0]);
        self
    }

    pub fn jump(&mut self, label: &'static str) -> &mut Self {
        self.push_label(label).op(Opcode::JUMP)
    }

    pub fn jumpi(&mut self, label: &'static str) -> &mut Self {
        self.push_label(label).op(Opcode::JUMPI)
    }

    /// Marks a jump target at the current offset.
    pub fn label(&mut self, name: &'static str) -> Result<&mut Self, Error> {
        if self.labels.insert(name, self.code.len()).is_some() {
            return Err(Error::Assembly(format!("label `{name}` defined twice")));
        }
        Ok(self.op(Opcode::JUMPDEST))
    }

    /// Patches label references and returns the bytecode.
    pub fn assemble(mut self) -> Result<Vec<u8>, Error> {
        for (at, label) in &self.fixups {
            let offset = *self
                .labels
                .get(label)
                .ok_or_else(|| Error::Assembly(format!("undefined label `{label}`")))?;
            let offset = u16::try_from(offset)
                .map_err(|_| Error::Assembly(format!("label `{label}` out of PUSH2 range")))?;
            self.code[*at..*at + 2].copy_from_slice(&offset.to_be_bytes());
        }
        tracing::debug!(
            size = self.code.len(),
            labels = self.labels.len(),
            "assembled runtime"
        );
        Ok(self.code)
    }
}

fn panic_word() -> [u8; 32] {
    let mut word = [0u8; 32];
    word[..4].copy_from_slice(&PANIC_SELECTOR);
    word
}

/// Builds the calculator runtime.
pub fn calculator_runtime() -> Result<Vec<u8>, Error> {
    use Opcode::*;

    let mut asm = Assembler::new();

    // selector dispatch
    asm.push1(4).op(CALLDATASIZE).op(LT).jumpi("fail");
    asm.push1(0).op(CALLDATALOAD).push1(0xe0).op(SHR);
    for (function, target) in [
        (&operation::ADD, "add"),
        (&operation::SUBTRACT, "subtract"),
        (&operation::MULTIPLY, "multiply"),
        (&operation::DIVIDE, "divide"),
        (&operation::CALCULATE_POWER, "power"),
        (&operation::CALCULATE_SQUARE_ROOT, "sqrt"),
        (&operation::OWNER, "owner"),
        (&operation::SCIENTIFIC_CALCULATOR_ADDRESS, "scientific"),
    ] {
        asm.op(DUP1).push4(function.selector()).op(EQ).jumpi(target);
    }
    asm.jump("fail");

    // stack after loading: [a, b]
    let load_pair = |asm: &mut Assembler| {
        asm.op(POP)
            .push1(0x24)
            .op(CALLDATALOAD)
            .push1(0x04)
            .op(CALLDATALOAD);
    };

    asm.label("add")?;
    load_pair(&mut asm);
    asm.ops(&[DUP2, DUP2, ADD, DUP2, DUP2, LT]).jumpi("overflow");
    asm.jump("ret");

    asm.label("subtract")?;
    load_pair(&mut asm);
    asm.ops(&[DUP2, DUP2, LT]).jumpi("overflow");
    asm.op(SUB).jump("ret");

    asm.label("multiply")?;
    load_pair(&mut asm);
    asm.ops(&[DUP1, ISZERO]).jumpi("zero");
    asm.ops(&[DUP2, DUP2, MUL, DUP2, DUP2, DIV, DUP4, EQ, ISZERO])
        .jumpi("overflow");
    asm.jump("ret");

    asm.label("divide")?;
    load_pair(&mut asm);
    asm.ops(&[DUP2, ISZERO]).jumpi("div_zero");
    asm.op(DIV).jump("ret");

    asm.label("power")?;
    load_pair(&mut asm);
    asm.op(EXP).jump("ret");

    asm.label("owner")?;
    asm.op(POP).push1(OWNER_SLOT).op(SLOAD).jump("ret");

    asm.label("scientific")?;
    asm.op(POP).push1(SCIENTIFIC_SLOT).op(SLOAD).jump("ret");

    // Babylonian floor square root; stack in the loop is [y, x, n]
    asm.label("sqrt")?;
    asm.op(POP).push1(0x04).op(CALLDATALOAD);
    asm.ops(&[DUP1, ISZERO]).jumpi("record");
    asm.ops(&[DUP1, DUP1]).push1(1).op(AND);
    asm.op(DUP2).push1(1).ops(&[SHR, ADD]);
    asm.label("sqrt_loop")?;
    asm.ops(&[DUP2, DUP2, LT, ISZERO]).jumpi("sqrt_done");
    asm.ops(&[SWAP1, POP, DUP1, DUP3, DIV, DUP2, ADD])
        .push1(1)
        .op(SHR)
        .jump("sqrt_loop");
    asm.label("sqrt_done")?;
    asm.op(POP);

    asm.label("record")?;
    asm.op(DUP1).push1(LAST_RESULT_SLOT).op(SSTORE);
    asm.push1(CALCULATIONS_SLOT).op(SLOAD).push1(1).op(ADD);
    asm.push1(CALCULATIONS_SLOT).op(SSTORE);

    asm.label("ret")?;
    asm.push1(0).op(MSTORE).push1(0x20).push1(0).op(RETURN);

    asm.label("zero")?;
    asm.push1(0).jump("ret");

    asm.label("overflow")?;
    asm.push1(0x11).jump("panic");

    asm.label("div_zero")?;
    asm.push1(0x12).jump("panic");

    // [code] -> revert Panic(code)
    asm.label("panic")?;
    asm.push32(panic_word()).push1(0).op(MSTORE);
    asm.push1(4).op(MSTORE).push1(0x24).push1(0).op(REVERT);

    asm.label("fail")?;
    asm.push1(0).op(DUP1).op(REVERT);

    asm.assemble()
}
