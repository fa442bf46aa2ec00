// belay-loader - Unit loading for the belay host runtime
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode instruction definitions and their byte encoding.

/// Bytecode instructions carried by a unit.
///
/// Instructions operate on a value stack. Jump offsets are relative to the
/// instruction following the jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    // =========================================================================
    // Constants & Stack
    // =========================================================================
    /// Push constant from constant pool onto stack.
    Const(u16),

    /// Pop top value from stack.
    Pop,

    /// Duplicate top value on stack.
    Dup,

    /// Push nil.
    Nil,

    /// Push true.
    True,

    /// Push false.
    False,

    // =========================================================================
    // Variables
    // =========================================================================
    /// Load local: push stack[n].
    LoadLocal(u16),

    /// Store local: stack[n] = pop().
    StoreLocal(u16),

    /// Load global variable: look up the symbol in constants[n].
    LoadGlobal(u16),

    /// Define global variable: intern the symbol in constants[n] with pop().
    DefGlobal(u16),

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Unconditional relative jump.
    Jump(i16),

    /// Jump if top of stack is falsy (nil or false). Does not pop.
    JumpIfFalse(i16),

    /// Pop and jump if falsy.
    PopJumpIfFalse(i16),

    /// Call function with n arguments. Function is at stack[sp - n - 1].
    Call(u8),

    /// Tail call: reuse current frame. Function is at stack[sp - n - 1].
    TailCall(u8),

    /// Return from function: pop return value.
    Return,

    // =========================================================================
    // Built-in Operations
    // =========================================================================
    /// Addition: push a + b where b = pop(), a = pop().
    Add,

    /// Subtraction: push a - b where b = pop(), a = pop().
    Sub,

    /// Multiplication: push a * b where b = pop(), a = pop().
    Mul,

    /// Division: push a / b where b = pop(), a = pop().
    Div,

    /// Equality: push pop() == pop().
    Eq,

    /// Less than: push a < b where b = pop(), a = pop().
    Lt,

    /// Greater than: push a > b where b = pop(), a = pop().
    Gt,

    /// Negate: push (not pop()).
    Not,
}

// Byte tags. Operands follow big-endian.
const TAG_CONST: u8 = 0x01;
const TAG_POP: u8 = 0x02;
const TAG_DUP: u8 = 0x03;
const TAG_NIL: u8 = 0x04;
const TAG_TRUE: u8 = 0x05;
const TAG_FALSE: u8 = 0x06;
const TAG_LOAD_LOCAL: u8 = 0x10;
const TAG_STORE_LOCAL: u8 = 0x11;
const TAG_LOAD_GLOBAL: u8 = 0x12;
const TAG_DEF_GLOBAL: u8 = 0x13;
const TAG_JUMP: u8 = 0x20;
const TAG_JUMP_IF_FALSE: u8 = 0x21;
const TAG_POP_JUMP_IF_FALSE: u8 = 0x22;
const TAG_CALL: u8 = 0x23;
const TAG_TAIL_CALL: u8 = 0x24;
const TAG_RETURN: u8 = 0x25;
const TAG_ADD: u8 = 0x30;
const TAG_SUB: u8 = 0x31;
const TAG_MUL: u8 = 0x32;
const TAG_DIV: u8 = 0x33;
const TAG_EQ: u8 = 0x34;
const TAG_LT: u8 = 0x35;
const TAG_GT: u8 = 0x36;
const TAG_NOT: u8 = 0x37;

/// Width of an instruction's operand in bytes, by tag.
pub(crate) fn operand_width(tag: u8) -> Option<usize> {
    Some(match tag {
        TAG_CONST | TAG_LOAD_LOCAL | TAG_STORE_LOCAL | TAG_LOAD_GLOBAL | TAG_DEF_GLOBAL => 2,
        TAG_JUMP | TAG_JUMP_IF_FALSE | TAG_POP_JUMP_IF_FALSE => 2,
        TAG_CALL | TAG_TAIL_CALL => 1,
        TAG_POP | TAG_DUP | TAG_NIL | TAG_TRUE | TAG_FALSE | TAG_RETURN | TAG_ADD | TAG_SUB
        | TAG_MUL | TAG_DIV | TAG_EQ | TAG_LT | TAG_GT | TAG_NOT => 0,
        _ => return None,
    })
}

impl OpCode {
    /// Decode an instruction from its tag and operand bytes.
    ///
    /// `operand` must be exactly [`operand_width`] bytes long.
    pub(crate) fn from_bytes(tag: u8, operand: &[u8]) -> Option<OpCode> {
        let u16_operand = || Some(u16::from_be_bytes(operand.try_into().ok()?));
        let i16_operand = || Some(i16::from_be_bytes(operand.try_into().ok()?));
        let u8_operand = || operand.first().copied();
        Some(match tag {
            TAG_CONST => OpCode::Const(u16_operand()?),
            TAG_POP => OpCode::Pop,
            TAG_DUP => OpCode::Dup,
            TAG_NIL => OpCode::Nil,
            TAG_TRUE => OpCode::True,
            TAG_FALSE => OpCode::False,
            TAG_LOAD_LOCAL => OpCode::LoadLocal(u16_operand()?),
            TAG_STORE_LOCAL => OpCode::StoreLocal(u16_operand()?),
            TAG_LOAD_GLOBAL => OpCode::LoadGlobal(u16_operand()?),
            TAG_DEF_GLOBAL => OpCode::DefGlobal(u16_operand()?),
            TAG_JUMP => OpCode::Jump(i16_operand()?),
            TAG_JUMP_IF_FALSE => OpCode::JumpIfFalse(i16_operand()?),
            TAG_POP_JUMP_IF_FALSE => OpCode::PopJumpIfFalse(i16_operand()?),
            TAG_CALL => OpCode::Call(u8_operand()?),
            TAG_TAIL_CALL => OpCode::TailCall(u8_operand()?),
            TAG_RETURN => OpCode::Return,
            TAG_ADD => OpCode::Add,
            TAG_SUB => OpCode::Sub,
            TAG_MUL => OpCode::Mul,
            TAG_DIV => OpCode::Div,
            TAG_EQ => OpCode::Eq,
            TAG_LT => OpCode::Lt,
            TAG_GT => OpCode::Gt,
            TAG_NOT => OpCode::Not,
            _ => return None,
        })
    }

    /// Append the byte encoding of this instruction to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            OpCode::Const(n) => encode_u16(out, TAG_CONST, n),
            OpCode::LoadLocal(n) => encode_u16(out, TAG_LOAD_LOCAL, n),
            OpCode::StoreLocal(n) => encode_u16(out, TAG_STORE_LOCAL, n),
            OpCode::LoadGlobal(n) => encode_u16(out, TAG_LOAD_GLOBAL, n),
            OpCode::DefGlobal(n) => encode_u16(out, TAG_DEF_GLOBAL, n),
            OpCode::Jump(off) => encode_i16(out, TAG_JUMP, off),
            OpCode::JumpIfFalse(off) => encode_i16(out, TAG_JUMP_IF_FALSE, off),
            OpCode::PopJumpIfFalse(off) => encode_i16(out, TAG_POP_JUMP_IF_FALSE, off),
            OpCode::Call(n) => out.extend([TAG_CALL, n]),
            OpCode::TailCall(n) => out.extend([TAG_TAIL_CALL, n]),
            OpCode::Pop => out.push(TAG_POP),
            OpCode::Dup => out.push(TAG_DUP),
            OpCode::Nil => out.push(TAG_NIL),
            OpCode::True => out.push(TAG_TRUE),
            OpCode::False => out.push(TAG_FALSE),
            OpCode::Return => out.push(TAG_RETURN),
            OpCode::Add => out.push(TAG_ADD),
            OpCode::Sub => out.push(TAG_SUB),
            OpCode::Mul => out.push(TAG_MUL),
            OpCode::Div => out.push(TAG_DIV),
            OpCode::Eq => out.push(TAG_EQ),
            OpCode::Lt => out.push(TAG_LT),
            OpCode::Gt => out.push(TAG_GT),
            OpCode::Not => out.push(TAG_NOT),
        }
    }

    /// True if control never continues to the next instruction.
    #[inline]
    pub fn is_terminator(&self) -> bool {
        matches!(self, OpCode::Jump(_) | OpCode::TailCall(_) | OpCode::Return)
    }

    /// The relative offset of a jump instruction.
    #[inline]
    pub fn jump_offset(&self) -> Option<i16> {
        match *self {
            OpCode::Jump(off) | OpCode::JumpIfFalse(off) | OpCode::PopJumpIfFalse(off) => Some(off),
            _ => None,
        }
    }

    /// Returns `(pops, pushes)` for this instruction.
    ///
    /// A call pops the function and its arguments and pushes the result.
    #[inline]
    pub fn stack_effect(&self) -> (usize, usize) {
        match *self {
            OpCode::Const(_)
            | OpCode::Nil
            | OpCode::True
            | OpCode::False
            | OpCode::LoadLocal(_)
            | OpCode::LoadGlobal(_) => (0, 1),

            OpCode::Dup => (1, 2),

            OpCode::Pop
            | OpCode::StoreLocal(_)
            | OpCode::DefGlobal(_)
            | OpCode::PopJumpIfFalse(_)
            | OpCode::Return => (1, 0),

            OpCode::Not | OpCode::JumpIfFalse(_) => (1, 1),

            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Eq
            | OpCode::Lt
            | OpCode::Gt => (2, 1),

            OpCode::Call(n) => (usize::from(n) + 1, 1),
            OpCode::TailCall(n) => (usize::from(n) + 1, 0),

            OpCode::Jump(_) => (0, 0),
        }
    }
}

fn encode_u16(out: &mut Vec<u8>, tag: u8, n: u16) {
    out.push(tag);
    out.extend(n.to_be_bytes());
}

fn encode_i16(out: &mut Vec<u8>, tag: u8, n: i16) {
    out.push(tag);
    out.extend(n.to_be_bytes());
}
