// belay-loader - Unit loading for the belay host runtime
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Units: named bytecode chunks decoded from raw bytes.
//!
//! Byte layout (all integers big-endian):
//!
//! ```text
//! "BLY" version:u8
//! name_len:u16 name:utf8
//! const_count:u16 { tag:u8 payload }*
//! op_count:u32 { opcode:u8 operand }*
//! ```
//!
//! Constant tags: 0 nil, 1 false, 2 true, 3 int (i64), 4 float (f64 bits),
//! 5 string (u32 length + utf8), 6 symbol and 7 keyword (u16 length + utf8).

use std::cell::Cell;
use std::fmt;

use belay_reader::{Keyword, Symbol, Value};

use crate::error::{DefineError, LinkError};
use crate::opcode::{OpCode, operand_width};

pub const MAGIC: &[u8; 3] = b"BLY";
pub const FORMAT_VERSION: u8 = 1;

const CONST_NIL: u8 = 0;
const CONST_FALSE: u8 = 1;
const CONST_TRUE: u8 = 2;
const CONST_INT: u8 = 3;
const CONST_FLOAT: u8 = 4;
const CONST_STRING: u8 = 5;
const CONST_SYMBOL: u8 = 6;
const CONST_KEYWORD: u8 = 7;

/// Containing-package name of a dotted unit name.
///
/// The text before the last `.`; `None` when there is no separator or the
/// only separator is the leading character.
///
/// ```
/// use belay_loader::package_of;
///
/// assert_eq!(package_of("p.q.R"), Some("p.q"));
/// assert_eq!(package_of("R"), None);
/// assert_eq!(package_of(".R"), None);
/// ```
pub fn package_of(name: &str) -> Option<&str> {
    match name.rfind('.') {
        None | Some(0) => None,
        Some(i) => Some(&name[..i]),
    }
}

/// A defined unit: name, constant pool and instructions.
pub struct Unit {
    name: String,
    constants: Vec<Value>,
    code: Vec<OpCode>,
    linked: Cell<bool>,
}

impl Unit {
    /// Decode `bytes` as the unit called `name`.
    pub fn decode(name: &str, bytes: &[u8]) -> Result<Unit, DefineError> {
        let malformed = |reason: String| DefineError::Malformed {
            name: name.to_string(),
            reason,
        };

        let mut cursor = Cursor::new(bytes);
        if cursor.take(3).map_err(&malformed)? != MAGIC {
            return Err(malformed("bad magic".into()));
        }
        let version = cursor.u8().map_err(&malformed)?;
        if version != FORMAT_VERSION {
            return Err(malformed(format!("unsupported version {}", version)));
        }

        let len = cursor.u16().map_err(&malformed)?;
        let found = cursor.str(usize::from(len)).map_err(&malformed)?;
        if found != name {
            return Err(DefineError::WrongName {
                expected: name.to_string(),
                found: found.to_string(),
            });
        }

        let constants = decode_constants(&mut cursor).map_err(&malformed)?;
        let code = decode_code(&mut cursor).map_err(&malformed)?;
        if !cursor.is_empty() {
            return Err(malformed(format!("{} trailing bytes", cursor.remaining())));
        }

        Ok(Unit {
            name: name.to_string(),
            constants,
            code,
            linked: Cell::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> Option<&str> {
        package_of(&self.name)
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn code(&self) -> &[OpCode] {
        &self.code
    }

    pub fn is_linked(&self) -> bool {
        self.linked.get()
    }

    /// Verify the unit and mark it linked. Linking twice is a no-op.
    pub fn link(&self) -> Result<(), LinkError> {
        if self.linked.get() {
            return Ok(());
        }
        verify(&self.constants, &self.code)?;
        self.linked.set(true);
        Ok(())
    }

    /// Encode this unit back to bytes.
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.name, &self.constants, &self.code)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name)
            .field("constants", &self.constants.len())
            .field("code", &self.code.len())
            .field("linked", &self.linked.get())
            .finish()
    }
}

// =============================================================================
// Verification
// =============================================================================

/// Abstract interpretation over stack depth.
fn verify(constants: &[Value], code: &[OpCode]) -> Result<(), LinkError> {
    if code.is_empty() {
        return Err(LinkError::Empty);
    }

    let mut depths: Vec<Option<usize>> = vec![None; code.len()];
    depths[0] = Some(0);
    let mut worklist = vec![0usize];

    while let Some(at) = worklist.pop() {
        let op = code[at];
        let depth = depths[at].unwrap_or(0);

        match op {
            OpCode::Const(index) => {
                if usize::from(index) >= constants.len() {
                    return Err(LinkError::ConstantOutOfRange { at, index });
                }
            }
            OpCode::LoadGlobal(index) | OpCode::DefGlobal(index) => {
                match constants.get(usize::from(index)) {
                    None => return Err(LinkError::ConstantOutOfRange { at, index }),
                    Some(Value::Symbol(_)) => {}
                    Some(_) => return Err(LinkError::NotASymbol { at, index }),
                }
            }
            OpCode::LoadLocal(slot) => {
                if usize::from(slot) >= depth {
                    return Err(LinkError::LocalOutOfRange { at, slot });
                }
            }
            OpCode::StoreLocal(slot) => {
                // The stored value is popped first
                if usize::from(slot) + 1 >= depth {
                    return Err(LinkError::LocalOutOfRange { at, slot });
                }
            }
            _ => {}
        }

        let (pops, pushes) = op.stack_effect();
        if depth < pops {
            return Err(LinkError::StackUnderflow { at });
        }
        let next_depth = depth - pops + pushes;

        let mut successors = Vec::with_capacity(2);
        if let Some(offset) = op.jump_offset() {
            let target = at as isize + 1 + isize::from(offset);
            if target < 0 || target >= code.len() as isize {
                return Err(LinkError::JumpOutOfRange { at, target });
            }
            successors.push(target as usize);
        }
        if !op.is_terminator() {
            if at + 1 >= code.len() {
                return Err(LinkError::FallsOffEnd { at });
            }
            successors.push(at + 1);
        }

        for next in successors {
            match depths[next] {
                None => {
                    depths[next] = Some(next_depth);
                    worklist.push(next);
                }
                Some(expected) if expected != next_depth => {
                    return Err(LinkError::StackMismatch {
                        at: next,
                        expected,
                        found: next_depth,
                    });
                }
                Some(_) => {}
            }
        }
    }

    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        if self.remaining() < n {
            return Err(format!("unexpected end of input at byte {}", self.pos));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], String> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, String> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, String> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn str(&mut self, len: usize) -> Result<&'a str, String> {
        let at = self.pos;
        std::str::from_utf8(self.take(len)?).map_err(|_| format!("invalid UTF-8 at byte {}", at))
    }
}

fn decode_constants(cursor: &mut Cursor<'_>) -> Result<Vec<Value>, String> {
    let count = cursor.u16()?;
    let mut constants = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let value = match cursor.u8()? {
            CONST_NIL => Value::Nil,
            CONST_FALSE => Value::Bool(false),
            CONST_TRUE => Value::Bool(true),
            CONST_INT => Value::Int(i64::from_be_bytes(cursor.array()?)),
            CONST_FLOAT => Value::Float(f64::from_bits(u64::from_be_bytes(cursor.array()?))),
            CONST_STRING => {
                let len = cursor.u32()? as usize;
                Value::string(cursor.str(len)?)
            }
            CONST_SYMBOL => {
                let len = cursor.u16()?;
                Value::Symbol(Symbol::parse(cursor.str(usize::from(len))?))
            }
            CONST_KEYWORD => {
                let len = cursor.u16()?;
                Value::Keyword(Keyword::parse(cursor.str(usize::from(len))?))
            }
            tag => return Err(format!("unknown constant tag {}", tag)),
        };
        constants.push(value);
    }
    Ok(constants)
}

fn decode_code(cursor: &mut Cursor<'_>) -> Result<Vec<OpCode>, String> {
    let count = cursor.u32()?;
    let mut code = Vec::new();
    for _ in 0..count {
        let tag = cursor.u8()?;
        let width = operand_width(tag).ok_or_else(|| format!("unknown opcode {:#04x}", tag))?;
        let operand = cursor.take(width)?;
        let op = OpCode::from_bytes(tag, operand)
            .ok_or_else(|| format!("bad operand for opcode {:#04x}", tag))?;
        code.push(op);
    }
    Ok(code)
}

// =============================================================================
// Encoding
// =============================================================================

fn is_encodable(value: &Value) -> bool {
    matches!(
        value,
        Value::Nil
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::String(_)
            | Value::Symbol(_)
            | Value::Keyword(_)
    )
}

fn encode(name: &str, constants: &[Value], code: &[OpCode]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.push(FORMAT_VERSION);
    write_short_str(&mut out, name);

    out.extend((constants.len() as u16).to_be_bytes());
    for value in constants {
        match value {
            Value::Nil => out.push(CONST_NIL),
            Value::Bool(false) => out.push(CONST_FALSE),
            Value::Bool(true) => out.push(CONST_TRUE),
            Value::Int(n) => {
                out.push(CONST_INT);
                out.extend(n.to_be_bytes());
            }
            Value::Float(x) => {
                out.push(CONST_FLOAT);
                out.extend(x.to_bits().to_be_bytes());
            }
            Value::String(s) => {
                out.push(CONST_STRING);
                out.extend((s.len() as u32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            Value::Symbol(sym) => {
                out.push(CONST_SYMBOL);
                write_short_str(&mut out, &sym.to_string());
            }
            Value::Keyword(kw) => {
                out.push(CONST_KEYWORD);
                write_short_str(&mut out, &kw.to_string());
            }
            // Filtered by UnitBuilder::add_constant
            _ => out.push(CONST_NIL),
        }
    }

    out.extend((code.len() as u32).to_be_bytes());
    for op in code {
        op.encode(&mut out);
    }
    out
}

fn write_short_str(out: &mut Vec<u8>, s: &str) {
    out.extend((s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Assembles unit bytes from instructions and constants.
#[derive(Debug, Clone)]
pub struct UnitBuilder {
    name: String,
    constants: Vec<Value>,
    code: Vec<OpCode>,
}

impl UnitBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        UnitBuilder {
            name: name.into(),
            constants: Vec::new(),
            code: Vec::new(),
        }
    }

    /// Add a constant to the pool and return its index.
    ///
    /// Returns `None` if the pool is full or the value has no byte encoding.
    pub fn add_constant(&mut self, value: Value) -> Option<u16> {
        if !is_encodable(&value) {
            return None;
        }
        if let Some(i) = self.constants.iter().position(|c| constants_equal(c, &value)) {
            return Some(i as u16);
        }
        let idx = self.constants.len();
        if idx > u16::MAX as usize {
            return None;
        }
        self.constants.push(value);
        Some(idx as u16)
    }

    /// Add a symbol constant, parsing `ns/name` forms.
    pub fn add_symbol(&mut self, name: &str) -> Option<u16> {
        self.add_constant(Value::Symbol(Symbol::parse(name)))
    }

    pub fn emit(&mut self, op: OpCode) -> &mut Self {
        self.code.push(op);
        self
    }

    /// Current instruction offset, for jump patching.
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Point the jump at `offset` to the current position.
    pub fn patch_jump(&mut self, offset: usize) {
        let distance = self.code.len() as i16 - offset as i16 - 1;
        if let Some(
            OpCode::Jump(target) | OpCode::JumpIfFalse(target) | OpCode::PopJumpIfFalse(target),
        ) = self.code.get_mut(offset)
        {
            *target = distance;
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        encode(&self.name, &self.constants, &self.code)
    }
}

fn constants_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
        (Value::Float(_), _) | (_, Value::Float(_)) => false,
        _ => a == b,
    }
}
