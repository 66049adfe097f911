use core::fmt;

use serde::{Deserialize, Serialize};

use crate::bytecode::{BytecodeError, Instruction};

/// Load-time location of a chunk. Carried through compilation untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

/// The instruction stream of one function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytecodeChunk {
    pub code: Vec<Instruction>,
}

impl BytecodeChunk {
    pub fn new(code: Vec<Instruction>) -> Self {
        Self { code }
    }

    /// Decode a chunk from its compact byte encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, BytecodeError> {
        let mut code = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let (instruction, len) = Instruction::decode(bytes, offset)?;
            code.push(instruction);
            offset += len;
        }
        Ok(Self { code })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.code.len());
        for instruction in &self.code {
            instruction.encode(&mut out);
        }
        out
    }
}

impl From<Vec<Instruction>> for BytecodeChunk {
    fn from(code: Vec<Instruction>) -> Self {
        Self::new(code)
    }
}

/// Disassembly listing, one instruction per line.
impl fmt::Display for BytecodeChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (offset, instruction) in self.code.iter().enumerate() {
            writeln!(f, "{:4}  {}", offset, instruction)?;
        }
        Ok(())
    }
}

/// A whole bytecode program: one chunk per function, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytecodeExecutable {
    pub chunks: Vec<(BytecodeChunk, Address)>,
}

impl BytecodeExecutable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: BytecodeChunk, address: Address) {
        self.chunks.push((chunk, address));
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Serialize into the postcard container format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BytecodeError> {
        postcard::to_allocvec(self).map_err(BytecodeError::Encode)
    }

    /// Load from the postcard container format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BytecodeError> {
        postcard::from_bytes(bytes).map_err(BytecodeError::Container)
    }
}

impl FromIterator<BytecodeChunk> for BytecodeExecutable {
    /// Chunks get consecutive addresses starting at zero.
    fn from_iter<I: IntoIterator<Item = BytecodeChunk>>(iter: I) -> Self {
        let chunks = iter
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| (chunk, Address(index as u64)))
            .collect();
        Self { chunks }
    }
}
