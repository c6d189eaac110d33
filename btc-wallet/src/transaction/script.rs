//! Script construction
//!
//! Only the handful of opcodes needed for P2PKH, P2SH and P2WPKH scripts are
//! named here. Data pushes always use the minimal encoding.

use std::fmt;

use crate::error::{Error, Result};

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// Largest single data push allowed by consensus
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Largest script allowed by consensus
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Raw script bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    /// An empty script
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Data items of a push-only script, in order
    pub fn push_data(&self) -> Result<Vec<Vec<u8>>> {
        let bytes = &self.0;
        let mut items = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            let opcode = bytes[pos];
            pos += 1;

            let len = match opcode {
                OP_0 => 0,
                0x01..=0x4b => opcode as usize,
                OP_PUSHDATA1 => read_len(bytes, &mut pos, 1)?,
                OP_PUSHDATA2 => read_len(bytes, &mut pos, 2)?,
                OP_PUSHDATA4 => read_len(bytes, &mut pos, 4)?,
                OP_1NEGATE => {
                    items.push(vec![0x81]);
                    continue;
                }
                OP_1..=OP_16 => {
                    items.push(vec![opcode - OP_1 + 1]);
                    continue;
                }
                _ => {
                    return Err(Error::Encoding(format!("Non-push opcode {:#04x} in script", opcode)));
                }
            };

            let end = pos
                .checked_add(len)
                .filter(|end| *end <= bytes.len())
                .ok_or_else(|| Error::Encoding("Data push runs past the end of the script".to_string()))?;
            items.push(bytes[pos..end].to_vec());
            pos = end;
        }

        Ok(items)
    }
}

fn read_len(bytes: &[u8], pos: &mut usize, width: usize) -> Result<usize> {
    let end = *pos + width;
    if end > bytes.len() {
        return Err(Error::Encoding("Truncated push length".to_string()));
    }

    let mut le = [0u8; 4];
    le[..width].copy_from_slice(&bytes[*pos..end]);
    *pos = end;
    Ok(u32::from_le_bytes(le) as usize)
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Incremental script builder
///
/// Errors are deferred: the first failing push is reported by [`ScriptBuilder::script`].
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    script: Vec<u8>,
    error: Option<Error>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single opcode
    pub fn add_op(mut self, opcode: u8) -> Self {
        if self.error.is_none() {
            self.script.push(opcode);
        }
        self
    }

    /// Append a data push using the shortest possible encoding
    pub fn add_data(mut self, data: &[u8]) -> Self {
        if self.error.is_some() {
            return self;
        }

        if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
            self.error = Some(Error::Encoding(format!(
                "Data push of {} bytes exceeds the {} byte limit",
                data.len(),
                MAX_SCRIPT_ELEMENT_SIZE
            )));
            return self;
        }

        match data {
            [] => self.script.push(OP_0),
            [value @ 1..=16] => self.script.push(OP_1 - 1 + value),
            [0x81] => self.script.push(OP_1NEGATE),
            _ => {
                let len = data.len();
                if len < OP_PUSHDATA1 as usize {
                    self.script.push(len as u8);
                } else if len <= 0xff {
                    self.script.push(OP_PUSHDATA1);
                    self.script.push(len as u8);
                } else if len <= 0xffff {
                    self.script.push(OP_PUSHDATA2);
                    self.script.extend_from_slice(&(len as u16).to_le_bytes());
                } else {
                    self.script.push(OP_PUSHDATA4);
                    self.script.extend_from_slice(&(len as u32).to_le_bytes());
                }
                self.script.extend_from_slice(data);
            }
        }

        self
    }

    /// Finish the script
    pub fn script(self) -> Result<Script> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.script.len() > MAX_SCRIPT_SIZE {
            return Err(Error::Encoding(format!("Script of {} bytes is too large", self.script.len())));
        }
        Ok(Script(self.script))
    }
}
