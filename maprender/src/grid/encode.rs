//! Grid serialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Grid;
use crate::datasource::Value;

/// Code of a cell no feature covers.
pub const EMPTY_CODE: u32 = 0;

/// Attributes emitted for one key.
pub type GridRecord = BTreeMap<String, Value>;

/// Compact grid form: `grid[y][x]` is 0 or `k`, denoting `keys[k - 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridEncoding {
    #[serde(rename = "grid")]
    pub codes: Vec<Vec<u32>>,
    pub keys: Vec<String>,
    pub data: BTreeMap<String, GridRecord>,
}

impl GridEncoding {
    /// Key at a cell, if any.
    pub fn key_at(&self, x: usize, y: usize) -> Option<&str> {
        let code = *self.codes.get(y)?.get(x)?;
        if code == EMPTY_CODE {
            return None;
        }
        self.keys.get(code as usize - 1).map(String::as_str)
    }

    /// Converts to the UTFGrid wire form.
    pub fn into_utf(self) -> UtfGrid {
        let grid = self
            .codes
            .iter()
            .map(|row| row.iter().map(|&code| codepoint(code)).collect())
            .collect();
        let mut keys = Vec::with_capacity(self.keys.len() + 1);
        keys.push(String::new());
        keys.extend(self.keys);
        UtfGrid {
            grid,
            keys,
            data: self.data,
        }
    }
}

/// UTFGrid form: each row is a string of one character per cell, and
/// `keys[0]` is the empty sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtfGrid {
    pub grid: Vec<String>,
    pub keys: Vec<String>,
    pub data: BTreeMap<String, GridRecord>,
}

/// Character for a grid code: codes count up from U+0020, skipping `"` and `\`.
pub fn codepoint(code: u32) -> char {
    let mut cp = code + 32;
    if cp >= 34 {
        cp += 1;
    }
    if cp >= 92 {
        cp += 1;
    }
    if cp >= 0xD800 {
        cp += 0x800;
    }
    char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER)
}

impl Grid {
    /// Encodes the grid.
    ///
    /// Keys follow the order features were first rendered, keeping only
    /// features that still own at least one cell. `data` is empty unless
    /// fields were requested.
    pub fn encode(&self) -> GridEncoding {
        let mut present = vec![false; self.features.len() + 1];
        for &slot in &self.cells {
            present[slot as usize] = true;
        }

        let mut keys = Vec::new();
        let mut data = BTreeMap::new();
        let mut remap = vec![EMPTY_CODE; self.features.len() + 1];
        for (index, feature) in self.features.iter().enumerate() {
            let slot = index + 1;
            if !present[slot] {
                continue;
            }
            keys.push(feature.key.clone());
            remap[slot] = keys.len() as u32;
            if !self.property_names.is_empty() {
                data.insert(feature.key.clone(), feature.properties.clone());
            }
        }

        let codes = if self.width == 0 {
            vec![Vec::new(); self.height as usize]
        } else {
            self.cells
                .chunks(self.width as usize)
                .map(|row| row.iter().map(|&slot| remap[slot as usize]).collect())
                .collect()
        };

        GridEncoding { codes, keys, data }
    }

    pub fn encode_utf(&self) -> UtfGrid {
        self.encode().into_utf()
    }
}
