//! Row displacement compression of the parse tables.
//!
//! Every non-empty row is placed into a shared `info`/`check` pair at a
//! displacement of its own, so that the entry of `(row, column)` is stored at
//! `index[row] + column` and `check` holds its column. A lookup whose check
//! does not match falls back to the default of the row.

use crate::types::Map;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compressed {
    /// The displacement of each row. Empty rows get `-columns`.
    pub index: Vec<i32>,
    pub info: Vec<i32>,
    /// The column of each entry in `info`, `-1` for the unused slots.
    pub check: Vec<i32>,
}

impl Compressed {
    /// Look up an entry, returning `None` if it is not stored.
    pub fn get(&self, row: usize, column: usize) -> Option<i32> {
        let pos = usize::try_from(self.index[row] + column as i32).ok()?;
        if *self.check.get(pos)? != column as i32 {
            return None;
        }
        self.info.get(pos).copied()
    }
}

/// Compress the rows of a dense table, where `0` marks a missing entry.
///
/// Rows are placed in order of decreasing number of entries, the first fit
/// wins, identical rows share a displacement and no two distinct rows share
/// one. `info` and `check` are padded so that any `index[row] + column` with
/// `column < columns` stays in bounds.
pub fn compress(rows: &[Vec<i32>], columns: usize) -> Compressed {
    let columns_i32 = columns as i32;

    let entries: Vec<Vec<(i32, i32)>> = rows
        .iter()
        .map(|row| {
            debug_assert_eq!(row.len(), columns);
            row.iter()
                .enumerate()
                .filter(|(_, value)| **value != 0)
                .map(|(column, value)| (column as i32, *value))
                .collect()
        })
        .collect();

    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| entries[b].len().cmp(&entries[a].len()).then(a.cmp(&b)));

    let mut compressed = Compressed {
        index: vec![0; rows.len()],
        info: vec![],
        check: vec![],
    };
    let mut placed: Map<&[(i32, i32)], i32> = Map::default();
    let mut used: Vec<bool> = vec![];

    for row in order {
        let row_entries = &entries[row][..];
        if row_entries.is_empty() {
            compressed.index[row] = -columns_i32;
            continue;
        }
        if let Some(&displacement) = placed.get(row_entries) {
            compressed.index[row] = displacement;
            continue;
        }

        // The first entry must land on a non-negative position.
        let mut displacement = -row_entries[0].0;
        loop {
            let taken = displacement
                .checked_add(columns_i32)
                .and_then(|d| usize::try_from(d).ok())
                .map_or(false, |d| used.get(d).copied().unwrap_or(false));
            let fits = row_entries.iter().all(|&(column, _)| {
                let pos = (displacement + column) as usize;
                compressed.check.get(pos).map_or(true, |check| *check == -1)
            });
            if !taken && fits {
                break;
            }
            displacement += 1;
        }

        for &(column, value) in row_entries {
            let pos = (displacement + column) as usize;
            if pos >= compressed.info.len() {
                compressed.info.resize(pos + 1, 0);
                compressed.check.resize(pos + 1, -1);
            }
            compressed.info[pos] = value;
            compressed.check[pos] = column;
        }

        // displacements are >= -columns, keep them in a dense bitmap.
        let slot = (displacement + columns_i32) as usize;
        if slot >= used.len() {
            used.resize(slot + 1, false);
        }
        used[slot] = true;

        placed.insert(row_entries, displacement);
        compressed.index[row] = displacement;
    }

    let max_index = compressed.index.iter().copied().max().unwrap_or(0);
    let len = usize::try_from(max_index + columns_i32).unwrap_or(0);
    if compressed.info.len() < len {
        compressed.info.resize(len, 0);
        compressed.check.resize(len, -1);
    }

    tracing::trace!(
        rows = rows.len(),
        columns,
        len = compressed.info.len(),
        "compressed"
    );
    compressed
}
