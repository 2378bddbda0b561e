//! Vertex metadata table.
//!
//! The table is a run of 16-byte rows. Byte 0 of a row is how many
//! consecutive vertices the row covers, the high nibble of byte 13 is the
//! joint those vertices are bound to, and bit 7 of byte 1 marks the last row.

use crate::{Error, Result};

/// Size of one metadata row.
pub const META_ROW_SIZE: usize = 16;

const RUN_LENGTH: usize = 0;
const FLAGS: usize = 1;
const JOINT: usize = 13;
const LAST_ROW: u8 = 0x80;

/// Expand the joint runs of a metadata table to one joint per vertex.
pub(crate) fn expand_joint_runs(table: &[u8], vertex_count: usize) -> Result<Vec<u16>> {
    let rows: Vec<&[u8]> = table.chunks_exact(META_ROW_SIZE).collect();

    let runs: usize = rows.iter().map(|row| row[RUN_LENGTH] as usize).sum();
    if runs != vertex_count {
        return Err(Error::JointRunMismatch {
            runs,
            vertices: vertex_count,
        });
    }

    let mut joints = Vec::with_capacity(vertex_count);
    for (i, row) in rows.iter().enumerate() {
        let is_last = i + 1 == rows.len();
        if (row[FLAGS] & LAST_ROW != 0) != is_last {
            return Err(Error::TerminalFlag {
                row: i,
                rows: rows.len(),
            });
        }

        let joint = (row[JOINT] >> 4) as u16;
        joints.extend(std::iter::repeat(joint).take(row[RUN_LENGTH] as usize));
    }

    Ok(joints)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn meta_row(run: u8, joint: u8, last: bool) -> [u8; META_ROW_SIZE] {
        let mut row = [0u8; META_ROW_SIZE];
        row[RUN_LENGTH] = run;
        row[FLAGS] = if last { LAST_ROW } else { 0 };
        row[JOINT] = joint << 4 | 0x3;
        row
    }

    #[test]
    fn test_runs_assign_joints() {
        let mut table = Vec::new();
        table.extend_from_slice(&meta_row(2, 5, false));
        table.extend_from_slice(&meta_row(3, 9, true));

        assert_eq!(expand_joint_runs(&table, 5).unwrap(), vec![5, 5, 9, 9, 9]);
    }

    #[test]
    fn test_run_total_must_match() {
        let mut table = Vec::new();
        table.extend_from_slice(&meta_row(2, 5, false));
        table.extend_from_slice(&meta_row(1, 9, true));

        assert!(matches!(
            expand_joint_runs(&table, 4),
            Err(Error::JointRunMismatch {
                runs: 3,
                vertices: 4
            })
        ));
        assert!(matches!(
            expand_joint_runs(&table, 2),
            Err(Error::JointRunMismatch { runs: 3, .. })
        ));
    }

    #[test]
    fn test_last_flag_on_early_row() {
        let mut table = Vec::new();
        table.extend_from_slice(&meta_row(2, 5, true));
        table.extend_from_slice(&meta_row(2, 9, true));

        assert!(matches!(
            expand_joint_runs(&table, 4),
            Err(Error::TerminalFlag { row: 0, rows: 2 })
        ));
    }

    #[test]
    fn test_last_flag_missing() {
        let table = meta_row(4, 1, false);

        assert!(matches!(
            expand_joint_runs(&table, 4),
            Err(Error::TerminalFlag { row: 0, rows: 1 })
        ));
    }
}
