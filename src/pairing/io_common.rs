// Primitives shared by the readers.

use crate::pairing::*;

/// Picks the group, the id and the preferences out of the cells of one line.
///
/// Cells that are missing at the end of a line are treated as blank.
pub fn assemble_row(lineno: usize, cells: &[String], cfs: &FileSource) -> MatchResult<ParsedRow> {
    let cell = |idx: usize| cells.get(idx).cloned().unwrap_or_default();
    let first_pref = cfs.first_preference_column_index()?;
    let preferences: Vec<String> = (first_pref..first_pref + MAX_PREFERENCES)
        .map(cell)
        .collect();
    Ok(ParsedRow {
        lineno,
        group: cell(cfs.group_column_index()?),
        id: cell(cfs.id_column_index()?),
        preferences,
    })
}
