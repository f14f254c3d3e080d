// Writing the result table.

use std::path::Path;

use crate::pairing::*;

/// The background color of a line of the table.
pub fn tier_color(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Unmatched => "#D3D3D3",
        QualityTier::MutualTopChoice => "#C6EFCE",
        QualityTier::PartialPreference => "#FFF2CC",
    }
}

pub fn write_table(path: &Path, rows: &[MatchRow]) -> MatchResult<()> {
    let p = path.display().to_string();
    info!("Writing result table to {:?}", p);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingFileSnafu { path: p.as_str() })?;
        }
    }
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path: p.as_str() })?;
    wtr.write_record(["participant", "partner", "rank", "tier", "color"])
        .context(CsvWriteSnafu { path: p.as_str() })?;
    for r in rows.iter() {
        wtr.write_record([
            r.participant.to_string(),
            r.partner_label(),
            r.rank_label(),
            r.tier.name().to_string(),
            tier_color(r.tier).to_string(),
        ])
        .context(CsvWriteSnafu { path: p.as_str() })?;
    }
    wtr.flush().context(WritingFileSnafu { path: p.as_str() })?;
    Ok(())
}
