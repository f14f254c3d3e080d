pub use crate::config::*;

/// A builder for adding participant rows from text.
///
/// This is the entry point when the rows come from a form or a spreadsheet,
/// in which every cell is a piece of text.
///
/// ```
/// pub use mutual_matching::builder::Builder;
/// pub use mutual_matching::{Group, MatchRules, QualityTier};
/// # use mutual_matching::MatchingErrors;
///
/// let mut builder = Builder::new(&MatchRules::DEFAULT_RULES);
///
/// builder.add_row(Group::A, 1, &["2".to_string(), "1".to_string(), "".to_string()])?;
/// builder.add_row(Group::from_marker("b")?, 1, &["1".to_string()])?;
///
/// let result = builder.run();
/// assert_eq!(result.rows[0].partner_label(), "B1");
/// assert_eq!(result.rows[0].tier, QualityTier::PartialPreference);
///
/// # Ok::<(), MatchingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: MatchRules,
    pub(crate) _rows: Vec<ParticipantRow>,
}

impl Builder {
    pub fn new(rules: &MatchRules) -> Builder {
        Builder {
            _rules: rules.clone(),
            _rows: Vec::new(),
        }
    }

    /// Adds the row of one participant.
    ///
    /// preferences: the numbers of the preferred participants in the other group, in order.
    /// Blank entries are accepted and skipped by the matching.
    pub fn add_row(
        &mut self,
        group: Group,
        id: u32,
        preferences: &[String],
    ) -> Result<(), MatchingErrors> {
        let mut prefs: Vec<Option<u32>> = Vec::new();
        for p in preferences {
            let pref = match p.trim() {
                "" => None,
                s => Some(parse_number(s)?),
            };
            prefs.push(pref);
        }
        self.add_row_2(&ParticipantRow {
            group,
            id,
            preferences: prefs,
        });
        Ok(())
    }

    pub fn add_row_2(&mut self, row: &ParticipantRow) {
        self._rows.push(row.clone());
    }

    pub fn rows(&self) -> &[ParticipantRow] {
        &self._rows
    }

    pub fn run(&self) -> MatchingResult {
        crate::run_matching(&self._rows, &self._rules)
    }
}

/// Reads a participant number. Spreadsheets may render integers as "12.0".
pub fn parse_number(s: &str) -> Result<u32, MatchingErrors> {
    let s = s.trim();
    if let Ok(x) = s.parse::<u32>() {
        return Ok(x);
    }
    match s.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
        _ => Err(MatchingErrors::InvalidNumber(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_number("12"), Ok(12));
        assert_eq!(parse_number(" 7 "), Ok(7));
        assert_eq!(parse_number("3.0"), Ok(3));
        assert!(parse_number("3.5").is_err());
        assert!(parse_number("-1").is_err());
        assert_eq!(
            parse_number("abc"),
            Err(MatchingErrors::InvalidNumber("abc".to_string()))
        );
    }

    #[test]
    fn blank_tokens() {
        let mut builder = Builder::new(&MatchRules::DEFAULT_RULES);
        builder
            .add_row(
                Group::B,
                4,
                &["".to_string(), " 2".to_string(), "  ".to_string()],
            )
            .unwrap();
        assert_eq!(
            builder.rows(),
            &[ParticipantRow {
                group: Group::B,
                id: 4,
                preferences: vec![None, Some(2), None],
            }]
        );
        assert!(builder.add_row(Group::A, 1, &["x".to_string()]).is_err());
        assert_eq!(builder.rows().len(), 1);
    }

    #[test]
    fn group_markers() {
        assert_eq!(Group::from_marker("A"), Ok(Group::A));
        assert_eq!(Group::from_marker(" b "), Ok(Group::B));
        assert!(Group::from_marker("C").is_err());
        assert_eq!(Group::A.opposite(), Group::B);
    }
}
