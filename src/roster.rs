//! Roster loading for tally.
//!
//! The roster is a tab-separated file with one student per line:
//! `id<TAB>section<TAB>name<TAB>major<TAB>comajor<TAB>year<TAB>credit`.
//! The line order defines the index space every other component refers to;
//! indices stay stable for the whole session, including across a resume.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Result, TallyError};
use crate::util::read_to_string_limited;

/// Number of tab-separated fields per roster line.
pub const ROSTER_FIELDS: usize = 7;

/// Column names for the roster fields, in file order.
pub const FIELD_NAMES: [&str; ROSTER_FIELDS] =
    ["id", "section", "name", "major", "comajor", "year", "credit"];

/// One student entry from the roster.
///
/// All fields are kept as strings; the roster is a pass-through source for
/// the report and only `name` is inspected (by the name matcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub id: String,
    pub section: String,
    pub name: String,
    pub major: String,
    pub comajor: String,
    pub year: String,
    pub credit: String,
}

impl StudentRecord {
    /// The record's fields in file order, for report rows.
    pub fn fields(&self) -> [&str; ROSTER_FIELDS] {
        [
            &self.id,
            &self.section,
            &self.name,
            &self.major,
            &self.comajor,
            &self.year,
            &self.credit,
        ]
    }
}

/// Immutable ordered roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    students: Vec<StudentRecord>,
}

impl Roster {
    /// Load a roster from a tab-separated file.
    ///
    /// A missing or malformed roster is fatal: no session can start without
    /// a usable index space.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TallyError::roster(format!(
                "roster file {} does not exist",
                path.display()
            )));
        }
        let content = read_to_string_limited(path)?;
        Self::parse(&content)
    }

    /// Parse roster content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut students = Vec::new();

        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != ROSTER_FIELDS {
                return Err(TallyError::roster(format!(
                    "line {}: expected {} tab-separated fields, got {}",
                    lineno + 1,
                    ROSTER_FIELDS,
                    fields.len()
                )));
            }

            students.push(StudentRecord {
                id: fields[0].trim().to_string(),
                section: fields[1].trim().to_string(),
                name: fields[2].trim().to_string(),
                major: fields[3].trim().to_string(),
                comajor: fields[4].trim().to_string(),
                year: fields[5].trim().to_string(),
                credit: fields[6].trim().to_string(),
            });
        }

        if students.is_empty() {
            return Err(TallyError::roster("roster contains no students"));
        }

        Ok(Self { students })
    }

    /// Number of students in the roster.
    pub fn len(&self) -> usize {
        self.students.len()
    }

    /// Whether the roster is empty (never true for a loaded roster).
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Get a student by index.
    pub fn get(&self, index: usize) -> Option<&StudentRecord> {
        self.students.get(index)
    }

    /// Get a student's name by index, or an empty string out of bounds.
    pub fn name(&self, index: usize) -> &str {
        self.students.get(index).map(|s| s.name.as_str()).unwrap_or("")
    }

    /// All student indices, in roster order.
    pub fn all_indices(&self) -> BTreeSet<usize> {
        (0..self.students.len()).collect()
    }

    /// Iterate over all students in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &StudentRecord> {
        self.students.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    pub fn sample_content() -> String {
        [
            "2017001\tA\tKIM MINSOO\tCS\t-\t3\t3",
            "2017002\tA\tLEE JIWON\tEE\tCS\t2\t3",
            "2017003\tB\tPARK O'BRIAN\tME\t-\t4\t3",
        ]
        .join("\n")
    }

    #[test]
    fn test_parse_basic() {
        let roster = Roster::parse(&sample_content()).unwrap();

        assert_eq!(roster.len(), 3);
        assert_eq!(roster.name(0), "KIM MINSOO");
        assert_eq!(roster.get(1).unwrap().major, "EE");
        assert_eq!(roster.get(2).unwrap().name, "PARK O'BRIAN");
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let content = format!("{}\n\n", sample_content());
        let roster = Roster::parse(&content).unwrap();
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        let result = Roster::parse("2017001\tA\tKIM MINSOO");
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("line 1"));
        assert!(msg.contains("got 3"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        let result = Roster::parse("\n\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = Roster::load(&temp.path().join("nope.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roster.txt");
        fs::write(&path, sample_content()).unwrap();

        let roster = Roster::load(&path).unwrap();
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_all_indices_roster_order() {
        let roster = Roster::parse(&sample_content()).unwrap();
        let indices: Vec<usize> = roster.all_indices().into_iter().collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_fields_order() {
        let roster = Roster::parse(&sample_content()).unwrap();
        let fields = roster.get(0).unwrap().fields();
        assert_eq!(fields[0], "2017001");
        assert_eq!(fields[2], "KIM MINSOO");
        assert_eq!(fields[6], "3");
    }

    #[test]
    fn test_name_out_of_bounds() {
        let roster = Roster::parse(&sample_content()).unwrap();
        assert_eq!(roster.name(99), "");
    }
}
