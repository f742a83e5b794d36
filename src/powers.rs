//! The demonstration sheet.
//!
//! Leaves `a` (empty), `b` (3) and `c` (5), and cells derived from them:
//! - `a2 = a*a`, `a3 = a*a2`, `a5 = a2*a3` - strict computed cells
//! - `a17 = a^4 * a2^2 * a3^3` - null-safe, empty while `a` is empty
//! - `d = a+b+c` - strict computed cell
//! - `bc = b+c` - non-null, evaluated when the sheet is built
//!
//! Products that overflow `i64` are empty.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::sync::OnceLock;

use lazysheet_core::storage::load_table;
use lazysheet_core::{Row, prune};
use lazysheet_engine::{CellError, CellId, Scope, Sheet, SheetConfig};
use regex::Regex;

use crate::error::{AppError, Result};

/// Cells in report order.
pub const NAMES: [&str; 9] = ["a", "b", "c", "a2", "a3", "a5", "a17", "d", "bc"];

struct Entry {
    name: &'static str,
    id: CellId,
    evaluations: Option<Rc<Cell<u32>>>,
}

pub struct Powers {
    sheet: Sheet<i64>,
    entries: Vec<Entry>,
}

/// One line of output.
#[derive(Debug)]
pub struct ReportRow {
    pub name: &'static str,
    pub value: std::result::Result<Option<i64>, CellError>,
    pub version: u64,
}

impl ReportRow {
    /// The value as shown to the user; faults become markers.
    pub fn display_value(&self) -> String {
        match &self.value {
            Ok(Some(n)) => n.to_string(),
            Ok(None) => String::new(),
            Err(CellError::MissingValue(_)) => "#MISSING!".to_string(),
            Err(CellError::Cycle { .. }) => "#CYCLE!".to_string(),
            Err(_) => "#ERR!".to_string(),
        }
    }

    /// `name,value,version`, with an empty value written as absent.
    pub fn to_row(&self) -> Row {
        let value = match &self.value {
            Ok(None) => None,
            _ => Some(self.display_value()),
        };
        vec![
            Some(self.name.to_string()),
            value,
            Some(self.version.to_string()),
        ]
    }
}

fn product(factors: &[(i64, u32)]) -> Option<i64> {
    factors
        .iter()
        .try_fold(1i64, |acc, &(base, exp)| acc.checked_mul(base.checked_pow(exp)?))
}

impl Powers {
    pub fn new(config: SheetConfig) -> std::result::Result<Powers, CellError> {
        let mut sheet = Sheet::with_config(config);
        let mut entries = Vec::new();

        let a = sheet.value(None);
        let b = sheet.value(Some(3));
        let c = sheet.value(Some(5));

        let (a2_calls, a3_calls, a5_calls, a17_calls, d_calls) = (
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
        );

        let calls = a2_calls.clone();
        let a2 = sheet.computed(move |s| {
            calls.set(calls.get() + 1);
            Ok(product(&[(s.require(a)?, 2)]))
        });
        sheet.depends_on(a2, &[a])?;

        let calls = a3_calls.clone();
        let a3 = sheet.computed(move |s| {
            calls.set(calls.get() + 1);
            Ok(product(&[(s.require(a)?, 1), (s.require(a2)?, 1)]))
        });
        sheet.depends_on(a3, &[a2, a])?;

        let calls = a5_calls.clone();
        let a5 = sheet.computed(move |s| {
            calls.set(calls.get() + 1);
            Ok(product(&[(s.require(a2)?, 1), (s.require(a3)?, 1)]))
        });
        sheet.depends_on(a5, &[a2, a3])?;

        let calls = a17_calls.clone();
        let a17 = sheet.null_safe(move |s| {
            calls.set(calls.get() + 1);
            Ok(product(&[
                (s.require(a)?, 4),
                (s.require(a2)?, 2),
                (s.require(a3)?, 3),
            ]))
        });
        sheet.depends_on(a17, &[a, a2, a3])?;

        let calls = d_calls.clone();
        let d = sheet.computed(move |s| {
            calls.set(calls.get() + 1);
            sum(s, &[a, b, c])
        });
        sheet.depends_on(d, &[a, b, c])?;

        let bc = sheet.non_null(&[b, c], move |s| sum(s, &[b, c]))?;

        for (name, id, evaluations) in [
            ("a", a, None),
            ("b", b, None),
            ("c", c, None),
            ("a2", a2, Some(a2_calls)),
            ("a3", a3, Some(a3_calls)),
            ("a5", a5, Some(a5_calls)),
            ("a17", a17, Some(a17_calls)),
            ("d", d, Some(d_calls)),
            ("bc", bc, None),
        ] {
            entries.push(Entry {
                name,
                id,
                evaluations,
            });
        }

        Ok(Powers { sheet, entries })
    }

    pub fn lookup(&self, name: &str) -> Option<CellId> {
        self.entry(name).map(|entry| entry.id)
    }

    /// How many times a computed cell ran its evaluator, if it is counted.
    pub fn evaluations(&self, name: &str) -> Option<u32> {
        self.entry(name)?
            .evaluations
            .as_ref()
            .map(|calls| calls.get())
    }

    pub fn assign(&mut self, name: &str, value: Option<i64>) -> Result<()> {
        let id = self
            .lookup(name)
            .ok_or_else(|| AppError::UnknownCell(name.to_string()))?;
        log::debug!("Assigning {:?} to {}", value, name);
        self.sheet.set(id, value)?;
        Ok(())
    }

    /// Apply `NAME=VALUE` text.
    pub fn assign_text(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = parse_assignment(assignment)?;
        self.assign(&name, value)
    }

    /// Apply rows of a table: the first present, non-blank field is the
    /// name and the second, if any, the value. Blank rows are skipped.
    pub fn assign_rows(&mut self, rows: &[Row]) -> Result<usize> {
        let mut applied = 0;
        for row in rows {
            let fields = prune::whites(&prune::nulls(row.iter().cloned()));
            let Some(name) = fields.first() else {
                continue;
            };
            let value = match fields.get(1) {
                Some(text) => parse_value(name, text)?,
                None => None,
            };
            self.assign(name, value)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Load a table file and apply its rows.
    pub fn assign_table(&mut self, path: &Path) -> Result<usize> {
        let rows = load_table(path)?;
        self.assign_rows(&rows)
    }

    pub fn read(&mut self, name: &str) -> Result<std::result::Result<Option<i64>, CellError>> {
        let id = self
            .lookup(name)
            .ok_or_else(|| AppError::UnknownCell(name.to_string()))?;
        Ok(self.sheet.get(id))
    }

    /// Read every cell in report order.
    pub fn report(&mut self) -> Vec<ReportRow> {
        let mut rows = Vec::with_capacity(self.entries.len());
        for idx in 0..self.entries.len() {
            let (name, id) = (self.entries[idx].name, self.entries[idx].id);
            let value = self.sheet.get(id);
            if let Err(err) = &value {
                log::info!("Cell {} faulted: {}", name, err);
            }
            let version = self.sheet.version(id).unwrap_or_default();
            rows.push(ReportRow {
                name,
                value,
                version,
            });
        }
        rows
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

fn sum(s: &mut Scope<'_, i64>, cells: &[CellId]) -> lazysheet_engine::Result<Option<i64>> {
    let mut total = 0i64;
    for &cell in cells {
        let value = s.get(cell)?.ok_or_else(|| s.missing(cell))?;
        match total.checked_add(value) {
            Some(next) => total = next,
            None => return Ok(None),
        }
    }
    Ok(Some(total))
}

fn assignment_re() -> &'static Regex {
    static ASSIGNMENT_RE: OnceLock<Regex> = OnceLock::new();
    ASSIGNMENT_RE.get_or_init(|| {
        Regex::new(r"^\s*(?<name>[A-Za-z][A-Za-z0-9_]*)\s*=\s*(?<value>.*?)\s*$")
            .expect("assignment regex must compile")
    })
}

/// Parse `NAME=VALUE`. An empty value or `-` means "no value".
pub fn parse_assignment(text: &str) -> Result<(String, Option<i64>)> {
    let caps = assignment_re()
        .captures(text)
        .ok_or_else(|| AppError::InvalidAssignment(text.to_string()))?;
    let name = caps["name"].to_string();
    let value = parse_value(&name, &caps["value"])?;
    Ok((name, value))
}

fn parse_value(name: &str, text: &str) -> Result<Option<i64>> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| AppError::InvalidValue {
            name: name.to_string(),
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powers() -> Powers {
        Powers::new(SheetConfig::default()).unwrap()
    }

    fn value(rows: &[ReportRow], name: &str) -> String {
        rows.iter()
            .find(|row| row.name == name)
            .map(|row| row.display_value())
            .unwrap()
    }

    #[test]
    fn test_report_with_empty_a() {
        let mut p = powers();
        let rows = p.report();
        assert_eq!(rows.len(), NAMES.len());
        assert_eq!(value(&rows, "a"), "");
        assert_eq!(value(&rows, "a2"), "#MISSING!");
        assert_eq!(value(&rows, "a5"), "#MISSING!");
        assert_eq!(value(&rows, "a17"), "");
        assert_eq!(value(&rows, "d"), "#MISSING!");
        assert_eq!(value(&rows, "bc"), "8");
    }

    #[test]
    fn test_report_with_a() {
        let mut p = powers();
        p.assign("a", Some(2)).unwrap();
        let rows = p.report();
        assert_eq!(value(&rows, "a2"), "4");
        assert_eq!(value(&rows, "a3"), "8");
        assert_eq!(value(&rows, "a5"), "32");
        assert_eq!(value(&rows, "a17"), (1i64 << 17).to_string());
        assert_eq!(value(&rows, "d"), "10");
    }

    #[test]
    fn test_report_rows_are_memoized() {
        let mut p = powers();
        p.assign("a", Some(2)).unwrap();
        p.report();
        p.report();
        assert_eq!(p.evaluations("a2"), Some(1));
        assert_eq!(p.evaluations("a3"), Some(1));
        assert_eq!(p.evaluations("a17"), Some(1));
        assert_eq!(p.evaluations("a"), None);

        p.assign("b", Some(10)).unwrap();
        p.report();
        assert_eq!(p.evaluations("a2"), Some(1));
        assert_eq!(p.evaluations("d"), Some(2));
    }

    #[test]
    fn test_overflow_is_empty() {
        let mut p = powers();
        p.assign("a", Some(1_000)).unwrap();
        assert_eq!(p.read("a2").unwrap(), Ok(Some(1_000_000)));
        assert_eq!(p.read("a17").unwrap(), Ok(None));
    }

    #[test]
    fn test_non_null_cell_faults_on_missing_leaf() {
        let mut p = powers();
        p.assign("b", None).unwrap();
        let b = p.lookup("b").unwrap();
        assert_eq!(p.read("bc").unwrap(), Err(CellError::MissingValue(b)));
    }

    #[test]
    fn test_unknown_cell() {
        let mut p = powers();
        assert!(matches!(p.assign("zz", Some(1)), Err(AppError::UnknownCell(_))));
        assert!(matches!(p.read("zz"), Err(AppError::UnknownCell(_))));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("a=2").unwrap(), ("a".to_string(), Some(2)));
        assert_eq!(parse_assignment(" b = -7 ").unwrap(), ("b".to_string(), Some(-7)));
        assert_eq!(parse_assignment("a=").unwrap(), ("a".to_string(), None));
        assert_eq!(parse_assignment("a=-").unwrap(), ("a".to_string(), None));
        assert!(matches!(parse_assignment("a"), Err(AppError::InvalidAssignment(_))));
        assert!(matches!(parse_assignment("=3"), Err(AppError::InvalidAssignment(_))));
        assert!(matches!(
            parse_assignment("a=two"),
            Err(AppError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_assign_rows_prunes_blank_fields() {
        let mut p = powers();
        let rows: Vec<Row> = vec![
            vec![Some("a".to_string()), Some(" 3 ".to_string())],
            vec![],
            vec![None, Some("  ".to_string())],
            vec![Some("c".to_string()), None],
        ];
        assert_eq!(p.assign_rows(&rows).unwrap(), 2);
        assert_eq!(p.read("a").unwrap(), Ok(Some(3)));
        assert_eq!(p.read("c").unwrap(), Ok(None));
    }

    #[test]
    fn test_assign_table_from_file() {
        let path = std::env::temp_dir().join(format!(
            "lazysheet_powers_{}_table.csv",
            std::process::id()
        ));
        std::fs::write(&path, "a,2\nc,\\0\n").unwrap();
        let mut p = powers();
        assert_eq!(p.assign_table(&path).unwrap(), 2);
        assert_eq!(p.read("a2").unwrap(), Ok(Some(4)));
        let c = p.lookup("c").unwrap();
        assert_eq!(p.read("d").unwrap(), Err(CellError::MissingValue(c)));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(p.assign_table(&path), Err(AppError::Core(_))));
    }

    #[test]
    fn test_to_row() {
        let row = ReportRow {
            name: "a",
            value: Ok(None),
            version: 3,
        };
        assert_eq!(
            row.to_row(),
            vec![Some("a".to_string()), None, Some("3".to_string())]
        );
    }
}
