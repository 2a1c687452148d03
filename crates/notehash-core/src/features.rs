//! Per-file feature table and delimiter-separated export
//!
//! Rows keep "last updated" order: replacing a row moves it to the end,
//! appending a score to an existing row leaves it in place.

use anyhow::Result;
use std::io::Write;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<(String, Vec<f64>)>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or create) a row and move it to the end
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        if let Some(pos) = self.position(&name) {
            self.rows.remove(pos);
        }
        self.rows.push((name, values));
    }

    /// Append one score to a row, creating it at the end if absent
    pub fn push_score(&mut self, name: &str, score: f64) {
        match self.position(name) {
            Some(pos) => self.rows[pos].1.push(score),
            None => self.rows.push((name.to_string(), vec![score])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|pos| self.rows[pos].1.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(name, _)| name.as_str())
    }

    pub fn rows(&self) -> &[(String, Vec<f64>)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write `name<d>v1<d>v2...` rows
    pub fn export<W: Write>(&self, mut out: W, delimiter: char) -> Result<()> {
        for (name, values) in &self.rows {
            write!(out, "{}", name)?;
            for value in values {
                write!(out, "{}{}", delimiter, value)?;
            }
            writeln!(out)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write only the numeric columns, one row per file
    pub fn export_values<W: Write>(&self, mut out: W, delimiter: char) -> Result<()> {
        for (_, values) in &self.rows {
            let line: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            writeln!(out, "{}", line.join(&delimiter.to_string()))?;
        }
        out.flush()?;
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.rows.iter().position(|(n, _)| n == name)
    }
}

/// One-hot label row: `[1, 0]` for the primary label, `[0, 1]` otherwise
pub fn one_hot_label(label: &str, primary_label: &str) -> Vec<f64> {
    if label == primary_label {
        vec![1.0, 0.0]
    } else {
        vec![0.0, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinsert_moves_to_end() {
        let mut table = FeatureTable::new();
        table.insert("a.mid", vec![0.5]);
        table.insert("b.mid", vec![0.25]);
        table.insert("a.mid", vec![0.75]);

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["b.mid", "a.mid"]);
        assert_eq!(table.get("a.mid"), Some(&[0.75][..]));
    }

    #[test]
    fn test_push_score_keeps_position() {
        let mut table = FeatureTable::new();
        table.push_score("a.mid", 1.0);
        table.push_score("b.mid", 0.0);
        table.push_score("a.mid", 0.5);

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["a.mid", "b.mid"]);
        assert_eq!(table.get("a.mid"), Some(&[1.0, 0.5][..]));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_export() {
        let mut table = FeatureTable::new();
        table.insert("a.mid", vec![1.0, 0.5]);
        table.insert("b.mid", one_hot_label("rock", "classical"));

        let mut named = Vec::new();
        table.export(&mut named, ',').unwrap();
        assert_eq!(String::from_utf8(named).unwrap(), "a.mid,1,0.5\nb.mid,0,1\n");

        let mut values = Vec::new();
        table.export_values(&mut values, ';').unwrap();
        assert_eq!(String::from_utf8(values).unwrap(), "1;0.5\n0;1\n");
    }
}
