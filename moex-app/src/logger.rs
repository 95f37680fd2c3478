use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use moex_experiment::TrialRecord;

/// Append-only session log: one serialized row per finished trial,
/// flushed immediately so a crash mid-session loses nothing.
pub struct TrialLogWriter {
    file: File,
}

impl TrialLogWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening trial log {}", path.display()))?;
        Ok(Self { file })
    }

    pub fn write(&mut self, record: &TrialRecord) -> Result<()> {
        let line = serde_json::to_string(record).context("serializing trial record")?;
        writeln!(self.file, "{line}").context("appending trial record")?;
        self.file.flush().context("flushing trial log")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TrialRecord {
        TrialRecord {
            case_num: 1,
            participant: "P1".to_owned(),
            task_id: 2,
            technique_id: 2,
            block_num: 1,
            trial_num: 1,
            retries: 0,
            errors: 0,
            duration_sec: 1.25,
            reaction_sec: 0.4,
            start_notch: Some(18),
            target_notch: Some(33),
            tolerance_low: Some(29),
            tolerance_high: Some(37),
            level: None,
            rotation: None,
        }
    }

    #[test]
    fn appends_one_row_per_trial() {
        let dir = std::env::temp_dir().join("moex-log-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("trials-{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut writer = TrialLogWriter::create(&path).unwrap();
        writer.write(&record()).unwrap();
        writer.write(&record()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = contents.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("\"target_notch\":33"));

        let _ = std::fs::remove_file(&path);
    }
}
