//! File backed adapters: the reference data the scheduler starts from and
//! the append-only log every assignment revision is written to.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::Context;
use anyhow::Result;
use haulplan_scheduling_engine::AssignmentRecord;
use haulplan_scheduling_engine::AssignmentSink;
use haulplan_scheduling_engine::sink::SinkError;
use haulplan_scheduling_environment::SchedulingEnvironment;
use haulplan_scheduling_environment::fleet_environment::Truck;
use haulplan_scheduling_environment::job_environment::Job;
use haulplan_scheduling_environment::material::MaterialQualityProfile;
use serde::Deserialize;
use serde::Serialize;
use tracing::Level;
use tracing::event;

/// Layout of the reference data file.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ReferenceData {
    #[serde(default)]
    pub material_profiles: Vec<MaterialQualityProfile>,
    pub trucks: Vec<Truck>,
    pub jobs: Vec<Job>,
}

impl ReferenceData {
    pub fn into_scheduling_environment(self) -> Result<Arc<Mutex<SchedulingEnvironment>>> {
        let scheduling_environment = SchedulingEnvironment::builder()
            .material_profiles(self.material_profiles.into_iter().collect())
            .trucks(self.trucks)
            .jobs(self.jobs)
            .build();

        scheduling_environment
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check_references()
            .context("reference data names material profiles that are not registered")?;

        Ok(scheduling_environment)
    }
}

pub fn load_scheduling_environment(path: &Path) -> Result<Arc<Mutex<SchedulingEnvironment>>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("could not read reference data {}", path.display()))?;

    let reference_data: ReferenceData = serde_json::from_str(&contents)
        .with_context(|| format!("invalid reference data in {}", path.display()))?;

    let scheduling_environment = reference_data.into_scheduling_environment()?;

    event!(
        Level::INFO,
        path = %path.display(),
        scheduling_environment = %scheduling_environment.lock().unwrap_or_else(PoisonError::into_inner),
        "reference data loaded"
    );
    Ok(scheduling_environment)
}

/// Appends one JSON object per line for every persisted revision.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create directory {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .with_context(|| format!("could not open assignment log {}", path.display()))?;
        drop_interrupted_line(&mut file)
            .with_context(|| format!("could not repair assignment log {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A crash during a write can leave the last record without its newline. A
/// complete record gets the newline, a partial one is cut off, so that the
/// next record starts on a line of its own.
fn drop_interrupted_line(file: &mut File) -> std::io::Result<()> {
    let mut contents = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut contents)?;
    if contents.is_empty() || contents.ends_with(b"\n") {
        return Ok(());
    }
    let keep = contents
        .iter()
        .rposition(|byte| *byte == b'\n')
        .map_or(0, |newline| newline + 1);
    match serde_json::from_slice::<AssignmentRecord>(&contents[keep..]) {
        Ok(_) => file.write_all(b"\n"),
        Err(_) => file.set_len(keep as u64),
    }
}

/// Reads back every record of an assignment log. A missing file is an empty
/// log. An unparsable final line is the remains of an interrupted write and
/// is skipped; anywhere else it is an error.
pub fn read_assignment_log(path: &Path) -> Result<Vec<AssignmentRecord>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("could not read assignment log {}", path.display()));
        }
    };

    let lines: Vec<(usize, &str)> = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();
    let last = lines.last().map(|(number, _)| *number);

    let mut records = Vec::with_capacity(lines.len());
    for (number, line) in lines {
        match serde_json::from_str::<AssignmentRecord>(line) {
            Ok(record) => records.push(record),
            Err(error) if Some(number) == last => {
                event!(
                    Level::WARN,
                    path = %path.display(),
                    line = number + 1,
                    error = %error,
                    "skipping truncated last line of the assignment log"
                );
            }
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("invalid record on line {} of {}", number + 1, path.display())
                });
            }
        }
    }
    Ok(records)
}

impl AssignmentSink for JsonLinesSink {
    fn persist(&self, record: &AssignmentRecord) -> Result<(), SinkError> {
        let sink_error = |source: Box<dyn std::error::Error + Send + Sync>| SinkError {
            assignment: record.id,
            version: record.version,
            source,
        };

        let mut line = serde_json::to_string(record).map_err(|error| sink_error(error.into()))?;
        line.push('\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|error| sink_error(error.into()))
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use chrono::TimeZone;
    use chrono::Utc;
    use haulplan_scheduling_environment::assignment::AssignmentId;
    use haulplan_scheduling_environment::assignment::AssignmentStatus;
    use haulplan_scheduling_environment::assignment::Version;
    use haulplan_scheduling_environment::fleet_environment::TruckId;
    use haulplan_scheduling_environment::job_environment::JobId;

    use super::*;

    const REFERENCE_DATA: &str = r#"{
        "material_profiles": [{ "id": "P1", "name": "Crushed limestone" }],
        "trucks": [{
            "id": "T",
            "capacity": { "amount": "10", "unit": "tonnes" },
            "supported_profiles": ["P1"],
            "availability": [{ "start": "2026-03-02T08:00:00Z", "end": "2026-03-02T16:00:00Z" }]
        }],
        "jobs": [{
            "id": "J1",
            "required_profile": "P1",
            "required_capacity": { "amount": "6", "unit": "tonnes" },
            "requested_window": { "start": "2026-03-02T09:00:00Z", "end": "2026-03-02T11:00:00Z" }
        }]
    }"#;

    #[test]
    fn test_reference_data_builds_environment() {
        let reference_data: ReferenceData = serde_json::from_str(REFERENCE_DATA).unwrap();

        let scheduling_environment = reference_data.into_scheduling_environment().unwrap();
        let scheduling_environment = scheduling_environment.lock().unwrap();

        assert!(scheduling_environment.truck(&TruckId::new("T")).is_some());
        assert_eq!(scheduling_environment.jobs.len(), 1);
    }

    #[test]
    fn test_unregistered_profile_is_rejected() {
        let mut reference_data: ReferenceData = serde_json::from_str(REFERENCE_DATA).unwrap();
        reference_data.jobs[0].required_profile =
            haulplan_scheduling_environment::material::MaterialProfileId::new("P9");

        assert!(reference_data.into_scheduling_environment().is_err());
    }

    #[test]
    fn test_json_lines_sink_appends_records() {
        let path = env::temp_dir()
            .join(format!("haulplan-sink-{}", std::process::id()))
            .join("assignments.jsonl");
        let _ = fs::remove_file(&path);
        let sink = JsonLinesSink::open(&path).unwrap();

        let record = AssignmentRecord {
            id: AssignmentId(1),
            job_id: JobId::new("J1"),
            truck_id: TruckId::new("T"),
            window_start: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            window_end: Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap(),
            version: Version(1),
            status: AssignmentStatus::Proposed,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        };
        sink.persist(&record).unwrap();
        sink.persist(&AssignmentRecord {
            version: Version(2),
            status: AssignmentStatus::Committed,
            ..record.clone()
        })
        .unwrap();

        let lines: Vec<AssignmentRecord> = fs::read_to_string(sink.path())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], record);
        assert_eq!(lines[1].status, AssignmentStatus::Committed);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_interrupted_last_line_is_skipped_and_dropped() {
        let path = env::temp_dir()
            .join(format!("haulplan-truncated-{}", std::process::id()))
            .join("assignments.jsonl");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let record = AssignmentRecord {
            id: AssignmentId(1),
            job_id: JobId::new("J1"),
            truck_id: TruckId::new("T"),
            window_start: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            window_end: Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap(),
            version: Version(1),
            status: AssignmentStatus::Proposed,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        };
        fs::write(
            &path,
            format!("{}\n{{\"id\":2,\"job_", serde_json::to_string(&record).unwrap()),
        )
        .unwrap();

        assert_eq!(read_assignment_log(&path).unwrap(), vec![record.clone()]);

        let sink = JsonLinesSink::open(&path).unwrap();
        let committed = AssignmentRecord {
            version: Version(2),
            status: AssignmentStatus::Committed,
            ..record.clone()
        };
        sink.persist(&committed).unwrap();
        drop(sink);

        assert_eq!(read_assignment_log(&path).unwrap(), vec![record, committed]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_assignment_log_is_empty() {
        let path = env::temp_dir().join(format!("haulplan-missing-{}.jsonl", std::process::id()));

        assert!(read_assignment_log(&path).unwrap().is_empty());
    }
}
