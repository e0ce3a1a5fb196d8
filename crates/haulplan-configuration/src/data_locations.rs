use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DataLocations {
    pub reference_data: PathBuf,
    pub assignment_log: PathBuf,
}
