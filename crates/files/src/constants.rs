//! File names and fixed values written into a BIDS dataset.

/// Dataset description at the output root.
pub const DATASET_DESCRIPTION_FILENAME: &str = "dataset_description.json";

/// Participants metadata stub at the output root.
pub const PARTICIPANTS_JSON_FILENAME: &str = "participants.json";

/// Participants table at the output root.
pub const PARTICIPANTS_TSV_FILENAME: &str = "participants.tsv";

/// Free-text readme at the output root.
pub const README_FILENAME: &str = "README";

/// Placeholder written for values that must be filled in by hand.
pub const UNKNOWN_VALUE: &str = "n/a";

/// Content of every JSON stub sidecar.
pub(crate) const EMPTY_JSON_OBJECT: &str = "{}";

pub(crate) const README_CONTENT: &str = "TODO";

pub(crate) const SCANS_HEADER: [&str; 2] = ["filename", "acq_time"];

pub(crate) const PARTICIPANTS_HEADER: [&str; 3] = ["participant_id", "age", "sex"];

pub(crate) const ACQ_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
