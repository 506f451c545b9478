//! Dataset-level BIDS metadata.

use serde::Serialize;

/// Contents of `dataset_description.json`.
///
/// bidsify cannot know any of this, so the default carries `TODO` markers for the
/// curator to complete by hand.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetDescription {
    pub acknowledgements: String,
    pub authors: Vec<String>,
    #[serde(rename = "BIDSVersion")]
    pub bids_version: String,
    #[serde(rename = "DatasetDOI")]
    pub dataset_doi: String,
    pub funding: Vec<String>,
    pub how_to_acknowledge: String,
    pub license: String,
    pub name: String,
    pub references_and_links: Vec<String>,
}

impl Default for DatasetDescription {
    fn default() -> Self {
        Self {
            acknowledgements: "TODO: whom you want to acknowledge".into(),
            authors: vec![
                "TODO:".into(),
                "First1 Last1".into(),
                "First2 Last2".into(),
                "...".into(),
            ],
            bids_version: "1.0.1".into(),
            dataset_doi: "TODO: eventually a DOI for the dataset".into(),
            funding: vec!["TODO".into(), "GRANT #1".into(), "GRANT #2".into()],
            how_to_acknowledge: "TODO: describe how to acknowledge -- either cite a corresponding paper, or just in acknowledgement section".into(),
            license: "TODO: choose a license, e.g. PDDL (http://opendatacommons.org/licenses/pddl/)".into(),
            name: "TODO: name of the dataset".into(),
            references_and_links: vec!["TODO".into(), "List of papers or websites".into()],
        }
    }
}
