/// Header facts and entity counts of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub file_name: String,
    pub study: Option<String>,
    pub protocol: Option<String>,
    pub meta_data_version: Option<String>,
    pub define_version: Option<String>,
    pub is_adam: bool,
    pub is_sdtm: bool,
    pub counts: Vec<EntityCount>,
}

impl DocumentSummary {
    pub fn count(&self, entity: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|count| count.entity == entity)
            .map(|count| count.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCount {
    pub entity: &'static str,
    pub count: usize,
}

/// One item group as listed by `definex datasets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRow {
    pub name: String,
    pub description: Option<String>,
    pub class: Option<String>,
    pub structure: Option<String>,
    pub variables: usize,
    /// Variables whose origin is `Derived`.
    pub derived: usize,
    pub value_lists: usize,
    pub vlm_eligible: bool,
}
