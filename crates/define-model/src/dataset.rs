//! Dataset identifier normalization.
//!
//! File names (`adlb.sas7bdat`), OID segments (`ADLB`) and display names
//! (`adlb`) all refer to the same dataset; comparisons go through
//! [`normalize_dataset_id`].

const DATASET_EXTENSIONS: [&str; 2] = [".sas7bdat", ".xml"];

/// Strip a trailing `.sas7bdat` / `.xml` (any case), upper-case and trim.
pub fn normalize_dataset_id(name: &str) -> String {
    let stripped = strip_dataset_extension(name);
    stripped.to_uppercase().trim().to_string()
}

/// Normalized equality of two dataset identifiers.
pub fn same_dataset(left: &str, right: &str) -> bool {
    normalize_dataset_id(left) == normalize_dataset_id(right)
}

fn strip_dataset_extension(name: &str) -> &str {
    for extension in DATASET_EXTENSIONS {
        if name.len() >= extension.len() {
            let split = name.len() - extension.len();
            if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(extension) {
                return &name[..split];
            }
        }
    }
    name
}
