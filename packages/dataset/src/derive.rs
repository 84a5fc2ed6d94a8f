//! Columns computed at load time.

use flood_map_dataset_models::Record;
use flood_map_dataset_models::schema::{
    SENTINEL_NOT_APPLICABLE, dependency_label, school, street,
};

/// Adds the school dependency label and staff headcount.
///
/// Each staff sub-role column is coerced to a number, with missing,
/// non-numeric and `88888` ("not applicable") values stored as `0`, and
/// their sum stored in `QT_FUNCIONARIOS`.
pub fn derive_school_fields(records: &mut [Record]) {
    for record in records.iter_mut() {
        let label = dependency_label(record.cell(school::DEPENDENCY));
        record.set(school::DEPENDENCY_LABEL, label.as_str());

        let mut staff = 0.0;
        for column in school::STAFF {
            #[allow(clippy::float_cmp)]
            let value = record
                .number(column)
                .filter(|v| *v != SENTINEL_NOT_APPLICABLE && *v > 0.0)
                .unwrap_or(0.0);
            record.set(column, value);
            staff += value;
        }
        record.set(school::STAFF_TOTAL, staff);
    }

    log::debug!("Derived dependency and staff fields for {} schools", records.len());
}

/// Adds the street identity key: `"<tipo> <nome>"`, or the row index when
/// both are empty.
pub fn derive_street_ids(records: &mut [Record]) {
    for record in records.iter_mut() {
        let kind = record.text(street::KIND).unwrap_or_default();
        let name = record.text(street::NAME).unwrap_or_default();
        let joined = format!("{} {}", kind.trim(), name.trim());

        let id = match joined.trim() {
            "" => record.id.to_string(),
            id => id.to_string(),
        };
        record.set(street::STREET_ID, id.as_str());
    }
}
