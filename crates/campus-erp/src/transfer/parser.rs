use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One line of a students import file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StudentRow {
    pub(crate) student_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) username: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) password: Option<String>,
    pub(crate) name: String,
    pub(crate) program: String,
    pub(crate) year: u8,
}

/// One line of a users import file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserRow {
    pub(crate) username: String,
    pub(crate) role: String,
    pub(crate) password: String,
}

/// Parse rows paired with their file line (the header is line 1).
pub(crate) fn parse_rows<R, T>(reader: R) -> Result<Vec<(u64, T)>, csv::Error>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut rows = Vec::new();

    while csv_reader.read_record(&mut record)? {
        let line = record.position().map(|position| position.line()).unwrap_or(0);
        rows.push((line, record.deserialize(Some(&headers))?));
    }

    Ok(rows)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|value| !value.trim().is_empty()))
}
