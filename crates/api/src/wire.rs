//! Response shapes of the resource-detail endpoints and their mapping onto [`RawField`].

use rescat_types::{DataType, RawField};
use serde::Deserialize;

/// Paged list envelope used by the list endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Entries<T> {
    #[serde(default = "Vec::new")]
    pub entries: Vec<T>,
}

/// Column of a data view as reported by the data-view module.
#[derive(Debug, Deserialize)]
pub(crate) struct DataViewField {
    pub id: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub technical_name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub data_length: Option<u32>,
    #[serde(default)]
    pub data_accuracy: Option<u32>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

impl DataViewField {
    pub fn into_raw_field(self, resource_id: &str) -> RawField {
        RawField {
            id: self.id,
            resource_id: resource_id.to_string(),
            business_name: self.business_name,
            technical_name: self.technical_name,
            data_type: non_empty_type(&self.data_type),
            data_length: self.data_length,
            data_precision: self.data_accuracy,
            primary_key: self.primary_key,
            description: self.comment,
        }
    }
}

/// Detail of a registered interface; only its response parameters become fields.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiDetail {
    #[serde(default)]
    pub response_params: Vec<ApiParameter>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiParameter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub cn_name: String,
    #[serde(default)]
    pub en_name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub data_length: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiParameter {
    /// Parameters without a server id are keyed by `<resource>:<en_name>` so mappings stay stable.
    pub fn into_raw_field(self, resource_id: &str) -> RawField {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{}:{}", resource_id, self.en_name));
        RawField {
            id,
            resource_id: resource_id.to_string(),
            business_name: self.cn_name,
            technical_name: self.en_name,
            data_type: non_empty_type(&self.data_type),
            data_length: self.data_length,
            data_precision: None,
            primary_key: false,
            description: self.description,
        }
    }
}

fn non_empty_type(raw: &str) -> Option<DataType> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(DataType::from_source_type(raw))
    }
}

/// Response of the create endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedId {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_view_fields_map_types_and_precision() {
        let json = r#"{"entries":[{"id":"f1","business_name":"金额","technical_name":"amount","data_type":"numeric(12,2)","data_length":12,"data_accuracy":2}]}"#;
        let parsed: Entries<DataViewField> = serde_json::from_str(json).expect("parse fields");
        let field = parsed.entries.into_iter().next().expect("one field").into_raw_field("view-1");
        assert_eq!(field.resource_id, "view-1");
        assert_eq!(field.data_type, Some(DataType::Decimal));
        assert_eq!(field.data_precision, Some(2));
    }

    #[test]
    fn api_parameters_without_id_get_a_stable_one() {
        let parameter = ApiParameter {
            id: None,
            cn_name: "证件号".into(),
            en_name: "id_card".into(),
            data_type: String::new(),
            data_length: None,
            description: None,
        };
        let field = parameter.into_raw_field("api-7");
        assert_eq!(field.id, "api-7:id_card");
        assert_eq!(field.data_type, None);
    }
}
