//! Record validation and normalization
//!
//! Validation is a non-raising shape check: a record that is not an
//! element or is missing a required field is a filtering signal, skipped
//! by the caller. Transformation raises: a well-shaped record with a
//! semantically invalid field is a defect worth reporting.

use crate::error::IngestError;
use crate::xml::XmlNode;
use vcat_common::db::{Make, VehicleType};

/// Shape check for a raw make record: element with both fields present.
/// Empty values are acceptable at this stage.
pub fn validate_make_data(node: &XmlNode) -> bool {
    node.is_element() && node.get("Make_ID").is_some() && node.get("Make_Name").is_some()
}

/// Shape check for a raw vehicle type record
pub fn validate_vehicle_type_data(node: &XmlNode) -> bool {
    node.is_element()
        && node.get("VehicleTypeId").is_some()
        && node.get("VehicleTypeName").is_some()
}

/// Normalize a validated make record.
///
/// The identifier must parse as a base-10 integer; the name is coerced
/// to text, trimmed, and must be non-empty.
pub fn transform_make(node: &XmlNode) -> Result<Make, IngestError> {
    let raw_id = field_text(node, "Make_ID");
    let make_id: i64 = raw_id.trim().parse().map_err(|_| {
        IngestError::Transformation(format!("Invalid Make_ID: {}", raw_id))
    })?;

    let raw_name = field_text(node, "Make_Name");
    let make_name = raw_name.trim();
    if make_name.is_empty() {
        return Err(IngestError::Transformation(format!(
            "Empty Make_Name for Make_ID: {}",
            make_id
        )));
    }

    Ok(Make {
        make_id,
        make_name: make_name.to_string(),
    })
}

/// Normalize a validated vehicle type record
pub fn transform_vehicle_type(node: &XmlNode) -> Result<VehicleType, IngestError> {
    let raw_id = field_text(node, "VehicleTypeId");
    let type_id: i64 = raw_id.trim().parse().map_err(|_| {
        IngestError::Transformation(format!("Invalid VehicleTypeId: {}", raw_id))
    })?;

    let raw_name = field_text(node, "VehicleTypeName");
    let type_name = raw_name.trim();
    if type_name.is_empty() {
        return Err(IngestError::Transformation(format!(
            "Empty VehicleTypeName for VehicleTypeId: {}",
            type_id
        )));
    }

    Ok(VehicleType {
        type_id,
        type_name: type_name.to_string(),
    })
}

/// Text form of a field, whatever shape it decoded to
fn field_text(node: &XmlNode, key: &str) -> String {
    node.get(key).map(XmlNode::flattened_text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(fields: &[(&str, &str)]) -> XmlNode {
        let mut map = BTreeMap::new();
        for (key, value) in fields {
            map.insert(key.to_string(), XmlNode::Text(value.to_string()));
        }
        XmlNode::Element(map)
    }

    #[test]
    fn transform_make_trims_and_parses() {
        let make = transform_make(&record(&[
            ("Make_ID", "123"),
            ("Make_Name", "  Toyota  "),
        ]))
        .unwrap();

        assert_eq!(make.make_id, 123);
        assert_eq!(make.make_name, "Toyota");
    }

    #[test]
    fn transform_make_rejects_non_integer_id() {
        let err = transform_make(&record(&[("Make_ID", "abc"), ("Make_Name", "Toyota")]))
            .unwrap_err();

        match err {
            IngestError::Transformation(msg) => assert!(msg.contains("abc"), "got: {}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn transform_make_rejects_blank_name() {
        let err = transform_make(&record(&[("Make_ID", "123"), ("Make_Name", "   ")]))
            .unwrap_err();

        match err {
            IngestError::Transformation(msg) => assert!(msg.contains("123"), "got: {}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn transform_make_coerces_numeric_looking_name() {
        // A numeric name is still a name once coerced to text
        let make = transform_make(&record(&[("Make_ID", "9"), ("Make_Name", "4707")])).unwrap();
        assert_eq!(make.make_name, "4707");
    }

    #[test]
    fn validate_rejects_non_element_and_missing_fields() {
        assert!(!validate_make_data(&XmlNode::Text("scalar".to_string())));
        assert!(!validate_make_data(&XmlNode::List(vec![])));
        assert!(!validate_make_data(&record(&[("Make_ID", "1")])));
        assert!(!validate_make_data(&record(&[("Make_Name", "Toyota")])));
        assert!(!validate_make_data(&XmlNode::Element(BTreeMap::new())));
    }

    #[test]
    fn validate_accepts_empty_string_fields() {
        // Empty is a transformation concern, not a shape concern
        assert!(validate_make_data(&record(&[
            ("Make_ID", ""),
            ("Make_Name", ""),
        ])));
    }

    #[test]
    fn vehicle_type_mirrors_make_semantics() {
        let vt = transform_vehicle_type(&record(&[
            ("VehicleTypeId", "2"),
            ("VehicleTypeName", " Passenger Car "),
        ]))
        .unwrap();
        assert_eq!(vt.type_id, 2);
        assert_eq!(vt.type_name, "Passenger Car");

        assert!(validate_vehicle_type_data(&record(&[
            ("VehicleTypeId", "2"),
            ("VehicleTypeName", ""),
        ])));
        assert!(!validate_vehicle_type_data(&record(&[("VehicleTypeId", "2")])));

        let err = transform_vehicle_type(&record(&[
            ("VehicleTypeId", "x7"),
            ("VehicleTypeName", "Truck"),
        ]))
        .unwrap_err();
        match err {
            IngestError::Transformation(msg) => assert!(msg.contains("x7")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
