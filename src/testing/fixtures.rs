use crate::core::attributes::{AttributeRef, NominalAttribute, NumericAttribute};
use crate::core::instance_header::InstanceHeader;
use std::sync::Arc;

pub fn nominal(name: &str, labels: &[&str]) -> AttributeRef {
    Arc::new(NominalAttribute::with_values(
        name.to_string(),
        labels.iter().map(|l| l.to_string()).collect(),
    ))
}

pub fn numeric(name: &str) -> AttributeRef {
    Arc::new(NumericAttribute::new(name.to_string()))
}

pub fn header_from_columns(columns: Vec<AttributeRef>, class_index: usize) -> Arc<InstanceHeader> {
    Arc::new(InstanceHeader::new("test".to_string(), columns, class_index))
}
