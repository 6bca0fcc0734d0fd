mod attribute_split_suggestion;

pub use attribute_split_suggestion::AttributeSplitSuggestion;
pub use instance_conditional_test::InstanceConditionalTest;
pub(crate) use instance_conditional_test::observed_value;
pub use nominal_attribute_binary_test::NominalAttributeBinaryTest;
pub use nominal_attribute_multiway_test::NominalAttributeMultiwayTest;
pub use numeric_attribute_binary_test::NumericAttributeBinaryTest;
