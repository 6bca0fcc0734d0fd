use crate::core::attributes::Attribute;
use std::any::Any;

#[derive(Clone, Debug)]
pub struct NumericAttribute {
    pub name: String,
}

impl NumericAttribute {
    pub fn new(name: String) -> NumericAttribute {
        NumericAttribute { name }
    }
}

impl Attribute for NumericAttribute {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_attribute_is_not_nominal() {
        let attr = NumericAttribute::new("temperature".to_string());
        assert!(!attr.is_nominal());
        assert_eq!(attr.number_of_values(), None);
        assert_eq!(attr.name(), "temperature");
    }
}
