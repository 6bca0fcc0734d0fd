use crate::core::instances::Instance;
use std::io::{Error, ErrorKind};

/// Header-free instance for exercising routing and learning code.
#[derive(Clone, Debug)]
pub struct MockInstance {
    pub values: Vec<f64>,
    pub class_idx: usize,
    pub num_classes: usize,
    pub weight: f64,
}

impl MockInstance {
    pub fn new(values: Vec<f64>, class_idx: usize, weight: f64) -> Self {
        Self {
            values,
            class_idx,
            num_classes: 2,
            weight,
        }
    }

    pub fn with_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }
}

impl Instance for MockInstance {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn set_weight(&mut self, new_value: f64) -> Result<(), Error> {
        self.weight = new_value;
        Ok(())
    }

    fn value_at_index(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    fn set_value_at_index(&mut self, index: usize, new_value: f64) -> Result<(), Error> {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = new_value;
                Ok(())
            }
            None => Err(Error::new(ErrorKind::InvalidInput, "oob")),
        }
    }

    fn is_missing_at_index(&self, index: usize) -> Result<bool, Error> {
        if index < self.values.len() {
            Ok(self.values[index].is_nan())
        } else {
            Err(Error::new(ErrorKind::InvalidInput, "oob"))
        }
    }

    fn number_of_attributes(&self) -> usize {
        self.values.len()
    }

    fn class_index(&self) -> usize {
        self.class_idx
    }

    fn class_value(&self) -> Option<f64> {
        self.values.get(self.class_idx).copied()
    }

    fn is_class_missing(&self) -> bool {
        self.class_value().is_none_or(f64::is_nan)
    }

    fn number_of_classes(&self) -> usize {
        self.num_classes
    }

    fn to_vec(&self) -> Vec<f64> {
        self.values.clone()
    }
}
