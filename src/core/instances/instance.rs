use std::io::Error;

pub trait Instance {
    fn weight(&self) -> f64;
    fn set_weight(&mut self, new_value: f64) -> Result<(), Error>;
    fn value_at_index(&self, index: usize) -> Option<f64>;
    fn set_value_at_index(&mut self, index: usize, new_value: f64) -> Result<(), Error>;
    fn is_missing_at_index(&self, index: usize) -> Result<bool, Error>;
    fn number_of_attributes(&self) -> usize;
    fn class_index(&self) -> usize;
    fn class_value(&self) -> Option<f64>;
    fn is_class_missing(&self) -> bool;
    fn number_of_classes(&self) -> usize;
    fn to_vec(&self) -> Vec<f64>;
}
