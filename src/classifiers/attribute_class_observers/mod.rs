mod ebst_numeric_attribute_class_observer;
mod gaussian_numeric_attribute_class_observer;
mod greenwald_khanna_numeric_attribute_class_observer;
mod numeric_attribute_observer;
mod vfml_numeric_attribute_class_observer;

pub use ebst_numeric_attribute_class_observer::{
    EbstMode, EbstNumericAttributeClassObserver, standard_deviation_reduction,
};
pub use gaussian_numeric_attribute_class_observer::GaussianNumericAttributeClassObserver;
pub use greenwald_khanna_numeric_attribute_class_observer::GreenwaldKhannaNumericAttributeClassObserver;
pub use numeric_attribute_observer::NumericAttributeObserver;
pub use vfml_numeric_attribute_class_observer::VfmlNumericAttributeClassObserver;
