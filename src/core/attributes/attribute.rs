use super::NominalAttribute;
use std::any::Any;
use std::sync::Arc;

pub type AttributeRef = Arc<dyn Attribute + Send + Sync>;

pub trait Attribute: Any + Send + Sync {
    fn name(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    fn is_nominal(&self) -> bool {
        self.as_any().is::<NominalAttribute>()
    }

    /// Number of labels for nominal attributes, `None` for numeric ones.
    fn number_of_values(&self) -> Option<usize> {
        self.as_any()
            .downcast_ref::<NominalAttribute>()
            .map(|nominal| nominal.values.len())
    }
}
