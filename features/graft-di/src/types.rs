use std::{any::Any, fmt, sync::Arc};

/// All user-supplied construction steps fail with a boxed error
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Resolved objects are shared, type-erased values.
///
/// The engine never inspects an object beyond its [`std::any::TypeId`];
/// everything else it needs comes from the metadata registry.
pub type Object = Arc<dyn Any + Send + Sync>;

/// A resolved object together with the concrete class it was produced under
#[derive(Clone)]
pub struct Instance {
    class: Arc<str>,
    value: Object,
}

impl Instance {
    pub fn new(class: impl Into<Arc<str>>, value: Object) -> Self {
        Instance {
            class: class.into(),
            value,
        }
    }

    /// Wraps a plain value, erasing its type
    pub fn of<T: Send + Sync + 'static>(class: impl Into<Arc<str>>, value: T) -> Self {
        Instance {
            class: class.into(),
            value: Arc::new(value),
        }
    }

    /// The concrete class this instance was produced under
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn value(&self) -> &Object {
        &self.value
    }

    pub fn into_value(self) -> Object {
        self.value
    }

    /// Attempts to view the instance as a `T`, returning the actual class
    /// name on mismatch
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, &str> {
        match Arc::downcast::<T>(self.value.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.class()),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.class).finish()
    }
}
