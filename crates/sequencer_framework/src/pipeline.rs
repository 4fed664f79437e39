//! Pipeline assembly.
//!
//! A [`Pipeline`] collects the components of one job in registration
//! order. Component indices are assigned readers first, then algorithms,
//! then writers, counting from zero; the index feeds random seed
//! derivation, so reordering components changes their random streams.

use std::fmt;
use std::sync::Arc;

use crate::component::{Algorithm, ContextDecorator, Reader, Service, Writer};

/// Ordered component lists handed to a [`Sequencer`](crate::Sequencer).
#[derive(Default, Clone)]
pub struct Pipeline {
    pub(crate) services: Vec<Arc<dyn Service>>,
    pub(crate) decorators: Vec<Arc<dyn ContextDecorator>>,
    pub(crate) readers: Vec<Arc<dyn Reader>>,
    pub(crate) algorithms: Vec<Arc<dyn Algorithm>>,
    pub(crate) writers: Vec<Arc<dyn Writer>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service.
    #[must_use]
    pub fn add_service(mut self, service: Arc<dyn Service>) -> Self {
        self.services.push(service);
        self
    }

    /// Register a context decorator. Decorators run in registration order.
    #[must_use]
    pub fn add_decorator(mut self, decorator: Arc<dyn ContextDecorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Register a reader.
    #[must_use]
    pub fn add_reader(mut self, reader: Arc<dyn Reader>) -> Self {
        self.readers.push(reader);
        self
    }

    /// Append an algorithm after all previously registered ones.
    #[must_use]
    pub fn append_algorithm(mut self, algorithm: Arc<dyn Algorithm>) -> Self {
        self.algorithms.push(algorithm);
        self
    }

    /// Insert an algorithm before all previously registered ones.
    #[must_use]
    pub fn prepend_algorithm(mut self, algorithm: Arc<dyn Algorithm>) -> Self {
        self.algorithms.insert(0, algorithm);
        self
    }

    /// Register a writer.
    #[must_use]
    pub fn add_writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writers.push(writer);
        self
    }

    /// Returns `true` if no reader, algorithm, or writer is registered.
    #[must_use]
    pub fn has_no_components(&self) -> bool {
        self.readers.is_empty() && self.algorithms.is_empty() && self.writers.is_empty()
    }

    /// Component index of the algorithm at `position`.
    #[must_use]
    pub fn algorithm_index(&self, position: usize) -> usize {
        self.readers.len() + position
    }

    /// Component index of the writer at `position`.
    #[must_use]
    pub fn writer_index(&self, position: usize) -> usize {
        self.readers.len() + self.algorithms.len() + position
    }

    /// Names of all readers, algorithms, and writers in component index order.
    #[must_use]
    pub fn component_names(&self) -> Vec<String> {
        self.readers
            .iter()
            .map(|r| r.name().to_string())
            .chain(self.algorithms.iter().map(|a| a.name().to_string()))
            .chain(self.writers.iter().map(|w| w.name().to_string()))
            .collect()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services: Vec<&str> = self.services.iter().map(|s| s.name()).collect();
        let decorators: Vec<&str> = self.decorators.iter().map(|d| d.name()).collect();
        let readers: Vec<&str> = self.readers.iter().map(|r| r.name()).collect();
        let algorithms: Vec<&str> = self.algorithms.iter().map(|a| a.name()).collect();
        let writers: Vec<&str> = self.writers.iter().map(|w| w.name()).collect();
        f.debug_struct("Pipeline")
            .field("services", &services)
            .field("decorators", &decorators)
            .field("readers", &readers)
            .field("algorithms", &algorithms)
            .field("writers", &writers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use crate::process_code::{ProcessCode, ProcessResult};

    struct Named(&'static str);

    impl Reader for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn read(&self, _context: &RunContext<'_>) -> ProcessResult {
            Ok(ProcessCode::Success)
        }
    }

    impl Algorithm for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn execute(&self, _context: &RunContext<'_>) -> ProcessResult {
            Ok(ProcessCode::Success)
        }
    }

    impl Writer for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn write(&self, _context: &RunContext<'_>) -> ProcessResult {
            Ok(ProcessCode::Success)
        }
    }

    #[test]
    fn test_empty_pipeline() {
        assert!(Pipeline::new().has_no_components());
    }

    #[test]
    fn test_component_index_order() {
        let pipeline = Pipeline::new()
            .add_writer(Arc::new(Named("w")))
            .append_algorithm(Arc::new(Named("a2")))
            .add_reader(Arc::new(Named("r")))
            .prepend_algorithm(Arc::new(Named("a1")));
        assert_eq!(pipeline.component_names(), vec!["r", "a1", "a2", "w"]);
        assert_eq!(pipeline.algorithm_index(1), 2);
        assert_eq!(pipeline.writer_index(0), 3);
    }

    #[test]
    fn test_debug_lists_names() {
        let pipeline = Pipeline::new().add_reader(Arc::new(Named("gun")));
        assert!(format!("{pipeline:?}").contains("gun"));
    }
}
