//! Ordered set of module candidates.
//!
//! Decode tries candidates in registration order. The catch-all, if any,
//! always sits after every regular candidate.

use tracing::debug;

use super::module::Protocol;
use super::schema::ProtocolSchema;
use crate::protocols;

pub struct Registry {
    protocols: Vec<Box<dyn Protocol>>,
    catch_all: Option<usize>,
}

#[derive(Default)]
pub struct RegistryBuilder {
    protocols: Vec<Box<dyn Protocol>>,
    catch_all: Option<Box<dyn Protocol>>,
}

impl RegistryBuilder {
    pub fn register<P: Protocol + 'static>(mut self, protocol: P) -> Self {
        self.protocols.push(Box::new(protocol));
        self
    }

    /// Set the terminal module tried after every other candidate.
    pub fn catch_all<P: Protocol + 'static>(mut self, protocol: P) -> Self {
        self.catch_all = Some(Box::new(protocol));
        self
    }

    pub fn build(self) -> Registry {
        let mut protocols = self.protocols;
        let catch_all = self.catch_all.map(|protocol| {
            protocols.push(protocol);
            protocols.len() - 1
        });
        debug!(
            count = protocols.len(),
            catch_all = catch_all.is_some(),
            "module registry built"
        );
        Registry {
            protocols,
            catch_all,
        }
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Protocol> {
        self.protocols.get(index).map(|protocol| &**protocol)
    }

    /// Registry index of the protocol with `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.protocols.iter().position(|protocol| protocol.id() == id)
    }

    pub fn catch_all(&self) -> Option<usize> {
        self.catch_all
    }

    /// Candidates in decode order, catch-all last.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Protocol> {
        self.protocols.iter().map(|protocol| &**protocol)
    }

    pub fn schemas(&self) -> Vec<ProtocolSchema<'_>> {
        self.iter()
            .map(|protocol| ProtocolSchema::new(protocol.id(), protocol.name(), protocol.schema()))
            .collect()
    }

    pub fn schema(&self, id: &str) -> Option<ProtocolSchema<'_>> {
        self.position(id)
            .and_then(|index| self.get(index))
            .map(|protocol| ProtocolSchema::new(protocol.id(), protocol.name(), protocol.schema()))
    }
}

impl Default for Registry {
    /// Every reference protocol, with raw data as the catch-all.
    fn default() -> Self {
        protocols::register_reference(Registry::builder()).build()
    }
}
