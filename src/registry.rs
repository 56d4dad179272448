//! Link registry
//!
//! Content-addressed store for links. A link is identified by its unordered
//! endpoint pair, and an interface holds at most one link at a time. All link
//! lifecycle flows through this registry so those invariants hold at every
//! observation point.

use std::collections::HashMap;

use tracing::debug;

use crate::entities::Link;
use crate::errors::{Result, TopologyError};
use crate::value_objects::{InterfaceId, LinkId, Metadata};

/// Registry of links, keyed by content-addressed `LinkId`.
///
/// Every instance owns freshly-initialized collections; registries never
/// share state.
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    links: HashMap<LinkId, Link>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
        }
    }

    /// Return the existing link connecting this unordered pair, or construct
    /// and register a new one. Idempotent under either argument order.
    ///
    /// Fails with `InvalidState` if either endpoint is already held by a
    /// different link.
    pub fn get_or_create(&mut self, a: &InterfaceId, b: &InterfaceId) -> Result<&Link> {
        let id = LinkId::new(a, b);
        if !self.links.contains_key(&id) {
            if let Some(held) = self
                .links
                .values()
                .find(|link| link.has_endpoint(a) || link.has_endpoint(b))
            {
                return Err(TopologyError::InvalidState(format!(
                    "an endpoint of ({a}, {b}) is already connected by link {}",
                    held.id()
                )));
            }
            debug!(link = %id, "registering new link");
            self.links
                .insert(id.clone(), Link::new(a.clone(), b.clone()));
        }
        Ok(&self.links[&id])
    }

    /// The link currently attached to an interface, if any
    pub fn find(&self, interface: &InterfaceId) -> Option<&Link> {
        self.links
            .values()
            .find(|link| link.has_endpoint(interface))
    }

    pub fn get(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    /// Remove a link by id. Unknown ids are an error, never a silent no-op.
    pub fn remove(&mut self, id: &LinkId) -> Result<Link> {
        self.links
            .remove(id)
            .ok_or_else(|| TopologyError::LinkNotFound(id.to_string()))
    }

    /// Cascade primitive: detach every link touching an interface. Returns
    /// the removed links (possibly none).
    pub fn remove_all_touching(&mut self, interface: &InterfaceId) -> Vec<Link> {
        let ids: Vec<LinkId> = self
            .links
            .iter()
            .filter(|(_, link)| link.has_endpoint(interface))
            .map(|(id, _)| id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| {
                debug!(link = %id, interface = %interface, "detaching link");
                self.links.remove(id)
            })
            .collect()
    }

    /// Create a link with the given metadata. With `force`, any existing link
    /// on either endpoint is detached first (interface roles changed, e.g.
    /// NNI discovery superseding a stale link).
    pub fn set_link(
        &mut self,
        a: &InterfaceId,
        b: &InterfaceId,
        metadata: Metadata,
        force: bool,
    ) -> Result<LinkId> {
        if force {
            self.remove_all_touching(a);
            self.remove_all_touching(b);
        }
        let id = self.get_or_create(a, b)?.id();
        if let Some(link) = self.links.get_mut(&id) {
            link.metadata_mut().extend(metadata);
        }
        Ok(id)
    }

    pub fn enable(&mut self, id: &LinkId) -> Result<()> {
        self.link_mut(id)?.set_enabled(true);
        Ok(())
    }

    pub fn disable(&mut self, id: &LinkId) -> Result<()> {
        self.link_mut(id)?.set_enabled(false);
        Ok(())
    }

    /// Flip the active flag on the link attached to an interface, if any.
    /// Returns whether a link was updated.
    pub fn set_active_on(&mut self, interface: &InterfaceId, active: bool) -> bool {
        let id = match self.find(interface) {
            Some(link) => link.id(),
            None => return false,
        };
        if let Some(link) = self.links.get_mut(&id) {
            link.set_active(active);
            true
        } else {
            false
        }
    }

    pub fn metadata(&self, id: &LinkId) -> Result<&Metadata> {
        self.links
            .get(id)
            .map(Link::metadata)
            .ok_or_else(|| TopologyError::LinkNotFound(id.to_string()))
    }

    /// Merge new metadata entries, overwriting existing keys
    pub fn extend_metadata(&mut self, id: &LinkId, metadata: Metadata) -> Result<()> {
        self.link_mut(id)?.metadata_mut().extend(metadata);
        Ok(())
    }

    /// Remove a metadata key. Returns `false` if the key was never set.
    pub fn remove_metadata_key(&mut self, id: &LinkId, key: &str) -> Result<bool> {
        Ok(self.link_mut(id)?.metadata_mut().remove(key).is_some())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    fn link_mut(&mut self, id: &LinkId) -> Result<&mut Link> {
        self.links
            .get_mut(id)
            .ok_or_else(|| TopologyError::LinkNotFound(id.to_string()))
    }
}
