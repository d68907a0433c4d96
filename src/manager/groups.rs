use std::sync::Arc;

use crate::api::models::Group;
use crate::manager::collection::{DeleteOutcome, PersistentCollection, Record};
use crate::error::{Error, ValidationError};
use crate::ports::{Confirm, LocalCache, RemoteCollection};
use crate::storage::GROUPS_KEY;

impl Record for Group {
    const ID_PREFIX: &'static str = "grp";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

pub fn validate(group: &Group) -> Result<(), ValidationError> {
    if group.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if group.devices.is_empty() {
        return Err(ValidationError::MissingDevices);
    }
    Ok(())
}

pub struct GroupCatalog {
    store: PersistentCollection<Group>,
}

impl GroupCatalog {
    pub fn new(remote: Arc<dyn RemoteCollection<Group>>, cache: Arc<dyn LocalCache>) -> Self {
        Self {
            store: PersistentCollection::new(GROUPS_KEY, Vec::new(), remote, cache),
        }
    }

    pub fn groups(&self) -> &[Group] {
        self.store.items()
    }

    pub fn get(&self, id: &str) -> Option<&Group> {
        self.store.get(id)
    }

    pub async fn load(&mut self) {
        self.store.load().await;
    }

    pub async fn save(&mut self, group: Group) -> Result<Group, ValidationError> {
        validate(&group)?;
        Ok(self.store.save(group).await)
    }

    /// Flips `device` in the stored group and persists the result. Unlike an
    /// editor save this always applies, even when it leaves the group empty.
    pub async fn toggle_membership(&mut self, group_id: &str, device: &str) -> Result<Group, Error> {
        let group = self
            .store
            .get(group_id)
            .cloned()
            .ok_or_else(|| Error::UnknownGroup(group_id.to_string()))?;
        Ok(self.store.save(group.toggled(device)).await)
    }

    pub async fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> DeleteOutcome {
        self.store.delete(id, confirm).await
    }
}
