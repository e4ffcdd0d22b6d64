use std::{
    any::{type_name, Any},
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, RwLock,
    },
};

use log::{debug, info};

use crate::{
    types::{ObjectId, INVALID_ID},
    versioned::Serializable,
};

use super::error::SessionError;

type SharedObject = Arc<dyn Any + Send + Sync>;

/// Hands out network-visible ids for the objects of one session and
/// resolves them back to the shared instance.
///
/// The registry is shared between the issuing thread and the network thread
/// that resolves ids found in inbound packets.
pub struct ObjectRegistry {
    next_id: AtomicU32,
    objects: RwLock<HashMap<ObjectId, (&'static str, SharedObject)>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `object` and returns its new id
    pub fn register_object<T: Any + Send + Sync>(
        &self,
        object: Arc<T>,
    ) -> Result<ObjectId, SessionError> {
        let object_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if object_id == INVALID_ID {
            return Err(SessionError::IdsExhausted);
        }

        let kind = short_type_name::<T>();
        info!("ObjectRegistry: Registering {} as {}", kind, object_id);

        self.objects
            .write()
            .map_err(|_| SessionError::LockPoisoned)?
            .insert(object_id, (kind, object));
        Ok(object_id)
    }

    /// Registers a replicated object after checking its dirty-bit layout
    pub fn register_versioned<T: Serializable>(
        &self,
        object: Arc<T>,
    ) -> Result<ObjectId, SessionError> {
        T::LAYOUT.validate()?;
        self.register_object(object)
    }

    pub fn deregister_object(&self, object_id: ObjectId) -> Result<(), SessionError> {
        let removed = self
            .objects
            .write()
            .map_err(|_| SessionError::LockPoisoned)?
            .remove(&object_id);

        match removed {
            Some((kind, _)) => {
                info!("ObjectRegistry: Deregistering {} {}", kind, object_id);
                Ok(())
            }
            None => Err(SessionError::UnknownObject { object_id }),
        }
    }

    pub fn get_object<T: Any + Send + Sync>(&self, object_id: ObjectId) -> Option<Arc<T>> {
        self.try_get_object(object_id).ok()
    }

    pub fn try_get_object<T: Any + Send + Sync>(
        &self,
        object_id: ObjectId,
    ) -> Result<Arc<T>, SessionError> {
        let object = self
            .objects
            .read()
            .map_err(|_| SessionError::LockPoisoned)?
            .get(&object_id)
            .map(|(_, object)| object.clone())
            .ok_or(SessionError::UnknownObject { object_id })?;

        object.downcast::<T>().map_err(|_| {
            debug!("ObjectRegistry: {} is not a {}", object_id, type_name::<T>());
            SessionError::WrongType {
                object_id,
                expected: short_type_name::<T>(),
            }
        })
    }

    pub fn contains(&self, object_id: ObjectId) -> bool {
        self.objects
            .read()
            .map(|objects| objects.contains_key(&object_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn short_type_name<T>() -> &'static str {
    let name = type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}
