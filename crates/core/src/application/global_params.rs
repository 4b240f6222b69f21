// Global POST parameter store
//
// Values set here are sent with every POST request of the owning manager
// (unless a request opts out). Batches read a snapshot taken at admission.

use indexmap::IndexMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::error::{ManagerError, Result};

#[derive(Debug, Default)]
pub struct GlobalPostParams {
    params: RwLock<IndexMap<String, String>>,
}

impl GlobalPostParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) a parameter
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        if is_blank(name) || is_blank(value) {
            return Err(ManagerError::InvalidArgument(
                "parameter name and value must be non empty strings".into(),
            ));
        }
        debug!(param = %name, "Global POST parameter set");
        self.params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        ensure_name(name)?;
        Ok(self
            .params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name))
    }

    pub fn get(&self, name: &str) -> Result<String> {
        ensure_name(name)?;
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::NotFound(format!("parameter does not exist: {}", name)))
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        ensure_name(name)?;
        self.params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(name)
            .map(|_| debug!(param = %name, "Global POST parameter deleted"))
            .ok_or_else(|| ManagerError::NotFound(format!("parameter does not exist: {}", name)))
    }

    pub fn len(&self) -> usize {
        self.params.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consistent copy in insertion order
    pub fn snapshot(&self) -> IndexMap<String, String> {
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn ensure_name(name: &str) -> Result<()> {
    if is_blank(name) {
        return Err(ManagerError::InvalidArgument(
            "parameter name must be a non empty string".into(),
        ));
    }
    Ok(())
}
