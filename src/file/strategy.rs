// src/file/strategy.rs
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use crate::config::{NamingPolicy, Role};

/// Custom save function: receives the data, the handler's policy and the
/// additional name, and owns all I/O for the call.
pub type SaveFn<T> = Arc<dyn Fn(&T, &NamingPolicy, &str) -> Result<()> + Send + Sync>;

/// Custom load function: receives the handler's policy and the additional
/// name.
pub type LoadFn<T> = Arc<dyn Fn(&NamingPolicy, &str) -> Result<T> + Send + Sync>;

/// How a [`SaveHandler`](super::SaveHandler) turns data into files.
pub enum Strategy<T> {
    /// Encode with the codec selected by the policy's format.
    Builtin,
    /// Hand every call to caller-supplied functions.
    Custom(CustomStrategy<T>),
}

impl<T> Default for Strategy<T> {
    fn default() -> Self {
        Strategy::Builtin
    }
}

impl<T> Clone for Strategy<T> {
    fn clone(&self) -> Self {
        match self {
            Strategy::Builtin => Strategy::Builtin,
            Strategy::Custom(custom) => Strategy::Custom(custom.clone()),
        }
    }
}

impl<T> fmt::Debug for Strategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Builtin => f.write_str("Builtin"),
            Strategy::Custom(custom) => f.debug_tuple("Custom").field(custom).finish(),
        }
    }
}

/// Up to four caller-supplied functions, one per operation and role.
/// Unset slots are reported as not configured when used.
pub struct CustomStrategy<T> {
    save_default: Option<SaveFn<T>>,
    save_external: Option<SaveFn<T>>,
    load_default: Option<LoadFn<T>>,
    load_external: Option<LoadFn<T>>,
}

impl<T> Default for CustomStrategy<T> {
    fn default() -> Self {
        Self {
            save_default: None,
            save_external: None,
            load_default: None,
            load_external: None,
        }
    }
}

impl<T> Clone for CustomStrategy<T> {
    fn clone(&self) -> Self {
        Self {
            save_default: self.save_default.clone(),
            save_external: self.save_external.clone(),
            load_default: self.load_default.clone(),
            load_external: self.load_external.clone(),
        }
    }
}

impl<T> fmt::Debug for CustomStrategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomStrategy")
            .field("save_default", &self.save_default.is_some())
            .field("save_external", &self.save_external.is_some())
            .field("load_default", &self.load_default.is_some())
            .field("load_external", &self.load_external.is_some())
            .finish()
    }
}

impl<T> CustomStrategy<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_save<F>(mut self, role: Role, f: F) -> Self
    where
        F: Fn(&T, &NamingPolicy, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.set_save(role, f);
        self
    }

    pub fn on_load<F>(mut self, role: Role, f: F) -> Self
    where
        F: Fn(&NamingPolicy, &str) -> Result<T> + Send + Sync + 'static,
    {
        self.set_load(role, f);
        self
    }

    pub fn on_save_default<F>(self, f: F) -> Self
    where
        F: Fn(&T, &NamingPolicy, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.on_save(Role::Default, f)
    }

    pub fn on_save_external<F>(self, f: F) -> Self
    where
        F: Fn(&T, &NamingPolicy, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.on_save(Role::External, f)
    }

    pub fn on_load_default<F>(self, f: F) -> Self
    where
        F: Fn(&NamingPolicy, &str) -> Result<T> + Send + Sync + 'static,
    {
        self.on_load(Role::Default, f)
    }

    pub fn on_load_external<F>(self, f: F) -> Self
    where
        F: Fn(&NamingPolicy, &str) -> Result<T> + Send + Sync + 'static,
    {
        self.on_load(Role::External, f)
    }

    pub fn set_save<F>(&mut self, role: Role, f: F)
    where
        F: Fn(&T, &NamingPolicy, &str) -> Result<()> + Send + Sync + 'static,
    {
        let f: SaveFn<T> = Arc::new(f);
        match role {
            Role::Default => self.save_default = Some(f),
            Role::External => self.save_external = Some(f),
        }
    }

    pub fn set_load<F>(&mut self, role: Role, f: F)
    where
        F: Fn(&NamingPolicy, &str) -> Result<T> + Send + Sync + 'static,
    {
        let f: LoadFn<T> = Arc::new(f);
        match role {
            Role::Default => self.load_default = Some(f),
            Role::External => self.load_external = Some(f),
        }
    }

    pub fn clear(&mut self, role: Role) {
        match role {
            Role::Default => {
                self.save_default = None;
                self.load_default = None;
            }
            Role::External => {
                self.save_external = None;
                self.load_external = None;
            }
        }
    }

    pub fn save_fn(&self, role: Role) -> Option<&SaveFn<T>> {
        match role {
            Role::Default => self.save_default.as_ref(),
            Role::External => self.save_external.as_ref(),
        }
    }

    pub fn load_fn(&self, role: Role) -> Option<&LoadFn<T>> {
        match role {
            Role::Default => self.load_default.as_ref(),
            Role::External => self.load_external.as_ref(),
        }
    }
}
