// src/config/schema.rs
use serde::{Serialize, Deserialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Placeholder substituted with the additional name in file name templates.
pub const NAME_SLOT: &str = "{0}";

pub const XML_EXTENSION: &str = ".xml";
pub const JSON_EXTENSION: &str = ".json";

/// Storage role of a save file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Bundled, read-mostly data shipped with the application.
    Default,
    /// Writable per-user data.
    External,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Default => "default",
            Role::External => "external",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in serialization format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Xml,
    Json,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Xml => XML_EXTENSION,
            Format::Json => JSON_EXTENSION,
        }
    }
}

/// Naming and path policy shared by save handlers.
///
/// Everything here is a pure function of the configured fields; no method
/// touches the filesystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamingPolicy {
    pub format: Format,
    pub default_base_name: String,
    pub external_base_name: String,
    pub folder_name: String,
    pub default_root: PathBuf,
    pub external_root: PathBuf,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            format: Format::Xml,
            default_base_name: "DLS_{0}".to_string(),
            external_base_name: "PLS_{0}".to_string(),
            folder_name: "Data".to_string(),
            default_root: PathBuf::new(),
            external_root: PathBuf::new(),
        }
    }
}

impl NamingPolicy {
    pub fn new(default_root: impl Into<PathBuf>, external_root: impl Into<PathBuf>) -> Self {
        Self {
            default_root: default_root.into(),
            external_root: external_root.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_base_names(mut self, default_base_name: &str, external_base_name: &str) -> Self {
        self.default_base_name = default_base_name.to_string();
        self.external_base_name = external_base_name.to_string();
        self
    }

    pub fn with_folder_name(mut self, folder_name: &str) -> Self {
        self.folder_name = folder_name.to_string();
        self
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn root(&self, role: Role) -> &Path {
        match role {
            Role::Default => &self.default_root,
            Role::External => &self.external_root,
        }
    }

    /// Directory holding the files of `role`: the role's root joined with
    /// the folder name.
    pub fn resolve_root(&self, role: Role) -> PathBuf {
        self.root(role).join(&self.folder_name)
    }

    /// File name for `additional_name` in `role`.
    ///
    /// The name is inserted verbatim. Path separators or other unsafe
    /// characters in `additional_name` are the caller's problem.
    pub fn file_name(&self, additional_name: &str, role: Role, with_extension: bool) -> String {
        let template = match role {
            Role::Default => &self.default_base_name,
            Role::External => &self.external_base_name,
        };

        let mut name = template.replace(NAME_SLOT, additional_name);
        if with_extension {
            name.push_str(self.extension());
        }
        name
    }

    pub fn full_path(&self, additional_name: &str, role: Role, with_extension: bool) -> PathBuf {
        self.resolve_root(role)
            .join(self.file_name(additional_name, role, with_extension))
    }

    /// True when both roles resolve to the same root, which would turn
    /// seeding into a copy of a file onto itself.
    pub fn roots_collide(&self) -> bool {
        self.default_root == self.external_root
    }
}
