// src/file/handler.rs
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ensure_dir, read_all, write_all, BuiltinCodec, Codec, CustomStrategy, Strategy};
use crate::config::{NamingPolicy, Role};
use crate::error::{Result, SaveError};

/// Result of a successful [`SaveHandler::save`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Built-in strategy wrote the file at this path.
    Written(PathBuf),
    /// The custom save function for the role ran.
    Delegated,
    /// Custom strategy is active but has no save function for the role.
    /// Nothing was written.
    NotConfigured,
}

/// Result of a successful [`SaveHandler::load`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Loaded(T),
    /// Custom strategy is active but has no load function for the role.
    NotConfigured,
}

impl<T> LoadOutcome<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            LoadOutcome::Loaded(data) => Some(data),
            LoadOutcome::NotConfigured => None,
        }
    }

    /// Collapse "not configured" into the type's empty value.
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }
}

/// Result of a successful [`SaveHandler::seed`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The default file was decoded and handed to `save` for the external
    /// role, which reported this outcome.
    Seeded(SaveOutcome),
    /// No default file exists for the name. Nothing was written.
    SourceMissing,
}

/// Saves, loads and seeds values of one type `T` under the paths of a
/// shared [`NamingPolicy`].
pub struct SaveHandler<T> {
    policy: Arc<NamingPolicy>,
    strategy: Strategy<T>,
}

impl<T> fmt::Debug for SaveHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveHandler")
            .field("policy", &self.policy)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl<T> Clone for SaveHandler<T> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            strategy: self.strategy.clone(),
        }
    }
}

impl<T> SaveHandler<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(policy: impl Into<Arc<NamingPolicy>>) -> Self {
        Self::with_strategy(policy, Strategy::Builtin)
    }

    pub fn with_strategy(policy: impl Into<Arc<NamingPolicy>>, strategy: Strategy<T>) -> Self {
        Self {
            policy: policy.into(),
            strategy,
        }
    }

    pub fn policy(&self) -> &Arc<NamingPolicy> {
        &self.policy
    }

    pub fn strategy(&self) -> &Strategy<T> {
        &self.strategy
    }

    pub fn set_strategy(&mut self, strategy: Strategy<T>) {
        self.strategy = strategy;
    }

    pub fn use_builtin(&mut self) {
        self.strategy = Strategy::Builtin;
    }

    pub fn use_custom(&mut self, custom: CustomStrategy<T>) {
        self.strategy = Strategy::Custom(custom);
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.strategy, Strategy::Custom(_))
    }

    /// Custom functions, for assigning slots after construction. `None`
    /// while the built-in strategy is active.
    pub fn custom_mut(&mut self) -> Option<&mut CustomStrategy<T>> {
        match &mut self.strategy {
            Strategy::Custom(custom) => Some(custom),
            Strategy::Builtin => None,
        }
    }

    fn codec(&self) -> BuiltinCodec {
        BuiltinCodec::new(self.policy.format)
    }

    /// Save `data` under `additional_name` in `role`.
    ///
    /// The built-in strategy creates the role's directory when missing and
    /// overwrites any existing file.
    pub fn save(&self, data: &T, additional_name: &str, role: Role) -> Result<SaveOutcome> {
        if let Strategy::Custom(custom) = &self.strategy {
            return match custom.save_fn(role) {
                Some(save) => {
                    save(data, self.policy.as_ref(), additional_name)?;
                    Ok(SaveOutcome::Delegated)
                }
                None => {
                    log::warn!(
                        "No custom {} save function configured, nothing saved for '{}'",
                        role,
                        additional_name
                    );
                    Ok(SaveOutcome::NotConfigured)
                }
            };
        }

        ensure_dir(&self.policy.resolve_root(role))?;
        let path = self.policy.full_path(additional_name, role, true);

        let bytes = self.codec()
            .encode(data)
            .map_err(|source| SaveError::Encode { path: path.clone(), source })?;
        write_all(&path, &bytes)?;

        log::debug!("Saved {} data to {}", role, path.display());
        Ok(SaveOutcome::Written(path))
    }

    /// Load the value saved under `additional_name` in `role`.
    ///
    /// With the built-in strategy a missing file is an error
    /// ([`SaveError::NotFound`]); with a custom strategy a missing load
    /// function is [`LoadOutcome::NotConfigured`].
    pub fn load(&self, additional_name: &str, role: Role) -> Result<LoadOutcome<T>> {
        if let Strategy::Custom(custom) = &self.strategy {
            return match custom.load_fn(role) {
                Some(load) => Ok(LoadOutcome::Loaded(load(self.policy.as_ref(), additional_name)?)),
                None => {
                    log::warn!(
                        "No custom {} load function configured, nothing loaded for '{}'",
                        role,
                        additional_name
                    );
                    Ok(LoadOutcome::NotConfigured)
                }
            };
        }

        // Same directory side effect as save
        ensure_dir(&self.policy.resolve_root(role))?;
        let path = self.policy.full_path(additional_name, role, true);
        log::debug!("Loading {} data from {}", role, path.display());

        self.read_builtin(&path).map(LoadOutcome::Loaded)
    }

    /// Generate the external file for `additional_name` from its default
    /// file.
    ///
    /// The default file is always read with the built-in codec; the write
    /// goes through [`save`](Self::save), so a custom external save function
    /// is honoured.
    pub fn seed(&self, additional_name: &str) -> Result<SeedOutcome> {
        if self.policy.roots_collide() {
            return Err(SaveError::RootsCollide { root: self.policy.default_root.clone() });
        }

        let file_name = self.policy.file_name(additional_name, Role::Default, true);
        if !self.ensure_directory_then_check_exists(Role::Default, &file_name)? {
            log::warn!(
                "Default file {} does not exist, nothing seeded",
                self.policy.resolve_root(Role::Default).join(&file_name).display()
            );
            return Ok(SeedOutcome::SourceMissing);
        }

        let source = self.policy.resolve_root(Role::Default).join(&file_name);
        let data = self.read_builtin(&source)?;
        let outcome = self.save(&data, additional_name, Role::External)?;

        log::info!("Seeded external '{}' from {}", additional_name, source.display());
        Ok(SeedOutcome::Seeded(outcome))
    }

    /// Check whether `file_name` exists in the directory of `role`.
    ///
    /// Creates the directory when it is missing, in which case the answer is
    /// `false`. Seeding relies on the directory existing afterwards.
    pub fn ensure_directory_then_check_exists(&self, role: Role, file_name: &str) -> Result<bool> {
        let dir = self.policy.resolve_root(role);
        if ensure_dir(&dir)? {
            return Ok(false);
        }
        Ok(dir.join(file_name).is_file())
    }

    /// [`ensure_directory_then_check_exists`](Self::ensure_directory_then_check_exists)
    /// for the file `save` would write.
    pub fn exists(&self, additional_name: &str, role: Role) -> Result<bool> {
        let file_name = self.policy.file_name(additional_name, role, true);
        self.ensure_directory_then_check_exists(role, &file_name)
    }

    /// Load the external value, seeding it from the default file first when
    /// the external file does not exist yet.
    pub fn load_or_seed(&self, additional_name: &str) -> Result<LoadOutcome<T>> {
        match self.load(additional_name, Role::External) {
            Err(SaveError::NotFound { path }) => {
                log::info!("No external data at {}, seeding from default", path.display());
                match self.seed(additional_name)? {
                    SeedOutcome::SourceMissing => Err(SaveError::NotFound { path }),
                    SeedOutcome::Seeded(_) => self.load(additional_name, Role::External),
                }
            }
            other => other,
        }
    }

    fn read_builtin(&self, path: &Path) -> Result<T> {
        let bytes = read_all(path)?;
        self.codec()
            .decode(&bytes)
            .map_err(|source| SaveError::Decode { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Format;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        index: i32,
        value: f32,
        state: bool,
    }

    fn sample() -> TestData {
        TestData { name: "Test".into(), index: 0, value: 0.5, state: true }
    }

    fn policy(dir: &Path, format: Format) -> NamingPolicy {
        NamingPolicy::new(dir.join("bundle"), dir.join("user"))
            .with_base_names("DefaultTest_{0}", "PTest_{0}")
            .with_folder_name("TestData")
            .with_format(format)
    }

    #[test]
    fn test_save_then_load_default_xml() {
        let dir = tempfile::tempdir().unwrap();
        let handler = SaveHandler::new(policy(dir.path(), Format::Xml));

        let outcome = handler.save(&sample(), "_", Role::Default).unwrap();
        let expected = dir.path().join("bundle").join("TestData").join("DefaultTest__.xml");
        assert_eq!(outcome, SaveOutcome::Written(expected.clone()));
        assert!(expected.is_file());

        let loaded = handler.load("_", Role::Default).unwrap();
        assert_eq!(loaded, LoadOutcome::Loaded(sample()));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handler = SaveHandler::<TestData>::new(policy(dir.path(), Format::Json));

        let err = handler.load("nothing", Role::External).unwrap_err();
        assert!(err.is_not_found());
        // Directory is still created
        assert!(dir.path().join("user").join("TestData").is_dir());
    }

    #[test]
    fn test_load_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let policy = policy(dir.path(), Format::Json);
        let handler = SaveHandler::<TestData>::new(policy.clone());

        std::fs::create_dir_all(policy.resolve_root(Role::External)).unwrap();
        std::fs::write(policy.full_path("bad", Role::External, true), b"{ not json").unwrap();

        let err = handler.load("bad", Role::External).unwrap_err();
        assert!(matches!(err, SaveError::Decode { .. }));
    }

    #[test]
    fn test_custom_load_without_save() {
        let dir = tempfile::tempdir().unwrap();
        let custom = CustomStrategy::new()
            .on_load_external(|_: &NamingPolicy, name: &str| {
                Ok(TestData { name: name.to_string(), index: 9, value: 1.5, state: false })
            });
        let handler = SaveHandler::with_strategy(policy(dir.path(), Format::Xml), Strategy::Custom(custom));

        let outcome = handler.save(&sample(), "slot", Role::External).unwrap();
        assert_eq!(outcome, SaveOutcome::NotConfigured);
        assert!(!dir.path().join("user").exists());

        let loaded = handler.load("slot", Role::External).unwrap();
        assert_eq!(
            loaded,
            LoadOutcome::Loaded(TestData { name: "slot".into(), index: 9, value: 1.5, state: false })
        );
        assert_eq!(handler.load("slot", Role::Default).unwrap(), LoadOutcome::NotConfigured);
    }

    #[test]
    fn test_custom_save_receives_policy_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let custom = CustomStrategy::new()
            .on_save_default(move |data: &TestData, policy: &NamingPolicy, name: &str| {
                assert_eq!(data.name, "Test");
                assert_eq!(policy.folder_name, "TestData");
                assert_eq!(name, "_");
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        let handler = SaveHandler::with_strategy(policy(dir.path(), Format::Xml), Strategy::Custom(custom));

        assert_eq!(handler.save(&sample(), "_", Role::Default).unwrap(), SaveOutcome::Delegated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let custom = CustomStrategy::<TestData>::new()
            .on_load_default(|_, _| Err(anyhow::anyhow!("backend offline")));
        let handler = SaveHandler::with_strategy(policy(dir.path(), Format::Xml), Strategy::Custom(custom));

        let err = handler.load("x", Role::Default).unwrap_err();
        assert!(matches!(err, SaveError::Custom(_)));
        assert_eq!(err.to_string(), "backend offline");
    }

    #[test]
    fn test_strategy_can_be_switched() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = SaveHandler::new(policy(dir.path(), Format::Json));
        assert!(!handler.is_custom());
        assert!(handler.custom_mut().is_none());

        handler.use_custom(CustomStrategy::new());
        assert!(handler.is_custom());
        handler.custom_mut().unwrap().set_load(Role::Default, |_, _| Ok(sample()));
        assert_eq!(handler.load("any", Role::Default).unwrap(), LoadOutcome::Loaded(sample()));

        handler.use_builtin();
        assert!(handler.load("any", Role::Default).unwrap_err().is_not_found());
    }

    #[test]
    fn test_existence_check_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let handler = SaveHandler::<TestData>::new(policy(dir.path(), Format::Xml));
        let root = dir.path().join("bundle").join("TestData");

        assert!(!root.exists());
        assert!(!handler.ensure_directory_then_check_exists(Role::Default, "DefaultTest_a.xml").unwrap());
        assert!(root.is_dir());

        handler.save(&sample(), "a", Role::Default).unwrap();
        assert!(handler.ensure_directory_then_check_exists(Role::Default, "DefaultTest_a.xml").unwrap());
        assert!(handler.exists("a", Role::Default).unwrap());
        assert!(!handler.exists("a", Role::External).unwrap());
    }

    #[test]
    fn test_seed_rejects_colliding_roots() {
        let dir = tempfile::tempdir().unwrap();
        let policy = NamingPolicy::new(dir.path(), dir.path());
        let handler = SaveHandler::<TestData>::new(policy);

        assert!(matches!(handler.seed("x").unwrap_err(), SaveError::RootsCollide { .. }));
    }

    #[test]
    fn test_unwrap_or_default() {
        assert_eq!(LoadOutcome::<TestData>::NotConfigured.unwrap_or_default(), TestData::default());
        assert_eq!(LoadOutcome::Loaded(sample()).into_option(), Some(sample()));
    }
}
