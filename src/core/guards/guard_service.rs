// Authorization guards evaluated before command execution.
//
// Two predicates: an owner-only gate and a per-guild module gate. Both are
// stateless - they read, decide, and never write. Module dispatch is
// table-driven: each module registers a `ModuleGate` capability, so adding
// a module never touches the check itself.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::locale::Localizer;

/// A toggleable bot feature gated per guild by its `active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Leveling,
}

impl Module {
    /// Human-readable name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Module::Leveling => "Leveling",
        }
    }
}

#[derive(Debug, Error)]
pub enum GuardError {
    /// A non-owner invoked an owner-restricted command. Carries no payload;
    /// the presentation layer localizes it.
    #[error("This command can only be used by the bot owner.")]
    OwnerOnly,

    /// The required module is inactive for the guild. Carries the
    /// pre-localized, module-name-parameterized user-facing message.
    #[error("{0}")]
    ModuleDisabled(String),

    /// The gate's cache lookup failed.
    #[error("module lookup failed: {0}")]
    Lookup(String),
}

/// Per-module capability consulted by the enabled-guard: one cache read,
/// no writes. A missing config row counts as inactive.
#[async_trait]
pub trait ModuleGate: Send + Sync {
    async fn is_active(&self, guild_id: u64) -> Result<bool, GuardError>;
}

/// Evaluates the guard predicates. The bot owner id is injected at
/// construction rather than reached through global state.
pub struct GuardService {
    owner_id: u64,
    locales: Arc<Localizer>,
    gates: HashMap<Module, Arc<dyn ModuleGate>>,
}

impl GuardService {
    pub fn new(owner_id: u64, locales: Arc<Localizer>) -> Self {
        Self {
            owner_id,
            locales,
            gates: HashMap::new(),
        }
    }

    /// Register the gate backing a module.
    pub fn register(&mut self, module: Module, gate: Arc<dyn ModuleGate>) {
        self.gates.insert(module, gate);
    }

    pub fn owner_id(&self) -> u64 {
        self.owner_id
    }

    /// Succeeds iff `user_id` is the configured bot owner.
    pub fn check_owner(&self, user_id: u64) -> Result<(), GuardError> {
        if user_id == self.owner_id {
            Ok(())
        } else {
            Err(GuardError::OwnerOnly)
        }
    }

    /// Succeeds iff `module` is active for the guild. A module with no
    /// registered gate, no config row, or `active == false` fails with a
    /// `ModuleDisabled` message localized for `locale`.
    pub async fn check_module(
        &self,
        guild_id: u64,
        locale: &str,
        module: Module,
    ) -> Result<(), GuardError> {
        let active = match self.gates.get(&module) {
            Some(gate) => gate.is_active(guild_id).await?,
            None => false,
        };

        if active {
            Ok(())
        } else {
            Err(GuardError::ModuleDisabled(self.locales.translate(
                locale,
                "errors.module_disabled",
                &[("module", module.display_name())],
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OWNER: u64 = 100;
    const GUILD: u64 = 42;

    /// Gate with a fixed answer, counting how often it is consulted.
    struct StaticGate {
        active: bool,
        reads: AtomicUsize,
    }

    impl StaticGate {
        fn new(active: bool) -> Self {
            Self {
                active,
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModuleGate for StaticGate {
        async fn is_active(&self, _guild_id: u64) -> Result<bool, GuardError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.active)
        }
    }

    fn localizer() -> Arc<Localizer> {
        let mut localizer = Localizer::new("en-US");
        localizer.insert_catalog(
            "en-US",
            StdHashMap::from([(
                "errors.module_disabled".to_string(),
                "The {module} module is disabled.".to_string(),
            )]),
        );
        Arc::new(localizer)
    }

    #[test]
    fn owner_check_passes_for_owner() {
        let guards = GuardService::new(OWNER, localizer());
        assert!(guards.check_owner(OWNER).is_ok());
    }

    #[test]
    fn owner_check_rejects_everyone_else() {
        let guards = GuardService::new(OWNER, localizer());
        assert!(matches!(
            guards.check_owner(OWNER + 1),
            Err(GuardError::OwnerOnly)
        ));
    }

    #[tokio::test]
    async fn active_module_passes() {
        let mut guards = GuardService::new(OWNER, localizer());
        guards.register(Module::Leveling, Arc::new(StaticGate::new(true)));

        assert!(guards
            .check_module(GUILD, "en-US", Module::Leveling)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn inactive_module_fails_with_localized_message() {
        let mut guards = GuardService::new(OWNER, localizer());
        guards.register(Module::Leveling, Arc::new(StaticGate::new(false)));

        let error = guards
            .check_module(GUILD, "en-US", Module::Leveling)
            .await
            .unwrap_err();

        match error {
            GuardError::ModuleDisabled(message) => {
                assert_eq!(message, "The Leveling module is disabled.");
            }
            other => panic!("expected ModuleDisabled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unregistered_module_fails_closed() {
        let guards = GuardService::new(OWNER, localizer());

        let error = guards
            .check_module(GUILD, "en-US", Module::Leveling)
            .await
            .unwrap_err();

        assert!(matches!(error, GuardError::ModuleDisabled(_)));
    }

    #[tokio::test]
    async fn check_performs_exactly_one_gate_read() {
        let gate = Arc::new(StaticGate::new(true));
        let mut guards = GuardService::new(OWNER, localizer());
        guards.register(Module::Leveling, Arc::clone(&gate) as Arc<dyn ModuleGate>);

        guards
            .check_module(GUILD, "en-US", Module::Leveling)
            .await
            .unwrap();

        assert_eq!(gate.reads.load(Ordering::SeqCst), 1);
    }
}
