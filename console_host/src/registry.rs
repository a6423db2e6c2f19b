//! Console part tags
//!
//! Hosts look console parts up by tag. The registry is defined once per UI
//! thread; defining a tag that already exists changes nothing.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

/// Tag of the console shell
pub const GAME_CONSOLE: &str = "game-console";
/// Tag of the display slot
pub const CONSOLE_DISPLAY: &str = "console-display";
/// Tag of the directional pad
pub const CONSOLE_DPAD: &str = "console-dpad";
/// Tag of the action buttons
pub const CONSOLE_ACTIONS: &str = "console-actions";

/// The kinds of console parts a tag can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Console,
    Display,
    Dpad,
    Actions,
}

impl PartKind {
    /// The standard tag for this kind
    pub fn standard_tag(self) -> &'static str {
        match self {
            PartKind::Console => GAME_CONSOLE,
            PartKind::Display => CONSOLE_DISPLAY,
            PartKind::Dpad => CONSOLE_DPAD,
            PartKind::Actions => CONSOLE_ACTIONS,
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PartKind::Console => "console",
            PartKind::Display => "display",
            PartKind::Dpad => "dpad",
            PartKind::Actions => "actions",
        };
        f.write_str(name)
    }
}

thread_local! {
    static DEFINITIONS: RefCell<BTreeMap<String, PartKind>> = const { RefCell::new(BTreeMap::new()) };
}

/// Registry of console part tags
pub struct ComponentRegistry;

impl ComponentRegistry {
    /// Defines `tag` as naming parts of `kind`
    ///
    /// Returns false if the tag was already defined; the first definition
    /// stays.
    pub fn define(tag: &str, kind: PartKind) -> bool {
        DEFINITIONS.with(|defs| {
            let mut defs = defs.borrow_mut();
            match defs.get(tag) {
                Some(existing) => {
                    tracing::debug!(tag, %existing, requested = %kind, "tag already defined");
                    false
                }
                None => {
                    tracing::debug!(tag, %kind, "tag defined");
                    defs.insert(tag.to_string(), kind);
                    true
                }
            }
        })
    }

    /// Defines the four standard tags
    ///
    /// Returns the number of tags newly defined.
    pub fn define_standard() -> usize {
        [PartKind::Console, PartKind::Display, PartKind::Dpad, PartKind::Actions]
            .into_iter()
            .filter(|kind| Self::define(kind.standard_tag(), *kind))
            .count()
    }

    /// The kind `tag` names, if defined
    pub fn lookup(tag: &str) -> Option<PartKind> {
        DEFINITIONS.with(|defs| defs.borrow().get(tag).copied())
    }

    /// Checks if `tag` is defined
    pub fn is_defined(tag: &str) -> bool {
        Self::lookup(tag).is_some()
    }

    /// All defined tags, sorted
    pub fn tags() -> Vec<String> {
        DEFINITIONS.with(|defs| defs.borrow().keys().cloned().collect())
    }

    /// Forgets every definition
    pub fn teardown() {
        DEFINITIONS.with(|defs| defs.borrow_mut().clear());
        tracing::debug!("component registry cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_standard_is_idempotent() {
        ComponentRegistry::teardown();
        assert_eq!(ComponentRegistry::define_standard(), 4);
        assert_eq!(ComponentRegistry::define_standard(), 0);
        assert_eq!(
            ComponentRegistry::tags(),
            vec!["console-actions", "console-display", "console-dpad", "game-console"]
        );
        ComponentRegistry::teardown();
    }

    #[test]
    fn test_first_definition_wins() {
        ComponentRegistry::teardown();
        assert!(ComponentRegistry::define("my-pad", PartKind::Dpad));
        assert!(!ComponentRegistry::define("my-pad", PartKind::Actions));
        assert_eq!(ComponentRegistry::lookup("my-pad"), Some(PartKind::Dpad));
        ComponentRegistry::teardown();
    }

    #[test]
    fn test_teardown_clears() {
        ComponentRegistry::teardown();
        assert_eq!(ComponentRegistry::define_standard(), 4);
        ComponentRegistry::teardown();
        assert!(!ComponentRegistry::is_defined(CONSOLE_DISPLAY));
        assert!(ComponentRegistry::tags().is_empty());
    }
}
