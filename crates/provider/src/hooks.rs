// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Handlers of the events sent by the host.
//!
//! The host knows events by name. A [`HookRegistry`] is built once at
//! start-up, and maps each name to the [`Hooks`] interested in it.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::requests::{AuthAction, AuthenticationRequest, BUTTON_REQUEST_NAME};

/// The table storing the account links
pub const ACCOUNT_LINKS_TABLE: &str = "forum_account_links";

/// The class rendering the login button
pub const BUTTON_FIELD_CLASS: &str = "ForumButtonField";

/// The weight of the login button, to put it after the password login
const BUTTON_FIELD_WEIGHT: i32 = 101;

/// The events a [`Hooks`] can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// The host is updating its database schema
    LoadExtensionSchemaUpdates,

    /// The host is building an authentication form
    AuthChangeFormFields,
}

impl HookEvent {
    /// Every event, in the order they are listed
    pub const ALL: [Self; 2] = [Self::LoadExtensionSchemaUpdates, Self::AuthChangeFormFields];

    /// The name the host knows the event by
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoadExtensionSchemaUpdates => "LoadExtensionSchemaUpdates",
            Self::AuthChangeFormFields => "AuthChangeFormFields",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| HookError::UnknownEvent(s.to_owned()))
    }
}

/// An error while dispatching an event
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookError {
    /// No such event
    #[error("Unknown hook event {0:?}")]
    UnknownEvent(String),

    /// The payload is not the one of the event
    #[error("Invalid payload for the {event} hook event")]
    PayloadMismatch {
        /// The event dispatched
        event: HookEvent,
    },
}

/// The part of the host applying database schema updates
pub trait SchemaUpdater {
    /// Create the given table, owned by this extension, if it doesn't exist
    fn add_extension_table(&mut self, table: &str);
}

/// A field of a host form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// The type of the field, exclusive with `class`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// The class rendering the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// The message key of the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// The message key of the help
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Fields are sorted by increasing weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,

    /// Rendering flags, like `primary`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// The icon shown next to the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// The fields of a host form, by name
pub type FormDescriptor = IndexMap<String, FormField>;

/// What comes with an event
pub enum HookPayload<'a> {
    /// Comes with [`HookEvent::LoadExtensionSchemaUpdates`]
    SchemaUpdates(&'a mut dyn SchemaUpdater),

    /// Comes with [`HookEvent::AuthChangeFormFields`]
    AuthChangeFormFields {
        /// The requests the form is built from
        requests: &'a [AuthenticationRequest],

        /// The form to change
        form: &'a mut FormDescriptor,

        /// The action of the form
        action: AuthAction,
    },
}

/// Handlers of the host events
pub trait Hooks: Send + Sync {
    /// The host is updating its database schema
    fn on_load_extension_schema_updates(&self, _updater: &mut dyn SchemaUpdater) {}

    /// The host is building an authentication form
    fn on_auth_change_form_fields(
        &self,
        _requests: &[AuthenticationRequest],
        _form: &mut FormDescriptor,
        _action: AuthAction,
    ) {
    }
}

/// Maps the host events to their handlers
#[derive(Default, Clone)]
pub struct HookRegistry {
    handlers: HashMap<HookEvent, Vec<Arc<dyn Hooks>>>,
}

impl HookRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event
    pub fn register(&mut self, event: HookEvent, hooks: Arc<dyn Hooks>) -> &mut Self {
        self.handlers.entry(event).or_default().push(hooks);
        self
    }

    /// Register a handler for every event
    pub fn register_all(&mut self, hooks: &Arc<dyn Hooks>) -> &mut Self {
        for event in HookEvent::ALL {
            self.register(event, Arc::clone(hooks));
        }
        self
    }

    /// Whether any handler is registered for the event
    #[must_use]
    pub fn handles(&self, event: HookEvent) -> bool {
        self.handlers.get(&event).is_some_and(|h| !h.is_empty())
    }

    /// Call the handlers of the event with the given name
    ///
    /// # Errors
    ///
    /// Returns an error if the event is unknown, or if the payload is not the
    /// one of the event
    pub fn dispatch(&self, name: &str, payload: HookPayload<'_>) -> Result<(), HookError> {
        let event: HookEvent = name.parse()?;
        let handlers = self.handlers.get(&event).map(Vec::as_slice).unwrap_or_default();
        tracing::debug!(%event, handlers = handlers.len(), "Dispatching hook event");

        match (event, payload) {
            (HookEvent::LoadExtensionSchemaUpdates, HookPayload::SchemaUpdates(updater)) => {
                for hooks in handlers {
                    hooks.on_load_extension_schema_updates(updater);
                }
            }
            (
                HookEvent::AuthChangeFormFields,
                HookPayload::AuthChangeFormFields {
                    requests,
                    form,
                    action,
                },
            ) => {
                for hooks in handlers {
                    hooks.on_auth_change_form_fields(requests, form, action);
                }
            }
            (event, _) => return Err(HookError::PayloadMismatch { event }),
        }

        Ok(())
    }
}

/// The hooks of the forum login provider
#[derive(Debug, Clone)]
pub struct ForumHooks {
    database_name: String,
    shared_database: Option<String>,
    button_icon: Option<String>,
}

impl ForumHooks {
    /// Create the hooks for a deployment using the given database, and
    /// possibly a database shared with other deployments
    #[must_use]
    pub fn new(
        database_name: String,
        shared_database: Option<String>,
        button_icon: Option<String>,
    ) -> Self {
        Self {
            database_name,
            shared_database,
            button_icon,
        }
    }

    fn uses_foreign_shared_database(&self) -> bool {
        self.shared_database
            .as_deref()
            .is_some_and(|shared| !shared.is_empty() && shared != self.database_name)
    }
}

impl Hooks for ForumHooks {
    fn on_load_extension_schema_updates(&self, updater: &mut dyn SchemaUpdater) {
        if self.uses_foreign_shared_database() {
            tracing::info!(
                shared_database = self.shared_database.as_deref(),
                "Not managing the account links table of a shared database"
            );
            return;
        }

        updater.add_extension_table(ACCOUNT_LINKS_TABLE);
    }

    fn on_auth_change_form_fields(
        &self,
        _requests: &[AuthenticationRequest],
        form: &mut FormDescriptor,
        _action: AuthAction,
    ) {
        let Some(field) = form.get_mut(BUTTON_REQUEST_NAME) else {
            return;
        };

        field.weight = Some(BUTTON_FIELD_WEIGHT);
        field.flags.clear();
        field.field_type = None;
        field.class = Some(BUTTON_FIELD_CLASS.to_owned());
        if let Some(icon) = &self.button_icon {
            field.icon = Some(icon.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tables(Vec<String>);

    impl SchemaUpdater for Tables {
        fn add_extension_table(&mut self, table: &str) {
            self.0.push(table.to_owned());
        }
    }

    fn registry(hooks: ForumHooks) -> HookRegistry {
        let hooks: Arc<dyn Hooks> = Arc::new(hooks);
        let mut registry = HookRegistry::new();
        registry.register_all(&hooks);
        registry
    }

    #[test]
    fn registers_table() {
        let registry = registry(ForumHooks::new("wiki".to_owned(), None, None));
        let mut tables = Tables::default();
        registry
            .dispatch(
                "LoadExtensionSchemaUpdates",
                HookPayload::SchemaUpdates(&mut tables),
            )
            .unwrap();
        assert_eq!(tables.0, vec![ACCOUNT_LINKS_TABLE.to_owned()]);

        // A shared database which is our own database is managed
        let registry = registry_with_shared("wiki", "wiki");
        let mut tables = Tables::default();
        registry
            .dispatch(
                "LoadExtensionSchemaUpdates",
                HookPayload::SchemaUpdates(&mut tables),
            )
            .unwrap();
        assert_eq!(tables.0.len(), 1);
    }

    fn registry_with_shared(database: &str, shared: &str) -> HookRegistry {
        registry(ForumHooks::new(
            database.to_owned(),
            Some(shared.to_owned()),
            None,
        ))
    }

    #[test]
    fn skips_foreign_shared_database() {
        let registry = registry_with_shared("wiki", "wikishared");
        let mut tables = Tables::default();
        registry
            .dispatch(
                "LoadExtensionSchemaUpdates",
                HookPayload::SchemaUpdates(&mut tables),
            )
            .unwrap();
        assert!(tables.0.is_empty());
    }

    #[test]
    fn changes_button_field() {
        let registry = registry(ForumHooks::new(
            "wiki".to_owned(),
            None,
            Some("/images/forum.png".to_owned()),
        ));

        let mut form = FormDescriptor::new();
        form.insert(
            "password".to_owned(),
            FormField {
                field_type: Some("password".to_owned()),
                ..FormField::default()
            },
        );
        form.insert(
            BUTTON_REQUEST_NAME.to_owned(),
            FormField {
                field_type: Some("submit".to_owned()),
                label: Some("forumauth".to_owned()),
                weight: Some(10),
                flags: vec!["primary".to_owned()],
                ..FormField::default()
            },
        );

        registry
            .dispatch(
                "AuthChangeFormFields",
                HookPayload::AuthChangeFormFields {
                    requests: &[],
                    form: &mut form,
                    action: AuthAction::Login,
                },
            )
            .unwrap();

        let field = &form[BUTTON_REQUEST_NAME];
        assert_eq!(field.field_type, None);
        assert_eq!(field.class.as_deref(), Some(BUTTON_FIELD_CLASS));
        assert_eq!(field.weight, Some(101));
        assert!(field.flags.is_empty());
        assert_eq!(field.icon.as_deref(), Some("/images/forum.png"));
        assert_eq!(field.label.as_deref(), Some("forumauth"));
        assert_eq!(form["password"].field_type.as_deref(), Some("password"));
    }

    #[test]
    fn form_without_button() {
        let registry = registry(ForumHooks::new("wiki".to_owned(), None, None));
        let mut form = FormDescriptor::new();
        form.insert("username".to_owned(), FormField::default());

        registry
            .dispatch(
                "AuthChangeFormFields",
                HookPayload::AuthChangeFormFields {
                    requests: &[],
                    form: &mut form,
                    action: AuthAction::Create,
                },
            )
            .unwrap();

        assert_eq!(form["username"], FormField::default());
    }

    #[test]
    fn dispatch_errors() {
        let registry = registry(ForumHooks::new("wiki".to_owned(), None, None));
        let mut tables = Tables::default();

        assert_eq!(
            registry.dispatch("UserLoginComplete", HookPayload::SchemaUpdates(&mut tables)),
            Err(HookError::UnknownEvent("UserLoginComplete".to_owned()))
        );
        assert_eq!(
            registry.dispatch("AuthChangeFormFields", HookPayload::SchemaUpdates(&mut tables)),
            Err(HookError::PayloadMismatch {
                event: HookEvent::AuthChangeFormFields
            })
        );
        assert!(tables.0.is_empty());
    }
}
