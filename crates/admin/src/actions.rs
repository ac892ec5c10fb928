//! Head and row action descriptors, and bulk action execution.
//!
//! A descriptor tells the table widget how to trigger an action: an ajax
//! call (optionally behind a confirmation), a modal dialog, or a plain link.

use crate::{error::AdminError, rbac::PermissionChecker, response::ApiResponse};
use model::records::row::Record;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue, json};
use std::{collections::HashMap, fmt};
use tracing::{debug, warn};

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this record?";

#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Ajax {
        confirmation: Option<String>,
    },
    Modal {
        title: String,
        form: bool,
        /// `None` picks `[Save, Cancel]` for forms and `[Done]` otherwise.
        buttons: Option<Vec<String>>,
    },
    Link,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub event: String,
    pub icon: Option<String>,
    pub class: Option<String>,
    pub name: Option<String>,
    pub url: String,
    pub kind: ActionKind,
}

impl Action {
    pub fn ajax(event: &str, url: &str) -> Self {
        Self::new(event, url, ActionKind::Ajax { confirmation: None })
    }

    pub fn modal(event: &str, url: &str, title: &str, form: bool) -> Self {
        Self::new(
            event,
            url,
            ActionKind::Modal {
                title: title.to_string(),
                form,
                buttons: None,
            },
        )
    }

    pub fn link(event: &str, url: &str) -> Self {
        Self::new(event, url, ActionKind::Link)
    }

    fn new(event: &str, url: &str, kind: ActionKind) -> Self {
        Self {
            event: event.to_string(),
            icon: None,
            class: None,
            name: None,
            url: url.to_string(),
            kind,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    /// Only meaningful for ajax actions.
    pub fn with_confirmation(mut self, text: &str) -> Self {
        if let ActionKind::Ajax { confirmation } = &mut self.kind {
            *confirmation = Some(text.to_string());
        }
        self
    }

    /// Only meaningful for modal actions.
    pub fn with_buttons(mut self, labels: &[&str]) -> Self {
        if let ActionKind::Modal { buttons, .. } = &mut self.kind {
            *buttons = Some(labels.iter().map(|l| l.to_string()).collect());
        }
        self
    }

    /// The `{event, icon, class, name, ajax, data}` shape the widget reads.
    pub fn to_json(&self) -> JsonValue {
        let (ajax, data) = match &self.kind {
            ActionKind::Ajax { confirmation } => (
                true,
                json!({
                    "confirmation": confirmation,
                    "url": self.url,
                }),
            ),
            ActionKind::Modal {
                title,
                form,
                buttons,
            } => {
                let buttons = buttons.clone().unwrap_or_else(|| {
                    if *form {
                        vec!["Save".to_string(), "Cancel".to_string()]
                    } else {
                        vec!["Done".to_string()]
                    }
                });
                (
                    false,
                    json!({
                        "modal": true,
                        "url": self.url,
                        "title": title,
                        "form": form,
                        "btn": buttons,
                    }),
                )
            }
            ActionKind::Link => (
                false,
                json!({
                    "modal": false,
                    "url": self.url,
                }),
            ),
        };

        json!({
            "event": self.event,
            "icon": self.icon,
            "class": self.class,
            "name": self.name,
            "ajax": ajax,
            "data": data,
        })
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// What a bulk action handler receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionInput {
    pub ids: Vec<String>,
    /// Submitted form fields, for actions that declare a form.
    pub form: Option<Map<String, JsonValue>>,
}

pub type ActionHandler = Box<dyn Fn(&ActionInput) -> Result<(), String> + Send + Sync>;

/// A bulk action registered on a view.
pub struct RegisteredAction {
    pub name: String,
    pub text: String,
    pub confirmation: Option<String>,
    /// Whether the action asks for a form before it runs.
    pub form: bool,
    handler: ActionHandler,
}

impl fmt::Debug for RegisteredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredAction")
            .field("name", &self.name)
            .field("text", &self.text)
            .field("confirmation", &self.confirmation)
            .field("form", &self.form)
            .finish()
    }
}

/// Bulk actions in registration order.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: Vec<RegisteredAction>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, text: &str, handler: F) -> &mut RegisteredAction
    where
        F: Fn(&ActionInput) -> Result<(), String> + Send + Sync + 'static,
    {
        self.actions.retain(|a| a.name != name);
        self.actions.push(RegisteredAction {
            name: name.to_string(),
            text: text.to_string(),
            confirmation: None,
            form: false,
            handler: Box::new(handler),
        });
        let last = self.actions.len() - 1;
        &mut self.actions[last]
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredAction> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredAction> {
        self.actions.iter()
    }
}

impl RegisteredAction {
    pub fn confirm(&mut self, text: &str) -> &mut Self {
        self.confirmation = Some(text.to_string());
        self
    }

    pub fn with_form(&mut self) -> &mut Self {
        self.form = true;
        self
    }
}

/// Per-row switches for the built-in row actions. Every row qualifies by
/// default.
pub trait RowPolicy {
    fn can_view_details(&self, _row: &Record) -> bool {
        true
    }

    fn can_edit(&self, _row: &Record) -> bool {
        true
    }

    fn can_delete(&self, _row: &Record) -> bool {
        true
    }

    fn allows_extra(&self, _row: &Record, _action: &Action) -> bool {
        true
    }
}

/// The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct EveryRow;

impl RowPolicy for EveryRow {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadActions {
    pub display_checkbox: bool,
    pub actions: Vec<Action>,
}

/// Action configuration of one model view.
#[derive(Debug, Clone)]
pub struct ModelActions {
    pub endpoint: String,
    /// URL prefix of the view, e.g. `/admin/user`.
    pub base_url: String,
    pub can_create: bool,
    pub create_modal: bool,
    pub can_view_details: bool,
    pub details_modal: bool,
    pub can_edit: bool,
    pub edit_modal: bool,
    pub can_delete: bool,
    pub column_action_details: bool,
    pub column_action_edit: bool,
    pub column_action_delete: bool,
    pub extra_row_actions: Vec<Action>,
    /// Explicit head action order; `None` keeps the default order.
    pub head_order: Option<Vec<String>>,
    /// Explicit row action order; `None` keeps the default order.
    pub row_order: Option<Vec<String>>,
}

impl ModelActions {
    pub fn new(endpoint: &str, base_url: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            can_create: true,
            create_modal: true,
            can_view_details: false,
            details_modal: true,
            can_edit: true,
            edit_modal: true,
            can_delete: true,
            column_action_details: true,
            column_action_edit: true,
            column_action_delete: true,
            extra_row_actions: Vec::new(),
            head_order: None,
            row_order: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub fn is_action_allowed(&self, name: &str, checker: &dyn PermissionChecker) -> bool {
        checker.has_permission(&format!("{}.{}", self.endpoint, name))
    }

    /// Toolbar actions: `create`, then the bulk actions the principal may run.
    pub fn head_actions(
        &self,
        registry: &ActionRegistry,
        checker: &dyn PermissionChecker,
    ) -> HeadActions {
        let mut default_order = Vec::new();
        let mut by_name: HashMap<String, Action> = HashMap::new();

        if self.can_create {
            let action = if self.create_modal {
                Action::modal("create", &self.url("new/?modal=True"), "Create New Record", true)
            } else {
                Action::link("create", &self.url("new/"))
            };
            default_order.push("create".to_string());
            by_name.insert("create".to_string(), action.named("Create"));
        }

        for registered in registry.iter() {
            if !self.is_action_allowed(&registered.name, checker) {
                debug!("Hiding action '{}' on '{}'", registered.name, self.endpoint);
                continue;
            }

            let action = if registered.form {
                let url = self.url(&format!("action/{}/?modal=True", registered.name));
                Action::modal(&registered.name, &url, &registered.text, true)
            } else {
                let mut action = Action::ajax(&registered.name, &self.url("ajax/action/"));
                if let Some(text) = &registered.confirmation {
                    action = action.with_confirmation(text);
                }
                if registered.name == "delete" {
                    action = action.with_class("danger");
                }
                action
            };
            default_order.push(registered.name.clone());
            by_name.insert(registered.name.clone(), action.named(&registered.text));
        }

        let order = self.head_order.as_ref().unwrap_or(&default_order);
        let actions = pick(order, &mut by_name, &self.endpoint);
        let display_checkbox = actions.iter().any(|a| a.event != "create");

        HeadActions {
            display_checkbox,
            actions,
        }
    }

    /// Actions shown on one row: details, edit, delete, then extras.
    pub fn row_actions(&self, pk: &str, row: &Record, policy: &dyn RowPolicy) -> Vec<Action> {
        let mut default_order = Vec::new();
        let mut by_name: HashMap<String, Action> = HashMap::new();

        if self.can_view_details && self.column_action_details && policy.can_view_details(row) {
            let action = if self.details_modal {
                let url = self.url(&format!("details/?id={pk}&modal=True"));
                Action::modal("details", &url, &format!("View Record #{pk}"), false)
            } else {
                Action::link("details", &self.url(&format!("details/?id={pk}")))
            };
            default_order.push("details".to_string());
            by_name.insert("details".to_string(), action.named("Details"));
        }

        if self.can_edit && self.column_action_edit && policy.can_edit(row) {
            let action = if self.edit_modal {
                let url = self.url(&format!("edit/?id={pk}&modal=True"));
                Action::modal("edit", &url, &format!("Edit Record #{pk}"), true)
            } else {
                Action::link("edit", &self.url(&format!("edit/?id={pk}")))
            };
            default_order.push("edit".to_string());
            by_name.insert("edit".to_string(), action.named("Edit"));
        }

        if self.can_delete && self.column_action_delete && policy.can_delete(row) {
            let action = Action::ajax("delete", &self.url("ajax/action/"))
                .with_confirmation(DELETE_CONFIRMATION)
                .with_class("danger")
                .named("Delete");
            default_order.push("delete".to_string());
            by_name.insert("delete".to_string(), action);
        }

        for extra in &self.extra_row_actions {
            if policy.allows_extra(row, extra) {
                default_order.push(extra.event.clone());
                by_name.insert(extra.event.clone(), extra.clone());
            }
        }

        let order = self.row_order.as_ref().unwrap_or(&default_order);
        pick(order, &mut by_name, &self.endpoint)
    }

    /// Runs a bulk action and reports the outcome the way the widget expects.
    pub fn execute(
        &self,
        registry: &ActionRegistry,
        checker: &dyn PermissionChecker,
        name: &str,
        input: &ActionInput,
    ) -> ApiResponse {
        match self.run(registry, checker, name, input) {
            Ok(()) => ApiResponse::ok("Success"),
            Err(err) => {
                warn!("Action '{}' on '{}' rejected: {}", name, self.endpoint, err);
                match err {
                    AdminError::Forbidden(_) => ApiResponse::error(403, "Action is not allowed."),
                    other => ApiResponse::from(&other),
                }
            }
        }
    }

    fn run(
        &self,
        registry: &ActionRegistry,
        checker: &dyn PermissionChecker,
        name: &str,
        input: &ActionInput,
    ) -> Result<(), AdminError> {
        let action = registry
            .get(name)
            .ok_or_else(|| AdminError::NotFound(format!("action '{name}'")))?;
        if !self.is_action_allowed(name, checker) {
            return Err(AdminError::Forbidden(format!("{}.{}", self.endpoint, name)));
        }
        if action.form && input.form.is_none() {
            return Err(AdminError::InvalidArgument("Invalid form data.".to_string()));
        }
        (action.handler)(input).map_err(AdminError::ActionFailed)
    }
}

/// Looks actions up in `order`. Names that are not available are skipped.
fn pick(order: &[String], by_name: &mut HashMap<String, Action>, endpoint: &str) -> Vec<Action> {
    order
        .iter()
        .filter_map(|name| {
            let action = by_name.remove(name);
            if action.is_none() {
                debug!("Action '{}' is not available on '{}'", name, endpoint);
            }
            action
        })
        .collect()
}
