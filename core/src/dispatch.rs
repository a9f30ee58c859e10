//! Call-name resolution onto the client's capability table.
//!
//! Callers name actions in snake case (`contact_list`); capabilities are
//! registered under camelCase identifiers (`contactList`). A trailing
//! underscore marks a name that would otherwise collide with a reserved
//! word and survives the transform (`list_` stays `list_`).

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// A capability: one remote action reachable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    /// Identifier the dispatcher resolves to.
    pub name: &'static str,
    /// Value sent as `api_action`.
    pub action: &'static str,
    /// Verb hint. `None` lets the engine pick from the parameters.
    pub verb: Option<HttpMethod>,
}

const fn get(name: &'static str, action: &'static str) -> ActionSpec {
    ActionSpec {
        name,
        action,
        verb: Some(HttpMethod::Get),
    }
}

const fn post(name: &'static str, action: &'static str) -> ActionSpec {
    ActionSpec {
        name,
        action,
        verb: None,
    }
}

/// Every capability the client exposes.
pub const CAPABILITIES: &[ActionSpec] = &[
    get("accountView", "account_view"),
    get("userMe", "user_me"),
    get("userList", "user_list"),
    post("contactAdd", "contact_add"),
    post("contactEdit", "contact_edit"),
    post("contactSync", "contact_sync"),
    get("contactView", "contact_view"),
    get("contactViewEmail", "contact_view_email"),
    get("contactList", "contact_list"),
    get("contactDelete", "contact_delete"),
    post("contactTagAdd", "contact_tag_add"),
    post("contactTagRemove", "contact_tag_remove"),
    post("contactNoteAdd", "contact_note_add"),
    post("listAdd", "list_add"),
    post("listEdit", "list_edit"),
    get("listView", "list_view"),
    get("listDelete", "list_delete"),
    get("list_", "list_list"),
    get("listList", "list_list"),
    get("listPaginator", "list_paginator"),
    post("campaignCreate", "campaign_create"),
    get("campaignList", "campaign_list"),
    post("campaignSend", "campaign_send"),
    post("messageAdd", "message_add"),
    get("messageList", "message_list"),
    get("formGetforms", "form_getforms"),
    get("formHtml", "form_html"),
    post("groupAdd", "group_add"),
    get("groupList", "group_list"),
    get("tagsList", "tags_list"),
    get("segmentList", "segment_list"),
    post("automationContactAdd", "automation_contact_add"),
    get("automationList", "automation_list"),
    get("trackingLog", "tracking_log"),
    get("trackingSiteList", "tracking_site_list"),
    get("trackingSiteStatus", "tracking_site_status"),
    get("trackingEventList", "tracking_event_list"),
    get("trackingEventStatus", "tracking_event_status"),
    post("trackingEventRemove", "tracking_event_remove"),
    get("trackingWhitelist", "tracking_whitelist"),
];

/// Transform a call name into a capability identifier.
///
/// Tokens after the first are capitalized and the underscores removed; a
/// trailing underscore is stripped first and re-appended afterwards.
pub fn method_name(call: &str) -> String {
    let (stem, suffixed) = match call.strip_suffix('_') {
        Some(stem) => (stem, true),
        None => (call, false),
    };

    let mut out = String::with_capacity(call.len());
    for (i, token) in stem.split('_').enumerate() {
        if i == 0 {
            out.push_str(token);
            continue;
        }
        let mut chars = token.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if suffixed {
        out.push('_');
    }
    out
}

/// Name-indexed view over a capability table.
#[derive(Debug)]
pub struct Dispatcher {
    table: HashMap<&'static str, &'static ActionSpec>,
    type_name: &'static str,
}

impl Dispatcher {
    /// Index `capabilities`. Duplicate identifiers are a programming error
    /// and are reported here rather than on first use.
    pub fn new(
        capabilities: &'static [ActionSpec],
        type_name: &'static str,
    ) -> Result<Self, ApiError> {
        let mut table = HashMap::with_capacity(capabilities.len());
        for spec in capabilities {
            if table.insert(spec.name, spec).is_some() {
                return Err(ApiError::Configuration(format!(
                    "duplicate capability {}",
                    spec.name
                )));
            }
        }
        Ok(Self { table, type_name })
    }

    /// The dispatcher over [`CAPABILITIES`], built on first use.
    pub fn global() -> &'static Dispatcher {
        static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();
        DISPATCHER.get_or_init(|| {
            Dispatcher::new(CAPABILITIES, "ApiClient")
                .expect("capability identifiers should be unique")
        })
    }

    /// Resolve a call name, failing with `MissingMethod` for unknown names.
    pub fn resolve(&self, call: &str) -> Result<&'static ActionSpec, ApiError> {
        let identifier = method_name(call);
        self.table
            .get(identifier.as_str())
            .copied()
            .ok_or_else(|| ApiError::MissingMethod {
                name: call.to_string(),
                type_name: self.type_name.to_string(),
            })
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.table.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Turn a `component/method` path into a snake-case call name.
pub fn path_to_call(path: &str) -> String {
    path.trim_matches('/').replace('/', "_")
}
