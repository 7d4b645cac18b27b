//! Maps a page-context hint to the stable id of the subject account.
use std::sync::{Arc, LazyLock};

use engine_logging::{engine_debug, engine_info};
use follow_core::{SubjectId, SubjectIdentity};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::decode::decode_document;
use crate::http::{ApiClient, RequestAuth};
use crate::wire::{parse_body, scalar_to_string};

/// First path segments that are site routes rather than account handles.
const RESERVED_ROUTES: &[&str] = &["explore", "reels", "direct", "accounts", "stories", "p", "tv"];

/// Nesting limit of the embedded-document search.
const MAX_SEARCH_DEPTH: usize = 32;

static PROFILE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([^/]+)/?$").expect("valid profile path regex"));
static FOLLOW_LIST_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([^/]+)/(?:followers|following)/?$").expect("valid follow list regex")
});
static TITLE_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("valid title regex"));
static USER_ID_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""user_id":"(\d+)""#).expect("valid user id regex"));
static PROFILE_PAGE_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""profilePage_(\d+)""#).expect("valid profile page regex"));

/// What the host knows about the page the user is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectHint {
    pub handle: Option<String>,
    pub url_path: Option<String>,
    pub title: Option<String>,
    /// Markup of the current page, searched for header text and embedded JSON.
    pub page_html: Option<String>,
    /// Additional JSON documents already extracted from the page.
    pub documents: Vec<String>,
}

impl SubjectHint {
    pub fn for_handle(handle: impl Into<String>) -> Self {
        Self {
            handle: Some(handle.into()),
            ..Self::default()
        }
    }

    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            url_path: Some(path.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("no handle found in the page context; open your profile page and try again")]
    HandleNotFound,
    #[error("could not find the account id for @{handle}")]
    NotFound { handle: String },
}

pub struct IdentityResolver {
    client: Arc<ApiClient>,
}

impl IdentityResolver {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Tries each strategy once, in order. Individual strategy failures are logged
    /// and skipped.
    pub async fn resolve(&self, hint: &SubjectHint) -> Result<SubjectIdentity, IdentityError> {
        let handle = detect_handle(hint).ok_or(IdentityError::HandleNotFound)?;
        engine_info!("Resolving account id for @{}", handle);

        let id = match self.from_profile_info(&handle).await {
            Some(id) => Some(id),
            None => match find_in_page_documents(hint, &handle) {
                Some(id) => Some(id),
                None => self.from_profile_document(&handle).await,
            },
        };

        match id {
            Some(id) => {
                engine_info!("Resolved @{} to {}", handle, id);
                Ok(SubjectIdentity {
                    handle,
                    id: SubjectId::new(id),
                })
            }
            None => Err(IdentityError::NotFound { handle }),
        }
    }

    async fn from_profile_info(&self, handle: &str) -> Option<String> {
        let mut url = self.client.endpoint("api/v1/users/web_profile_info/").ok()?;
        url.query_pairs_mut().append_pair("username", handle);
        let response = match self.client.get(url, RequestAuth::Credentials).await {
            Ok(response) => response,
            Err(err) => {
                engine_debug!("Profile info lookup failed for @{}: {}", handle, err);
                return None;
            }
        };
        let body: Value = parse_body(&response.body).ok()?;
        body.pointer("/data/user/id").and_then(scalar_to_string)
    }

    async fn from_profile_document(&self, handle: &str) -> Option<String> {
        let url = self.client.endpoint(&format!("{handle}/")).ok()?;
        let response = match self.client.get(url, RequestAuth::Credentials).await {
            Ok(response) => response,
            Err(err) => {
                engine_debug!("Profile document fetch failed for @{}: {}", handle, err);
                return None;
            }
        };
        let markup = decode_document(&response.body, response.content_type.as_deref()).ok()?;
        extract_id_from_markup(&markup)
    }
}

/// Finds the subject handle in the hint, most explicit source first.
pub fn detect_handle(hint: &SubjectHint) -> Option<String> {
    if let Some(handle) = hint.handle.as_deref().and_then(clean_handle) {
        return Some(handle);
    }

    if let Some(path) = hint.url_path.as_deref() {
        let profile = PROFILE_PATH
            .captures(path)
            .map(|caps| caps[1].to_string())
            .filter(|segment| !is_reserved(segment));
        if profile.is_some() {
            return profile;
        }
        if let Some(caps) = FOLLOW_LIST_PATH.captures(path) {
            return Some(caps[1].to_string());
        }
    }

    if let Some(handle) = hint.page_html.as_deref().and_then(handle_from_markup) {
        return Some(handle);
    }

    hint.title
        .as_deref()
        .and_then(|title| TITLE_HANDLE.captures(title))
        .map(|caps| caps[1].to_string())
}

fn clean_handle(raw: &str) -> Option<String> {
    let handle = raw.trim().trim_start_matches('@').trim_matches('/');
    (!handle.is_empty()).then(|| handle.to_string())
}

fn is_reserved(segment: &str) -> bool {
    RESERVED_ROUTES.contains(&segment)
}

fn handle_from_markup(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);

    let heading = Selector::parse("header section h2").ok()?;
    if let Some(text) = document
        .select(&heading)
        .next()
        .map(|h2| h2.text().collect::<String>())
        .and_then(|text| clean_handle(&text))
    {
        return Some(text);
    }

    let links = Selector::parse(r#"header a[href^="/"]"#).ok()?;
    document
        .select(&links)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| PROFILE_PATH.captures(href).map(|caps| caps[1].to_string()))
        .find(|segment| !is_reserved(segment))
}

fn find_in_page_documents(hint: &SubjectHint, handle: &str) -> Option<String> {
    let mut documents: Vec<String> = Vec::new();
    if let Some(markup) = hint.page_html.as_deref() {
        let document = Html::parse_document(markup);
        if let Ok(scripts) = Selector::parse(r#"script[type="application/json"]"#) {
            documents.extend(
                document
                    .select(&scripts)
                    .map(|script| script.text().collect::<String>()),
            );
        }
    }
    documents.extend(hint.documents.iter().cloned());

    documents
        .iter()
        .filter_map(|raw| serde_json::from_str::<Value>(raw).ok())
        .find_map(|value| find_user_id(&value, handle))
}

/// Depth-bounded search for an object whose `username` is `handle` and which
/// carries an `id` or `pk`. The first match in document order wins.
pub fn find_user_id(value: &Value, handle: &str) -> Option<String> {
    search(value, handle, 0)
}

fn search(value: &Value, handle: &str, depth: usize) -> Option<String> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            if map.get("username").and_then(Value::as_str) == Some(handle) {
                let id = ["id", "pk"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(scalar_to_string));
                if id.is_some() {
                    return id;
                }
            }
            map.values().find_map(|child| search(child, handle, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|child| search(child, handle, depth + 1)),
        _ => None,
    }
}

fn extract_id_from_markup(markup: &str) -> Option<String> {
    USER_ID_MARKUP
        .captures(markup)
        .or_else(|| PROFILE_PAGE_MARKUP.captures(markup))
        .map(|caps| caps[1].to_string())
}
