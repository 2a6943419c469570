//! Client for the external card catalog (Scryfall search API).
//!
//! The catalog distinguishes "no cards matched" (an empty list) from a
//! failed request (`LookupUnavailable`). Callers rely on that difference.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::card::CatalogCard;

/// Read-only access to the external card catalog.
pub trait CatalogSource: Send + Sync {
    /// Runs a catalog search expression and returns matches in catalog order.
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<CatalogCard>>> + Send;
}

/// HTTP client for the catalog search endpoint.
#[derive(Clone)]
pub struct ScryfallClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScryfallClient {
    /// Creates a client. Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("manatomb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl CatalogSource for ScryfallClient {
    async fn search(&self, query: &str) -> Result<Vec<CatalogCard>> {
        let url = format!("{}/cards/search", self.base_url);
        tracing::debug!(query, "Catalog search");

        let response = self
            .http
            .get(&url)
            .query(&[("q", query)])
            .header(http::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::LookupUnavailable(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::LookupUnavailable(e.to_string()))?;

        parse_search_response(status, &body)
    }
}

#[derive(Deserialize)]
struct SearchEnvelope {
    object: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    data: Vec<RawCard>,
}

#[derive(Deserialize)]
struct RawCard {
    name: String,
    #[serde(default)]
    mana_cost: Option<String>,
    #[serde(default)]
    type_line: Option<String>,
    #[serde(default)]
    oracle_text: Option<String>,
    #[serde(default)]
    image_uris: Option<HashMap<String, String>>,
    #[serde(default)]
    card_faces: Vec<RawFace>,
}

#[derive(Deserialize)]
struct RawFace {
    #[serde(default)]
    mana_cost: Option<String>,
    #[serde(default)]
    oracle_text: Option<String>,
    #[serde(default)]
    image_uris: Option<HashMap<String, String>>,
}

impl RawCard {
    fn into_catalog_card(self) -> CatalogCard {
        let front = self.card_faces.into_iter().next();
        let normal_image =
            |uris: Option<HashMap<String, String>>| uris.and_then(|mut m| m.remove("normal"));

        let (face_cost, face_text, face_image) = match front {
            Some(face) => (face.mana_cost, face.oracle_text, normal_image(face.image_uris)),
            None => (None, None, None),
        };

        CatalogCard {
            name: self.name,
            mana_cost: non_empty(self.mana_cost).or(non_empty(face_cost)),
            type_line: non_empty(self.type_line),
            oracle_text: non_empty(self.oracle_text).or(non_empty(face_text)),
            image_uri: normal_image(self.image_uris).or(face_image),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Interprets a catalog search response.
///
/// A `not_found` error object (or a 404 error object) means zero matches.
/// Any other error object, an undecodable body or an unexpected status is a
/// lookup failure.
pub fn parse_search_response(status: u16, body: &[u8]) -> Result<Vec<CatalogCard>> {
    let envelope: SearchEnvelope = sonic_rs::from_slice(body).map_err(|e| {
        AppError::LookupUnavailable(format!("malformed catalog response (HTTP {}): {}", status, e))
    })?;

    match envelope.object.as_str() {
        "error" => {
            if envelope.code.as_deref() == Some("not_found") || status == 404 {
                return Ok(Vec::new());
            }
            Err(AppError::LookupUnavailable(format!(
                "catalog error ({}): {}",
                envelope.code.unwrap_or_default(),
                envelope.details.unwrap_or_default()
            )))
        }
        "list" if (200..300).contains(&status) => Ok(envelope
            .data
            .into_iter()
            .map(RawCard::into_catalog_card)
            .collect()),
        other => Err(AppError::LookupUnavailable(format!(
            "unexpected catalog response object {:?} (HTTP {})",
            other, status
        ))),
    }
}

/// Builds the exact-name search expression for a card name.
pub fn exact_name_query(name: &str) -> String {
    format!("!\"{}\"", name.replace('"', "\\\""))
}

/// Builds a filtered search expression.
///
/// Returns `None` when there is nothing to search for. A filter-only search
/// matches everything (`*`) and narrows by the filters.
pub fn build_search_query(query: &str, colors: &str, type_filter: &str) -> Option<String> {
    let query = query.trim();
    let type_filter = type_filter.trim();

    let mut letters: Vec<char> = Vec::new();
    for c in colors.chars().map(|c| c.to_ascii_uppercase()) {
        if "WUBRG".contains(c) && !letters.contains(&c) {
            letters.push(c);
        }
    }

    if query.is_empty() && letters.is_empty() && type_filter.is_empty() {
        return None;
    }

    let mut search = if query.is_empty() {
        "*".to_string()
    } else {
        query.to_string()
    };

    if !letters.is_empty() {
        search.push_str(" id>=");
        search.extend(letters);
    }

    if !type_filter.is_empty() {
        search.push_str(" t:");
        if type_filter.contains(char::is_whitespace) {
            search.push('"');
            search.push_str(&type_filter.replace('"', ""));
            search.push('"');
        } else {
            search.push_str(type_filter);
        }
    }

    Some(search)
}

/// Builds the search expression restricted to cards that can be a commander.
pub fn commander_query(query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    Some(format!("{} is:commander", query))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOL_RING: &str = r#"{
        "object": "list",
        "total_cards": 1,
        "has_more": false,
        "data": [{
            "object": "card",
            "name": "Sol Ring",
            "mana_cost": "{1}",
            "type_line": "Artifact",
            "oracle_text": "{T}: Add {C}{C}.",
            "image_uris": {"small": "https://img/s.jpg", "normal": "https://img/n.jpg"}
        }]
    }"#;

    #[test]
    fn parses_list_in_catalog_order() {
        let body = r#"{"object":"list","data":[{"name":"Zur the Enchanter"},{"name":"Arcane Signet"}]}"#;
        let cards = parse_search_response(200, body.as_bytes()).unwrap();
        let names: Vec<_> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Zur the Enchanter", "Arcane Signet"]);
    }

    #[test]
    fn parses_card_fields() {
        let cards = parse_search_response(200, SOL_RING.as_bytes()).unwrap();
        assert_eq!(
            cards,
            vec![CatalogCard {
                name: "Sol Ring".into(),
                mana_cost: Some("{1}".into()),
                type_line: Some("Artifact".into()),
                oracle_text: Some("{T}: Add {C}{C}.".into()),
                image_uri: Some("https://img/n.jpg".into()),
            }]
        );
    }

    #[test]
    fn double_faced_cards_fall_back_to_front_face() {
        let body = r#"{"object":"list","data":[{
            "name": "Delver of Secrets // Insectile Aberration",
            "type_line": "Creature — Human Wizard // Creature — Human Insect",
            "card_faces": [
                {"mana_cost": "{U}", "oracle_text": "At the beginning of your upkeep...",
                 "image_uris": {"normal": "https://img/front.jpg"}},
                {"mana_cost": "", "oracle_text": "Flying",
                 "image_uris": {"normal": "https://img/back.jpg"}}
            ]
        }]}"#;
        let card = parse_search_response(200, body.as_bytes())
            .unwrap()
            .remove(0);
        assert_eq!(card.mana_cost.as_deref(), Some("{U}"));
        assert_eq!(card.image_uri.as_deref(), Some("https://img/front.jpg"));
        assert!(card.oracle_text.unwrap().starts_with("At the beginning"));
    }

    #[test]
    fn not_found_is_an_empty_result() {
        let body = r#"{"object":"error","code":"not_found","status":404,
            "details":"Your query didn't match any cards."}"#;
        assert!(parse_search_response(404, body.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn other_errors_are_lookup_failures() {
        let bad_query = r#"{"object":"error","code":"bad_request","status":400,"details":"bad"}"#;
        assert!(matches!(
            parse_search_response(400, bad_query.as_bytes()),
            Err(AppError::LookupUnavailable(_))
        ));

        assert!(matches!(
            parse_search_response(502, b"<html>Bad Gateway</html>"),
            Err(AppError::LookupUnavailable(_))
        ));

        let list_with_bad_status = r#"{"object":"list","data":[]}"#;
        assert!(matches!(
            parse_search_response(500, list_with_bad_status.as_bytes()),
            Err(AppError::LookupUnavailable(_))
        ));
    }

    #[test]
    fn exact_name_queries_are_quoted() {
        assert_eq!(exact_name_query("Sol Ring"), r#"!"Sol Ring""#);
        assert_eq!(exact_name_query(r#"Kongming, "Sleeping Dragon""#),
            r#"!"Kongming, \"Sleeping Dragon\"""#);
    }

    #[test]
    fn search_query_assembly() {
        assert_eq!(build_search_query("  ", "", ""), None);
        assert_eq!(build_search_query("goblin", "", "").as_deref(), Some("goblin"));
        assert_eq!(
            build_search_query("", "gwxg", "").as_deref(),
            Some("* id>=GW")
        );
        assert_eq!(
            build_search_query("elf", "G", "creature").as_deref(),
            Some("elf id>=G t:creature")
        );
        assert_eq!(
            build_search_query("", "", "legendary creature").as_deref(),
            Some(r#"* t:"legendary creature""#)
        );
    }

    #[test]
    fn commander_queries() {
        assert_eq!(commander_query(""), None);
        assert_eq!(commander_query(" Atraxa ").as_deref(), Some("Atraxa is:commander"));
    }

    #[tokio::test]
    async fn unreachable_catalog_is_lookup_unavailable() {
        let client = ScryfallClient::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        let err = client.search("Sol Ring").await.unwrap_err();
        assert!(matches!(err, AppError::LookupUnavailable(_)));
    }
}
