// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! JSON-over-HTTP collection store.

use async_trait::async_trait;
use core_types::types::{
    Endpoint, ItemKey, OrderedItem, Page, Predicate, QueryRequest, SortDirection,
    ViewDefinition, ViewHandle,
};
use log::debug;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::{RemoteCollectionStore, ResolutionError, StoreError, StoreResult};

const API_PREFIX: [&str; 2] = ["v1", "stores"];

#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url_override: Option<String>,
}

impl RestStore {
    pub fn new(client: Client, base_url_override: Option<String>) -> Self {
        Self {
            client,
            base_url_override,
        }
    }
}

/// Base URL for `identity`: the configured override, or `https://<domain>/collections`.
pub fn derive_base_url(
    identity: &str,
    base_url_override: Option<&str>,
) -> Result<Url, ResolutionError> {
    if let Some(base) = base_url_override {
        return Ok(Url::parse(base)?);
    }
    let domain = identity
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
        .ok_or_else(|| ResolutionError::UnsupportedIdentity {
            identity: identity.to_string(),
        })?;
    Ok(Url::parse(&format!("https://{domain}/collections"))?)
}

fn store_url(base: &str, identity: &str, segments: &[&str]) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(API_PREFIX)
        .push(identity)
        .extend(segments);
    Ok(url)
}

fn items_url(
    endpoint: &Endpoint,
    view: &ViewHandle,
    request: &QueryRequest,
) -> Result<Url, url::ParseError> {
    let mut url = store_url(
        &endpoint.base_url,
        &endpoint.identity,
        &["views", view.id.0.as_str(), "items"],
    )?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("offset", &request.offset.to_string())
            .append_pair("limit", &request.size.to_string());
        match request.sort {
            Some(SortDirection::Ascending) => {
                pairs.append_pair("sort", "key.asc");
            }
            Some(SortDirection::Descending) => {
                pairs.append_pair("sort", "key.desc");
            }
            None => {}
        }
        match request.predicate {
            Some(Predicate::KeyEquals(key)) => {
                pairs.append_pair("key_eq", &key.to_string());
            }
            Some(Predicate::KeyExists) => {
                pairs.append_pair("key_exists", "true");
            }
            None => {}
        }
    }
    Ok(url)
}

fn check_status(operation: &'static str, resp: &reqwest::Response) -> StoreResult<()> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else if status.as_u16() == 429 {
        Err(StoreError::Throttled)
    } else {
        Err(StoreError::UnexpectedStatus {
            operation,
            status: status.as_u16(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StoreRecord {
    root_view: ViewHandle,
}

#[derive(Debug, Deserialize)]
struct ViewsResponse {
    #[serde(default)]
    views: Vec<ViewHandle>,
}

#[derive(Debug, Serialize)]
struct NewItem<'a> {
    key: ItemKey,
    payload: Option<&'a str>,
}

#[async_trait]
impl RemoteCollectionStore for RestStore {
    async fn resolve_endpoint(&self, identity: &str) -> Result<Endpoint, ResolutionError> {
        let base = derive_base_url(identity, self.base_url_override.as_deref())?;
        let probe = store_url(base.as_str(), identity, &[])?;
        debug!("probing store endpoint {probe}");
        let resp = self.client.get(probe).send().await?;
        if !resp.status().is_success() {
            return Err(ResolutionError::Status {
                status: resp.status().as_u16(),
            });
        }
        Ok(Endpoint {
            identity: identity.to_string(),
            base_url: base.to_string(),
        })
    }

    async fn root_view(&self, endpoint: &Endpoint) -> StoreResult<ViewHandle> {
        let url = store_url(&endpoint.base_url, &endpoint.identity, &[])?;
        let resp = self.client.get(url).send().await?;
        check_status("root_view", &resp)?;
        let record: StoreRecord = resp.json().await?;
        Ok(record.root_view)
    }

    async fn query(
        &self,
        endpoint: &Endpoint,
        view: &ViewHandle,
        request: &QueryRequest,
    ) -> StoreResult<Page> {
        let url = items_url(endpoint, view, request)?;
        let resp = self.client.get(url).send().await?;
        check_status("query", &resp)?;
        Ok(resp.json().await?)
    }

    async fn find_views(
        &self,
        endpoint: &Endpoint,
        display_name: &str,
    ) -> StoreResult<Vec<ViewHandle>> {
        let mut url = store_url(&endpoint.base_url, &endpoint.identity, &["views"])?;
        url.query_pairs_mut().append_pair("name", display_name);
        let resp = self.client.get(url).send().await?;
        check_status("find_views", &resp)?;
        let parsed: ViewsResponse = resp.json().await?;
        Ok(parsed.views)
    }

    async fn create_view(
        &self,
        endpoint: &Endpoint,
        definition: &ViewDefinition,
    ) -> StoreResult<ViewHandle> {
        let url = store_url(&endpoint.base_url, &endpoint.identity, &["views"])?;
        let resp = self.client.post(url).json(definition).send().await?;
        check_status("create_view", &resp)?;
        Ok(resp.json().await?)
    }

    async fn delete_view(&self, endpoint: &Endpoint, view: &ViewHandle) -> StoreResult<()> {
        let mut url = store_url(
            &endpoint.base_url,
            &endpoint.identity,
            &["views", view.id.0.as_str()],
        )?;
        url.query_pairs_mut().append_pair("mode", "hard");
        let resp = self.client.delete(url).send().await?;
        if resp.status().as_u16() == 404 {
            return Err(StoreError::ViewNotFound {
                view: view.id.clone(),
            });
        }
        check_status("delete_view", &resp)
    }

    async fn create_item(
        &self,
        endpoint: &Endpoint,
        view: &ViewHandle,
        key: ItemKey,
        payload: Option<String>,
    ) -> StoreResult<OrderedItem> {
        let url = store_url(
            &endpoint.base_url,
            &endpoint.identity,
            &["views", view.id.0.as_str(), "items"],
        )?;
        let body = NewItem {
            key,
            payload: payload.as_deref(),
        };
        let resp = self.client.post(url).json(&body).send().await?;
        check_status("create_item", &resp)?;
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::types::{ViewId, ViewKind};

    fn endpoint() -> Endpoint {
        Endpoint {
            identity: "bench@example.com".to_string(),
            base_url: "https://example.com/collections".to_string(),
        }
    }

    fn view() -> ViewHandle {
        ViewHandle {
            id: ViewId("v 1".to_string()),
            display_name: "filtered".to_string(),
            kind: ViewKind::Filtered,
            created_seq: 3,
        }
    }

    #[test]
    fn base_url_comes_from_identity_domain() {
        let url = derive_base_url("bench@example.com", None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/collections");

        let url = derive_base_url("bench@example.com", Some("http://localhost:8080/")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");

        assert!(matches!(
            derive_base_url("no-domain", None),
            Err(ResolutionError::UnsupportedIdentity { .. })
        ));
        assert!(derive_base_url("trailing@", None).is_err());
    }

    #[test]
    fn store_urls_escape_segments() {
        let url = store_url("http://localhost:8080/", "a@b.c", &["views"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/stores/a@b.c/views");
    }

    #[test]
    fn items_url_encodes_window_sort_and_filter() {
        let request = QueryRequest::window(42, 1)
            .with_predicate(Predicate::KeyEquals(7))
            .sorted(SortDirection::Ascending);
        let url = items_url(&endpoint(), &view(), &request).unwrap();
        assert_eq!(url.path(), "/collections/v1/stores/bench@example.com/views/v%201/items");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("offset".to_string(), "42".to_string()),
                ("limit".to_string(), "1".to_string()),
                ("sort".to_string(), "key.asc".to_string()),
                ("key_eq".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn wire_records_deserialize() {
        let page: Page = serde_json::from_str(
            r#"{"items":[{"id":"i1","key":12}],"total_count":100}"#,
        )
        .unwrap();
        assert_eq!(page.total_count, 100);
        assert_eq!(page.items[0].key, 12);
        assert!(page.items[0].payload.is_none());

        let views: ViewsResponse = serde_json::from_str(
            r#"{"views":[{"id":"v1","display_name":"x","kind":"filtered","created_seq":9}]}"#,
        )
        .unwrap();
        assert_eq!(views.views[0].kind, ViewKind::Filtered);
    }
}
