/* This file is part of the vidshelf project
*
*  Copyright (C) 2025 vidshelf contributors
*
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::needless_pass_by_value)]
use std::sync::Arc;
use actix_web::{delete, get, http::{header::{ContentDisposition, ContentType}, StatusCode}, patch, post, web, HttpResponse, Responder};
use cloneable_errors::{anyhow, ResContext, ResExtensions};
use serde::Deserialize;
use vidshelf_api::*;
use vidshelf_core::{canonicalize, extract_shared_url, youtube_video_id, ItemId, ItemPatch};
use vidshelf_resolver::ResolutionOutcome;

use crate::{errors::{self, extensions::status::BAD_REQUEST, Error}, state::*};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(helo)
       .service(get_status)
       .service(get_items)
       .service(add_item)
       .service(delete_item)
       .service(toggle_pin)
       .service(update_item)
       .service(refresh_item)
       .service(get_canonical)
       .service(get_resolved)
       .service(export_items)
       .service(import_items)
       .service(seed_samples)
       .service(share_target)
       .service(restart_pass);
}

type JsonResult<T> = errors::Result<web::Json<T>>;

const NOT_FOUND: Error = Error::EmptyStatus(StatusCode::NOT_FOUND);

#[derive(Deserialize)]
struct UrlQuery {
    url: String,
}

#[derive(Deserialize)]
struct ShareQuery {
    url: Option<String>,
    text: Option<String>,
}

#[get("/")]
async fn helo() -> impl Responder {
    "hi"
}

#[get("/status")]
async fn get_status(library: LibraryLock, scheduler: SchedulerData, config: web::Data<AppConfig>) -> JsonResult<StatusResponse> {
    let (items, pinned, needing_metadata) = {
        let items = library.read()?;
        (items.len(), items.iter().filter(|i| i.pinned).count(), items.iter().filter(|i| i.needs_metadata()).count())
    };
    Ok(web::Json(StatusResponse {
        items,
        pinned,
        needing_metadata,
        pass_running: scheduler.is_running()?,
        last_pass: scheduler.last_pass()?,
        server_version: Some(env!("CARGO_PKG_VERSION").into()),
        server_startup_timestamp: Some(config.startup_timestamp.timestamp()),
    }))
}

#[get("/items")]
async fn get_items(library: LibraryLock) -> JsonResult<Vec<ApiItem>> {
    let items = library.read()?;
    Ok(web::Json(items.iter().map(ApiItem::from).collect()))
}

#[post("/items")]
async fn add_item(library: LibraryLock, scheduler: SchedulerData, body: web::Json<AddItemRequest>) -> JsonResult<ApiItem> {
    let item = library.modify(|items| items.add(&body.url).map(ApiItem::from))?;
    scheduler.restart_logged();
    Ok(web::Json(item))
}

#[delete("/items/{id}")]
async fn delete_item(library: LibraryLock, path: web::Path<String>) -> errors::Result<HttpResponse> {
    let id = ItemId::from(path.into_inner());
    library.modify(|items| items.remove(&id).ok_or(NOT_FOUND))?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/items/{id}/pin")]
async fn toggle_pin(library: LibraryLock, path: web::Path<String>) -> JsonResult<PinResponse> {
    let id = ItemId::from(path.into_inner());
    let pinned = library.modify(|items| items.toggle_pin(&id).ok_or(NOT_FOUND))?;
    Ok(web::Json(PinResponse { pinned }))
}

#[patch("/items/{id}")]
async fn update_item(library: LibraryLock, path: web::Path<String>, body: web::Json<UpdateItemRequest>) -> JsonResult<ApiItem> {
    let id = ItemId::from(path.into_inner());
    let patch: ItemPatch = body.into_inner().into();
    let item = library.modify(|items| items.update(&id, patch).map(ApiItem::from).ok_or(NOT_FOUND))?;
    Ok(web::Json(item))
}

#[post("/items/{id}/refresh")]
async fn refresh_item(library: LibraryLock, resolver: ResolverData, path: web::Path<String>) -> JsonResult<ApiItem> {
    let id = ItemId::from(path.into_inner());
    let url = library.url_of(&id)?.ok_or(NOT_FOUND)?;
    if let Some(metadata) = resolver.resolve(&url).await.into_metadata() {
        library.apply_metadata(&id, metadata);
    }
    let items = library.read()?;
    Ok(web::Json(items.get(&id).map(ApiItem::from).ok_or(NOT_FOUND)?))
}

#[get("/canonicalize")]
async fn get_canonical(query: web::Query<UrlQuery>) -> JsonResult<CanonicalizeResponse> {
    let canonical = canonicalize(&query.url)?;
    Ok(web::Json(CanonicalizeResponse {
        video_id: youtube_video_id(canonical.as_url()).map(Into::into),
        canonical: canonical.as_str().into(),
    }))
}

#[get("/resolve")]
async fn get_resolved(resolver: ResolverData, query: web::Query<UrlQuery>) -> JsonResult<ResolveResponse> {
    let canonical = canonicalize(&query.url)?;
    let (source, metadata): (Option<Arc<str>>, Option<ApiMetadata>) = match resolver.resolve(&canonical).await {
        ResolutionOutcome::Resolved { metadata, source } => (Some(source.to_string().into()), Some((&metadata).into())),
        ResolutionOutcome::Empty => (None, None),
    };
    Ok(web::Json(ResolveResponse {
        canonical: canonical.as_str().into(),
        source,
        metadata,
    }))
}

#[get("/export")]
async fn export_items(library: LibraryLock) -> errors::Result<HttpResponse> {
    let body = {
        let items = library.read()?;
        serde_json::to_string_pretty(&items.to_vec()).context("Failed to serialize the item collection")?
    };
    Ok(HttpResponse::Ok()
        .insert_header(ContentType::json())
        .insert_header(ContentDisposition::attachment("vidshelf-export.json"))
        .body(body))
}

#[post("/import")]
async fn import_items(library: LibraryLock, scheduler: SchedulerData, body: String) -> JsonResult<ImportResponse> {
    let report = library.modify(|items| items.import_json(&body).extend(BAD_REQUEST.clone()))?;
    scheduler.restart_logged();
    Ok(web::Json(report.into()))
}

#[post("/samples")]
async fn seed_samples(library: LibraryLock, scheduler: SchedulerData) -> JsonResult<Vec<ApiItem>> {
    let items: Vec<ApiItem> = library.modify(|items| {
        items.reset_to_samples();
        Ok::<_, Error>(items.iter().map(ApiItem::from).collect())
    })?;
    scheduler.restart_logged();
    Ok(web::Json(items))
}

#[get("/share")]
async fn share_target(library: LibraryLock, scheduler: SchedulerData, query: web::Query<ShareQuery>) -> JsonResult<ApiItem> {
    let Some(shared) = extract_shared_url(query.url.as_deref(), query.text.as_deref()) else {
        return Err(anyhow!("No URL found in the shared data", extend: BAD_REQUEST.clone()).into());
    };
    let item = library.modify(|items| items.add(shared).map(ApiItem::from))?;
    scheduler.restart_logged();
    Ok(web::Json(item))
}

#[post("/resolve_pass")]
async fn restart_pass(scheduler: SchedulerData) -> errors::Result<HttpResponse> {
    if scheduler.restart()? {
        Ok(HttpResponse::Accepted().body("Resolution pass started"))
    } else {
        Ok(HttpResponse::Ok().body("No items need metadata"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use actix_web::{http::StatusCode, test, web, App};
    use reqwest::Client;
    use serde_json::json;
    use vidshelf_api::*;
    use vidshelf_core::{ItemCollection, ItemStore, MemoryStore, SAMPLE_URLS};
    use vidshelf_resolver::{Endpoints, MetadataResolver};

    use crate::state::*;

    struct Fixture {
        library: LibraryLock,
        scheduler: SchedulerData,
        resolver: ResolverData,
        store: Arc<MemoryStore>,
    }

    /// Every external service points at a closed local port, so passes finish quickly without results
    fn fixture(items: ItemCollection) -> Fixture {
        let mut endpoints = Endpoints::default();
        for url in [
            &mut endpoints.unshorten,
            &mut endpoints.youtube_oembed,
            &mut endpoints.vimeo_oembed,
            &mut endpoints.dailymotion_oembed,
            &mut endpoints.noembed,
            &mut endpoints.microlink,
        ] {
            url.set_scheme("http").unwrap();
            url.set_host(Some("127.0.0.1")).unwrap();
            url.set_port(Some(1)).unwrap();
        }
        let store = Arc::new(MemoryStore::new());
        let library = web::Data::new(LibraryState::new(items, store.clone()));
        let resolver = Arc::new(MetadataResolver::with_endpoints(Client::new(), &endpoints));
        let scheduler = web::Data::new(PassScheduler::new(resolver.clone(), library.clone()));
        Fixture { library, scheduler, resolver: web::Data::from(resolver), store }
    }

    macro_rules! init_app {
        ($fixture:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppConfig::default()))
                    .app_data($fixture.library.clone())
                    .app_data($fixture.scheduler.clone())
                    .app_data($fixture.resolver.clone())
                    .service(web::scope("/api").configure(super::configure))
            ).await
        };
    }

    fn stored_urls(store: &MemoryStore) -> Vec<String> {
        store.load().unwrap().unwrap_or_default().into_iter().map(|item| item.url.to_string()).collect()
    }

    #[actix_web::test]
    async fn adding_items() {
        let fixture = fixture(ItemCollection::new());
        let app = init_app!(fixture);

        let req = test::TestRequest::post().uri("/api/items").set_json(json!({"url": " https://youtu.be/dQw4w9WgXcQ "})).to_request();
        let item: ApiItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(&*item.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(item.needs_metadata);

        let req = test::TestRequest::post().uri("/api/items").set_json(json!({"url": "https://www.youtube.com/shorts/dQw4w9WgXcQ"})).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post().uri("/api/items").set_json(json!({"url": "ftp://example.com/x"})).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        assert_eq!(stored_urls(&fixture.store), ["https://www.youtube.com/watch?v=dQw4w9WgXcQ"]);
    }

    #[actix_web::test]
    async fn editing_items() {
        let mut items = ItemCollection::new();
        let id = items.add("https://vimeo.com/76979871").unwrap().id.to_string();
        let fixture = fixture(items);
        let app = init_app!(fixture);

        let req = test::TestRequest::post().uri(&format!("/api/items/{id}/pin")).to_request();
        let pin: PinResponse = test::call_and_read_body_json(&app, req).await;
        assert!(pin.pinned);

        let req = test::TestRequest::patch().uri(&format!("/api/items/{id}"))
            .set_json(json!({"tags": " music, live ,, 2013", "note": "watch later"}))
            .to_request();
        let item: ApiItem = test::call_and_read_body_json(&app, req).await;
        assert!(item.pinned);
        assert_eq!(item.tags, [Arc::from("music"), Arc::from("live"), Arc::from("2013")]);
        assert_eq!(&*item.note, "watch later");

        let req = test::TestRequest::get().uri("/api/items").to_request();
        let items: Vec<ApiItem> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(items, [item]);

        let req = test::TestRequest::delete().uri(&format!("/api/items/{id}")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
        let req = test::TestRequest::delete().uri(&format!("/api/items/{id}")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        let req = test::TestRequest::post().uri(&format!("/api/items/{id}/pin")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        assert!(stored_urls(&fixture.store).is_empty());
    }

    #[actix_web::test]
    async fn canonicalize_endpoint() {
        let fixture = fixture(ItemCollection::new());
        let app = init_app!(fixture);

        let req = test::TestRequest::get().uri("/api/canonicalize?url=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ%3Flist%3DPL123").to_request();
        let response: CanonicalizeResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(&*response.canonical, "https://youtu.be/dQw4w9WgXcQ?list=PL123");
        assert_eq!(response.video_id, None);

        let req = test::TestRequest::get().uri("/api/canonicalize?url=https%3A%2F%2Fwww.youtube.com%2Fembed%2Fabc123").to_request();
        let response: CanonicalizeResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(&*response.canonical, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(response.video_id.as_deref(), Some("abc123"));

        let req = test::TestRequest::get().uri("/api/canonicalize?url=not%20a%20url").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn resolve_without_reachable_providers_is_empty() {
        let fixture = fixture(ItemCollection::new());
        let app = init_app!(fixture);

        let req = test::TestRequest::get().uri("/api/resolve?url=https%3A%2F%2Fexample.com%2Fvideo").to_request();
        let response: ResolveResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(&*response.canonical, "https://example.com/video");
        assert_eq!(response.source, None);
        assert_eq!(response.metadata, None);
    }

    #[actix_web::test]
    async fn import_and_export() {
        let fixture = fixture(ItemCollection::with_samples());
        let app = init_app!(fixture);

        let payload = json!([
            {"id": "first", "url": "https://youtu.be/abc123", "pinned": 1, "tags": ["a", "b"], "note": 5},
            {"url": "javascript:alert(1)"},
            {"id": "second", "url": "https://www.youtube.com/watch?v=abc123"},
        ]);
        let req = test::TestRequest::post().uri("/api/import").set_payload(payload.to_string()).to_request();
        let report: ImportResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report, ImportResponse { imported: 1, invalid: 1, duplicates: 1 });

        let req = test::TestRequest::get().uri("/api/export").to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("content-disposition"));
        let exported: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(exported, json!([{
            "id": "first",
            "url": "https://www.youtube.com/watch?v=abc123",
            "createdAt": exported[0]["createdAt"],
            "pinned": true,
            "title": "",
            "author": "",
            "thumbnail": "",
            "provider": "",
            "tags": ["a", "b"],
            "note": "",
        }]));

        let req = test::TestRequest::post().uri("/api/import").set_payload("{\"not\": \"an array\"}").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(stored_urls(&fixture.store), ["https://www.youtube.com/watch?v=abc123"]);
    }

    #[actix_web::test]
    async fn sharing_and_samples() {
        let fixture = fixture(ItemCollection::new());
        let app = init_app!(fixture);

        let req = test::TestRequest::get().uri("/api/share?title=Cool&text=look%20at%20this%20https%3A%2F%2Fvimeo.com%2F76979871%20nice").to_request();
        let item: ApiItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(&*item.url, "https://vimeo.com/76979871");

        let req = test::TestRequest::get().uri("/api/share?text=nothing%20here").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post().uri("/api/samples").to_request();
        let items: Vec<ApiItem> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(items.len(), SAMPLE_URLS.len());

        let req = test::TestRequest::get().uri("/api/status").to_request();
        let status: StatusResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status.items, SAMPLE_URLS.len());
        assert_eq!(status.pinned, 0);
        assert_eq!(status.needing_metadata, SAMPLE_URLS.len());
    }
}
