use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

#[cfg(not(test))]
use {
    axum::extract::ConnectInfo,
    std::net::IpAddr,
    std::sync::Arc,
    tower_governor::{governor::GovernorConfigBuilder, key_extractor::KeyExtractor, GovernorLayer},
    tracing::warn,
};

use crate::api::handlers::{self as api_handlers, AppState};

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let settings = &state.settings;

    // Public API routes - read-only, no authentication required
    #[cfg_attr(test, allow(unused_mut))]
    let mut api_routes = Router::new()
        .route("/languages", get(api_handlers::list_languages))
        .route("/recipes", get(api_handlers::list_recipes))
        .route("/recipes/:id", get(api_handlers::get_recipe))
        .route("/search", get(api_handlers::search_recipes))
        .route("/tags", get(api_handlers::list_tags))
        .route("/stats", get(api_handlers::get_stats))
        .with_state(state.clone());

    // Rate limiting is keyed on the peer IP and falls back to localhost when
    // the connection info is unavailable (tests, unix sockets).
    #[cfg(not(test))]
    {
        #[derive(Clone, Copy, Debug)]
        struct FallbackIpKeyExtractor;

        impl KeyExtractor for FallbackIpKeyExtractor {
            type Key = IpAddr;

            fn extract<B>(
                &self,
                req: &axum::http::Request<B>,
            ) -> Result<Self::Key, tower_governor::GovernorError> {
                if let Some(ConnectInfo(addr)) =
                    req.extensions().get::<ConnectInfo<std::net::SocketAddr>>()
                {
                    return Ok(addr.ip());
                }
                Ok(IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)))
            }
        }

        // API_RATE_LIMIT requests per second, bursts of twice that
        let rate = settings.server.api_rate_limit.max(1);
        let burst = u32::try_from(rate.saturating_mul(2)).unwrap_or(u32::MAX);
        match GovernorConfigBuilder::default()
            .key_extractor(FallbackIpKeyExtractor)
            .per_millisecond((1000 / rate).max(1))
            .burst_size(burst)
            .finish()
        {
            Some(config) => {
                api_routes = api_routes.layer(GovernorLayer {
                    config: Arc::new(config),
                });
            }
            None => warn!("Invalid API rate limit, serving without rate limiting"),
        }
    }

    let api_routes = api_routes;

    let health_routes = Router::new()
        .route("/health", get(api_handlers::health_check))
        .route("/ready", get(api_handlers::readiness_check))
        .with_state(state.clone());

    // Recipe images live next to the recipes
    let images = state.store.folder().join("images");
    let static_routes = Router::new().nest_service("/images", ServeDir::new(images));

    Router::new()
        .merge(health_routes)
        .merge(static_routes)
        .nest("/api", api_routes)
        .layer(CookieManagerLayer::new())
        .layer(
            // Request body size limit - the API is read-only
            RequestBodyLimitLayer::new(settings.server.max_request_body_size),
        )
        .layer(
            // CORS - allow all origins for read-only public API
            CorsLayer::new()
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .allow_origin(tower_http::cors::Any)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; img-src 'self'; frame-ancestors 'none'"),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::cookbook::{Cookbook, CookbookStore};
    use crate::recipe::parse_str;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let mut book = Cookbook::empty("/tmp/cookbook-test");
        for (id, lang, body) in [
            ("Soup", "en", "name Tomato soup\nserves 2\ntags warm\n\n- 4 tomatoes\n- 1.5 onions\n- 1 l stock\nSimmer\n"),
            ("Soup", "de", "name Tomatensuppe\nserves 2\ntags warm\n"),
            ("Salad", "en", "name Green salad\nserves 1\ntags quick\nrelated soup\n"),
        ] {
            let recipe = parse_str(body, id, lang, &format!("{id}.{lang}.recipe")).unwrap();
            book.insert(recipe).unwrap();
        }

        AppState {
            store: CookbookStore::from_cookbook(book),
            settings: Settings::from_lookup(|_| None).unwrap(),
        }
    }

    async fn get_json(uri: &str, cookie: Option<&str>) -> (StatusCode, Option<String>, Value) {
        let app = create_router(create_test_state());
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, set_cookie, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = get_json("/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_listing_uses_default_language() {
        let (status, cookie, body) = get_json("/api/recipes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(cookie.is_none());
        assert_eq!(body["lang"], "en");
        assert_eq!(body["total"], 2);
        assert_eq!(body["recipes"][0]["name"], "Green salad");
    }

    #[tokio::test]
    async fn test_explicit_language_sets_cookie() {
        let (status, cookie, body) = get_json("/api/recipes?lang=de", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lang"], "de");
        assert!(cookie.unwrap().starts_with("lang=de"));
    }

    #[tokio::test]
    async fn test_cookie_selects_language() {
        let (_, _, body) = get_json("/api/recipes", Some("lang=de")).await;
        assert_eq!(body["lang"], "de");
        assert_eq!(body["recipes"][0]["name"], "Tomatensuppe");

        let (_, _, body) = get_json("/api/recipes", Some("lang=fr")).await;
        assert_eq!(body["lang"], "en");
    }

    #[tokio::test]
    async fn test_unknown_language_is_not_found() {
        let (status, _, body) = get_json("/api/recipes?lang=fr", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("fr"));
    }

    #[tokio::test]
    async fn test_search() {
        let (status, _, body) = get_json("/api/search?query=tag:warm%20tomatoes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "[Tag: warm] AND [Generic: tomatoes]");
        assert_eq!(body["total"], 1);
        assert_eq!(body["results"][0]["id"], "soup");
    }

    #[tokio::test]
    async fn test_overlong_query_is_rejected() {
        let uri = format!("/api/search?query={}", "a".repeat(600));
        let (status, _, _) = get_json(&uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recipe_detail() {
        let (status, _, body) = get_json("/api/recipes/salad", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["related"][0]["name"], "Tomato soup");

        let (_, _, body) = get_json("/api/recipes/soup?lang=de", None).await;
        assert_eq!(body["name"], "Tomatensuppe");
        assert_eq!(body["translations"], serde_json::json!(["en"]));

        let (_, _, body) = get_json("/api/recipes/soup", None).await;
        assert_eq!(body["ingredients"][0]["amount_display"], "4");
        assert_eq!(body["ingredients"][1]["amount_display"], "1 ½");
        assert_eq!(body["ingredients"][1]["count"], 2);
        assert!(body["ingredients"][2]["count"].is_null());
        assert_eq!(body["sections"][0]["steps"][0]["instructions"][0]["value"], "Simmer");
    }

    #[tokio::test]
    async fn test_missing_recipe() {
        let (status, _, _) = get_json("/api/recipes/pizza", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tags_and_stats() {
        let (_, _, body) = get_json("/api/tags", None).await;
        assert_eq!(body["tags"].as_array().unwrap().len(), 2);

        let (_, _, body) = get_json("/api/stats", None).await;
        assert_eq!(body["total_recipes"], 2);
        assert_eq!(body["total_translations"], 3);
        assert_eq!(body["total_languages"], 2);
    }
}
