pub mod fetch;
pub mod health;
pub mod models;
pub mod reports;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_handler))
        .route("/sources", get(fetch::handle_sources))
        // Model catalog
        .route("/models", get(models::handle_list_models))
        .route("/models/select", post(models::handle_select_model))
        .route("/models/current", get(models::handle_current_model))
        // Fetch orchestration
        .route("/fetch-news", post(fetch::handle_fetch_news))
        .route("/fetch-status", get(fetch::handle_fetch_status))
        // Reports by calendar date
        .route("/reports", get(reports::handle_list_reports))
        .route("/reports/latest", get(reports::handle_latest_report))
        .route(
            "/reports/:date",
            get(reports::handle_get_report).delete(reports::handle_delete_report),
        )
        .route("/news/structured", get(reports::handle_structured_news));

    Router::new().nest("/api", api).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::Value;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use crate::annotate::tests::fixed_now;
    use crate::clock::{Clock, FixedClock};
    use crate::llm_client::catalog::{ModelCatalog, ModelInfo};
    use crate::models::news::{AnnotatedItem, Category, Importance, Source};
    use crate::models::report::DailyReport;
    use crate::orchestrator::status::StatusTracker;
    use crate::orchestrator::{CollectError, Collector, FetchJob, Orchestrator};
    use crate::report::builder::{empty_report, select_top_stories};
    use crate::report::store::ReportStore;

    /// Holds every run open until the test releases it.
    struct Parked(Arc<Notify>);

    #[async_trait]
    impl Collector for Parked {
        async fn run(&self, job: &FetchJob, progress: &StatusTracker) -> Result<DailyReport, CollectError> {
            progress.update(15, "Fetching RSS articles...");
            self.0.notified().await;
            Ok(empty_report(job.target_date, &FixedClock(fixed_now())))
        }
    }

    async fn app(dir: &std::path::Path) -> (Router, ReportStore) {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(fixed_now()));
        let reports = ReportStore::open(dir).await.unwrap();
        let orchestrator = Orchestrator::new(
            StatusTracker::new(clock.clone()),
            Arc::new(Parked(Arc::new(Notify::new()))),
        );
        let state = AppState {
            orchestrator,
            reports: reports.clone(),
            sources: Arc::new(vec![Source {
                name: "Feed".into(),
                url: "https://feed.example/rss".into(),
                description: String::new(),
            }]),
            models: ModelCatalog::new(
                vec![
                    ModelInfo::fallback("Qwen/Qwen3-8B"),
                    ModelInfo::fallback("deepseek-ai/DeepSeek-V3"),
                ],
                "Qwen/Qwen3-8B",
            ),
            clock,
        };
        (build_router(state), reports)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn item(title: &str, category: Category, importance: Importance) -> AnnotatedItem {
        AnnotatedItem {
            title: title.into(),
            original_title: title.into(),
            source: "Feed".into(),
            source_description: String::new(),
            original_link: format!("https://feed.example/{title}"),
            summary: format!("{title} summary"),
            content: "body".into(),
            category,
            importance,
            key_points: vec!["k1".into(), "k2".into(), "k3".into()],
            tags: vec![],
            published_date: None,
            processed_time: fixed_now(),
            is_today_news: true,
        }
    }

    fn report(day: u32, items: Vec<AnnotatedItem>) -> DailyReport {
        let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
        let mut report = empty_report(date, &FixedClock(fixed_now()));
        report.total_count = items.len();
        report.processed_articles_count = items.len();
        report.top_stories = select_top_stories(&items);
        report.all_news = items;
        report.summary = format!("Report for day {day}");
        report
    }

    #[tokio::test]
    async fn test_health_reports_timezone() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(dir.path()).await;
        let (status, body) = send(&app, Method::GET, "/api/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timezone"], "Asia/Shanghai");
        assert_eq!(body["utc_offset"], "+08:00");
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_date() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(dir.path()).await;
        let (status, body) = send(&app, Method::POST, "/api/fetch-news", r#"{"date": "10/06/2024"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_fetch_accepts_then_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(dir.path()).await;

        let (status, body) = send(&app, Method::POST, "/api/fetch-news", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["target_date"], "2024-06-10");

        let (_, polled) = send(&app, Method::GET, "/api/fetch-status", "").await;
        assert_eq!(polled["is_fetching"], true);
        assert_eq!(polled["phase"], "fetching");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/fetch-news",
            r#"{"date": "2024-06-09", "force_refresh": true}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"]["is_fetching"], true);
        assert_eq!(body["status"]["start_time"], polled["start_time"]);
    }

    #[tokio::test]
    async fn test_existing_report_requires_force_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let (app, reports) = app(dir.path()).await;
        reports.save(&report(10, vec![item("a", Category::Other, Importance::Low)])).await.unwrap();

        let (status, body) = send(&app, Method::POST, "/api/fetch-news", r#"{"date": "2024-06-10"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["force_refresh_required"], true);
        assert_eq!(body["report"]["total_count"], 1);

        let (_, polled) = send(&app, Method::GET, "/api/fetch-status", "").await;
        assert_eq!(polled["is_fetching"], false);
    }

    #[tokio::test]
    async fn test_report_crud_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let (app, reports) = app(dir.path()).await;
        reports.save(&report(8, vec![])).await.unwrap();
        reports.save(&report(9, vec![item("b", Category::Other, Importance::High)])).await.unwrap();

        let (_, list) = send(&app, Method::GET, "/api/reports", "").await;
        assert_eq!(list["total_count"], 2);
        assert_eq!(list["reports"][0]["date"], "2024-06-09");

        let (_, latest) = send(&app, Method::GET, "/api/reports/latest", "").await;
        assert_eq!(latest["summary"], "Report for day 9");

        let (status, _) = send(&app, Method::GET, "/api/reports/2024-06-01", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, "/api/reports/2024-06-09", "").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::DELETE, "/api/reports/2024-06-09", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, latest) = send(&app, Method::GET, "/api/reports/latest", "").await;
        assert_eq!(latest["summary"], "Report for day 8");
    }

    #[tokio::test]
    async fn test_structured_news_remaps_and_duplicates_link() {
        let dir = tempfile::tempdir().unwrap();
        let (app, reports) = app(dir.path()).await;
        reports
            .save(&report(
                10,
                vec![
                    item("deal", Category::FundingAcquisition, Importance::Medium),
                    item("paper", Category::ResearchProgress, Importance::High),
                ],
            ))
            .await
            .unwrap();

        let (status, body) = send(&app, Method::GET, "/api/news/structured?date=2024-06-10", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 2);
        let first = &body["news_items"][0];
        assert_eq!(first["category"], "industry_news");
        assert_eq!(first["url"], first["original_link"]);
        assert_eq!(first["timestamp"], "2024-06-10T09:30:00+08:00");
        assert_eq!(body["news_items"][1]["category"], "research_progress");
    }

    #[tokio::test]
    async fn test_structured_news_missing_day() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(dir.path()).await;
        let (status, body) = send(&app, Method::GET, "/api/news/structured", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["news_items"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_sources_listing() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(dir.path()).await;
        let (_, body) = send(&app, Method::GET, "/api/sources", "").await;
        assert_eq!(body["total_count"], 1);
        assert_eq!(body["sources"][0]["name"], "Feed");
    }

    #[tokio::test]
    async fn test_model_catalog_select_and_current() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(dir.path()).await;

        let (_, list) = send(&app, Method::GET, "/api/models", "").await;
        assert_eq!(list["total_count"], 2);
        assert_eq!(list["current_model"], "Qwen/Qwen3-8B");
        assert_eq!(list["models"][0]["is_current"], true);
        assert_eq!(list["models"][1]["model_name"], "DeepSeek-V3");

        let (status, _) = send(&app, Method::POST, "/api/models/select", r#"{"model_id": "gpt-x"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::POST, "/api/models/select", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/models/select",
            r#"{"model_id": "deepseek-ai/DeepSeek-V3"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"]["model_id"], "deepseek-ai/DeepSeek-V3");

        let (_, current) = send(&app, Method::GET, "/api/models/current", "").await;
        assert_eq!(current["model"]["model_id"], "deepseek-ai/DeepSeek-V3");
    }

    #[tokio::test]
    async fn test_fetch_rejects_unknown_model() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app(dir.path()).await;

        let (status, body) = send(&app, Method::POST, "/api/fetch-news", r#"{"model_id": "Qwen/Qwen3-8b"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let (_, polled) = send(&app, Method::GET, "/api/fetch-status", "").await;
        assert_eq!(polled["is_fetching"], false);

        let (status, _) = send(&app, Method::POST, "/api/fetch-news", r#"{"model_id": "Qwen/Qwen3-8B"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }
}
