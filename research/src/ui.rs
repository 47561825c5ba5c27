use crate::Result;
use crate::research::Researcher;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

const PAGE: &str = include_str!("page.html");

#[derive(Clone)]
struct AppState {
    researcher: Arc<Researcher>,
}

pub fn router(researcher: Arc<Researcher>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/api/research", post(api_research))
        .route("/health", get(health))
        .with_state(AppState { researcher })
}

pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("research assistant running on http://{}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}

enum Output {
    Empty,
    Answer(String),
    Failure(String),
}

fn render(goal: &str, output: Output) -> Html<String> {
    let output = match output {
        Output::Empty => String::new(),
        Output::Answer(answer) => format!(
            "<p>Doing research for {}</p>\n<pre class=\"answer\">{}</pre>",
            html_escape::encode_text(goal),
            html_escape::encode_text(&answer)
        ),
        Output::Failure(message) => format!(
            "<p class=\"error\">{}</p>",
            html_escape::encode_text(&message)
        ),
    };

    let goal = html_escape::encode_double_quoted_attribute(goal);
    Html(fill(PAGE, &[("{goal}", &*goal), ("{output}", output.as_str())]))
}

/// Substitutes placeholders in a single left to right pass, so text inserted
/// for one placeholder is never scanned for another.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut page = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        page.push_str(&rest[..start]);
        rest = &rest[start..];

        match values.iter().find(|(key, _)| rest.starts_with(*key)) {
            Some((key, value)) => {
                page.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                page.push('{');
                rest = &rest[1..];
            }
        }
    }

    page.push_str(rest);
    page
}

async fn index() -> Html<String> {
    render("", Output::Empty)
}

#[derive(Deserialize)]
struct ResearchForm {
    goal: String,
}

async fn submit(State(state): State<AppState>, Form(form): Form<ResearchForm>) -> Html<String> {
    let goal = form.goal.trim();
    if goal.is_empty() {
        return render(goal, Output::Failure("Please enter a research goal.".to_string()));
    }

    match state.researcher.research(goal).await {
        Ok(answer) => render(goal, Output::Answer(answer)),
        Err(err) => {
            tracing::error!(goal, error = %err, "research failed");
            render(goal, Output::Failure(format!("Research failed: {}", err)))
        }
    }
}

#[derive(Deserialize)]
struct ResearchRequest {
    query: String,
}

#[derive(Serialize)]
struct ResearchResponse {
    answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn api_research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Response {
    let query = request.query.trim();
    if query.is_empty() {
        let error = "query must not be empty".to_string();
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    match state.researcher.research(query).await {
        Ok(answer) => Json(ResearchResponse { answer }).into_response(),
        Err(err) => {
            tracing::error!(query, error = %err, "research failed");
            let error = err.to_string();
            (StatusCode::BAD_GATEWAY, Json(ErrorResponse { error })).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::{Output, render, router};
    use crate::research::tests::{ScriptedLLM, researcher};
    use agent::llm::{CompletionRequest, CompletionResponse, LLM};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Answers immediately, without using any tool.
    struct EchoLLM;

    #[async_trait]
    impl LLM for EchoLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> agent::Result<CompletionResponse> {
            let Some(agent::llm::Message::User(goal)) = request.messages.last() else {
                panic!("expected the user goal");
            };
            Ok(CompletionResponse {
                content: format!("answer to <{}>", goal),
                tool_calls: vec![],
            })
        }
    }

    fn app(llm: Arc<dyn LLM + Send + Sync>) -> axum::Router {
        // no request reaches the apis in these tests
        router(Arc::new(researcher("http://127.0.0.1:9", llm, 15)))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_form() {
        let response = app(Arc::new(EchoLLM))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("<form method=\"post\" action=\"/\">"));
        assert!(body.contains("name=\"goal\""));
    }

    #[tokio::test]
    async fn test_form_submission_renders_escaped_answer() {
        let response = app(Arc::new(EchoLLM))
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("goal=rust+%26+go"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Doing research for rust &amp; go"));
        assert!(body.contains("answer to &lt;rust &amp; go&gt;"));
        assert!(body.contains("value=\"rust &amp; go\""));
    }

    #[tokio::test]
    async fn test_blank_goal_is_rejected() {
        let response = app(Arc::new(EchoLLM))
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("goal=+++"))
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_text(response).await;
        assert!(body.contains("Please enter a research goal."));
    }

    #[tokio::test]
    async fn test_api_returns_answer() {
        let response = app(Arc::new(EchoLLM))
            .oneshot(
                Request::post("/api/research")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"query":"why rust?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["answer"], "answer to <why rust?>");
    }

    #[tokio::test]
    async fn test_api_reports_failed_research() {
        // the scripted model keeps calling tools, a single step is never enough
        let researcher = researcher("http://127.0.0.1:9", Arc::new(ScriptedLLM), 1);
        let response = router(Arc::new(researcher))
            .oneshot(
                Request::post("/api/research")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"query":"rust"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().contains("limit of 1 steps"));
    }

    #[test]
    fn test_placeholder_text_in_goal_is_not_expanded() {
        let page = render("{output}", Output::Answer("done".to_string())).0;

        assert!(page.contains("value=\"{output}\""));
        assert_eq!(page.matches("<pre class=\"answer\">").count(), 1);
        assert!(page.contains("<p>Doing research for {output}</p>"));
    }

    #[tokio::test]
    async fn test_form_reports_failed_research() {
        let researcher = researcher("http://127.0.0.1:9", Arc::new(ScriptedLLM), 1);
        let response = router(Arc::new(researcher))
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("goal=rust"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("<p class=\"error\">Research failed:"));
        assert!(body.contains("limit of 1 steps"));
        assert!(body.contains("value=\"rust\""));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(EchoLLM))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(body_text(response).await, "ok");
    }
}
