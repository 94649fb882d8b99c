use super::{
    extract_files, parse_response, prepare_multipart, JSMap, Middleware, NetworkQueryer,
    QueryInput, Queryer,
};
use crate::error::Result;
use async_trait::async_trait;
use tracing::trace;

/// A [Queryer] that sends every query as its own HTTP request.
///
/// Queries whose variables contain [Upload](super::Upload)s are sent as `multipart/form-data`
/// requests. All other queries are sent as JSON.
#[derive(Debug, Clone)]
pub struct SingleRequestQueryer {
    queryer: NetworkQueryer,
}

impl SingleRequestQueryer {
    pub fn new<S: Into<String>>(url: S) -> Self {
        SingleRequestQueryer {
            queryer: NetworkQueryer::new(url),
        }
    }

    #[inline]
    pub fn url(&self) -> &str {
        self.queryer.url()
    }
}

#[async_trait]
impl Queryer for SingleRequestQueryer {
    async fn execute(&self, input: &QueryInput) -> Result<JSMap> {
        let mut input = input.clone();
        let uploads = extract_files(&mut input.variables);
        let payload = serde_json::to_vec(&input)?;

        let body = if uploads.is_empty() {
            self.queryer.send_query(payload).await?
        } else {
            trace!(uploads = uploads.len(), "sending query as multipart request");
            let (body, content_type) = prepare_multipart(&payload, &uploads)?;
            self.queryer.send_multipart(body, &content_type).await?
        };

        parse_response(&body)
    }

    fn with_middlewares(mut self, middlewares: Vec<Middleware>) -> Self {
        self.queryer = self.queryer.with_middlewares(middlewares);
        self
    }

    fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.queryer = self.queryer.with_http_client(client);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorType};
    use crate::queryer::{middleware, QueryerExt, Upload};
    use reqwest::header::HeaderValue;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, header_exists, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Default, Deserialize)]
    struct Hello {
        hello: String,
    }

    async fn hello_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "hello": "world" } })),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn sends_json_without_uploads() {
        let server = hello_server().await;
        let queryer = SingleRequestQueryer::new(server.uri());

        let mut result = Hello::default();
        let input = QueryInput::new("query Hello($id: ID) { hello(id: $id) }")
            .with_operation_name("Hello")
            .with_variable("id", "1");
        queryer.query(&input, &mut result).await.unwrap();
        assert_eq!(result.hello, "world");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].headers.get("content-type").unwrap(),
            "application/json"
        );
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body,
            json!({
                "query": "query Hello($id: ID) { hello(id: $id) }",
                "operationName": "Hello",
                "variables": { "id": "1" }
            })
        );
    }

    #[tokio::test]
    async fn sends_multipart_with_uploads() {
        let server = hello_server().await;
        let queryer = SingleRequestQueryer::new(server.uri());

        let input = QueryInput::new("mutation($file: Upload!) { upload(file: $file) }")
            .with_variable("file", Upload::new("file contents", "notes.txt"));
        let mut result = Hello::default();
        queryer.query(&input, &mut result).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let content_type = requests[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        let body = String::from_utf8(requests[0].body.clone()).unwrap();
        assert!(body.contains(
            r#"{"query":"mutation($file: Upload!) { upload(file: $file) }","operationName":null,"variables":{"file":null}}"#
        ));
        assert!(body.contains(r#"{"0":["variables.file"]}"#));
        assert!(body.contains("name=\"0\"; filename=\"notes.txt\""));
        assert!(body.contains("file contents"));

        assert!(matches!(
            input.variables["file"],
            crate::queryer::VariableValue::Upload(_)
        ));
    }

    #[tokio::test]
    async fn applies_middlewares() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .and(header_exists("content-type"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "hello": "world" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let queryer = SingleRequestQueryer::new(server.uri()).with_middlewares(vec![middleware(
            |request| {
                request
                    .headers_mut()
                    .insert("authorization", HeaderValue::from_static("Bearer secret"));
                Ok(())
            },
        )]);

        let mut result = Hello::default();
        queryer
            .query(&QueryInput::new("{ hello }"), &mut result)
            .await
            .unwrap();
        assert_eq!(result.hello, "world");
    }

    #[tokio::test]
    async fn failing_middleware_sends_nothing() {
        let server = hello_server().await;
        let queryer = SingleRequestQueryer::new(server.uri()).with_middlewares(vec![middleware(
            |_| {
                Err(Error::new(
                    "missing credentials",
                    ErrorType::Transport { status: None },
                ))
            },
        )]);

        let error = queryer
            .execute(&QueryInput::new("{ hello }"))
            .await
            .unwrap_err();
        assert_eq!(error.message(), "missing credentials");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsuccessful_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let error = SingleRequestQueryer::new(server.uri())
            .execute(&QueryInput::new("{ hello }"))
            .await
            .unwrap_err();
        assert_eq!(error.status(), Some(500));
        assert_eq!(error.context(), Some("Internal Server Error"));
    }

    #[tokio::test]
    async fn invalid_json_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let error = SingleRequestQueryer::new(server.uri())
            .execute(&QueryInput::new("{ hello }"))
            .await
            .unwrap_err();
        assert_eq!(error.message(), "Response body was not valid json");
        assert_eq!(error.error_type(), &ErrorType::Protocol);
    }

    #[tokio::test]
    async fn graphql_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [
                    { "message": "First" },
                    { "message": "Second", "path": ["hello", 0] }
                ]
            })))
            .mount(&server)
            .await;

        let mut result = Hello::default();
        let error = SingleRequestQueryer::new(server.uri())
            .query(&QueryInput::new("{ hello }"), &mut result)
            .await
            .unwrap_err();
        assert_eq!(error.graphql_errors().unwrap().len(), 2);
        assert_eq!(error.message(), "First. Second");
    }
}
