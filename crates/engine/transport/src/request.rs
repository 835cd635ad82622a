//! Request descriptions handed to a transport

use serde_json::Value;

/// HTTP methods used by the service clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
        };
        f.write_str(name)
    }
}

/// A JSON request against an absolute URL
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    pub method: Method,
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present
    pub bearer_token: Option<String>,
    pub body: Option<Value>,
}

impl JsonRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer_token: None,
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, url).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Transport-neutral multipart form body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }

    /// Value of the first text field with the given name
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// File name and size of the first file field with the given name
    pub fn file_info(&self, name: &str) -> Option<(&str, usize)> {
        self.parts.iter().find_map(|part| match part {
            FormPart::File {
                name: n,
                file_name,
                bytes,
            } if n == name => Some((file_name.as_str(), bytes.len())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_request_builder() {
        let request = JsonRequest::post("https://api.example.com/jobs", json!({"a": 1}))
            .with_bearer("secret");

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://api.example.com/jobs");
        assert_eq!(request.bearer_token.as_deref(), Some("secret"));
        assert_eq!(request.body, Some(json!({"a": 1})));

        let get = JsonRequest::get("https://api.example.com/jobs/1");
        assert_eq!(get.method, Method::Get);
        assert!(get.body.is_none());
        assert!(get.bearer_token.is_none());
    }

    #[test]
    fn test_multipart_form_lookup() {
        let form = MultipartForm::new()
            .file("file", "model.obj", vec![1, 2, 3])
            .text("unit", "mm")
            .text("refresh", "false");

        assert_eq!(form.parts().len(), 3);
        assert_eq!(form.text_value("unit"), Some("mm"));
        assert_eq!(form.text_value("refresh"), Some("false"));
        assert_eq!(form.text_value("missing"), None);
        assert_eq!(form.file_info("file"), Some(("model.obj", 3)));
        assert_eq!(form.parts()[0].name(), "file");
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
    }
}
