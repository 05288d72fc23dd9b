use std::collections::HashMap;

/// TextEncoder turns a plain string into a transport-safe representation.
pub trait TextEncoder {
    fn encode(&self, text: &str) -> String;
}

/// Base64TextEncoder encodes with the standard base64 alphabet.
#[derive(Clone, Copy, Debug, Default)]
pub struct Base64TextEncoder;

impl TextEncoder for Base64TextEncoder {
    fn encode(&self, text: &str) -> String {
        base64::encode(text.as_bytes())
    }
}

/// HttpAuthHeaderMapper builds HTTP Basic authentication headers, e.g. for
/// the header set handed to an OTLP exporter.
pub struct HttpAuthHeaderMapper {
    encoder: Box<dyn TextEncoder + Send + Sync>,
}

impl HttpAuthHeaderMapper {
    /// new creates a mapper using the given encoder.
    pub fn new(encoder: Box<dyn TextEncoder + Send + Sync>) -> HttpAuthHeaderMapper {
        HttpAuthHeaderMapper { encoder }
    }

    /// map_from_credentials renders `username:password` as an
    /// Authorization header map.
    pub fn map_from_credentials(&self, username: &str, password: &str) -> HashMap<String, String> {
        let credentials = format!("{}:{}", username, password);
        let encoded = self.encoder.encode(&credentials);
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Basic {}", encoded));
        headers
    }
}

impl Default for HttpAuthHeaderMapper {
    fn default() -> HttpAuthHeaderMapper {
        HttpAuthHeaderMapper::new(Box::new(Base64TextEncoder))
    }
}
