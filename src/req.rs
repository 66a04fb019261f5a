use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

const MAX_REQUEST_BYTES: usize = 64 * 1024;
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
}

impl TryFrom<&str> for Method {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, anyhow::Error> {
        match value {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ => Err(anyhow::anyhow!("Method not supported")),
        }
    }
}

#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Request {
    /// Reads one request, waiting for the full body when `Content-Length` is
    /// present.
    pub async fn from_reader<R: AsyncRead + Unpin>(mut reader: R) -> Result<Self> {
        let mut buffer = Vec::with_capacity(1024);
        let mut chunk = [0; 1024];
        loop {
            let size = reader.read(&mut chunk).await.context("Unable to read stream")?;
            if size == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..size]);
            if buffer.len() > MAX_REQUEST_BYTES {
                bail!("Request too large");
            }
            if let Some(head_end) = find_head_end(&buffer) {
                let head = String::from_utf8_lossy(&buffer[..head_end]);
                let body_len = content_length(&head);
                if body_len > MAX_REQUEST_BYTES {
                    bail!("Request too large");
                }
                if buffer.len() >= head_end + HEAD_TERMINATOR.len() + body_len {
                    break;
                }
            }
        }
        Self::parse(&String::from_utf8_lossy(&buffer))
    }

    pub fn parse(request: &str) -> Result<Self> {
        let (head, body) = request.split_once("\r\n\r\n").unwrap_or((request, ""));

        // Method and path
        let mut head_lines = head.lines();
        let first = head_lines.next().context("Empty Request")?;
        let mut request_parts = first.split_whitespace();
        let method: Method = request_parts
            .next()
            .ok_or(anyhow::anyhow!("missing method"))
            .and_then(TryInto::try_into)
            .context("Missing Method")?;
        let target = request_parts.next().context("No Path")?;
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (k.to_string(), v.to_string())
            })
            .collect();

        // Headers
        let mut headers = HashMap::new();
        for line in head_lines {
            if let Some((k, v)) = line.split_once(':') {
                headers.insert(k.trim().to_lowercase(), v.trim().to_string());
            }
        }
        Ok(Request {
            method,
            path: path.into(),
            query,
            headers,
            body: body.into(),
        })
    }
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_post_with_body() {
        let raw = "POST /deposit HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\r\n{\"assetId\":\"BTC\"}";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/deposit");
        assert_eq!(request.headers.get("content-type").unwrap(), "application/json");
        assert_eq!(request.body, "{\"assetId\":\"BTC\"}");
    }

    #[test]
    fn splits_query_string_from_path() {
        let request =
            Request::parse("GET /accounts/abc/orders?status=open&verbose HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/accounts/abc/orders");
        assert_eq!(request.query.get("status").unwrap(), "open");
        assert_eq!(request.query.get("verbose").unwrap(), "");
        assert!(request.body.is_empty());

        let request = Request::parse("GET /accounts/abc HTTP/1.1\r\n\r\n").unwrap();
        assert!(request.query.is_empty());
    }

    #[test]
    fn rejects_unsupported_method() {
        assert!(Request::parse("DELETE /accounts HTTP/1.1\r\n\r\n").is_err());
        assert!(Request::parse("").is_err());
    }

    #[tokio::test]
    async fn reads_body_up_to_content_length() {
        let raw: &[u8] =
            b"POST /withdraw HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}";
        let request = Request::from_reader(raw).await.unwrap();
        assert_eq!(request.path, "/withdraw");
        assert_eq!(request.body, "{}");
    }

    #[tokio::test]
    async fn rejects_oversized_content_length() {
        let raw: &[u8] =
            b"POST /deposit HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\n{}";
        let err = Request::from_reader(raw).await.unwrap_err();
        assert_eq!(err.to_string(), "Request too large");

        let raw = format!(
            "POST /deposit HTTP/1.1\r\nContent-Length: {}\r\n\r\n{{}}",
            MAX_REQUEST_BYTES + 1
        );
        assert!(Request::from_reader(raw.as_bytes()).await.is_err());
    }
}
