use reqwest::Client;
use reqwest::header::LOCATION;
use tracing::debug;
use url::Url;

use super::default::DEFAULT_UA;

const MAX_REDIRECT_HOPS: usize = 5;

/// Follows `Location` headers hop by hop, stopping early once a
/// redirect target's host contains `target_domain` (if given). The
/// input URL itself is never matched against the domain, short-link
/// hosts often live under the canonical one (`v.douyin.com`) and still
/// need their first hop. Best effort: any request failure returns the
/// last URL seen instead of an error, since an unexpanded short link
/// is still a usable input downstream.
pub async fn resolve_redirect(client: &Client, url: &str, target_domain: Option<&str>) -> String {
    let mut current = url.to_string();

    for _ in 0..MAX_REDIRECT_HOPS {
        let response = match client
            .get(&current)
            .header(reqwest::header::USER_AGENT, DEFAULT_UA)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                debug!(url = %current, error = %e, "redirect resolution failed, keeping last url");
                return current;
            }
        };

        let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
        else {
            return current;
        };

        current = match resolve_location(&current, location) {
            Some(next) => next,
            None => return current,
        };

        if let Some(domain) = target_domain
            && host_of(&current).is_some_and(|host| host.contains(domain))
        {
            return current;
        }
    }

    current
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(ToOwned::to_owned)
}

// Location may be relative per RFC 9110.
fn resolve_location(base: &str, location: &str) -> Option<String> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return Some(location.to_string());
    }
    let base = Url::parse(base).ok()?;
    base.join(location).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::default::no_redirect_client;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves 302s with `location`, or pointing at itself when
    /// `location` is `None`.
    async fn spawn_redirecting_server(location: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("http://{addr}/short-slug");

        let redirect_target = location.unwrap_or_else(|| url.clone());
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let target = redirect_target.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 302 Found\r\nLocation: {target}\r\nContent-Length: 0\r\n\r\n"
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                });
            }
        });

        url
    }

    #[tokio::test]
    async fn terminates_on_redirect_loop() {
        let url = spawn_redirecting_server(None).await;
        let client = no_redirect_client();

        let resolved = resolve_redirect(&client, &url, None).await;
        assert_eq!(resolved, url);
    }

    #[tokio::test]
    async fn request_failure_keeps_last_url() {
        let client = no_redirect_client();

        // Nothing listens here, so the hop fails and the input survives.
        let url = "http://127.0.0.1:1/some-short-link";
        assert_eq!(resolve_redirect(&client, url, None).await, url);
    }

    // Short-link hosts can sit under the canonical domain, so the match
    // must apply to the redirect target, never to the input URL.
    #[tokio::test]
    async fn expands_when_input_host_already_matches_target_domain() {
        let url = spawn_redirecting_server(Some("/video/12345".to_string())).await;
        let client = no_redirect_client();

        let resolved = resolve_redirect(&client, &url, Some("127.0.0.1")).await;
        assert_eq!(resolved, url.replace("/short-slug", "/video/12345"));
    }

    #[test]
    fn relative_location_resolves_against_base() {
        assert_eq!(
            resolve_location("https://b23.tv/abc", "/video/BV1xx411c7mD").as_deref(),
            Some("https://b23.tv/video/BV1xx411c7mD")
        );
    }

    #[test]
    fn target_domain_host_match() {
        assert!(
            host_of("https://www.bilibili.com/video/x")
                .is_some_and(|h| h.contains("bilibili.com"))
        );
    }
}
