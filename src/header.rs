use crate::signer::{percent_encode, SignedParameters};

const OAUTH_SCHEME: &str = "OAuth";

/// Render signed `oauth_*` parameters as an `Authorization` header value:
/// `OAuth k1="v1", k2="v2"`, keys in ascending order, values percent-encoded.
pub fn authorization_header(parameters: &SignedParameters) -> String {
    let pairs = parameters
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, percent_encode(value)))
        .collect::<Vec<_>>();
    format!("{} {}", OAUTH_SCHEME, pairs.join(", "))
}

#[cfg(test)]
mod tests {
    use http::Method;

    use crate::{Credentials, OAuthParameters, SignatureRequest, Signer};

    #[test]
    fn render_sorted_header() {
        let credentials = Credentials::new("ck", "cs").token("at", "ats");
        let params = OAuthParameters::new()
            .nonce("abcdefgh12345678abcdefgh12345678")
            .timestamp(1_700_000_000u64);
        let request = SignatureRequest::new(
            Method::GET,
            "https://api.example.com/2/users/123/liked_tweets",
        )
        .unwrap()
        .parameter("max_results", "10")
        .unwrap();

        let signed = Signer::new(&credentials, params).sign(&request).unwrap();
        assert_eq!(
            signed.authorization_header(),
            "OAuth oauth_consumer_key=\"ck\", \
             oauth_nonce=\"abcdefgh12345678abcdefgh12345678\", \
             oauth_signature=\"2Cs2OVXOIhtivHfS8VvjQ4l0i0w%3D\", \
             oauth_signature_method=\"HMAC-SHA1\", \
             oauth_timestamp=\"1700000000\", \
             oauth_token=\"at\", \
             oauth_version=\"1.0\""
        );
    }

    #[test]
    fn header_never_carries_query() {
        let credentials = Credentials::new("ck", "cs").token("at", "ats");
        let request = SignatureRequest::new(Method::GET, "https://api.example.com/2/likes")
            .unwrap()
            .parameter("pagination_token", "next")
            .unwrap();
        let header = Signer::new(&credentials, OAuthParameters::new())
            .sign(&request)
            .unwrap()
            .authorization_header();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"ck\""));
        assert!(!header.contains("pagination_token"));
    }

    #[test]
    fn encode_header_values() {
        let credentials = Credentials::new("c k", "cs").token("a/t", "ats");
        let request = SignatureRequest::new(Method::GET, "https://api.example.com/2/likes").unwrap();
        let header = Signer::new(&credentials, OAuthParameters::new().timestamp(1u64))
            .sign(&request)
            .unwrap()
            .authorization_header();

        assert!(header.contains("oauth_consumer_key=\"c%20k\""));
        assert!(header.contains("oauth_token=\"a%2Ft\""));
    }
}
