//! OAuth identity attached to every Launchpad request.
//!
//! Launchpad accepts PLAINTEXT OAuth signatures over HTTPS, so signing
//! a request is a fixed format string over the token triple. Token
//! acquisition and rotation happen elsewhere; this type only carries
//! the result.

/// Signing credentials for one Launchpad identity.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    token: String,
    secret: String,
    consumer_key: Option<String>,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        token: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            secret: secret.into(),
            consumer_key: None,
        }
    }

    /// Override the OAuth consumer key when it differs from the username.
    pub fn with_consumer_key(mut self, consumer_key: impl Into<String>) -> Self {
        self.consumer_key = Some(consumer_key.into());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Owner segment for snap lookups and creation, e.g. `/~build.snapcraft.io`.
    pub fn owner(&self) -> String {
        format!("/~{}", self.username)
    }

    /// Livefs paths address the owner with dots stripped from the username.
    pub fn livefs_owner(&self) -> String {
        self.username.replace('.', "")
    }

    /// The `Authorization` header value sent with every request.
    pub fn authorization_header(&self) -> String {
        let consumer = self.consumer_key.as_deref().unwrap_or(&self.username);
        format!(
            "OAuth oauth_version=\"1.0\", \
             oauth_signature_method=\"PLAINTEXT\", \
             oauth_consumer_key={consumer}, \
             oauth_token=\"{token}\", \
             oauth_signature=\"&{secret}\"",
            token = self.token,
            secret = self.secret,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_format() {
        let credentials = Credentials::new("imagebuild", "token-123", "secret-456");
        assert_eq!(
            credentials.authorization_header(),
            "OAuth oauth_version=\"1.0\", \
             oauth_signature_method=\"PLAINTEXT\", \
             oauth_consumer_key=imagebuild, \
             oauth_token=\"token-123\", \
             oauth_signature=\"&secret-456\""
        );
    }

    #[test]
    fn consumer_key_override() {
        let credentials =
            Credentials::new("imagebuild", "t", "s").with_consumer_key("image.build");
        assert!(credentials
            .authorization_header()
            .contains("oauth_consumer_key=image.build,"));
        assert_eq!(credentials.username(), "imagebuild");
    }

    #[test]
    fn livefs_owner_strips_dots() {
        let credentials = Credentials::new("build.staging.snapcraft.io", "t", "s");
        assert_eq!(credentials.livefs_owner(), "buildstagingsnapcraftio");
        assert_eq!(credentials.owner(), "/~build.staging.snapcraft.io");
    }
}
