//! Image build requests.
//!
//! Resolves the board/system pair and issues a single `requestBuild`
//! on the livefs for the resolved codename and project.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::client::{ApiClient, RequestError};
use crate::crypto::MetadataCipher;
use crate::error::Error;
use crate::resolver::{BuildTarget, Resolver};
use crate::session::ApiRequest;

/// Archive image builds install from.
const PRIMARY_ARCHIVE_LINK: &str = "https://api.launchpad.net/1.0/ubuntu/+archive/primary";

/// Contact details of the person requesting the build.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorInfo {
    pub name: String,
    pub email: String,
}

/// Per-request knobs for one image build.
#[derive(Debug, Clone, Default)]
pub struct ImageBuildOptions {
    /// Extra snaps preinstalled into the image.
    pub snaps: Vec<String>,

    /// Channel the image tracks.
    pub channel: Option<String>,

    pub image_format: Option<String>,

    /// Encrypted into the metadata when a passphrase is supplied too.
    pub author_info: Option<AuthorInfo>,

    pub gpg_passphrase: Option<String>,

    /// Replaces the catalog architecture for this request.
    pub arch: Option<String>,
}

pub struct ImageBuilder {
    client: ApiClient,
    resolver: Resolver,
    cipher: Arc<dyn MetadataCipher>,
}

impl ImageBuilder {
    pub fn new(client: ApiClient, resolver: Resolver, cipher: Arc<dyn MetadataCipher>) -> Self {
        Self {
            client,
            resolver,
            cipher,
        }
    }

    /// Request an image build for `board`/`system`, returning the
    /// resolved target the build was requested for.
    pub fn request_build(
        &self,
        board: &str,
        system: &str,
        options: &ImageBuildOptions,
    ) -> Result<BuildTarget, Error> {
        let target = self
            .resolver
            .resolve_with_arch(board, system, options.arch.as_deref())?;

        let mut metadata = json!({
            "subarch": target.subarch,
            "extra_snaps": options.snaps,
            "project": target.project.as_str(),
        });
        if let Some(ref channel) = options.channel {
            metadata["channel"] = json!(channel);
        }
        if let Some(ref format) = options.image_format {
            metadata["image_format"] = json!(format);
        }
        if let (Some(author), Some(passphrase)) =
            (&options.author_info, &options.gpg_passphrase)
        {
            let plaintext = serde_json::to_string(author).map_err(RequestError::from)?;
            metadata["author_info"] = json!(self.cipher.encrypt(&plaintext, passphrase)?);
        }

        let request = ApiRequest::post(
            target.livefs_path(&self.client.credentials().livefs_owner()),
        )
        .with_form("ws.op", "requestBuild")
        .with_form("pocket", "Updates")
        .with_form("archive", PRIMARY_ARCHIVE_LINK)
        .with_form("distro_arch_series", target.distro_arch_series())
        .with_form(
            "metadata_override",
            serde_json::to_string(&metadata).map_err(RequestError::from)?,
        );
        self.client.execute(&request)?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::mock::{FakeCipher, MockLaunchpad, MockSession};

    fn builder(launchpad: &MockLaunchpad) -> ImageBuilder {
        let session = MockSession::with_launchpad(launchpad.clone());
        let credentials = Credentials::new("image.build", "token", "secret");
        ImageBuilder::new(
            ApiClient::new(Arc::new(session), credentials),
            Resolver::default(),
            Arc::new(FakeCipher),
        )
    }

    fn form_value(form: &[(String, String)], key: &str) -> String {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    #[test]
    fn request_carries_resolved_coordinates() {
        let launchpad = MockLaunchpad::new();
        let target = builder(&launchpad)
            .request_build(
                "cm3",
                "core16",
                &ImageBuildOptions {
                    snaps: vec!["code".to_string(), "toto".to_string()],
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(target.arch, "armhf");

        let requests = launchpad.image_build_requests();
        assert_eq!(requests.len(), 1);
        let (path, form) = &requests[0];
        assert_eq!(path, "~imagebuild/+livefs/ubuntu/xenial/ubuntu-core");
        assert_eq!(form_value(form, "pocket"), "Updates");
        assert_eq!(
            form_value(form, "distro_arch_series"),
            "https://api.launchpad.net/1.0/ubuntu/xenial/armhf"
        );

        let metadata: serde_json::Value =
            serde_json::from_str(&form_value(form, "metadata_override")).unwrap();
        assert_eq!(metadata["subarch"], "cm3");
        assert_eq!(metadata["project"], "ubuntu-core");
        assert_eq!(metadata["extra_snaps"], json!(["code", "toto"]));
        assert!(metadata.get("author_info").is_none());
    }

    #[test]
    fn author_info_is_encrypted_into_metadata() {
        let launchpad = MockLaunchpad::new();
        builder(&launchpad)
            .request_build(
                "cm3",
                "core16",
                &ImageBuildOptions {
                    author_info: Some(AuthorInfo {
                        name: "somename".to_string(),
                        email: "someemail".to_string(),
                    }),
                    gpg_passphrase: Some("fakepassword".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let requests = launchpad.image_build_requests();
        let metadata: serde_json::Value =
            serde_json::from_str(&form_value(&requests[0].1, "metadata_override")).unwrap();
        let blob = metadata["author_info"].as_str().unwrap();
        assert!(blob.starts_with("-----BEGIN PGP MESSAGE-----"));
        // The fake cipher embeds both inputs: author info went through
        // the cipher under the supplied passphrase.
        assert!(blob.contains("fakepassword"));
        assert!(blob.contains("somename"));
    }

    #[test]
    fn arch_override_reaches_the_series_link() {
        let launchpad = MockLaunchpad::new();
        builder(&launchpad)
            .request_build(
                "cm3",
                "core16",
                &ImageBuildOptions {
                    arch: Some("arm64".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let requests = launchpad.image_build_requests();
        assert_eq!(
            form_value(&requests[0].1, "distro_arch_series"),
            "https://api.launchpad.net/1.0/ubuntu/xenial/arm64"
        );
    }

    #[test]
    fn unknown_board_fails_before_any_request() {
        let launchpad = MockLaunchpad::new();
        let err = builder(&launchpad)
            .request_build("beagle", "core16", &ImageBuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Resolve(_)));
        assert!(launchpad.image_build_requests().is_empty());
    }
}
