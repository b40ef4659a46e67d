//! Architectures addressed on the build farm.

/// Processors snap recipes are configured to build for.
pub const SUPPORTED_PROCESSORS: [&str; 6] =
    ["amd64", "arm64", "armhf", "i386", "ppc64el", "s390x"];

/// API link for a processor, e.g. `/+processors/amd64`.
pub fn processor_link(arch: &str) -> String {
    format!("/+processors/{arch}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links() {
        assert_eq!(processor_link("amd64"), "/+processors/amd64");
        assert_eq!(SUPPORTED_PROCESSORS.len(), 6);
    }
}
