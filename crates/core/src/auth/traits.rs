/// Secondary source consulted when the session endpoint cannot issue a token.
///
/// Environments that carry an ambient credential (a browser-managed cookie,
/// an environment variable, a keychain entry) implement this; environments
/// without one simply do not install a source.
pub trait FallbackCredential: Send + Sync {
    /// Reads the credential, if one is available right now.
    fn read(&self) -> Option<String>;
}
