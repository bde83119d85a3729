use crate::error::ResolveError;

/// Navigation decision after an unrecoverable resolution failure.
///
/// This is a contract with the embedding navigation layer, not an HTTP API:
/// the engine decides the destination, the host performs the redirect.
/// Recoverable errors never map to a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Login entry point, carrying the originating URL as the return path.
    Login { return_to: String },
    /// Generic test-listing fallback.
    TestListing,
    /// Generic error page.
    ErrorPage,
}

impl Redirect {
    #[must_use]
    pub fn for_resolve_error(err: &ResolveError, origin: &str) -> Self {
        match err {
            ResolveError::Unauthenticated => Redirect::Login {
                return_to: origin.to_owned(),
            },
            ResolveError::NoTestAvailable => Redirect::TestListing,
            ResolveError::SessionCreationFailed(_) => Redirect::ErrorPage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::ApiError;

    #[test]
    fn unauthenticated_redirects_to_login_with_return_path() {
        let redirect =
            Redirect::for_resolve_error(&ResolveError::Unauthenticated, "/topics/7/test");
        assert_eq!(
            redirect,
            Redirect::Login {
                return_to: "/topics/7/test".to_owned()
            }
        );
    }

    #[test]
    fn missing_test_redirects_to_listing() {
        let redirect = Redirect::for_resolve_error(&ResolveError::NoTestAvailable, "/topics/7");
        assert_eq!(redirect, Redirect::TestListing);
    }

    #[test]
    fn creation_failure_redirects_to_error_page() {
        let err = ResolveError::SessionCreationFailed(ApiError::NotFound);
        assert_eq!(
            Redirect::for_resolve_error(&err, "/topics/7"),
            Redirect::ErrorPage
        );
    }
}
