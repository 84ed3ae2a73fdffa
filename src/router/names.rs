use crate::Error;
use std::collections::HashMap;

/// The named-route table used for reverse URL generation.
///
/// Names are case-insensitive. Registering a name twice keeps the last registration.
#[derive(Debug, Clone, Default)]
pub struct NamedRoutes {
    patterns: HashMap<String, String>,
}

impl NamedRoutes {
    pub(crate) fn new() -> NamedRoutes {
        NamedRoutes::default()
    }

    pub(crate) fn insert<N: AsRef<str>, P: Into<String>>(&mut self, name: N, pattern: P) {
        self.patterns.insert(name.as_ref().to_lowercase(), pattern.into());
    }

    /// Returns the path pattern registered under `name`.
    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.patterns.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pattern(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Generates the path of a named route by substituting `args`, left to right, into the
    /// wildcard segments of its pattern.
    ///
    /// This is lenient: an unknown name yields an empty string, a wildcard without a matching
    /// argument is replaced with an empty string and surplus arguments are ignored. Use
    /// [`try_reverse_url`](#method.try_reverse_url) to get an error instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response};
    /// use routekit::Router;
    /// use std::convert::Infallible;
    ///
    /// let router: Router<Infallible> = Router::builder()
    ///     .get("/users/:id/:action", |_| async move { Ok(Response::new(Full::new(Bytes::new()))) })
    ///     .name("n")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(router.reverse_url("n", ["7", "edit"]), "/users/7/edit");
    /// assert_eq!(router.reverse_url("n", ["7"]), "/users/7/");
    /// assert_eq!(router.reverse_url("unknown", ["7"]), "");
    /// ```
    pub fn reverse_url<I, A>(&self, name: &str, args: I) -> String
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        match self.pattern(name) {
            Some(pattern) => substitute(pattern, args).0,
            None => String::new(),
        }
    }

    /// Like [`reverse_url`](#method.reverse_url), but fails for an unknown name and when the
    /// argument count differs from the wildcard count.
    pub fn try_reverse_url<I, A>(&self, name: &str, args: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        let pattern = self
            .pattern(name)
            .ok_or_else(|| Error::UnknownRouteName(name.to_owned()))?;

        let args = args.into_iter().map(|arg| arg.to_string()).collect::<Vec<_>>();
        let given = args.len();
        let (url, expected) = substitute(pattern, args);

        if expected != given {
            return Err(Error::ReverseArgs {
                name: name.to_lowercase(),
                expected,
                given,
            });
        }

        Ok(url)
    }
}

// Returns the generated url and the number of wildcard segments in `pattern`.
fn substitute<I, A>(pattern: &str, args: I) -> (String, usize)
where
    I: IntoIterator<Item = A>,
    A: ToString,
{
    let mut args = args.into_iter();
    let mut wildcards = 0;

    let url = pattern
        .split('/')
        .map(|seg| {
            if seg.len() > 1 && (seg.starts_with(':') || seg.starts_with('*')) {
                wildcards += 1;
                args.next().map(|arg| arg.to_string()).unwrap_or_default()
            } else {
                seg.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    (url, wildcards)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> NamedRoutes {
        let mut names = NamedRoutes::new();
        names.insert("Users#Show", "/admin/users/:id");
        names.insert("n", "/users/:id/:action");
        names.insert("home", "/");
        names.insert("files", "/public/*path");
        names
    }

    #[test]
    fn should_substitute_args_left_to_right() {
        let names = routes();
        assert_eq!(names.reverse_url("n", ["7", "edit"]), "/users/7/edit");
        assert_eq!(names.reverse_url("users#show", [42]), "/admin/users/42");
        assert_eq!(names.reverse_url("USERS#SHOW", [42]), "/admin/users/42");
        assert_eq!(names.reverse_url("home", Vec::<String>::new()), "/");
        assert_eq!(names.reverse_url("files", ["css/site.css"]), "/public/css/site.css");
    }

    #[test]
    fn should_be_lenient_by_default() {
        let names = routes();
        assert_eq!(names.reverse_url("n", ["7"]), "/users/7/");
        assert_eq!(names.reverse_url("n", ["1", "2", "3"]), "/users/1/2");
        assert_eq!(names.reverse_url("missing", ["1"]), "");
    }

    #[test]
    fn should_report_errors_when_strict() {
        let names = routes();
        assert_eq!(names.try_reverse_url("n", ["7", "edit"]).unwrap(), "/users/7/edit");
        assert!(matches!(
            names.try_reverse_url("n", ["7"]),
            Err(Error::ReverseArgs { expected: 2, given: 1, .. })
        ));
        assert!(matches!(
            names.try_reverse_url("missing", ["7"]),
            Err(Error::UnknownRouteName(_))
        ));
    }

    #[test]
    fn should_keep_last_registration() {
        let mut names = routes();
        names.insert("N", "/other/:id");
        assert_eq!(names.reverse_url("n", ["1"]), "/other/1");
        assert_eq!(names.len(), 4);
    }
}
