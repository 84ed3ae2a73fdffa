// Context keys.
pub(crate) const ROUTE_PARAMS_KEY: &str = "routekit.route_params";
pub(crate) const CSRF_TOKEN_KEY: &str = "_csrf";
pub(crate) const CSRF_ISSUED_ID_KEY: &str = "routekit.csrf_issued_id";

// Cookies, form fields and headers used by the CSRF middleware.
pub(crate) const ID_COOKIE_NAME: &str = "APP_ID";
pub(crate) const ID_LENGTH: usize = 32;
pub(crate) const CSRF_SECRET_LENGTH: usize = 32;
pub(crate) const CSRF_FORM_FIELD: &str = "_csrf-token";
pub(crate) const CSRF_HEADER: &str = "x-csrf-token";
pub(crate) const CSRF_TEMPLATE_FN: &str = "csrfToken";

// Method override.
pub(crate) const METHOD_OVERRIDE_FIELD: &str = "_method";
pub(crate) const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

pub(crate) const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
