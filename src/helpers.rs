use crate::constants;
use http::header::{self, HeaderMap};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;

pub(crate) fn percent_decode_segment(val: &str) -> crate::Result<String> {
    percent_decode_str(val)
        .decode_utf8()
        .map_err(Into::into)
        .map(|val| val.to_string())
}

/// Returns the value of the named cookie from the `Cookie` request headers.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_owned())
}

pub(crate) fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .eq_ignore_ascii_case(constants::FORM_URLENCODED)
        })
        .unwrap_or(false)
}

/// Looks up a field of an `application/x-www-form-urlencoded` body.
pub(crate) fn form_value(body: &[u8], field: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == field)
        .map(|(_, value)| value.into_owned())
}

pub(crate) fn escape_html(val: &str) -> Cow<'_, str> {
    if !val.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(val);
    }

    let mut out = String::with_capacity(val.len() + 8);
    for ch in val.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
