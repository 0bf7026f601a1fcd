// Base URL normalization
//
// Service addresses come from hand-edited env files, so they arrive as
// `host:port`, with no scheme, with a mangled scheme (`http///`), or with
// trailing slashes. Everything downstream assumes `scheme://host[:port][/path]`.

const SCHEMES: [&str; 2] = ["https", "http"];

/// Turn a loosely-formed host string into a canonical absolute URL.
///
/// Rules, in order:
/// 1. bare `host:port` gets `http://`
/// 2. a repeated-slash scheme prefix (`http///`, `https//`, `http:////`)
///    collapses to `scheme://`
/// 3. no recognized scheme left: prepend `http://`
/// 4. strip trailing slashes
///
/// Empty (or whitespace-only) input yields an empty string, meaning "unset".
pub fn normalize_base_url(raw: &str) -> String {
    let input = raw.trim();
    if input.is_empty() {
        return String::new();
    }

    if is_bare_host_port(input) {
        return format!("http://{input}");
    }

    let absolute = match split_scheme(input) {
        Some((_, "")) => return String::new(),
        Some((scheme, rest)) => format!("{scheme}://{rest}"),
        None => format!("http://{input}"),
    };

    absolute.trim_end_matches('/').to_owned()
}

/// `host:port` with no scheme and no path.
fn is_bare_host_port(input: &str) -> bool {
    let Some((host, port)) = input.rsplit_once(':') else {
        return false;
    };
    !host.is_empty()
        && !host.contains(['/', ':'])
        && !port.is_empty()
        && port.bytes().all(|b| b.is_ascii_digit())
}

/// Split a recognized (possibly mangled) scheme prefix off `input`.
///
/// The separator after the scheme name must be a run of `:` and `/` that
/// contains at least one slash and is at least two characters long, so
/// `httpbin.org` and `http:8080` are not mistaken for schemes.
fn split_scheme(input: &str) -> Option<(&'static str, &str)> {
    SCHEMES.iter().find_map(|scheme| {
        let head = input.get(..scheme.len())?;
        if !head.eq_ignore_ascii_case(scheme) {
            return None;
        }
        let after = &input[scheme.len()..];
        let rest = after.trim_start_matches([':', '/']);
        let separator = &after[..after.len() - rest.len()];
        (separator.len() >= 2 && separator.contains('/')).then_some((*scheme, rest))
    })
}
