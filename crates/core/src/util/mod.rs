use std::error::Error;

/// Renders `err` followed by every distinct message in its `source()` chain.
///
/// reqwest keeps the actual transport cause (refused connection, timeout)
/// in the chain and prints only the request url at the top level.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !msg.is_empty() && !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = cause.source();
    }
    out
}
