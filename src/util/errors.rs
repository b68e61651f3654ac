use std::error::Error;

/// Renders an error followed by each distinct cause in its `source()` chain.
///
/// `reqwest` keeps the interesting detail (timeouts, DNS failures, redirect
/// policy messages) in the source chain, so `to_string()` alone is not enough
/// for a user-facing message.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        // Some wrappers already embed their cause in Display
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    message
}
